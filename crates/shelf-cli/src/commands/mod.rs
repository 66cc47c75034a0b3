pub mod config;
pub mod favorites;
pub mod recent;
pub mod session;

use crate::output::Output;
use chrono::{Duration, TimeZone, Utc};
use color_eyre::eyre::eyre;
use color_eyre::Result;
use comfy_table::{Cell, Table};
use media_shelf_config::{Config, GatewayBackend, PathManager, SessionFile};
use media_shelf_core::{SessionProvider, SharedSession, ShelfContext, StoreSettings};
use media_shelf_gateway::{create_gateway, create_http_client, refresh_id_token};
use media_shelf_models::{MediaItem, MediaKind, TimestampedEntry};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

/// Resolved paths and configuration for one invocation.
pub struct Env {
    pub paths: PathManager,
    pub config_path: PathBuf,
    pub config: Config,
}

impl Env {
    pub fn load_session(&self) -> Result<SessionFile> {
        let mut session = SessionFile::new(self.paths.session_file());
        session
            .load()
            .map_err(|e| eyre!("Failed to read session file {}: {}", self.paths.session_file().display(), e))?;
        Ok(session)
    }
}

/// Swap an id token that is about to expire for a fresh one. Failure is not
/// fatal; the gateway will report the auth error itself.
async fn refresh_token_if_needed(env: &Env, session: &mut SessionFile) {
    let Some(firestore) = env.config.gateway.firestore.as_ref() else {
        return;
    };
    let Some(refresh_token) = session.get_refresh_token().cloned() else {
        return;
    };
    let still_valid = session
        .get_token_expires()
        .map(|expires| expires > Utc::now() + Duration::minutes(5))
        .unwrap_or(false);
    if still_valid {
        return;
    }

    let client = create_http_client(std::time::Duration::from_secs(firestore.timeout_secs));
    match refresh_id_token(&client, &firestore.api_key, &refresh_token).await {
        Ok(auth) => {
            session.set_id_token(auth.id_token);
            session.set_refresh_token(auth.refresh_token);
            session.set_token_expires(auth.expires_at);
            if let Err(e) = session.save() {
                warn!("Failed to save refreshed session: {}", e);
            }
            debug!("Refreshed id token for {}", auth.user_id);
        }
        Err(e) => warn!("Could not refresh id token: {}", e),
    }
}

/// Wire up the stores for the signed-in user, if any.
pub async fn build_context(env: &Env) -> Result<ShelfContext> {
    env.config
        .validate()
        .map_err(|e| eyre!("Invalid configuration in {}: {}", env.config_path.display(), e))?;

    let mut session_file = env.load_session()?;
    if env.config.gateway.backend == GatewayBackend::Firestore {
        refresh_token_if_needed(env, &mut session_file).await;
    }

    let gateway = create_gateway(&env.config, &env.paths, &session_file).map_err(|e| eyre!("{}", e))?;
    let session = match session_file.get_user_id() {
        Some(user_id) => SharedSession::signed_in(user_id.clone()),
        None => SharedSession::new(),
    };

    Ok(ShelfContext::new(
        gateway,
        Arc::new(session) as Arc<dyn SessionProvider>,
        StoreSettings::from_config(&env.config),
    ))
}

pub fn parse_item(kind: MediaKind, data: &str) -> Result<MediaItem> {
    MediaItem::decode(kind, data).map_err(|e| eyre!("Invalid {} payload: {}", kind, e))
}

pub fn require_session(ctx: &ShelfContext, output: &Output) -> bool {
    if ctx.current_user_id().is_some() {
        return true;
    }
    output.warn("Not signed in. Run 'shelf session login' first.");
    false
}

fn format_millis(millis: i64) -> String {
    Utc.timestamp_millis_opt(millis)
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| millis.to_string())
}

pub fn entry_json(entry: &TimestampedEntry) -> serde_json::Value {
    let data = entry
        .item
        .encode_data()
        .ok()
        .and_then(|raw| serde_json::from_str::<serde_json::Value>(&raw).ok())
        .unwrap_or(serde_json::Value::Null);
    json!({
        "doc_id": entry.item.doc_id(),
        "kind": entry.item.kind().as_str(),
        "id": entry.item.id_string(),
        "title": entry.item.title(),
        "added_at_millis": entry.added_at_millis,
        "data": data,
    })
}

pub fn print_entries(output: &Output, heading: &str, entries: &[TimestampedEntry]) {
    if !output.is_human() {
        let items: Vec<serde_json::Value> = entries.iter().map(entry_json).collect();
        output.json(&json!({ "type": heading, "count": entries.len(), "items": items }));
        return;
    }

    if entries.is_empty() {
        output.info(format!("No {} yet", heading.replace('_', " ")));
        return;
    }

    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("Added").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Kind").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Id").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Title").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("By / Released").add_attribute(comfy_table::Attribute::Bold),
    ]);
    for entry in entries {
        table.add_row(vec![
            Cell::new(format_millis(entry.added_at_millis)),
            Cell::new(entry.item.kind().as_str()).fg(comfy_table::Color::Cyan),
            Cell::new(entry.item.id_string()),
            Cell::new(entry.item.title()),
            Cell::new(entry.item.subtitle()),
        ]);
    }
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    println!("{}", table);
}

pub fn mask_string(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}
