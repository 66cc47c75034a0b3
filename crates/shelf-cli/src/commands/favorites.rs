use super::{build_context, parse_item, print_entries, require_session, Env};
use crate::output::Output;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use media_shelf_core::{FavoritesStore, LoadOutcome, ToggleOutcome};
use media_shelf_models::MediaKind;
use serde_json::json;

pub async fn run_favorites(cmd: crate::FavoritesCommands, env: &Env, output: &Output) -> Result<()> {
    let ctx = build_context(env).await?;
    if !require_session(&ctx, output) {
        return Ok(());
    }
    let store = ctx.favorites();
    load(store, output).await?;

    match cmd {
        crate::FavoritesCommands::List { kind } => {
            let entries = store.unified_filtered(kind.map(MediaKind::from));
            print_entries(output, "favorites", &entries);
            Ok(())
        }
        crate::FavoritesCommands::Toggle { kind, data } => {
            let item = parse_item(kind.into(), &data)?;
            let label = format!("{} \"{}\"", item.key(), item.title());
            match store.toggle_favorite(item).await? {
                ToggleOutcome::Added { added_at_millis } => {
                    output.success(format!("Added {} to favorites", label));
                    output.json(&json!({ "type": "toggle", "favorited": true, "added_at_millis": added_at_millis }));
                }
                ToggleOutcome::Removed => {
                    output.success(format!("Removed {} from favorites", label));
                    output.json(&json!({ "type": "toggle", "favorited": false }));
                }
                ToggleOutcome::NoSession => output.warn("Not signed in; nothing changed"),
            }
            Ok(())
        }
        crate::FavoritesCommands::Check { kind, data } => {
            let item = parse_item(kind.into(), &data)?;
            let favorited = store.is_favorited(&item);
            if output.is_human() {
                let verdict = if favorited { "is" } else { "is not" };
                output.info(format!("{} {} a favorite", item.key(), verdict));
            } else {
                output.json(&json!({ "type": "check", "doc_id": item.doc_id(), "favorited": favorited }));
            }
            Ok(())
        }
    }
}

/// Every command works on the remote state, so pull it first.
async fn load(store: &FavoritesStore, output: &Output) -> Result<()> {
    match store.load().await {
        LoadOutcome::Loaded { skipped, .. } => {
            if skipped > 0 {
                output.warn(format!("Skipped {} unreadable favorite(s)", skipped));
            }
            Ok(())
        }
        LoadOutcome::NoSession => Err(eyre!("Not signed in")),
        LoadOutcome::Failed(reason) => Err(eyre!("Failed to load favorites: {}", reason)),
    }
}
