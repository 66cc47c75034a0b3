use super::{build_context, parse_item, print_entries, require_session, Env};
use crate::output::Output;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use media_shelf_core::{ClearOutcome, VisitOutcome};
use serde_json::json;

pub async fn run_recent(cmd: crate::RecentCommands, env: &Env, output: &Output) -> Result<()> {
    let ctx = build_context(env).await?;
    if !require_session(&ctx, output) {
        return Ok(());
    }
    let store = ctx.recently_viewed();

    match cmd {
        crate::RecentCommands::List { limit } => {
            store
                .load()
                .await
                .map_err(|e| eyre!("Failed to load recently viewed items: {}", e))?;
            let entries = match limit {
                Some(n) => store.latest(n),
                None => store.entries(),
            };
            print_entries(output, "recently_viewed", &entries);
            Ok(())
        }
        crate::RecentCommands::Visit { kind, data } => {
            let item = parse_item(kind.into(), &data)?;
            // Existing entries are needed to detect a move to the front
            if let Err(e) = store.load().await {
                output.warn(format!("Could not load history first: {}", e));
            }
            let key = item.key();
            match store.record_visit(item).await? {
                VisitOutcome::Recorded { added_at_millis, moved } => {
                    let what = if moved { "Moved to front" } else { "Recorded" };
                    output.success(format!("{}: {}", what, key));
                    output.json(&json!({ "type": "visit", "doc_id": key.doc_id(), "moved": moved, "added_at_millis": added_at_millis }));
                }
                VisitOutcome::NoSession => output.warn("Not signed in; nothing recorded"),
            }
            Ok(())
        }
        crate::RecentCommands::Clear => match store.clear_all().await {
            ClearOutcome::Cleared { removed } => {
                output.success(format!("Cleared {} recently viewed item(s)", removed));
                Ok(())
            }
            ClearOutcome::NoSession => {
                output.warn("Not signed in; nothing cleared");
                Ok(())
            }
            ClearOutcome::Failed(reason) => Err(eyre!("Failed to clear recently viewed items: {}", reason)),
        },
    }
}
