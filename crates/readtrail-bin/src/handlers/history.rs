use serde_json::json;

use super::HandlerResult;
use crate::cli::HistoryCommand;
use crate::state::AppState;

/// Handle `readtrail history ...`
pub async fn handle_history(state: &AppState, command: HistoryCommand) -> HandlerResult {
    let history = &state.history;
    let value = match command {
        HistoryCommand::Add {
            path,
            title,
            sections,
            time_ms,
            words,
        } => {
            let item = history
                .add_to_reading_history(&path, &title, &sections, time_ms, words)
                .await
                .ok_or_else(|| format!("could not record reading of {path:?}"))?;
            serde_json::to_value(item)?
        }
        HistoryCommand::Complete { path, indices } => {
            let updated = history.mark_sections_completed(&path, &indices).await;
            if !updated {
                log::warn!("{path:?} has no reading history");
            }
            json!({ "updated": updated })
        }
        HistoryCommand::List { limit } => {
            serde_json::to_value(history.get_reading_history(limit).await)?
        }
        HistoryCommand::Show { path } => {
            serde_json::to_value(history.get_history_item(&path).await)?
        }
        HistoryCommand::Remove { path } => {
            json!({ "removed": history.remove_from_history(&path).await })
        }
        HistoryCommand::Clean => serde_json::to_value(history.clean_duplicate_history().await?)?,
        HistoryCommand::Stats => serde_json::to_value(history.get_reading_stats().await)?,
        HistoryCommand::Clear => json!({ "cleared": history.clear_reading_history().await }),
    };
    Ok(value)
}
