use serde_json::json;

use super::HandlerResult;
use crate::cli::ListCommand;
use crate::state::AppState;

/// Handle `readtrail list ...`
pub async fn handle_list(state: &AppState, command: ListCommand) -> HandlerResult {
    let list = &state.list;
    let value = match command {
        ListCommand::Add { path, title } => {
            json!({ "added": list.add_to_reading_list(&path, &title).await })
        }
        ListCommand::Toggle { id } => {
            let item = list
                .toggle_completion(&id)
                .await
                .ok_or_else(|| format!("no reading list entry with id {id:?}"))?;
            serde_json::to_value(item)?
        }
        ListCommand::Remove { id } => {
            json!({ "removed": list.remove_from_reading_list(&id).await })
        }
        ListCommand::Show => serde_json::to_value(list.get_reading_list().await)?,
        ListCommand::Stats => serde_json::to_value(list.get_completion_stats().await)?,
        ListCommand::Prune => json!({ "removed": list.clear_completed().await }),
    };
    Ok(value)
}
