mod document;
mod history;
mod reading_list;

pub use document::*;
pub use history::*;
pub use reading_list::*;

/// JSON printed on stdout for a command
pub type HandlerResult = Result<serde_json::Value, Box<dyn std::error::Error>>;
