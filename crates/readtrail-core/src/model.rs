use serde::{Deserialize, Serialize};
use std::fmt;

/// Navigation depth of a section.
///
/// Serialized as the integers `0`, `1` and `2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum SectionLevel {
    /// Content before the first heading
    Introduction,
    /// `# Heading`
    Top,
    /// `## Heading`
    Sub,
}

impl SectionLevel {
    /// Number of `#` markers of the heading line; zero for the introduction.
    pub fn depth(self) -> usize {
        match self {
            SectionLevel::Introduction => 0,
            SectionLevel::Top => 1,
            SectionLevel::Sub => 2,
        }
    }
}

impl From<SectionLevel> for u8 {
    fn from(level: SectionLevel) -> Self {
        level.depth() as u8
    }
}

impl TryFrom<u8> for SectionLevel {
    type Error = InvalidSectionLevel;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(SectionLevel::Introduction),
            1 => Ok(SectionLevel::Top),
            2 => Ok(SectionLevel::Sub),
            other => Err(InvalidSectionLevel(other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidSectionLevel(pub u8);

impl fmt::Display for InvalidSectionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid section level {}, expected 0, 1 or 2", self.0)
    }
}

impl std::error::Error for InvalidSectionLevel {}

/// Heading-bounded reading unit of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    /// Slug of the heading, or `introduction`
    pub id: String,
    /// Raw heading text
    pub title: String,
    /// Heading line plus every line up to the next section, newline-terminated
    pub content: String,
    pub level: SectionLevel,
    pub word_count: usize,
}

impl Section {
    pub fn summary(&self) -> SectionSummary {
        SectionSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            level: self.level,
            word_count: self.word_count,
        }
    }
}

/// Section without its content, as stored in the section-metadata artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionSummary {
    pub id: String,
    pub title: String,
    pub level: SectionLevel,
    pub word_count: usize,
}

/// Per-document reading state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingHistoryItem {
    /// Normalized document path
    pub path: String,
    pub title: String,
    /// Epoch milliseconds
    pub last_read_at: u64,
    pub read_count: u64,
    /// Milliseconds
    pub time_spent: u64,
    pub words_read: u64,
    /// Sorted, no duplicates
    #[serde(default)]
    pub completed_section_indices: Vec<u32>,
}

/// Entry of the to-read queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingTodoItem {
    pub id: String,
    pub path: String,
    pub title: String,
    pub added_at: u64,
    pub completed: bool,
    pub completed_at: Option<u64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionStats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    pub completion_percentage: u32,
}

/// Outcome of a history deduplication pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DedupReport {
    pub removed_count: usize,
    /// Records left after the repair
    pub total_count: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingStats {
    pub documents_read: usize,
    pub total_read_count: u64,
    pub total_time_spent: u64,
    pub total_words_read: u64,
    pub sections_completed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_level_serializes_as_integer() {
        let json = serde_json::to_string(&SectionLevel::Sub).unwrap();
        assert_eq!(json, "2");
        let level: SectionLevel = serde_json::from_str("0").unwrap();
        assert_eq!(level, SectionLevel::Introduction);
        assert!(serde_json::from_str::<SectionLevel>("3").is_err());
    }

    #[test]
    fn test_history_item_uses_camel_case() {
        let item = ReadingHistoryItem {
            path: "guide".to_string(),
            title: "Guide".to_string(),
            last_read_at: 1,
            read_count: 2,
            time_spent: 3,
            words_read: 4,
            completed_section_indices: vec![0, 2],
        };
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["lastReadAt"], 1);
        assert_eq!(value["completedSectionIndices"], serde_json::json!([0, 2]));
    }
}
