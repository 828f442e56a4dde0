pub mod sqlite;

use serde::Serialize;

use crate::dictionary::KeywordEntry;
use crate::error::Result;

pub use sqlite::SqliteStore;

/// Identifier assigned by the store; opaque to the core
pub type PolicyId = i64;

/// A policy about to be archived
#[derive(Debug, Clone, Copy)]
pub struct NewPolicy<'a> {
    pub content: &'a str,
    /// "manual" or "file"
    pub source: &'a str,
    pub filename: Option<&'a str>,
}

/// An archived policy text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyRecord {
    pub id: PolicyId,
    pub content: String,
    pub source: String,
    pub filename: Option<String>,
    pub char_count: usize,
    pub created_at: String,
}

impl PolicyRecord {
    /// First `max_chars` characters, with an ellipsis when cut
    pub fn preview(&self, max_chars: usize) -> String {
        let mut preview: String = self.content.chars().take(max_chars).collect();
        if self.content.chars().count() > max_chars {
            preview.push_str("...");
        }
        preview
    }
}

/// A stored keyword analysis, optionally with the AI summary produced alongside it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisRecord {
    pub id: i64,
    pub policy_id: PolicyId,
    pub keyword_analysis: String,
    pub ai_summary: Option<String>,
    pub created_at: String,
}

/// Keyword dictionary source and policy/analysis archive.
///
/// Implementations convert driver errors into `PolicyLensError::PersistenceUnavailable`.
/// Listing operations return records newest-first.
pub trait RecordStore: Send + Sync {
    fn list_keywords(&self) -> Result<Vec<KeywordEntry>>;

    /// Add keywords, ignoring exact (term, category) duplicates. Returns rows added.
    fn insert_keywords(&self, entries: &[KeywordEntry]) -> Result<usize>;

    fn store_policy(&self, policy: &NewPolicy<'_>) -> Result<PolicyId>;

    fn list_policies(&self) -> Result<Vec<PolicyRecord>>;

    fn store_analysis(
        &self,
        policy_id: PolicyId,
        keyword_analysis: &str,
        ai_summary: Option<&str>,
    ) -> Result<i64>;

    fn list_analyses(&self, policy_id: PolicyId) -> Result<Vec<AnalysisRecord>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(content: &str) -> PolicyRecord {
        PolicyRecord {
            id: 1,
            content: content.to_string(),
            source: "manual".to_string(),
            filename: None,
            char_count: content.chars().count(),
            created_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn preview_marks_truncation() {
        assert_eq!(record("short").preview(100), "short");
        assert_eq!(record("abcdef").preview(3), "abc...");
    }
}
