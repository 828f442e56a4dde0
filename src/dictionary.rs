//! Keyword dictionary: ordered (term, category) pairs with their compiled matchers

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;

/// One dictionary row. A term may appear under several categories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordEntry {
    pub term: String,
    pub category: String,
}

impl KeywordEntry {
    pub fn new(term: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            category: category.into(),
        }
    }
}

/// An entry paired with its whole-word, case-insensitive pattern
#[derive(Debug, Clone)]
pub struct CompiledEntry {
    pub entry: KeywordEntry,
    pub pattern: Regex,
}

/// Immutable, ordered dictionary used for one analysis session
#[derive(Debug, Clone, Default)]
pub struct KeywordDictionary {
    entries: Vec<CompiledEntry>,
}

impl KeywordDictionary {
    /// Compile entries in order. Blank terms and uncompilable patterns are skipped.
    pub fn from_entries(entries: impl IntoIterator<Item = KeywordEntry>) -> Self {
        let mut compiled = Vec::new();
        for entry in entries {
            let term = entry.term.trim();
            if term.is_empty() {
                warn!("Skipping blank keyword in category '{}'", entry.category);
                continue;
            }
            match term_pattern(term) {
                Ok(pattern) => compiled.push(CompiledEntry {
                    entry: KeywordEntry::new(term, entry.category.trim()),
                    pattern,
                }),
                Err(e) => warn!("Skipping keyword '{}': {}", term, e),
            }
        }
        debug!("Compiled {} keyword patterns", compiled.len());
        Self { entries: compiled }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CompiledEntry> {
        self.entries.iter()
    }
}

/// Build a literal, case-insensitive pattern bounded by word boundaries.
///
/// A boundary assertion is only added on a side that starts or ends with a word
/// character, so terms such as "opt-out" or "e-mail" still match as whole tokens.
pub fn term_pattern(term: &str) -> std::result::Result<Regex, regex::Error> {
    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    let leading = term.chars().next().is_some_and(is_word);
    let trailing = term.chars().next_back().is_some_and(is_word);
    let pattern = format!(
        "(?i){}{}{}",
        if leading { r"\b" } else { "" },
        regex::escape(term),
        if trailing { r"\b" } else { "" }
    );
    Regex::new(&pattern)
}

#[derive(Debug, Deserialize)]
struct DictionaryFile {
    #[serde(default)]
    keyword: Vec<KeywordEntry>,
}

/// Parse a dictionary file of `[[keyword]]` tables with `term` and `category`
pub fn parse_dictionary_toml(content: &str) -> Result<Vec<KeywordEntry>> {
    let file: DictionaryFile = toml::from_str(content)?;
    Ok(file.keyword)
}

/// Starter dictionary used by `keywords seed`
pub fn default_entries() -> Vec<KeywordEntry> {
    const DEFAULTS: &[(&str, &str)] = &[
        ("collect", "Data Collection"),
        ("personal information", "Data Collection"),
        ("personal data", "Data Collection"),
        ("email address", "Data Collection"),
        ("location", "Data Collection"),
        ("device information", "Data Collection"),
        ("ip address", "Data Collection"),
        ("cookies", "Data Collection"),
        ("share", "Data Sharing"),
        ("third party", "Data Sharing"),
        ("third parties", "Data Sharing"),
        ("partners", "Data Sharing"),
        ("advertisers", "Data Sharing"),
        ("sell", "Data Sharing"),
        ("disclose", "Data Sharing"),
        ("access", "User Rights"),
        ("delete", "User Rights"),
        ("opt-out", "User Rights"),
        ("consent", "User Rights"),
        ("withdraw", "User Rights"),
        ("rectification", "User Rights"),
        ("retain", "Data Retention"),
        ("retention", "Data Retention"),
        ("as long as necessary", "Data Retention"),
        ("encryption", "Security"),
        ("safeguards", "Security"),
        ("breach", "Security"),
        ("children", "Children's Privacy"),
        ("under 13", "Children's Privacy"),
    ];
    DEFAULTS
        .iter()
        .map(|(term, category)| KeywordEntry::new(*term, *category))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_terms_are_dropped_and_order_kept() {
        let dict = KeywordDictionary::from_entries(vec![
            KeywordEntry::new("share", "Data Sharing"),
            KeywordEntry::new("   ", "Data Sharing"),
            KeywordEntry::new(" collect ", "Data Collection"),
        ]);
        let terms: Vec<&str> = dict.iter().map(|c| c.entry.term.as_str()).collect();
        assert_eq!(terms, vec!["share", "collect"]);
    }

    #[test]
    fn pattern_is_literal() {
        let pattern = term_pattern("a.b").unwrap();
        assert!(pattern.is_match("see a.b here"));
        assert!(!pattern.is_match("see axb here"));
    }

    #[test]
    fn punctuated_terms_still_match() {
        let pattern = term_pattern("opt-out").unwrap();
        assert!(pattern.is_match("You may OPT-OUT at any time."));
        assert!(!pattern.is_match("optout"));
    }

    #[test]
    fn toml_dictionary_parses_in_order() {
        let entries = parse_dictionary_toml(
            r#"
            [[keyword]]
            term = "track"
            category = "Tracking"

            [[keyword]]
            term = "beacon"
            category = "Tracking"
            "#,
        )
        .unwrap();
        assert_eq!(
            entries,
            vec![
                KeywordEntry::new("track", "Tracking"),
                KeywordEntry::new("beacon", "Tracking"),
            ]
        );
    }

    #[test]
    fn defaults_compile_completely() {
        let defaults = default_entries();
        let dict = KeywordDictionary::from_entries(defaults.clone());
        assert_eq!(dict.len(), defaults.len());
    }
}
