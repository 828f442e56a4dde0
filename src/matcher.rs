//! Scan-and-aggregate over a keyword dictionary.
//!
//! Each dictionary entry is searched for whole-word, case-insensitive, non-overlapping
//! occurrences, in dictionary order. Matches roll up into per-category aggregates that
//! keep first-seen order for both categories and terms, so rendering is stable.

use serde::Serialize;
use tracing::debug;

use crate::dictionary::{KeywordDictionary, KeywordEntry};
use crate::error::PolicyLensError;

/// A single occurrence found during a scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchRecord {
    pub category: String,
    pub term: String,
    /// Byte offset of the occurrence in the scanned text
    pub offset: usize,
}

/// Per-category totals for one scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryAggregate {
    pub category: String,
    pub total_occurrences: usize,
    /// (term, count) in first-seen order
    pub term_frequencies: Vec<(String, usize)>,
}

impl CategoryAggregate {
    fn new(category: &str) -> Self {
        Self {
            category: category.to_string(),
            total_occurrences: 0,
            term_frequencies: Vec::new(),
        }
    }

    fn record(&mut self, term: &str) {
        self.total_occurrences += 1;
        match self.term_frequencies.iter_mut().find(|(t, _)| t == term) {
            Some((_, count)) => *count += 1,
            None => self.term_frequencies.push((term.to_string(), 1)),
        }
    }

    /// Occurrences of `term` in this category (0 when absent)
    pub fn frequency(&self, term: &str) -> usize {
        self.term_frequencies
            .iter()
            .find(|(t, _)| t == term)
            .map(|(_, count)| *count)
            .unwrap_or(0)
    }
}

/// Aggregates keyed by category, in first-seen order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CategoryAggregates {
    categories: Vec<CategoryAggregate>,
}

impl CategoryAggregates {
    fn entry(&mut self, category: &str) -> &mut CategoryAggregate {
        let idx = match self.categories.iter().position(|a| a.category == category) {
            Some(idx) => idx,
            None => {
                self.categories.push(CategoryAggregate::new(category));
                self.categories.len() - 1
            }
        };
        &mut self.categories[idx]
    }

    pub fn get(&self, category: &str) -> Option<&CategoryAggregate> {
        self.categories.iter().find(|a| a.category == category)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CategoryAggregate> {
        self.categories.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    /// Total occurrences across every category
    pub fn total_occurrences(&self) -> usize {
        self.categories.iter().map(|a| a.total_occurrences).sum()
    }
}

/// Progress hooks for interactive feedback during a scan
pub trait ScanObserver {
    fn on_match(&mut self, _record: &MatchRecord) {}
    fn on_term_complete(&mut self, _entry: &KeywordEntry, _occurrences: usize) {}
}

/// Observer that ignores every event
pub struct NoopObserver;

impl ScanObserver for NoopObserver {}

/// Result of scanning one text
#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    pub aggregates: CategoryAggregates,
    pub dictionary_empty: bool,
}

impl ScanOutcome {
    /// Non-fatal condition the caller should surface, if any
    pub fn advisory(&self) -> Option<PolicyLensError> {
        self.dictionary_empty
            .then_some(PolicyLensError::NoDictionaryLoaded)
    }
}

/// Scans text against a borrowed dictionary
pub struct MatchEngine<'a> {
    dictionary: &'a KeywordDictionary,
}

impl<'a> MatchEngine<'a> {
    pub fn new(dictionary: &'a KeywordDictionary) -> Self {
        Self { dictionary }
    }

    pub fn scan(&self, text: &str) -> ScanOutcome {
        self.scan_with_observer(text, &mut NoopObserver)
    }

    pub fn scan_with_observer(&self, text: &str, observer: &mut dyn ScanObserver) -> ScanOutcome {
        if self.dictionary.is_empty() {
            return ScanOutcome {
                aggregates: CategoryAggregates::default(),
                dictionary_empty: true,
            };
        }

        let mut aggregates = CategoryAggregates::default();
        if text.is_empty() {
            return ScanOutcome {
                aggregates,
                dictionary_empty: false,
            };
        }

        for compiled in self.dictionary.iter() {
            let entry = &compiled.entry;
            let mut occurrences = 0;
            // find_iter resumes after each match, so hits never overlap
            for found in compiled.pattern.find_iter(text) {
                occurrences += 1;
                aggregates.entry(&entry.category).record(&entry.term);
                observer.on_match(&MatchRecord {
                    category: entry.category.clone(),
                    term: entry.term.clone(),
                    offset: found.start(),
                });
            }
            if occurrences > 0 {
                debug!(
                    "Matched '{}' x{} -> ({})",
                    entry.term, occurrences, entry.category
                );
                observer.on_term_complete(entry, occurrences);
            }
        }

        ScanOutcome {
            aggregates,
            dictionary_empty: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dict(entries: &[(&str, &str)]) -> KeywordDictionary {
        KeywordDictionary::from_entries(
            entries
                .iter()
                .map(|(term, category)| KeywordEntry::new(*term, *category)),
        )
    }

    #[test]
    fn whole_word_boundary() {
        let d = dict(&[("cook", "Data Collection")]);
        let outcome = MatchEngine::new(&d).scan("cookies are not a cook");
        let agg = outcome.aggregates.get("Data Collection").unwrap();
        assert_eq!(agg.total_occurrences, 1);
        assert_eq!(agg.frequency("cook"), 1);
    }

    #[test]
    fn case_insensitive() {
        let d = dict(&[("collect", "Data Collection")]);
        let outcome = MatchEngine::new(&d).scan("We COLLECT data");
        assert_eq!(outcome.aggregates.total_occurrences(), 1);
    }

    #[test]
    fn separate_positions_count_separately() {
        let d = dict(&[("a", "Letters")]);
        let outcome = MatchEngine::new(&d).scan("a a");
        assert_eq!(outcome.aggregates.get("Letters").unwrap().frequency("a"), 2);
    }

    #[test]
    fn repeated_terms_do_not_overlap() {
        let d = dict(&[("data data", "Dup")]);
        let outcome = MatchEngine::new(&d).scan("data data data");
        assert_eq!(outcome.aggregates.total_occurrences(), 1);
    }

    #[test]
    fn no_match_leaves_no_entry() {
        let d = dict(&[("share", "Data Sharing"), ("collect", "Data Collection")]);
        let outcome = MatchEngine::new(&d).scan("we collect things");
        assert!(outcome.aggregates.get("Data Sharing").is_none());
        assert_eq!(outcome.aggregates.len(), 1);
    }

    #[test]
    fn categories_keep_first_seen_order() {
        let d = dict(&[
            ("share", "Data Sharing"),
            ("collect", "Data Collection"),
            ("sell", "Data Sharing"),
        ]);
        let outcome = MatchEngine::new(&d).scan("we collect, sell and share");
        let order: Vec<&str> = outcome
            .aggregates
            .iter()
            .map(|a| a.category.as_str())
            .collect();
        assert_eq!(order, vec!["Data Sharing", "Data Collection"]);
        let sharing = outcome.aggregates.get("Data Sharing").unwrap();
        let terms: Vec<&str> = sharing.term_frequencies.iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(terms, vec!["share", "sell"]);
    }

    #[test]
    fn empty_dictionary_signals_condition() {
        let d = KeywordDictionary::default();
        let outcome = MatchEngine::new(&d).scan("anything");
        assert!(outcome.aggregates.is_empty());
        assert!(matches!(
            outcome.advisory(),
            Some(PolicyLensError::NoDictionaryLoaded)
        ));
    }

    #[test]
    fn empty_text_yields_nothing() {
        let d = dict(&[("collect", "Data Collection")]);
        let outcome = MatchEngine::new(&d).scan("");
        assert!(outcome.aggregates.is_empty());
        assert!(outcome.advisory().is_none());
    }

    #[test]
    fn term_counts_in_each_of_its_categories() {
        let d = dict(&[("cookies", "Data Collection"), ("cookies", "Tracking")]);
        let outcome = MatchEngine::new(&d).scan("We use cookies.");
        assert_eq!(outcome.aggregates.get("Data Collection").unwrap().total_occurrences, 1);
        assert_eq!(outcome.aggregates.get("Tracking").unwrap().total_occurrences, 1);
    }

    #[derive(Default)]
    struct Recorder {
        offsets: Vec<usize>,
        completed: Vec<(String, usize)>,
    }

    impl ScanObserver for Recorder {
        fn on_match(&mut self, record: &MatchRecord) {
            self.offsets.push(record.offset);
        }

        fn on_term_complete(&mut self, entry: &KeywordEntry, occurrences: usize) {
            self.completed.push((entry.term.clone(), occurrences));
        }
    }

    #[test]
    fn observer_sees_offsets_left_to_right() {
        let d = dict(&[("share", "Data Sharing"), ("absent", "Other")]);
        let mut recorder = Recorder::default();
        MatchEngine::new(&d).scan_with_observer("share and Share", &mut recorder);
        assert_eq!(recorder.offsets, vec![0, 10]);
        assert_eq!(recorder.completed, vec![("share".to_string(), 2)]);
    }
}
