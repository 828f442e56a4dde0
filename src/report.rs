//! Deterministic text rendering of keyword aggregates

use std::fmt::Write as _;

use serde::Serialize;

use crate::matcher::CategoryAggregates;

pub const REPORT_HEADER: &str = "KEYWORD ANALYSIS RESULTS:\n=========================\n";
pub const NO_MATCHES_NOTICE: &str = "No keywords matched in the privacy policy.\n";

/// Rendered keyword report plus the categories it covers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisReport {
    text: String,
    categories: Vec<String>,
    total_occurrences: usize,
}

impl AnalysisReport {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn total_occurrences(&self) -> usize {
        self.total_occurrences
    }

    pub fn has_matches(&self) -> bool {
        !self.categories.is_empty()
    }
}

impl std::fmt::Display for AnalysisReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

/// Render the full report: header, then one section per category in first-seen order
pub fn render(aggregates: &CategoryAggregates) -> AnalysisReport {
    let mut out = String::from(REPORT_HEADER);

    if aggregates.is_empty() {
        out.push_str(NO_MATCHES_NOTICE);
        return AnalysisReport {
            text: out,
            categories: Vec::new(),
            total_occurrences: 0,
        };
    }

    for aggregate in aggregates.iter() {
        let terms = aggregate
            .term_frequencies
            .iter()
            .map(|(term, count)| {
                if *count > 1 {
                    format!("{term}({count}x)")
                } else {
                    term.clone()
                }
            })
            .collect::<Vec<_>>()
            .join(", ");

        // Writing to a String cannot fail
        let _ = write!(
            out,
            "\n{}:\n  Occurrences: {}\n  Keywords found: {}\n",
            aggregate.category, aggregate.total_occurrences, terms
        );
    }

    AnalysisReport {
        text: out,
        categories: aggregates.iter().map(|a| a.category.clone()).collect(),
        total_occurrences: aggregates.total_occurrences(),
    }
}

/// One line per category, for quick on-screen feedback
pub fn render_overview(aggregates: &CategoryAggregates) -> String {
    let mut out = String::from("Summary of Detected Terms:\n------------------------------------\n");
    for aggregate in aggregates.iter() {
        let _ = writeln!(
            out,
            "Category: {} | Occurrences: {}",
            aggregate.category, aggregate.total_occurrences
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::{KeywordDictionary, KeywordEntry};
    use crate::matcher::MatchEngine;

    fn aggregates(text: &str, entries: &[(&str, &str)]) -> CategoryAggregates {
        let dict = KeywordDictionary::from_entries(
            entries.iter().map(|(t, c)| KeywordEntry::new(*t, *c)),
        );
        MatchEngine::new(&dict).scan(text).aggregates
    }

    #[test]
    fn empty_renders_notice_only() {
        let report = render(&CategoryAggregates::default());
        assert_eq!(
            report.as_str(),
            "KEYWORD ANALYSIS RESULTS:\n=========================\nNo keywords matched in the privacy policy.\n"
        );
        assert!(!report.has_matches());
    }

    #[test]
    fn sections_follow_fixed_format() {
        let aggs = aggregates(
            "We collect data. We collect more. We share it.",
            &[
                ("collect", "Data Collection"),
                ("data", "Data Collection"),
                ("share", "Data Sharing"),
                ("delete", "User Rights"),
            ],
        );
        let report = render(&aggs);
        let expected = "KEYWORD ANALYSIS RESULTS:\n\
=========================\n\
\n\
Data Collection:\n  Occurrences: 3\n  Keywords found: collect(2x), data\n\
\n\
Data Sharing:\n  Occurrences: 1\n  Keywords found: share\n";
        assert_eq!(report.as_str(), expected);
        assert!(!report.as_str().contains("User Rights"));
        assert_eq!(report.total_occurrences(), 4);
        assert_eq!(report.categories(), &["Data Collection", "Data Sharing"]);
    }

    #[test]
    fn rendering_is_stable() {
        let aggs = aggregates("share, share, sell", &[("sell", "S"), ("share", "S")]);
        assert_eq!(render(&aggs), render(&aggs));
        assert!(render(&aggs).as_str().contains("Keywords found: sell, share(2x)"));
    }

    #[test]
    fn overview_lists_each_category() {
        let aggs = aggregates("collect and share", &[("collect", "A"), ("share", "B")]);
        let overview = render_overview(&aggs);
        assert!(overview.contains("Category: A | Occurrences: 1"));
        assert!(overview.contains("Category: B | Occurrences: 1"));
    }
}
