use policy_lens::PolicyLensError;
use policy_lens::dictionary::{KeywordDictionary, KeywordEntry, default_entries};
use policy_lens::matcher::MatchEngine;
use policy_lens::report::{NO_MATCHES_NOTICE, render};

const POLICY: &str = "We collect personal information such as your email address. \
We may share personal information with third parties. You can request that we delete \
your data. We use cookies. Third parties may COLLECT device information. \
Children under 13 may not use the service.";

fn dictionary(entries: &[(&str, &str)]) -> KeywordDictionary {
    KeywordDictionary::from_entries(entries.iter().map(|(t, c)| KeywordEntry::new(*t, *c)))
}

#[test]
fn repeated_scans_are_identical() {
    let dict = KeywordDictionary::from_entries(default_entries());
    let engine = MatchEngine::new(&dict);
    let first = engine.scan(POLICY);
    let second = engine.scan(POLICY);
    assert_eq!(first.aggregates, second.aggregates);
    assert_eq!(
        render(&first.aggregates).as_str(),
        render(&second.aggregates).as_str()
    );
}

#[test]
fn totals_equal_sum_of_term_frequencies() {
    let dict = KeywordDictionary::from_entries(default_entries());
    let outcome = MatchEngine::new(&dict).scan(POLICY);
    assert!(!outcome.aggregates.is_empty());
    for aggregate in outcome.aggregates.iter() {
        let sum: usize = aggregate.term_frequencies.iter().map(|(_, n)| n).sum();
        assert_eq!(aggregate.total_occurrences, sum, "{}", aggregate.category);
        assert!(aggregate.term_frequencies.iter().all(|(_, n)| *n > 0));
    }
}

#[test]
fn whole_words_only() {
    let dict = dictionary(&[("cook", "Data Collection")]);
    let outcome = MatchEngine::new(&dict).scan("cookies are not a cook");
    let aggregate = outcome.aggregates.get("Data Collection").unwrap();
    assert_eq!(aggregate.frequency("cook"), 1);
    assert_eq!(aggregate.total_occurrences, 1);
}

#[test]
fn matching_ignores_case() {
    let dict = dictionary(&[("collect", "Data Collection")]);
    let outcome = MatchEngine::new(&dict).scan("We COLLECT data");
    assert_eq!(outcome.aggregates.total_occurrences(), 1);
}

#[test]
fn occurrences_do_not_overlap() {
    let dict = dictionary(&[("a", "Letters")]);
    let outcome = MatchEngine::new(&dict).scan("a a");
    assert_eq!(outcome.aggregates.get("Letters").unwrap().frequency("a"), 2);
}

#[test]
fn unmatched_categories_are_omitted() {
    let dict = dictionary(&[
        ("collect", "Data Collection"),
        ("encrypt", "Security"),
    ]);
    let report = render(&MatchEngine::new(&dict).scan("We collect data.").aggregates);
    assert!(report.as_str().contains("Data Collection:"));
    assert!(!report.as_str().contains("Security"));

    let none = render(&MatchEngine::new(&dict).scan("Nothing to see.").aggregates);
    assert!(none.as_str().ends_with(NO_MATCHES_NOTICE));
}

#[test]
fn empty_dictionary_signals_advisory() {
    let dict = KeywordDictionary::default();
    let outcome = MatchEngine::new(&dict).scan(POLICY);
    assert!(outcome.aggregates.is_empty());
    assert!(matches!(
        outcome.advisory(),
        Some(PolicyLensError::NoDictionaryLoaded)
    ));
}

#[test]
fn terms_shared_across_categories_count_in_each() {
    let dict = dictionary(&[
        ("third parties", "Data Sharing"),
        ("third parties", "Advertising"),
    ]);
    let outcome = MatchEngine::new(&dict).scan(POLICY);
    assert_eq!(outcome.aggregates.get("Data Sharing").unwrap().total_occurrences, 2);
    assert_eq!(outcome.aggregates.get("Advertising").unwrap().total_occurrences, 2);
    assert_eq!(outcome.aggregates.total_occurrences(), 4);
}
