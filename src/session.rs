//! Per-run analysis state: loaded text, its provenance, and the latest results.
//!
//! The session owns sequencing only. Matching, rendering and summary assembly live in
//! their own modules; the record store and summarization service are injected.

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use crate::dictionary::KeywordDictionary;
use crate::error::{PolicyLensError, Result};
use crate::matcher::{CategoryAggregates, MatchEngine, NoopObserver, ScanObserver};
use crate::report::{self, AnalysisReport};
use crate::store::{AnalysisRecord, NewPolicy, PolicyId, PolicyRecord, RecordStore};
use crate::summarizer::{ComposedSummary, SummarizationClient, SummaryOrchestrator};

/// Where the loaded text came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provenance {
    Manual,
    File { filename: Option<String> },
}

impl Provenance {
    pub fn from_tag(tag: &str, filename: Option<&str>) -> Result<Self> {
        match tag {
            "manual" => {
                if filename.is_some() {
                    warn!("Ignoring filename for manually entered text");
                }
                Ok(Provenance::Manual)
            }
            "file" => Ok(Provenance::File {
                filename: filename.map(str::to_string),
            }),
            other => Err(PolicyLensError::InvalidInput {
                message: format!("unknown source tag '{other}', expected 'manual' or 'file'"),
            }),
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Provenance::Manual => "manual",
            Provenance::File { .. } => "file",
        }
    }

    pub fn filename(&self) -> Option<&str> {
        match self {
            Provenance::Manual => None,
            Provenance::File { filename } => filename.as_deref(),
        }
    }
}

#[derive(Debug)]
struct LoadedPolicy {
    text: String,
    provenance: Provenance,
}

#[derive(Debug)]
struct Analysis {
    aggregates: CategoryAggregates,
    report: AnalysisReport,
}

pub struct AnalysisSession {
    store: Arc<dyn RecordStore>,
    summarizer: Arc<dyn SummarizationClient>,
    orchestrator: SummaryOrchestrator,
    /// Loaded on first analyze and kept for the session
    dictionary: Option<KeywordDictionary>,
    loaded: Option<LoadedPolicy>,
    analysis: Option<Analysis>,
    summary: Option<ComposedSummary>,
}

impl AnalysisSession {
    pub fn new(
        store: Arc<dyn RecordStore>,
        summarizer: Arc<dyn SummarizationClient>,
        orchestrator: SummaryOrchestrator,
    ) -> Self {
        Self {
            store,
            summarizer,
            orchestrator,
            dictionary: None,
            loaded: None,
            analysis: None,
            summary: None,
        }
    }

    /// Load manually entered text, replacing anything loaded before
    pub fn load_text(&mut self, text: impl Into<String>) {
        self.replace_loaded(text.into(), Provenance::Manual);
    }

    /// Load text from raw bytes with a provenance tag ("manual" or "file")
    pub fn load_from_source(
        &mut self,
        bytes: &[u8],
        tag: &str,
        filename: Option<&str>,
    ) -> Result<()> {
        let provenance = Provenance::from_tag(tag, filename)?;
        let text = String::from_utf8_lossy(bytes).into_owned();
        self.replace_loaded(text, provenance);
        Ok(())
    }

    pub fn load_from_file(&mut self, path: &Path) -> Result<()> {
        let bytes = std::fs::read(path).map_err(|e| PolicyLensError::Io {
            message: format!("could not open {}: {}", path.display(), e),
        })?;
        let filename = path.display().to_string();
        self.load_from_source(&bytes, "file", Some(&filename))
    }

    fn replace_loaded(&mut self, text: String, provenance: Provenance) {
        info!(
            "Text loaded ({} characters, source={})",
            text.chars().count(),
            provenance.tag()
        );
        self.loaded = Some(LoadedPolicy { text, provenance });
        self.analysis = None;
        self.summary = None;
    }

    pub fn text(&self) -> Option<&str> {
        self.loaded.as_ref().map(|l| l.text.as_str())
    }

    pub fn provenance(&self) -> Option<&Provenance> {
        self.loaded.as_ref().map(|l| &l.provenance)
    }

    /// Number of usable dictionary entries, loading the dictionary if needed
    pub fn dictionary_len(&mut self) -> Result<usize> {
        self.ensure_dictionary()?;
        Ok(self.dictionary.as_ref().map_or(0, KeywordDictionary::len))
    }

    fn ensure_dictionary(&mut self) -> Result<()> {
        if self.dictionary.is_none() {
            let dictionary = KeywordDictionary::from_entries(self.store.list_keywords()?);
            if dictionary.is_empty() {
                // Not cached, so keywords seeded later in the session are picked up
                warn!("No keywords found in the store");
            } else {
                info!("Loaded {} keywords", dictionary.len());
                self.dictionary = Some(dictionary);
            }
        }
        Ok(())
    }

    pub fn analyze(&mut self) -> Result<&AnalysisReport> {
        self.analyze_with_observer(&mut NoopObserver)
    }

    /// Scan the loaded text and rebuild the report, discarding earlier results
    pub fn analyze_with_observer(
        &mut self,
        observer: &mut dyn ScanObserver,
    ) -> Result<&AnalysisReport> {
        if self.text().is_none_or(str::is_empty) {
            return Err(PolicyLensError::NoTextLoaded);
        }
        self.analysis = None;
        self.summary = None;
        self.ensure_dictionary()?;

        let empty = KeywordDictionary::default();
        let dictionary = self.dictionary.as_ref().unwrap_or(&empty);
        let text = self.loaded.as_ref().map_or("", |l| l.text.as_str());
        let outcome = MatchEngine::new(dictionary).scan_with_observer(text, observer);

        if let Some(advisory) = outcome.advisory() {
            warn!("{}", advisory);
            return Err(advisory);
        }

        let report = report::render(&outcome.aggregates);
        info!(
            "Analysis completed: {} occurrences across {} categories",
            report.total_occurrences(),
            report.categories().len()
        );
        let analysis = self.analysis.insert(Analysis {
            aggregates: outcome.aggregates,
            report,
        });
        Ok(&analysis.report)
    }

    pub fn report(&self) -> Result<&AnalysisReport> {
        self.analysis
            .as_ref()
            .map(|a| &a.report)
            .ok_or(PolicyLensError::NoAnalysisAvailable)
    }

    pub fn aggregates(&self) -> Result<&CategoryAggregates> {
        self.analysis
            .as_ref()
            .map(|a| &a.aggregates)
            .ok_or(PolicyLensError::NoAnalysisAvailable)
    }

    /// Compose the final summary for the current analysis.
    ///
    /// Only missing preconditions are errors; service failures produce a fallback summary.
    pub async fn compose_summary(&mut self) -> Result<&ComposedSummary> {
        let text = match &self.loaded {
            Some(loaded) if !loaded.text.is_empty() => loaded.text.as_str(),
            _ => return Err(PolicyLensError::NoTextLoaded),
        };
        let report = self
            .analysis
            .as_ref()
            .map(|a| a.report.as_str())
            .ok_or(PolicyLensError::NoAnalysisAvailable)?;

        info!("Generating summary based on keyword analysis");
        let summary = self
            .orchestrator
            .compose_summary(text, report, self.summarizer.as_ref())
            .await;
        Ok(self.summary.insert(summary))
    }

    pub fn last_summary(&self) -> Option<&ComposedSummary> {
        self.summary.as_ref()
    }

    pub fn store_current_policy(&self) -> Result<PolicyId> {
        let loaded = self
            .loaded
            .as_ref()
            .filter(|l| !l.text.is_empty())
            .ok_or(PolicyLensError::NoTextLoaded)?;
        self.store.store_policy(&NewPolicy {
            content: &loaded.text,
            source: loaded.provenance.tag(),
            filename: loaded.provenance.filename(),
        })
    }

    /// Store the current report against the newest stored policy. Returns that policy's id.
    pub fn store_current_analysis(&self, ai_summary: Option<&str>) -> Result<PolicyId> {
        let report = self.report()?;
        let policy_id = self
            .store
            .list_policies()?
            .first()
            .map(|p| p.id)
            .ok_or(PolicyLensError::NoPolicyStored)?;
        self.store
            .store_analysis(policy_id, report.as_str(), ai_summary)?;
        Ok(policy_id)
    }

    /// Store the current report with the last generated narrative, if any.
    ///
    /// A fallback summary is stored as no summary.
    pub fn store_current_analysis_with_summary(&self) -> Result<PolicyId> {
        let narrative = self.summary.as_ref().and_then(ComposedSummary::narrative);
        self.store_current_analysis(narrative)
    }

    pub fn list_stored_policies(&self) -> Result<Vec<PolicyRecord>> {
        self.store.list_policies()
    }

    pub fn list_analysis_history(&self, policy_id: PolicyId) -> Result<Vec<AnalysisRecord>> {
        self.store.list_analyses(policy_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provenance_tags_round_trip() {
        assert_eq!(
            Provenance::from_tag("manual", None).unwrap(),
            Provenance::Manual
        );
        let file = Provenance::from_tag("file", Some("policy.txt")).unwrap();
        assert_eq!(file.tag(), "file");
        assert_eq!(file.filename(), Some("policy.txt"));
        assert_eq!(Provenance::from_tag("manual", Some("x")).unwrap().filename(), None);
    }

    #[test]
    fn unknown_tag_is_invalid_input() {
        assert!(matches!(
            Provenance::from_tag("clipboard", None),
            Err(PolicyLensError::InvalidInput { .. })
        ));
    }
}
