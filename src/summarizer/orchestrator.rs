//! Summary assembly with deterministic fallback.
//!
//! `compose_summary` probes the service, sanitizes the policy text, derives steering
//! hints from the keyword report, makes one request and parses the reply. Any failure
//! along the way produces a fallback summary that carries the keyword report verbatim,
//! so the caller always gets usable output. Nothing is retried.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use tracing::{info, warn};

use crate::config::{HintRule, SummarizerConfig};
use crate::error::{PolicyLensError, Result};

use super::SummarizationClient;

static SPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r" {2,}").expect("static regex"));

const RULE: &str = "==============================================================";
const KEYWORD_DIVIDER: &str = "------------------------------------";
const VERIFY_NOTE: &str = "Note: This AI analysis is based on detected privacy-related keywords and should be verified by legal experts.";

/// How a composed summary was produced
#[derive(Debug)]
pub enum SummaryOutcome {
    Generated { narrative: String },
    Fallback { reason: PolicyLensError },
}

/// Final summary text plus the path that produced it
#[derive(Debug)]
pub struct ComposedSummary {
    pub text: String,
    pub outcome: SummaryOutcome,
}

impl ComposedSummary {
    pub fn is_fallback(&self) -> bool {
        matches!(self.outcome, SummaryOutcome::Fallback { .. })
    }

    /// The model's narrative, when one was generated
    pub fn narrative(&self) -> Option<&str> {
        match &self.outcome {
            SummaryOutcome::Generated { narrative } => Some(narrative),
            SummaryOutcome::Fallback { .. } => None,
        }
    }
}

impl std::fmt::Display for ComposedSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

#[derive(Deserialize)]
struct GenerateReply {
    #[serde(default)]
    response: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SummaryOrchestrator {
    max_prompt_chars: usize,
    hints: Vec<HintRule>,
}

impl SummaryOrchestrator {
    pub fn new(max_prompt_chars: usize, hints: Vec<HintRule>) -> Self {
        Self {
            max_prompt_chars,
            hints,
        }
    }

    pub fn from_config(config: &SummarizerConfig) -> Self {
        Self::new(config.max_prompt_chars, config.hints.clone())
    }

    /// Truncate to the character budget and flatten into a single transport-safe line
    pub fn sanitize(&self, policy_text: &str) -> String {
        let flattened: String = policy_text
            .chars()
            .take(self.max_prompt_chars)
            .map(|c| match c {
                '\r' | '\n' => ' ',
                '"' => '\'',
                other => other,
            })
            .collect();
        SPACE_RUN.replace_all(&flattened, " ").into_owned()
    }

    /// Additive steering hints for each configured category present in the report
    pub fn build_hint(&self, keyword_report: &str) -> String {
        self.hints
            .iter()
            .filter(|rule| keyword_report.contains(&rule.category))
            .map(|rule| format!(" {}", rule.hint))
            .collect()
    }

    /// Pull the narrative out of a generate reply
    pub fn parse_reply(&self, body: &str) -> Result<String> {
        let reply: GenerateReply = serde_json::from_str(body)?;
        let narrative = reply
            .response
            .ok_or_else(|| PolicyLensError::SummarizationParseFailure {
                message: "reply has no 'response' field".to_string(),
            })?;
        if narrative.trim().is_empty() {
            return Err(PolicyLensError::SummarizationParseFailure {
                message: "reply narrative is empty".to_string(),
            });
        }
        Ok(narrative)
    }

    /// Compose the final summary. Never fails; every error path falls back.
    pub async fn compose_summary(
        &self,
        policy_text: &str,
        keyword_report: &str,
        service: &dyn SummarizationClient,
    ) -> ComposedSummary {
        if !service.is_available().await {
            warn!("Summarizer at {} not available, using fallback", service.endpoint());
            let reason = PolicyLensError::SummarizationUnavailable {
                message: format!("no response from {}", service.endpoint()),
            };
            return fallback(FallbackStage::Probe, reason, keyword_report, service.endpoint());
        }

        let text = self.sanitize(policy_text);
        let hint = self.build_hint(keyword_report);

        let narrative = match service.summarize(&text, &hint).await {
            Ok(body) => self.parse_reply(&body),
            Err(e) => Err(e),
        };

        match narrative {
            Ok(narrative) => {
                info!("Successfully generated summary");
                ComposedSummary {
                    text: generated_block(&narrative),
                    outcome: SummaryOutcome::Generated { narrative },
                }
            }
            Err(reason) => {
                warn!("Summary generation failed: {}", reason);
                fallback(
                    FallbackStage::Generation,
                    reason,
                    keyword_report,
                    service.endpoint(),
                )
            }
        }
    }
}

fn generated_block(narrative: &str) -> String {
    format!(
        "AI-Powered Privacy Policy Summary (Based on Keyword Analysis)\n{RULE}\n{narrative}\n{RULE}\n\n{VERIFY_NOTE}\n"
    )
}

/// Which step sent the run down the fallback path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FallbackStage {
    Probe,
    Generation,
}

fn fallback(
    stage: FallbackStage,
    reason: PolicyLensError,
    keyword_report: &str,
    endpoint: &str,
) -> ComposedSummary {
    let banner = match stage {
        FallbackStage::Probe => format!(
            "Summarization Service Not Available\n===================================\n\
             The summarization service is not responding. Please ensure:\n\
             1. The service is running\n\
             2. It is reachable at {endpoint}\n"
        ),
        FallbackStage::Generation => format!(
            "Summary Generation Issue\n========================\nFailed to generate AI summary: {}\n",
            reason.advisory()
        ),
    };

    ComposedSummary {
        text: format!(
            "{banner}\nUsing keyword analysis instead:\n{KEYWORD_DIVIDER}\n{keyword_report}"
        ),
        outcome: SummaryOutcome::Fallback { reason },
    }
}
