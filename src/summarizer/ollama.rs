use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::SummarizerConfig;
use crate::error::{PolicyLensError, Result};

use super::SummarizationClient;

/// Client for an Ollama-compatible `/api/generate` endpoint
#[derive(Clone, Debug)]
pub struct OllamaClient {
    endpoint: String,
    model: String,
    probe_timeout: Duration,
    request_timeout: Duration,
    client: Client,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

impl OllamaClient {
    pub fn new(config: &SummarizerConfig) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| PolicyLensError::Config {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        info!("Summarizer initialized with model: {}", config.model);

        Ok(Self {
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            probe_timeout: Duration::from_millis(config.probe_timeout_ms),
            request_timeout: Duration::from_millis(config.request_timeout_ms),
            client,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

/// Prompt sent to the model; `hint` is empty or starts with a space
pub fn build_prompt(text: &str, hint: &str) -> String {
    format!("Summarize this privacy policy in 3-4 sentences:{hint} Text: {text}")
}

#[async_trait]
impl SummarizationClient for OllamaClient {
    async fn is_available(&self) -> bool {
        let url = format!("{}/api/tags", self.endpoint);
        match self
            .client
            .get(&url)
            .timeout(self.probe_timeout)
            .send()
            .await
        {
            Ok(resp) if resp.status().is_success() => true,
            Ok(resp) => {
                debug!("Summarizer probe returned {}", resp.status());
                false
            }
            Err(e) => {
                debug!("Summarizer probe failed: {}", e);
                false
            }
        }
    }

    async fn summarize(&self, text: &str, hint: &str) -> Result<String> {
        let url = format!("{}/api/generate", self.endpoint);
        let prompt = build_prompt(text, hint);
        debug!("Prompt length: {}", prompt.len());

        let body = GenerateRequest {
            model: &self.model,
            prompt: &prompt,
            stream: false,
        };

        info!(
            "Sending request to summarizer (timeout: {}s)",
            self.request_timeout.as_secs()
        );
        let resp = self
            .client
            .post(&url)
            .timeout(self.request_timeout)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let reply = resp.text().await?;
        if !status.is_success() {
            warn!("Summarizer returned HTTP {}", status.as_u16());
            return Err(PolicyLensError::SummarizationUnavailable {
                message: format!("HTTP {}: {}", status.as_u16(), reply.trim()),
            });
        }
        if reply.trim().is_empty() {
            return Err(PolicyLensError::SummarizationUnavailable {
                message: "empty response from summarizer".to_string(),
            });
        }

        Ok(reply)
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_places_hint_before_text() {
        let prompt = build_prompt("We collect data.", " Focus on user rights.");
        assert_eq!(
            prompt,
            "Summarize this privacy policy in 3-4 sentences: Focus on user rights. Text: We collect data."
        );
    }

    #[test]
    fn endpoint_loses_trailing_slash() {
        let config = SummarizerConfig {
            endpoint: "http://127.0.0.1:11434/".to_string(),
            ..SummarizerConfig::default()
        };
        let client = OllamaClient::new(&config).unwrap();
        assert_eq!(client.endpoint(), "http://127.0.0.1:11434");
        assert_eq!(client.model(), "gemma:2b");
    }
}
