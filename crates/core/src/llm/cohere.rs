use crate::config::Settings;
use crate::llm::error::{is_transient, GatewayError};
use crate::llm::{Provider, TextGenerator};
use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.cohere.ai";
const DEFAULT_MODEL: &str = "command-xlarge-nightly";
const DEFAULT_MAX_TOKENS: u32 = 100;
const DEFAULT_TEMPERATURE: f64 = 0.7;
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_RETRIES: u32 = 2;

// Generation stops at the first literal period.
const STOP_SEQUENCE: &str = ".";

#[derive(Debug, Clone)]
pub struct CohereClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
    temperature: f64,
    retries: u32,
}

impl CohereClient {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let api_key = settings.require_cohere_api_key()?.to_string();
        let base_url =
            std::env::var("COHERE_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let model = std::env::var("COHERE_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let max_tokens = std::env::var("COHERE_MAX_TOKENS")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(DEFAULT_MAX_TOKENS);

        let timeout_secs = std::env::var("COHERE_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let retries = std::env::var("COHERE_RETRIES")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(DEFAULT_RETRIES);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build reqwest client")?;

        Ok(Self {
            http,
            api_key,
            base_url,
            model,
            max_tokens,
            temperature: DEFAULT_TEMPERATURE,
            retries,
        })
    }

    fn request_body<'a>(&'a self, prompt: &'a str) -> GenerateRequest<'a> {
        GenerateRequest {
            model: &self.model,
            prompt,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            k: 0,
            stop_sequences: vec![STOP_SEQUENCE],
        }
    }

    async fn generate_once(&self, prompt: &str) -> anyhow::Result<String> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "Authorization",
            HeaderValue::from_str(&format!("Bearer {}", self.api_key))?,
        );

        let url = format!("{}/v1/generate", self.base_url.trim_end_matches('/'));
        let res = self
            .http
            .post(url)
            .headers(headers)
            .json(&self.request_body(prompt))
            .send()
            .await
            .context("Cohere request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read Cohere response body")?;
        if !status.is_success() {
            return Err(GatewayError {
                provider: Provider::Cohere,
                stage: "http",
                detail: format!("status={status}"),
                raw_output: Some(text),
                transient: status.as_u16() == 429 || status.is_server_error(),
            }
            .into());
        }

        let parsed = serde_json::from_str::<GenerateResponse>(&text).map_err(|e| GatewayError {
            provider: Provider::Cohere,
            stage: "decode",
            detail: format!("invalid response JSON: {e}"),
            raw_output: Some(text.clone()),
            transient: false,
        })?;

        first_candidate_text(&parsed).ok_or_else(|| {
            GatewayError {
                provider: Provider::Cohere,
                stage: "decode",
                detail: "response contained no generations".to_string(),
                raw_output: Some(text),
                transient: false,
            }
            .into()
        })
    }
}

#[async_trait::async_trait]
impl TextGenerator for CohereClient {
    fn provider(&self) -> Provider {
        Provider::Cohere
    }

    async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.generate_once(prompt).await {
                Ok(text) => return Ok(text),
                Err(err) => {
                    if !is_transient(&err) {
                        return Err(err);
                    }
                    if attempt >= self.retries {
                        return Err(GatewayError {
                            provider: Provider::Cohere,
                            stage: "upstream_unavailable",
                            detail: format!("giving up after {attempt} attempts: {err:#}"),
                            raw_output: None,
                            transient: true,
                        }
                        .into());
                    }
                    let backoff = Duration::from_secs(1 << (attempt - 1));
                    tracing::warn!(attempt, ?backoff, error = %err, "Cohere generate failed; retrying");
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }
}

fn first_candidate_text(res: &GenerateResponse) -> Option<String> {
    res.generations
        .first()
        .map(|g| g.text.trim().to_string())
}

#[derive(Debug, Clone, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    max_tokens: u32,
    temperature: f64,
    k: u32,
    stop_sequences: Vec<&'a str>,
}

#[derive(Debug, Clone, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    generations: Vec<Generation>,
}

#[derive(Debug, Clone, Deserialize)]
struct Generation {
    #[serde(default)]
    text: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_body_carries_fixed_sampling_config() {
        let client = CohereClient {
            http: reqwest::Client::new(),
            api_key: "test-key".to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            retries: DEFAULT_RETRIES,
        };

        let body = serde_json::to_value(client.request_body("suggest products")).unwrap();
        assert_eq!(body["model"], "command-xlarge-nightly");
        assert_eq!(body["prompt"], "suggest products");
        assert_eq!(body["max_tokens"], 100);
        assert_eq!(body["temperature"], 0.7);
        assert_eq!(body["k"], 0);
        assert_eq!(body["stop_sequences"], json!(["."]));
    }

    #[test]
    fn takes_first_candidate_and_trims() {
        let res: GenerateResponse = serde_json::from_value(json!({
            "id": "gen_1",
            "generations": [
                {"id": "g1", "text": "  PlayStation 5\nLipstick  \n"},
                {"id": "g2", "text": "ignored second candidate"}
            ]
        }))
        .unwrap();

        assert_eq!(
            first_candidate_text(&res).as_deref(),
            Some("PlayStation 5\nLipstick")
        );
    }

    #[test]
    fn empty_generations_yield_none() {
        let res: GenerateResponse = serde_json::from_value(json!({"generations": []})).unwrap();
        assert_eq!(first_candidate_text(&res), None);
    }

    #[test]
    fn http_status_classifies_transient() {
        let err: anyhow::Error = GatewayError {
            provider: Provider::Cohere,
            stage: "http",
            detail: "status=429".to_string(),
            raw_output: None,
            transient: true,
        }
        .into();
        assert!(is_transient(&err));

        let err: anyhow::Error = GatewayError {
            provider: Provider::Cohere,
            stage: "http",
            detail: "status=401".to_string(),
            raw_output: None,
            transient: false,
        }
        .into();
        assert!(!is_transient(&err));
    }
}
