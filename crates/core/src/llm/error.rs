use crate::llm::Provider;
use std::fmt;

/// Upstream generation failure with enough context to classify it downstream.
/// `transient` marks failures worth retrying (connect/timeout, 429, 5xx).
#[derive(Debug, Clone)]
pub struct GatewayError {
    pub provider: Provider,
    pub stage: &'static str,
    pub detail: String,
    pub raw_output: Option<String>,
    pub transient: bool,
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "text generation error (provider={:?}, stage={}): {}",
            self.provider, self.stage, self.detail
        )
    }
}

impl std::error::Error for GatewayError {}

pub fn is_transient(err: &anyhow::Error) -> bool {
    if let Some(gateway) = err.downcast_ref::<GatewayError>() {
        return gateway.transient;
    }
    if let Some(req) = err.downcast_ref::<reqwest::Error>() {
        return req.is_timeout() || req.is_connect();
    }
    false
}
