pub mod cohere;
pub mod error;

#[derive(Debug, Clone, Copy)]
pub enum Provider {
    Cohere,
}

#[async_trait::async_trait]
pub trait TextGenerator: Send + Sync {
    fn provider(&self) -> Provider;

    /// Submit a prompt and return the first candidate's text, trimmed.
    async fn generate(&self, prompt: &str) -> anyhow::Result<String>;
}
