pub mod domain;
pub mod llm;
pub mod pricing;
pub mod recommend;
pub mod storage;

pub mod config {
    use anyhow::Context;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub cohere_api_key: Option<String>,
        pub sentry_dsn: Option<String>,
        pub demand_data_path: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                cohere_api_key: std::env::var("COHERE_API_KEY").ok(),
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
                demand_data_path: std::env::var("DEMAND_DATA_PATH").ok(),
            })
        }

        pub fn require_cohere_api_key(&self) -> anyhow::Result<&str> {
            self.cohere_api_key
                .as_deref()
                .context("COHERE_API_KEY is required")
        }

        pub fn demand_data_path(&self) -> &str {
            self.demand_data_path.as_deref().unwrap_or("demand.json")
        }
    }
}
