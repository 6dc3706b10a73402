use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationRecord {
    pub product: String,
    pub match_percentage: f64,
    pub tag: String,
}
