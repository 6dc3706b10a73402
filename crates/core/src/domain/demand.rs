use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemandForecastRecord {
    pub category: String,
    pub demand_percentage: serde_json::Number,
}
