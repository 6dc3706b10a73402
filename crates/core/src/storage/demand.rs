use crate::domain::demand::DemandForecastRecord;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

// The demand_forecasting endpoint always answers for this category; input
// demographics narrow the lookup but never change the category.
pub const DEFAULT_CATEGORY: &str = "Electronics";

/// Immutable demand mapping, category -> city -> age bucket -> percentage.
/// Loaded once at startup and shared read-only; values keep their JSON
/// numeric representation so integer percentages round-trip unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DemandDataset {
    categories: BTreeMap<String, BTreeMap<String, BTreeMap<String, serde_json::Number>>>,
}

impl DemandDataset {
    pub fn load_from_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read demand dataset at {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("demand dataset at {} is not valid JSON", path.display()))
    }

    /// Three-level lookup; a missing key at any level yields 0, never an error.
    pub fn demand_percentage(
        &self,
        category: &str,
        city: &str,
        age_bucket: &str,
    ) -> serde_json::Number {
        self.categories
            .get(category)
            .and_then(|cities| cities.get(city))
            .and_then(|buckets| buckets.get(age_bucket))
            .cloned()
            .unwrap_or_else(|| serde_json::Number::from(0))
    }

    /// `gender` is accepted for interface compatibility but does not take part
    /// in the lookup key.
    pub fn forecast(
        &self,
        city: &str,
        age_bucket: &str,
        _gender: &str,
    ) -> Vec<DemandForecastRecord> {
        vec![DemandForecastRecord {
            category: DEFAULT_CATEGORY.to_string(),
            demand_percentage: self.demand_percentage(DEFAULT_CATEGORY, city, age_bucket),
        }]
    }
}
