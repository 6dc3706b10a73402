use serde::{Deserialize, Serialize};

/// The optimized price is kept as the raw text the model produced; callers
/// must not assume it parses as a number.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceRecord {
    pub product: String,
    pub optimized_price: String,
}
