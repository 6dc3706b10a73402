use crate::domain::pricing::PriceRecord;
use crate::llm::TextGenerator;

/// Ask the model for optimized prices and parse `product: price` lines out of
/// the generated text.
pub async fn optimize(
    llm: &dyn TextGenerator,
    prices: &[f64],
    actual_prices: &[f64],
) -> anyhow::Result<Vec<PriceRecord>> {
    let prompt = build_prompt(prices, actual_prices);
    let text = llm.generate(&prompt).await?;
    Ok(parse_price_lines(&text))
}

pub fn build_prompt(prices: &[f64], actual_prices: &[f64]) -> String {
    format!(
        "Given the list of prices {prices:?} and actual prices {actual_prices:?}, provide a list \
         of optimized prices that balance revenue maximization without making the product feel \
         too expensive for the user or causing loss to the retailer. Provide only product names \
         and their optimized prices."
    )
}

/// Lines without a colon carry no product/price pair and are dropped; only a
/// debug-level count records how many.
pub fn parse_price_lines(text: &str) -> Vec<PriceRecord> {
    let mut out = Vec::new();
    let mut dropped = 0usize;
    for line in text.lines() {
        let Some((product, price)) = line.split_once(':') else {
            if !line.trim().is_empty() {
                dropped += 1;
            }
            continue;
        };
        out.push(PriceRecord {
            product: product.trim().to_string(),
            optimized_price: price.trim().to_string(),
        });
    }
    if dropped > 0 {
        tracing::debug!(dropped, "skipped generated lines without a product/price separator");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_embeds_both_price_lists() {
        let prompt = build_prompt(&[10.0, 20.0], &[12.0, 18.0]);
        assert!(prompt.contains("[10.0, 20.0]"));
        assert!(prompt.contains("[12.0, 18.0]"));
    }

    #[test]
    fn keeps_only_colon_lines_in_order() {
        let records = parse_price_lines("X: 10\nY\nZ: 20");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].product, "X");
        assert_eq!(records[0].optimized_price, "10");
        assert_eq!(records[1].product, "Z");
        assert_eq!(records[1].optimized_price, "20");
    }

    #[test]
    fn splits_on_first_colon_and_trims() {
        let records = parse_price_lines("  Wireless Mouse : $24.99 (was: $29.99)  ");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].product, "Wireless Mouse");
        assert_eq!(records[0].optimized_price, "$24.99 (was: $29.99)");
    }

    #[test]
    fn empty_text_yields_no_records() {
        assert!(parse_price_lines("").is_empty());
        assert!(parse_price_lines("\n\n").is_empty());
    }
}
