use crate::domain::recommendation::RecommendationRecord;
use crate::llm::TextGenerator;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Ask the model for product names based on the search history and decorate
/// each returned line with a pseudo match score.
pub async fn recommend(
    llm: &dyn TextGenerator,
    search_history: &[String],
) -> anyhow::Result<Vec<RecommendationRecord>> {
    let prompt = build_prompt(search_history);
    let text = llm.generate(&prompt).await?;
    Ok(parse_recommendations(&text))
}

pub fn build_prompt(search_history: &[String]) -> String {
    format!(
        "Based on the search history {}, generate a list of product names in these categories: \
         Gaming Consoles, Beauty Products, and Accessories. Only include the product names and \
         ensure diversity in the suggestions.",
        search_history.join(", ")
    )
}

pub fn parse_recommendations(text: &str) -> Vec<RecommendationRecord> {
    let mut out = Vec::new();
    for line in text.lines() {
        let product = line.trim();
        if product.is_empty() {
            continue;
        }
        let match_percentage = match_score(product);
        // Score floor is 70, so "Good match" is currently unreachable.
        let label = if match_percentage >= 70.0 {
            "Best match"
        } else {
            "Good match"
        };
        out.push(RecommendationRecord {
            product: product.to_string(),
            match_percentage,
            tag: format!("{label} ({match_percentage}%)"),
        });
    }
    out
}

/// Deterministic pseudo score in [70, 100) derived from the product name.
/// Exact values depend on the hasher and are not a wire contract.
fn match_score(name: &str) -> f64 {
    let mut hasher = DefaultHasher::new();
    name.hash(&mut hasher);
    let bucket = (hasher.finish() % 100) as f64;
    ((70.0 + 30.0 * bucket / 100.0) * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Provider;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedGenerator {
        text: &'static str,
        calls: AtomicUsize,
    }

    impl FixedGenerator {
        fn new(text: &'static str) -> Self {
            Self {
                text,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait::async_trait]
    impl TextGenerator for FixedGenerator {
        fn provider(&self) -> Provider {
            Provider::Cohere
        }

        async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
            assert!(!prompt.is_empty(), "gateway must never see an empty prompt");
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.text.to_string())
        }
    }

    #[test]
    fn prompt_contains_every_search_term() {
        let history = vec!["ps5 games".to_string(), "lipstick".to_string()];
        let prompt = build_prompt(&history);
        assert!(prompt.contains("ps5 games, lipstick"));
        assert!(prompt.contains("Gaming Consoles, Beauty Products, and Accessories"));
    }

    #[test]
    fn parses_nonempty_lines_in_order() {
        let records = parse_recommendations("A\nB\n\nC");
        let products: Vec<_> = records.iter().map(|r| r.product.as_str()).collect();
        assert_eq!(products, vec!["A", "B", "C"]);
    }

    #[test]
    fn scores_stay_in_range_and_tag_matches() {
        let records = parse_recommendations("PlayStation 5\n  Nintendo Switch  \nMascara");
        assert_eq!(records.len(), 3);
        for record in &records {
            assert!(
                (70.0..=100.0).contains(&record.match_percentage),
                "score out of range: {}",
                record.match_percentage
            );
            assert_eq!(
                record.tag,
                format!("Best match ({}%)", record.match_percentage)
            );
        }
        // Leading/trailing whitespace is stripped before scoring.
        assert_eq!(records[1].product, "Nintendo Switch");
    }

    #[test]
    fn score_is_deterministic_per_name() {
        assert_eq!(match_score("Xbox Series X"), match_score("Xbox Series X"));
    }

    #[test]
    fn empty_generation_yields_no_records() {
        assert!(parse_recommendations("\n  \n").is_empty());
    }

    #[tokio::test]
    async fn recommend_calls_gateway_once_with_built_prompt() {
        let llm = FixedGenerator::new("Keyboard\nController");
        let history = vec!["gaming".to_string()];

        let records = recommend(&llm, &history).await.unwrap();

        assert_eq!(llm.calls.load(Ordering::SeqCst), 1);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].product, "Keyboard");
    }
}
