//! Synthetic results used when no API credential is configured.
//!
//! Values are random, shape is not: one well-formed result per input, a sentiment
//! from {Positive, Negative, Neutral}, a score in [0.6, 1.0) and a language from the
//! supported set.

use rand::seq::SliceRandom;
use rand::{Rng, RngCore};

use crate::types::{AnalysisResult, Language, Sentiment};

const MOCK_SENTIMENTS: [Sentiment; 3] = [Sentiment::Positive, Sentiment::Negative, Sentiment::Neutral];

fn canned_emotions(sentiment: Sentiment) -> [&'static str; 2] {
    match sentiment {
        Sentiment::Positive => ["joy", "excitement"],
        Sentiment::Negative => ["anger", "frustration"],
        _ => ["calm", "indifferent"],
    }
}

/// One mock result for `text`, drawn from `rng`.
pub fn mock_result<R: RngCore + ?Sized>(text: &str, rng: &mut R) -> AnalysisResult {
    let sentiment = MOCK_SENTIMENTS[rng.gen_range(0..MOCK_SENTIMENTS.len())];
    let score = rng.gen_range(0.6..1.0);
    let detected_language = *Language::ALL.choose(rng).unwrap_or(&Language::Unknown);
    let snippet: String = text.chars().take(10).collect();

    AnalysisResult {
        sentiment,
        score,
        emotions: canned_emotions(sentiment).iter().map(|e| e.to_string()).collect(),
        keywords: vec!["mock".to_string(), snippet, "example".to_string()],
        detected_language,
    }
}

pub fn mock_batch<R: RngCore + ?Sized>(texts: &[String], rng: &mut R) -> Vec<AnalysisResult> {
    texts.iter().map(|text| mock_result(text, rng)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn texts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_mock_batch_is_structurally_valid() {
        let mut rng = StdRng::seed_from_u64(7);
        let results = mock_batch(&texts(&["a", "b", "c"]), &mut rng);

        assert_eq!(results.len(), 3);
        for result in &results {
            assert!(MOCK_SENTIMENTS.contains(&result.sentiment));
            assert!((0.6..1.0).contains(&result.score));
            assert_eq!(result.emotions.len(), 2);
            assert_eq!(result.keywords.len(), 3);
            assert!(Language::ALL.contains(&result.detected_language));
        }
    }

    #[test]
    fn test_keyword_snippet_uses_first_ten_chars() {
        let mut rng = StdRng::seed_from_u64(1);
        let result = mock_result("The delivery was late again", &mut rng);
        assert_eq!(result.keywords, vec!["mock", "The delive", "example"]);

        let result = mock_result("héllo wörld, ça va?", &mut rng);
        assert_eq!(result.keywords[1], "héllo wörl");
    }

    #[test]
    fn test_emotions_match_sentiment() {
        let mut rng = StdRng::seed_from_u64(99);
        for result in mock_batch(&texts(&["x"; 20]), &mut rng) {
            let expected: Vec<String> = canned_emotions(result.sentiment)
                .iter()
                .map(|e| e.to_string())
                .collect();
            assert_eq!(result.emotions, expected);
        }
    }

    #[test]
    fn test_same_seed_same_batch() {
        let batch = texts(&["one", "two", "three"]);
        let first = mock_batch(&batch, &mut StdRng::seed_from_u64(42));
        let second = mock_batch(&batch, &mut StdRng::seed_from_u64(42));
        assert_eq!(first, second);
    }
}
