//! Batch sentiment analysis.
//!
//! `analyze` never fails: without a credential it returns mock data, and any
//! transport or parse failure turns into one `Error` result per input.

use std::sync::{Arc, Mutex};

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use tracing::{error, info, warn};

use crate::error::BatchError;
use crate::gemini::{GenerateRequest, TextModel};
use crate::mock;
use crate::normalize::normalize_reply;
use crate::types::AnalysisResult;

pub struct SentimentService {
    model: Option<Arc<dyn TextModel>>,
    rng: Mutex<Box<dyn RngCore + Send>>,
}

impl SentimentService {
    /// `model` is `None` when no credential is configured.
    pub fn new(model: Option<Arc<dyn TextModel>>) -> Self {
        Self::with_rng(model, Box::new(StdRng::from_entropy()))
    }

    /// Same as `new` with an explicit random source for the mock path.
    pub fn with_rng(model: Option<Arc<dyn TextModel>>, rng: Box<dyn RngCore + Send>) -> Self {
        Self {
            model,
            rng: Mutex::new(rng),
        }
    }

    pub fn is_live(&self) -> bool {
        self.model.is_some()
    }

    /// Analyse a batch. The result has the same length and order as `texts`.
    pub async fn analyze(&self, texts: &[String]) -> Vec<AnalysisResult> {
        let Some(model) = self.model.as_ref() else {
            warn!(count = texts.len(), "No API credential, returning mock sentiment data");
            return self.mock(texts);
        };

        match self.analyze_live(&**model, texts).await {
            Ok(results) => results,
            Err(e) => {
                error!(error = %e, count = texts.len(), "Batch analysis failed, returning error results");
                let detail = e.diagnostic();
                texts.iter().map(|_| AnalysisResult::error(detail)).collect()
            }
        }
    }

    async fn analyze_live(
        &self,
        model: &dyn TextModel,
        texts: &[String],
    ) -> Result<Vec<AnalysisResult>, BatchError> {
        info!(count = texts.len(), "Sending batch for analysis");

        let request = GenerateRequest {
            json_output: true,
            ..GenerateRequest::prompt(build_prompt(texts))
        };
        let reply = model.generate(request).await?;
        Ok(normalize_reply(&reply.text, texts.len())?)
    }

    fn mock(&self, texts: &[String]) -> Vec<AnalysisResult> {
        match self.rng.lock() {
            Ok(mut rng) => mock::mock_batch(texts, &mut **rng),
            // A poisoned lock only means another caller panicked mid-draw
            Err(poisoned) => {
                let mut rng = poisoned.into_inner();
                mock::mock_batch(texts, &mut **rng)
            }
        }
    }
}

/// Instruction sent to the model for one batch. The inputs are embedded as a JSON array.
pub fn build_prompt(texts: &[String]) -> String {
    let texts_json = serde_json::to_string(texts).unwrap_or_else(|_| "[]".to_string());

    format!(
        r#"Reply with ONE valid JSON array and nothing else: no prose, no comments, no notes before, after or inside the JSON.
Analyze the sentiment and detect the language of every text in this JSON array:
{texts_json}

The reply array must have exactly one element per input text, in the same order as the input.
Every element must be an object with exactly these fields and no others:
{{
  "detectedLanguage": "en" | "fr" | "de" | "es" | "hi" | "unknown",
  "sentiment": "Positive" | "Negative" | "Neutral",
  "score": float,
  "emotions": ["emotion1", "emotion2", ...],
  "keywords": ["keyword1", "keyword2", ...]
}}
Field rules:
- "detectedLanguage": one of "en" (English), "fr" (French), "de" (German), "es" (Spanish), "hi" (Hindi). Use "unknown" for any other or unclear language. Only the code string.
- "sentiment": "Positive", "Negative" or "Neutral", judged in the detected language. Only the label string.
- "score": a number between 0.0 and 1.0 giving the confidence of the sentiment. Only the number.
- "emotions": an array of at most 3 dominant emotions (for example joy, anger, sadness, fear, surprise, love, excitement, frustration, calm, indifferent). Use an empty array when none apply.
- "keywords": an array of at most 5 relevant keywords from the text, without stop words. Use an empty array when none apply. Give this field once.

If a text cannot be analyzed, still return an element for it, exactly:
{{"detectedLanguage": (the detected language, or "unknown"), "sentiment": "Error", "score": 0, "emotions": [], "keywords": ["short error detail"]}}
Never omit an element. The whole reply is this single JSON array of result objects."#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelError;
    use crate::gemini::testing::ScriptedModel;
    use crate::gemini::ModelReply;
    use crate::types::{Language, Sentiment};

    fn texts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn live(model: &Arc<ScriptedModel>) -> SentimentService {
        let model: Arc<dyn TextModel> = model.clone();
        SentimentService::new(Some(model))
    }

    #[tokio::test]
    async fn test_mock_path_without_credential() {
        let service = SentimentService::with_rng(None, Box::new(StdRng::seed_from_u64(3)));
        assert!(!service.is_live());

        let results = service.analyze(&texts(&["a", "b", "c"])).await;
        assert_eq!(results.len(), 3);
        for result in &results {
            assert!(matches!(
                result.sentiment,
                Sentiment::Positive | Sentiment::Negative | Sentiment::Neutral
            ));
            assert!(Language::ALL.contains(&result.detected_language));
            assert!((0.0..=1.0).contains(&result.score));
        }
    }

    #[tokio::test]
    async fn test_transport_error_falls_back_per_input() {
        let model = Arc::new(ScriptedModel::failing());
        let results = live(&model).analyze(&texts(&["x", "y"])).await;

        assert_eq!(results.len(), 2);
        for result in &results {
            assert_eq!(result.sentiment, Sentiment::Error);
            assert_eq!(result.score, 0.0);
            assert!(result.emotions.is_empty());
            assert_eq!(result.keywords, vec!["processing error"]);
            assert_eq!(result.detected_language, Language::Unknown);
        }
    }

    #[tokio::test]
    async fn test_object_reply_fails_whole_batch() {
        let model = Arc::new(ScriptedModel::replying(
            r#"{"sentiment":"Positive","score":0.9,"emotions":[],"keywords":[],"detectedLanguage":"en"}"#,
        ));
        let results = live(&model).analyze(&texts(&["good", "bad"])).await;

        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.sentiment == Sentiment::Error));
        assert!(results.iter().all(|r| r.keywords == vec!["processing error"]));
    }

    #[tokio::test]
    async fn test_unparseable_reply_reports_json_error() {
        let model = Arc::new(ScriptedModel::replying("I could not analyze these texts."));
        let results = live(&model).analyze(&texts(&["one"])).await;

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].sentiment, Sentiment::Error);
        assert_eq!(results[0].keywords, vec!["API JSON error"]);
    }

    #[tokio::test]
    async fn test_fenced_reply_is_aligned_with_input() {
        let reply = r#"```json
[
  {"detectedLanguage":"en","sentiment":"Positive","score":0.93,"emotions":["joy"],"keywords":["love","update"]},
  {"detectedLanguage":"fr","sentiment":"negative","score":7,"emotions":["anger"],"keywords":["retard"]},
  "not an object"
]
```"#;
        let model = Arc::new(ScriptedModel::replying(reply));
        let input = texts(&["Love the update", "Livraison en retard", "???"]);
        let results = live(&model).analyze(&input).await;

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].sentiment, Sentiment::Positive);
        assert_eq!(results[0].detected_language, Language::En);
        assert_eq!(results[1].sentiment, Sentiment::Negative);
        assert_eq!(results[1].score, 1.0);
        assert_eq!(results[1].detected_language, Language::Fr);
        assert_eq!(results[2].sentiment, Sentiment::Error);
        assert_eq!(results[2].keywords, vec!["parsing error"]);
    }

    #[tokio::test]
    async fn test_request_embeds_batch_and_asks_for_json() {
        let model = Arc::new(ScriptedModel::new(vec![Ok(ModelReply::text("[]"))]));
        let input = texts(&["first \"quoted\"", "second"]);
        let results = live(&model).analyze(&input).await;
        assert_eq!(results.len(), 2);

        let requests = model.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].json_output);
        assert!(!requests[0].search_grounding);
        let prompt = &requests[0].contents[0].parts[0].text;
        assert!(prompt.contains(&serde_json::to_string(&input).unwrap()));
    }

    #[tokio::test]
    async fn test_blocked_prompt_is_a_processing_error() {
        let model = Arc::new(ScriptedModel::new(vec![Err(ModelError::Blocked("SAFETY".to_string()))]));
        let results = live(&model).analyze(&texts(&["x"])).await;
        assert_eq!(results[0].keywords, vec!["processing error"]);
    }

    #[test]
    fn test_prompt_lists_constraints() {
        let prompt = build_prompt(&texts(&["hello"]));
        assert!(prompt.contains(r#"["hello"]"#));
        assert!(prompt.contains("\"sentiment\": \"Error\""));
        assert!(prompt.contains("at most 3"));
        assert!(prompt.contains("at most 5"));
    }
}
