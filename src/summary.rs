//! Aggregate view over a batch of results.

use serde::Serialize;

use crate::types::{AnalysisResult, Language, Sentiment};

/// Average signed score above which the batch reads as Positive (below the negation, Negative).
const OVERALL_THRESHOLD: f64 = 0.1;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SentimentCount {
    pub sentiment: Sentiment,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageGroup {
    pub language: Language,
    /// Positions in the input batch
    pub indices: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub total: usize,
    pub overall: Sentiment,
    pub overall_score: f64,
    /// Only labels that occur, in Positive/Negative/Neutral/Error order
    pub counts: Vec<SentimentCount>,
    /// Distinct languages in first-seen order
    pub languages: Vec<Language>,
    pub groups: Vec<LanguageGroup>,
}

impl BatchSummary {
    pub fn from_results(results: &[AnalysisResult]) -> Self {
        let (overall, overall_score) = overall_sentiment(results);

        let counts = Sentiment::REPORTED
            .iter()
            .map(|s| SentimentCount {
                sentiment: *s,
                count: results.iter().filter(|r| r.sentiment == *s).count(),
            })
            .filter(|c| c.count > 0)
            .collect();

        let mut languages = Vec::new();
        for result in results {
            if !languages.contains(&result.detected_language) {
                languages.push(result.detected_language);
            }
        }

        Self {
            total: results.len(),
            overall,
            overall_score,
            counts,
            languages,
            groups: group_by_language(results),
        }
    }

    pub fn count_of(&self, sentiment: Sentiment) -> usize {
        self.counts
            .iter()
            .find(|c| c.sentiment == sentiment)
            .map(|c| c.count)
            .unwrap_or(0)
    }
}

/// Mean of +score (Positive), -score (Negative) and 0 (Neutral) over non-Error results.
pub fn overall_sentiment(results: &[AnalysisResult]) -> (Sentiment, f64) {
    if results.is_empty() {
        return (Sentiment::None, 0.0);
    }

    let signed: Vec<f64> = results
        .iter()
        .filter(|r| !r.is_error())
        .map(|r| match r.sentiment {
            Sentiment::Positive => r.score,
            Sentiment::Negative => -r.score,
            _ => 0.0,
        })
        .collect();

    if signed.is_empty() {
        return (Sentiment::Error, 0.0);
    }

    let average = signed.iter().sum::<f64>() / signed.len() as f64;
    let sentiment = if average > OVERALL_THRESHOLD {
        Sentiment::Positive
    } else if average < -OVERALL_THRESHOLD {
        Sentiment::Negative
    } else {
        Sentiment::Neutral
    };
    (sentiment, average.abs())
}

/// Result positions grouped by language, in en/fr/de/es/hi/unknown order. Empty groups are skipped.
pub fn group_by_language(results: &[AnalysisResult]) -> Vec<LanguageGroup> {
    Language::ALL
        .iter()
        .map(|language| LanguageGroup {
            language: *language,
            indices: results
                .iter()
                .enumerate()
                .filter(|(_, r)| r.detected_language == *language)
                .map(|(i, _)| i)
                .collect(),
        })
        .filter(|g| !g.indices.is_empty())
        .collect()
}
