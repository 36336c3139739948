//! Terminal and JSON rendering of a finished batch.

use serde::Serialize;
use std::fmt::Write;

use crate::summary::BatchSummary;
use crate::types::{AnalysisResult, Language, Sentiment};

#[derive(Debug, Serialize)]
pub struct AnalyzedText<'a> {
    pub text: &'a str,
    pub result: &'a AnalysisResult,
}

#[derive(Debug, Serialize)]
pub struct BatchReport<'a> {
    pub results: Vec<AnalyzedText<'a>>,
    pub summary: BatchSummary,
}

impl<'a> BatchReport<'a> {
    pub fn new(texts: &'a [String], results: &'a [AnalysisResult]) -> Self {
        Self {
            results: texts
                .iter()
                .zip(results)
                .map(|(text, result)| AnalyzedText { text, result })
                .collect(),
            summary: BatchSummary::from_results(results),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Human-readable report, grouped by detected language.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let summary = &self.summary;

        let _ = writeln!(
            out,
            "📊 Showing results for {} comment(s), grouped by detected language.",
            summary.total
        );

        for group in &summary.groups {
            let _ = writeln!(
                out,
                "\n== {} Comments ({}) ==",
                group.language.display_name(),
                group.indices.len()
            );
            for &index in &group.indices {
                if let Some(item) = self.results.get(index) {
                    render_item(&mut out, index, item);
                }
            }
        }

        let _ = writeln!(out, "\n--- Summary ---");
        let _ = writeln!(
            out,
            "Overall: {} ({:.2})",
            summary.overall, summary.overall_score
        );
        for count in &summary.counts {
            let _ = writeln!(out, "  {:<9} {}", count.sentiment.as_str(), count.count);
        }
        let languages: Vec<&str> = summary.languages.iter().map(Language::display_name).collect();
        let _ = writeln!(out, "Languages: {}", languages.join(", "));

        out
    }
}

fn render_item(out: &mut String, index: usize, item: &AnalyzedText<'_>) {
    let result = item.result;
    let _ = writeln!(out, "#{} \"{}\"", index + 1, item.text);

    if result.sentiment == Sentiment::Error {
        let _ = writeln!(out, "   ⚠️ Analysis Error");
        if !result.keywords.is_empty() {
            let _ = writeln!(out, "   Details: {}", result.keywords.join(", "));
        }
        return;
    }

    let _ = writeln!(
        out,
        "   {} ({:.0}% confidence)",
        result.sentiment,
        result.score * 100.0
    );
    if !result.emotions.is_empty() {
        let _ = writeln!(out, "   Emotions: {}", result.emotions.join(", "));
    }
    if !result.keywords.is_empty() {
        let _ = writeln!(out, "   Keywords: {}", result.keywords.join(", "));
    }
}
