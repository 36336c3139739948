//! Core data model shared by the analysis and chat paths.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sentiment label attached to one analysed comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
    /// Per-item failure, either signalled by the model or produced by the batch fallback
    Error,
    /// "No data yet" placeholder. Never produced by analysis.
    None,
}

impl Sentiment {
    /// Labels that an analysis can report in the summary counts.
    pub const REPORTED: [Sentiment; 4] = [
        Sentiment::Positive,
        Sentiment::Negative,
        Sentiment::Neutral,
        Sentiment::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "Positive",
            Sentiment::Negative => "Negative",
            Sentiment::Neutral => "Neutral",
            Sentiment::Error => "Error",
            Sentiment::None => "None",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Language codes the model is allowed to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    Fr,
    De,
    Es,
    Hi,
    Unknown,
}

impl Default for Language {
    fn default() -> Self {
        Language::Unknown
    }
}

impl Language {
    /// Display order used when grouping results.
    pub const ALL: [Language; 6] = [
        Language::En,
        Language::Fr,
        Language::De,
        Language::Es,
        Language::Hi,
        Language::Unknown,
    ];

    /// Exact, case-sensitive match against the detectable codes.
    /// Anything else, including `"unknown"` itself, maps to `Unknown`.
    pub fn from_code(code: &str) -> Language {
        match code {
            "en" => Language::En,
            "fr" => Language::Fr,
            "de" => Language::De,
            "es" => Language::Es,
            "hi" => Language::Hi,
            _ => Language::Unknown,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Fr => "fr",
            Language::De => "de",
            Language::Es => "es",
            Language::Hi => "hi",
            Language::Unknown => "unknown",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Language::En => "English",
            Language::Fr => "French",
            Language::De => "German",
            Language::Es => "Spanish",
            Language::Hi => "Hindi",
            Language::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Result of analysing one input comment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub sentiment: Sentiment,
    /// Confidence, always within [0.0, 1.0]
    pub score: f64,
    pub emotions: Vec<String>,
    /// Carries the diagnostic text when `sentiment` is `Error`
    pub keywords: Vec<String>,
    pub detected_language: Language,
}

impl AnalysisResult {
    /// An `Error` result carrying a single diagnostic string.
    pub fn error(detail: impl Into<String>) -> Self {
        Self {
            sentiment: Sentiment::Error,
            score: 0.0,
            emotions: Vec::new(),
            keywords: vec![detail.into()],
            detected_language: Language::Unknown,
        }
    }

    pub fn is_error(&self) -> bool {
        self.sentiment == Sentiment::Error
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

/// One line of a chat transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub text: String,
    pub sender: Sender,
    /// Milliseconds since the unix epoch
    pub timestamp: i64,
}

impl ChatMessage {
    pub fn new(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            text: text.into(),
            sender,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebSource {
    pub uri: String,
    pub title: String,
}

/// A citation backing a chat reply. Only complete web citations make it here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundingChunk {
    pub web: WebSource,
}

/// What a chat turn hands back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatReply {
    pub text: String,
    pub sources: Vec<GroundingChunk>,
}
