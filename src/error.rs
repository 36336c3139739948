use thiserror::Error;

/// Failure talking to the generative-language API.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("request to model API failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("model API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("prompt blocked by model API: {0}")]
    Blocked(String),

    #[error("model API returned no candidates")]
    EmptyReply,
}

/// The reply arrived but could not be read as a batch of results.
#[derive(Debug, Error)]
pub enum ReplyError {
    #[error("invalid JSON response from model: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("expected a JSON array, got {0}")]
    NotAnArray(&'static str),
}

/// Whole-batch failure. Never escapes `SentimentService::analyze`; it is folded into
/// one `Error` result per input.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Reply(#[from] ReplyError),
}

impl BatchError {
    /// Short text placed in each fallback result's `keywords`.
    pub fn diagnostic(&self) -> &'static str {
        match self {
            BatchError::Reply(ReplyError::Malformed(_)) => "API JSON error",
            _ => "processing error",
        }
    }
}

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("chat turn failed: {0}")]
    Model(#[from] ModelError),
}
