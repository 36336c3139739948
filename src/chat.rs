//! Chat assistant turns.
//!
//! Unlike batch analysis, a failed turn is returned to the caller as an error.
//! The session is dropped at the same time so the next turn starts a new one.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::ChatError;
use crate::gemini::{Content, GenerateRequest, RawGroundingChunk, TextModel};
use crate::types::{ChatMessage, ChatReply, GroundingChunk, WebSource};

pub const ASSISTANT_PERSONA: &str = "You are Caramel AI, a friendly assistant inside the Social Pulse \
sentiment analysis tool, built by HERE AND NOW AI. Help users understand social media sentiment \
results, suggest marketing actions, and answer general social media marketing questions. Keep answers \
concise and professional. Use Google Search grounding for current events or data you do not have, and \
cite your sources when you do.";

pub const DEMO_REPLY: &str =
    "I'm currently in a demo mode as the API key is not set. I can't process your request right now.";

/// Conversation state carried between turns.
#[derive(Debug, Default)]
pub struct ChatSession {
    turns: Vec<Content>,
}

impl ChatSession {
    pub fn create() -> Self {
        Self::default()
    }

    pub fn turns(&self) -> &[Content] {
        &self.turns
    }

    fn request_for(&self, message: &str) -> GenerateRequest {
        let mut contents = self.turns.clone();
        contents.push(Content::user(message));
        GenerateRequest {
            contents,
            system_instruction: Some(ASSISTANT_PERSONA.to_string()),
            json_output: false,
            search_grounding: true,
        }
    }

    fn record(&mut self, message: &str, reply: &str) {
        self.turns.push(Content::user(message));
        self.turns.push(Content::model(reply));
    }
}

pub struct ChatHandler {
    model: Option<Arc<dyn TextModel>>,
    session: Option<ChatSession>,
}

impl ChatHandler {
    /// `model` is `None` when no credential is configured.
    pub fn new(model: Option<Arc<dyn TextModel>>) -> Self {
        Self { model, session: None }
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    /// Drop the current session. The next turn creates a new one.
    pub fn invalidate(&mut self) {
        if self.session.take().is_some() {
            debug!("Chat session discarded");
        }
    }

    /// Send one user turn.
    ///
    /// `history` is the caller's transcript. Context comes from the session, which
    /// holds every turn that completed since it was created.
    pub async fn respond(
        &mut self,
        history: &[ChatMessage],
        message: &str,
    ) -> Result<ChatReply, ChatError> {
        let Some(model) = self.model.clone() else {
            warn!("No API credential, returning demo chat reply");
            return Ok(ChatReply {
                text: DEMO_REPLY.to_string(),
                sources: Vec::new(),
            });
        };

        let session = self.session.get_or_insert_with(ChatSession::create);
        debug!(
            transcript = history.len(),
            session_turns = session.turns().len(),
            "Sending chat turn"
        );

        match model.generate(session.request_for(message)).await {
            Ok(reply) => {
                session.record(message, &reply.text);
                Ok(ChatReply {
                    text: reply.text,
                    sources: cited_sources(reply.grounding),
                })
            }
            Err(e) => {
                warn!(error = %e, "Chat turn failed, resetting session");
                self.invalidate();
                Err(e.into())
            }
        }
    }
}

/// Keep only citations that have both a URI and a title.
pub fn cited_sources(chunks: Vec<RawGroundingChunk>) -> Vec<GroundingChunk> {
    chunks
        .into_iter()
        .filter_map(|chunk| {
            let web = chunk.web?;
            Some(GroundingChunk {
                web: WebSource {
                    uri: web.uri?,
                    title: web.title?,
                },
            })
        })
        .collect()
}

/// Render a reply with its numbered source list, the way the transcript shows it.
pub fn format_reply(reply: &ChatReply) -> String {
    let mut text = reply.text.clone();
    if !reply.sources.is_empty() {
        text.push_str("\n\n**Sources:**\n");
        for (i, source) in reply.sources.iter().enumerate() {
            let label = if source.web.title.is_empty() {
                &source.web.uri
            } else {
                &source.web.title
            };
            text.push_str(&format!("{}. [{}]({})\n", i + 1, label, source.web.uri));
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelError;
    use crate::gemini::testing::ScriptedModel;
    use crate::gemini::{ModelReply, RawWebSource, Role};

    fn chunk(uri: Option<&str>, title: Option<&str>) -> RawGroundingChunk {
        RawGroundingChunk {
            web: Some(RawWebSource {
                uri: uri.map(str::to_string),
                title: title.map(str::to_string),
            }),
        }
    }

    fn handler(model: &Arc<ScriptedModel>) -> ChatHandler {
        let model: Arc<dyn TextModel> = model.clone();
        ChatHandler::new(Some(model))
    }

    #[tokio::test]
    async fn test_demo_reply_without_credential() {
        let mut chat = ChatHandler::new(None);
        let reply = chat.respond(&[], "hello").await.unwrap();
        assert_eq!(reply.text, DEMO_REPLY);
        assert!(reply.sources.is_empty());
        assert!(!chat.has_session());
    }

    #[tokio::test]
    async fn test_session_accumulates_turns() {
        let model = Arc::new(ScriptedModel::new(vec![
            Ok(ModelReply::text("Hi! How can I help?")),
            Ok(ModelReply::text("Negative comments mention shipping.")),
        ]));
        let mut chat = handler(&model);

        chat.respond(&[], "hello").await.unwrap();
        let reply = chat.respond(&[], "what are people upset about?").await.unwrap();
        assert_eq!(reply.text, "Negative comments mention shipping.");

        let requests = model.requests();
        assert_eq!(requests[0].contents.len(), 1);
        assert_eq!(requests[1].contents.len(), 3);
        assert_eq!(requests[1].contents[1].role, Role::Model);
        assert!(requests[1].search_grounding);
        assert_eq!(requests[1].system_instruction.as_deref(), Some(ASSISTANT_PERSONA));
    }

    #[tokio::test]
    async fn test_error_propagates_and_resets_session() {
        let model = Arc::new(ScriptedModel::new(vec![
            Ok(ModelReply::text("first")),
            Err(ModelError::Status {
                status: 500,
                body: "boom".to_string(),
            }),
            Ok(ModelReply::text("fresh start")),
        ]));
        let mut chat = handler(&model);

        chat.respond(&[], "one").await.unwrap();
        assert!(chat.has_session());

        let err = chat.respond(&[], "two").await.unwrap_err();
        assert!(matches!(err, ChatError::Model(ModelError::Status { status: 500, .. })));
        assert!(!chat.has_session());

        chat.respond(&[], "three").await.unwrap();
        let requests = model.requests();
        assert_eq!(requests[2].contents.len(), 1);
        assert_eq!(requests[2].contents[0].parts[0].text, "three");
    }

    #[tokio::test]
    async fn test_incomplete_sources_are_dropped() {
        let model = Arc::new(ScriptedModel::new(vec![Ok(ModelReply {
            text: "See these".to_string(),
            grounding: vec![
                chunk(Some("https://a.example"), Some("A")),
                chunk(Some("https://b.example"), None),
                chunk(None, Some("C")),
                RawGroundingChunk { web: None },
            ],
        })]));
        let mut chat = handler(&model);

        let reply = chat.respond(&[], "sources?").await.unwrap();
        assert_eq!(reply.sources.len(), 1);
        assert_eq!(reply.sources[0].web.uri, "https://a.example");
        assert_eq!(reply.sources[0].web.title, "A");
    }

    #[test]
    fn test_invalidate_is_idempotent() {
        let mut chat = ChatHandler::new(None);
        chat.invalidate();
        chat.invalidate();
        assert!(!chat.has_session());
    }

    #[test]
    fn test_format_reply_numbers_sources() {
        let reply = ChatReply {
            text: "Answer".to_string(),
            sources: cited_sources(vec![
                chunk(Some("https://a.example"), Some("A")),
                chunk(Some("https://b.example"), Some("")),
            ]),
        };
        assert_eq!(
            format_reply(&reply),
            "Answer\n\n**Sources:**\n1. [A](https://a.example)\n2. [https://b.example](https://b.example)\n"
        );

        let bare = ChatReply {
            text: "Plain".to_string(),
            sources: Vec::new(),
        };
        assert_eq!(format_reply(&bare), "Plain");
    }
}
