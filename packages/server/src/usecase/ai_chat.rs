//! UseCase: short AI chat replies
//!
//! One message in, one short plain-text summary out. Shares the text
//! generator with task suggestions; without one, or when it fails, a local
//! reply is returned together with the reason in `error`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::TextGenerator;

use super::error::ChatError;

const MAX_SUMMARY_CHARS: usize = 200;

const INSTRUCTIONS: &str = "You are an AI agent. Answer the user shortly, in roughly 50 to 200 \
characters of simple normal text. Respond ONLY with a single JSON object of the form \
{\"summary\": \"<your answer>\"}.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub summary: String,
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeneratedReply {
    summary: Option<String>,
}

pub struct AiChatUseCase {
    generator: Option<Arc<dyn TextGenerator>>,
}

impl AiChatUseCase {
    pub fn new(generator: Option<Arc<dyn TextGenerator>>) -> Self {
        Self { generator }
    }

    pub async fn chat(&self, message: &str) -> Result<ChatReply, ChatError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(ChatError::Validation("message must not be empty".to_string()));
        }

        let Some(generator) = &self.generator else {
            return Ok(ChatReply {
                summary: local_reply(message),
                error: Some("AI provider is not configured".to_string()),
            });
        };

        let request = format!("{}\n\nUser: {}\n\nAssistant:", INSTRUCTIONS, message);
        let generated = generator
            .generate(&request)
            .await
            .map_err(|e| e.to_string())
            .and_then(|text| parse_generated(&text));

        match generated {
            Ok(summary) => Ok(ChatReply {
                summary,
                error: None,
            }),
            Err(e) => {
                tracing::warn!("Falling back to a local chat reply: {}", e);
                Ok(ChatReply {
                    summary: local_reply(message),
                    error: Some(e),
                })
            }
        }
    }
}

/// Accepts `{"summary": ...}` or, failing that, bare text.
fn parse_generated(text: &str) -> Result<String, String> {
    let text = text.trim();
    let summary = match serde_json::from_str::<GeneratedReply>(text) {
        Ok(reply) => reply.summary.unwrap_or_default(),
        Err(_) if !text.starts_with('{') => text.to_string(),
        Err(e) => return Err(format!("not a JSON reply: {}", e)),
    };
    let summary = summary.trim();
    if summary.is_empty() {
        return Err("reply is empty".to_string());
    }
    Ok(summary.chars().take(MAX_SUMMARY_CHARS).collect())
}

/// First sentence of the message, echoed back
fn local_reply(message: &str) -> String {
    let first_sentence = message
        .split_inclusive(['.', '!', '?', '\n'])
        .next()
        .unwrap_or(message)
        .trim();
    let reply = format!("Noted: {}", first_sentence);
    reply.chars().take(MAX_SUMMARY_CHARS).collect()
}
