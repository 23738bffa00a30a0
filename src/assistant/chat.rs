//! Chat transcript for the ask-your-data assistant.

use crate::assistant::client::ChatBackend;
use crate::assistant::prompt::system_instruction;
use crate::assistant::reply::{parse_reply, AssistantError, AssistantReply};
use crate::query::{QueryEngine, QueryResult};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info, warn};

/// Who sent a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Ai,
}

/// One entry in the transcript.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub id: usize,
    pub sender: Sender,
    /// The user's question.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Conversational answer from the model.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_text: Option<String>,
    /// Query the model generated, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<QueryResult>,
    /// Plain error message shown instead of an answer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ChatMessage {
    fn empty(id: usize, sender: Sender) -> Self {
        Self {
            id,
            sender,
            text: None,
            response_text: None,
            sql: None,
            data: None,
            error: None,
        }
    }
}

/// Translates questions into replies through a language model.
pub struct Assistant<B: ChatBackend> {
    backend: B,
    today: NaiveDate,
}

impl<B: ChatBackend> Assistant<B> {
    pub fn new(backend: B, today: NaiveDate) -> Self {
        Self { backend, today }
    }

    pub fn model_name(&self) -> &str {
        self.backend.model_name()
    }

    /// Ask the model whether a question needs a query or a plain answer.
    pub async fn translate(&self, question: &str) -> Result<AssistantReply, AssistantError> {
        let system = system_instruction(self.today);
        let raw = self.backend.complete(&system, question).await?;
        debug!("Raw model reply: {}", raw);

        parse_reply(&raw).inspect_err(|e| {
            if matches!(e, AssistantError::Malformed(_)) {
                warn!("Raw AI response text that failed to parse: {}", raw);
            }
        })
    }
}

/// A running conversation with the assistant.
#[derive(Debug, Default)]
pub struct ChatSession {
    messages: Vec<ChatMessage>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Ask a question and record both sides of the exchange.
    ///
    /// Failures from the model or the query engine become an error
    /// message in the transcript; they are not retried.
    pub async fn ask<B: ChatBackend>(
        &mut self,
        assistant: &Assistant<B>,
        engine: &QueryEngine,
        question: &str,
    ) -> &ChatMessage {
        let mut user = ChatMessage::empty(self.messages.len() + 1, Sender::User);
        user.text = Some(question.to_string());
        self.messages.push(user);

        let mut reply = ChatMessage::empty(self.messages.len() + 1, Sender::Ai);

        match assistant.translate(question).await {
            Ok(AssistantReply::Conversational(text)) => {
                info!("Assistant answered conversationally");
                reply.response_text = Some(text);
            }
            Ok(AssistantReply::Queryable(sql)) => {
                info!("Assistant generated a query");
                match engine.run(&sql) {
                    Ok(result) => reply.data = Some(result),
                    Err(e) => {
                        warn!("Generated query failed: {}", e);
                        reply.error = Some(e.to_string());
                    }
                }
                reply.sql = Some(sql);
            }
            Err(e) => {
                warn!("Assistant request failed: {:?}", e);
                reply.error = Some(e.to_string());
            }
        }

        self.messages.push(reply);
        &self.messages[self.messages.len() - 1]
    }
}
