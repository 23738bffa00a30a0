//! Parsing the language model's answer into a tagged reply.

use serde_json::Value;
use thiserror::Error;

/// Message used when the model picks SQL but sends no query.
pub const EMPTY_QUERY_MESSAGE: &str =
    "I was unable to generate a SQL query for that request. Could you try rephrasing it?";

/// What the model decided to do with a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssistantReply {
    /// A plain answer to show the user.
    Conversational(String),
    /// A SQL query to run against the invoices.
    Queryable(String),
}

/// Failures at the language-model boundary.
///
/// The display text of each variant is what the user sees.
#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("The AI model did not provide a response. This might be due to content safety filters. Please try a different query.")]
    EmptyResponse,

    #[error("I received a malformed response from the AI. Could you please try rephrasing your question?")]
    Malformed(#[source] serde_json::Error),

    #[error("The AI returned a response with an unexpected format. Please try again.")]
    UnexpectedFormat,

    #[error("The AI returned an unknown response type. Please try again.")]
    UnknownType(String),

    #[error("The AI service is not configured correctly. Please check the API key.")]
    NotConfigured,

    #[error("I'm having trouble connecting to the AI service. Please try again in a moment.")]
    Unavailable(String),
}

/// Parse the raw model output.
///
/// Expects a JSON object `{"type": "sql" | "text", "content": "..."}`,
/// optionally wrapped in a fenced code block.
pub fn parse_reply(raw: &str) -> Result<AssistantReply, AssistantError> {
    let body = strip_code_fence(raw.trim());
    if body.is_empty() {
        return Err(AssistantError::EmptyResponse);
    }

    let json: Value = serde_json::from_str(body).map_err(AssistantError::Malformed)?;

    let (Some(kind), Some(content)) = (
        json.get("type").and_then(Value::as_str),
        json.get("content").and_then(Value::as_str),
    ) else {
        return Err(AssistantError::UnexpectedFormat);
    };

    match kind.trim().to_lowercase().as_str() {
        "text" => Ok(AssistantReply::Conversational(content.to_string())),
        "sql" if content.trim().is_empty() => {
            Ok(AssistantReply::Conversational(EMPTY_QUERY_MESSAGE.to_string()))
        }
        "sql" => Ok(AssistantReply::Queryable(content.trim().to_string())),
        other => Err(AssistantError::UnknownType(other.to_string())),
    }
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };

    // Drop an optional language tag on the opening fence
    let rest = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    rest.trim_end().trim_end_matches("```").trim()
}
