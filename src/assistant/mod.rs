//! Natural-language questions over the invoice data.
//!
//! A language model decides whether a question is conversational or can be
//! answered with SQL; queries run on the embedded engine in [`crate::query`].

pub mod chat;
pub mod client;
pub mod prompt;
pub mod reply;

pub use chat::{Assistant, ChatMessage, ChatSession, Sender};
pub use client::{ChatBackend, OllamaBackend, OllamaConfig};
pub use reply::{AssistantError, AssistantReply};
