// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat turn preparation.
//!
//! Builds the message list a chat-completion client sends, keeping the
//! conversation history in a [`ConversationStore`]. Calling the completion
//! service itself is left to the caller.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::RetrieverConfig;
use crate::store::ConversationStore;

/// Conversation id used when the caller does not name one.
pub const DEFAULT_CONVERSATION_ID: &str = "default";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "system" => Ok(Role::System),
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            other => bail!("unknown chat role: {other}"),
        }
    }
}

/// One message in the chat-completion wire shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Payload for a chat-completion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub stream: bool,
    pub messages: Vec<ChatMessage>,
}

/// A system prompt plus the retriever settings that shape each request.
#[derive(Debug, Clone)]
pub struct ChatSession {
    system_prompt: String,
    model: String,
    streaming: bool,
}

impl ChatSession {
    pub fn new(config: &RetrieverConfig, system_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            model: config.model.clone(),
            streaming: config.streaming,
        }
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Records the user message and returns the request for this turn:
    /// the system message followed by the whole conversation so far.
    ///
    /// The system message is never stored, so changing it between turns
    /// affects every later request.
    pub fn prepare_turn(
        &self,
        store: &mut dyn ConversationStore,
        conversation_id: &str,
        user_content: &str,
    ) -> Result<ChatRequest> {
        store.append(conversation_id, ChatMessage::user(user_content))?;
        let history = store.history(conversation_id)?;

        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(ChatMessage::system(self.system_prompt.clone()));
        messages.extend(history);

        tracing::debug!(
            conversation_id,
            messages = messages.len(),
            "prepared chat turn"
        );
        Ok(self.request(messages))
    }

    /// Stores the assistant's reply so the next turn sees it.
    pub fn record_reply(
        &self,
        store: &mut dyn ConversationStore,
        conversation_id: &str,
        reply: &str,
    ) -> Result<()> {
        store.append(conversation_id, ChatMessage::assistant(reply))
    }

    pub fn request(&self, messages: Vec<ChatMessage>) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            stream: self.streaming,
            messages,
        }
    }
}
