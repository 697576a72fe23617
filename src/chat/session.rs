use super::message::{ChatMessage, Role};
use super::rules::SafetyRules;
use anyhow::Result;
use std::sync::Arc;
use tracing::{error, info};

pub const SUPPORT_GREETING: &str = "Hello, I'm here to provide information and support related to drugs, alcohol, and suicide prevention. How can I assist you today?";

pub const RESET_GREETING: &str = "Hello! How can I help you today?";

/// Generates the assistant's next reply from the conversation so far
#[async_trait::async_trait]
pub trait ChatCompletion: Send + Sync {
    async fn complete(&self, history: &[ChatMessage]) -> Result<String>;
}

/// A support conversation: history plus the override table applied to replies
pub struct ChatSession {
    completion: Arc<dyn ChatCompletion>,
    rules: SafetyRules,
    history: Vec<ChatMessage>,
}

impl ChatSession {
    /// Start a conversation with the support greeting
    pub fn new(completion: Arc<dyn ChatCompletion>, rules: SafetyRules) -> Self {
        Self::with_greeting(completion, rules, SUPPORT_GREETING)
    }

    pub fn with_greeting(
        completion: Arc<dyn ChatCompletion>,
        rules: SafetyRules,
        greeting: &str,
    ) -> Self {
        Self {
            completion,
            rules,
            history: vec![ChatMessage::assistant(greeting)],
        }
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    /// Send `input` and return the reply shown to the user.
    ///
    /// Blank input is ignored (`Ok(None)`). If the completion fails the user
    /// message stays in the history and the error is returned.
    pub async fn send(&mut self, input: &str) -> Result<Option<ChatMessage>> {
        if input.trim().is_empty() {
            return Ok(None);
        }

        self.history.push(ChatMessage::user(input));
        let generated = match self.completion.complete(&self.history).await {
            Ok(reply) => reply,
            Err(e) => {
                error!("Chat completion failed: {}", e);
                return Err(e);
            }
        };

        let shown = self.rules.apply(input, &generated).to_string();
        if shown != generated {
            info!("Replaced generated reply with a safety resource response");
        }

        let reply = ChatMessage::assistant(shown);
        self.history.push(reply.clone());
        Ok(Some(reply))
    }

    /// Start over with the short greeting
    pub fn reset(&mut self) {
        self.history = vec![ChatMessage::assistant(RESET_GREETING)];
    }

    /// Number of messages the user sent so far
    pub fn user_turns(&self) -> usize {
        self.history.iter().filter(|m| m.role == Role::User).count()
    }
}
