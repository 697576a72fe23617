use super::message::{ChatMessage, ChatReply, ChatRequest};
use super::session::ChatCompletion;
use anyhow::{bail, Context, Result};
use async_nats::Client;
use std::time::Duration;
use tracing::{debug, info};

/// Chat completion over NATS request/reply
///
/// Sends `{ "messages": [...] }` on `subject` and expects
/// `{ "response": "..." }` or `{ "error": "..." }` back.
pub struct NatsChatCompletion {
    client: Client,
    subject: String,
    timeout: Duration,
}

impl NatsChatCompletion {
    /// Connect to NATS server
    pub async fn connect(url: &str, subject: String, timeout: Duration) -> Result<Self> {
        info!("Connecting to NATS at {}", url);

        let client = async_nats::connect(url)
            .await
            .context("Failed to connect to NATS")?;

        info!("Connected to NATS successfully");

        Ok(Self {
            client,
            subject,
            timeout,
        })
    }
}

#[async_trait::async_trait]
impl ChatCompletion for NatsChatCompletion {
    async fn complete(&self, history: &[ChatMessage]) -> Result<String> {
        let request = ChatRequest {
            messages: history.to_vec(),
        };
        let payload = serde_json::to_vec(&request)?;

        debug!(
            "Requesting completion on {} ({} messages)",
            self.subject,
            history.len()
        );

        let message = tokio::time::timeout(
            self.timeout,
            self.client.request(self.subject.clone(), payload.into()),
        )
        .await
        .context("Chat completion timed out")?
        .context("Chat completion request failed")?;

        let reply: ChatReply =
            serde_json::from_slice(&message.payload).context("Malformed chat completion reply")?;

        match reply {
            ChatReply {
                response: Some(response),
                ..
            } => Ok(response),
            ChatReply {
                error: Some(error), ..
            } => bail!("{}", error),
            _ => bail!("API error"),
        }
    }
}
