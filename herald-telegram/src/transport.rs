use async_trait::async_trait;
use herald_broadcast::{Outcome, Payload, RecipientId, Transport};
use herald_common::outgoing;

use crate::{
    api::{ApiResponse, SendRequest, classify},
    config::TelegramConfig,
    error::TelegramError,
};

/// Sends broadcast payloads through the Telegram Bot API
pub struct TelegramTransport {
    client: reqwest::Client,
    config: TelegramConfig,
}

impl TelegramTransport {
    /// Wrap a shared HTTP client; see [`TelegramConfig::build_client`].
    #[must_use]
    pub const fn new(client: reqwest::Client, config: TelegramConfig) -> Self {
        Self { client, config }
    }

    /// Perform one call and decode the reply, whatever its HTTP status.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is not a Bot API reply.
    pub async fn call(
        &self,
        recipient: RecipientId,
        payload: &Payload,
    ) -> Result<ApiResponse, TelegramError> {
        let request = SendRequest::for_payload(recipient, payload, &self.config.parse_mode);
        let method = request.method();

        outgoing!("{method} to {recipient}");

        let response = self
            .client
            .post(self.config.method_url(method))
            .json(&request)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.bytes().await?;

        serde_json::from_slice(&body).map_err(|source| TelegramError::Decode { status, source })
    }
}

#[async_trait]
impl Transport for TelegramTransport {
    async fn send(&self, recipient: RecipientId, payload: &Payload) -> Outcome {
        match self.call(recipient, payload).await {
            Ok(response) => {
                if let Some(migrated) = response
                    .parameters
                    .as_ref()
                    .and_then(|parameters| parameters.migrate_to_chat_id)
                {
                    tracing::info!(%recipient, migrated, "Chat migrated to a supergroup");
                }
                classify(&response)
            }
            Err(e) => Outcome::TransientError {
                detail: e.to_string(),
            },
        }
    }
}
