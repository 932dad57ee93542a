use thiserror::Error;

#[derive(Debug, Error)]
pub enum TelegramError {
    /// The request never produced a response (connect, TLS, timeout).
    ///
    /// The request URL is stripped since it carries the bot token.
    #[error("Request to the Bot API failed: {0}")]
    Request(#[source] reqwest::Error),

    /// The response body was not a Bot API reply.
    #[error("Unreadable Bot API reply (HTTP {status}): {source}")]
    Decode {
        status: u16,
        #[source]
        source: serde_json::Error,
    },

    /// The HTTP client could not be built.
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl From<reqwest::Error> for TelegramError {
    fn from(err: reqwest::Error) -> Self {
        Self::Request(err.without_url())
    }
}
