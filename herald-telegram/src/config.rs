use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};

use crate::error::TelegramError;

fn default_api_url() -> String {
    "https://api.telegram.org".to_owned()
}

fn default_parse_mode() -> String {
    "HTML".to_owned()
}

const fn default_request_timeout_secs() -> u64 {
    30
}

/// Bot API connection settings
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot token issued by `@BotFather`
    #[serde(default)]
    pub token: String,

    /// Base URL of the Bot API
    ///
    /// Default: `https://api.telegram.org`
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Formatting applied to message text and captions
    ///
    /// Default: `HTML`
    #[serde(default = "default_parse_mode")]
    pub parse_mode: String,

    /// Per-request timeout (in seconds)
    ///
    /// Default: 30
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            api_url: default_api_url(),
            parse_mode: default_parse_mode(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("token", &"<redacted>")
            .field("api_url", &self.api_url)
            .field("parse_mode", &self.parse_mode)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl TelegramConfig {
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// URL of a Bot API method for this bot
    #[must_use]
    pub fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{method}",
            self.api_url.trim_end_matches('/'),
            self.token
        )
    }

    /// Build an HTTP client honouring the configured timeout.
    ///
    /// The client is meant to be created once by the process and shared.
    ///
    /// # Errors
    ///
    /// Returns [`TelegramError::Client`] if the TLS backend fails to initialise.
    pub fn build_client(&self) -> Result<reqwest::Client, TelegramError> {
        reqwest::Client::builder()
            .timeout(self.request_timeout())
            .build()
            .map_err(TelegramError::Client)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_partial_ron() {
        let config: TelegramConfig = ron::from_str(r#"(token: "123:abc")"#).unwrap();
        assert_eq!(config.token, "123:abc");
        assert_eq!(config.api_url, "https://api.telegram.org");
        assert_eq!(config.parse_mode, "HTML");
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_method_url() {
        let config = TelegramConfig {
            token: "42:xyz".to_owned(),
            api_url: "http://localhost:8081/".to_owned(),
            ..TelegramConfig::default()
        };
        assert_eq!(
            config.method_url("sendMessage"),
            "http://localhost:8081/bot42:xyz/sendMessage"
        );
    }

    #[test]
    fn test_debug_hides_token() {
        let config = TelegramConfig {
            token: "secret-token".to_owned(),
            ..TelegramConfig::default()
        };
        assert!(!format!("{config:?}").contains("secret-token"));
    }
}
