//! Type definitions for broadcast payloads and per-recipient delivery state

use std::{fmt, num::ParseIntError, str::FromStr, sync::Arc, time::Duration};

use serde::{Deserialize, Serialize};

/// Chat identifier of a single recipient
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecipientId(pub i64);

impl fmt::Display for RecipientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecipientId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

impl From<i64> for RecipientId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// A single button of an inline keyboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineButton {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_data: Option<String>,
}

impl InlineButton {
    #[must_use]
    pub fn url(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            url: Some(url.into()),
            callback_data: None,
        }
    }

    #[must_use]
    pub fn callback(text: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            url: None,
            callback_data: Some(data.into()),
        }
    }
}

/// Markup attached below a message, one `Vec` per row
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineKeyboard {
    pub rows: Vec<Vec<InlineButton>>,
}

/// The message fanned out to every recipient of a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    /// Message text, or the caption when an image is attached
    pub text: String,
    /// File id or URL of an image to send instead of a plain text message
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub markup: Option<InlineKeyboard>,
}

impl Payload {
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    #[must_use]
    pub fn with_markup(mut self, markup: InlineKeyboard) -> Self {
        self.markup = Some(markup);
        self
    }
}

/// Classified result of one send call.
///
/// Transport adapters map their own error types onto these variants; the
/// engine never looks at transport-specific failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The message was accepted
    Success,
    /// The API asked us to back off before calling again for this recipient
    RateLimited { retry_after: Duration },
    /// The recipient blocked the bot or no longer exists
    RecipientUnreachable,
    /// Anything else; not retried
    TransientError { detail: String },
}

/// One recipient's message in flight
#[derive(Debug, Clone)]
pub struct DeliveryUnit {
    pub recipient: RecipientId,
    pub payload: Arc<Payload>,
    /// Number of rate-limited attempts so far
    pub attempts: u32,
    /// Back-off requested by the API that has not been waited out yet
    pub pending_delay: Option<Duration>,
}

impl DeliveryUnit {
    #[must_use]
    pub const fn new(recipient: RecipientId, payload: Arc<Payload>) -> Self {
        Self {
            recipient,
            payload,
            attempts: 0,
            pending_delay: None,
        }
    }

    /// Record a rate-limited attempt and the delay to honour before the next one
    pub const fn defer(&mut self, retry_after: Duration) {
        self.attempts += 1;
        self.pending_delay = Some(retry_after);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_recipient_id_parses_trimmed_input() {
        assert_eq!(" 42 ".parse::<RecipientId>().unwrap(), RecipientId(42));
        assert_eq!("-1001".parse::<RecipientId>().unwrap(), RecipientId(-1001));
        assert!("abc".parse::<RecipientId>().is_err());
    }

    #[test]
    fn test_defer_counts_attempts() {
        let mut unit = DeliveryUnit::new(RecipientId(1), Arc::new(Payload::text("hi")));
        assert_eq!(unit.attempts, 0);
        assert!(unit.pending_delay.is_none());

        unit.defer(Duration::from_secs(3));
        unit.defer(Duration::from_secs(5));

        assert_eq!(unit.attempts, 2);
        assert_eq!(unit.pending_delay, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_payload_deserializes_with_defaults() {
        let payload: Payload = ron::from_str(r#"(text: "Sale ends today")"#).unwrap();
        assert_eq!(payload, Payload::text("Sale ends today"));

        let payload: Payload = ron::from_str(
            r#"(
                text: "Renew now",
                image: Some("promo.jpg"),
                markup: Some((rows: [[(text: "Open", url: Some("https://example.com"))]])),
            )"#,
        )
        .unwrap();
        assert_eq!(payload.image.as_deref(), Some("promo.jpg"));
        assert_eq!(
            payload.markup.unwrap().rows[0][0],
            InlineButton::url("Open", "https://example.com")
        );
    }
}
