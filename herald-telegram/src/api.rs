//! Bot API wire types and reply classification

use std::time::Duration;

use herald_broadcast::{InlineButton, Outcome, Payload, RecipientId};
use serde::{Deserialize, Serialize};

/// Back-off applied when a 429 reply omits `retry_after`
const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(1);

#[derive(Debug, Serialize, PartialEq, Eq)]
pub(crate) struct ReplyMarkup<'a> {
    pub(crate) inline_keyboard: &'a [Vec<InlineButton>],
}

/// Body of a `sendMessage` or `sendPhoto` call
#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub(crate) enum SendRequest<'a> {
    Message {
        chat_id: RecipientId,
        text: &'a str,
        parse_mode: &'a str,
        #[serde(skip_serializing_if = "Option::is_none")]
        reply_markup: Option<ReplyMarkup<'a>>,
    },
    Photo {
        chat_id: RecipientId,
        photo: &'a str,
        caption: &'a str,
        parse_mode: &'a str,
        #[serde(skip_serializing_if = "Option::is_none")]
        reply_markup: Option<ReplyMarkup<'a>>,
    },
}

impl<'a> SendRequest<'a> {
    /// A photo with caption when the payload carries an image, plain text otherwise
    pub(crate) fn for_payload(
        chat_id: RecipientId,
        payload: &'a Payload,
        parse_mode: &'a str,
    ) -> Self {
        let reply_markup = payload.markup.as_ref().map(|markup| ReplyMarkup {
            inline_keyboard: &markup.rows,
        });

        match payload.image.as_deref() {
            Some(photo) => Self::Photo {
                chat_id,
                photo,
                caption: &payload.text,
                parse_mode,
                reply_markup,
            },
            None => Self::Message {
                chat_id,
                text: &payload.text,
                parse_mode,
                reply_markup,
            },
        }
    }

    pub(crate) const fn method(&self) -> &'static str {
        match self {
            Self::Message { .. } => "sendMessage",
            Self::Photo { .. } => "sendPhoto",
        }
    }
}

/// Extra details attached to some error replies
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ResponseParameters {
    /// Seconds to wait before the next call, set on flood control replies
    #[serde(default)]
    pub retry_after: Option<u64>,
    /// The group was upgraded to a supergroup with this id
    #[serde(default)]
    pub migrate_to_chat_id: Option<i64>,
}

/// Envelope of every Bot API reply
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ApiResponse {
    pub ok: bool,
    #[serde(default)]
    pub error_code: Option<u16>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub parameters: Option<ResponseParameters>,
}

/// Map a Bot API reply onto a send outcome.
///
/// - `ok` replies are a success
/// - 429 is flood control, honouring `retry_after` (one second if absent)
/// - 403 means the bot was blocked, kicked, or the user is deactivated
/// - 400 "chat not found" means the recipient no longer exists
///
/// Anything else is a transient error carrying the API description.
#[must_use]
pub fn classify(response: &ApiResponse) -> Outcome {
    if response.ok {
        return Outcome::Success;
    }

    let description = response.description.as_deref().unwrap_or_default();

    match response.error_code {
        Some(429) => Outcome::RateLimited {
            retry_after: response
                .parameters
                .as_ref()
                .and_then(|parameters| parameters.retry_after)
                .map_or(DEFAULT_RETRY_AFTER, Duration::from_secs),
        },
        Some(403) => Outcome::RecipientUnreachable,
        Some(400) if description.to_ascii_lowercase().contains("chat not found") => {
            Outcome::RecipientUnreachable
        }
        code => Outcome::TransientError {
            detail: match code {
                Some(code) => format!("{code}: {description}"),
                None => format!("unsuccessful reply without error code: {description}"),
            },
        },
    }
}
