use async_trait::async_trait;
use herald_broadcast::{Outcome, Payload, RecipientId, Transport};
use herald_common::outgoing;

/// Accepts every send without contacting the Bot API
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunTransport;

#[async_trait]
impl Transport for DryRunTransport {
    async fn send(&self, recipient: RecipientId, payload: &Payload) -> Outcome {
        outgoing!(
            level = DEBUG,
            "Dry run: would send {} characters to {recipient}",
            payload.text.chars().count()
        );
        Outcome::Success
    }
}
