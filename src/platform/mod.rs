pub mod slack;

#[cfg(test)]
pub mod fake;

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;

/// A real-time notice received from the messaging gateway
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Event {
    /// The message text, absent for non-message notices
    #[serde(default)]
    pub text: Option<String>,
    /// Channel the notice originated from
    #[serde(default)]
    pub channel: Option<String>,
}

#[cfg(test)]
impl Event {
    pub fn message(text: &str, channel: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            channel: Some(channel.to_string()),
        }
    }
}

/// Connection to a streaming messaging gateway.
///
/// The bot loop only talks to the gateway through this trait, so the loop
/// and the dispatcher can run against an in-memory client in tests.
#[async_trait]
pub trait MessagingClient: Send + Sync {
    /// Handle for an established real-time session
    type Session: Send;

    /// Perform the session handshake
    async fn connect(&self) -> Result<Self::Session>;

    /// Read the batch of events pending on the session (may be empty)
    async fn read_events(&self, session: &mut Self::Session) -> Result<Vec<Event>>;

    /// Post `text` to `channel`; `as_user` marks it as authored by the bot itself
    async fn post_message(&self, channel: &str, text: &str, as_user: bool) -> Result<()>;
}
