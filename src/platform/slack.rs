//! Slack Real Time Messaging client.
//!
//! The session is opened with `rtm.connect` and then read as a websocket
//! stream of JSON frames. Replies go out through `chat.postMessage`.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use reqwest::Client;
use serde::Deserialize;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use crate::platform::{Event, MessagingClient};

const API_BASE: &str = "https://slack.com/api";

/// How long a read waits for the next frame before returning the batch
const READ_WINDOW: Duration = Duration::from_millis(100);

/// Upper bound on frames drained per read
const MAX_FRAMES_PER_READ: usize = 100;

type RtmStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, Deserialize)]
struct RtmConnectResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(rename = "self", default)]
    bot: Option<RtmSelf>,
}

#[derive(Debug, Deserialize)]
struct RtmSelf {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct PostMessageResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

/// An open RTM websocket
pub struct SlackSession {
    stream: RtmStream,
}

pub struct SlackClient {
    client: Client,
    api_base: String,
    token: String,
    bot_id: String,
}

impl SlackClient {
    /// `bot_id` must be the account the token belongs to, otherwise `connect` fails
    pub fn new(token: String, bot_id: String) -> Self {
        Self {
            client: Client::new(),
            api_base: API_BASE.to_string(),
            token,
            bot_id,
        }
    }

    #[cfg(test)]
    fn with_api_base(mut self, api_base: &str) -> Self {
        self.api_base = api_base.to_string();
        self
    }
}

/// Decode one RTM text frame, skipping anything that is not an event object
fn decode_frame(raw: &str) -> Option<Event> {
    match serde_json::from_str::<Event>(raw) {
        Ok(event) => Some(event),
        Err(e) => {
            debug!("Skipping undecodable RTM frame ({}): {}", e, raw);
            None
        }
    }
}

/// Validate an `rtm.connect` reply and return the websocket url.
/// The token must belong to the configured bot account.
fn check_connect_response(parsed: RtmConnectResponse, bot_id: &str) -> Result<String> {
    if !parsed.ok {
        bail!(
            "rtm.connect failed: {}",
            parsed.error.unwrap_or_else(|| "unknown error".into())
        );
    }

    match &parsed.bot {
        Some(bot) if bot.id != bot_id => bail!(
            "Token belongs to {} ({}), but BOT_ID is {}",
            bot.name,
            bot.id,
            bot_id
        ),
        Some(bot) => info!("Authenticated as {} ({})", bot.name, bot.id),
        None => warn!("rtm.connect did not report the bot identity"),
    }

    parsed.url.context("rtm.connect returned no websocket url")
}

/// Turn a `chat.postMessage` reply into a delivery result
fn check_post_response(parsed: PostMessageResponse) -> Result<()> {
    if !parsed.ok {
        bail!(
            "chat.postMessage failed: {}",
            parsed.error.unwrap_or_else(|| "unknown error".into())
        );
    }
    Ok(())
}

/// Open the RTM websocket at `url`
async fn open_socket(url: &str) -> Result<RtmStream> {
    // rustls needs a process-level crypto provider before the first wss handshake
    let _ = rustls::crypto::ring::default_provider().install_default();

    let (stream, _response) = tokio_tungstenite::connect_async(url)
        .await
        .context("Failed to open RTM websocket")?;
    Ok(stream)
}

/// Drain frames until `window` passes without one or `max_frames` were read.
///
/// Only text frames are decoded. A close frame or the end of the stream ends
/// the session.
async fn drain_frames<S>(
    stream: &mut S,
    window: Duration,
    max_frames: usize,
) -> Result<Vec<Event>>
where
    S: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
{
    let mut events = Vec::new();

    for _ in 0..max_frames {
        let frame = match tokio::time::timeout(window, stream.next()).await {
            Ok(frame) => frame,
            Err(_) => break,
        };

        match frame {
            Some(Ok(Message::Text(text))) => {
                if let Some(event) = decode_frame(text.as_str()) {
                    events.push(event);
                }
            }
            Some(Ok(Message::Close(_))) | None => bail!("RTM connection closed by Slack"),
            // Pings are answered by tungstenite on the next read
            Some(Ok(_)) => {}
            Some(Err(e)) => return Err(e).context("Failed to read from RTM websocket"),
        }
    }

    Ok(events)
}

#[async_trait]
impl MessagingClient for SlackClient {
    type Session = SlackSession;

    async fn connect(&self) -> Result<SlackSession> {
        let response = self
            .client
            .get(format!("{}/rtm.connect", self.api_base))
            .bearer_auth(&self.token)
            .send()
            .await
            .context("Failed to send rtm.connect request")?
            .error_for_status()
            .context("rtm.connect returned an HTTP error")?;

        let parsed: RtmConnectResponse = response
            .json()
            .await
            .context("Failed to parse rtm.connect response")?;

        let url = check_connect_response(parsed, &self.bot_id)?;
        let stream = open_socket(&url).await?;

        debug!("RTM websocket open");
        Ok(SlackSession { stream })
    }

    async fn read_events(&self, session: &mut SlackSession) -> Result<Vec<Event>> {
        drain_frames(&mut session.stream, READ_WINDOW, MAX_FRAMES_PER_READ).await
    }

    async fn post_message(&self, channel: &str, text: &str, as_user: bool) -> Result<()> {
        let body = serde_json::json!({
            "channel": channel,
            "text": text,
            "as_user": as_user,
        });

        let response = self
            .client
            .post(format!("{}/chat.postMessage", self.api_base))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .context("Failed to send chat.postMessage request")?
            .error_for_status()
            .context("chat.postMessage returned an HTTP error")?;

        let parsed: PostMessageResponse = response
            .json()
            .await
            .context("Failed to parse chat.postMessage response")?;

        check_post_response(parsed)?;

        debug!("Posted reply to {}", channel);
        Ok(())
    }
}
