use anyhow::{Context, Result};
use tracing::{debug, error, info};

use crate::config::Config;
use crate::dispatcher;
use crate::parser::{self, ParsedCommand};
use crate::platform::{Event, MessagingClient};

/// Run one pass over a batch of events. Returns whether a reply was sent.
async fn process_batch<C>(config: &Config, client: &C, events: &[Event]) -> Result<bool>
where
    C: MessagingClient + ?Sized,
{
    match parser::parse_output(Some(events), &config.identity) {
        Some(command) if is_directed(&command) => {
            dispatcher::handle_command(client, &config.commands, &command).await?;
            Ok(true)
        }
        Some(_) => {
            debug!("Ignoring mention without a command");
            Ok(false)
        }
        None => Ok(false),
    }
}

fn is_directed(command: &ParsedCommand) -> bool {
    !command.text.is_empty() && !command.channel.is_empty()
}

/// Connect to the gateway and serve commands until the session or a reply fails.
///
/// A failed handshake is reported and ends the run without an error.
pub async fn run<C>(config: &Config, client: &C) -> Result<()>
where
    C: MessagingClient,
{
    let mut session = match client.connect().await {
        Ok(session) => session,
        Err(e) => {
            error!("Connection failed. Invalid Slack token or bot ID? ({:#})", e);
            return Ok(());
        }
    };

    info!("{} connected and running!", config.bot_name);

    loop {
        let events = client
            .read_events(&mut session)
            .await
            .context("Failed to read events")?;

        if !events.is_empty() {
            debug!("Received {} event(s)", events.len());
        }

        process_batch(config, client, &events).await?;

        tokio::time::sleep(config.read_delay).await;
    }
}
