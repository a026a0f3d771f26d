mod bot;
mod config;
mod dispatcher;
mod parser;
mod platform;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::platform::slack::SlackClient;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,perceptronbot=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration from environment")?;

    info!("Configuration loaded successfully");
    info!("  Bot: {} ({})", config.bot_name, config.identity.mention());
    info!("  Read delay: {:?}", config.read_delay);

    let client = SlackClient::new(
        config.slack.bot_token.clone(),
        config.slack.bot_id.clone(),
    );

    info!("Bot is starting...");
    bot::run(&config, &client).await?;

    Ok(())
}
