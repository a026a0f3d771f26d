use std::fmt;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::dispatcher::{CommandRule, CommandTable};

const BOT_ID_VAR: &str = "BOT_ID";
const BOT_TOKEN_VAR: &str = "SLACK_BOT_TOKEN";

/// The mention token the gateway uses to address the bot, e.g. `<@U0BOT>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotIdentity {
    mention: String,
}

impl BotIdentity {
    pub fn new(bot_id: &str) -> Self {
        Self {
            mention: format!("<@{bot_id}>"),
        }
    }

    pub fn mention(&self) -> &str {
        &self.mention
    }
}

#[derive(Clone)]
pub struct SlackConfig {
    pub bot_id: String,
    pub bot_token: String,
}

impl fmt::Debug for SlackConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlackConfig")
            .field("bot_id", &self.bot_id)
            .field("bot_token", &"<redacted>")
            .finish()
    }
}

/// Everything the bot needs, built once at startup
#[derive(Debug, Clone)]
pub struct Config {
    pub slack: SlackConfig,
    pub identity: BotIdentity,
    pub bot_name: String,
    /// Pause between two reads of the event stream
    pub read_delay: Duration,
    pub commands: CommandTable,
}

fn default_bot_name() -> String {
    "perceptronbot".to_string()
}

fn default_read_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_default_response() -> String {
    "EXPERIENCES !!! EXPERIENCES !!! EXPERIENCES !!! EXPERIENCES!!!".to_string()
}

fn default_command_rules() -> Vec<CommandRule> {
    vec![
        CommandRule::new("do", "Do not forget to check dataset licenses !!!"),
        CommandRule::new("please", "Laser in 1960 was fancy stuff..."),
        CommandRule::new("what", "Send me DSKD papers pls..."),
    ]
}

pub fn default_command_table() -> CommandTable {
    CommandTable::new(default_command_rules(), default_default_response())
}

impl Config {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    /// Blank values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .with_context(|| format!("Environment variable {key} is not set"))
        };

        let bot_id = require(BOT_ID_VAR)?;
        let bot_token = require(BOT_TOKEN_VAR)?;

        Ok(Self {
            identity: BotIdentity::new(&bot_id),
            slack: SlackConfig { bot_id, bot_token },
            bot_name: default_bot_name(),
            read_delay: default_read_delay(),
            commands: default_command_table(),
        })
    }
}
