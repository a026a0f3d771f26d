use anyhow::{Context, Result};
use tracing::info;

use crate::parser::ParsedCommand;
use crate::platform::MessagingClient;

/// A command prefix and the canned reply it triggers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRule {
    pub prefix: String,
    pub response: String,
}

impl CommandRule {
    pub fn new(prefix: &str, response: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            response: response.to_string(),
        }
    }
}

/// Ordered prefix rules plus the reply used when none of them match
#[derive(Debug, Clone)]
pub struct CommandTable {
    rules: Vec<CommandRule>,
    default_response: String,
}

impl CommandTable {
    pub fn new(rules: Vec<CommandRule>, default_response: String) -> Self {
        Self {
            rules,
            default_response,
        }
    }

    /// Pick the reply for `command`.
    ///
    /// Every rule is checked in declaration order and each match replaces
    /// the pending reply, so the last matching rule wins.
    pub fn resolve(&self, command: &str) -> &str {
        let mut response = self.default_response.as_str();
        for rule in &self.rules {
            if command.starts_with(&rule.prefix) {
                response = rule.response.as_str();
            }
        }
        response
    }
}

/// Reply to a directed command in the channel it came from
pub async fn handle_command<C>(
    client: &C,
    table: &CommandTable,
    command: &ParsedCommand,
) -> Result<()>
where
    C: MessagingClient + ?Sized,
{
    let response = table.resolve(&command.text);

    info!(
        "Command '{}' in {} -> '{}'",
        command.text, command.channel, response
    );

    client
        .post_message(&command.channel, response, true)
        .await
        .with_context(|| format!("Failed to deliver reply to {}", command.channel))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_command_table;
    use crate::platform::fake::{FakeClient, Posted};

    #[test]
    fn test_do_prefix() {
        let table = default_command_table();
        assert_eq!(
            table.resolve("do something"),
            "Do not forget to check dataset licenses !!!"
        );
    }

    #[test]
    fn test_please_prefix() {
        let table = default_command_table();
        assert_eq!(table.resolve("please help"), "Laser in 1960 was fancy stuff...");
    }

    #[test]
    fn test_what_prefix() {
        let table = default_command_table();
        assert_eq!(table.resolve("what is this"), "Send me DSKD papers pls...");
    }

    #[test]
    fn test_unknown_command_gets_default() {
        let table = default_command_table();
        assert_eq!(
            table.resolve("thanks"),
            "EXPERIENCES !!! EXPERIENCES !!! EXPERIENCES !!! EXPERIENCES!!!"
        );
        assert_eq!(
            table.resolve(""),
            "EXPERIENCES !!! EXPERIENCES !!! EXPERIENCES !!! EXPERIENCES!!!"
        );
    }

    #[test]
    fn test_prefix_match_is_not_word_bound() {
        let table = default_command_table();
        assert_eq!(
            table.resolve("doughnuts"),
            "Do not forget to check dataset licenses !!!"
        );
    }

    #[test]
    fn test_later_rule_overrides_earlier_match() {
        let table = CommandTable::new(
            vec![
                CommandRule::new("do", "first"),
                CommandRule::new("does", "second"),
                CommandRule::new("what", "third"),
            ],
            "fallback".to_string(),
        );
        assert_eq!(table.resolve("does it work"), "second");
        assert_eq!(table.resolve("do it"), "first");
    }

    #[test]
    fn test_override_does_not_depend_on_prefix_length() {
        let table = CommandTable::new(
            vec![
                CommandRule::new("does", "long"),
                CommandRule::new("do", "short"),
            ],
            "fallback".to_string(),
        );
        assert_eq!(table.resolve("does it work"), "short");
    }

    #[tokio::test]
    async fn test_handle_command_posts_as_bot() {
        let client = FakeClient::default();
        let command = ParsedCommand {
            text: "please help".to_string(),
            channel: "C42".to_string(),
        };

        handle_command(&client, &default_command_table(), &command)
            .await
            .unwrap();

        assert_eq!(
            client.posted(),
            vec![Posted {
                channel: "C42".to_string(),
                text: "Laser in 1960 was fancy stuff...".to_string(),
                as_user: true,
            }]
        );
    }

    #[tokio::test]
    async fn test_handle_command_propagates_delivery_failure() {
        let client = FakeClient::default().failing_delivery();
        let command = ParsedCommand {
            text: "thanks".to_string(),
            channel: "C42".to_string(),
        };

        let err = handle_command(&client, &default_command_table(), &command)
            .await
            .unwrap_err();
        assert!(format!("{:#}", err).contains("channel_not_found"));
    }
}
