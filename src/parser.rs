use crate::config::BotIdentity;
use crate::platform::Event;

/// A command addressed to the bot, with the channel it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    /// Text after the mention, trimmed and lower-cased
    pub text: String,
    pub channel: String,
}

/// Find the first event in the batch that mentions the bot.
///
/// Returns the text following the first mention together with the event's
/// channel. Events without text or channel are skipped. Returns `None` when
/// the batch is empty, absent, or nothing is addressed to the bot.
pub fn parse_output(events: Option<&[Event]>, identity: &BotIdentity) -> Option<ParsedCommand> {
    let mention = identity.mention();

    events?.iter().find_map(|event| {
        let text = event.text.as_deref()?;
        let channel = event.channel.as_deref()?;
        let (_, after) = text.split_once(mention)?;

        Some(ParsedCommand {
            text: after.trim().to_lowercase(),
            channel: channel.to_string(),
        })
    })
}
