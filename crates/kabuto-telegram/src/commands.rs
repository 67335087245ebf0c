//! Bot commands answered with fixed text.

use teloxide::utils::command::BotCommands;

/// Bot commands that can be invoked with /.
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Verfügbare Befehle:")]
pub enum Command {
    #[command(description = "Begrüßung und Kurzanleitung")]
    Start,

    #[command(description = "Diese Hilfe anzeigen")]
    Help,
}

/// Reply to `/start`.
pub const WELCOME_TEXT: &str = "👋 Willkommen bei KabutoAI!\n\n\
Schreib mir einfach deine Frage – auf Deutsch oder Englisch – \
und ich antworte dir so schnell ich kann.\n\n\
➡️ /help zeigt alle Befehle.";

/// Parses `/start` or `/help`, optionally addressed as `/start@bot`.
///
/// With an empty `bot_username` any mention is accepted. Anything else,
/// including other slash-prefixed text, is `None` and goes to the model.
pub fn parse_command(text: &str, bot_username: &str) -> Option<Command> {
    let first = text.split_whitespace().next()?;
    let username = match first.split_once('@') {
        Some((_, mention)) if bot_username.is_empty() => mention,
        _ => bot_username,
    };
    Command::parse(text, username).ok()
}

/// Fixed reply for `command`.
pub fn reply_for(command: &Command) -> String {
    match command {
        Command::Start => WELCOME_TEXT.to_string(),
        Command::Help => Command::descriptions().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("/start", "").unwrap(), Command::Start);
        assert_eq!(Command::parse("/help", "").unwrap(), Command::Help);
        assert_eq!(
            Command::parse("/start@KabutoBot", "KabutoBot").unwrap(),
            Command::Start
        );
        assert!(Command::parse("/reset", "").is_err());
    }

    #[test]
    fn test_help_lists_commands() {
        let help = reply_for(&Command::Help);
        assert!(help.contains("/start"));
        assert!(help.contains("/help"));
    }

    #[test]
    fn test_parse_command_mentions() {
        assert_eq!(parse_command("/start", "KabutoBot"), Some(Command::Start));
        assert_eq!(
            parse_command("/help@KabutoBot", "KabutoBot"),
            Some(Command::Help)
        );
        // Username unknown (getMe failed at startup)
        assert_eq!(parse_command("/start@KabutoBot", ""), Some(Command::Start));
        assert_eq!(parse_command("/start@OtherBot", "KabutoBot"), None);
    }

    #[test]
    fn test_other_slash_text_is_not_a_command() {
        assert_eq!(parse_command("/usr/bin ist was?", ""), None);
        assert_eq!(parse_command("/reset", "KabutoBot"), None);
        assert_eq!(parse_command("hallo", ""), None);
    }
}
