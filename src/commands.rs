//! Slash commands understood by the front ends.
//!
//! Anything not starting with `/` is an utterance for the interpreter.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedInput {
    Command(SlashCommand),
    Utterance(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlashCommand {
    Help,                              // /help
    History,                           // /history
    Clear,                             // /clear
    Settings,                          // /settings
    Set { flag: String, value: bool }, // /set <flag> on|off
    Hear(String),                      // /hear <text>
    Status,                            // /status
    Exit,                              // /exit
    /// Malformed arguments to a known command.
    Usage(&'static str),
    Unknown(String),
}

pub const HELP_TEXT: &str = "\
Commands:
  /help                 show this help
  /history              print the chat history
  /clear                clear the chat history
  /settings             show settings flags
  /set <flag> on|off    change a flag (sarcasm, voice, recognition)
  /hear <text>          feed text as if it were recognized speech
  /status               show the virtual device and pending reminders
  /exit                 quit
Anything else is sent to Jarvis.";

const SET_USAGE: &str = "usage: /set <flag> on|off";
const HEAR_USAGE: &str = "usage: /hear <text>";

pub fn parse_switch(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "on" | "true" | "1" | "yes" | "вкл" => Some(true),
        "off" | "false" | "0" | "no" | "выкл" => Some(false),
        _ => None,
    }
}

pub fn parse_input(input: &str) -> ParsedInput {
    let trimmed = input.trim();

    let Some(body) = trimmed.strip_prefix('/') else {
        return ParsedInput::Utterance(trimmed.to_string());
    };

    let mut parts = body.splitn(2, char::is_whitespace);
    let cmd = parts.next().unwrap_or("").to_lowercase();
    let args = parts.next().map(str::trim).unwrap_or("");

    let command = match cmd.as_str() {
        "help" | "h" | "?" => SlashCommand::Help,
        "history" => SlashCommand::History,
        "clear" => SlashCommand::Clear,
        "settings" => SlashCommand::Settings,
        "set" => {
            let mut words = args.split_whitespace();
            match (words.next(), words.next().and_then(parse_switch), words.next()) {
                (Some(flag), Some(value), None) => SlashCommand::Set {
                    flag: flag.to_string(),
                    value,
                },
                _ => SlashCommand::Usage(SET_USAGE),
            }
        }
        "hear" if args.is_empty() => SlashCommand::Usage(HEAR_USAGE),
        "hear" => SlashCommand::Hear(args.to_string()),
        "status" => SlashCommand::Status,
        "exit" | "quit" | "q" => SlashCommand::Exit,
        _ => SlashCommand::Unknown(cmd),
    };
    ParsedInput::Command(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_an_utterance() {
        assert_eq!(
            parse_input("  привет  "),
            ParsedInput::Utterance("привет".to_string())
        );
    }

    #[test]
    fn parses_simple_commands() {
        assert_eq!(parse_input("/help"), ParsedInput::Command(SlashCommand::Help));
        assert_eq!(parse_input("/HISTORY"), ParsedInput::Command(SlashCommand::History));
        assert_eq!(parse_input("/q"), ParsedInput::Command(SlashCommand::Exit));
        assert_eq!(
            parse_input("/teleport"),
            ParsedInput::Command(SlashCommand::Unknown("teleport".to_string()))
        );
    }

    #[test]
    fn parses_set_with_switch_words() {
        assert_eq!(
            parse_input("/set sarcasm on"),
            ParsedInput::Command(SlashCommand::Set {
                flag: "sarcasm".to_string(),
                value: true
            })
        );
        assert_eq!(
            parse_input("/set voice выкл"),
            ParsedInput::Command(SlashCommand::Set {
                flag: "voice".to_string(),
                value: false
            })
        );
        for bad in ["/set", "/set sarcasm", "/set sarcasm maybe", "/set a on extra"] {
            assert_eq!(
                parse_input(bad),
                ParsedInput::Command(SlashCommand::Usage(SET_USAGE)),
                "{bad}"
            );
        }
    }

    #[test]
    fn hear_keeps_the_rest_of_the_line() {
        assert_eq!(
            parse_input("/hear эй, джарвис"),
            ParsedInput::Command(SlashCommand::Hear("эй, джарвис".to_string()))
        );
        assert_eq!(
            parse_input("/hear   "),
            ParsedInput::Command(SlashCommand::Usage(HEAR_USAGE))
        );
    }
}
