use crate::assistant::HearOutcome;
use crate::commands::{parse_input, ParsedInput, SlashCommand, HELP_TEXT};
use crate::log_debug;
use std::time::Duration;

use super::protocol::IpcEvent;
use super::session::{send_event, IpcState};

// ============================================================================
// Command Handlers
// ============================================================================

pub(super) fn handle_send(state: &mut IpcState, text: &str) {
    match parse_input(text) {
        ParsedInput::Utterance(utterance) => match state.assistant.send(&utterance) {
            Some(reply) => state.queue_reply(reply.text, reply.typing_delay),
            None => send_event(&IpcEvent::Error {
                message: "Nothing to send".to_string(),
                recoverable: true,
            }),
        },
        ParsedInput::Command(command) => handle_slash_command(state, command),
    }
}

/// The subset of REPL slash commands that make sense over IPC.
fn handle_slash_command(state: &mut IpcState, command: SlashCommand) {
    match command {
        SlashCommand::Help => state.queue_reply(HELP_TEXT.to_string(), Duration::ZERO),
        SlashCommand::History => handle_get_history(state),
        SlashCommand::Clear => handle_clear_history(state),
        SlashCommand::Settings | SlashCommand::Status => state.emit_capabilities(),
        SlashCommand::Set { flag, value } => handle_set_setting(state, &flag, value),
        SlashCommand::Hear(text) => handle_hear(state, &text),
        SlashCommand::Exit => state.exit_requested = true,
        SlashCommand::Usage(usage) => send_event(&IpcEvent::Error {
            message: usage.to_string(),
            recoverable: true,
        }),
        SlashCommand::Unknown(name) => send_event(&IpcEvent::Error {
            message: format!("Unknown command: /{name}"),
            recoverable: true,
        }),
    }
}

pub(super) fn handle_hear(state: &mut IpcState, text: &str) {
    match state.assistant.hear(text) {
        Ok(HearOutcome::Listening) | Ok(HearOutcome::Ignored) => {}
        Ok(HearOutcome::Farewell(farewell)) => {
            send_event(&IpcEvent::Deactivated { farewell });
        }
        Ok(HearOutcome::Reply(reply)) => state.queue_reply(reply.text, reply.typing_delay),
        Err(err) => {
            log_debug(&format!("hear failed: {err:#}"));
            send_event(&IpcEvent::Error {
                message: format!("Voice input unavailable: {err}"),
                recoverable: true,
            });
        }
    }
}

pub(super) fn handle_set_setting(state: &mut IpcState, key: &str, value: bool) {
    match state.assistant.set_flag(key, value) {
        Ok(key) => send_event(&IpcEvent::SettingChanged {
            key: key.to_string(),
            value,
        }),
        Err(err) => send_event(&IpcEvent::Error {
            message: format!("{err:#}"),
            recoverable: true,
        }),
    }
}

pub(super) fn handle_get_history(state: &mut IpcState) {
    send_event(&IpcEvent::History {
        entries: state.assistant.chat().history(),
    });
}

pub(super) fn handle_clear_history(state: &mut IpcState) {
    state.assistant.chat().clear_history();
    handle_get_history(state);
}
