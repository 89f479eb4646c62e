//! Line-oriented chat front end.

use anyhow::Result;
use crossbeam_channel::{bounded, select, Receiver, Sender};
use jarvis::assistant::{Assistant, HearOutcome};
use jarvis::chat::ChatReply;
use jarvis::commands::{parse_input, ParsedInput, SlashCommand, HELP_TEXT};
use jarvis::config::AppConfig;
use jarvis::conversation::{ConversationEntry, JARVIS_PREFIX};
use jarvis::device::DeviceSnapshot;
use jarvis::log_debug;
use std::io::{self, BufRead, Write};
use std::thread;

/// Max buffered input lines before the reader blocks.
const INPUT_CHANNEL_CAPACITY: usize = 64;

const GREETING_BANNER: &str = "Джарвис на связи. Введите /help для списка команд.";

pub(crate) fn run_repl(config: AppConfig) -> Result<()> {
    let mut assistant = Assistant::from_config(&config)?;
    let reminders = assistant.fired_reminders().clone();
    let activations = assistant.activations().clone();
    let remarks = assistant.idle_remarks().clone();

    let (input_tx, input_rx) = bounded(INPUT_CHANNEL_CAPACITY);
    let _input_handle = spawn_input_thread(input_tx)?;

    say_plain(GREETING_BANNER);
    let mut running = true;
    while running {
        select! {
            recv(input_rx) -> line => match line {
                Ok(line) => running = handle_line(&mut assistant, &line),
                Err(_) => {
                    log_debug("stdin closed");
                    running = false;
                }
            },
            recv(reminders) -> fired => {
                if let Ok(fired) = fired {
                    let text = assistant.on_reminder(fired);
                    say_plain(&format!("{JARVIS_PREFIX}Напоминание: {text}"));
                }
            },
            recv(activations) -> activation => {
                if let Ok(activation) = activation {
                    assistant.on_activation(&activation);
                    say_plain(&format!("[слушаю: {}]", activation.phrase));
                }
            },
            recv(remarks) -> remark => {
                if let Ok(remark) = remark {
                    assistant.on_idle_remark(&remark);
                    say_plain(&format!("{JARVIS_PREFIX}{remark}"));
                }
            },
        }
    }

    assistant.shutdown();
    Ok(())
}

fn spawn_input_thread(tx: Sender<String>) -> io::Result<thread::JoinHandle<()>> {
    thread::Builder::new()
        .name("jarvis-repl-stdin".to_string())
        .spawn(move || {
            let stdin = io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else {
                    break;
                };
                if tx.send(line).is_err() {
                    break;
                }
            }
        })
}

/// Returns false once the session should end.
fn handle_line(assistant: &mut Assistant, line: &str) -> bool {
    match parse_input(line) {
        ParsedInput::Utterance(text) => {
            if let Some(reply) = assistant.send(&text) {
                deliver(&reply);
            }
        }
        ParsedInput::Command(command) => return handle_command(assistant, command),
    }
    true
}

fn handle_command(assistant: &mut Assistant, command: SlashCommand) -> bool {
    match command {
        SlashCommand::Help => say_plain(HELP_TEXT),
        SlashCommand::History => say_plain(&format_history(&assistant.chat().history())),
        SlashCommand::Clear => {
            assistant.chat().clear_history();
            say_plain("История очищена.");
        }
        SlashCommand::Settings => say_plain(&format_flags(&assistant.flags())),
        SlashCommand::Set { flag, value } => match assistant.set_flag(&flag, value) {
            Ok(key) => say_plain(&format!("{key} = {}", on_off(value))),
            Err(err) => eprintln!("{err:#}"),
        },
        SlashCommand::Hear(text) => match assistant.hear(&text) {
            Ok(HearOutcome::Listening) => {}
            Ok(HearOutcome::Ignored) => say_plain("[распознавание речи выключено]"),
            Ok(HearOutcome::Farewell(farewell)) => say_plain(&format!("{JARVIS_PREFIX}{farewell}")),
            Ok(HearOutcome::Reply(reply)) => deliver(&reply),
            Err(err) => eprintln!("voice input unavailable: {err:#}"),
        },
        SlashCommand::Status => say_plain(&format_status(
            &assistant.device().snapshot(),
            assistant.pending_reminders(),
            assistant.is_awake(),
        )),
        SlashCommand::Exit => return false,
        SlashCommand::Usage(usage) => eprintln!("{usage}"),
        SlashCommand::Unknown(name) => eprintln!("Unknown command: /{name} (try /help)"),
    }
    true
}

/// Hold the reply back for its typing delay, like a person typing.
fn deliver(reply: &ChatReply) {
    if !reply.typing_delay.is_zero() {
        say_plain("...");
        thread::sleep(reply.typing_delay);
    }
    say_plain(&format!("{JARVIS_PREFIX}{}", reply.text));
}

fn say_plain(text: &str) {
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{text}");
    let _ = stdout.flush();
}

fn on_off(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}

fn format_history(entries: &[ConversationEntry]) -> String {
    if entries.is_empty() {
        return "История пуста.".to_string();
    }
    entries
        .iter()
        .map(ConversationEntry::display)
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_flags(flags: &[(&str, bool)]) -> String {
    flags
        .iter()
        .map(|(key, value)| format!("{key} = {}", on_off(*value)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_status(snapshot: &DeviceSnapshot, pending_reminders: usize, awake: bool) -> String {
    [
        format!("wifi: {}", on_off(snapshot.wifi_enabled)),
        format!("ringer: {}", snapshot.ringer_mode.label()),
        format!(
            "volume: ring {} / notification {}",
            snapshot.ring_volume, snapshot.notification_volume
        ),
        format!("flashlight: {}", on_off(snapshot.torch_on)),
        format!("reminders pending: {pending_reminders}"),
        format!(
            "voice: {}",
            if awake { "active" } else { "waiting for wake phrase" }
        ),
    ]
    .join("\n")
}
