use crate::assistant::Assistant;
use crate::config::AppConfig;
use crate::device::{Capability, DevicePlatform, WifiControl};
use crate::{log_debug, log_debug_content};
use anyhow::Result;
use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};
use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
#[cfg(any(test, feature = "mutants"))]
use std::cell::RefCell;
use std::thread;
use std::time::{Duration, Instant};

use super::protocol::{parse_command, IpcCommand, IpcEvent};
use super::router::{
    handle_clear_history, handle_get_history, handle_hear, handle_send, handle_set_setting,
};

const LOOP_SLEEP: Duration = Duration::from_millis(5);

const ALL_CAPABILITIES: [Capability; 4] = [
    Capability::ChangeWifiState,
    Capability::AccessWifiState,
    Capability::ModifyAudioSettings,
    Capability::Camera,
];

// ============================================================================
// IPC State
// ============================================================================

/// Reply held back until its typing delay has elapsed.
pub(super) struct PendingReply {
    pub(super) due: Instant,
    pub(super) text: String,
    pub(super) typing_ms: u64,
}

pub(super) struct IpcState {
    pub(super) config: AppConfig,
    pub(super) assistant: Assistant,
    pub(super) pending_replies: VecDeque<PendingReply>,
    pub(super) session_id: String,
    pub(super) exit_requested: bool,
}

impl IpcState {
    pub(super) fn new(config: AppConfig) -> Result<Self> {
        let assistant = Assistant::from_config(&config)?;
        let session_id = format!(
            "{:x}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_millis()
        );
        Ok(Self {
            config,
            assistant,
            pending_replies: VecDeque::new(),
            session_id,
            exit_requested: false,
        })
    }

    pub(super) fn emit_capabilities(&self) {
        let device = self.assistant.device();
        let (granted, denied): (Vec<Capability>, Vec<Capability>) = ALL_CAPABILITIES
            .iter()
            .copied()
            .partition(|cap| device.has_capability(*cap));
        let labels = |caps: Vec<Capability>| -> Vec<String> {
            caps.into_iter().map(|cap| cap.label().to_string()).collect()
        };
        let wifi_control = match device.wifi_control() {
            WifiControl::Direct => "direct",
            WifiControl::SettingsPanel => "settings_panel",
        };

        send_event(&IpcEvent::Capabilities {
            session_id: self.session_id.clone(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            granted: labels(granted),
            denied: labels(denied),
            wifi_control: wifi_control.to_string(),
            exact_alarms: !self.config.no_exact_alarms,
            tts_available: self.config.tts_cmd.is_some(),
            history_max: self.config.history_max,
            settings: self
                .assistant
                .flags()
                .into_iter()
                .map(|(key, value)| (key.to_string(), value))
                .collect(),
        });
    }

    /// Queue a reply behind the typing indicator.
    pub(super) fn queue_reply(&mut self, text: String, typing: Duration) {
        if self.pending_replies.is_empty() {
            send_event(&IpcEvent::Typing { active: true });
        }
        // Replies leave in order, so a later one never overtakes an earlier one.
        let earliest = self
            .pending_replies
            .back()
            .map_or_else(Instant::now, |last| last.due);
        self.pending_replies.push_back(PendingReply {
            due: earliest.max(Instant::now()) + typing,
            text,
            typing_ms: typing.as_millis() as u64,
        });
    }

    fn flush_due_replies(&mut self) {
        let now = Instant::now();
        while self
            .pending_replies
            .front()
            .is_some_and(|reply| reply.due <= now)
        {
            let Some(reply) = self.pending_replies.pop_front() else {
                break;
            };
            send_event(&IpcEvent::Reply {
                text: reply.text,
                typing_ms: reply.typing_ms,
            });
            if self.pending_replies.is_empty() {
                send_event(&IpcEvent::Typing { active: false });
            }
        }
    }

    fn drain_background(&mut self) {
        while let Ok(fired) = self.assistant.fired_reminders().try_recv() {
            let text = self.assistant.on_reminder(fired);
            send_event(&IpcEvent::Reminder { text });
        }
        while let Ok(remark) = self.assistant.idle_remarks().try_recv() {
            self.assistant.on_idle_remark(&remark);
            send_event(&IpcEvent::Remark { text: remark });
        }
        while let Ok(activation) = self.assistant.activations().try_recv() {
            self.assistant.on_activation(&activation);
            send_event(&IpcEvent::Activated {
                phrase: activation.phrase,
            });
        }
    }
}

// ============================================================================
// Event Sending
// ============================================================================

pub(super) fn send_event(event: &IpcEvent) {
    #[cfg(any(test, feature = "mutants"))]
    if capture_test_event(event) {
        return;
    }
    if let Ok(json) = serde_json::to_string(event) {
        let mut stdout = io::stdout().lock();
        let _ = writeln!(stdout, "{json}");
        let _ = stdout.flush();
    }
}

// Per-thread so parallel tests each see only their own loop's events.
#[cfg(any(test, feature = "mutants"))]
thread_local! {
    static EVENT_SINK: RefCell<Option<Vec<IpcEvent>>> = const { RefCell::new(None) };
}

#[cfg(any(test, feature = "mutants"))]
fn capture_test_event(event: &IpcEvent) -> bool {
    EVENT_SINK.with(|sink| match sink.borrow_mut().as_mut() {
        Some(events) => {
            events.push(event.clone());
            true
        }
        None => false,
    })
}

#[cfg(any(test, feature = "mutants"))]
#[allow(dead_code)]
pub(super) fn init_event_sink() {
    EVENT_SINK.with(|sink| {
        sink.borrow_mut().get_or_insert_with(Vec::new);
    });
}

#[cfg(any(test, feature = "mutants"))]
#[allow(dead_code)]
pub(super) fn take_events() -> Vec<IpcEvent> {
    EVENT_SINK.with(|sink| {
        sink.borrow_mut()
            .as_mut()
            .map(std::mem::take)
            .unwrap_or_default()
    })
}

// ============================================================================
// Stdin Reader Thread
// ============================================================================

fn spawn_stdin_reader(tx: Sender<IpcCommand>) -> io::Result<thread::JoinHandle<()>> {
    thread::Builder::new()
        .name("jarvis-ipc-stdin".to_string())
        .spawn(move || {
            let stdin = io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else {
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match parse_command(&line) {
                    Ok(cmd) => {
                        if tx.send(cmd).is_err() {
                            break; // Main loop has exited
                        }
                    }
                    Err(event) => send_event(&event),
                }
            }
            log_debug("Stdin reader thread exiting");
        })
}

// ============================================================================
// Main Event Loop
// ============================================================================

pub fn run_ipc_mode(config: AppConfig) -> Result<()> {
    log_debug("Starting JSON IPC mode");

    let mut state = IpcState::new(config)?;
    state.emit_capabilities();

    let (cmd_tx, cmd_rx) = unbounded();
    let _stdin_handle = spawn_stdin_reader(cmd_tx)?;
    let result = run_ipc_loop(&mut state, &cmd_rx, None);
    state.assistant.shutdown();
    result
}

pub(super) fn dispatch_command(state: &mut IpcState, cmd: IpcCommand) {
    log_debug_content(&format!("IPC command received: {cmd:?}"));
    match cmd {
        IpcCommand::Send { text } => handle_send(state, &text),
        IpcCommand::Hear { text } => handle_hear(state, &text),
        IpcCommand::SetSetting { key, value } => handle_set_setting(state, &key, value),
        IpcCommand::GetHistory => handle_get_history(state),
        IpcCommand::ClearHistory => handle_clear_history(state),
        IpcCommand::GetCapabilities => state.emit_capabilities(),
        IpcCommand::Exit => state.exit_requested = true,
    }
}

pub(super) fn run_ipc_loop(
    state: &mut IpcState,
    cmd_rx: &Receiver<IpcCommand>,
    max_loops: Option<u64>,
) -> Result<()> {
    let mut loop_count: u64 = 0;
    let mut input_closed = false;
    loop {
        loop_count += 1;
        if let Some(limit) = max_loops {
            if loop_count > limit {
                log_debug("IPC loop reached test limit, exiting");
                break;
            }
        }

        if !input_closed {
            match cmd_rx.try_recv() {
                Ok(cmd) => dispatch_command(state, cmd),
                Err(TryRecvError::Empty) => {}
                Err(TryRecvError::Disconnected) => {
                    log_debug("Command channel disconnected");
                    input_closed = true;
                }
            }
        }

        state.drain_background();
        state.flush_due_replies();

        // Exit once nothing is left to deliver.
        if (state.exit_requested || input_closed) && state.pending_replies.is_empty() {
            break;
        }

        thread::sleep(LOOP_SLEEP);
    }

    log_debug("IPC mode exiting");
    Ok(())
}
