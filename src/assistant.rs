//! Runtime wiring shared by the REPL and the JSON IPC front end.
//!
//! [`Assistant`] owns the chat session plus the background sources that feed
//! it: fired reminders, wake-phrase activations and idle remarks. Front ends
//! select over those receivers and route each event back through here.

use crate::catalog::ResponseCatalog;
use crate::chat::{ChatReply, ChatSession, IdleRemarks};
use crate::clock::{Clock, SystemClock};
use crate::config::{AppConfig, CapabilityArg};
use crate::conversation::ConversationStore;
use crate::device::{Capability, DeviceActuator, VirtualDevice, WifiControl};
use crate::interpreter::CommandInterpreter;
use crate::reminder::{ReminderFired, ReminderScheduler, TimerThread};
use crate::settings::{resolve_flag, PreferenceStore, SettingsProvider, FLAGS};
use crate::speech::{CommandSpeaker, NullSpeaker, Speaker};
use crate::wake::{is_stop_phrase, spawn_activation_listener, Activation, FAREWELL};
use crate::{log_debug, log_debug_content};
use anyhow::{anyhow, Context, Result};
use crossbeam_channel::{never, unbounded, Receiver, Sender};
use std::sync::Arc;

/// What became of a line of recognized speech.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HearOutcome {
    /// Passed to the wake listener; an [`Activation`] may follow.
    Listening,
    /// Voice recognition is off, or the text was blank.
    Ignored,
    /// A stop phrase ended the active conversation.
    Farewell(String),
    /// Treated as a command because the assistant was already awake.
    Reply(ChatReply),
}

enum WakeState {
    Waiting { heard: Sender<String> },
    Active,
}

pub struct Assistant {
    chat: ChatSession,
    prefs: Arc<PreferenceStore>,
    device: Arc<VirtualDevice>,
    timer: Arc<TimerThread>,
    fired: Receiver<ReminderFired>,
    wake: WakeState,
    activation_tx: Sender<Activation>,
    activations: Receiver<Activation>,
    idle: Option<IdleRemarks>,
    idle_rx: Receiver<String>,
}

pub fn virtual_device_from_config(config: &AppConfig) -> VirtualDevice {
    let mut device = VirtualDevice::new().with_wifi(config.wifi_on);
    if config.wifi_panel {
        device = device.with_wifi_control(WifiControl::SettingsPanel);
    }
    for denied in &config.denied_capabilities {
        let capabilities: &[Capability] = match denied {
            CapabilityArg::Wifi => &[Capability::ChangeWifiState, Capability::AccessWifiState],
            CapabilityArg::Audio => &[Capability::ModifyAudioSettings],
            CapabilityArg::Camera => &[Capability::Camera],
        };
        for capability in capabilities {
            device = device.deny(*capability);
        }
    }
    device
}

impl Assistant {
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let prefs = Arc::new(PreferenceStore::open(config.prefs_path()));
        let catalog = Arc::new(ResponseCatalog::random());
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let device = Arc::new(virtual_device_from_config(config));

        let (timer, fired) = TimerThread::spawn(!config.no_exact_alarms, clock.clone());
        let timer = Arc::new(timer);
        let reminders = ReminderScheduler::new(timer.clone(), clock.clone())
            .with_ceiling(config.reminder_ceiling());
        let actuator = DeviceActuator::new(device.clone(), catalog.clone(), config.wifi_settle());
        let interpreter = CommandInterpreter::new(
            catalog.clone(),
            reminders,
            actuator,
            prefs.clone(),
            clock.clone(),
        );

        let speaker: Arc<dyn Speaker> = match config.tts_cmd.as_deref() {
            Some(command) => Arc::new(
                CommandSpeaker::new(command).context("failed to start TTS command worker")?,
            ),
            None => Arc::new(NullSpeaker),
        };
        let transcript = ConversationStore::load(prefs.clone(), config.history_max);
        let chat = ChatSession::new(
            interpreter,
            transcript,
            prefs.clone(),
            speaker,
            clock,
            config.typing_config(),
        );

        let (idle, idle_rx) = if config.idle_remarks {
            let (tx, rx) = unbounded();
            let idle = IdleRemarks::spawn(catalog, config.idle_remark_range(), tx)
                .context("failed to spawn idle remark thread")?;
            (Some(idle), rx)
        } else {
            (None, never())
        };

        let (activation_tx, activations) = unbounded();
        let mut assistant = Self {
            chat,
            prefs,
            device,
            timer,
            fired,
            wake: WakeState::Active,
            activation_tx,
            activations,
            idle,
            idle_rx,
        };
        assistant.start_wake_listener()?;
        log_debug(&format!(
            "assistant ready (prefs {})",
            config.prefs_path().display()
        ));
        Ok(assistant)
    }

    fn start_wake_listener(&mut self) -> Result<()> {
        let (heard, heard_rx) = unbounded();
        spawn_activation_listener(heard_rx, self.prefs.clone(), self.activation_tx.clone())
            .context("failed to spawn activation listener")?;
        self.wake = WakeState::Waiting { heard };
        Ok(())
    }

    pub fn chat(&self) -> &ChatSession {
        &self.chat
    }

    pub fn prefs(&self) -> &Arc<PreferenceStore> {
        &self.prefs
    }

    pub fn device(&self) -> &Arc<VirtualDevice> {
        &self.device
    }

    pub fn pending_reminders(&self) -> usize {
        self.timer.pending()
    }

    pub fn fired_reminders(&self) -> &Receiver<ReminderFired> {
        &self.fired
    }

    pub fn activations(&self) -> &Receiver<Activation> {
        &self.activations
    }

    pub fn idle_remarks(&self) -> &Receiver<String> {
        &self.idle_rx
    }

    pub fn is_awake(&self) -> bool {
        matches!(self.wake, WakeState::Active)
    }

    pub fn send(&self, text: &str) -> Option<ChatReply> {
        self.chat.send_message(text)
    }

    /// Record a fired reminder in the transcript and return its text.
    pub fn on_reminder(&self, fired: ReminderFired) -> String {
        let lateness = (fired.fired_at - fired.scheduled_for).num_milliseconds();
        log_debug(&format!("reminder {} delivered {lateness} ms late", fired.id));
        self.chat.add_witty_message(&fired.text);
        fired.text
    }

    pub fn on_idle_remark(&self, remark: &str) {
        self.chat.add_witty_message(remark);
    }

    pub fn on_activation(&mut self, activation: &Activation) {
        log_debug_content(&format!("activated by: {}", activation.phrase));
        self.wake = WakeState::Active;
    }

    /// Route recognized speech: wake listener while asleep, commands while awake.
    pub fn hear(&mut self, text: &str) -> Result<HearOutcome> {
        if text.trim().is_empty() || !self.prefs.voice_recognition_enabled() {
            return Ok(HearOutcome::Ignored);
        }
        match &self.wake {
            WakeState::Waiting { heard } => {
                if heard.send(text.to_string()).is_err() {
                    // Listener died; restart it and retry once.
                    self.start_wake_listener()?;
                    if let WakeState::Waiting { heard } = &self.wake {
                        heard
                            .send(text.to_string())
                            .map_err(|_| anyhow!("activation listener is not accepting text"))?;
                    }
                }
                Ok(HearOutcome::Listening)
            }
            WakeState::Active if is_stop_phrase(text) => {
                self.chat.add_witty_message(FAREWELL);
                self.start_wake_listener()?;
                Ok(HearOutcome::Farewell(FAREWELL.to_string()))
            }
            WakeState::Active => Ok(self
                .chat
                .send_message(text)
                .map_or(HearOutcome::Ignored, HearOutcome::Reply)),
        }
    }

    /// Set a boolean flag by key or alias. Returns the canonical key.
    pub fn set_flag(&self, name: &str, value: bool) -> Result<&'static str> {
        let key = resolve_flag(name).ok_or_else(|| anyhow!("unknown setting '{name}'"))?;
        self.prefs
            .set_bool(key, value)
            .with_context(|| format!("failed to save setting {key}"))?;
        log_debug(&format!("setting {key} = {value}"));
        Ok(key)
    }

    /// Every flag with its live value, in display order.
    pub fn flags(&self) -> Vec<(&'static str, bool)> {
        FLAGS
            .iter()
            .map(|(key, default)| (*key, self.prefs.get_bool(key, *default)))
            .collect()
    }

    pub fn shutdown(mut self) {
        if let Some(idle) = self.idle.take() {
            idle.stop();
        }
        self.timer.request_shutdown();
        self.wake = WakeState::Active;
        log_debug("assistant shut down");
    }
}
