//! Utterance → reply.
//!
//! [`classify`] maps a normalized utterance onto an [`Intent`] with an ordered
//! cascade (first match wins). [`CommandInterpreter`] dispatches the intent to
//! the reminder scheduler, the device actuator or the reply catalog, then adds
//! a witty tail when sarcasm is on.

#[cfg(test)]
mod tests;

use crate::catalog::{ResponseCatalog, ResponseCategory};
use crate::clock::{format_short, Clock};
use crate::device::DeviceActuator;
use crate::error::FaultKind;
use crate::reminder::{ReminderScheduler, TRIGGER_PHRASE};
use crate::settings::SettingsProvider;
use crate::{log_debug, log_debug_content, log_fault};
use regex::Regex;
use std::sync::{Arc, OnceLock};

const GREETING_PHRASES: &[&str] = &["привет", "здравствуй", "здравствуйте"];
const STATUS_PHRASES: &[&str] = &["как дела", "как ты"];
const TIME_PHRASES: &[&str] = &["покажи время", "который час"];
const WIFI_ON_PHRASES: &[&str] = &["включи вайфай", "включи wi-fi"];
const WIFI_OFF_PHRASES: &[&str] = &["выключи вайфай", "выключи wi-fi"];
const MUTE_PHRASES: &[&str] = &["выключи звук"];
const UNMUTE_PHRASES: &[&str] = &["включи звук"];
const FLASHLIGHT_ON_PHRASES: &[&str] = &["включи фонарик"];
const FLASHLIGHT_OFF_PHRASES: &[&str] = &["выключи фонарик"];

pub const PERCENTAGE_TOO_LARGE_REPLY: &str = "Числа слишком большие даже для меня, господин.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Greeting,
    StatusQuery,
    TimeQuery,
    /// Text following the trigger phrase.
    SetReminder {
        expression: String,
    },
    /// Digit strings as spoken; they may not fit in a machine integer.
    PercentageQuery {
        percent: String,
        base: String,
    },
    WifiOn,
    WifiOff,
    SoundMute,
    SoundUnmute,
    FlashlightOn,
    FlashlightOff,
    Unknown,
}

impl Intent {
    pub fn label(&self) -> &'static str {
        match self {
            Intent::Greeting => "greeting",
            Intent::StatusQuery => "status",
            Intent::TimeQuery => "time",
            Intent::SetReminder { .. } => "reminder",
            Intent::PercentageQuery { .. } => "percentage",
            Intent::WifiOn => "wifi_on",
            Intent::WifiOff => "wifi_off",
            Intent::SoundMute => "sound_mute",
            Intent::SoundUnmute => "sound_unmute",
            Intent::FlashlightOn => "flashlight_on",
            Intent::FlashlightOff => "flashlight_off",
            Intent::Unknown => "unknown",
        }
    }
}

/// Trim and lowercase, the only normalization utterances get.
pub fn normalize(utterance: &str) -> String {
    utterance.trim().to_lowercase()
}

fn percentage_regex() -> &'static Regex {
    static PERCENTAGE_RE: OnceLock<Regex> = OnceLock::new();
    PERCENTAGE_RE.get_or_init(|| {
        Regex::new(r"^(?:сколько|какой процент)\s+([0-9]+)\s*%?\s*от\s+([0-9]+)$")
            .expect("percentage regex should compile")
    })
}

/// Classify an already normalized utterance. Pure.
pub fn classify(normalized: &str) -> Intent {
    if let Some(rest) = normalized.strip_prefix(TRIGGER_PHRASE) {
        return Intent::SetReminder {
            expression: rest.to_string(),
        };
    }
    if let Some(caps) = percentage_regex().captures(normalized) {
        return Intent::PercentageQuery {
            percent: caps[1].to_string(),
            base: caps[2].to_string(),
        };
    }

    let is = |phrases: &[&str]| phrases.contains(&normalized);
    if is(GREETING_PHRASES) {
        Intent::Greeting
    } else if is(STATUS_PHRASES) {
        Intent::StatusQuery
    } else if is(TIME_PHRASES) {
        Intent::TimeQuery
    } else if is(WIFI_ON_PHRASES) {
        Intent::WifiOn
    } else if is(WIFI_OFF_PHRASES) {
        Intent::WifiOff
    } else if is(MUTE_PHRASES) {
        Intent::SoundMute
    } else if is(UNMUTE_PHRASES) {
        Intent::SoundUnmute
    } else if is(FLASHLIGHT_ON_PHRASES) {
        Intent::FlashlightOn
    } else if is(FLASHLIGHT_OFF_PHRASES) {
        Intent::FlashlightOff
    } else {
        Intent::Unknown
    }
}

/// `floor(percent * base / 100)`, or `None` when either input exceeds `u64`.
pub fn percentage_of(percent: &str, base: &str) -> Option<u128> {
    let percent: u64 = percent.parse().ok()?;
    let base: u64 = base.parse().ok()?;
    // Both factors fit in u64, so the product cannot overflow u128.
    Some(u128::from(percent) * u128::from(base) / 100)
}

pub struct CommandInterpreter {
    catalog: Arc<ResponseCatalog>,
    reminders: ReminderScheduler,
    device: DeviceActuator,
    settings: Arc<dyn SettingsProvider>,
    clock: Arc<dyn Clock>,
}

impl CommandInterpreter {
    pub fn new(
        catalog: Arc<ResponseCatalog>,
        reminders: ReminderScheduler,
        device: DeviceActuator,
        settings: Arc<dyn SettingsProvider>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            catalog,
            reminders,
            device,
            settings,
            clock,
        }
    }

    pub fn catalog(&self) -> &Arc<ResponseCatalog> {
        &self.catalog
    }

    /// Produce the reply for one utterance. Never fails; faults become replies.
    pub fn interpret(&self, utterance: &str) -> String {
        let normalized = normalize(utterance);
        let intent = classify(&normalized);
        log_debug(&format!("intent: {}", intent.label()));
        log_debug_content(&format!("utterance: {normalized}"));
        if intent == Intent::Unknown {
            log_fault(FaultKind::Unrecognized, "no intent matched");
        }

        let base = self.dispatch(intent);
        // Read at call time so a settings change applies to the very next reply.
        if self.settings.sarcasm_enabled() {
            format!("{base} {}", self.catalog.pick(ResponseCategory::Witty))
        } else {
            base
        }
    }

    fn dispatch(&self, intent: Intent) -> String {
        match intent {
            Intent::SetReminder { expression } => self.reminders.schedule(&expression),
            Intent::PercentageQuery { percent, base } => match percentage_of(&percent, &base) {
                Some(value) => format!("{value}, я гений, да?"),
                None => {
                    log_fault(FaultKind::Parse, "percentage operands exceed u64");
                    PERCENTAGE_TOO_LARGE_REPLY.to_string()
                }
            },
            Intent::Greeting => self.catalog.pick(ResponseCategory::Greeting),
            Intent::StatusQuery => self.catalog.pick(ResponseCategory::Status),
            Intent::TimeQuery => format!(
                "Текущее время: {}, господин.",
                format_short(&self.clock.now())
            ),
            Intent::WifiOn => self.device.toggle_wifi(true),
            Intent::WifiOff => self.device.toggle_wifi(false),
            Intent::SoundMute => self.device.set_mute(true),
            Intent::SoundUnmute => self.device.set_mute(false),
            Intent::FlashlightOn => self.device.toggle_flashlight(true),
            Intent::FlashlightOff => self.device.toggle_flashlight(false),
            Intent::Unknown => self.catalog.pick(ResponseCategory::Unknown),
        }
    }
}
