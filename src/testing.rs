//! Test doubles shared across module tests.

use crate::catalog::{ResponseCatalog, SequenceSelector};
use crate::clock::{Clock, FixedClock};
use crate::device::{DeviceActuator, VirtualDevice};
use crate::interpreter::CommandInterpreter;
use crate::lock_or_recover;
use crate::reminder::{Alarm, AlarmError, AlarmScheduler, ReminderScheduler};
use crate::settings::PreferenceStore;
use crate::speech::{SpeakMode, Speaker};
use crate::config::AppConfig;
use chrono::{DateTime, Local, TimeDelta, TimeZone};
use clap::Parser;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

/// Captures scheduled alarms instead of firing them.
pub(crate) struct RecordingAlarms {
    exact_allowed: AtomicBool,
    fail_with: Mutex<Option<AlarmError>>,
    alarms: Mutex<Vec<Alarm>>,
}

impl RecordingAlarms {
    pub(crate) fn new(exact_allowed: bool) -> Self {
        Self {
            exact_allowed: AtomicBool::new(exact_allowed),
            fail_with: Mutex::new(None),
            alarms: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn fail_next(&self, err: AlarmError) {
        *lock_or_recover(&self.fail_with, "RecordingAlarms::fail_next") = Some(err);
    }

    pub(crate) fn scheduled(&self) -> Vec<Alarm> {
        lock_or_recover(&self.alarms, "RecordingAlarms::scheduled").clone()
    }
}

impl AlarmScheduler for RecordingAlarms {
    fn can_schedule_exact(&self) -> bool {
        self.exact_allowed.load(Ordering::Relaxed)
    }

    fn schedule(&self, alarm: Alarm) -> Result<(), AlarmError> {
        if let Some(err) = lock_or_recover(&self.fail_with, "RecordingAlarms::schedule").take() {
            return Err(err);
        }
        lock_or_recover(&self.alarms, "RecordingAlarms::schedule").push(alarm);
        Ok(())
    }
}

/// 14 June 2024, 18:30 local time.
pub(crate) fn fixed_clock() -> FixedClock {
    FixedClock(
        Local
            .with_ymd_and_hms(2024, 6, 14, 18, 30, 0)
            .single()
            .expect("unambiguous local time"),
    )
}

/// Clock that only moves when a test advances it.
pub(crate) struct ManualClock(Mutex<DateTime<Local>>);

impl ManualClock {
    pub(crate) fn starting_at(at: DateTime<Local>) -> Self {
        Self(Mutex::new(at))
    }

    pub(crate) fn advance(&self, by: TimeDelta) {
        *lock_or_recover(&self.0, "ManualClock::advance") += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Local> {
        *lock_or_recover(&self.0, "ManualClock::now")
    }
}

/// Interpreter wired to in-memory doubles, with handles to inspect them.
pub(crate) struct Harness {
    pub(crate) interpreter: CommandInterpreter,
    pub(crate) alarms: Arc<RecordingAlarms>,
    pub(crate) device: Arc<VirtualDevice>,
    pub(crate) prefs: Arc<PreferenceStore>,
}

pub(crate) fn harness() -> Harness {
    harness_with_device(VirtualDevice::new())
}

/// Replies are always the first entry of each category.
pub(crate) fn harness_with_device(device: VirtualDevice) -> Harness {
    let catalog = Arc::new(ResponseCatalog::new(Box::new(SequenceSelector::first())));
    let alarms = Arc::new(RecordingAlarms::new(true));
    let device = Arc::new(device);
    let prefs = Arc::new(PreferenceStore::in_memory());
    let clock: Arc<dyn Clock> = Arc::new(fixed_clock());
    let interpreter = CommandInterpreter::new(
        catalog.clone(),
        ReminderScheduler::new(alarms.clone(), clock.clone()),
        DeviceActuator::new(device.clone(), catalog, Duration::ZERO),
        prefs.clone(),
        clock,
    );
    Harness {
        interpreter,
        alarms,
        device,
        prefs,
    }
}

/// Remembers what would have been spoken.
#[derive(Default)]
pub(crate) struct RecordingSpeaker {
    spoken: Mutex<Vec<(String, SpeakMode)>>,
}

impl RecordingSpeaker {
    pub(crate) fn spoken(&self) -> Vec<(String, SpeakMode)> {
        lock_or_recover(&self.spoken, "RecordingSpeaker::spoken").clone()
    }
}

impl Speaker for RecordingSpeaker {
    fn speak(&self, text: &str, mode: SpeakMode) -> anyhow::Result<()> {
        lock_or_recover(&self.spoken, "RecordingSpeaker::speak").push((text.to_string(), mode));
        Ok(())
    }
}

/// Validated config with its preference file in `dir` and no artificial delays.
pub(crate) fn test_config(dir: &TempDir, extra: &[&str]) -> AppConfig {
    let prefs = dir.path().join("prefs.json");
    let defaults = [
        ("--prefs-file", prefs.display().to_string()),
        ("--typing-delay-min-ms", "0".to_string()),
        ("--typing-ms-per-char", "0".to_string()),
        ("--wifi-settle-ms", "0".to_string()),
    ];
    let mut args = vec!["jarvis".to_string()];
    for (flag, value) in defaults {
        if !extra.contains(&flag) {
            args.push(flag.to_string());
            args.push(value);
        }
    }
    args.extend(extra.iter().map(|arg| arg.to_string()));
    let mut config = AppConfig::parse_from(args);
    config.validate().expect("valid test config");
    config
}
