//! Reminder parsing and scheduling.

mod parse;
#[cfg(test)]
mod tests;
mod timer;

pub use parse::{
    parse_reminder, ReminderError, ReminderRequest, TimeUnit, DEFAULT_REMINDER_CEILING,
    DEFAULT_REMINDER_TEXT,
};
pub use timer::{Alarm, AlarmError, AlarmScheduler, ReminderFired, TimerThread};

use crate::clock::Clock;
use crate::{log_debug_content, log_fault};
use chrono::{DateTime, Local, TimeDelta};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Utterance prefix that routes to the reminder scheduler.
pub const TRIGGER_PHRASE: &str = "напомни мне через";

/// Result of a successful [`ReminderScheduler::try_schedule`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledReminder {
    pub request: ReminderRequest,
    pub alarm_id: u64,
    pub fire_at: DateTime<Local>,
}

impl ScheduledReminder {
    pub fn confirmation(&self) -> String {
        format!(
            "Напоминание на '{}' через {} {} установлено.",
            self.request.text, self.request.amount, self.request.unit_word
        )
    }
}

pub struct ReminderScheduler {
    alarms: Arc<dyn AlarmScheduler>,
    clock: Arc<dyn Clock>,
    ceiling: Option<Duration>,
    next_id: AtomicU64,
}

impl ReminderScheduler {
    pub fn new(alarms: Arc<dyn AlarmScheduler>, clock: Arc<dyn Clock>) -> Self {
        Self {
            alarms,
            clock,
            ceiling: Some(DEFAULT_REMINDER_CEILING),
            next_id: AtomicU64::new(1),
        }
    }

    /// Replace the delay ceiling; `None` removes it.
    pub fn with_ceiling(mut self, ceiling: Option<Duration>) -> Self {
        self.ceiling = ceiling;
        self
    }

    /// Parse `expression` (the text after the trigger phrase) and schedule it,
    /// always answering with a reply string.
    pub fn schedule(&self, expression: &str) -> String {
        match self.try_schedule(expression) {
            Ok(scheduled) => scheduled.confirmation(),
            Err(err) => {
                log_fault(err.fault_kind(), &err.to_string());
                err.reply()
            }
        }
    }

    pub fn try_schedule(&self, expression: &str) -> Result<ScheduledReminder, ReminderError> {
        let request = parse_reminder(expression, self.ceiling)?;
        if !self.alarms.can_schedule_exact() {
            return Err(ReminderError::ExactAlarmDenied);
        }

        let fire_at = TimeDelta::from_std(request.delay)
            .ok()
            .and_then(|delta| self.clock.now().checked_add_signed(delta))
            .ok_or(ReminderError::TooLong)?;
        let alarm_id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.alarms.schedule(Alarm {
            id: alarm_id,
            fire_at,
            text: request.text.clone(),
        })?;

        tracing::info!(
            id = alarm_id,
            delay_ms = request.delay.as_millis() as u64,
            "reminder scheduled"
        );
        log_debug_content(&format!(
            "reminder {alarm_id} at {fire_at}: {}",
            request.text
        ));
        Ok(ScheduledReminder {
            request,
            alarm_id,
            fire_at,
        })
    }
}
