use crate::error::FaultKind;
use regex::Regex;
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;

use super::timer::AlarmError;

/// Text carried by a reminder when the user gave none.
pub const DEFAULT_REMINDER_TEXT: &str = "Время вышло!";

/// Longest accepted delay unless the ceiling is disabled.
pub const DEFAULT_REMINDER_CEILING: Duration = Duration::from_secs(365 * 24 * 60 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Seconds,
    Minutes,
    Hours,
}

impl TimeUnit {
    /// Map a spoken unit word onto a unit; inflected forms included.
    pub fn from_word(word: &str) -> Option<Self> {
        match word.to_lowercase().as_str() {
            "секунд" | "секунды" | "секунду" | "секунда" | "сек" => Some(TimeUnit::Seconds),
            "минут" | "минуты" | "минуту" | "минута" | "мин" => Some(TimeUnit::Minutes),
            "час" | "часа" | "часов" => Some(TimeUnit::Hours),
            _ => None,
        }
    }

    pub fn length(self) -> Duration {
        match self {
            TimeUnit::Seconds => Duration::from_secs(1),
            TimeUnit::Minutes => Duration::from_secs(60),
            TimeUnit::Hours => Duration::from_secs(60 * 60),
        }
    }
}

/// A parsed "через N <unit> <text>" expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderRequest {
    pub amount: u64,
    pub unit: TimeUnit,
    /// Unit word as the user said it, echoed back in the confirmation.
    pub unit_word: String,
    pub text: String,
    pub delay: Duration,
}

#[derive(Debug, Error)]
pub enum ReminderError {
    #[error("reminder expression did not match '<number> <unit> <text>'")]
    Malformed,
    #[error("reminder amount '{0}' is not a valid number")]
    InvalidNumber(String),
    #[error("reminder amount must be positive")]
    NonPositive,
    #[error("unknown time unit '{0}'")]
    UnknownUnit(String),
    #[error("reminder delay exceeds the configured ceiling")]
    TooLong,
    #[error("exact alarm scheduling is not permitted")]
    ExactAlarmDenied,
    #[error("failed to schedule reminder: {0}")]
    Schedule(#[from] AlarmError),
}

impl ReminderError {
    /// User-facing reply for this failure.
    pub fn reply(&self) -> String {
        match self {
            ReminderError::Malformed => {
                "Укажи время и текст, например: 'Напомни мне через 5 минут позвонить'.".to_string()
            }
            ReminderError::InvalidNumber(_) => "Укажи число, например: '5 минут'.".to_string(),
            ReminderError::NonPositive => "Время должно быть больше нуля, господин.".to_string(),
            ReminderError::UnknownUnit(unit) => format!(
                "Единица времени '{unit}' не ясна. Используй 'секунды', 'минуты', 'часы'."
            ),
            ReminderError::TooLong => {
                "Слишком долгое напоминание, максимум год, господин.".to_string()
            }
            ReminderError::ExactAlarmDenied => {
                "Дай разрешение на точные будильники в настройках, господин!".to_string()
            }
            ReminderError::Schedule(_) => {
                "Не могу установить напоминание, проверь разрешения!".to_string()
            }
        }
    }

    pub fn fault_kind(&self) -> FaultKind {
        match self {
            ReminderError::Malformed
            | ReminderError::InvalidNumber(_)
            | ReminderError::NonPositive
            | ReminderError::UnknownUnit(_)
            | ReminderError::TooLong => FaultKind::Parse,
            ReminderError::ExactAlarmDenied => FaultKind::PermissionDenied,
            ReminderError::Schedule(AlarmError::NotPermitted) => FaultKind::PermissionDenied,
            ReminderError::Schedule(_) => FaultKind::PlatformRejected,
        }
    }
}

fn expression_regex() -> &'static Regex {
    static EXPRESSION_RE: OnceLock<Regex> = OnceLock::new();
    EXPRESSION_RE.get_or_init(|| {
        Regex::new(r"(?s)^\s*([-+]?\d+)\s*([^\W\d]\w*)\s*(.*?)\s*$")
            .expect("reminder regex should compile")
    })
}

/// Parse the part of the utterance following the trigger phrase.
///
/// `ceiling` of `None` accepts any delay that fits in a [`Duration`].
pub fn parse_reminder(
    expression: &str,
    ceiling: Option<Duration>,
) -> Result<ReminderRequest, ReminderError> {
    let caps = expression_regex()
        .captures(expression)
        .ok_or(ReminderError::Malformed)?;
    let raw_amount = &caps[1];
    let signed: i64 = raw_amount
        .parse()
        .map_err(|_| ReminderError::InvalidNumber(raw_amount.to_string()))?;
    let amount = u64::try_from(signed)
        .ok()
        .filter(|amount| *amount > 0)
        .ok_or(ReminderError::NonPositive)?;
    let unit_word = caps[2].to_string();
    let unit = TimeUnit::from_word(&unit_word)
        .ok_or_else(|| ReminderError::UnknownUnit(unit_word.clone()))?;

    let delay = u32::try_from(amount)
        .ok()
        .and_then(|amount| unit.length().checked_mul(amount))
        .ok_or(ReminderError::TooLong)?;
    if ceiling.is_some_and(|limit| delay > limit) {
        return Err(ReminderError::TooLong);
    }

    let text = match caps[3].trim() {
        "" => DEFAULT_REMINDER_TEXT.to_string(),
        text => text.to_string(),
    };

    Ok(ReminderRequest {
        amount,
        unit,
        unit_word,
        text,
        delay,
    })
}
