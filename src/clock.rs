//! Wall-clock source injected into the interpreter and reminder scheduler.

use chrono::{DateTime, Local};

/// Format used for the time query reply and transcript timestamps.
pub const SHORT_TIMESTAMP_FORMAT: &str = "%d.%m %H:%M";

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

/// Reads the host clock on every call.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Always reports the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Local>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        self.0
    }
}

/// `dd.MM HH:mm` in local time.
pub fn format_short(at: &DateTime<Local>) -> String {
    at.format(SHORT_TIMESTAMP_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn formats_day_month_hour_minute() {
        let at = Local.with_ymd_and_hms(2024, 3, 7, 9, 5, 0).unwrap();
        assert_eq!(format_short(&at), "07.03 09:05");
        assert_eq!(FixedClock(at).now(), at);
    }
}
