use super::*;
use crate::clock::{Clock, SystemClock};
use crate::testing::{fixed_clock, ManualClock, RecordingAlarms};
use chrono::TimeDelta;
use std::sync::Arc;
use std::time::Duration;

fn scheduler(alarms: &Arc<RecordingAlarms>) -> ReminderScheduler {
    ReminderScheduler::new(alarms.clone(), Arc::new(fixed_clock()))
}

#[test]
fn parses_minutes_with_text() {
    let request = parse_reminder(" 5 минут позвонить маме", Some(DEFAULT_REMINDER_CEILING))
        .expect("valid expression");
    assert_eq!(request.amount, 5);
    assert_eq!(request.unit, TimeUnit::Minutes);
    assert_eq!(request.unit_word, "минут");
    assert_eq!(request.text, "позвонить маме");
    assert_eq!(request.delay, Duration::from_secs(300));
}

#[test]
fn accepts_unit_glued_to_number() {
    let request = parse_reminder("10сек чайник", None).expect("valid expression");
    assert_eq!(request.unit, TimeUnit::Seconds);
    assert_eq!(request.delay, Duration::from_secs(10));
}

#[test]
fn empty_text_uses_placeholder() {
    let request = parse_reminder("2 часа", None).expect("valid expression");
    assert_eq!(request.text, DEFAULT_REMINDER_TEXT);
    assert_eq!(request.delay, Duration::from_secs(7200));
}

#[test]
fn rejects_missing_number() {
    assert!(matches!(
        parse_reminder("пять минут позвонить", None),
        Err(ReminderError::Malformed)
    ));
    assert!(matches!(parse_reminder("10", None), Err(ReminderError::Malformed)));
}

#[test]
fn rejects_non_positive_amounts() {
    for expression in ["0 минут позвонить", "-3 минуты позвонить"] {
        assert!(
            matches!(
                parse_reminder(expression, None),
                Err(ReminderError::NonPositive)
            ),
            "{expression}"
        );
    }
}

#[test]
fn rejects_unparseable_number() {
    let err = parse_reminder("99999999999999999999 секунд", None).unwrap_err();
    assert!(matches!(err, ReminderError::InvalidNumber(_)));
    assert_eq!(err.reply(), "Укажи число, например: '5 минут'.");
}

#[test]
fn rejects_unknown_unit() {
    let err = parse_reminder("5 лет отпуск", None).unwrap_err();
    assert!(matches!(err, ReminderError::UnknownUnit(ref unit) if unit == "лет"));
    assert!(err.reply().contains("'лет' не ясна"));
}

#[test]
fn ceiling_is_inclusive_of_one_year() {
    assert!(parse_reminder("8760 часов", Some(DEFAULT_REMINDER_CEILING)).is_ok());
    assert!(matches!(
        parse_reminder("8761 часов", Some(DEFAULT_REMINDER_CEILING)),
        Err(ReminderError::TooLong)
    ));
    assert!(parse_reminder("8761 часов", None).is_ok());
}

#[test]
fn schedules_alarm_at_now_plus_delay() {
    let alarms = Arc::new(RecordingAlarms::new(true));
    let reply = scheduler(&alarms).schedule("5 минут позвонить");
    assert_eq!(reply, "Напоминание на 'позвонить' через 5 минут установлено.");

    let scheduled = alarms.scheduled();
    assert_eq!(scheduled.len(), 1);
    assert_eq!(
        scheduled[0].fire_at,
        fixed_clock().now() + TimeDelta::milliseconds(300_000)
    );
    assert_eq!(scheduled[0].text, "позвонить");
}

#[test]
fn alarm_ids_are_unique() {
    let alarms = Arc::new(RecordingAlarms::new(true));
    let scheduler = scheduler(&alarms);
    scheduler.schedule("1 минуту раз");
    scheduler.schedule("2 минуты два");
    let scheduled = alarms.scheduled();
    assert_ne!(scheduled[0].id, scheduled[1].id);
}

#[test]
fn parse_errors_schedule_nothing() {
    let alarms = Arc::new(RecordingAlarms::new(true));
    let scheduler = scheduler(&alarms);
    assert_eq!(
        scheduler.schedule("0 минут позвонить"),
        "Время должно быть больше нуля, господин."
    );
    assert!(scheduler.schedule("5 веков").contains("не ясна"));
    assert!(alarms.scheduled().is_empty());
}

#[test]
fn missing_exact_alarm_grant_is_reported() {
    let alarms = Arc::new(RecordingAlarms::new(false));
    let reply = scheduler(&alarms).schedule("5 минут позвонить");
    assert_eq!(
        reply,
        "Дай разрешение на точные будильники в настройках, господин!"
    );
    assert!(alarms.scheduled().is_empty());
}

#[test]
fn scheduling_failure_becomes_reply() {
    let alarms = Arc::new(RecordingAlarms::new(true));
    alarms.fail_next(AlarmError::Closed);
    let reply = scheduler(&alarms).schedule("5 минут позвонить");
    assert_eq!(reply, "Не могу установить напоминание, проверь разрешения!");
}

#[test]
fn ceiling_applies_before_permission_check() {
    let alarms = Arc::new(RecordingAlarms::new(false));
    let reply = scheduler(&alarms).schedule("9000 часов отпуск");
    assert_eq!(reply, "Слишком долгое напоминание, максимум год, господин.");
}

#[test]
fn timer_thread_fires_due_alarms_in_order() {
    let (timer, fired) = TimerThread::spawn(true, Arc::new(SystemClock));
    let now = chrono::Local::now();
    timer
        .schedule(Alarm {
            id: 2,
            fire_at: now + TimeDelta::milliseconds(60),
            text: "второе".to_string(),
        })
        .expect("schedule second");
    timer
        .schedule(Alarm {
            id: 1,
            fire_at: now + TimeDelta::milliseconds(20),
            text: "первое".to_string(),
        })
        .expect("schedule first");

    let first = fired
        .recv_timeout(Duration::from_secs(2))
        .expect("first alarm fires");
    let second = fired
        .recv_timeout(Duration::from_secs(2))
        .expect("second alarm fires");
    assert_eq!(first.text, "первое");
    assert_eq!(second.text, "второе");
    assert!(first.fired_at >= first.scheduled_for);
    assert_eq!(timer.pending(), 0);
    timer.shutdown();
}

#[test]
fn timer_thread_refuses_without_exact_grant() {
    let (timer, _fired) = TimerThread::spawn(false, Arc::new(SystemClock));
    let alarm = Alarm {
        id: 1,
        fire_at: chrono::Local::now(),
        text: "x".to_string(),
    };
    assert_eq!(timer.schedule(alarm.clone()), Err(AlarmError::NotPermitted));
    timer.set_exact_allowed(true);
    assert!(timer.schedule(alarm).is_ok());
    timer.shutdown();
}

#[test]
fn queued_alarms_outlive_dropped_timer_handle() {
    let (timer, fired) = TimerThread::spawn(true, Arc::new(SystemClock));
    timer
        .schedule(Alarm {
            id: 9,
            fire_at: chrono::Local::now() + TimeDelta::milliseconds(30),
            text: "после".to_string(),
        })
        .expect("schedule");
    drop(timer);
    let event = fired
        .recv_timeout(Duration::from_secs(2))
        .expect("alarm still fires");
    assert_eq!(event.id, 9);
}

#[test]
fn shutdown_discards_pending_alarms() {
    let (timer, fired) = TimerThread::spawn(true, Arc::new(SystemClock));
    timer
        .schedule(Alarm {
            id: 3,
            fire_at: chrono::Local::now() + TimeDelta::seconds(60),
            text: "никогда".to_string(),
        })
        .expect("schedule");
    assert_eq!(timer.pending(), 1);
    timer.shutdown();
    assert!(fired.recv_timeout(Duration::from_millis(50)).is_err());
}

#[test]
fn timer_thread_follows_injected_clock() {
    let start = fixed_clock().now();
    let clock = Arc::new(ManualClock::starting_at(start));
    let (timer, fired) = TimerThread::spawn(true, clock.clone());
    timer
        .schedule(Alarm {
            id: 4,
            fire_at: start + TimeDelta::hours(1),
            text: "через час".to_string(),
        })
        .expect("schedule");

    assert!(fired.recv_timeout(Duration::from_millis(100)).is_err());
    assert_eq!(timer.pending(), 1);

    clock.advance(TimeDelta::hours(1));
    let event = fired
        .recv_timeout(Duration::from_secs(2))
        .expect("fires once the clock reaches the deadline");
    assert_eq!(event.text, "через час");
    assert_eq!(event.fired_at, start + TimeDelta::hours(1));
    timer.shutdown();
}
