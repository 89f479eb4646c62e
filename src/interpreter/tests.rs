use super::*;
use crate::catalog::ResponseCatalog;
use crate::device::{Capability, RingerMode, VirtualDevice};
use crate::settings::KEY_SARCASM;
use crate::testing::{fixed_clock, harness, harness_with_device};
use chrono::TimeDelta;
use proptest::prelude::*;

#[test]
fn classify_follows_cascade_order() {
    let cases = [
        ("привет", Intent::Greeting),
        ("здравствуйте", Intent::Greeting),
        ("как ты", Intent::StatusQuery),
        ("который час", Intent::TimeQuery),
        ("включи wi-fi", Intent::WifiOn),
        ("выключи вайфай", Intent::WifiOff),
        ("выключи звук", Intent::SoundMute),
        ("включи звук", Intent::SoundUnmute),
        ("включи фонарик", Intent::FlashlightOn),
        ("выключи фонарик", Intent::FlashlightOff),
        ("какая погода", Intent::Unknown),
        ("привет джарвис", Intent::Unknown),
    ];
    for (utterance, expected) in cases {
        assert_eq!(classify(utterance), expected, "{utterance}");
    }
}

#[test]
fn reminder_prefix_wins_over_everything() {
    assert_eq!(
        classify("напомни мне через 5 минут привет"),
        Intent::SetReminder {
            expression: " 5 минут привет".to_string()
        }
    );
}

#[test]
fn percentage_variants_classify() {
    for utterance in ["сколько 25% от 100", "какой процент 25 от 100", "сколько 25 % от 100"] {
        assert_eq!(
            classify(utterance),
            Intent::PercentageQuery {
                percent: "25".to_string(),
                base: "100".to_string()
            },
            "{utterance}"
        );
    }
    assert_eq!(classify("сколько -5% от 100"), Intent::Unknown);
}

#[test]
fn normalization_trims_and_lowercases() {
    assert_eq!(normalize("  ПРИВЕТ \n"), "привет");
    let harness = harness();
    assert!(ResponseCatalog::contains(
        ResponseCategory::Greeting,
        &harness.interpreter.interpret("  Привет  ")
    ));
}

#[test]
fn percentage_reply() {
    let harness = harness();
    assert_eq!(
        harness.interpreter.interpret("сколько 25% от 100"),
        "25, я гений, да?"
    );
    assert_eq!(
        harness.interpreter.interpret("какой процент 33 от 10"),
        "3, я гений, да?"
    );
}

#[test]
fn percentage_overflow_gets_its_own_reply() {
    let harness = harness();
    assert_eq!(
        harness
            .interpreter
            .interpret("сколько 99999999999999999999999% от 2"),
        PERCENTAGE_TOO_LARGE_REPLY
    );
    assert_eq!(
        percentage_of("18446744073709551615", "18446744073709551615"),
        Some(u128::from(u64::MAX) * u128::from(u64::MAX) / 100)
    );
}

proptest! {
    #[test]
    fn percentage_is_floor_of_product(x in 0u64..1_000_000, y in 0u64..1_000_000) {
        let harness = harness();
        let reply = harness.interpreter.interpret(&format!("сколько {x}% от {y}"));
        prop_assert_eq!(reply, format!("{}, я гений, да?", x * y / 100));
    }

    #[test]
    fn classify_never_panics(input in "\\PC{0,40}") {
        let _ = classify(&normalize(&input));
    }
}

#[test]
fn unknown_replies_come_from_unknown_set() {
    let harness = harness();
    let reply = harness.interpreter.interpret("какая погода");
    assert!(ResponseCatalog::contains(ResponseCategory::Unknown, &reply));
}

#[test]
fn status_and_time_replies() {
    let harness = harness();
    assert!(ResponseCatalog::contains(
        ResponseCategory::Status,
        &harness.interpreter.interpret("как дела")
    ));
    assert_eq!(
        harness.interpreter.interpret("покажи время"),
        "Текущее время: 14.06 18:30, господин."
    );
}

#[test]
fn sarcasm_is_read_at_call_time() {
    let harness = harness();
    let plain = harness.interpreter.interpret("привет");
    assert!(ResponseCatalog::contains(ResponseCategory::Greeting, &plain));

    harness.prefs.set_bool(KEY_SARCASM, true).expect("in-memory write");
    assert_eq!(
        harness.interpreter.interpret("привет"),
        format!(
            "{} {}",
            ResponseCategory::Greeting.replies()[0],
            ResponseCategory::Witty.replies()[0]
        )
    );

    harness.prefs.set_bool(KEY_SARCASM, false).expect("in-memory write");
    assert_eq!(harness.interpreter.interpret("привет"), plain);
}

#[test]
fn reminder_end_to_end() {
    let harness = harness();
    let reply = harness
        .interpreter
        .interpret("Напомни мне через 5 минут позвонить маме");
    assert_eq!(
        reply,
        "Напоминание на 'позвонить маме' через 5 минут установлено."
    );
    let scheduled = harness.alarms.scheduled();
    assert_eq!(scheduled.len(), 1);
    assert_eq!(scheduled[0].text, "позвонить маме");
    assert_eq!(
        scheduled[0].fire_at,
        crate::clock::Clock::now(&fixed_clock()) + TimeDelta::minutes(5)
    );
}

#[test]
fn reminder_without_amount_explains_format() {
    let harness = harness();
    let reply = harness.interpreter.interpret("напомни мне через немного");
    assert_eq!(
        reply,
        "Укажи время и текст, например: 'Напомни мне через 5 минут позвонить'."
    );
    assert!(harness.alarms.scheduled().is_empty());
}

#[test]
fn device_commands_reach_the_actuator() {
    let harness = harness();
    harness.interpreter.interpret("включи вайфай");
    harness.interpreter.interpret("выключи звук");
    harness.interpreter.interpret("включи фонарик");
    let snapshot = harness.device.snapshot();
    assert!(snapshot.wifi_enabled);
    assert_eq!(snapshot.ringer_mode, RingerMode::Vibrate);
    assert!(snapshot.torch_on);
    assert_eq!(
        harness.interpreter.interpret("включи wi-fi"),
        "Wi-Fi уже включён, господин!"
    );
}

#[test]
fn permission_replies_pass_through_unchanged() {
    let harness = harness_with_device(VirtualDevice::new().deny(Capability::Camera));
    assert_eq!(
        harness.interpreter.interpret("включи фонарик"),
        "Дай разрешение на камеру, господин, иначе фонарик не включить!"
    );
}
