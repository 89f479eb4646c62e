//! Chat session: transcript bookkeeping around the interpreter.

use crate::catalog::{ResponseCatalog, ResponseCategory};
use crate::clock::Clock;
use crate::config::TypingConfig;
use crate::conversation::{ConversationEntry, ConversationStore};
use crate::interpreter::CommandInterpreter;
use crate::settings::SettingsProvider;
use crate::speech::{SpeakMode, Speaker};
use crate::{log_debug, log_debug_content};
use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use rand::Rng;
use std::ops::RangeInclusive;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// A reply plus how long the front end should show the typing indicator first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub text: String,
    pub typing_delay: Duration,
}

pub struct ChatSession {
    interpreter: CommandInterpreter,
    transcript: ConversationStore,
    settings: Arc<dyn SettingsProvider>,
    speaker: Arc<dyn Speaker>,
    clock: Arc<dyn Clock>,
    typing: TypingConfig,
}

impl ChatSession {
    pub fn new(
        interpreter: CommandInterpreter,
        transcript: ConversationStore,
        settings: Arc<dyn SettingsProvider>,
        speaker: Arc<dyn Speaker>,
        clock: Arc<dyn Clock>,
        typing: TypingConfig,
    ) -> Self {
        Self {
            interpreter,
            transcript,
            settings,
            speaker,
            clock,
            typing,
        }
    }

    pub fn catalog(&self) -> &Arc<ResponseCatalog> {
        self.interpreter.catalog()
    }

    fn now_millis(&self) -> i64 {
        self.clock.now().timestamp_millis()
    }

    /// Record `text`, interpret it and record the reply. Blank input is ignored.
    pub fn send_message(&self, text: &str) -> Option<ChatReply> {
        if text.trim().is_empty() {
            return None;
        }
        self.transcript
            .push(ConversationEntry::user(text, self.now_millis()));

        let reply = self.interpreter.interpret(text);
        let typing_delay = self.typing.delay_for(&reply);
        log_debug(&format!(
            "reply ready ({} chars, typing {} ms)",
            reply.chars().count(),
            typing_delay.as_millis()
        ));
        log_debug_content(&format!("reply: {reply}"));

        self.transcript
            .push(ConversationEntry::jarvis(reply.clone(), self.now_millis()));
        self.voice(&reply, SpeakMode::Flush);
        Some(ChatReply {
            text: reply,
            typing_delay,
        })
    }

    /// Record an unsolicited assistant line (idle remark, fired reminder, farewell).
    pub fn add_witty_message(&self, text: &str) {
        self.transcript
            .push(ConversationEntry::jarvis(text, self.now_millis()));
        self.voice(text, SpeakMode::Queue);
    }

    pub fn history(&self) -> Vec<ConversationEntry> {
        self.transcript.entries()
    }

    pub fn clear_history(&self) {
        self.transcript.clear();
        log_debug("transcript cleared");
    }

    fn voice(&self, text: &str, mode: SpeakMode) {
        if !self.settings.voice_enabled() {
            return;
        }
        if let Err(err) = self.speaker.speak(text, mode) {
            log_debug(&format!("speech failed: {err:#}"));
        }
    }
}

/// Background thread posting a witty remark after each random idle interval.
pub struct IdleRemarks {
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl IdleRemarks {
    pub fn spawn(
        catalog: Arc<ResponseCatalog>,
        interval: RangeInclusive<Duration>,
        remarks: Sender<String>,
    ) -> std::io::Result<Self> {
        let (stop, stop_rx) = bounded::<()>(0);
        let handle = thread::Builder::new()
            .name("jarvis-idle".to_string())
            .spawn(move || loop {
                let wait = random_interval(&interval);
                match stop_rx.recv_timeout(wait) {
                    Err(RecvTimeoutError::Timeout) => {
                        if remarks
                            .send(catalog.pick(ResponseCategory::Witty))
                            .is_err()
                        {
                            return;
                        }
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => return,
                }
            })?;
        Ok(Self {
            stop: Some(stop),
            handle: Some(handle),
        })
    }

    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        // Dropping the sender wakes the thread out of its wait.
        self.stop.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for IdleRemarks {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn random_interval(range: &RangeInclusive<Duration>) -> Duration {
    let low = range.start().as_millis() as u64;
    let high = range.end().as_millis() as u64;
    if high <= low {
        return *range.start();
    }
    Duration::from_millis(rand::thread_rng().gen_range(low..=high))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SequenceSelector;
    use crate::settings::{KEY_VOICE, PreferenceStore};
    use crate::testing::{fixed_clock, harness, RecordingSpeaker};
    use crossbeam_channel::unbounded;

    struct Fixture {
        session: ChatSession,
        speaker: Arc<RecordingSpeaker>,
        prefs: Arc<PreferenceStore>,
    }

    fn fixture(capacity: usize) -> Fixture {
        let harness = harness();
        let speaker = Arc::new(RecordingSpeaker::default());
        let transcript = ConversationStore::load(harness.prefs.clone(), capacity);
        let session = ChatSession::new(
            harness.interpreter,
            transcript,
            harness.prefs.clone(),
            speaker.clone(),
            Arc::new(fixed_clock()),
            TypingConfig::default(),
        );
        Fixture {
            session,
            speaker,
            prefs: harness.prefs,
        }
    }

    #[test]
    fn blank_input_is_ignored() {
        let fixture = fixture(50);
        assert!(fixture.session.send_message("   ").is_none());
        assert!(fixture.session.history().is_empty());
    }

    #[test]
    fn send_records_both_sides() {
        let fixture = fixture(50);
        let reply = fixture
            .session
            .send_message("сколько 25% от 100")
            .expect("reply");
        assert_eq!(reply.text, "25, я гений, да?");
        let history = fixture.session.history();
        assert_eq!(history.len(), 2);
        assert!(history[0].is_from_user);
        assert_eq!(history[0].text, "сколько 25% от 100");
        assert_eq!(history[1].text, "25, я гений, да?");
        assert_eq!(history[1].timestamp, fixed_clock().0.timestamp_millis());
    }

    #[test]
    fn typing_delay_has_a_floor_and_scales() {
        let fixture = fixture(50);
        let short = fixture.session.send_message("сколько 25% от 100").expect("reply");
        assert_eq!(short.typing_delay, Duration::from_millis(500));

        let long = fixture
            .session
            .send_message("напомни мне через 5 минут позвонить в налоговую и уточнить про вычет")
            .expect("reply");
        let chars = long.text.chars().count() as u64;
        assert!(chars > 50);
        assert_eq!(long.typing_delay, Duration::from_millis(chars * 10));
    }

    #[test]
    fn transcript_is_capped() {
        let fixture = fixture(3);
        fixture.session.send_message("привет");
        fixture.session.send_message("как дела");
        let history = fixture.session.history();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].text, ResponseCategory::Greeting.replies()[0]);
    }

    #[test]
    fn speaks_only_when_voice_enabled() {
        let fixture = fixture(50);
        fixture.session.send_message("привет");
        assert!(fixture.speaker.spoken().is_empty());

        fixture.prefs.set_bool(KEY_VOICE, true).expect("in-memory write");
        let reply = fixture.session.send_message("привет").expect("reply");
        fixture.session.add_witty_message("Кстати, я умнее, чем кажусь.");
        assert_eq!(
            fixture.speaker.spoken(),
            vec![
                (reply.text, SpeakMode::Flush),
                (
                    "Кстати, я умнее, чем кажусь.".to_string(),
                    SpeakMode::Queue
                ),
            ]
        );
    }

    #[test]
    fn clear_history_empties_transcript() {
        let fixture = fixture(50);
        fixture.session.send_message("привет");
        fixture.session.clear_history();
        assert!(fixture.session.history().is_empty());
    }

    #[test]
    fn idle_remarks_post_witty_lines_until_stopped() {
        let catalog = Arc::new(ResponseCatalog::new(Box::new(SequenceSelector::first())));
        let (tx, rx) = unbounded();
        let interval = Duration::from_millis(5)..=Duration::from_millis(10);
        let remarks = IdleRemarks::spawn(catalog, interval, tx).expect("spawn idle remarks");
        let remark = rx
            .recv_timeout(Duration::from_secs(2))
            .expect("remark posted");
        assert_eq!(remark, ResponseCategory::Witty.replies()[0]);
        remarks.stop();
        while rx.try_recv().is_ok() {}
        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
    }

    #[test]
    fn random_interval_stays_in_range() {
        let range = Duration::from_secs(300)..=Duration::from_secs(900);
        for _ in 0..100 {
            assert!(range.contains(&random_interval(&range)));
        }
        let fixed = Duration::from_secs(5)..=Duration::from_secs(5);
        assert_eq!(random_interval(&fixed), Duration::from_secs(5));
    }
}
