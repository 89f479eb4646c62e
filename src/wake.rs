//! Wake-phrase detection over recognized speech.

use crate::settings::SettingsProvider;
use crate::{log_debug, log_debug_content};
use crossbeam_channel::{Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

pub const ACTIVATION_PHRASES: [&str; 2] = ["эй, джарвис", "эй джарвис"];
pub const STOP_PHRASES: [&str; 3] = ["хватит", "спасибо", "спасибо, джарвис"];
pub const FAREWELL: &str = "Всегда пожалуйста, господин!";

/// Emitted once when the wake phrase is heard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activation {
    /// The recognized text that contained the phrase.
    pub phrase: String,
}

/// Substring match, so "эй джарвис, который час" also wakes.
pub fn is_activation_phrase(recognized: &str) -> bool {
    let lowered = recognized.to_lowercase();
    ACTIVATION_PHRASES
        .iter()
        .any(|phrase| lowered.contains(phrase))
}

/// Whole-utterance match; "спасибо за помощь" keeps listening.
pub fn is_stop_phrase(recognized: &str) -> bool {
    let lowered = recognized.trim().to_lowercase();
    STOP_PHRASES.contains(&lowered.as_str())
}

/// Watch `heard` until the wake phrase shows up, then send one [`Activation`] and exit.
///
/// Text arriving while voice recognition is switched off is dropped. The thread
/// also exits, without sending, when every sender of `heard` is gone.
pub fn spawn_activation_listener(
    heard: Receiver<String>,
    settings: Arc<dyn SettingsProvider>,
    activations: Sender<Activation>,
) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("jarvis-wake".to_string())
        .spawn(move || listen_for_activation(&heard, settings.as_ref(), &activations))
}

fn listen_for_activation(
    heard: &Receiver<String>,
    settings: &dyn SettingsProvider,
    activations: &Sender<Activation>,
) {
    for text in heard.iter() {
        if !settings.voice_recognition_enabled() {
            log_debug("voice recognition disabled; ignoring recognized text");
            continue;
        }
        log_debug_content(&format!("recognized: {text}"));
        if is_activation_phrase(&text) {
            tracing::info!("activation phrase detected");
            let _ = activations.send(Activation { phrase: text });
            return;
        }
    }
    log_debug("recognized-text channel closed; activation listener exiting");
}
