//! Chat transcript, capped and persisted under one preference key.

use crate::clock::format_short;
use crate::settings::PreferenceStore;
use crate::{lock_or_recover, log_debug};
use chrono::{Local, TimeZone};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Preference key holding the serialized transcript.
pub const MESSAGES_KEY: &str = "messages";

pub const USER_PREFIX: &str = "Вы: ";
pub const JARVIS_PREFIX: &str = "Джарвис: ";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationEntry {
    pub text: String,
    pub is_from_user: bool,
    /// Epoch milliseconds.
    pub timestamp: i64,
}

impl ConversationEntry {
    pub fn user(text: impl Into<String>, timestamp: i64) -> Self {
        Self {
            text: text.into(),
            is_from_user: true,
            timestamp,
        }
    }

    pub fn jarvis(text: impl Into<String>, timestamp: i64) -> Self {
        Self {
            text: text.into(),
            is_from_user: false,
            timestamp,
        }
    }

    pub fn speaker_prefix(&self) -> &'static str {
        if self.is_from_user {
            USER_PREFIX
        } else {
            JARVIS_PREFIX
        }
    }

    /// `[dd.MM HH:mm] Вы: text`
    pub fn display(&self) -> String {
        let stamp = Local
            .timestamp_millis_opt(self.timestamp)
            .single()
            .map(|at| format_short(&at))
            .unwrap_or_else(|| "--.-- --:--".to_string());
        format!("[{stamp}] {}{}", self.speaker_prefix(), self.text)
    }
}

pub struct ConversationStore {
    prefs: Arc<PreferenceStore>,
    capacity: usize,
    entries: Mutex<VecDeque<ConversationEntry>>,
}

impl ConversationStore {
    /// Load the stored transcript, keeping only the newest `capacity` entries.
    pub fn load(prefs: Arc<PreferenceStore>, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let mut entries = decode_entries(prefs.get_string(MESSAGES_KEY).as_deref());
        let excess = entries.len().saturating_sub(capacity);
        entries.drain(..excess);
        Self {
            prefs,
            capacity,
            entries: Mutex::new(entries),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append and persist. Returns true when the oldest entry was evicted.
    pub fn push(&self, entry: ConversationEntry) -> bool {
        let mut entries = lock_or_recover(&self.entries, "ConversationStore::push");
        let dropped = entries.len() >= self.capacity;
        if dropped {
            entries.pop_front();
            log_debug("transcript full; dropping oldest entry");
        }
        entries.push_back(entry);
        self.persist(&entries);
        dropped
    }

    pub fn entries(&self) -> Vec<ConversationEntry> {
        lock_or_recover(&self.entries, "ConversationStore::entries")
            .iter()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        lock_or_recover(&self.entries, "ConversationStore::len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut entries = lock_or_recover(&self.entries, "ConversationStore::clear");
        entries.clear();
        self.persist(&entries);
    }

    fn persist(&self, entries: &VecDeque<ConversationEntry>) {
        let encoded = match serde_json::to_string(entries) {
            Ok(encoded) => encoded,
            Err(err) => {
                log_debug(&format!("failed to encode transcript: {err}"));
                return;
            }
        };
        if let Err(err) = self.prefs.set_string(MESSAGES_KEY, encoded) {
            log_debug(&format!("failed to persist transcript: {err}"));
        }
    }
}

fn decode_entries(raw: Option<&str>) -> VecDeque<ConversationEntry> {
    let Some(raw) = raw else {
        return VecDeque::new();
    };
    match serde_json::from_str::<VecDeque<ConversationEntry>>(raw) {
        Ok(entries) => entries,
        Err(err) => {
            log_debug(&format!("stored transcript is unreadable, starting empty: {err}"));
            VecDeque::new()
        }
    }
}
