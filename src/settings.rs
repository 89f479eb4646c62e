//! Live configuration flags and the file-backed preference store behind them.
//!
//! Flags are read through [`SettingsProvider`] on every call; nothing caches
//! them. [`PreferenceStore`] is a flat JSON object on disk, rewritten through a
//! temp file on each change.

use crate::{lock_or_recover, log_debug};
use serde_json::{Map, Value};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

pub const KEY_SARCASM: &str = "sarcasm_enabled";
pub const KEY_VOICE: &str = "voice_enabled";
pub const KEY_VOICE_RECOGNITION: &str = "voice_recognition_enabled";

/// Boolean flags with their defaults, in display order.
pub const FLAGS: [(&str, bool); 3] = [
    (KEY_SARCASM, false),
    (KEY_VOICE, false),
    (KEY_VOICE_RECOGNITION, true),
];

/// Look up a flag by its key or short alias (`sarcasm`, `voice`, `recognition`).
pub fn resolve_flag(name: &str) -> Option<&'static str> {
    match name.trim().to_lowercase().as_str() {
        "sarcasm" | KEY_SARCASM => Some(KEY_SARCASM),
        "voice" | KEY_VOICE => Some(KEY_VOICE),
        "recognition" | "voice_recognition" | KEY_VOICE_RECOGNITION => {
            Some(KEY_VOICE_RECOGNITION)
        }
        _ => None,
    }
}

pub trait SettingsProvider: Send + Sync {
    fn sarcasm_enabled(&self) -> bool;
    fn voice_enabled(&self) -> bool;
    fn voice_recognition_enabled(&self) -> bool;
}

/// Fixed flags, for tests and embedding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticSettings {
    pub sarcasm: bool,
    pub voice: bool,
    pub voice_recognition: bool,
}

impl Default for StaticSettings {
    fn default() -> Self {
        Self {
            sarcasm: false,
            voice: false,
            voice_recognition: true,
        }
    }
}

impl SettingsProvider for StaticSettings {
    fn sarcasm_enabled(&self) -> bool {
        self.sarcasm
    }

    fn voice_enabled(&self) -> bool {
        self.voice
    }

    fn voice_recognition_enabled(&self) -> bool {
        self.voice_recognition
    }
}

#[derive(Debug, Error)]
pub enum PreferenceError {
    #[error("failed to write preferences to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to encode preferences: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Key/value preferences persisted as one JSON object.
pub struct PreferenceStore {
    path: Option<PathBuf>,
    values: Mutex<Map<String, Value>>,
}

impl PreferenceStore {
    /// Load from `path`. A missing or unreadable file starts empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match fs::read_to_string(&path) {
            Ok(raw) => parse_object(&raw).unwrap_or_else(|| {
                log_debug(&format!(
                    "preferences at {} are not a JSON object; starting empty",
                    path.display()
                ));
                Map::new()
            }),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Map::new(),
            Err(err) => {
                log_debug(&format!(
                    "failed to read preferences at {}: {err}",
                    path.display()
                ));
                Map::new()
            }
        };
        Self {
            path: Some(path),
            values: Mutex::new(values),
        }
    }

    /// Store that never touches disk.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            values: Mutex::new(Map::new()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        lock_or_recover(&self.values, "PreferenceStore::get_bool")
            .get(key)
            .and_then(Value::as_bool)
            .unwrap_or(default)
    }

    pub fn set_bool(&self, key: &str, value: bool) -> Result<(), PreferenceError> {
        self.update(key, Value::Bool(value))
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        lock_or_recover(&self.values, "PreferenceStore::get_string")
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    pub fn set_string(&self, key: &str, value: String) -> Result<(), PreferenceError> {
        self.update(key, Value::String(value))
    }

    fn update(&self, key: &str, value: Value) -> Result<(), PreferenceError> {
        let mut values = lock_or_recover(&self.values, "PreferenceStore::update");
        values.insert(key.to_string(), value);
        // Persist while still holding the lock so concurrent writers land in order.
        self.persist(&values)
    }

    fn persist(&self, values: &Map<String, Value>) -> Result<(), PreferenceError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let encoded = serde_json::to_vec_pretty(values)?;
        write_atomically(path, &encoded).map_err(|source| PreferenceError::Write {
            path: path.clone(),
            source,
        })
    }
}

impl SettingsProvider for PreferenceStore {
    fn sarcasm_enabled(&self) -> bool {
        self.get_bool(KEY_SARCASM, false)
    }

    fn voice_enabled(&self) -> bool {
        self.get_bool(KEY_VOICE, false)
    }

    fn voice_recognition_enabled(&self) -> bool {
        self.get_bool(KEY_VOICE_RECOGNITION, true)
    }
}

fn parse_object(raw: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(raw).ok()? {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

fn write_atomically(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("json.tmp");
    {
        let mut file = fs::File::create(&tmp)?;
        file.write_all(bytes)?;
        file.sync_all()?;
    }
    fs::rename(&tmp, path)
}
