//! JSON-lines protocol between the assistant and an external UI.
//!
//! Messages are newline-delimited JSON objects: events carry an `"event"` tag,
//! commands a `"cmd"` tag.

use crate::conversation::ConversationEntry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// IPC Events (Rust → client)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event")]
pub enum IpcEvent {
    /// Sent once on startup and on request
    #[serde(rename = "capabilities")]
    Capabilities {
        session_id: String,
        version: String,
        granted: Vec<String>,
        denied: Vec<String>,
        wifi_control: String,
        exact_alarms: bool,
        tts_available: bool,
        history_max: usize,
        settings: BTreeMap<String, bool>,
    },

    /// Typing indicator on/off around a pending reply
    #[serde(rename = "typing")]
    Typing { active: bool },

    /// Reply to a `send` (or an awake `hear`), released after `typing_ms`
    #[serde(rename = "reply")]
    Reply { text: String, typing_ms: u64 },

    /// A reminder came due
    #[serde(rename = "reminder")]
    Reminder { text: String },

    /// Unsolicited idle remark
    #[serde(rename = "remark")]
    Remark { text: String },

    /// Transcript snapshot
    #[serde(rename = "history")]
    History { entries: Vec<ConversationEntry> },

    /// Wake phrase heard; subsequent `hear` text is treated as commands
    #[serde(rename = "activated")]
    Activated { phrase: String },

    /// Stop phrase heard; back to waiting for the wake phrase
    #[serde(rename = "deactivated")]
    Deactivated { farewell: String },

    #[serde(rename = "setting_changed")]
    SettingChanged { key: String, value: bool },

    /// Error (recoverable or fatal)
    #[serde(rename = "error")]
    Error { message: String, recoverable: bool },
}

// ============================================================================
// IPC Commands (client → Rust)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "cmd")]
pub enum IpcCommand {
    /// Typed text; slash commands are honored too
    #[serde(rename = "send")]
    Send { text: String },

    /// Text produced by an external speech recognizer
    #[serde(rename = "hear")]
    Hear { text: String },

    #[serde(rename = "set_setting")]
    SetSetting { key: String, value: bool },

    #[serde(rename = "get_history")]
    GetHistory,

    #[serde(rename = "clear_history")]
    ClearHistory,

    /// Request capabilities (re-emit capabilities event)
    #[serde(rename = "get_capabilities")]
    GetCapabilities,

    #[serde(rename = "exit")]
    Exit,
}

/// Decode one input line, mapping failures to the error event the client sees.
pub fn parse_command(line: &str) -> Result<IpcCommand, IpcEvent> {
    serde_json::from_str(line.trim()).map_err(|err| IpcEvent::Error {
        message: format!("Invalid command: {err}"),
        recoverable: true,
    })
}
