//! Command-line parsing and validation helpers.

mod defaults;
mod validation;

use clap::{ArgAction, Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

pub use defaults::{
    default_prefs_path, DEFAULT_HISTORY_MAX, DEFAULT_IDLE_REMARK_MAX_SECS,
    DEFAULT_IDLE_REMARK_MIN_SECS, DEFAULT_TYPING_DELAY_MIN_MS, DEFAULT_TYPING_MS_PER_CHAR,
    DEFAULT_WIFI_SETTLE_MS, MAX_HISTORY_MAX, MAX_WIFI_SETTLE_MS,
};

/// CLI options for the Jarvis assistant. Validated values keep the runtime knobs sane.
#[derive(Debug, Parser, Clone)]
#[command(about = "Jarvis voice-style assistant", author, version)]
pub struct AppConfig {
    /// Preference file holding settings flags and the chat history
    #[arg(long = "prefs-file", env = "JARVIS_PREFS_FILE")]
    pub prefs_file: Option<PathBuf>,

    /// Number of chat entries retained in the history
    #[arg(long = "history-max", default_value_t = DEFAULT_HISTORY_MAX)]
    pub history_max: usize,

    /// Minimum artificial typing delay before a reply is shown (milliseconds)
    #[arg(long = "typing-delay-min-ms", default_value_t = DEFAULT_TYPING_DELAY_MIN_MS)]
    pub typing_delay_min_ms: u64,

    /// Typing delay per reply character (milliseconds)
    #[arg(long = "typing-ms-per-char", default_value_t = DEFAULT_TYPING_MS_PER_CHAR)]
    pub typing_ms_per_char: u64,

    /// Wait after a direct Wi-Fi toggle before re-reading the radio state (milliseconds)
    #[arg(long = "wifi-settle-ms", default_value_t = DEFAULT_WIFI_SETTLE_MS)]
    pub wifi_settle_ms: u64,

    /// Allow reminders longer than one year
    #[arg(long = "no-reminder-ceiling", default_value_t = false)]
    pub no_reminder_ceiling: bool,

    /// Post unsolicited witty remarks while idle
    #[arg(long = "idle-remarks", default_value_t = false)]
    pub idle_remarks: bool,

    /// Shortest pause between idle remarks (seconds)
    #[arg(long = "idle-remark-min-secs", default_value_t = DEFAULT_IDLE_REMARK_MIN_SECS)]
    pub idle_remark_min_secs: u64,

    /// Longest pause between idle remarks (seconds)
    #[arg(long = "idle-remark-max-secs", default_value_t = DEFAULT_IDLE_REMARK_MAX_SECS)]
    pub idle_remark_max_secs: u64,

    /// Text-to-speech command used when voice replies are enabled
    #[arg(long = "tts-cmd", env = "JARVIS_TTS_CMD")]
    pub tts_cmd: Option<String>,

    /// Capability the virtual device reports as not granted (repeatable)
    #[arg(
        long = "deny-capability",
        value_enum,
        action = ArgAction::Append,
        value_name = "CAPABILITY"
    )]
    pub denied_capabilities: Vec<CapabilityArg>,

    /// Make the virtual device delegate Wi-Fi changes to a settings panel
    #[arg(long = "wifi-panel", default_value_t = false)]
    pub wifi_panel: bool,

    /// Start the virtual device with Wi-Fi enabled
    #[arg(long = "wifi-on", default_value_t = false)]
    pub wifi_on: bool,

    /// Refuse exact alarm scheduling (reminders answer with a permission error)
    #[arg(long = "no-exact-alarms", default_value_t = false)]
    pub no_exact_alarms: bool,

    /// Enable file logging (debug)
    #[arg(long = "logs", env = "JARVIS_LOGS", default_value_t = false)]
    pub logs: bool,

    /// Disable all file logging (overrides --logs and log env vars)
    #[arg(long = "no-logs", env = "JARVIS_NO_LOGS", default_value_t = false)]
    pub no_logs: bool,

    /// Allow logging utterance/reply text (debug log only)
    #[arg(long = "log-content", env = "JARVIS_LOG_CONTENT", default_value_t = false)]
    pub log_content: bool,

    /// Enable verbose timing logs
    #[arg(long)]
    pub log_timings: bool,

    /// Run in JSON IPC mode for external UI integration
    #[arg(long = "json-ipc")]
    pub json_ipc: bool,
}

/// Capabilities the virtual device can be told to withhold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CapabilityArg {
    Wifi,
    Audio,
    Camera,
}

/// Reply pacing derived from the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypingConfig {
    pub min_delay: Duration,
    pub per_char: Duration,
}

impl TypingConfig {
    /// No artificial delay at all.
    pub const INSTANT: TypingConfig = TypingConfig {
        min_delay: Duration::ZERO,
        per_char: Duration::ZERO,
    };

    /// Delay scales with reply length but never drops under the minimum.
    pub fn delay_for(&self, reply: &str) -> Duration {
        let chars = u32::try_from(reply.chars().count()).unwrap_or(u32::MAX);
        self.per_char.saturating_mul(chars).max(self.min_delay)
    }
}

impl Default for TypingConfig {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_millis(DEFAULT_TYPING_DELAY_MIN_MS),
            per_char: Duration::from_millis(DEFAULT_TYPING_MS_PER_CHAR),
        }
    }
}
