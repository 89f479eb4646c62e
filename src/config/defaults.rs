use std::env;
use std::path::PathBuf;

pub const DEFAULT_HISTORY_MAX: usize = 50;
pub const MAX_HISTORY_MAX: usize = 1_000;
pub const DEFAULT_TYPING_DELAY_MIN_MS: u64 = 500;
pub const DEFAULT_TYPING_MS_PER_CHAR: u64 = 10;
pub const DEFAULT_WIFI_SETTLE_MS: u64 = 1_000;
pub const MAX_WIFI_SETTLE_MS: u64 = 10_000;
pub const DEFAULT_IDLE_REMARK_MIN_SECS: u64 = 300;
pub const DEFAULT_IDLE_REMARK_MAX_SECS: u64 = 900;

pub(super) const MAX_TYPING_DELAY_MS: u64 = 10_000;
pub(super) const MAX_TYPING_MS_PER_CHAR: u64 = 200;
pub(super) const MIN_IDLE_REMARK_SECS: u64 = 5;
pub(super) const MAX_IDLE_REMARK_SECS: u64 = 24 * 60 * 60;
// The TTS command is spawned directly, so keep shell metacharacters out of it.
pub(super) const FORBIDDEN_COMMAND_CHARS: &[char] =
    &[';', '|', '&', '$', '`', '<', '>', '\\', '\'', '"', '\n', '\r'];

const PREFS_DIR_NAME: &str = "jarvis";
const PREFS_FILE_NAME: &str = "prefs.json";

/// Platform config dir when available, temp dir otherwise.
pub fn default_prefs_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(env::temp_dir)
        .join(PREFS_DIR_NAME)
        .join(PREFS_FILE_NAME)
}
