use super::defaults::{
    default_prefs_path, FORBIDDEN_COMMAND_CHARS, MAX_IDLE_REMARK_SECS, MAX_TYPING_DELAY_MS,
    MAX_TYPING_MS_PER_CHAR, MIN_IDLE_REMARK_SECS,
};
use super::{AppConfig, TypingConfig, MAX_HISTORY_MAX, MAX_WIFI_SETTLE_MS};
use crate::reminder::DEFAULT_REMINDER_CEILING;
use anyhow::{bail, Result};
use clap::Parser;
use std::{
    ops::RangeInclusive,
    path::{Path, PathBuf},
    time::Duration,
};

impl AppConfig {
    /// Parse CLI arguments and validate them right away.
    pub fn parse_args() -> Result<Self> {
        let mut config = Self::parse();
        config.validate()?;
        Ok(config)
    }

    /// Check CLI values and normalize paths.
    pub fn validate(&mut self) -> Result<()> {
        if !(1..=MAX_HISTORY_MAX).contains(&self.history_max) {
            bail!(
                "--history-max must be between 1 and {MAX_HISTORY_MAX}, got {}",
                self.history_max
            );
        }
        if self.typing_delay_min_ms > MAX_TYPING_DELAY_MS {
            bail!(
                "--typing-delay-min-ms must be at most {MAX_TYPING_DELAY_MS}, got {}",
                self.typing_delay_min_ms
            );
        }
        if self.typing_ms_per_char > MAX_TYPING_MS_PER_CHAR {
            bail!(
                "--typing-ms-per-char must be at most {MAX_TYPING_MS_PER_CHAR}, got {}",
                self.typing_ms_per_char
            );
        }
        if self.wifi_settle_ms > MAX_WIFI_SETTLE_MS {
            bail!(
                "--wifi-settle-ms must be between 0 and {MAX_WIFI_SETTLE_MS}, got {}",
                self.wifi_settle_ms
            );
        }
        for (flag, value) in [
            ("--idle-remark-min-secs", self.idle_remark_min_secs),
            ("--idle-remark-max-secs", self.idle_remark_max_secs),
        ] {
            if !(MIN_IDLE_REMARK_SECS..=MAX_IDLE_REMARK_SECS).contains(&value) {
                bail!(
                    "{flag} must be between {MIN_IDLE_REMARK_SECS} and {MAX_IDLE_REMARK_SECS}, got {value}"
                );
            }
        }
        if self.idle_remark_min_secs > self.idle_remark_max_secs {
            bail!(
                "--idle-remark-min-secs ({}) cannot exceed --idle-remark-max-secs ({})",
                self.idle_remark_min_secs,
                self.idle_remark_max_secs
            );
        }

        if let Some(cmd) = &self.tts_cmd {
            self.tts_cmd = Some(sanitize_command(cmd, "--tts-cmd")?);
        }

        if let Some(path) = &self.prefs_file {
            if path.as_os_str().is_empty() {
                bail!("--prefs-file must not be empty");
            }
            if path.is_dir() {
                bail!("--prefs-file '{}' is a directory", path.display());
            }
        }

        Ok(())
    }

    /// Preference file location, falling back to the per-user config dir.
    pub fn prefs_path(&self) -> PathBuf {
        self.prefs_file.clone().unwrap_or_else(default_prefs_path)
    }

    /// Snapshot the reply pacing knobs.
    pub fn typing_config(&self) -> TypingConfig {
        TypingConfig {
            min_delay: Duration::from_millis(self.typing_delay_min_ms),
            per_char: Duration::from_millis(self.typing_ms_per_char),
        }
    }

    pub fn wifi_settle(&self) -> Duration {
        Duration::from_millis(self.wifi_settle_ms)
    }

    /// `None` means reminders of any length are accepted.
    pub fn reminder_ceiling(&self) -> Option<Duration> {
        (!self.no_reminder_ceiling).then_some(DEFAULT_REMINDER_CEILING)
    }

    pub fn idle_remark_range(&self) -> RangeInclusive<Duration> {
        let min = Duration::from_secs(self.idle_remark_min_secs);
        let max = Duration::from_secs(self.idle_remark_max_secs);
        min..=max
    }

    /// File logging is on when requested and not vetoed by `--no-logs`.
    pub fn logging_enabled(&self) -> bool {
        (self.logs || self.log_timings) && !self.no_logs
    }
}

/// Accept a bare program name or a path, rejecting anything a shell would interpret.
pub(super) fn sanitize_command(value: &str, flag: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        bail!("{flag} cannot be empty");
    }
    if trimmed.len() > 256 {
        bail!("{flag} must be at most 256 bytes");
    }
    if trimmed
        .chars()
        .any(|ch| FORBIDDEN_COMMAND_CHARS.contains(&ch) || ch.is_control())
    {
        bail!("{flag} must not contain control or shell metacharacters");
    }
    let program = trimmed.split_whitespace().next().unwrap_or(trimmed);
    let path = Path::new(program);
    if path.is_absolute() && !path.is_file() {
        bail!("{flag} '{}' is not a file", path.display());
    }
    Ok(trimmed.to_string())
}
