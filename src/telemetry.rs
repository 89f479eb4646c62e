//! Structured JSON trace of reminders, device changes and session lifecycle.

use crate::config::AppConfig;
use std::env;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::OnceLock;
use tracing_subscriber::fmt::time::UtcTime;

static TRACING_INIT: OnceLock<()> = OnceLock::new();

/// Outer surface the process is serving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontEnd {
    Repl,
    Ipc,
}

impl FrontEnd {
    pub fn from_config(config: &AppConfig) -> Self {
        if config.json_ipc {
            FrontEnd::Ipc
        } else {
            FrontEnd::Repl
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FrontEnd::Repl => "repl",
            FrontEnd::Ipc => "ipc",
        }
    }
}

pub fn tracing_log_path() -> PathBuf {
    env::var("JARVIS_TRACE_LOG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| env::temp_dir().join("jarvis_trace.jsonl"))
}

/// Install the JSON trace writer once and record which front end started.
///
/// Worker threads are named (`jarvis-timer`, `jarvis-wake`, ...), so each
/// line carries the thread it came from.
pub fn init_tracing(config: &AppConfig) {
    if !config.logging_enabled() {
        return;
    }

    TRACING_INIT.get_or_init(|| {
        let path = tracing_log_path();
        let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
            return;
        };
        let subscriber = tracing_subscriber::fmt()
            .json()
            .with_timer(UtcTime::rfc_3339())
            .with_writer(file)
            .with_thread_names(true)
            .with_current_span(false)
            .with_span_list(false)
            .finish();
        if tracing::subscriber::set_global_default(subscriber).is_err() {
            return;
        }
        tracing::info!(
            front_end = FrontEnd::from_config(config).label(),
            version = env!("CARGO_PKG_VERSION"),
            history_max = config.history_max,
            exact_alarms = !config.no_exact_alarms,
            reminder_ceiling = config.reminder_ceiling().is_some(),
            "session started"
        );
    });
}
