//! Jarvis entrypoint: an interactive chat REPL, or JSON IPC for an external UI.
//!
//! # Architecture
//!
//! - Input thread: reads stdin lines and forwards them over a channel
//! - Main loop: selects over input, fired reminders, activations and idle remarks
//! - Background: reminder timer, wake listener, idle remark ticker, TTS worker

mod repl;

use anyhow::Result;
use jarvis::config::AppConfig;
use jarvis::telemetry::init_tracing;
use jarvis::{init_logging, ipc, log_debug, log_file_path, log_panic};
use std::panic;

fn main() -> Result<()> {
    let config = AppConfig::parse_args()?;
    init_logging(&config);
    init_tracing(&config);

    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        log_panic(info);
        default_hook(info);
    }));

    log_debug("=== Jarvis Started ===");
    log_debug(&format!("Log file: {:?}", log_file_path()));

    if config.json_ipc {
        log_debug("Running in JSON IPC mode");
        return ipc::run_ipc_mode(config);
    }

    let result = repl::run_repl(config);
    log_debug("=== Jarvis Exiting ===");
    if let Err(ref err) = result {
        log_debug(&format!("Exit with error: {err:#}"));
    }
    result
}
