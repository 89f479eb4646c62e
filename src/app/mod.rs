//! Process-wide plumbing shared by the REPL and IPC front ends.

mod logging;

pub use logging::{
    crash_log_path, init_logging, log_debug, log_debug_content, log_fault, log_file_path,
    log_panic,
};
