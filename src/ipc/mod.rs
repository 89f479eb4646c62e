//! JSON IPC mode for external UI integration.
//!
//! A non-blocking JSON-lines protocol over stdin/stdout so an external front
//! end (or a speech recognizer bridge) can drive the assistant.
//!
//! Architecture:
//! - Stdin reader thread: decodes JSON commands, forwards them over a channel
//! - Main event loop: handles commands, fired reminders, activations and idle
//!   remarks, and releases replies once their typing delay has passed
//!
//! Protocol:
//! - Each line is a JSON object
//! - Events (Rust → client): {"event": "...", ...}
//! - Commands (client → Rust): {"cmd": "...", ...}

mod protocol;
mod router;
mod session;


pub use protocol::{parse_command, IpcCommand, IpcEvent};
pub use session::run_ipc_mode;
