pub mod assistant;
pub mod catalog;
pub mod chat;
pub mod clock;
pub mod commands;
pub mod config;
pub mod conversation;
pub mod device;
pub mod error;
pub mod interpreter;
pub mod ipc;
mod lock;
pub mod reminder;
pub mod settings;
pub mod speech;
pub mod telemetry;
pub mod wake;

mod app;

#[cfg(test)]
mod testing;

pub(crate) use lock::lock_or_recover;
pub use app::*;
