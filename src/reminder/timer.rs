//! In-process alarm facility.
//!
//! Each [`Alarm`] owns its payload, so a fire never reaches back into the
//! component that scheduled it.

use crate::clock::Clock;
use crate::{log_debug, log_debug_content};
use chrono::{DateTime, Local};
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use serde::{Deserialize, Serialize};
use std::cmp::{Ordering as CmpOrdering, Reverse};
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alarm {
    pub id: u64,
    pub fire_at: DateTime<Local>,
    pub text: String,
}

/// Delivered on the fire channel when an alarm comes due.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReminderFired {
    pub id: u64,
    pub text: String,
    pub scheduled_for: DateTime<Local>,
    pub fired_at: DateTime<Local>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AlarmError {
    #[error("exact alarms are not permitted")]
    NotPermitted,
    #[error("alarm facility has shut down")]
    Closed,
}

/// One-shot, time-deferred delivery of a reminder payload.
pub trait AlarmScheduler: Send + Sync {
    fn can_schedule_exact(&self) -> bool;
    fn schedule(&self, alarm: Alarm) -> Result<(), AlarmError>;
}

enum TimerCommand {
    Schedule(Alarm),
    Shutdown,
}

struct Queued(Alarm);

impl PartialEq for Queued {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == CmpOrdering::Equal
    }
}

impl Eq for Queued {}

impl PartialOrd for Queued {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl Ord for Queued {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        (self.0.fire_at, self.0.id).cmp(&(other.0.fire_at, other.0.id))
    }
}

/// Longest single wait, so a clock that jumps forward is noticed promptly.
const MAX_WAIT: Duration = Duration::from_millis(250);

/// Background thread holding pending alarms in deadline order.
///
/// Deadlines are measured against the same [`Clock`] that stamps `fire_at`.
///
/// Dropping every handle lets already-queued alarms still fire before the
/// thread exits; [`TimerThread::shutdown`] discards them instead.
pub struct TimerThread {
    commands: Sender<TimerCommand>,
    exact_allowed: Arc<AtomicBool>,
    pending: Arc<AtomicUsize>,
    handle: Option<thread::JoinHandle<()>>,
}

impl TimerThread {
    pub fn spawn(exact_allowed: bool, clock: Arc<dyn Clock>) -> (Self, Receiver<ReminderFired>) {
        let (command_tx, command_rx) = unbounded();
        let (fired_tx, fired_rx) = unbounded();
        let pending = Arc::new(AtomicUsize::new(0));
        let worker_pending = Arc::clone(&pending);
        let handle = thread::Builder::new()
            .name("jarvis-timer".to_string())
            .spawn(move || run_timer(command_rx, fired_tx, worker_pending, clock.as_ref()))
            .ok();
        if handle.is_none() {
            log_debug("failed to spawn timer thread; reminders will be refused");
        }
        let timer = Self {
            commands: command_tx,
            exact_allowed: Arc::new(AtomicBool::new(exact_allowed)),
            pending,
            handle,
        };
        (timer, fired_rx)
    }

    /// Toggle the exact-alarm grant (the platform permission analogue).
    pub fn set_exact_allowed(&self, allowed: bool) {
        self.exact_allowed.store(allowed, Ordering::Relaxed);
    }

    /// Alarms accepted but not yet fired.
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Ask the worker to stop without waiting for it. Queued alarms are dropped.
    pub fn request_shutdown(&self) {
        let _ = self.commands.send(TimerCommand::Shutdown);
    }

    /// Stop the worker and drop anything still queued.
    pub fn shutdown(mut self) {
        self.request_shutdown();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl AlarmScheduler for TimerThread {
    fn can_schedule_exact(&self) -> bool {
        self.exact_allowed.load(Ordering::Relaxed)
    }

    fn schedule(&self, alarm: Alarm) -> Result<(), AlarmError> {
        if !self.can_schedule_exact() {
            return Err(AlarmError::NotPermitted);
        }
        if self.handle.is_none() {
            return Err(AlarmError::Closed);
        }
        self.pending.fetch_add(1, Ordering::SeqCst);
        self.commands
            .send(TimerCommand::Schedule(alarm))
            .map_err(|_| {
                self.pending.fetch_sub(1, Ordering::SeqCst);
                AlarmError::Closed
            })
    }
}

fn until(clock: &dyn Clock, deadline: DateTime<Local>) -> Duration {
    (deadline - clock.now())
        .to_std()
        .unwrap_or(Duration::ZERO)
        .min(MAX_WAIT)
}

fn run_timer(
    commands: Receiver<TimerCommand>,
    fired: Sender<ReminderFired>,
    pending: Arc<AtomicUsize>,
    clock: &dyn Clock,
) {
    let mut queue: BinaryHeap<Reverse<Queued>> = BinaryHeap::new();
    let mut accepting = true;

    loop {
        while queue
            .peek()
            .is_some_and(|Reverse(next)| next.0.fire_at <= clock.now())
        {
            let Some(Reverse(Queued(alarm))) = queue.pop() else {
                break;
            };
            pending.fetch_sub(1, Ordering::SeqCst);
            log_debug_content(&format!("reminder {} fired: {}", alarm.id, alarm.text));
            tracing::info!(id = alarm.id, "reminder fired");
            let event = ReminderFired {
                id: alarm.id,
                text: alarm.text,
                scheduled_for: alarm.fire_at,
                fired_at: clock.now(),
            };
            if fired.send(event).is_err() {
                log_debug("reminder fired with no listener attached");
            }
        }

        let next_deadline = queue.peek().map(|Reverse(next)| next.0.fire_at);
        let command = match (next_deadline, accepting) {
            (Some(deadline), true) => match commands.recv_timeout(until(clock, deadline)) {
                Ok(command) => Some(command),
                Err(RecvTimeoutError::Timeout) => None,
                Err(RecvTimeoutError::Disconnected) => {
                    accepting = false;
                    None
                }
            },
            (Some(deadline), false) => {
                thread::sleep(until(clock, deadline));
                None
            }
            (None, true) => match commands.recv() {
                Ok(command) => Some(command),
                Err(_) => break,
            },
            (None, false) => break,
        };

        match command {
            Some(TimerCommand::Schedule(alarm)) => queue.push(Reverse(Queued(alarm))),
            Some(TimerCommand::Shutdown) => {
                pending.fetch_sub(queue.len(), Ordering::SeqCst);
                break;
            }
            None => {}
        }
    }
    log_debug("timer thread exiting");
}
