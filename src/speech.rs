//! Text-to-speech output.
//!
//! Speech recognition is external; this side only voices replies. The default
//! [`CommandSpeaker`] runs a system TTS command (`espeak`, `say`, ...) with the
//! reply as its final argument, one utterance at a time on a worker thread.

use crate::log_debug;
use anyhow::{bail, Result};
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::collections::VecDeque;
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;

const CHILD_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// How a new utterance relates to speech already in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeakMode {
    /// Cut off whatever is playing and drop the queue.
    Flush,
    /// Play after everything already queued.
    Queue,
}

pub trait Speaker: Send + Sync {
    fn speak(&self, text: &str, mode: SpeakMode) -> Result<()>;
}

/// Discards everything. Used when no TTS command is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSpeaker;

impl Speaker for NullSpeaker {
    fn speak(&self, _text: &str, _mode: SpeakMode) -> Result<()> {
        Ok(())
    }
}

struct SpeechJob {
    text: String,
    mode: SpeakMode,
}

pub struct CommandSpeaker {
    jobs: Option<Sender<SpeechJob>>,
    worker: Option<JoinHandle<()>>,
}

impl CommandSpeaker {
    /// `command` is split on whitespace; the first word is the program.
    pub fn new(command: &str) -> Result<Self> {
        let mut words = command.split_whitespace().map(str::to_string);
        let Some(program) = words.next() else {
            bail!("TTS command is empty");
        };
        let args: Vec<String> = words.collect();
        let (jobs, rx) = unbounded();
        let worker = thread::Builder::new()
            .name("jarvis-tts".to_string())
            .spawn(move || run_speech_worker(&program, &args, rx))?;
        Ok(Self {
            jobs: Some(jobs),
            worker: Some(worker),
        })
    }
}

impl Speaker for CommandSpeaker {
    fn speak(&self, text: &str, mode: SpeakMode) -> Result<()> {
        if text.trim().is_empty() {
            bail!("cannot speak empty text");
        }
        let Some(jobs) = &self.jobs else {
            bail!("speech worker is shut down");
        };
        if jobs
            .send(SpeechJob {
                text: text.to_string(),
                mode,
            })
            .is_err()
        {
            bail!("speech worker exited");
        }
        Ok(())
    }
}

impl Drop for CommandSpeaker {
    fn drop(&mut self) {
        // Closing the channel lets the worker finish the current utterance and exit.
        self.jobs.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn run_speech_worker(program: &str, args: &[String], jobs: Receiver<SpeechJob>) {
    let mut queue: VecDeque<String> = VecDeque::new();
    let mut current: Option<Child> = None;
    let mut open = true;

    loop {
        let idle = current.is_none() && queue.is_empty();
        if idle && !open {
            return;
        }
        if open {
            let next = if idle {
                jobs.recv().map_err(|_| RecvTimeoutError::Disconnected)
            } else {
                jobs.recv_timeout(CHILD_POLL_INTERVAL)
            };
            match next {
                Ok(job) => accept_job(job, &mut queue, &mut current),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => open = false,
            }
            loop {
                match jobs.try_recv() {
                    Ok(job) => accept_job(job, &mut queue, &mut current),
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        open = false;
                        break;
                    }
                }
            }
        } else if current.is_some() {
            thread::sleep(CHILD_POLL_INTERVAL);
        }

        if let Some(child) = current.as_mut() {
            match child.try_wait() {
                Ok(Some(_)) | Err(_) => current = None,
                Ok(None) => continue,
            }
        }
        if let Some(text) = queue.pop_front() {
            match Command::new(program)
                .args(args)
                .arg(&text)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .spawn()
            {
                Ok(child) => current = Some(child),
                Err(err) => log_debug(&format!("failed to spawn TTS command {program}: {err}")),
            }
        }
    }
}

fn accept_job(job: SpeechJob, queue: &mut VecDeque<String>, current: &mut Option<Child>) {
    if job.mode == SpeakMode::Flush {
        queue.clear();
        if let Some(mut child) = current.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
    queue.push_back(job.text);
}
