use std::io::BufRead;

use crossbeam_channel::Sender;
use log::{debug, info, warn};

/// Messages the [`Clock`](crate::clock::Clock) loop accepts from the outside.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// a line the user typed, fed to the dismissal challenge
    Answer(String),
    /// the dismissal challenge was completed somewhere else
    Dismiss,
    Shutdown,
}

/// Cheap to clone, can be handed to other threads.
#[derive(Debug, Clone)]
pub struct ClockHandle {
    sender: Sender<Command>,
}

impl ClockHandle {
    #[must_use]
    pub const fn new(sender: Sender<Command>) -> Self {
        Self { sender }
    }

    /// Returns false once the loop has gone away.
    pub fn send(&self, command: Command) -> bool {
        match self.sender.send(command) {
            Ok(()) => true,
            Err(e) => {
                debug!("clock is gone, dropped {:?}", e.into_inner());
                false
            }
        }
    }

    pub fn answer(&self, answer: impl Into<String>) -> bool {
        self.send(Command::Answer(answer.into()))
    }

    pub fn dismiss(&self) -> bool {
        self.send(Command::Dismiss)
    }

    pub fn shutdown(&self) -> bool {
        self.send(Command::Shutdown)
    }
}

/// Sends every line of `reader` to the clock as an answer.
///
/// Returns when the input ends or the clock has gone away. The clock is left
/// running either way, so an alarm can still be dismissed through the handle.
pub fn forward_answers<R: BufRead>(reader: R, handle: &ClockHandle) {
    for line in reader.lines() {
        match line {
            Ok(line) => {
                if !handle.answer(line) {
                    return;
                }
            }
            Err(e) => {
                warn!("couldn't read answers: {e}");
                return;
            }
        }
    }
    info!("no more answers to read");
}
