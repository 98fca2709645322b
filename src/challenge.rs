//! # Dismissal challenge
//! The ringing alarm is only stopped once the user solves a challenge. The
//! engine only cares about the [`Challenge`] trait; [`KeySequence`] is the one
//! used by the terminal front end.

use std::fmt;

use rand::{seq::SliceRandom, Rng};

use crate::alarm::{AlarmId, Urgency};

pub trait Challenge {
    /// what to show the user right now
    fn prompt(&self) -> String;
    /// feeds one answer to the challenge, returns true once it is solved
    fn submit(&mut self, answer: &str) -> bool;
    fn is_solved(&self) -> bool;
}

/// The keys the user has to type, one at a time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Green,
    Blue,
    Yellow,
    Red,
}

impl Key {
    const ALL: [Self; 4] = [Self::Green, Self::Blue, Self::Yellow, Self::Red];

    const fn name(self) -> &'static str {
        match self {
            Self::Green => "green",
            Self::Blue => "blue",
            Self::Yellow => "yellow",
            Self::Red => "red",
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Number of keys to type for a given urgency.
#[must_use]
pub const fn sequence_length(urgency: &Urgency) -> usize {
    match urgency {
        Urgency::Low => 3,
        Urgency::Medium | Urgency::Other(_) => 5,
        Urgency::High => 8,
    }
}

/// Type the shown keys in order. A correct key is crossed off the front of the
/// sequence, a wrong one shuffles whatever is left.
#[derive(Debug, Clone)]
pub struct KeySequence {
    alarm_id: AlarmId,
    remaining: Vec<Key>,
}

impl KeySequence {
    #[must_use]
    pub fn new(alarm_id: AlarmId, urgency: &Urgency) -> Self {
        Self::with_rng(alarm_id, urgency, &mut rand::thread_rng())
    }

    pub fn with_rng<R: Rng + ?Sized>(alarm_id: AlarmId, urgency: &Urgency, rng: &mut R) -> Self {
        let remaining = (0..sequence_length(urgency))
            .map(|_| Key::ALL[rng.gen_range(0..Key::ALL.len())])
            .collect();
        Self {
            alarm_id,
            remaining,
        }
    }

    #[must_use]
    pub const fn alarm_id(&self) -> AlarmId {
        self.alarm_id
    }

    #[must_use]
    pub fn remaining(&self) -> &[Key] {
        &self.remaining
    }

    fn submit_with_rng<R: Rng + ?Sized>(&mut self, answer: &str, rng: &mut R) -> bool {
        let Some(next) = self.remaining.first() else {
            return true;
        };
        if answer.trim().eq_ignore_ascii_case(next.name()) {
            self.remaining.remove(0);
        } else {
            self.remaining.shuffle(rng);
        }
        self.is_solved()
    }
}

impl Challenge for KeySequence {
    fn prompt(&self) -> String {
        let keys = self
            .remaining
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ");
        format!("alarm {}: type the keys in order: {keys}", self.alarm_id)
    }

    fn submit(&mut self, answer: &str) -> bool {
        self.submit_with_rng(answer, &mut rand::thread_rng())
    }

    fn is_solved(&self) -> bool {
        self.remaining.is_empty()
    }
}
