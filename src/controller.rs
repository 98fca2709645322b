//! Ringing/idle state machine.
//!
//! ```text
//!            poll: match while idle
//!   Idle ─────────────────────────────► Ringing
//!    ▲                                    │
//!    │  dismiss() / active alarm deleted  │
//!    └────────────────────────────────────┘
//! ```
//!
//! The sound follows the state: it is started on the way into `Ringing` and
//! stopped on the way out, and nowhere else.

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use log::{info, trace};
use serde::{Deserialize, Serialize};

use crate::{
    alarm::{AlarmId, AlarmRecord, Urgency},
    matcher,
    sound::AlertSound,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlertState {
    Idle,
    Ringing { alarm_id: AlarmId, urgency: Urgency },
}

impl AlertState {
    #[must_use]
    pub const fn is_ringing(&self) -> bool {
        matches!(self, Self::Ringing { .. })
    }
}

/// What a call to [`AlertController::poll`] or [`AlertController::dismiss`] changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Triggered { alarm_id: AlarmId, urgency: Urgency },
    Dismissed { alarm_id: AlarmId },
    /// the ringing alarm went away (deleted, or the engine is shutting down)
    Cancelled { alarm_id: AlarmId },
}

/// What to do when an alarm is dismissed while its minute is still running
/// and the next poll matches it again.
#[derive(Debug, Serialize, Deserialize, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum RetriggerPolicy {
    /// ring again straight away
    Immediate,
    /// leave the dismissed alarm quiet until the minute is over
    #[default]
    SuppressMinute,
}

type Minute = (NaiveDate, u32, u32);

fn minute_of(now: &NaiveDateTime) -> Minute {
    (now.date(), now.hour(), now.minute())
}

#[derive(Debug)]
struct Session {
    alarm_id: AlarmId,
    // copied at trigger time so edits to the alarm list can't change it
    urgency: Urgency,
    triggered_in: Minute,
}

#[derive(Debug)]
pub struct AlertController<S: AlertSound> {
    session: Option<Session>,
    sound: S,
    policy: RetriggerPolicy,
    // the alarm dismissed last and the minute it rang in
    quiet: Option<(Minute, AlarmId)>,
}

impl<S: AlertSound> AlertController<S> {
    #[must_use]
    pub fn new(sound: S, policy: RetriggerPolicy) -> Self {
        Self {
            session: None,
            sound,
            policy,
            quiet: None,
        }
    }

    #[must_use]
    pub fn state(&self) -> AlertState {
        match &self.session {
            Some(session) => AlertState::Ringing {
                alarm_id: session.alarm_id,
                urgency: session.urgency.clone(),
            },
            None => AlertState::Idle,
        }
    }

    #[must_use]
    pub const fn is_ringing(&self) -> bool {
        self.session.is_some()
    }

    #[must_use]
    pub fn active_alarm_id(&self) -> Option<AlarmId> {
        self.session.as_ref().map(|session| session.alarm_id)
    }

    /// the difficulty the dismissal challenge should use
    #[must_use]
    pub fn urgency(&self) -> Option<&Urgency> {
        self.session.as_ref().map(|session| &session.urgency)
    }

    #[must_use]
    pub fn is_audio_playing(&self) -> bool {
        self.sound.is_playing()
    }

    #[must_use]
    pub const fn policy(&self) -> RetriggerPolicy {
        self.policy
    }

    /// One poll cycle.
    ///
    /// `alarms` is `None` when the latest fetch failed or hasn't finished yet.
    /// In that case nothing matches and a ringing alarm keeps ringing, since we
    /// can't tell whether it was deleted.
    pub fn poll(
        &mut self,
        alarms: Option<&[AlarmRecord]>,
        now: NaiveDateTime,
    ) -> Option<Transition> {
        if let Some(session) = &self.session {
            let alarms = alarms?;
            if alarms.iter().any(|alarm| alarm.alarm_id == session.alarm_id) {
                return None;
            }
            info!("alarm {} was removed while ringing", session.alarm_id);
            return self.cancel();
        }

        let alarm = matcher::check_snapshot(alarms, &now)?;
        if self.quiet == Some((minute_of(&now), alarm.alarm_id)) {
            trace!("alarm {} matches but was dismissed this minute", alarm.alarm_id);
            return None;
        }
        self.quiet = None;
        Some(self.trigger(alarm, &now))
    }

    fn trigger(&mut self, alarm: &AlarmRecord, now: &NaiveDateTime) -> Transition {
        info!(
            "alarm {} triggered at {} with difficulty {}",
            alarm.alarm_id,
            now.format("%H:%M:%S"),
            alarm.difficulty
        );
        self.session = Some(Session {
            alarm_id: alarm.alarm_id,
            urgency: alarm.difficulty.clone(),
            triggered_in: minute_of(now),
        });
        self.sound.start();
        Transition::Triggered {
            alarm_id: alarm.alarm_id,
            urgency: alarm.difficulty.clone(),
        }
    }

    /// Called when the dismissal challenge is solved. Does nothing while idle.
    pub fn dismiss(&mut self) -> Option<Transition> {
        let session = self.session.take()?;
        self.sound.stop();
        if self.policy == RetriggerPolicy::SuppressMinute {
            self.quiet = Some((session.triggered_in, session.alarm_id));
        }
        info!("alarm {} dismissed", session.alarm_id);
        Some(Transition::Dismissed {
            alarm_id: session.alarm_id,
        })
    }

    /// Ends the current session without a dismissal.
    pub fn cancel(&mut self) -> Option<Transition> {
        let session = self.session.take()?;
        self.sound.stop();
        info!("alarm {} cancelled", session.alarm_id);
        Some(Transition::Cancelled {
            alarm_id: session.alarm_id,
        })
    }
}

impl<S: AlertSound> Drop for AlertController<S> {
    fn drop(&mut self) {
        if self.session.is_some() {
            self.sound.stop();
        }
    }
}
