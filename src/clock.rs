//! The control loop.
//!
//! Everything runs on the thread that calls [`Clock::run`]: poll ticks,
//! refresh ticks and [`Command`]s arrive over channels and are handled one at
//! a time, so a trigger and a dismissal never overlap. The sound lives on this
//! thread too, and is released when the clock is dropped.

use std::ops::ControlFlow;

use chrono::NaiveDateTime;
use crossbeam_channel::{select, unbounded, Receiver, Sender};
use log::{debug, info};

use crate::{
    alarm::{AlarmId, Urgency},
    challenge::{Challenge, KeySequence},
    communication::{ClockHandle, Command},
    config::Config,
    controller::{AlertController, AlertState, Transition},
    sound::AlertSound,
    source::{AlarmFeed, AlarmSource},
};

pub type ChallengeFactory = fn(AlarmId, &Urgency) -> Box<dyn Challenge>;

fn key_sequence(alarm_id: AlarmId, urgency: &Urgency) -> Box<dyn Challenge> {
    Box::new(KeySequence::new(alarm_id, urgency))
}

/// What the user gets to see. The clock never renders anything itself.
pub trait Screen {
    fn transition(&mut self, transition: &Transition);
    fn challenge(&mut self, challenge: &dyn Challenge);
    /// the alarm list couldn't be fetched, alarms won't ring until it can
    fn source_failed(&mut self, reason: &str);
    fn source_recovered(&mut self) {}
}

/// Prints to stdout.
#[derive(Debug, Default)]
pub struct TerminalScreen;

impl Screen for TerminalScreen {
    fn transition(&mut self, transition: &Transition) {
        match transition {
            Transition::Triggered { alarm_id, urgency } => {
                println!("\x07alarm {alarm_id} is ringing! (difficulty: {urgency})");
            }
            Transition::Dismissed { alarm_id } => println!("alarm {alarm_id} dismissed"),
            Transition::Cancelled { alarm_id } => println!("alarm {alarm_id} stopped"),
        }
    }

    fn challenge(&mut self, challenge: &dyn Challenge) {
        println!("{}", challenge.prompt());
    }

    fn source_failed(&mut self, reason: &str) {
        eprintln!("couldn't load alarms: {reason}");
    }

    fn source_recovered(&mut self) {
        eprintln!("alarms loaded again");
    }
}

pub struct Clock<Src: AlarmSource, Snd: AlertSound, Scr: Screen> {
    config: Config,
    source: Src,
    feed: AlarmFeed,
    controller: AlertController<Snd>,
    challenge: Option<Box<dyn Challenge>>,
    make_challenge: ChallengeFactory,
    screen: Scr,
    inbox: Receiver<Command>,
    sender: Sender<Command>,
}

impl<Src, Snd, Scr> std::fmt::Debug for Clock<Src, Snd, Scr>
where
    Src: AlarmSource,
    Snd: AlertSound,
    Scr: Screen,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Clock")
            .field("config", &self.config)
            .field("feed", &self.feed)
            .field("state", &self.controller.state())
            .finish_non_exhaustive()
    }
}

impl<Src: AlarmSource, Snd: AlertSound, Scr: Screen> Clock<Src, Snd, Scr> {
    #[must_use]
    pub fn new(config: Config, source: Src, sound: Snd, screen: Scr) -> Self {
        let (sender, inbox) = unbounded();
        Self {
            controller: AlertController::new(sound, config.retrigger),
            config,
            source,
            feed: AlarmFeed::Pending,
            challenge: None,
            make_challenge: key_sequence,
            screen,
            inbox,
            sender,
        }
    }

    /// Swap out the dismissal challenge used for new sessions.
    #[must_use]
    pub fn with_challenge(mut self, make_challenge: ChallengeFactory) -> Self {
        self.make_challenge = make_challenge;
        self
    }

    #[must_use]
    pub fn handle(&self) -> ClockHandle {
        ClockHandle::new(self.sender.clone())
    }

    #[must_use]
    pub fn state(&self) -> AlertState {
        self.controller.state()
    }

    #[must_use]
    pub const fn feed(&self) -> &AlarmFeed {
        &self.feed
    }

    #[must_use]
    pub const fn controller(&self) -> &AlertController<Snd> {
        &self.controller
    }

    #[must_use]
    pub fn challenge(&self) -> Option<&dyn Challenge> {
        self.challenge.as_deref()
    }

    pub fn source_mut(&mut self) -> &mut Src {
        &mut self.source
    }

    pub fn screen_mut(&mut self) -> &mut Scr {
        &mut self.screen
    }

    /// Fetches the alarm list again.
    pub fn refresh(&mut self) {
        let was_failed = matches!(self.feed, AlarmFeed::Failed(_));
        self.feed.refresh(&mut self.source, self.config.fetch_retries);
        match &self.feed {
            AlarmFeed::Failed(reason) if !was_failed => self.screen.source_failed(reason),
            AlarmFeed::Ready(_) if was_failed => self.screen.source_recovered(),
            _ => {}
        }
    }

    /// One poll cycle at `now`.
    pub fn poll(&mut self, now: NaiveDateTime) -> Option<Transition> {
        let transition = self.controller.poll(self.feed.alarms(), now)?;
        self.apply(&transition);
        Some(transition)
    }

    /// The dismissal challenge was completed.
    pub fn dismiss(&mut self) -> Option<Transition> {
        let transition = self.controller.dismiss()?;
        self.apply(&transition);
        Some(transition)
    }

    fn answer(&mut self, answer: &str) -> Option<Transition> {
        let Some(challenge) = self.challenge.as_mut() else {
            debug!("ignoring answer {answer:?}, nothing is ringing");
            return None;
        };
        if challenge.submit(answer) {
            return self.dismiss();
        }
        self.screen.challenge(challenge.as_ref());
        None
    }

    fn apply(&mut self, transition: &Transition) {
        self.screen.transition(transition);
        match transition {
            Transition::Triggered { alarm_id, urgency } => {
                let challenge = (self.make_challenge)(*alarm_id, urgency);
                self.screen.challenge(challenge.as_ref());
                self.challenge = Some(challenge);
            }
            Transition::Dismissed { .. } | Transition::Cancelled { .. } => {
                self.challenge = None;
            }
        }
    }

    pub fn handle_command(&mut self, command: Command) -> ControlFlow<()> {
        match command {
            Command::Answer(answer) => {
                self.answer(&answer);
            }
            Command::Dismiss => {
                self.dismiss();
            }
            Command::Shutdown => return ControlFlow::Break(()),
        }
        ControlFlow::Continue(())
    }

    /// Handles every command already waiting in the inbox, stopping early on
    /// [`Command::Shutdown`].
    pub fn process_pending(&mut self) -> ControlFlow<()> {
        while let Ok(command) = self.inbox.try_recv() {
            if self.handle_command(command).is_break() {
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    /// Stops a ringing alarm without dismissing it.
    pub fn shutdown(&mut self) {
        if let Some(transition) = self.controller.cancel() {
            self.apply(&transition);
        }
    }

    /// Runs until a [`Command::Shutdown`] arrives.
    pub fn run(mut self) {
        let poll = crossbeam_channel::tick(self.config.poll_interval());
        let refresh = crossbeam_channel::tick(self.config.refresh_interval());
        let inbox = self.inbox.clone();
        info!(
            "clock running, polling every {:?}, refreshing alarms every {:?}",
            self.config.poll_interval(),
            self.config.refresh_interval()
        );
        self.refresh();
        loop {
            select! {
                recv(poll) -> _ => {
                    self.poll(chrono::Local::now().naive_local());
                }
                recv(refresh) -> _ => self.refresh(),
                // the clock holds a sender itself, so the inbox never disconnects
                recv(inbox) -> command => if let Ok(command) = command {
                    if self.handle_command(command).is_break() {
                        break;
                    }
                },
            }
        }
        info!("clock shutting down");
        self.shutdown();
    }
}
