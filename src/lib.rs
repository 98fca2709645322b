#![warn(clippy::pedantic, clippy::nursery, clippy::cargo)]
#![deny(clippy::use_self, rust_2018_idioms)]
#![allow(clippy::multiple_crate_versions, clippy::module_name_repetitions)]

//! An alarm clock engine: polls the wall clock against a list of alarms, rings
//! when one is due and keeps ringing until a dismissal challenge is solved.

pub mod alarm;
pub mod challenge;
pub mod clock;
pub mod communication;
pub mod config;
pub mod controller;
pub mod error;
pub mod matcher;
pub mod sound;
pub mod source;

pub use alarm::{AlarmId, AlarmRecord, Urgency};
pub use clock::{Clock, Screen, TerminalScreen};
pub use controller::{AlertController, AlertState, RetriggerPolicy, Transition};
pub use error::{Error, Result};
