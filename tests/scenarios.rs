//! Trigger, dismissal and cancellation scenarios driven through the public API
//! with a fake sound and simulated times.

use std::{cell::RefCell, rc::Rc};

use alarm_trigger::{
    sound::AlertSound,
    source::{AlarmSource, MemorySource},
    AlarmRecord, AlertController, AlertState, RetriggerPolicy, Transition, Urgency,
};
use chrono::{NaiveDate, NaiveDateTime};

// ============================================================================
// Test Helpers
// ============================================================================

#[derive(Debug, Default)]
struct SoundLog {
    playing: bool,
    sessions: u32,
}

/// Counts playing sessions so stacked starts would show up.
#[derive(Debug, Clone, Default)]
struct FakeSound(Rc<RefCell<SoundLog>>);

impl AlertSound for FakeSound {
    fn start(&mut self) {
        let mut log = self.0.borrow_mut();
        if !log.playing {
            log.sessions += 1;
        }
        log.playing = true;
    }

    fn stop(&mut self) {
        self.0.borrow_mut().playing = false;
    }

    fn is_playing(&self) -> bool {
        self.0.borrow().playing
    }
}

fn at(hour: u32, minute: u32, second: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 10, 19)
        .unwrap()
        .and_hms_opt(hour, minute, second)
        .unwrap()
}

fn wake_up_alarm() -> AlarmRecord {
    AlarmRecord::new(7, 9, 30, Urgency::High)
}

fn ringing(policy: RetriggerPolicy) -> (AlertController<FakeSound>, FakeSound, Vec<AlarmRecord>) {
    let sound = FakeSound::default();
    let mut controller = AlertController::new(sound.clone(), policy);
    let alarms = vec![wake_up_alarm()];
    let transition = controller.poll(Some(&alarms), at(9, 30, 0));
    assert_eq!(
        transition,
        Some(Transition::Triggered {
            alarm_id: 7,
            urgency: Urgency::High
        })
    );
    (controller, sound, alarms)
}

fn assert_consistent<S: AlertSound>(controller: &AlertController<S>) {
    match controller.state() {
        AlertState::Idle => assert!(controller.active_alarm_id().is_none()),
        AlertState::Ringing { alarm_id, .. } => {
            assert_eq!(controller.active_alarm_id(), Some(alarm_id));
        }
    }
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn trigger_rings_with_snapshotted_urgency() {
    let (controller, sound, _) = ringing(RetriggerPolicy::default());
    assert_eq!(
        controller.state(),
        AlertState::Ringing {
            alarm_id: 7,
            urgency: Urgency::High
        }
    );
    assert_eq!(controller.active_alarm_id(), Some(7));
    assert_eq!(controller.urgency(), Some(&Urgency::High));
    assert!(sound.is_playing());
    assert_consistent(&controller);
}

#[test]
fn dismiss_returns_to_idle_and_silences() {
    let (mut controller, sound, _) = ringing(RetriggerPolicy::default());
    assert_eq!(controller.dismiss(), Some(Transition::Dismissed { alarm_id: 7 }));
    assert_eq!(controller.state(), AlertState::Idle);
    assert!(controller.active_alarm_id().is_none());
    assert!(!sound.is_playing());
    assert_consistent(&controller);
}

#[test]
fn deleting_ringing_alarm_cancels_on_next_poll() {
    let (mut controller, sound, _) = ringing(RetriggerPolicy::default());
    let mut source = MemorySource::new(vec![wake_up_alarm(), AlarmRecord::new(8, 10, 0, Urgency::Low)]);
    source.delete_alarm(7).unwrap();
    let remaining = source.list_alarms().unwrap();

    assert_eq!(
        controller.poll(Some(&remaining), at(9, 30, 1)),
        Some(Transition::Cancelled { alarm_id: 7 })
    );
    assert_eq!(controller.state(), AlertState::Idle);
    assert!(!sound.is_playing());
    assert_consistent(&controller);
}

#[test]
fn unavailable_source_does_not_cancel() {
    let (mut controller, sound, _) = ringing(RetriggerPolicy::default());
    let mut source = MemorySource::new(vec![]);
    source.set_unavailable(true);
    let fetched = source.list_alarms().ok();
    assert!(controller.poll(fetched.as_deref(), at(9, 30, 1)).is_none());
    assert!(controller.is_ringing());
    assert!(sound.is_playing());
}

#[test]
fn no_match_stays_idle() {
    let sound = FakeSound::default();
    let mut controller = AlertController::new(sound.clone(), RetriggerPolicy::default());
    let alarms = vec![AlarmRecord::new(1, 9, 30, Urgency::Low)];
    for second in 0..60 {
        assert!(controller.poll(Some(&alarms), at(9, 31, second)).is_none());
        assert_eq!(controller.state(), AlertState::Idle);
        assert_consistent(&controller);
    }
    assert!(!sound.is_playing());
    assert_eq!(sound.0.borrow().sessions, 0);
}

#[test]
fn repeated_polls_give_one_playing_session() {
    let (mut controller, sound, alarms) = ringing(RetriggerPolicy::Immediate);
    // two polls a second for the rest of the minute
    for half_seconds in 1..120 {
        let now = at(9, 30, 0) + chrono::Duration::milliseconds(half_seconds * 500);
        assert!(controller.poll(Some(&alarms), now).is_none());
    }
    assert_eq!(sound.0.borrow().sessions, 1);
    assert!(sound.is_playing());
}

#[test]
fn immediate_policy_rings_again_within_the_minute() {
    let (mut controller, sound, alarms) = ringing(RetriggerPolicy::Immediate);
    controller.dismiss();
    assert!(matches!(
        controller.poll(Some(&alarms), at(9, 30, 20)),
        Some(Transition::Triggered { alarm_id: 7, .. })
    ));
    assert!(sound.is_playing());
    assert_eq!(sound.0.borrow().sessions, 2);
}

#[test]
fn suppress_policy_stays_quiet_for_the_rest_of_the_minute() {
    let (mut controller, sound, alarms) = ringing(RetriggerPolicy::SuppressMinute);
    controller.dismiss();
    for second in 20..60 {
        assert!(controller.poll(Some(&alarms), at(9, 30, second)).is_none());
    }
    assert_eq!(controller.state(), AlertState::Idle);
    assert!(!sound.is_playing());
    assert!(controller.poll(Some(&alarms), at(9, 31, 0)).is_none());
}

#[test]
fn rings_again_on_a_later_day() {
    let (mut controller, _, alarms) = ringing(RetriggerPolicy::SuppressMinute);
    controller.dismiss();
    let next_day = at(9, 30, 0) + chrono::Duration::days(1);
    assert!(controller.poll(Some(&alarms), next_day).is_some());
}

#[test]
fn duplicate_times_ring_the_first_alarm() {
    let sound = FakeSound::default();
    let mut controller = AlertController::new(sound, RetriggerPolicy::default());
    let alarms = vec![
        AlarmRecord::new(3, 9, 30, Urgency::Medium),
        wake_up_alarm(),
    ];
    controller.poll(Some(&alarms), at(9, 30, 0));
    assert_eq!(controller.active_alarm_id(), Some(3));
    assert_eq!(controller.urgency(), Some(&Urgency::Medium));
}
