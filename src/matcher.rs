//! Decides whether any alarm is due at a given instant.
//!
//! Only the hour and minute of `now` are compared, so every poll that lands
//! inside the alarm's minute reports the same match. Keeping that from
//! re-triggering is the controller's job.

use chrono::Timelike;

use crate::alarm::AlarmRecord;

/// Returns the first alarm in list order whose hour and minute equal `now`'s.
pub fn check_now<'a, T: Timelike>(alarms: &'a [AlarmRecord], now: &T) -> Option<&'a AlarmRecord> {
    let (hour, minute) = (now.hour(), now.minute());
    alarms
        .iter()
        .find(|alarm| alarm.hour == hour && alarm.minute == minute)
}

/// Like [`check_now`] but for a snapshot that may be missing.
pub fn check_snapshot<'a, T: Timelike>(
    alarms: Option<&'a [AlarmRecord]>,
    now: &T,
) -> Option<&'a AlarmRecord> {
    alarms.and_then(|alarms| check_now(alarms, now))
}
