//! Wall-clock access.
//!
//! The calculator needs the local UTC offset and the scheduler needs "now";
//! both come from a [`Clock`] so they are always read from the same source.
//! A mismatch between the two produces sunset times that look right but are
//! shifted by the difference.

use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveTime, Offset, TimeZone};

pub trait Clock {
    /// Current instant, carrying the offset in force right now.
    fn now(&self) -> DateTime<FixedOffset>;

    /// Offset of the local zone at midnight on `date`.
    fn offset_on(&self, date: NaiveDate) -> FixedOffset;

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// The host's clock and time zone.
///
/// The offset used for a reference date is the one in force at that date's
/// local midnight. A daylight saving change between midnight and sunset on the
/// reference date is not accounted for.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }

    fn offset_on(&self, date: NaiveDate) -> FixedOffset {
        // Midnight can be skipped by a DST jump in some zones; fall back to
        // the current offset rather than failing.
        Local
            .from_local_datetime(&date.and_time(NaiveTime::MIN))
            .earliest()
            .map(|midnight| midnight.offset().fix())
            .unwrap_or_else(|| Local::now().offset().fix())
    }
}

/// A clock frozen at one instant, used by tests and `--times --date`.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    now: DateTime<FixedOffset>,
}

impl FixedClock {
    pub fn new(now: DateTime<FixedOffset>) -> Self {
        Self { now }
    }

    pub fn set(&mut self, now: DateTime<FixedOffset>) {
        self.now = now;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.now
    }

    fn offset_on(&self, _date: NaiveDate) -> FixedOffset {
        *self.now.offset()
    }
}
