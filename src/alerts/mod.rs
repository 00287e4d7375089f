//! Armed alert bookkeeping.
//!
//! [`AlertScheduler`] owns the set of alerts the application currently intends
//! to deliver. It holds at most one alert per [`AlertKind`], and every planning
//! cycle cancels everything before arming again, so repeated or overlapping
//! refreshes can never leave a duplicate or a stale alert behind.
//!
//! The scheduler does not deliver anything itself. [`AlertScheduler::plan`]
//! returns the alerts it armed and the caller hands them to an
//! [`delivery::AlertSink`].

pub mod delivery;
pub mod snapshot;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use crate::geo::{ShabbatTimes, format_clock_time};

/// Which reminder an alert represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    OneHourBefore,
    CandleLighting,
}

impl AlertKind {
    pub const ALL: [AlertKind; 2] = [AlertKind::OneHourBefore, AlertKind::CandleLighting];

    /// The instant in `times` this kind of alert fires at.
    pub fn instant_in(self, times: &ShabbatTimes) -> DateTime<FixedOffset> {
        match self {
            AlertKind::OneHourBefore => times.one_hour_before(),
            AlertKind::CandleLighting => times.candle_lighting(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AlertKind::OneHourBefore => "one hour before",
            AlertKind::CandleLighting => "candle lighting",
        }
    }
}

/// Opaque handle identifying one arming of an alert.
///
/// Ids are never reused within a scheduler, so a re-armed alert for the same
/// kind and instant still gets a new id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AlertId(u64);

impl std::fmt::Display for AlertId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Human-readable text shown when the alert fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertPayload {
    pub title: String,
    pub body: String,
}

impl AlertPayload {
    /// Both reminders quote the candle lighting time, not their own.
    fn for_kind(kind: AlertKind, times: &ShabbatTimes) -> Self {
        let candle_lighting = format_clock_time(&times.candle_lighting());
        match kind {
            AlertKind::OneHourBefore => Self {
                title: "🕯️ Shabbat in one hour".to_string(),
                body: format!("Candle lighting is at {}", candle_lighting),
            },
            AlertKind::CandleLighting => Self {
                title: "🕯️ Shabbat Shalom".to_string(),
                body: format!(
                    "Candle lighting now ({}), sunset at {}",
                    candle_lighting,
                    format_clock_time(&times.sunset())
                ),
            },
        }
    }
}

/// An alert the scheduler currently intends to deliver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArmedAlert {
    pub id: AlertId,
    pub kind: AlertKind,
    pub fires_at: DateTime<FixedOffset>,
    pub payload: AlertPayload,
}

#[derive(Debug, Default)]
struct ArmedSet {
    armed: BTreeMap<AlertKind, ArmedAlert>,
    next_id: u64,
}

impl ArmedSet {
    fn clear(&mut self) -> usize {
        let cleared = self.armed.len();
        self.armed.clear();
        cleared
    }

    fn arm(&mut self, kind: AlertKind, times: &ShabbatTimes) -> ArmedAlert {
        self.next_id += 1;
        let alert = ArmedAlert {
            id: AlertId(self.next_id),
            kind,
            fires_at: kind.instant_in(times),
            payload: AlertPayload::for_kind(kind, times),
        };
        self.armed.insert(kind, alert.clone());
        alert
    }
}

/// Owner of the armed alert set.
///
/// Lifecycle is `new` → `plan`/`cancel_all`/`currently_armed` → `dispose`.
/// All operations take `&self` and run inside one mutex, so a scheduler can
/// be shared between threads; `plan` cancels and re-arms in a single critical
/// section.
#[derive(Debug, Default)]
pub struct AlertScheduler {
    state: Mutex<ArmedSet>,
}

impl AlertScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    // Every mutation leaves the set consistent, so a poisoned lock is safe to reuse.
    fn lock(&self) -> MutexGuard<'_, ArmedSet> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Cancel everything, then arm each alert whose instant is after `now`.
    ///
    /// # Arguments
    /// * `times` - Freshly computed times for the reference date
    /// * `now` - Current instant; alerts at or before it are skipped
    ///
    /// # Returns
    /// The newly armed alerts, ordered by kind. An empty list means every
    /// instant has already passed this week, which is a normal outcome: the
    /// next refresh on a planning day computes the following week.
    pub fn plan(&self, times: &ShabbatTimes, now: DateTime<FixedOffset>) -> Vec<ArmedAlert> {
        let mut state = self.lock();
        state.clear();

        AlertKind::ALL
            .into_iter()
            .filter(|kind| kind.instant_in(times) > now)
            .map(|kind| state.arm(kind, times))
            .collect()
    }

    /// Disarm every alert. Returns how many were armed.
    pub fn cancel_all(&self) -> usize {
        self.lock().clear()
    }

    /// Snapshot of the armed set, ordered by kind.
    pub fn currently_armed(&self) -> Vec<ArmedAlert> {
        self.lock().armed.values().cloned().collect()
    }

    /// Whether `plan(times, now)` would arm a different set than the one armed now.
    ///
    /// Compares kinds and instants only, so callers can skip a cancel/re-arm
    /// cycle when nothing changed.
    pub fn needs_replan(&self, times: &ShabbatTimes, now: DateTime<FixedOffset>) -> bool {
        let state = self.lock();
        let wanted: Vec<(AlertKind, DateTime<FixedOffset>)> = AlertKind::ALL
            .into_iter()
            .map(|kind| (kind, kind.instant_in(times)))
            .filter(|(_, instant)| *instant > now)
            .collect();
        let armed: Vec<(AlertKind, DateTime<FixedOffset>)> = state
            .armed
            .values()
            .map(|alert| (alert.kind, alert.fires_at))
            .collect();
        wanted != armed
    }

    /// End the scheduler's lifecycle, returning whatever was still armed.
    pub fn dispose(self) -> Vec<ArmedAlert> {
        let state = self
            .state
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        state.armed.into_values().collect()
    }
}
