//! Re-planning policy.
//!
//! A [`Planner`] ties the pieces together for one refresh: read the clock,
//! resolve the location, compute times for the upcoming Friday, re-plan the
//! scheduler and hand the armed alerts to the delivery sink.
//!
//! Periodic refreshes only do work on Thursday and Friday. Any other day the
//! previously armed alerts are still correct, so the location lookup and the
//! re-plan are skipped. Startup and manual refreshes always run.

use anyhow::{Context, Result};
use chrono::{Datelike, Weekday};

use crate::alerts::delivery::AlertSink;
use crate::alerts::{AlertScheduler, ArmedAlert};
use crate::clock::Clock;
use crate::constants::SLEEP_DETECTION_THRESHOLD_SECS;
use crate::geo::{
    CoordinateProvider, ShabbatTimes, SolarError, SolarTimeCalculator, format_clock_time,
    next_friday,
};
use crate::logger::Log;

/// What caused a refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Startup,
    Manual,
    Periodic,
}

/// Whether periodic refreshes do any work on `weekday`.
pub fn should_plan_on(weekday: Weekday) -> bool {
    matches!(weekday, Weekday::Thu | Weekday::Fri)
}

/// Which refresh, if any, the daemon loop should run after a tick.
///
/// `wall_elapsed` is the wall-clock time since the previous tick and may be
/// negative when the clock is set back. A jump past the sleep threshold in
/// either direction means a resume or a clock change and forces a re-plan.
/// Otherwise a periodic refresh runs once `since_refresh` reaches
/// `check_interval`.
pub fn trigger_for_tick(
    wall_elapsed: chrono::Duration,
    since_refresh: std::time::Duration,
    check_interval: std::time::Duration,
) -> Option<Trigger> {
    if wall_elapsed.num_seconds().unsigned_abs() > SLEEP_DETECTION_THRESHOLD_SECS {
        Some(Trigger::Manual)
    } else if since_refresh >= check_interval {
        Some(Trigger::Periodic)
    } else {
        None
    }
}

/// Result of a single refresh.
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    /// Periodic trigger on a day that does not need planning.
    Skipped { weekday: Weekday },
    /// No coordinate fix, not even a remembered one.
    LocationUnavailable,
    /// The location/date pair has no sunset. Already-armed alerts are left alone.
    CalculationFailed(SolarError),
    Planned {
        times: ShabbatTimes,
        alerts: Vec<ArmedAlert>,
    },
    /// Every instant for this week is already behind us.
    NothingLeft { times: ShabbatTimes },
}

impl RefreshOutcome {
    pub fn is_planned(&self) -> bool {
        matches!(self, RefreshOutcome::Planned { .. })
    }
}

/// Owns the scheduler and the collaborators a refresh needs.
pub struct Planner<P, C> {
    provider: P,
    clock: C,
    calculator: SolarTimeCalculator,
    scheduler: AlertScheduler,
}

impl<P: CoordinateProvider, C: Clock> Planner<P, C> {
    pub fn new(provider: P, clock: C, calculator: SolarTimeCalculator) -> Self {
        Self {
            provider,
            clock,
            calculator,
            scheduler: AlertScheduler::new(),
        }
    }

    pub fn scheduler(&self) -> &AlertScheduler {
        &self.scheduler
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    pub fn provider_mut(&mut self) -> &mut P {
        &mut self.provider
    }

    /// Replace the calculator after a config reload.
    pub fn set_calculator(&mut self, calculator: SolarTimeCalculator) {
        self.calculator = calculator;
    }

    /// Run one refresh.
    ///
    /// Only sink failures are returned as errors. Every other outcome,
    /// including a failed calculation, is a value for the caller to report.
    pub fn refresh(
        &mut self,
        trigger: Trigger,
        sink: &mut dyn AlertSink,
    ) -> Result<RefreshOutcome> {
        let now = self.clock.now();
        let today = now.date_naive();

        if trigger == Trigger::Periodic && !should_plan_on(today.weekday()) {
            Log::log_debug(&format!(
                "Periodic refresh skipped on {}",
                today.weekday()
            ));
            return Ok(RefreshOutcome::Skipped {
                weekday: today.weekday(),
            });
        }

        let Some(coordinate) = self.provider.current() else {
            Log::log_warning("Location unavailable, alerts were not planned");
            return Ok(RefreshOutcome::LocationUnavailable);
        };

        let reference_date = next_friday(today);
        let utc_offset = self.clock.offset_on(reference_date);

        let times = match self
            .calculator
            .shabbat_times(reference_date, coordinate, utc_offset)
        {
            Ok(times) => times,
            Err(e) => {
                Log::log_warning(&format!("Cannot compute candle lighting: {}", e));
                return Ok(RefreshOutcome::CalculationFailed(e));
            }
        };

        let alerts = self.scheduler.plan(&times, now);

        if let Err(e) = deliver(sink, &alerts) {
            // The sink may hold only part of the plan; disarm so both sides agree
            self.scheduler.cancel_all();
            return Err(e);
        }

        log_times(trigger, &times);

        if alerts.is_empty() {
            Log::log_indented("All alerts for this week have passed");
            return Ok(RefreshOutcome::NothingLeft { times });
        }

        for alert in &alerts {
            Log::log_indented(&format!(
                "Armed {} alert {} for {}",
                alert.kind.as_str(),
                alert.id,
                format_clock_time(&alert.fires_at)
            ));
        }
        Ok(RefreshOutcome::Planned { times, alerts })
    }

    /// Cancel everything and end the scheduler's lifecycle.
    ///
    /// Returns how many alerts were still armed.
    pub fn shutdown(self, sink: &mut dyn AlertSink) -> Result<usize> {
        let remaining = self.scheduler.dispose();
        sink.cancel_all()
            .context("Failed to cancel pending alerts during shutdown")?;
        Ok(remaining.len())
    }
}

fn deliver(sink: &mut dyn AlertSink, alerts: &[ArmedAlert]) -> Result<()> {
    sink.cancel_all()
        .context("Failed to cancel previously delivered alerts")?;
    for alert in alerts {
        sink.register(alert)
            .with_context(|| format!("Failed to register {} alert", alert.kind.as_str()))?;
    }
    Ok(())
}

fn log_times(trigger: Trigger, times: &ShabbatTimes) {
    let label = match trigger {
        Trigger::Startup => "Planned",
        Trigger::Manual => "Re-planned",
        Trigger::Periodic => "Refreshed",
    };
    Log::log_block_start(&format!(
        "{} alerts for Friday {}",
        label,
        times.reference_date()
    ));
    Log::log_indented(&format!(
        "Candle lighting: {}",
        format_clock_time(&times.candle_lighting())
    ));
    Log::log_indented(&format!("Sunset: {}", format_clock_time(&times.sunset())));
}
