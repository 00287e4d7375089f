//! Geographic coordinates, coordinate providers and sunset calculations.
//!
//! This module provides:
//! - The validated [`Coordinate`] type consumed by the solar calculator
//! - The [`SolarError`] outcomes of a calculation (bad input, polar day/night)
//! - [`CoordinateProvider`] implementations used by the refresh policy
//! - The sunset and candle lighting calculator in [`solar`]

pub mod solar;

use chrono::NaiveDate;
use thiserror::Error;

pub use solar::{ShabbatTimes, SolarTimeCalculator, format_clock_time, next_friday};

/// Reasons a sunset calculation has no answer.
///
/// None of these are worth retrying with the same input: the calculation is
/// pure, so only a new date or a new coordinate fix can change the outcome.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolarError {
    #[error("invalid latitude {value}° (must be between -90° and +90°)")]
    InvalidLatitude { value: f64 },

    #[error("invalid longitude {value}° (must be between -180° and +180°)")]
    InvalidLongitude { value: f64 },

    /// The sun never reaches the sunset zenith on this date at this latitude
    /// (midnight sun or polar night).
    #[error("the sun does not set on {date} at latitude {latitude}°")]
    NoSolution { date: NaiveDate, latitude: f64 },

    #[error("invalid candle lighting offset {minutes} minutes (must be between {min} and {max})")]
    InvalidOffset { minutes: u64, min: u64, max: u64 },
}

/// A validated position on Earth, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

impl Coordinate {
    /// Validate and build a coordinate.
    ///
    /// Out-of-range values are rejected rather than clamped: a clamped
    /// coordinate still yields a plausible sunset, just for the wrong place.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, SolarError> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(SolarError::InvalidLatitude { value: latitude });
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(SolarError::InvalidLongitude { value: longitude });
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let lat_dir = if self.latitude >= 0.0 { "N" } else { "S" };
        let lon_dir = if self.longitude >= 0.0 { "E" } else { "W" };
        write!(
            f,
            "{:.4}°{}, {:.4}°{}",
            self.latitude.abs(),
            lat_dir,
            self.longitude.abs(),
            lon_dir
        )
    }
}

/// Source of the current location.
///
/// Returns `None` when no fix is available; the refresh policy reports that
/// instead of computing times for a guessed place.
pub trait CoordinateProvider {
    fn current(&mut self) -> Option<Coordinate>;
}

/// A location read from configuration.
#[derive(Debug, Clone, Default)]
pub struct FixedLocation {
    coordinate: Option<Coordinate>,
}

impl FixedLocation {
    pub fn new(coordinate: Option<Coordinate>) -> Self {
        Self { coordinate }
    }
}

impl CoordinateProvider for FixedLocation {
    fn current(&mut self) -> Option<Coordinate> {
        self.coordinate
    }
}

/// Wraps another provider and falls back to its last successful fix.
pub struct LastKnownLocation<P> {
    inner: P,
    last_known: Option<Coordinate>,
}

impl<P: CoordinateProvider> LastKnownLocation<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            last_known: None,
        }
    }

    pub fn last_known(&self) -> Option<Coordinate> {
        self.last_known
    }

    /// Swap the wrapped provider, keeping the remembered fix.
    pub fn replace_inner(&mut self, inner: P) {
        self.inner = inner;
    }
}

impl<P: CoordinateProvider> CoordinateProvider for LastKnownLocation<P> {
    fn current(&mut self) -> Option<Coordinate> {
        match self.inner.current() {
            Some(coordinate) => {
                self.last_known = Some(coordinate);
                Some(coordinate)
            }
            None => self.last_known,
        }
    }
}
