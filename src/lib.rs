//! # shabbat-alert
//!
//! Candle lighting reminders computed from local sunset.
//!
//! shabbat-alert computes sunset for the upcoming Friday at a configured
//! location, derives candle lighting (a fixed offset before sunset) and a
//! reminder one hour earlier, and fires both as desktop alerts.
//!
//! ## Architecture
//!
//! - **geo**: Coordinates, coordinate providers and the sunset calculator
//! - **alerts**: The armed-alert scheduler, delivery sinks and the status snapshot
//! - **refresh**: When to re-plan and how a refresh flows through the pieces
//! - **clock**: Wall clock and local UTC offset
//! - **config**: Configuration loading, validation, and default generation
//! - **args** / **commands**: Command-line parsing and one-shot commands
//! - **signals** / **lock**: Reload and shutdown signals, single-instance lock
//! - **logger**: Structured logging with visual formatting
//! - **constants** / **utils**: Defaults, limits and small helpers

pub mod alerts;
pub mod args;
pub mod clock;
pub mod commands;
pub mod config;
pub mod constants;
pub mod geo;
pub mod lock;
pub mod logger;
pub mod refresh;
pub mod signals;
pub mod utils;

pub use alerts::{AlertKind, AlertScheduler, ArmedAlert};
pub use config::Config;
pub use geo::{Coordinate, ShabbatTimes, SolarError, SolarTimeCalculator};
pub use logger::{Log, LogLevel};
pub use refresh::{Planner, RefreshOutcome, Trigger};
