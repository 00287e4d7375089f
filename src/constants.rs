//! Application constants and default values for shabbat-alert.
//!
//! This module contains the solar algorithm constants, configuration defaults,
//! validation limits, and operational timing used throughout the application.

// ═══ Solar Algorithm Constants ═══
// Coefficients of the iterative sunset approximation. Changing any of these
// changes every computed time, so they are kept exactly as published.

pub const SUNSET_ZENITH: f64 = 90.833; // degrees, includes refraction and solar disk radius
pub const SUNSET_APPROX_HOUR: f64 = 18.0; // initial guess for local sunset hour
pub const MEAN_ANOMALY_RATE: f64 = 0.9856; // degrees per day
pub const MEAN_ANOMALY_OFFSET: f64 = 3.289;
pub const ECCENTRICITY_TERM_1: f64 = 1.916;
pub const ECCENTRICITY_TERM_2: f64 = 0.02;
pub const PERIHELION_LONGITUDE: f64 = 282.634;
pub const RIGHT_ASCENSION_FACTOR: f64 = 0.91764;
pub const DECLINATION_FACTOR: f64 = 0.39782; // sin of the obliquity of the ecliptic
pub const SIDEREAL_RATE: f64 = 0.06571;
pub const SIDEREAL_OFFSET: f64 = 6.622;

// ═══ Candle Lighting Defaults ═══

pub const DEFAULT_CANDLE_LIGHTING_OFFSET: u64 = 18; // minutes before sunset
pub const REMINDER_LEAD_MINUTES: i64 = 60; // minutes before candle lighting
pub const DEFAULT_CHECK_INTERVAL: u64 = 6; // hours between periodic refreshes

// ═══ Validation Limits ═══

pub const MINIMUM_CANDLE_LIGHTING_OFFSET: u64 = 1; // minutes
pub const MAXIMUM_CANDLE_LIGHTING_OFFSET: u64 = 90; // minutes
pub const MINIMUM_CHECK_INTERVAL: u64 = 1; // hours
pub const MAXIMUM_CHECK_INTERVAL: u64 = 24; // hours

// ═══ Operational Timing Constants ═══

pub const SLEEP_DETECTION_THRESHOLD_SECS: u64 = 300; // 5 minutes - detect system sleep/resume
pub const CHECK_INTERVAL_SECS: u64 = 1; // How often the main loop wakes to fire due alerts

// ═══ File Names ═══

pub const APP_DIR_NAME: &str = "shabbat-alert";
pub const CONFIG_FILE_NAME: &str = "shabbat-alert.toml";
pub const GEO_FILE_NAME: &str = "geo.toml";
pub const LOCK_FILE_NAME: &str = "shabbat-alert.lock";
pub const SNAPSHOT_FILE_NAME: &str = "alerts.toml";

// ═══ Exit Codes ═══

pub const EXIT_FAILURE: i32 = 1; // General failure
