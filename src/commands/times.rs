//! Implementation of the --times command.
//!
//! Prints sunset, candle lighting and the one-hour reminder for the Friday on
//! or after the given date (today by default) at the configured location.

use anyhow::{Context, Result};
use chrono::NaiveDate;

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::geo::{ShabbatTimes, format_clock_time, next_friday};
use crate::logger::Log;

pub fn handle_times_command(date: Option<NaiveDate>) -> Result<()> {
    Log::log_version();

    let config = Config::load()?;
    let times = times_for(&config, &SystemClock, date)?;

    Log::log_block_start(&format!(
        "Friday {} at {}",
        times.reference_date(),
        location_label(&config)
    ));
    for line in describe_times(&times) {
        Log::log_indented(&line);
    }
    Log::log_end();
    Ok(())
}

/// Compute the times shown by `--times`.
///
/// `date` defaults to the clock's today; the reference date is the Friday on
/// or after it.
pub fn times_for(
    config: &Config,
    clock: &impl Clock,
    date: Option<NaiveDate>,
) -> Result<ShabbatTimes> {
    let coordinate = config
        .coordinate()
        .context("No location configured. Set latitude and longitude in shabbat-alert.toml or geo.toml")?;

    let reference_date = next_friday(date.unwrap_or_else(|| clock.today()));
    let times = config.calculator()?.shabbat_times(
        reference_date,
        coordinate,
        clock.offset_on(reference_date),
    )?;
    Ok(times)
}

pub fn describe_times(times: &ShabbatTimes) -> Vec<String> {
    vec![
        format!(
            "One hour before: {}",
            format_clock_time(&times.one_hour_before())
        ),
        format!(
            "Candle lighting: {}",
            format_clock_time(&times.candle_lighting())
        ),
        format!("Sunset:          {}", format_clock_time(&times.sunset())),
    ]
}

fn location_label(config: &Config) -> String {
    config
        .coordinate()
        .map(|coordinate| coordinate.to_string())
        .unwrap_or_else(|| "unknown location".to_string())
}
