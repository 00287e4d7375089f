//! Implementation of the --status command.
//!
//! Reads the snapshot a running daemon keeps in the runtime directory and
//! prints the pending alerts.

use anyhow::Result;
use chrono::{DateTime, FixedOffset, Local};

use crate::alerts::ArmedAlert;
use crate::alerts::snapshot::{default_snapshot_path, read_snapshot};
use crate::geo::format_clock_time;
use crate::lock::InstanceLock;
use crate::logger::Log;
use crate::utils::format_duration;

pub fn handle_status_command() -> Result<()> {
    Log::log_version();

    let lock_path = InstanceLock::default_path();
    let path = default_snapshot_path();
    if !InstanceLock::is_held(&lock_path) {
        Log::log_block_start("No running shabbat-alert daemon found");
        Log::log_end();
        return Ok(());
    }
    if let Some(pid) = InstanceLock::holder_pid(&lock_path) {
        Log::log_decorated(&format!("Daemon running (PID: {})", pid));
    }

    // No snapshot yet means nothing has been planned
    let alerts = if path.exists() {
        read_snapshot(&path)?
    } else {
        Vec::new()
    };
    let now = Local::now().fixed_offset();

    Log::log_block_start(&pending_summary(alerts.len()));
    for line in describe_pending(&alerts, now) {
        Log::log_indented(&line);
    }
    Log::log_end();
    Ok(())
}

pub fn pending_summary(count: usize) -> String {
    match count {
        0 => "No alerts pending".to_string(),
        1 => "1 alert pending".to_string(),
        n => format!("{} alerts pending", n),
    }
}

/// One line per alert, earliest first, with the time remaining.
pub fn describe_pending(alerts: &[ArmedAlert], now: DateTime<FixedOffset>) -> Vec<String> {
    let mut sorted: Vec<&ArmedAlert> = alerts.iter().collect();
    sorted.sort_by_key(|alert| alert.fires_at);

    sorted
        .into_iter()
        .map(|alert| {
            format!(
                "{} {} at {} on {} (in {})",
                alert.id,
                alert.kind.as_str(),
                format_clock_time(&alert.fires_at),
                alert.fires_at.format("%a %Y-%m-%d"),
                format_duration(alert.fires_at - now)
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::AlertScheduler;
    use crate::geo::{Coordinate, SolarTimeCalculator};
    use chrono::{NaiveDate, TimeZone};

    #[test]
    fn test_pending_summary() {
        assert_eq!(pending_summary(0), "No alerts pending");
        assert_eq!(pending_summary(1), "1 alert pending");
        assert_eq!(pending_summary(2), "2 alerts pending");
    }

    #[test]
    fn test_describe_pending() {
        let offset = FixedOffset::east_opt(3 * 3600).unwrap();
        let times = SolarTimeCalculator::default()
            .shabbat_times(
                NaiveDate::from_ymd_opt(2025, 6, 20).unwrap(),
                Coordinate::new(31.7683, 35.2137).unwrap(),
                offset,
            )
            .unwrap();
        let now = offset.with_ymd_and_hms(2025, 6, 20, 17, 0, 0).single().unwrap();
        let mut alerts = AlertScheduler::new().plan(&times, now);
        alerts.reverse();

        let lines = describe_pending(&alerts, now);
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            "#1 one hour before at 18:29 on Fri 2025-06-20 (in 1h 29m)"
        );
        assert_eq!(
            lines[1],
            "#2 candle lighting at 19:29 on Fri 2025-06-20 (in 2h 29m)"
        );
    }
}
