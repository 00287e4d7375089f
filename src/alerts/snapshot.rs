//! Pending alert snapshot for display.
//!
//! The daemon writes its pending alerts to `$XDG_RUNTIME_DIR/shabbat-alert/alerts.toml`
//! so `shabbat-alert --status` can show them. The file is for display only; a
//! restarted daemon plans from scratch and never reads it back.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use super::ArmedAlert;
use crate::constants::{APP_DIR_NAME, SNAPSHOT_FILE_NAME};

#[derive(Serialize)]
struct SnapshotRef<'a> {
    alerts: &'a [ArmedAlert],
}

#[derive(Deserialize)]
struct SnapshotFile {
    #[serde(default)]
    alerts: Vec<ArmedAlert>,
}

/// Default snapshot location inside the runtime directory.
pub fn default_snapshot_path() -> PathBuf {
    crate::utils::runtime_dir()
        .join(APP_DIR_NAME)
        .join(SNAPSHOT_FILE_NAME)
}

pub fn write_snapshot(path: &Path, alerts: &[ArmedAlert]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let content =
        toml::to_string(&SnapshotRef { alerts }).context("Failed to serialize alert snapshot")?;
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

pub fn read_snapshot(path: &Path) -> Result<Vec<ArmedAlert>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let snapshot: SnapshotFile = toml::from_str(&content)
        .with_context(|| format!("Failed to parse alert snapshot {}", path.display()))?;
    Ok(snapshot.alerts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::AlertScheduler;
    use crate::geo::{Coordinate, SolarTimeCalculator};
    use chrono::{FixedOffset, NaiveDate, TimeZone};
    use tempfile::tempdir;

    #[test]
    fn test_snapshot_preserves_alerts() {
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let coordinate = Coordinate::new(32.0853, 34.7818).unwrap();
        let times = SolarTimeCalculator::default()
            .shabbat_times(NaiveDate::from_ymd_opt(2025, 1, 3).unwrap(), coordinate, offset)
            .unwrap();
        let now = offset.with_ymd_and_hms(2025, 1, 2, 12, 0, 0).single().unwrap();
        let armed = AlertScheduler::new().plan(&times, now);

        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("nested").join("alerts.toml");
        write_snapshot(&path, &armed).unwrap();

        assert_eq!(read_snapshot(&path).unwrap(), armed);
    }

    #[test]
    fn test_empty_snapshot() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("alerts.toml");
        write_snapshot(&path, &[]).unwrap();
        assert!(read_snapshot(&path).unwrap().is_empty());

        fs::write(&path, "").unwrap();
        assert!(read_snapshot(&path).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_snapshot_is_an_error() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("alerts.toml");
        fs::write(&path, "alerts = 5").unwrap();
        assert!(read_snapshot(&path).is_err());
    }
}
