//! Utility functions shared across the codebase.
//!
//! Path helpers for the runtime and config directories and small formatting
//! helpers used in log output.

use chrono::Duration;
use std::path::{Path, PathBuf};

/// Directory for the lock file and alert snapshot.
///
/// Uses `$XDG_RUNTIME_DIR`, falling back to `/tmp` when it is unset (e.g. cron
/// or a bare TTY session).
pub fn runtime_dir() -> PathBuf {
    std::env::var_os("XDG_RUNTIME_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("/tmp"))
}

/// Shorten a path for display by replacing the home directory with `~`.
///
/// # Examples
/// ```
/// use std::path::Path;
/// use shabbat_alert::utils::path_for_display;
/// assert_eq!(path_for_display(Path::new("/etc/hosts")), "/etc/hosts");
/// ```
pub fn path_for_display(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(relative) = path.strip_prefix(&home) {
            return format!("~/{}", relative.display());
        }
    }
    path.display().to_string()
}

/// Format a duration as "Xh Ym" (or "Ym" under an hour) for log output.
///
/// Negative durations are shown as zero.
///
/// # Examples
/// ```
/// use chrono::Duration;
/// use shabbat_alert::utils::format_duration;
/// assert_eq!(format_duration(Duration::minutes(135)), "2h 15m");
/// assert_eq!(format_duration(Duration::minutes(7)), "7m");
/// ```
pub fn format_duration(duration: Duration) -> String {
    let total_minutes = duration.num_minutes().max(0);
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;

    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}
