//! Alert delivery.
//!
//! The scheduler decides *what* should fire; a sink decides *how*. The daemon
//! uses [`Dispatcher`], which keeps the pending alerts in memory, fires them
//! from the main loop once they are due (log line plus an optional desktop
//! notification command) and mirrors the pending list into a snapshot file for
//! `--status`.

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};

use super::ArmedAlert;
use super::snapshot;
use crate::logger::Log;

/// Receiver of armed alerts.
///
/// The refresh policy always calls `cancel_all` before registering a new
/// planning cycle, mirroring the scheduler's own cancel-then-arm order.
#[cfg_attr(test, mockall::automock)]
pub trait AlertSink {
    fn cancel_all(&mut self) -> Result<()>;
    fn register(&mut self, alert: &ArmedAlert) -> Result<()>;
}

/// In-process delivery used by the daemon.
#[derive(Debug, Default)]
pub struct Dispatcher {
    pending: Vec<ArmedAlert>,
    notify_command: Option<String>,
    snapshot_path: Option<PathBuf>,
    notifications: Vec<Child>,
}

impl Dispatcher {
    pub fn new(notify_command: Option<String>) -> Self {
        Self {
            pending: Vec::new(),
            notify_command,
            snapshot_path: None,
            notifications: Vec::new(),
        }
    }

    /// Mirror the pending list into `path` after every change.
    pub fn with_snapshot(mut self, path: PathBuf) -> Self {
        self.snapshot_path = Some(path);
        self
    }

    pub fn set_notify_command(&mut self, notify_command: Option<String>) {
        self.notify_command = notify_command;
    }

    pub fn pending(&self) -> &[ArmedAlert] {
        &self.pending
    }

    /// Earliest instant at which something is due.
    pub fn next_due(&self) -> Option<DateTime<FixedOffset>> {
        self.pending.iter().map(|alert| alert.fires_at).min()
    }

    /// Remove and return every alert due at or before `now`, earliest first.
    pub fn take_due(&mut self, now: DateTime<FixedOffset>) -> Vec<ArmedAlert> {
        let (mut due, remaining): (Vec<_>, Vec<_>) = self
            .pending
            .drain(..)
            .partition(|alert| alert.fires_at <= now);
        self.pending = remaining;
        due.sort_by_key(|alert| alert.fires_at);

        if !due.is_empty() {
            self.write_snapshot();
        }
        due
    }

    /// Fire every due alert. Returns how many fired.
    ///
    /// Notify commands started by earlier calls are reaped here as well.
    pub fn fire_due(&mut self, now: DateTime<FixedOffset>) -> usize {
        self.reap_notifications();

        let due = self.take_due(now);
        for alert in &due {
            self.fire(alert);
        }
        due.len()
    }

    fn fire(&mut self, alert: &ArmedAlert) {
        Log::log_alert(&alert.payload.title, &alert.payload.body);

        if let Some(command) = &self.notify_command {
            match spawn_notification(command, alert) {
                Ok(child) => self.notifications.push(child),
                Err(e) => Log::log_warning(&format!("Failed to run notify command: {:#}", e)),
            }
        }
    }

    /// Notify commands that have been started but not yet reaped.
    pub fn running_notifications(&self) -> usize {
        self.notifications.len()
    }

    /// Reap notify commands that have exited. Returns how many are still running.
    pub fn reap_notifications(&mut self) -> usize {
        self.notifications.retain_mut(|child| match child.try_wait() {
            Ok(Some(status)) => {
                if !status.success() {
                    Log::log_debug(&format!("Notify command exited with {}", status));
                }
                false
            }
            Ok(None) => true,
            Err(e) => {
                Log::log_debug(&format!("Error checking notify command status: {}", e));
                false
            }
        });
        self.notifications.len()
    }

    /// Reap every notify command, killing the ones still running. Used on shutdown.
    pub fn stop_notifications(&mut self) {
        for mut child in self.notifications.drain(..) {
            match child.try_wait() {
                Ok(Some(_)) => {}
                Ok(None) => {
                    Log::log_debug(&format!(
                        "Terminating notify command (PID: {})",
                        child.id()
                    ));
                    if let Err(e) = child.kill() {
                        Log::log_warning(&format!("Failed to terminate notify command: {}", e));
                    }
                    let _ = child.wait();
                }
                Err(e) => {
                    Log::log_debug(&format!("Error checking notify command status: {}", e));
                }
            }
        }
    }

    fn write_snapshot(&self) {
        if let Some(path) = &self.snapshot_path {
            if let Err(e) = snapshot::write_snapshot(path, &self.pending) {
                Log::log_warning(&format!("Failed to write alert snapshot: {:#}", e));
            }
        }
    }

    /// Drop the snapshot file, used on shutdown.
    pub fn remove_snapshot(&self) {
        if let Some(path) = &self.snapshot_path {
            if path.exists() {
                if let Err(e) = std::fs::remove_file(path) {
                    Log::log_warning(&format!("Failed to remove alert snapshot: {}", e));
                }
            }
        }
    }
}

impl AlertSink for Dispatcher {
    fn cancel_all(&mut self) -> Result<()> {
        self.pending.clear();
        self.write_snapshot();
        Ok(())
    }

    fn register(&mut self, alert: &ArmedAlert) -> Result<()> {
        self.pending.retain(|pending| pending.kind != alert.kind);
        self.pending.push(alert.clone());
        self.write_snapshot();
        Ok(())
    }
}

/// Run `command title body`, detached from our stdio.
///
/// The command string may carry its own arguments, e.g. `notify-send -u critical`.
/// The caller owns the returned child and must reap it.
fn spawn_notification(command: &str, alert: &ArmedAlert) -> Result<Child> {
    let mut parts = command.split_whitespace();
    let program = parts.next().context("notify command is empty")?;

    Command::new(program)
        .args(parts)
        .arg(&alert.payload.title)
        .arg(&alert.payload.body)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .with_context(|| format!("failed to start '{}'", program))
}
