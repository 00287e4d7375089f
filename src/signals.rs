//! Signal handling for the daemon.
//!
//! A background thread owns the `signal-hook` iterator and forwards each
//! signal to the main loop as a [`SignalMessage`] over an mpsc channel. The
//! main loop waits on that channel between checks, so a signal is handled
//! within one check interval.
//!
//! - SIGINT, SIGTERM: shut down, cancelling every pending alert
//! - SIGHUP: reload the configuration and re-plan

use anyhow::{Context, Result};
use signal_hook::{
    consts::signal::{SIGHUP, SIGINT, SIGTERM},
    iterator::Signals,
};
use std::sync::mpsc::{Receiver, channel};
use std::{
    sync::Arc,
    sync::atomic::{AtomicBool, Ordering},
    thread,
};

use crate::logger::Log;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalMessage {
    /// Reload configuration and re-plan (SIGHUP)
    Reload,
    /// Shut down (SIGINT, SIGTERM)
    Shutdown,
}

/// Signal handling state shared between threads
pub struct SignalState {
    /// Cleared when a shutdown signal arrives
    pub running: Arc<AtomicBool>,
    pub signal_receiver: Receiver<SignalMessage>,
}

/// Map a raw signal number to the message the main loop understands.
pub fn message_for(signal: i32) -> Option<SignalMessage> {
    match signal {
        SIGHUP => Some(SignalMessage::Reload),
        SIGINT | SIGTERM => Some(SignalMessage::Shutdown),
        _ => None,
    }
}

fn describe(signal: i32, debug_enabled: bool) -> &'static str {
    match signal {
        SIGHUP => "Received reload signal",
        SIGINT if debug_enabled => "Received SIGINT (Ctrl+C), initiating graceful shutdown...",
        SIGINT => "Received interrupt signal, initiating graceful shutdown...",
        SIGTERM => "Received termination request, initiating graceful shutdown...",
        _ => "Received unexpected signal",
    }
}

/// Register handlers and start the listener thread.
pub fn setup_signal_handler(debug_enabled: bool) -> Result<SignalState> {
    let running = Arc::new(AtomicBool::new(true));
    let (signal_sender, signal_receiver) = channel::<SignalMessage>();

    let mut signals =
        Signals::new([SIGINT, SIGTERM, SIGHUP]).context("failed to register signal handlers")?;

    let running_clone = running.clone();

    thread::spawn(move || {
        for sig in signals.forever() {
            let Some(message) = message_for(sig) else {
                continue;
            };

            Log::log_pipe();
            Log::log_decorated(describe(sig, debug_enabled));

            if message == SignalMessage::Shutdown {
                running_clone.store(false, Ordering::SeqCst);
            }

            if signal_sender.send(message).is_err() {
                // Main loop has exited
                break;
            }
        }
    });

    Ok(SignalState {
        running,
        signal_receiver,
    })
}
