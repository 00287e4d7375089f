use anyhow::Result;
use std::{
    sync::atomic::Ordering,
    sync::mpsc::RecvTimeoutError,
    time::{Duration, Instant},
};

use shabbat_alert::alerts::delivery::Dispatcher;
use shabbat_alert::alerts::snapshot::default_snapshot_path;
use shabbat_alert::args::{CliAction, ParsedArgs, display_help, display_version_info};
use shabbat_alert::clock::{Clock, SystemClock};
use shabbat_alert::commands;
use shabbat_alert::config::Config;
use shabbat_alert::constants::*;
use shabbat_alert::geo::{FixedLocation, LastKnownLocation};
use shabbat_alert::lock::InstanceLock;
use shabbat_alert::logger::Log;
use shabbat_alert::refresh::{Planner, RefreshOutcome, Trigger, trigger_for_tick};
use shabbat_alert::signals::{SignalMessage, setup_signal_handler};
use shabbat_alert::utils::{format_duration, path_for_display};

const CHECK_INTERVAL: Duration = Duration::from_secs(CHECK_INTERVAL_SECS);

type DaemonPlanner = Planner<LastKnownLocation<FixedLocation>, SystemClock>;

fn main() -> Result<()> {
    let parsed_args = ParsedArgs::from_env();

    match parsed_args.action {
        CliAction::ShowVersion => {
            display_version_info();
            Ok(())
        }
        CliAction::ShowHelp => {
            display_help();
            Ok(())
        }
        CliAction::ShowHelpDueToError => {
            display_help();
            std::process::exit(EXIT_FAILURE);
        }
        CliAction::ShowTimes {
            debug_enabled,
            date,
        } => {
            Log::set_debug(debug_enabled);
            commands::times::handle_times_command(date)
        }
        CliAction::ShowStatus => commands::status::handle_status_command(),
        CliAction::Run { debug_enabled } => {
            Log::set_debug(debug_enabled);
            run_daemon(debug_enabled)
        }
    }
}

fn run_daemon(debug_enabled: bool) -> Result<()> {
    Log::log_version();

    let lock_path = InstanceLock::default_path();
    let Some(instance_lock) = InstanceLock::acquire(&lock_path)? else {
        let pid = InstanceLock::holder_pid(&lock_path)
            .map(|pid| format!(" (PID: {})", pid))
            .unwrap_or_default();
        Log::log_error(&format!(
            "Another instance of shabbat-alert is already running{}.\n\
            • Stop it before starting a new one, or send it SIGHUP to reload.",
            pid
        ));
        std::process::exit(EXIT_FAILURE);
    };
    Log::log_decorated("Lock acquired, starting shabbat-alert...");

    let signal_state = setup_signal_handler(debug_enabled)?;

    let mut config = Config::load()?;
    config.log_config();

    let mut dispatcher =
        Dispatcher::new(config.notify_command.clone()).with_snapshot(default_snapshot_path());
    let mut planner: DaemonPlanner = Planner::new(
        LastKnownLocation::new(FixedLocation::new(config.coordinate())),
        SystemClock,
        config.calculator()?,
    );

    run_refresh(&mut planner, Trigger::Startup, &mut dispatcher);

    let mut last_refresh = Instant::now();
    let mut last_wall_time = planner.clock().now();

    while signal_state.running.load(Ordering::SeqCst) {
        match signal_state.signal_receiver.recv_timeout(CHECK_INTERVAL) {
            Ok(SignalMessage::Shutdown) => break,
            Ok(SignalMessage::Reload) => {
                reload_config(&mut config, &mut planner, &mut dispatcher);
                last_refresh = Instant::now();
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                Log::log_warning("Signal handler stopped unexpectedly, shutting down");
                break;
            }
        }

        // Wall clock rather than Instant: the monotonic clock stops during suspend
        let now = planner.clock().now();
        let elapsed = now - last_wall_time;
        last_wall_time = now;

        // Re-plan before firing so alerts missed while asleep are dropped
        if let Some(trigger) =
            trigger_for_tick(elapsed, last_refresh.elapsed(), config.check_interval())
        {
            if trigger == Trigger::Manual {
                Log::log_pipe();
                Log::log_decorated(&format!(
                    "Time jump of {} detected. System may have resumed from sleep.",
                    format_duration(elapsed.abs())
                ));
            }
            run_refresh(&mut planner, trigger, &mut dispatcher);
            last_refresh = Instant::now();
        }

        dispatcher.fire_due(now);
    }

    Log::log_block_start("Shutting down shabbat-alert...");
    match planner.shutdown(&mut dispatcher) {
        Ok(cancelled) => Log::log_indented(&format!("Cancelled {} pending alert(s)", cancelled)),
        Err(e) => Log::log_warning(&format!("{:#}", e)),
    }
    dispatcher.stop_notifications();
    dispatcher.remove_snapshot();
    if let Err(e) = instance_lock.release() {
        Log::log_warning(&format!("{:#}", e));
    }
    Log::log_end();

    Ok(())
}

fn run_refresh(planner: &mut DaemonPlanner, trigger: Trigger, dispatcher: &mut Dispatcher) {
    match planner.refresh(trigger, dispatcher) {
        Ok(RefreshOutcome::LocationUnavailable) => {
            if let Ok(path) = Config::get_config_path() {
                Log::log_indented(&format!(
                    "Set latitude and longitude in {} and send SIGHUP",
                    path_for_display(&path)
                ));
            }
        }
        Ok(outcome) if outcome.is_planned() => {
            if let Some(next_due) = dispatcher.next_due() {
                Log::log_decorated(&format!(
                    "Next alert in {}",
                    format_duration(next_due - planner.clock().now())
                ));
            }
        }
        Ok(_) => {}
        Err(e) => Log::log_error(&format!("Refresh failed: {:#}", e)),
    }
}

/// Apply a reloaded config. On failure the current settings stay in effect.
fn reload_config(config: &mut Config, planner: &mut DaemonPlanner, dispatcher: &mut Dispatcher) {
    let reloaded = Config::load().and_then(|new_config| {
        let calculator = new_config.calculator()?;
        Ok((new_config, calculator))
    });

    match reloaded {
        Ok((new_config, calculator)) => {
            planner.set_calculator(calculator);
            planner
                .provider_mut()
                .replace_inner(FixedLocation::new(new_config.coordinate()));
            dispatcher.set_notify_command(new_config.notify_command.clone());
            *config = new_config;
            config.log_config();
            run_refresh(planner, Trigger::Manual, dispatcher);
        }
        Err(e) => {
            Log::log_error(&format!("Failed to reload configuration: {:#}", e));
            Log::log_indented("Keeping the previous configuration");
        }
    }
}
