//! Command-line argument parsing.
//!
//! Arguments are few enough that a hand-rolled parser keeps the output in the
//! same box-drawing style as the rest of the log. Unknown options print the
//! help text instead of being ignored.

use chrono::NaiveDate;

use crate::logger::Log;

/// What the user asked the binary to do.
#[derive(Debug, PartialEq)]
pub enum CliAction {
    /// Run the alert daemon
    Run { debug_enabled: bool },
    /// Print this week's times (or those for `date`) and exit
    ShowTimes {
        debug_enabled: bool,
        date: Option<NaiveDate>,
    },
    /// Print the alerts a running daemon has pending
    ShowStatus,
    ShowHelp,
    ShowVersion,
    /// Show help due to unknown or malformed arguments
    ShowHelpDueToError,
}

pub struct ParsedArgs {
    pub action: CliAction,
}

impl ParsedArgs {
    /// Parse command-line arguments into an action.
    ///
    /// # Arguments
    /// * `args` - Arguments including the program name (as from `std::env::args()`)
    pub fn parse<I, S>(args: I) -> ParsedArgs
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut debug_enabled = false;
        let mut display_help = false;
        let mut display_version = false;
        let mut show_times = false;
        let mut show_status = false;
        let mut times_date: Option<NaiveDate> = None;
        let mut unknown_arg_found = false;

        let args_vec: Vec<String> = args
            .into_iter()
            .skip(1)
            .map(|s| s.as_ref().to_string())
            .collect();

        let mut i = 0;
        while i < args_vec.len() {
            let arg_str = &args_vec[i];
            match arg_str.as_str() {
                "--help" | "-h" => display_help = true,
                "--version" | "-V" | "-v" => display_version = true,
                "--debug" | "-d" => debug_enabled = true,
                "--status" | "-s" => show_status = true,
                "--times" | "-t" => {
                    show_times = true;
                    // Optional date operand: --times [YYYY-MM-DD]
                    if let Some(next) = args_vec.get(i + 1) {
                        if !next.starts_with('-') {
                            match NaiveDate::parse_from_str(next, "%Y-%m-%d") {
                                Ok(date) => times_date = Some(date),
                                Err(_) => {
                                    Log::log_warning(&format!(
                                        "Invalid date: {} (expected YYYY-MM-DD)",
                                        next
                                    ));
                                    unknown_arg_found = true;
                                }
                            }
                            i += 1;
                        }
                    }
                }
                _ => {
                    if arg_str.starts_with('-') {
                        Log::log_warning(&format!("Unknown option: {}", arg_str));
                    } else {
                        Log::log_warning(&format!("Unexpected argument: {}", arg_str));
                    }
                    unknown_arg_found = true;
                }
            }
            i += 1;
        }

        let action = if display_version {
            CliAction::ShowVersion
        } else if unknown_arg_found {
            CliAction::ShowHelpDueToError
        } else if display_help {
            CliAction::ShowHelp
        } else if show_times && show_status {
            Log::log_warning("--times and --status cannot be combined");
            CliAction::ShowHelpDueToError
        } else if show_times {
            CliAction::ShowTimes {
                debug_enabled,
                date: times_date,
            }
        } else if show_status {
            CliAction::ShowStatus
        } else {
            CliAction::Run { debug_enabled }
        };

        ParsedArgs { action }
    }

    pub fn from_env() -> ParsedArgs {
        Self::parse(std::env::args())
    }
}

pub fn display_version_info() {
    Log::log_version();
    Log::log_pipe();
    println!("┗ {}", env!("CARGO_PKG_DESCRIPTION"));
}

pub fn display_help() {
    Log::log_version();
    Log::log_block_start(env!("CARGO_PKG_DESCRIPTION"));
    Log::log_block_start("Usage: shabbat-alert [OPTIONS]");
    Log::log_block_start("Options:");
    Log::log_indented("-d, --debug               Enable detailed debug output");
    Log::log_indented("-h, --help                Print help information");
    Log::log_indented("-s, --status              Show alerts pending in the running daemon");
    Log::log_indented("-t, --times [YYYY-MM-DD]  Print candle lighting times and exit");
    Log::log_indented("-V, --version             Print version information");
    Log::log_end();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_no_args() {
        let parsed = ParsedArgs::parse(vec!["shabbat-alert"]);
        assert_eq!(
            parsed.action,
            CliAction::Run {
                debug_enabled: false
            }
        );
    }

    #[test]
    fn test_parse_debug_flags() {
        for flag in ["--debug", "-d"] {
            let parsed = ParsedArgs::parse(vec!["shabbat-alert", flag]);
            assert_eq!(
                parsed.action,
                CliAction::Run {
                    debug_enabled: true
                }
            );
        }
    }

    #[test]
    fn test_parse_help_flag() {
        let parsed = ParsedArgs::parse(vec!["shabbat-alert", "-h"]);
        assert_eq!(parsed.action, CliAction::ShowHelp);
    }

    #[test]
    fn test_parse_version_short_flags() {
        for flag in ["-V", "-v", "--version"] {
            let parsed = ParsedArgs::parse(vec!["shabbat-alert", flag]);
            assert_eq!(parsed.action, CliAction::ShowVersion);
        }
    }

    #[test]
    fn test_version_takes_precedence() {
        let parsed = ParsedArgs::parse(vec!["shabbat-alert", "--version", "--help", "--debug"]);
        assert_eq!(parsed.action, CliAction::ShowVersion);
    }

    #[test]
    fn test_parse_unknown_flag() {
        let parsed = ParsedArgs::parse(vec!["shabbat-alert", "--debug", "--invalid"]);
        assert_eq!(parsed.action, CliAction::ShowHelpDueToError);
    }

    #[test]
    fn test_parse_stray_operand() {
        let parsed = ParsedArgs::parse(vec!["shabbat-alert", "friday"]);
        assert_eq!(parsed.action, CliAction::ShowHelpDueToError);
    }

    #[test]
    fn test_parse_times_without_date() {
        let parsed = ParsedArgs::parse(vec!["shabbat-alert", "--times"]);
        assert_eq!(
            parsed.action,
            CliAction::ShowTimes {
                debug_enabled: false,
                date: None
            }
        );
    }

    #[test]
    fn test_parse_times_with_date() {
        let parsed = ParsedArgs::parse(vec!["shabbat-alert", "-t", "2025-06-18", "-d"]);
        assert_eq!(
            parsed.action,
            CliAction::ShowTimes {
                debug_enabled: true,
                date: NaiveDate::from_ymd_opt(2025, 6, 18)
            }
        );
    }

    #[test]
    fn test_parse_times_followed_by_flag() {
        let parsed = ParsedArgs::parse(vec!["shabbat-alert", "--times", "--debug"]);
        assert_eq!(
            parsed.action,
            CliAction::ShowTimes {
                debug_enabled: true,
                date: None
            }
        );
    }

    #[test]
    fn test_parse_times_invalid_date() {
        let parsed = ParsedArgs::parse(vec!["shabbat-alert", "--times", "2025-13-40"]);
        assert_eq!(parsed.action, CliAction::ShowHelpDueToError);
    }

    #[test]
    fn test_parse_status() {
        let parsed = ParsedArgs::parse(vec!["shabbat-alert", "--status"]);
        assert_eq!(parsed.action, CliAction::ShowStatus);
    }

    #[test]
    fn test_times_and_status_conflict() {
        let parsed = ParsedArgs::parse(vec!["shabbat-alert", "-t", "-s"]);
        assert_eq!(parsed.action, CliAction::ShowHelpDueToError);
    }
}
