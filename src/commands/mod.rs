//! One-shot CLI commands.
//!
//! Each command prints its result in the usual log style and exits without
//! touching the running daemon.

pub mod status;
pub mod times;
