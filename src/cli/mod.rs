//! Command-line interface for albumgrab.

mod commands;

pub use commands::{is_verbose, run};
