// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Command-line interface.

/// CLI argument definitions.
pub mod args;

/// Logging utilities for CLI output.
pub mod logging;

/// Pipeline runner.
pub mod run;
