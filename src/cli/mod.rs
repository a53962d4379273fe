//! # Command-Line Interface
//!
//! Argument parsing, task declarations, watch mode and output formatting.
//!
//! ## Usage
//!
//! ```bash
//! polyform                      # default: every convention, adapters, extensions
//! polyform standalone amd       # selected conventions
//! polyform --watch standalone   # fast mode, no minify or archive
//! polyform watch                # build, then rebuild on change
//! polyform --list               # declared tasks and dependencies
//! ```
//!
//! ## Output Formats
//!
//! `--format text` (default) prints timestamped task lines;
//! `--format json` prints one object per task event and a final report.
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the requested targets.

mod app;
mod output;
pub mod tasks;
pub mod watch;

pub use app::{run, Cli};
pub use output::{Output, OutputFormat};
