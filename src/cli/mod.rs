//! CLI module
//!
//! Command-line interface acting as a reference host for the sink.
//!
//! # Commands
//!
//! - `load` - Chunk JSON lines from a file or stdin and load them
//! - `columns` - Print the target table's columns
//! - `copy-sql` - Print the COPY statement for a staged key
//! - `check` - Test the warehouse connection

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
