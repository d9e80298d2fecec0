//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Solidafy Redshift loader CLI
#[derive(Parser, Debug)]
#[command(name = "solidafy-redshift")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Sink configuration file (YAML or JSON)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load newline-delimited JSON records in chunks
    Load {
        /// Input file, or `-` for stdin
        #[arg(short, long, default_value = "-")]
        input: String,

        /// Records per chunk
        #[arg(long, default_value = "10000")]
        chunk_records: usize,

        /// Retries of a chunk after a fatal error
        #[arg(long, default_value = "3")]
        max_retries: u32,

        /// Initial delay between retries, doubled each attempt
        #[arg(long, default_value = "1000")]
        retry_wait_ms: u64,
    },

    /// Print the columns of the target table
    Columns {
        /// Re-read the catalog instead of using the cache
        #[arg(long)]
        refresh: bool,
    },

    /// Print the COPY statement for a staged key (credentials masked)
    CopySql {
        /// Object key within the staging bucket
        key: String,
    },

    /// Test the warehouse connection and resolve the table schema
    Check,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one message per line)
    Json,
    /// Human-readable output
    Pretty,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_load() {
        let cli = Cli::parse_from([
            "solidafy-redshift",
            "-C",
            "sink.yaml",
            "load",
            "--input",
            "events.jsonl",
            "--chunk-records",
            "500",
        ]);
        assert_eq!(cli.config, Some(PathBuf::from("sink.yaml")));
        match cli.command {
            Commands::Load {
                input,
                chunk_records,
                max_retries,
                retry_wait_ms,
            } => {
                assert_eq!(input, "events.jsonl");
                assert_eq!(chunk_records, 500);
                assert_eq!(max_retries, 3);
                assert_eq!(retry_wait_ms, 1000);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_copy_sql_with_global_flags_after() {
        let cli = Cli::parse_from(["solidafy-redshift", "copy-sql", "logs/a_00.gz", "--verbose"]);
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::CopySql { key } if key == "logs/a_00.gz"));
    }
}
