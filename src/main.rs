//! Block Trace Studio CLI
//!
//! Decodes block trace captures into per-thread call trees and reports
//! call statistics, summaries and collapsed stacks.

use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;

mod commands;

use commands::{display_version, execute_descriptors, execute_inspect, validate_args, CheckOrder, InspectArgs};

/// Block Trace Studio - call trees and statistics for block trace captures
#[derive(Parser, Debug)]
#[command(name = "block-trace")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Decode a trace file and report on it
    Inspect {
        /// Trace file to decode
        file: PathBuf,

        /// Output path for JSON summary (optional)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output path for collapsed stacks (optional)
        #[arg(short, long)]
        stacks: Option<PathBuf>,

        /// Number of blocks listed per thread
        #[arg(long, default_value = "10")]
        top: usize,

        /// Skip call statistics
        #[arg(long)]
        no_stats: bool,

        /// Verify the writer's block ordering
        #[arg(long, value_enum, default_value = "off")]
        check_order: CheckOrder,

        /// Print text summary to stdout
        #[arg(long)]
        summary: bool,
    },

    /// List block descriptors
    Descriptors {
        /// Descriptor stream (or trace file with --full)
        file: PathBuf,

        /// Read the descriptors of a full trace file
        #[arg(long)]
        full: bool,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    // Execute command
    match cli.command {
        Commands::Inspect {
            file,
            output,
            stacks,
            top,
            no_stats,
            check_order,
            summary,
        } => {
            let args = InspectArgs {
                input: file,
                output_json: output,
                output_stacks: stacks,
                top_blocks: top,
                gather_statistics: !no_stats,
                ordering_check: check_order.into(),
                print_summary: summary,
            };

            // Validate args first
            validate_args(&args)?;

            execute_inspect(args)?;
        }

        Commands::Descriptors { file, full } => {
            execute_descriptors(&file, full)?;
        }

        Commands::Version => {
            display_version();
        }
    }

    Ok(())
}
