//! Inspect command implementation.
//!
//! The inspect command:
//! 1. Decodes the trace file into call trees
//! 2. Builds the per-thread summary
//! 3. Builds collapsed stacks (if requested)
//! 4. Writes output files

use super::models::InspectArgs;
use anyhow::{Context, Result};
use block_trace_studio::aggregator::build_collapsed_stacks;
use block_trace_studio::output::{build_summary, format_text_summary, write_collapsed_stacks, write_summary};
use block_trace_studio::progress::Progress;
use block_trace_studio::reader::{fill_trees_from_file, ReaderOptions};
use log::{debug, info, warn};
use std::time::Instant;

/// Execute the inspect command
///
/// **Public** - main entry point called from main.rs
///
/// # Arguments
/// * `args` - Inspect command arguments
///
/// # Returns
/// Ok if the trace decodes and all outputs are written
///
/// # Errors
/// * Trace decoding errors
/// * File write errors
pub fn execute_inspect(args: InspectArgs) -> Result<()> {
    let start_time = Instant::now();

    info!("Inspecting trace: {}", args.input.display());

    // Step 1: Decode
    info!("Step 1/3: Decoding trace...");
    let options = ReaderOptions::new()
        .gather_statistics(args.gather_statistics)
        .ordering_check(args.ordering_check);
    let progress = Progress::new();
    let trace = fill_trees_from_file(&progress, &args.input, &options)
        .with_context(|| format!("Failed to decode trace {}", args.input.display()))?;

    debug!(
        "Decoded {} nodes in {} threads",
        trace.blocks_count,
        trace.threads.len()
    );
    if trace.ordering_violations > 0 {
        warn!("{} ordering violations found", trace.ordering_violations);
    }

    // Step 2: Summary
    info!("Step 2/3: Summarizing {} threads...", trace.threads.len());
    let summary = build_summary(&trace, args.top_blocks);

    // Step 3: Outputs
    info!("Step 3/3: Writing output files...");
    if let Some(path) = &args.output_json {
        write_summary(&summary, path).context("Failed to write summary JSON")?;
        info!("✓ Summary written to: {}", path.display());
    }

    if let Some(path) = &args.output_stacks {
        let stacks = build_collapsed_stacks(&trace);
        write_collapsed_stacks(&stacks, path).context("Failed to write collapsed stacks")?;
        info!("✓ Collapsed stacks written to: {}", path.display());
    }

    if args.print_summary {
        println!("\n{}", "=".repeat(80));
        println!("TRACE SUMMARY");
        println!("{}", "=".repeat(80));
        println!("File: {}", args.input.display());
        println!("{}", format_text_summary(&summary));
        println!("{}", "=".repeat(80));
    }

    let elapsed = start_time.elapsed();
    info!("Inspection completed in {:.2}s", elapsed.as_secs_f64());

    Ok(())
}

/// Validate inspect arguments
///
/// **Public** - can be called before execute_inspect for early validation
pub fn validate_args(args: &InspectArgs) -> Result<()> {
    if args.input.as_os_str().is_empty() {
        anyhow::bail!("Input path cannot be empty");
    }

    if !args.input.is_file() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    if args.top_blocks == 0 {
        anyhow::bail!("top_blocks must be greater than 0");
    }

    if args.top_blocks > 1000 {
        anyhow::bail!("top_blocks is too large (max 1000)");
    }

    Ok(())
}
