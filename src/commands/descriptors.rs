//! Descriptors command implementation.
//!
//! Lists the block descriptors of a descriptor-only stream, or of a full
//! trace with `--full`.

use anyhow::{Context, Result};
use block_trace_studio::parser::DescriptorTable;
use block_trace_studio::progress::Progress;
use block_trace_studio::reader::{fill_trees_from_file, read_descriptions_from_stream, ReaderOptions};
use log::info;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Execute the descriptors command
///
/// **Public** - main entry point called from main.rs
///
/// # Arguments
/// * `input` - Descriptor stream, or trace file when `full` is set
/// * `full` - Decode `input` as a full trace
pub fn execute_descriptors(input: &Path, full: bool) -> Result<()> {
    let progress = Progress::new();

    let table = if full {
        let options = ReaderOptions::new().gather_statistics(false);
        fill_trees_from_file(&progress, input, &options)
            .with_context(|| format!("Failed to decode trace {}", input.display()))?
            .descriptors
    } else {
        let file = File::open(input)
            .with_context(|| format!("Failed to open {}", input.display()))?;
        read_descriptions_from_stream(&progress, &mut BufReader::new(file))
            .with_context(|| format!("Failed to read descriptors from {}", input.display()))?
    };

    info!("{} descriptors", table.len());
    println!("{}", format_descriptors(&table));

    Ok(())
}

/// Render the table one descriptor per line
///
/// **Private** - internal formatting
fn format_descriptors(table: &DescriptorTable) -> String {
    let mut lines = vec![format!(
        "{:>6}  {:<6} {:<3} {:<10} {:<32} LOCATION",
        "ID", "TYPE", "ON", "COLOR", "NAME"
    )];

    for id in 0..table.len() as u32 {
        match table.get(id) {
            Some(descriptor) => lines.push(format!(
                "{:>6}  {:<6} {:<3} {:#010x} {:<32} {}:{}",
                id,
                format!("{:?}", descriptor.block_type()),
                if descriptor.is_enabled() { "yes" } else { "no" },
                descriptor.color(),
                descriptor.name(),
                descriptor.file(),
                descriptor.line()
            )),
            None => lines.push(format!("{:>6}  (removed)", id)),
        }
    }

    lines.join("\n")
}
