//! Collapsed stack output writer.
//!
//! Writes one `stack weight` line per collapsed stack, the input format of
//! external flamegraph tools.

use crate::aggregator::CollapsedStack;
use crate::utils::error::OutputError;
use log::info;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Write collapsed stacks to a file
///
/// **Public** - main entry point for stack output
///
/// # Arguments
/// * `stacks` - Stacks from `build_collapsed_stacks`
/// * `output_path` - Path to output file
///
/// # Errors
/// * `OutputError::WriteFailed` - I/O error during write
/// * `OutputError::InvalidPath` - Path is invalid
pub fn write_collapsed_stacks(
    stacks: &[CollapsedStack],
    output_path: impl AsRef<Path>,
) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();

    info!("Writing collapsed stacks to: {}", output_path.display());

    let file = super::create_output_file(output_path)?;
    let mut writer = BufWriter::new(file);
    write_stacks_to(&mut writer, stacks)?;
    writer.flush().map_err(OutputError::WriteFailed)?;

    info!("{} stacks written successfully", stacks.len());

    Ok(())
}

/// Write collapsed stacks to any writer
pub fn write_stacks_to<W: Write>(writer: &mut W, stacks: &[CollapsedStack]) -> Result<(), OutputError> {
    for stack in stacks {
        writeln!(writer, "{}", stack.to_line()).map_err(OutputError::WriteFailed)?;
    }
    Ok(())
}
