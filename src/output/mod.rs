//! Output writers for decoded captures.
//!
//! This module handles writing data to disk in various formats:
//! - JSON summaries (pretty)
//! - Collapsed stacks
//! - Text summaries

pub mod json;
pub mod stacks;
pub mod summary;

use crate::utils::error::OutputError;
use log::debug;
use std::fs::File;
use std::path::Path;

// Re-export main functions
pub use json::{read_summary, summary_to_string, write_summary};
pub use stacks::{write_collapsed_stacks, write_stacks_to};
pub use summary::{build_summary, format_text_summary, BlockSummary, ThreadSummary, TraceSummary};

/// Validate that output path is writable
///
/// **Private** - internal validation
fn validate_output_path(path: &Path) -> Result<(), OutputError> {
    if path.as_os_str().is_empty() {
        return Err(OutputError::InvalidPath("Path is empty".to_string()));
    }

    // Check if we're trying to overwrite a directory
    if path.is_dir() {
        return Err(OutputError::InvalidPath(format!(
            "Path is a directory: {}",
            path.display()
        )));
    }

    Ok(())
}

/// Validate `path`, create its parent directories and open it for writing
fn create_output_file(path: &Path) -> Result<File, OutputError> {
    validate_output_path(path)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            debug!("Creating parent directories: {}", parent.display());
            std::fs::create_dir_all(parent).map_err(|e| {
                OutputError::InvalidPath(format!(
                    "Cannot create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }

    File::create(path).map_err(OutputError::WriteFailed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_output_path_empty() {
        let result = validate_output_path(Path::new(""));
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_output_path_directory() {
        // Try to write to a directory path
        let temp_dir = tempfile::tempdir().unwrap();
        let result = validate_output_path(temp_dir.path());
        assert!(result.is_err());
    }
}
