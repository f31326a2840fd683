//! Trace decoding entry points.
//!
//! This module ties the pieces together:
//! - Header and descriptor table via [`crate::parser`]
//! - Per-thread groups into the shared arena and call trees
//! - Statistics and the parallel post-pass via [`crate::aggregator`]

pub mod options;
pub mod stream;
pub mod trace_data;

// Re-export main types and functions
pub use options::ReaderOptions;
pub use stream::{fill_trees_from_file, fill_trees_from_stream, read_descriptions_from_stream};
pub use trace_data::TraceData;
