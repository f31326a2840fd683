//! Block Trace Studio
//!
//! Decoding of binary block trace captures into per-thread call trees with
//! shared call statistics.
//!
//! This crate provides the core implementation for the
//! `block-trace` CLI tool.
//!
//! ## Getting Started
//!
//! ```no_run
//! use block_trace_studio::progress::Progress;
//! use block_trace_studio::reader::{fill_trees_from_file, ReaderOptions};
//!
//! let progress = Progress::new();
//! let trace = fill_trees_from_file(&progress, "capture.prof", &ReaderOptions::default())?;
//! for root in trace.threads.values() {
//!     println!("{}: {} frames", root.label(), root.children.len());
//! }
//! # Ok::<(), block_trace_studio::utils::ReadError>(())
//! ```

pub mod aggregator;
pub mod output;
pub mod parser;
pub mod progress;
pub mod reader;
pub mod storage;
pub mod tree;
pub mod utils;
