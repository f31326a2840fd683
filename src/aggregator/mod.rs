//! Aggregation of decoded call trees into statistics and collapsed stacks.
//!
//! This module provides:
//! - Shared per-thread, per-parent and per-frame call statistics
//! - The parallel post-pass over finished trees
//! - Collapsed stack export (for external flamegraph tools)

pub mod frames;
pub mod stack_builder;
pub mod statistics;

// Re-export main types and functions
pub use frames::{gather_frame_statistics, walk_thread, FramePass};
pub use stack_builder::{build_collapsed_stacks, CollapsedStack};
pub use statistics::{apply_statistics, BlockStatistics, StatisticsScope, StatsAssignment, StatsSlot};
