//! Serializable summary of a decoded capture.
//!
//! The summary is what `block-trace inspect --output` writes: capture
//! metadata plus, for every thread, its shape and the blocks that took the
//! most time according to the per-thread statistics.

use crate::reader::TraceData;
use crate::tree::{BlocksTreeRoot, ThreadId};
use crate::utils::config::{version_string, SCHEMA_VERSION};
use chrono::Utc;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

/// Top-level summary document
///
/// **Public** - serialized by `output::json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceSummary {
    /// Summary schema version
    pub version: String,

    /// Trace format version of the input file
    pub format_version: String,

    pub cpu_frequency: i64,

    /// Capture window (ns)
    pub capture_begin: u64,
    pub capture_end: u64,

    /// Number of arena entries (blocks and context switches)
    pub blocks_count: usize,

    /// Descriptors, runtime-name aliases included
    pub descriptors_count: usize,

    /// Ordering violations reported while decoding
    pub ordering_violations: u64,

    pub threads: Vec<ThreadSummary>,

    /// ISO 8601 timestamp
    pub generated_at: String,
}

/// Shape and hot blocks of one thread
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadSummary {
    pub thread_id: ThreadId,
    pub name: Option<String>,

    /// Top-level frames
    pub frames: usize,

    /// Nodes reachable from the frames
    pub blocks: usize,

    pub events: usize,
    pub context_switches: usize,
    pub depth: u16,

    /// Sum of frame durations (ns)
    pub active_time: u64,

    /// Heaviest blocks by total duration
    pub top_blocks: Vec<BlockSummary>,
}

/// Per-thread statistics of one block id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockSummary {
    pub name: String,
    pub calls: u32,
    pub total_duration: u64,
    pub min_duration: u64,
    pub max_duration: u64,
    pub average_duration: u64,

    /// Share of the thread's active time
    pub percentage: f64,
}

/// Build the summary of a decoded capture
///
/// **Public** - main entry point for summaries
///
/// # Arguments
/// * `trace` - Decoded capture
/// * `top_n` - Number of blocks listed per thread
pub fn build_summary(trace: &TraceData, top_n: usize) -> TraceSummary {
    let threads = trace
        .threads
        .values()
        .map(|root| summarize_thread(trace, root, top_n))
        .collect();

    TraceSummary {
        version: SCHEMA_VERSION.to_string(),
        format_version: version_string(trace.header.version),
        cpu_frequency: trace.header.cpu_frequency,
        capture_begin: trace.header.begin_time,
        capture_end: trace.header.end_time,
        blocks_count: trace.blocks_count,
        descriptors_count: trace.descriptors.len(),
        ordering_violations: trace.ordering_violations,
        threads,
        generated_at: Utc::now().to_rfc3339(),
    }
}

fn summarize_thread(trace: &TraceData, root: &BlocksTreeRoot, top_n: usize) -> ThreadSummary {
    let mut blocks = 0usize;
    let mut seen = HashSet::new();
    let mut top_blocks = Vec::new();

    let mut pending: Vec<_> = root.children.clone();
    while let Some(index) = pending.pop() {
        blocks += 1;
        let node = trace.node(index);
        pending.extend_from_slice(&node.children);

        // One entry per shared statistics object
        if let Some(stats) = &node.per_thread_stats {
            if seen.insert(Arc::as_ptr(stats)) {
                top_blocks.push(BlockSummary {
                    name: trace.block_name(index).into_owned(),
                    calls: stats.calls_number,
                    total_duration: stats.total_duration,
                    min_duration: stats.min_duration,
                    max_duration: stats.max_duration,
                    average_duration: stats.average_duration(),
                    percentage: percentage(stats.total_duration, root.active_time),
                });
            }
        }
    }

    top_blocks.sort_by(|a, b| {
        b.total_duration
            .cmp(&a.total_duration)
            .then_with(|| a.name.cmp(&b.name))
    });
    top_blocks.truncate(top_n);

    debug!("Thread {}: {} nodes, {} listed", root.thread_id, blocks, top_blocks.len());

    ThreadSummary {
        thread_id: root.thread_id,
        name: root.thread_name.clone(),
        frames: root.children.len(),
        blocks,
        events: root.events.len(),
        context_switches: root.sync.len(),
        depth: root.depth,
        active_time: root.active_time,
        top_blocks,
    }
}

fn percentage(part: u64, total: u64) -> f64 {
    if total > 0 {
        (part as f64 / total as f64) * 100.0
    } else {
        0.0
    }
}

/// Render a summary as plain text
///
/// **Public** - used by `inspect --summary`
pub fn format_text_summary(summary: &TraceSummary) -> String {
    let mut lines = Vec::new();

    lines.push(format!(
        "Capture: {} ns, {} nodes, {} descriptors (format v{})",
        summary.capture_end.saturating_sub(summary.capture_begin),
        summary.blocks_count,
        summary.descriptors_count,
        summary.format_version
    ));
    if summary.ordering_violations > 0 {
        lines.push(format!("Ordering violations: {}", summary.ordering_violations));
    }

    for thread in &summary.threads {
        lines.push(String::new());
        lines.push(format!(
            "Thread {} {}: {} frames, {} blocks, depth {}, active {} ns",
            thread.thread_id,
            thread.name.as_deref().unwrap_or("(unnamed)"),
            thread.frames,
            thread.blocks,
            thread.depth,
            thread.active_time
        ));

        if thread.top_blocks.is_empty() {
            continue;
        }

        lines.push(format!(
            "  {:<32} {:>8} {:>14} {:>12} {:>12} {:>7}",
            "BLOCK", "CALLS", "TOTAL ns", "MIN ns", "MAX ns", "%"
        ));
        for block in &thread.top_blocks {
            // Truncate name if too long for display
            let len = block.name.chars().count();
            let name = if len > 32 {
                let tail: String = block.name.chars().skip(len - 29).collect();
                format!("...{}", tail)
            } else {
                block.name.clone()
            };
            lines.push(format!(
                "  {:<32} {:>8} {:>14} {:>12} {:>12} {:>6.1}%",
                name,
                block.calls,
                block.total_duration,
                block.min_duration,
                block.max_duration,
                block.percentage
            ));
        }
    }

    lines.join("\n")
}
