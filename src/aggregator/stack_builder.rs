//! Build collapsed stacks from decoded call trees.
//!
//! Collapsed stacks are the input format of external flamegraph tools.
//! Format: "thread;frame;child;leaf weight"
//!
//! Example: "render;Frame;DrawScene;Upload 1200"
//! This means: Upload ran under DrawScene under Frame on the render thread,
//! spending 1200 ns in itself (children excluded).

use crate::reader::TraceData;
use crate::tree::BlockIndex;
use log::debug;
use std::collections::HashMap;

/// A single collapsed stack entry
///
/// **Public** - written out by the `inspect --stacks` command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollapsedStack {
    /// Stack trace as semicolon-separated string
    pub stack: String,

    /// Weight (self time in ns)
    pub weight: u64,
}

impl CollapsedStack {
    /// Create a new collapsed stack
    ///
    /// **Public** - constructor
    pub fn new(stack: String, weight: u64) -> Self {
        Self { stack, weight }
    }

    /// Render as one line of the collapsed format
    pub fn to_line(&self) -> String {
        format!("{} {}", self.stack, self.weight)
    }
}

/// Build collapsed stacks from decoded trace data
///
/// **Public** - main entry point for stack building
///
/// # Arguments
/// * `trace` - Decoded capture
///
/// # Returns
/// Vector of collapsed stacks, one per unique path, heaviest first
///
/// # Algorithm
/// 1. Walk every frame of every thread depth-first
/// 2. Keep the path of names from the thread down to the current node
/// 3. Weight each node with its duration minus its children's
/// 4. Aggregate by unique path (sum weights)
pub fn build_collapsed_stacks(trace: &TraceData) -> Vec<CollapsedStack> {
    debug!("Building collapsed stacks from {} threads", trace.threads.len());

    // Map to aggregate stacks: stack_string -> total_weight
    let mut stack_map: HashMap<String, u64> = HashMap::new();

    for root in trace.threads.values() {
        let thread = frame_name(&root.label());

        // (node, path length before the node was pushed)
        let mut pending: Vec<(BlockIndex, usize)> =
            root.children.iter().rev().map(|&frame| (frame, 0)).collect();
        let mut path: Vec<String> = Vec::new();

        while let Some((index, depth)) = pending.pop() {
            path.truncate(depth);
            path.push(frame_name(&trace.block_name(index)));

            let node = trace.node(index);
            let children_duration: u64 = node
                .children
                .iter()
                .map(|&child| trace.block(child).duration())
                .sum();
            let self_time = trace.block(index).duration().saturating_sub(children_duration);

            let stack_str = format!("{};{}", thread, path.join(";"));
            let weight = stack_map.entry(stack_str).or_insert(0);
            *weight = weight.saturating_add(self_time);

            pending.extend(node.children.iter().rev().map(|&child| (child, depth + 1)));
        }
    }

    // Convert map to vector and sort by weight (descending)
    let mut stacks: Vec<CollapsedStack> = stack_map
        .into_iter()
        .map(|(stack, weight)| CollapsedStack::new(stack, weight))
        .collect();

    stacks.sort_by(|a, b| b.weight.cmp(&a.weight).then_with(|| a.stack.cmp(&b.stack)));

    debug!("Built {} unique collapsed stacks", stacks.len());

    stacks
}

/// Names may not contain the frame separator
fn frame_name(name: &str) -> String {
    if name.is_empty() {
        return "unnamed".to_string();
    }
    name.replace(';', ":")
}
