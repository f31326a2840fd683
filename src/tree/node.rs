//! Arena node types shared by every thread of a capture.

use crate::aggregator::statistics::{BlockStatistics, StatsSlot};
use crate::parser::SerializedBlock;
use crate::storage::{ByteStore, RecordRef};
use serde::Serialize;
use std::sync::Arc;

/// Position of a node in the shared arena
pub type BlockIndex = u32;

/// Thread id as written by the instrumentation library
pub type ThreadId = u64;

/// One decoded block (or context switch) and its place in the call tree
#[derive(Debug, Clone)]
pub struct BlocksTree {
    /// Record bytes in the capture's [`ByteStore`]
    pub node: RecordRef,

    /// Direct children, in begin order
    pub children: Vec<BlockIndex>,

    /// Subtree depth; a leaf has depth 1
    pub depth: u16,

    /// Statistics over all blocks with this id in the thread
    pub per_thread_stats: Option<Arc<BlockStatistics>>,

    /// Statistics over siblings with this id under the same parent
    pub per_parent_stats: Option<Arc<BlockStatistics>>,

    /// Statistics over blocks with this id in the same frame
    pub per_frame_stats: Option<Arc<BlockStatistics>>,
}

impl BlocksTree {
    pub fn new(node: RecordRef) -> Self {
        Self {
            node,
            children: Vec::new(),
            depth: 1,
            per_thread_stats: None,
            per_parent_stats: None,
            per_frame_stats: None,
        }
    }

    /// Decoded view of the record behind this node
    pub fn block<'s>(&self, store: &'s ByteStore) -> SerializedBlock<'s> {
        SerializedBlock::new(store.bytes(self.node))
    }

    pub fn stats(&self, slot: StatsSlot) -> Option<&Arc<BlockStatistics>> {
        match slot {
            StatsSlot::PerThread => self.per_thread_stats.as_ref(),
            StatsSlot::PerParent => self.per_parent_stats.as_ref(),
            StatsSlot::PerFrame => self.per_frame_stats.as_ref(),
        }
    }

    pub(crate) fn stats_mut(&mut self, slot: StatsSlot) -> &mut Option<Arc<BlockStatistics>> {
        match slot {
            StatsSlot::PerThread => &mut self.per_thread_stats,
            StatsSlot::PerParent => &mut self.per_parent_stats,
            StatsSlot::PerFrame => &mut self.per_frame_stats,
        }
    }
}

/// Per-thread entry point into the arena
#[derive(Debug, Clone, Default, Serialize)]
pub struct BlocksTreeRoot {
    pub thread_id: ThreadId,

    /// Name announced by the thread, if any
    pub thread_name: Option<String>,

    /// Top-level blocks (frames), in begin order
    pub children: Vec<BlockIndex>,

    /// Context switch records
    pub sync: Vec<BlockIndex>,

    /// Nodes whose descriptor is an event
    pub events: Vec<BlockIndex>,

    /// Deepest frame
    pub depth: u16,

    /// Sum of frame durations (ns)
    pub active_time: u64,
}

impl BlocksTreeRoot {
    pub fn new(thread_id: ThreadId) -> Self {
        Self {
            thread_id,
            ..Self::default()
        }
    }

    /// Display label: the thread name, or the id when unnamed
    pub fn label(&self) -> String {
        match &self.thread_name {
            Some(name) => name.clone(),
            None => format!("Thread {}", self.thread_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_node_is_leaf() {
        let mut store = ByteStore::new();
        let record = store.push(&[0u8; 20]);
        let node = BlocksTree::new(record);

        assert_eq!(node.depth, 1);
        assert!(node.children.is_empty());
        assert!(node.stats(StatsSlot::PerThread).is_none());
        assert_eq!(node.block(&store).duration(), 0);
    }

    #[test]
    fn test_root_label() {
        let mut root = BlocksTreeRoot::new(12);
        assert_eq!(root.label(), "Thread 12");
        root.thread_name = Some("render".to_string());
        assert_eq!(root.label(), "render");
    }
}
