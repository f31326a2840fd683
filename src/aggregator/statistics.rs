//! Shared call statistics.
//!
//! A [`StatisticsScope`] collects, per block id, the calls made inside one
//! scope (a thread, a parent node or a frame) together with the nodes that
//! made them. Once the scope is complete, [`StatisticsScope::finish`] freezes
//! each entry into one `Arc<BlockStatistics>` handed out to all of its nodes.

use crate::parser::BlockId;
use crate::tree::{BlockIndex, BlocksTree};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

/// Aggregate over every call of one block id within one scope
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockStatistics {
    /// Number of calls
    pub calls_number: u32,

    /// Sum of call durations (ns)
    pub total_duration: u64,

    pub min_duration: u64,
    pub max_duration: u64,

    /// Node of the first shortest call
    pub min_duration_block: BlockIndex,

    /// Node of the first longest call
    pub max_duration_block: BlockIndex,

    /// Node owning the scope; `None` for thread-level scopes
    pub parent_block: Option<BlockIndex>,
}

impl BlockStatistics {
    /// Statistics seeded with a single call
    pub fn new(duration: u64, block: BlockIndex, parent_block: Option<BlockIndex>) -> Self {
        Self {
            calls_number: 1,
            total_duration: duration,
            min_duration: duration,
            max_duration: duration,
            min_duration_block: block,
            max_duration_block: block,
            parent_block,
        }
    }

    /// Account one more call
    pub fn record(&mut self, duration: u64, block: BlockIndex) {
        self.calls_number = self.calls_number.saturating_add(1);
        self.total_duration = self.total_duration.saturating_add(duration);

        if duration > self.max_duration {
            self.max_duration = duration;
            self.max_duration_block = block;
        }

        if duration < self.min_duration {
            self.min_duration = duration;
            self.min_duration_block = block;
        }
    }

    pub fn average_duration(&self) -> u64 {
        self.total_duration / u64::from(self.calls_number.max(1))
    }
}

/// Which statistics reference of a node a scope fills
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsSlot {
    PerThread,
    PerParent,
    PerFrame,
}

/// Statistics handed to a node once its scope is complete
pub type StatsAssignment = (BlockIndex, Arc<BlockStatistics>);

#[derive(Debug)]
struct ScopeEntry {
    stats: BlockStatistics,
    members: Vec<BlockIndex>,
}

/// Statistics under construction for one scope
#[derive(Debug, Default)]
pub struct StatisticsScope {
    parent: Option<BlockIndex>,
    entries: HashMap<BlockId, ScopeEntry>,
}

impl StatisticsScope {
    pub fn new(parent: Option<BlockIndex>) -> Self {
        Self {
            parent,
            entries: HashMap::new(),
        }
    }

    /// Account a call of `id` made by node `block`
    pub fn update(&mut self, id: BlockId, block: BlockIndex, duration: u64) {
        match self.entries.get_mut(&id) {
            Some(entry) => {
                entry.stats.record(duration, block);
                entry.members.push(block);
            }
            None => {
                self.entries.insert(
                    id,
                    ScopeEntry {
                        stats: BlockStatistics::new(duration, block, self.parent),
                        members: vec![block],
                    },
                );
            }
        }
    }

    pub fn get(&self, id: BlockId) -> Option<&BlockStatistics> {
        self.entries.get(&id).map(|entry| &entry.stats)
    }

    /// Number of distinct block ids seen
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Freeze every entry and pair it with the nodes that share it
    pub fn finish(self) -> Vec<StatsAssignment> {
        let mut assignments = Vec::new();
        for entry in self.entries.into_values() {
            let shared = Arc::new(entry.stats);
            assignments.extend(
                entry
                    .members
                    .into_iter()
                    .map(|member| (member, Arc::clone(&shared))),
            );
        }
        assignments
    }
}

/// Store finished statistics into the nodes' `slot`
///
/// Each node receives at most one statistics object per slot.
pub fn apply_statistics(
    blocks: &mut [BlocksTree],
    slot: StatsSlot,
    assignments: Vec<StatsAssignment>,
) {
    for (index, stats) in assignments {
        let target = blocks[index as usize].stats_mut(slot);
        debug_assert!(
            target.is_none(),
            "node {} already has {:?} statistics",
            index,
            slot
        );
        *target = Some(stats);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_rule() {
        let mut scope = StatisticsScope::new(None);
        scope.update(7, 0, 10);
        scope.update(7, 1, 30);

        let stats = scope.get(7).unwrap();
        assert_eq!(stats.calls_number, 2);
        assert_eq!(stats.total_duration, 40);
        assert_eq!(stats.min_duration, 10);
        assert_eq!(stats.max_duration, 30);
        assert_eq!(stats.min_duration_block, 0);
        assert_eq!(stats.max_duration_block, 1);
        assert_eq!(stats.average_duration(), 20);
    }

    #[test]
    fn test_ties_keep_first_node() {
        let mut scope = StatisticsScope::new(Some(4));
        scope.update(1, 10, 5);
        scope.update(1, 11, 5);

        let stats = scope.get(1).unwrap();
        assert_eq!(stats.min_duration_block, 10);
        assert_eq!(stats.max_duration_block, 10);
        assert_eq!(stats.parent_block, Some(4));
    }

    #[test]
    fn test_finish_shares_one_allocation() {
        let mut scope = StatisticsScope::new(None);
        scope.update(1, 0, 3);
        scope.update(1, 1, 4);
        scope.update(2, 2, 9);

        let assignments = scope.finish();
        assert_eq!(assignments.len(), 3);

        let shared: Vec<_> = assignments.iter().filter(|(_, s)| s.calls_number == 2).collect();
        assert_eq!(shared.len(), 2);
        assert!(Arc::ptr_eq(&shared[0].1, &shared[1].1));
        assert_eq!(Arc::strong_count(&shared[0].1), 2);
    }

    #[test]
    fn test_apply_statistics() {
        let mut store = crate::storage::ByteStore::new();
        let mut blocks = vec![BlocksTree::new(store.push(&[0u8; 20])), BlocksTree::new(store.push(&[0u8; 20]))];

        let mut scope = StatisticsScope::new(None);
        scope.update(0, 0, 1);
        scope.update(0, 1, 2);
        apply_statistics(&mut blocks, StatsSlot::PerFrame, scope.finish());

        let first = blocks[0].per_frame_stats.as_ref().unwrap();
        assert_eq!(first.calls_number, 2);
        assert!(blocks[0].per_thread_stats.is_none());
        // Two nodes share one object; the strong count is not the call count
        assert_eq!(Arc::strong_count(first), 2);
    }
}
