//! Interval nesting over completion-ordered blocks.
//!
//! When a block arrives, every block of its thread that it encloses has
//! already been written and sits at the end of the root's top-level list.
//! Inserting the new block therefore means cutting that trailing run off
//! the list and making it the new block's children.

use super::node::{BlockIndex, BlocksTree, BlocksTreeRoot};
use crate::storage::ByteStore;
use crate::utils::error::ReadError;
use log::warn;
use serde::{Deserialize, Serialize};

/// How strictly the writer's completion ordering is verified
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderingCheck {
    /// Trust the writer
    #[default]
    Off,
    /// Log and count violations, keep decoding
    Warn,
    /// Abort the decode on the first violation
    Reject,
}

/// Inserts blocks into a thread's call tree
///
/// **Public** - used by the reader for every decoded block
#[derive(Debug, Default)]
pub struct TreeBuilder {
    check: OrderingCheck,
    violations: u64,
}

impl TreeBuilder {
    pub fn new(check: OrderingCheck) -> Self {
        Self {
            check,
            violations: 0,
        }
    }

    /// Number of ordering violations seen under [`OrderingCheck::Warn`]
    pub fn violations(&self) -> u64 {
        self.violations
    }

    /// Attach the block at `index` to `root`.
    ///
    /// The node must already be in `blocks` with no children. Blocks it
    /// encloses are moved from the root's top-level list into its children
    /// and its depth is updated.
    ///
    /// # Errors
    /// * `ReadError::OrderingViolation` - only under [`OrderingCheck::Reject`]
    pub fn insert(
        &mut self,
        blocks: &mut [BlocksTree],
        store: &ByteStore,
        root: &mut BlocksTreeRoot,
        index: BlockIndex,
    ) -> Result<(), ReadError> {
        let new_block = blocks[index as usize].block(store);
        let (begin, end) = (new_block.begin(), new_block.end());

        let Some(&last) = root.children.last() else {
            root.children.push(index);
            return Ok(());
        };

        if begin >= blocks[last as usize].block(store).end() {
            root.children.push(index);
            return Ok(());
        }

        // The last sibling ends after `begin`, so it is ours in any case.
        let mut cut = root.children.len() - 1;
        while cut > 0 {
            let sibling = root.children[cut - 1];
            if blocks[sibling as usize].block(store).begin() < begin {
                break;
            }
            cut -= 1;
        }

        let children: Vec<BlockIndex> = root.children.drain(cut..).collect();

        let mut max_depth = 0u16;
        let mut children_duration = 0u64;
        let mut violation = None;
        for &child in &children {
            let node = &blocks[child as usize];
            let block = node.block(store);
            max_depth = max_depth.max(node.depth);
            children_duration = children_duration.saturating_add(block.duration());

            if violation.is_none() && (block.begin() < begin || block.end() > end) {
                violation = Some(format!(
                    "child {} [{}, {}] is outside [{}, {}]",
                    child,
                    block.begin(),
                    block.end(),
                    begin,
                    end
                ));
            }
        }

        if violation.is_none() && children_duration > new_block.duration() {
            violation = Some(format!(
                "children last {} ns, longer than the block's {} ns",
                children_duration,
                new_block.duration()
            ));
        }

        if violation.is_none() {
            if let Some(&previous) = root.children.last() {
                let previous_end = blocks[previous as usize].block(store).end();
                if previous_end > begin {
                    violation = Some(format!(
                        "previous sibling {} ends at {}, after begin {}",
                        previous, previous_end, begin
                    ));
                }
            }
        }

        if let Some(reason) = violation {
            self.report(root.thread_id, index, reason)?;
        }

        let node = &mut blocks[index as usize];
        node.depth = max_depth.saturating_add(1);
        node.children = children;
        root.children.push(index);
        Ok(())
    }

    fn report(&mut self, thread_id: u64, index: BlockIndex, reason: String) -> Result<(), ReadError> {
        match self.check {
            OrderingCheck::Off => Ok(()),
            OrderingCheck::Warn => {
                warn!(
                    "Block order violation at node {} in thread {}: {}",
                    index, thread_id, reason
                );
                self.violations += 1;
                Ok(())
            }
            OrderingCheck::Reject => Err(ReadError::OrderingViolation {
                thread_id,
                index,
                reason,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Arena of `(begin, end)` blocks, all id 0
    fn arena(spans: &[(u64, u64)]) -> (ByteStore, Vec<BlocksTree>) {
        let mut store = ByteStore::new();
        let blocks = spans
            .iter()
            .map(|&(begin, end)| {
                let mut bytes = Vec::new();
                bytes.extend_from_slice(&begin.to_le_bytes());
                bytes.extend_from_slice(&end.to_le_bytes());
                bytes.extend_from_slice(&0u32.to_le_bytes());
                BlocksTree::new(store.push(&bytes))
            })
            .collect();
        (store, blocks)
    }

    fn build(spans: &[(u64, u64)], check: OrderingCheck) -> (Vec<BlocksTree>, BlocksTreeRoot, Result<(), ReadError>, u64) {
        let (store, mut blocks) = arena(spans);
        let mut root = BlocksTreeRoot::new(1);
        let mut builder = TreeBuilder::new(check);
        let mut result = Ok(());
        for index in 0..spans.len() as BlockIndex {
            result = builder.insert(&mut blocks, &store, &mut root, index);
            if result.is_err() {
                break;
            }
        }
        (blocks, root, result, builder.violations())
    }

    #[test]
    fn test_flat_siblings() {
        let (blocks, root, result, _) = build(&[(0, 10), (10, 20), (20, 30)], OrderingCheck::Reject);
        result.unwrap();
        assert_eq!(root.children, vec![0, 1, 2]);
        assert!(blocks.iter().all(|b| b.depth == 1 && b.children.is_empty()));
    }

    #[test]
    fn test_parent_after_child() {
        let (blocks, root, result, _) = build(&[(5, 15), (0, 30)], OrderingCheck::Reject);
        result.unwrap();
        assert_eq!(root.children, vec![1]);
        assert_eq!(blocks[1].children, vec![0]);
        assert_eq!(blocks[1].depth, 2);
        assert_eq!(blocks[0].depth, 1);
    }

    #[test]
    fn test_adopts_trailing_run_only() {
        // Frame 0 stays a sibling; 1, 2 and the nested 3 go under 4.
        let spans = [(0, 5), (10, 12), (13, 15), (12, 16), (10, 20)];
        let (blocks, root, result, _) = build(&spans, OrderingCheck::Reject);
        result.unwrap();

        assert_eq!(root.children, vec![0, 4]);
        assert_eq!(blocks[3].children, vec![2]);
        assert_eq!(blocks[4].children, vec![1, 3]);
        assert_eq!(blocks[4].depth, 3);
    }

    #[test]
    fn test_last_sibling_always_moved() {
        // Sibling begins before the new block: still adopted, flagged under Warn.
        let (blocks, root, result, violations) = build(&[(0, 10), (5, 20)], OrderingCheck::Warn);
        result.unwrap();
        assert_eq!(root.children, vec![1]);
        assert_eq!(blocks[1].children, vec![0]);
        assert_eq!(violations, 1);
    }

    #[test]
    fn test_reject_overlapping_sibling() {
        // 1 is adopted by 2 but 0 ends after 2 begins.
        let (_, _, result, _) = build(&[(0, 10), (12, 14), (8, 20)], OrderingCheck::Reject);
        assert!(matches!(
            result,
            Err(ReadError::OrderingViolation { index: 2, .. })
        ));
    }

    #[test]
    fn test_off_ignores_violations() {
        let (blocks, root, result, violations) = build(&[(0, 10), (5, 20)], OrderingCheck::Off);
        result.unwrap();
        assert_eq!(violations, 0);
        assert_eq!(root.children, vec![1]);
        assert_eq!(blocks[1].depth, 2);
    }
}
