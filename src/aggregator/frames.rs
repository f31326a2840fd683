//! Post-pass over finished call trees.
//!
//! Once every thread is decoded the trees no longer change, so each thread
//! is walked on its own worker: frame depth, active time, per-frame
//! statistics and the per-parent statistics of top-level frames. Workers only
//! read the arena; their results are written back by the calling thread.

use super::statistics::{apply_statistics, StatisticsScope, StatsAssignment, StatsSlot};
use crate::progress::{phase_value, Progress};
use crate::storage::ByteStore;
use crate::tree::{BlockIndex, BlocksTree, BlocksTreeRoot, ThreadId};
use crate::utils::config::{PROGRESS_BLOCKS_END, PROGRESS_DONE};
use crate::utils::error::ReadError;
use log::debug;
use std::collections::BTreeMap;
use std::thread;

/// Result of walking one thread
#[derive(Debug, Default)]
pub struct FramePass {
    pub depth: u16,
    pub active_time: u64,
    pub per_parent: Vec<StatsAssignment>,
    pub per_frame: Vec<StatsAssignment>,
}

/// Walk the frames of one thread.
///
/// Statistics are only collected when `gather_statistics` is set.
///
/// # Errors
/// * `ReadError::Interrupted` - progress was cancelled between frames
pub fn walk_thread(
    blocks: &[BlocksTree],
    store: &ByteStore,
    root: &BlocksTreeRoot,
    gather_statistics: bool,
    progress: &Progress,
) -> Result<FramePass, ReadError> {
    let mut pass = FramePass::default();
    let mut frame_parents = StatisticsScope::new(None);
    let mut stack: Vec<BlockIndex> = Vec::new();

    for &frame in &root.children {
        progress.check()?;

        let node = &blocks[frame as usize];
        let block = node.block(store);
        pass.depth = pass.depth.max(node.depth);
        pass.active_time = pass.active_time.saturating_add(block.duration());

        if !gather_statistics {
            continue;
        }

        frame_parents.update(block.id(), frame, block.duration());

        let mut scope = StatisticsScope::new(Some(frame));
        stack.push(frame);
        while let Some(index) = stack.pop() {
            let current = &blocks[index as usize];
            let block = current.block(store);
            scope.update(block.id(), index, block.duration());
            stack.extend(current.children.iter().rev());
        }
        pass.per_frame.extend(scope.finish());
    }

    if gather_statistics {
        pass.per_parent = frame_parents.finish();
    }
    Ok(pass)
}

/// Run [`walk_thread`] for every thread in parallel and store the results.
///
/// Progress moves from the end of the block phase to 100 as workers are
/// joined, in thread order.
///
/// # Errors
/// * `ReadError::Interrupted` - progress was cancelled
pub fn gather_frame_statistics(
    blocks: &mut [BlocksTree],
    store: &ByteStore,
    threads: &mut BTreeMap<ThreadId, BlocksTreeRoot>,
    gather_statistics: bool,
    progress: &Progress,
) -> Result<(), ReadError> {
    let total = threads.len() as u64;
    debug!("Post-pass over {} threads", total);

    let shared: &[BlocksTree] = blocks;
    let roots: &BTreeMap<ThreadId, BlocksTreeRoot> = threads;

    let passes = thread::scope(|s| -> Result<Vec<FramePass>, ReadError> {
        let handles: Vec<_> = roots
            .values()
            .map(|root| s.spawn(move || walk_thread(shared, store, root, gather_statistics, progress)))
            .collect();

        let mut passes = Vec::with_capacity(handles.len());
        for (joined, handle) in handles.into_iter().enumerate() {
            let pass = match handle.join() {
                Ok(pass) => pass?,
                Err(payload) => std::panic::resume_unwind(payload),
            };
            progress.advance(phase_value(
                PROGRESS_BLOCKS_END,
                PROGRESS_DONE,
                joined as u64 + 1,
                total,
            ))?;
            passes.push(pass);
        }
        Ok(passes)
    })?;

    for (root, pass) in threads.values_mut().zip(passes) {
        root.depth = pass.depth;
        root.active_time = pass.active_time;
        apply_statistics(blocks, StatsSlot::PerParent, pass.per_parent);
        apply_statistics(blocks, StatsSlot::PerFrame, pass.per_frame);
    }

    progress.advance(PROGRESS_DONE)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn record(begin: u64, end: u64, id: u32) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&begin.to_le_bytes());
        bytes.extend_from_slice(&end.to_le_bytes());
        bytes.extend_from_slice(&id.to_le_bytes());
        bytes
    }

    /// Two frames of id 0, each with two children of id 1
    fn two_frames() -> (ByteStore, Vec<BlocksTree>, BTreeMap<ThreadId, BlocksTreeRoot>) {
        let mut store = ByteStore::new();
        let spans = [(0, 2, 1), (3, 5, 1), (0, 10, 0), (10, 11, 1), (12, 16, 1), (10, 20, 0)];
        let mut blocks: Vec<BlocksTree> = spans
            .iter()
            .map(|&(b, e, id)| BlocksTree::new(store.push(&record(b, e, id))))
            .collect();
        blocks[2].children = vec![0, 1];
        blocks[2].depth = 2;
        blocks[5].children = vec![3, 4];
        blocks[5].depth = 2;

        let mut root = BlocksTreeRoot::new(9);
        root.children = vec![2, 5];
        let mut threads = BTreeMap::new();
        threads.insert(9, root);
        (store, blocks, threads)
    }

    #[test]
    fn test_frame_statistics() {
        let (store, mut blocks, mut threads) = two_frames();
        let progress = Progress::new();
        gather_frame_statistics(&mut blocks, &store, &mut threads, true, &progress).unwrap();

        let root = &threads[&9];
        assert_eq!(root.depth, 2);
        assert_eq!(root.active_time, 20);
        assert_eq!(progress.value(), 100);

        // Children of the second frame only see that frame
        let stats = blocks[3].per_frame_stats.as_ref().unwrap();
        assert_eq!(stats.calls_number, 2);
        assert_eq!(stats.total_duration, 5);
        assert_eq!(stats.parent_block, Some(5));
        assert!(Arc::ptr_eq(stats, blocks[4].per_frame_stats.as_ref().unwrap()));

        // The frame counts itself
        let frame = blocks[5].per_frame_stats.as_ref().unwrap();
        assert_eq!(frame.calls_number, 1);

        // Frames share thread-scoped per-parent statistics
        let frames = blocks[2].per_parent_stats.as_ref().unwrap();
        assert_eq!(frames.calls_number, 2);
        assert_eq!(frames.parent_block, None);
        assert!(blocks[0].per_parent_stats.is_none());
    }

    #[test]
    fn test_without_statistics() {
        let (store, mut blocks, mut threads) = two_frames();
        gather_frame_statistics(&mut blocks, &store, &mut threads, false, &Progress::new()).unwrap();

        assert_eq!(threads[&9].depth, 2);
        assert!(blocks.iter().all(|b| b.per_frame_stats.is_none()));
    }

    #[test]
    fn test_cancelled_post_pass() {
        let (store, mut blocks, mut threads) = two_frames();
        let progress = Progress::new();
        progress.cancel();
        let result = gather_frame_statistics(&mut blocks, &store, &mut threads, true, &progress);
        assert!(matches!(result, Err(ReadError::Interrupted)));
    }
}
