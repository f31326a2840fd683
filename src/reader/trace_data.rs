//! Decoded capture.

use crate::parser::{BlockDescriptor, CaptureHeader, DescriptorTable, SerializedBlock};
use crate::storage::ByteStore;
use crate::tree::{BlockIndex, BlocksTree, BlocksTreeRoot, ThreadId};
use std::borrow::Cow;
use std::collections::BTreeMap;

/// Everything produced by a successful decode
///
/// **Public** - returned by `fill_trees_from_stream` / `fill_trees_from_file`
#[derive(Debug)]
pub struct TraceData {
    /// Capture metadata from the file header
    pub header: CaptureHeader,

    /// Descriptor table, extended with runtime-name aliases
    pub descriptors: DescriptorTable,

    /// Raw bytes of every kept block and context switch
    pub serialized_blocks: ByteStore,

    /// Node arena shared by all threads
    pub blocks: Vec<BlocksTree>,

    /// Per-thread roots, ordered by thread id
    pub threads: BTreeMap<ThreadId, BlocksTreeRoot>,

    /// Number of arena entries (blocks and context switches)
    pub blocks_count: usize,

    /// Ordering violations reported under `OrderingCheck::Warn`
    pub ordering_violations: u64,
}

impl TraceData {
    pub fn node(&self, index: BlockIndex) -> &BlocksTree {
        &self.blocks[index as usize]
    }

    pub fn block(&self, index: BlockIndex) -> SerializedBlock<'_> {
        self.node(index).block(&self.serialized_blocks)
    }

    /// Descriptor of a block node (not meaningful for context switches)
    pub fn descriptor(&self, index: BlockIndex) -> Option<BlockDescriptor<'_>> {
        self.descriptors.get(self.block(index).id())
    }

    /// Runtime name if the block carries one, descriptor name otherwise
    pub fn block_name(&self, index: BlockIndex) -> Cow<'_, str> {
        let block = self.block(index);
        if block.has_runtime_name() {
            return block.name();
        }
        match self.descriptors.get(block.id()) {
            Some(descriptor) => descriptor.name(),
            None => Cow::Owned(format!("block #{}", block.id())),
        }
    }

    pub fn thread(&self, thread_id: ThreadId) -> Option<&BlocksTreeRoot> {
        self.threads.get(&thread_id)
    }

    /// Capture duration in nanoseconds
    pub fn capture_duration(&self) -> u64 {
        self.header.end_time.saturating_sub(self.header.begin_time)
    }
}
