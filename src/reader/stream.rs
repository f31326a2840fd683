//! Streaming decode of a full capture.

use super::options::ReaderOptions;
use super::trace_data::TraceData;
use crate::aggregator::frames::gather_frame_statistics;
use crate::aggregator::statistics::{apply_statistics, StatisticsScope, StatsSlot};
use crate::parser::block::{normalize_record, read_record, validate_block_id, RecordKind};
use crate::parser::descriptors::read_descriptor_table;
use crate::parser::header::{read_header, read_signature_and_version};
use crate::parser::input::{read_bytes, read_u16, read_u32, read_u32_or_zero, read_u64, read_u64_or_zero, until_nul};
use crate::parser::{BlockId, BlockType, CaptureHeader, DescriptorTable, SerializedBlock, SerializedBlockMut};
use crate::progress::{phase_value, Progress};
use crate::storage::{ByteStore, RecordRef};
use crate::tree::{BlockIndex, BlocksTree, BlocksTreeRoot, ThreadId, TreeBuilder};
use crate::utils::config::{
    MAX_UPFRONT_RESERVATION, PROGRESS_BLOCKS_END, PROGRESS_DESCRIPTORS_END, PROGRESS_DONE,
};
use crate::utils::error::ReadError;
use log::{debug, info, warn};
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Decode the trace file at `path`.
///
/// **Public** - main entry point for file input
///
/// # Errors
/// * `ReadError::Open` - the file cannot be opened
/// * Any error of [`fill_trees_from_stream`]
pub fn fill_trees_from_file(
    progress: &Progress,
    path: impl AsRef<Path>,
    options: &ReaderOptions,
) -> Result<TraceData, ReadError> {
    let path = path.as_ref();
    info!("Reading trace from: {}", path.display());

    let file = File::open(path).map_err(|source| ReadError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    fill_trees_from_stream(progress, &mut BufReader::new(file), options)
}

/// Decode a full capture from `reader`.
///
/// **Public** - main entry point for stream input
///
/// # Arguments
/// * `progress` - Progress handle; set it negative from anywhere to cancel
/// * `reader` - Trace bytes, starting at the signature
/// * `options` - Statistics and ordering-check switches
///
/// # Returns
/// The decoded capture. A stream that ends early yields whatever was
/// decoded up to that point.
///
/// # Errors
/// * `ReadError::Interrupted` - progress was negative before or during the read
/// * Header rejections (signature, version, zero counts or sizes)
/// * Record rejections (zero size, bad id, null descriptor, ordering under `Reject`)
pub fn fill_trees_from_stream<R: Read>(
    progress: &Progress,
    reader: &mut R,
    options: &ReaderOptions,
) -> Result<TraceData, ReadError> {
    progress.restart()?;

    let header = read_header(reader)?;

    let mut descriptors =
        DescriptorTable::with_declared(header.total_descriptors, header.descriptors_memory_size);
    read_descriptor_table(
        reader,
        &mut descriptors,
        header.total_descriptors,
        header.descriptors_memory_size,
        progress,
        (0, PROGRESS_DESCRIPTORS_END),
    )?;
    progress.advance(PROGRESS_DESCRIPTORS_END)?;

    let mut decoder = GroupDecoder::new(header, descriptors, options);
    decoder.read_groups(reader, progress)?;
    decoder.finish(progress)
}

/// Decode a stream holding only the descriptor table.
///
/// Layout: signature, version, `u32` count, `u64` memory size, table.
/// Progress moves from 0 to 100 over the table.
///
/// # Errors
/// * `ReadError::NoDescriptors` / `ReadError::ZeroDescriptorMemorySize` - nothing declared
/// * `ReadError::NoDescriptorsRead` - the table turned out empty
pub fn read_descriptions_from_stream<R: Read>(
    progress: &Progress,
    reader: &mut R,
) -> Result<DescriptorTable, ReadError> {
    progress.restart()?;

    read_signature_and_version(reader)?;

    let count = read_u32_or_zero(reader)?;
    if count == 0 {
        return Err(ReadError::NoDescriptors);
    }

    let memory_size = read_u64_or_zero(reader)?;
    if memory_size == 0 {
        return Err(ReadError::ZeroDescriptorMemorySize { descriptors: count });
    }

    let mut table = DescriptorTable::with_declared(count, memory_size);
    read_descriptor_table(reader, &mut table, count, memory_size, progress, (0, PROGRESS_DONE))?;

    if table.is_empty() {
        return Err(ReadError::NoDescriptorsRead);
    }

    progress.advance(PROGRESS_DONE)?;
    Ok(table)
}

/// State carried across the per-thread groups of one capture
struct GroupDecoder {
    header: CaptureHeader,
    descriptors: DescriptorTable,
    store: ByteStore,
    blocks: Vec<BlocksTree>,
    threads: BTreeMap<ThreadId, BlocksTreeRoot>,
    thread_stats: HashMap<ThreadId, StatisticsScope>,
    runtime_names: HashMap<Vec<u8>, BlockId>,
    builder: TreeBuilder,
    gather_statistics: bool,
    read_number: u32,
    consumed: u64,
}

impl GroupDecoder {
    fn new(header: CaptureHeader, descriptors: DescriptorTable, options: &ReaderOptions) -> Self {
        let max_nodes = MAX_UPFRONT_RESERVATION / std::mem::size_of::<BlocksTree>();
        let capacity = (header.total_blocks as usize).min(max_nodes);

        Self {
            header,
            descriptors,
            store: ByteStore::with_declared_size(header.memory_size),
            blocks: Vec::with_capacity(capacity),
            threads: BTreeMap::new(),
            thread_stats: HashMap::new(),
            runtime_names: HashMap::new(),
            builder: TreeBuilder::new(options.ordering_check),
            gather_statistics: options.gather_statistics,
            read_number: 0,
            consumed: 0,
        }
    }

    /// Read thread groups until the declared block count is reached or the
    /// input ends.
    fn read_groups<R: Read>(&mut self, reader: &mut R, progress: &Progress) -> Result<(), ReadError> {
        while self.read_number < self.header.total_blocks {
            progress.check()?;

            let Some(thread_id) = read_u64(reader)? else {
                break;
            };
            if !self.read_group(reader, thread_id, progress)? {
                warn!(
                    "Trace ended inside thread {} after {} of {} records",
                    thread_id, self.read_number, self.header.total_blocks
                );
                break;
            }
        }

        progress.check()
    }

    /// Read one thread group; `Ok(false)` if the input ended inside it
    fn read_group<R: Read>(
        &mut self,
        reader: &mut R,
        thread_id: ThreadId,
        progress: &Progress,
    ) -> Result<bool, ReadError> {
        self.threads
            .entry(thread_id)
            .or_insert_with(|| BlocksTreeRoot::new(thread_id));

        let Some(name_len) = read_u16(reader)? else {
            return Ok(false);
        };
        let Some(name) = read_bytes(reader, usize::from(name_len))? else {
            return Ok(false);
        };
        let name = until_nul(&name);
        if !name.is_empty() {
            let name = String::from_utf8_lossy(name).into_owned();
            debug!("Thread {} is named \"{}\"", thread_id, name);
            if let Some(root) = self.threads.get_mut(&thread_id) {
                root.thread_name = Some(name);
            }
        }

        let Some(sync_count) = read_u32(reader)? else {
            return Ok(false);
        };
        let threshold = self.read_number.saturating_add(sync_count);
        while self.read_number < threshold {
            let Some(record) = read_record(reader, &mut self.store, RecordKind::ContextSwitch)? else {
                return Ok(false);
            };
            self.read_context_switch(thread_id, record);
            self.step(record, progress)?;
        }

        let Some(block_count) = read_u32(reader)? else {
            return Ok(false);
        };
        let threshold = self.read_number.saturating_add(block_count);
        while self.read_number < threshold {
            let Some(record) = read_record(reader, &mut self.store, RecordKind::Block)? else {
                return Ok(false);
            };
            self.read_block(thread_id, record)?;
            self.step(record, progress)?;
        }

        Ok(true)
    }

    fn step(&mut self, record: RecordRef, progress: &Progress) -> Result<(), ReadError> {
        self.read_number += 1;
        self.consumed += u64::from(record.len());
        progress.advance(phase_value(
            PROGRESS_DESCRIPTORS_END,
            PROGRESS_BLOCKS_END,
            self.consumed,
            self.header.memory_size,
        ))
    }

    fn read_context_switch(&mut self, thread_id: ThreadId, record: RecordRef) {
        let keep = normalize_record(
            &mut self.store,
            record,
            self.header.normalizer(),
            self.header.begin_time,
            RecordKind::ContextSwitch,
        );
        if !keep {
            return;
        }

        let index = self.blocks.len() as BlockIndex;
        self.blocks.push(BlocksTree::new(record));
        if let Some(root) = self.threads.get_mut(&thread_id) {
            root.sync.push(index);
        }
    }

    fn read_block(&mut self, thread_id: ThreadId, record: RecordRef) -> Result<(), ReadError> {
        let block = SerializedBlock::new(self.store.bytes(record));
        let descriptor = validate_block_id(block.id(), self.header.total_descriptors, &self.descriptors)?;
        let block_type = descriptor.block_type();

        let keep = normalize_record(
            &mut self.store,
            record,
            self.header.normalizer(),
            self.header.begin_time,
            RecordKind::Block,
        );
        if !keep {
            return Ok(());
        }

        let id = self.deduplicate(record);

        let index = self.blocks.len() as BlockIndex;
        self.blocks.push(BlocksTree::new(record));

        let Some(root) = self.threads.get_mut(&thread_id) else {
            return Ok(());
        };
        self.builder.insert(&mut self.blocks, &self.store, root, index)?;
        if block_type == BlockType::Event {
            root.events.push(index);
        }

        if self.gather_statistics {
            let duration = SerializedBlock::new(self.store.bytes(record)).duration();
            self.thread_stats
                .entry(thread_id)
                .or_insert_with(|| StatisticsScope::new(None))
                .update(id, index, duration);

            let children = &self.blocks[index as usize].children;
            if !children.is_empty() {
                let mut scope = StatisticsScope::new(Some(index));
                for &child in children {
                    let child_block = self.blocks[child as usize].block(&self.store);
                    scope.update(child_block.id(), child, child_block.duration());
                }
                apply_statistics(&mut self.blocks, StatsSlot::PerParent, scope.finish());
            }
        }

        Ok(())
    }

    /// Give blocks with a runtime name their own id, shared by equal names.
    ///
    /// Returns the block's (possibly rewritten) id.
    fn deduplicate(&mut self, record: RecordRef) -> BlockId {
        let block = SerializedBlock::new(self.store.bytes(record));
        let original = block.id();
        if !block.has_runtime_name() {
            return original;
        }

        // Keyed on the raw bytes: lossy decoding would merge distinct names
        let name = block.name_bytes().to_vec();
        let id = match self.runtime_names.get(&name) {
            Some(&id) => id,
            None => {
                let id = self.descriptors.alias(original);
                debug!("Runtime name \"{}\" gets id {}", String::from_utf8_lossy(&name), id);
                self.runtime_names.insert(name, id);
                id
            }
        };

        SerializedBlockMut::new(self.store.bytes_mut(record)).set_id(id);
        id
    }

    /// Per-thread statistics and the post-pass
    fn finish(mut self, progress: &Progress) -> Result<TraceData, ReadError> {
        for (_, scope) in self.thread_stats.drain() {
            apply_statistics(&mut self.blocks, StatsSlot::PerThread, scope.finish());
        }
        progress.advance(PROGRESS_BLOCKS_END)?;

        gather_frame_statistics(
            &mut self.blocks,
            &self.store,
            &mut self.threads,
            self.gather_statistics,
            progress,
        )?;

        info!(
            "Decoded {} records into {} nodes across {} threads",
            self.read_number,
            self.blocks.len(),
            self.threads.len()
        );

        Ok(TraceData {
            header: self.header,
            descriptors: self.descriptors,
            blocks_count: self.blocks.len(),
            serialized_blocks: self.store,
            blocks: self.blocks,
            threads: self.threads,
            ordering_violations: self.builder.violations(),
        })
    }
}
