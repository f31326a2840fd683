//! Block and context switch record decoding.
//!
//! Both record kinds share one layout: `begin(u64) end(u64) id(u32)` followed
//! by an optional NUL-terminated runtime name. Records are read into the
//! [`ByteStore`] and patched in place (timestamp normalization, clamping,
//! runtime-name id rewrite); every other component only sees them through
//! [`SerializedBlock`].

use super::descriptors::{BlockDescriptor, BlockId, DescriptorTable};
use super::header::TimeNormalizer;
use super::input::{read_u16, until_nul};
use crate::storage::{ByteStore, RecordRef};
use crate::utils::config::BLOCK_HEADER_SIZE;
use crate::utils::error::ReadError;
use byteorder::{ByteOrder, LittleEndian};
use std::borrow::Cow;
use std::io::Read;

const BEGIN: std::ops::Range<usize> = 0..8;
const END: std::ops::Range<usize> = 8..16;
const ID: std::ops::Range<usize> = 16..20;

/// Which section of a thread group a record belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    ContextSwitch,
    Block,
}

/// Read-only view of a block record
#[derive(Debug, Clone, Copy)]
pub struct SerializedBlock<'a> {
    bytes: &'a [u8],
}

impl<'a> SerializedBlock<'a> {
    /// View of a record previously accepted by [`read_record`]
    pub fn new(bytes: &'a [u8]) -> Self {
        debug_assert!(bytes.len() >= BLOCK_HEADER_SIZE);
        Self { bytes }
    }

    pub fn begin(&self) -> u64 {
        LittleEndian::read_u64(&self.bytes[BEGIN])
    }

    pub fn end(&self) -> u64 {
        LittleEndian::read_u64(&self.bytes[END])
    }

    pub fn duration(&self) -> u64 {
        self.end().saturating_sub(self.begin())
    }

    /// Descriptor id (target thread id for context switches)
    pub fn id(&self) -> BlockId {
        LittleEndian::read_u32(&self.bytes[ID])
    }

    pub fn name_bytes(&self) -> &'a [u8] {
        until_nul(&self.bytes[BLOCK_HEADER_SIZE..])
    }

    /// Runtime name embedded in the record (empty if none)
    pub fn name(&self) -> Cow<'a, str> {
        String::from_utf8_lossy(self.name_bytes())
    }

    pub fn has_runtime_name(&self) -> bool {
        !self.name_bytes().is_empty()
    }
}

/// Mutable view used while a record is being decoded
pub struct SerializedBlockMut<'a> {
    bytes: &'a mut [u8],
}

impl<'a> SerializedBlockMut<'a> {
    pub fn new(bytes: &'a mut [u8]) -> Self {
        debug_assert!(bytes.len() >= BLOCK_HEADER_SIZE);
        Self { bytes }
    }

    pub fn as_view(&self) -> SerializedBlock<'_> {
        SerializedBlock::new(&*self.bytes)
    }

    pub fn set_begin(&mut self, value: u64) {
        LittleEndian::write_u64(&mut self.bytes[BEGIN], value);
    }

    pub fn set_end(&mut self, value: u64) {
        LittleEndian::write_u64(&mut self.bytes[END], value);
    }

    pub fn set_id(&mut self, id: BlockId) {
        LittleEndian::write_u32(&mut self.bytes[ID], id);
    }
}

/// Read one length-prefixed record into `store`.
///
/// Returns `Ok(None)` when the input ends before the record is complete.
///
/// # Errors
/// * `ReadError::ZeroSizeContextSwitch` / `ReadError::ZeroSizeBlock` - zero length prefix
/// * `ReadError::RecordTooShort` - record smaller than its fixed header
pub fn read_record<R: Read>(
    reader: &mut R,
    store: &mut ByteStore,
    kind: RecordKind,
) -> Result<Option<RecordRef>, ReadError> {
    let Some(size) = read_u16(reader)? else {
        return Ok(None);
    };

    if size == 0 {
        return Err(match kind {
            RecordKind::ContextSwitch => ReadError::ZeroSizeContextSwitch,
            RecordKind::Block => ReadError::ZeroSizeBlock,
        });
    }

    if usize::from(size) < BLOCK_HEADER_SIZE {
        return Err(ReadError::RecordTooShort {
            size,
            expected: BLOCK_HEADER_SIZE,
        });
    }

    Ok(store.read_record(reader, size)?)
}

/// Check that a block refers to a live descriptor
///
/// # Errors
/// * `ReadError::BadBlockId` - id outside the declared descriptor range
/// * `ReadError::NullDescriptor` - id of a removed descriptor
pub fn validate_block_id<'t>(
    id: BlockId,
    declared_descriptors: u32,
    table: &'t DescriptorTable,
) -> Result<BlockDescriptor<'t>, ReadError> {
    if id >= declared_descriptors {
        return Err(ReadError::BadBlockId(id));
    }
    table.get(id).ok_or(ReadError::NullDescriptor(id))
}

/// Normalize the record's timestamps and clamp it to the capture window.
///
/// Returns `false` when the record ended before the capture began and must be
/// dropped. Context switches need `end > capture_begin`, blocks only
/// `end >= capture_begin`.
pub fn normalize_record(
    store: &mut ByteStore,
    record: RecordRef,
    normalizer: TimeNormalizer,
    capture_begin: u64,
    kind: RecordKind,
) -> bool {
    let mut block = SerializedBlockMut::new(store.bytes_mut(record));
    let begin = normalizer.normalize(block.as_view().begin());
    let end = normalizer.normalize(block.as_view().end());
    block.set_begin(begin);
    block.set_end(end);

    let keep = match kind {
        RecordKind::ContextSwitch => end > capture_begin,
        RecordKind::Block => end >= capture_begin,
    };

    if keep && begin < capture_begin {
        block.set_begin(capture_begin);
    }
    keep
}
