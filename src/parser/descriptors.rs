//! Block descriptor table decoding.
//!
//! The table is a dense list indexed by descriptor id. Removed descriptors are
//! written as zero-length records and kept as placeholders so that the ids of
//! the following descriptors stay valid.

use super::input::{read_u16, until_nul};
use crate::progress::{phase_value, Progress};
use crate::storage::{ByteStore, RecordRef};
use crate::utils::config::{DESCRIPTOR_HEADER_SIZE, MAX_UPFRONT_RESERVATION};
use crate::utils::error::ReadError;
use byteorder::{ByteOrder, LittleEndian};
use log::debug;
use serde::Serialize;
use std::borrow::Cow;
use std::io::Read;

/// Descriptor id as written in block records
pub type BlockId = u32;

/// Kind of a block descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BlockType {
    /// Instant marker, begin == end
    Event,
    /// Timed span
    Block,
}

impl BlockType {
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            0 => BlockType::Event,
            _ => BlockType::Block,
        }
    }

    pub fn to_raw(self) -> u8 {
        match self {
            BlockType::Event => 0,
            BlockType::Block => 1,
        }
    }
}

/// Read-only view of a serialized descriptor
#[derive(Debug, Clone, Copy)]
pub struct BlockDescriptor<'a> {
    bytes: &'a [u8],
}

impl<'a> BlockDescriptor<'a> {
    /// Wrap descriptor bytes; `None` if shorter than the fixed header
    pub fn new(bytes: &'a [u8]) -> Option<Self> {
        (bytes.len() >= DESCRIPTOR_HEADER_SIZE).then_some(Self { bytes })
    }

    /// Id written by the instrumentation library
    pub fn id(&self) -> BlockId {
        LittleEndian::read_u32(&self.bytes[0..4])
    }

    pub fn line(&self) -> i32 {
        LittleEndian::read_i32(&self.bytes[4..8])
    }

    /// Default color, ARGB
    pub fn color(&self) -> u32 {
        LittleEndian::read_u32(&self.bytes[8..12])
    }

    pub fn block_type(&self) -> BlockType {
        BlockType::from_raw(self.bytes[12])
    }

    pub fn is_enabled(&self) -> bool {
        self.bytes[13] != 0
    }

    fn name_bytes(&self) -> &'a [u8] {
        let declared = usize::from(LittleEndian::read_u16(&self.bytes[14..16]));
        let start = DESCRIPTOR_HEADER_SIZE;
        let end = (start + declared).min(self.bytes.len());
        &self.bytes[start..end]
    }

    pub fn name(&self) -> Cow<'a, str> {
        String::from_utf8_lossy(until_nul(self.name_bytes()))
    }

    /// Source file the block was declared in
    pub fn file(&self) -> Cow<'a, str> {
        let start = DESCRIPTOR_HEADER_SIZE + self.name_bytes().len();
        String::from_utf8_lossy(until_nul(&self.bytes[start..]))
    }
}

/// Dense, id-addressable list of descriptors
#[derive(Debug, Default, Clone)]
pub struct DescriptorTable {
    store: ByteStore,
    entries: Vec<Option<RecordRef>>,
}

impl DescriptorTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty table with storage reserved for the declared sizes
    pub fn with_declared(count: u32, memory_size: u64) -> Self {
        let capacity = usize::try_from(count).unwrap_or(0);
        Self {
            store: ByteStore::with_declared_size(memory_size),
            entries: Vec::with_capacity(capacity.min(MAX_UPFRONT_RESERVATION)),
        }
    }

    /// Descriptor at `id`; `None` for placeholders and unknown ids
    pub fn get(&self, id: BlockId) -> Option<BlockDescriptor<'_>> {
        let record = (*self.entries.get(usize::try_from(id).ok()?)?)?;
        BlockDescriptor::new(self.store.bytes(record))
    }

    /// Whether `id` is a slot left by a removed descriptor
    pub fn is_placeholder(&self, id: BlockId) -> bool {
        matches!(self.entries.get(id as usize), Some(None))
    }

    /// Number of ids, placeholders included
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate `(id, descriptor)` over non-placeholder entries
    pub fn iter(&self) -> impl Iterator<Item = (BlockId, BlockDescriptor<'_>)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .filter_map(move |(id, entry)| {
                let descriptor = BlockDescriptor::new(self.store.bytes((*entry)?))?;
                Some((id as BlockId, descriptor))
            })
    }

    pub fn push_placeholder(&mut self) {
        self.entries.push(None);
    }

    /// Append descriptor bytes and return the new id
    pub fn push(&mut self, bytes: &[u8]) -> BlockId {
        let record = self.store.push(bytes);
        self.entries.push(Some(record));
        (self.entries.len() - 1) as BlockId
    }

    /// Allocate a new id sharing the metadata of `id`
    pub fn alias(&mut self, id: BlockId) -> BlockId {
        let entry = self.entries.get(id as usize).copied().flatten();
        self.entries.push(entry);
        (self.entries.len() - 1) as BlockId
    }

    /// Read one `{u16 size; bytes[size]}` entry.
    ///
    /// Returns `Ok(None)` at end of input, `Ok(Some(size))` otherwise.
    fn read_entry<R: Read>(&mut self, reader: &mut R) -> Result<Option<u16>, ReadError> {
        let Some(size) = read_u16(reader)? else {
            return Ok(None);
        };

        if size == 0 {
            self.push_placeholder();
            return Ok(Some(0));
        }

        if usize::from(size) < DESCRIPTOR_HEADER_SIZE {
            return Err(ReadError::RecordTooShort {
                size,
                expected: DESCRIPTOR_HEADER_SIZE,
            });
        }

        let Some(record) = self.store.read_record(reader, size)? else {
            return Ok(None);
        };
        self.entries.push(Some(record));
        Ok(Some(size))
    }
}

/// Decode the descriptor table into `table`.
///
/// Stops after `count` entries or at end of input. Progress moves from
/// `phase.0` to `phase.1` as declared descriptor memory is consumed.
pub fn read_descriptor_table<R: Read>(
    reader: &mut R,
    table: &mut DescriptorTable,
    count: u32,
    memory_size: u64,
    progress: &Progress,
    phase: (i32, i32),
) -> Result<(), ReadError> {
    let count = count as usize;
    let mut consumed: u64 = 0;

    while table.len() < count {
        let Some(size) = table.read_entry(reader)? else {
            debug!("Descriptor table ended after {} of {} entries", table.len(), count);
            break;
        };

        if size == 0 {
            progress.check()?;
            continue;
        }

        consumed += u64::from(size);
        progress.advance(phase_value(phase.0, phase.1, consumed, memory_size))?;
    }

    debug!("Read {} block descriptors", table.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn descriptor_bytes(id: u32, name: &str, file: &str, block_type: BlockType) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&id.to_le_bytes());
        bytes.extend_from_slice(&42i32.to_le_bytes());
        bytes.extend_from_slice(&0xff00_ff00u32.to_le_bytes());
        bytes.push(block_type.to_raw());
        bytes.push(1);
        bytes.extend_from_slice(&((name.len() + 1) as u16).to_le_bytes());
        bytes.extend_from_slice(name.as_bytes());
        bytes.push(0);
        bytes.extend_from_slice(file.as_bytes());
        bytes.push(0);
        bytes
    }

    fn table_bytes(entries: &[Option<Vec<u8>>]) -> Vec<u8> {
        let mut out = Vec::new();
        for entry in entries {
            match entry {
                Some(bytes) => {
                    out.extend_from_slice(&(bytes.len() as u16).to_le_bytes());
                    out.extend_from_slice(bytes);
                }
                None => out.extend_from_slice(&0u16.to_le_bytes()),
            }
        }
        out
    }

    #[test]
    fn test_descriptor_view() {
        let bytes = descriptor_bytes(7, "update", "game.cpp", BlockType::Block);
        let descriptor = BlockDescriptor::new(&bytes).unwrap();

        assert_eq!(descriptor.id(), 7);
        assert_eq!(descriptor.line(), 42);
        assert_eq!(descriptor.color(), 0xff00_ff00);
        assert_eq!(descriptor.block_type(), BlockType::Block);
        assert!(descriptor.is_enabled());
        assert_eq!(descriptor.name(), "update");
        assert_eq!(descriptor.file(), "game.cpp");
    }

    #[test]
    fn test_placeholders_keep_ids_dense() {
        let input = table_bytes(&[
            Some(descriptor_bytes(0, "a", "a.cpp", BlockType::Block)),
            None,
            Some(descriptor_bytes(2, "c", "c.cpp", BlockType::Event)),
        ]);
        let mut table = DescriptorTable::new();
        read_descriptor_table(&mut Cursor::new(input), &mut table, 3, 100, &Progress::new(), (0, 15))
            .unwrap();

        assert_eq!(table.len(), 3);
        assert!(table.is_placeholder(1));
        assert!(table.get(1).is_none());
        assert_eq!(table.get(2).unwrap().name(), "c");
        assert_eq!(table.get(2).unwrap().block_type(), BlockType::Event);
        assert_eq!(table.iter().count(), 2);
    }

    #[test]
    fn test_stops_at_declared_count() {
        let input = table_bytes(&[
            Some(descriptor_bytes(0, "a", "", BlockType::Block)),
            Some(descriptor_bytes(1, "b", "", BlockType::Block)),
        ]);
        let mut table = DescriptorTable::new();
        read_descriptor_table(&mut Cursor::new(input), &mut table, 1, 100, &Progress::new(), (0, 15))
            .unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_truncated_table() {
        let mut input = table_bytes(&[Some(descriptor_bytes(0, "a", "", BlockType::Block))]);
        input.extend_from_slice(&40u16.to_le_bytes());
        input.extend_from_slice(&[1, 2, 3]);

        let mut table = DescriptorTable::new();
        read_descriptor_table(&mut Cursor::new(input), &mut table, 5, 100, &Progress::new(), (0, 15))
            .unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_cancelled_during_placeholders() {
        let input = table_bytes(&[None, None, None]);
        let progress = Progress::new();
        progress.cancel();

        let mut table = DescriptorTable::new();
        let result = read_descriptor_table(&mut Cursor::new(input), &mut table, 3, 100, &progress, (0, 15));
        assert!(matches!(result, Err(ReadError::Interrupted)));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_alias_shares_metadata() {
        let mut table = DescriptorTable::new();
        let id = table.push(&descriptor_bytes(0, "load", "io.cpp", BlockType::Block));
        let alias = table.alias(id);

        assert_eq!(alias, 1);
        assert_eq!(table.get(alias).unwrap().name(), "load");
        assert_eq!(table.get(alias).unwrap().file(), "io.cpp");
    }

    #[test]
    fn test_cancelled_while_reading() {
        let input = table_bytes(&[Some(descriptor_bytes(0, "a", "", BlockType::Block))]);
        let progress = Progress::new();
        progress.cancel();

        let mut table = DescriptorTable::new();
        let result = read_descriptor_table(&mut Cursor::new(input), &mut table, 1, 100, &progress, (0, 15));
        assert!(matches!(result, Err(ReadError::Interrupted)));
    }

    #[test]
    fn test_short_descriptor_rejected() {
        let input = table_bytes(&[Some(vec![1, 2, 3])]);
        let mut table = DescriptorTable::new();
        let result = read_descriptor_table(&mut Cursor::new(input), &mut table, 1, 100, &Progress::new(), (0, 15));
        assert!(matches!(result, Err(ReadError::RecordTooShort { size: 3, .. })));
    }
}
