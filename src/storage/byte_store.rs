//! Append-only byte storage for decoded records.
//!
//! Records are read straight from the input into the store and are addressed
//! afterwards by [`RecordRef`] (offset + length). The store may reallocate as
//! it grows, so nothing outside of it ever holds a pointer into its memory.

use crate::utils::config::MAX_UPFRONT_RESERVATION;
use log::debug;
use std::io::{self, Read};

/// Location of one record inside a [`ByteStore`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordRef {
    offset: usize,
    len: u16,
}

impl RecordRef {
    /// Byte offset of the record inside its store
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Record length in bytes (without the length prefix)
    pub fn len(&self) -> u16 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Exclusive-owner growable buffer holding raw record bytes
#[derive(Debug, Default, Clone)]
pub struct ByteStore {
    data: Vec<u8>,
}

impl ByteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store sized for the memory size declared by the file.
    ///
    /// The reservation is capped, declared sizes are not trusted for allocation.
    pub fn with_declared_size(declared: u64) -> Self {
        let capacity = usize::try_from(declared)
            .unwrap_or(usize::MAX)
            .min(MAX_UPFRONT_RESERVATION);
        debug!(
            "Reserving {} bytes for records ({} declared)",
            capacity, declared
        );
        Self {
            data: Vec::with_capacity(capacity),
        }
    }

    /// Copy a record into the store
    pub fn push(&mut self, bytes: &[u8]) -> RecordRef {
        let offset = self.data.len();
        let len = u16::try_from(bytes.len()).unwrap_or(u16::MAX);
        self.data.extend_from_slice(&bytes[..usize::from(len)]);
        RecordRef { offset, len }
    }

    /// Read a record of `len` bytes from `reader` directly into the store.
    ///
    /// Returns `Ok(None)` when the input ends before the whole record is
    /// available; the partial bytes are discarded.
    pub fn read_record<R: Read>(&mut self, reader: &mut R, len: u16) -> io::Result<Option<RecordRef>> {
        let offset = self.data.len();
        self.data.resize(offset + usize::from(len), 0);

        match reader.read_exact(&mut self.data[offset..]) {
            Ok(()) => Ok(Some(RecordRef { offset, len })),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                self.data.truncate(offset);
                Ok(None)
            }
            Err(e) => {
                self.data.truncate(offset);
                Err(e)
            }
        }
    }

    /// Bytes of a record
    pub fn bytes(&self, record: RecordRef) -> &[u8] {
        &self.data[record.offset..record.offset + usize::from(record.len)]
    }

    /// Mutable bytes of a record
    pub fn bytes_mut(&mut self, record: RecordRef) -> &mut [u8] {
        &mut self.data[record.offset..record.offset + usize::from(record.len)]
    }

    /// Total number of stored bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
