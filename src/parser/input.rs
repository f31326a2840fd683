//! Primitive reads over the input stream.
//!
//! End of input is not an error for the trace body: a truncated capture simply
//! yields fewer records. These helpers turn `UnexpectedEof` into `None` (or
//! zero for header fields) and pass every other I/O error through.

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{self, Read};

fn eof_as_none<T>(result: io::Result<T>) -> io::Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(None),
        Err(e) => Err(e),
    }
}

pub(crate) fn read_u16<R: Read>(reader: &mut R) -> io::Result<Option<u16>> {
    eof_as_none(reader.read_u16::<LittleEndian>())
}

pub(crate) fn read_u32<R: Read>(reader: &mut R) -> io::Result<Option<u32>> {
    eof_as_none(reader.read_u32::<LittleEndian>())
}

pub(crate) fn read_u64<R: Read>(reader: &mut R) -> io::Result<Option<u64>> {
    eof_as_none(reader.read_u64::<LittleEndian>())
}

pub(crate) fn read_u32_or_zero<R: Read>(reader: &mut R) -> io::Result<u32> {
    Ok(read_u32(reader)?.unwrap_or(0))
}

pub(crate) fn read_u64_or_zero<R: Read>(reader: &mut R) -> io::Result<u64> {
    Ok(read_u64(reader)?.unwrap_or(0))
}

/// Read exactly `len` bytes, `None` if the input ends first
pub(crate) fn read_bytes<R: Read>(reader: &mut R, len: usize) -> io::Result<Option<Vec<u8>>> {
    let mut buf = vec![0u8; len];
    eof_as_none(reader.read_exact(&mut buf)).map(|done| done.map(|()| buf))
}

/// Bytes up to (not including) the first NUL
pub(crate) fn until_nul(bytes: &[u8]) -> &[u8] {
    match bytes.iter().position(|&b| b == 0) {
        Some(end) => &bytes[..end],
        None => bytes,
    }
}
