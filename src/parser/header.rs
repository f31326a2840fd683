//! File header decoding and timestamp normalization.

use super::input::{read_u32_or_zero, read_u64_or_zero};
use crate::utils::config::{
    version_string, COMPATIBLE_VERSIONS, CURRENT_VERSION, PROFILER_SIGNATURE, TIME_FACTOR,
};
use crate::utils::error::ReadError;
use byteorder::{LittleEndian, ReadBytesExt};
use log::{debug, info};
use std::io::{self, Read};

/// Capture-time metadata read from the file header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureHeader {
    /// Packed format version
    pub version: u32,
    /// Tick frequency of the writer's clock (0 = timestamps already in ns)
    pub cpu_frequency: i64,
    /// Capture begin, normalized
    pub begin_time: u64,
    /// Capture end, normalized
    pub end_time: u64,
    /// Declared number of block + context switch records
    pub total_blocks: u32,
    /// Declared byte size of all block records
    pub memory_size: u64,
    /// Declared number of descriptors
    pub total_descriptors: u32,
    /// Declared byte size of the descriptor table
    pub descriptors_memory_size: u64,
}

impl CaptureHeader {
    pub fn normalizer(&self) -> TimeNormalizer {
        TimeNormalizer::new(self.cpu_frequency)
    }
}

/// Converts raw writer ticks into nanoseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeNormalizer {
    cpu_frequency: i64,
}

impl TimeNormalizer {
    pub fn new(cpu_frequency: i64) -> Self {
        Self { cpu_frequency }
    }

    /// `raw * 1e9 / frequency`, or `raw` unchanged when the frequency is 0
    pub fn normalize(&self, raw: u64) -> u64 {
        if self.cpu_frequency == 0 {
            return raw;
        }
        let ticks = u128::from(raw) * u128::from(TIME_FACTOR);
        let nanos = ticks / u128::from(self.cpu_frequency.unsigned_abs());
        u64::try_from(nanos).unwrap_or(u64::MAX)
    }
}

/// Whether a file written with `version` can be decoded
pub fn is_compatible_version(version: u32) -> bool {
    version == CURRENT_VERSION || COMPATIBLE_VERSIONS.binary_search(&version).is_ok()
}

/// Read and check the signature and version that open every stream
pub fn read_signature_and_version<R: Read>(reader: &mut R) -> Result<u32, ReadError> {
    let signature = read_u32_or_zero(reader)?;
    if signature != PROFILER_SIGNATURE {
        return Err(ReadError::WrongSignature(signature));
    }

    let version = read_u32_or_zero(reader)?;
    if !is_compatible_version(version) {
        return Err(ReadError::IncompatibleVersion(version));
    }

    debug!("Trace format version {}", version_string(version));
    Ok(version)
}

/// Read the full capture header of a trace file.
///
/// # Errors
/// * `ReadError::WrongSignature` - not a trace stream
/// * `ReadError::IncompatibleVersion` - version outside the compatibility list
/// * `ReadError::NoBlocks` / `ReadError::NoDescriptors` - nothing declared
/// * `ReadError::ZeroMemorySize` / `ReadError::ZeroDescriptorMemorySize` - empty memory declared
pub fn read_header<R: Read>(reader: &mut R) -> Result<CaptureHeader, ReadError> {
    let version = read_signature_and_version(reader)?;

    let cpu_frequency = match reader.read_i64::<LittleEndian>() {
        Ok(value) => value,
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => 0,
        Err(e) => return Err(e.into()),
    };
    let normalizer = TimeNormalizer::new(cpu_frequency);

    let begin_time = normalizer.normalize(read_u64_or_zero(reader)?);
    let end_time = normalizer.normalize(read_u64_or_zero(reader)?);

    let total_blocks = read_u32_or_zero(reader)?;
    if total_blocks == 0 {
        return Err(ReadError::NoBlocks);
    }

    let memory_size = read_u64_or_zero(reader)?;
    if memory_size == 0 {
        return Err(ReadError::ZeroMemorySize {
            blocks: total_blocks,
        });
    }

    let total_descriptors = read_u32_or_zero(reader)?;
    if total_descriptors == 0 {
        return Err(ReadError::NoDescriptors);
    }

    let descriptors_memory_size = read_u64_or_zero(reader)?;
    if descriptors_memory_size == 0 {
        return Err(ReadError::ZeroDescriptorMemorySize {
            descriptors: total_descriptors,
        });
    }

    info!(
        "Capture: {} blocks ({} bytes), {} descriptors, {} ns",
        total_blocks,
        memory_size,
        total_descriptors,
        end_time.saturating_sub(begin_time)
    );

    Ok(CaptureHeader {
        version,
        cpu_frequency,
        begin_time,
        end_time,
        total_blocks,
        memory_size,
        total_descriptors,
        descriptors_memory_size,
    })
}
