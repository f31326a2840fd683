//! Error types for the entire application.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.

use std::path::PathBuf;
use thiserror::Error;

/// Coarse classification of a failed read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Not a trace file (signature mismatch)
    Format,
    /// Version outside the compatibility list
    Version,
    /// Nothing declared (or nothing decoded) to read
    EmptyCapture,
    /// Declared memory size is zero
    Size,
    /// A record could not be accepted
    CorruptRecord,
    /// The progress controller was set negative
    Cancelled,
    /// The source could not be opened
    Io,
}

/// Errors that can occur while decoding a trace.
///
/// Every variant is terminal for the current decode call; nothing decoded
/// before the failure is returned.
#[derive(Error, Debug)]
pub enum ReadError {
    #[error("Can not open file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Read failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Wrong signature {0}\nThis is not a block trace file/stream.")]
    WrongSignature(u32),

    #[error("Incompatible version: v{}", display_version(.0))]
    IncompatibleVersion(u32),

    #[error("Profiled blocks number == 0")]
    NoBlocks,

    #[error("Wrong memory size == 0 for {blocks} blocks")]
    ZeroMemorySize { blocks: u32 },

    #[error("Blocks description number == 0")]
    NoDescriptors,

    #[error("Wrong memory size == 0 for {descriptors} blocks descriptions")]
    ZeroDescriptorMemorySize { descriptors: u32 },

    #[error("No block descriptions could be read")]
    NoDescriptorsRead,

    #[error("Bad CSwitch block size == 0")]
    ZeroSizeContextSwitch,

    #[error("Bad block size == 0")]
    ZeroSizeBlock,

    #[error("Bad record size == {size}, expected at least {expected} bytes")]
    RecordTooShort { size: u16, expected: usize },

    #[error("Bad block id == {0}")]
    BadBlockId(u32),

    #[error("Bad block id == {0}. Description is null.")]
    NullDescriptor(u32),

    #[error("Block order violation at node {index} in thread {thread_id}: {reason}")]
    OrderingViolation {
        thread_id: u64,
        index: u32,
        reason: String,
    },

    #[error("Reading was interrupted")]
    Interrupted,
}

fn display_version(version: &u32) -> String {
    crate::utils::config::version_string(*version)
}

impl ReadError {
    /// Map this error onto its [`ErrorKind`]
    pub fn kind(&self) -> ErrorKind {
        match self {
            ReadError::Open { .. } | ReadError::Io(_) => ErrorKind::Io,
            ReadError::WrongSignature(_) => ErrorKind::Format,
            ReadError::IncompatibleVersion(_) => ErrorKind::Version,
            ReadError::NoBlocks | ReadError::NoDescriptors | ReadError::NoDescriptorsRead => {
                ErrorKind::EmptyCapture
            }
            ReadError::ZeroMemorySize { .. } | ReadError::ZeroDescriptorMemorySize { .. } => {
                ErrorKind::Size
            }
            ReadError::ZeroSizeContextSwitch
            | ReadError::ZeroSizeBlock
            | ReadError::RecordTooShort { .. }
            | ReadError::BadBlockId(_)
            | ReadError::NullDescriptor(_)
            | ReadError::OrderingViolation { .. } => ErrorKind::CorruptRecord,
            ReadError::Interrupted => ErrorKind::Cancelled,
        }
    }
}

/// Errors that can occur during file output
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write file: {0}")]
    WriteFailed(#[from] std::io::Error),

    #[error("Failed to serialize JSON: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("Invalid output path: {0}")]
    InvalidPath(String),
}
