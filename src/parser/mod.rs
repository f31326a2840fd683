//! Binary trace decoding.
//!
//! This module handles:
//! - Validating the file signature and version
//! - Reading capture metadata and normalizing timestamps
//! - Decoding the block descriptor table
//! - Decoding block and context switch records

pub mod block;
pub mod descriptors;
pub mod header;
pub(crate) mod input;

// Re-export main types
pub use block::{RecordKind, SerializedBlock, SerializedBlockMut};
pub use descriptors::{BlockDescriptor, BlockId, BlockType, DescriptorTable};
pub use header::{CaptureHeader, TimeNormalizer};
