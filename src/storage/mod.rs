//! Backing storage for raw record bytes.

pub mod byte_store;

pub use byte_store::{ByteStore, RecordRef};
