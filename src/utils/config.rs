//! Configuration and constants for the trace reader.

/// Packs a `major.minor.patch` triple the way the writer stores versions
pub const fn version_int(major: u32, minor: u32, patch: u32) -> u32 {
    (major << 24) | (minor << 16) | patch
}

/// Formats a packed version as `major.minor.patch`
pub fn version_string(version: u32) -> String {
    format!(
        "{}.{}.{}",
        version >> 24,
        (version & 0x00ff_0000) >> 16,
        version & 0x0000_ffff
    )
}

/// File signature ("Easy" read as a little-endian u32)
pub const PROFILER_SIGNATURE: u32 = 0x4561_7379;

/// Format version produced by the current writer
pub const CURRENT_VERSION: u32 = version_int(1, 0, 0);

/// Older format versions that decode with the current layout.
/// Kept sorted; the current version is checked separately.
pub const COMPATIBLE_VERSIONS: &[u32] = &[version_int(0, 1, 0)];

/// Raw ticks are scaled by this factor before dividing by the CPU frequency
pub const TIME_FACTOR: u64 = 1_000_000_000;

/// Current output schema version
pub const SCHEMA_VERSION: &str = "1.0.0";

// Fixed record layouts (little-endian)
// Block / context switch: begin(u64) end(u64) id(u32) [name\0]
pub const BLOCK_HEADER_SIZE: usize = 8 + 8 + 4;
// Descriptor: id(u32) line(i32) color(u32) type(u8) enabled(u8) name_len(u16) name\0 file\0
pub const DESCRIPTOR_HEADER_SIZE: usize = 4 + 4 + 4 + 1 + 1 + 2;

// Progress phases (percent)
pub const PROGRESS_DESCRIPTORS_END: i32 = 15;
pub const PROGRESS_BLOCKS_END: i32 = 90;
pub const PROGRESS_DONE: i32 = 100;

/// Upper bound for reservations derived from sizes declared in the file
pub const MAX_UPFRONT_RESERVATION: usize = 64 * 1024 * 1024;

/// Default number of blocks listed per thread in summaries
pub const DEFAULT_TOP_BLOCKS: usize = 10;
