use block_trace_studio::utils::config::{version_string, COMPATIBLE_VERSIONS, CURRENT_VERSION, SCHEMA_VERSION};

/// Display version information
pub fn display_version() {
    println!("Block Trace Studio v{}", env!("CARGO_PKG_VERSION"));
    println!("Trace Format: v{}", version_string(CURRENT_VERSION));
    let compatible: Vec<String> = COMPATIBLE_VERSIONS.iter().map(|&v| version_string(v)).collect();
    println!("Also reads: v{}", compatible.join(", v"));
    println!("Summary Schema: v{}", SCHEMA_VERSION);
    println!();
    println!("Call tree reconstruction and statistics for block trace captures.");
}
