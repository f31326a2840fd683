use block_trace_studio::tree::OrderingCheck;
use block_trace_studio::utils::config::DEFAULT_TOP_BLOCKS;
use clap::ValueEnum;
use std::path::PathBuf;

/// Arguments for the inspect command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone)]
pub struct InspectArgs {
    /// Trace file to decode
    pub input: PathBuf,

    /// Output path for the JSON summary (optional)
    pub output_json: Option<PathBuf>,

    /// Output path for collapsed stacks (optional)
    pub output_stacks: Option<PathBuf>,

    /// Number of blocks listed per thread
    pub top_blocks: usize,

    /// Build call statistics
    pub gather_statistics: bool,

    /// Writer ordering verification
    pub ordering_check: OrderingCheck,

    /// Print text summary to stdout
    pub print_summary: bool,
}

impl Default for InspectArgs {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            output_json: None,
            output_stacks: None,
            top_blocks: DEFAULT_TOP_BLOCKS,
            gather_statistics: true,
            ordering_check: OrderingCheck::Off,
            print_summary: false,
        }
    }
}

/// `--check-order` values
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CheckOrder {
    Off,
    Warn,
    Reject,
}

impl From<CheckOrder> for OrderingCheck {
    fn from(value: CheckOrder) -> Self {
        match value {
            CheckOrder::Off => OrderingCheck::Off,
            CheckOrder::Warn => OrderingCheck::Warn,
            CheckOrder::Reject => OrderingCheck::Reject,
        }
    }
}
