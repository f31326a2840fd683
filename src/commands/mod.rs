//! CLI command implementations.
//!
//! Each command is implemented in its own module.
//! Commands orchestrate the various library components to perform user tasks.

pub mod descriptors;
pub mod inspect;
pub mod models;
pub mod utils;

// Re-export main command functions
pub use descriptors::execute_descriptors;
pub use inspect::{execute_inspect, validate_args};
pub use models::{CheckOrder, InspectArgs};
pub use utils::display_version;
