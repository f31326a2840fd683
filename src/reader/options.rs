//! Runtime options for a decode.

use crate::tree::OrderingCheck;
use serde::{Deserialize, Serialize};

/// Options for [`fill_trees_from_stream`](super::fill_trees_from_stream)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReaderOptions {
    /// Build per-thread, per-parent and per-frame statistics
    pub gather_statistics: bool,

    /// Verification of the writer's block ordering
    pub ordering_check: OrderingCheck,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            gather_statistics: true,
            ordering_check: OrderingCheck::Off,
        }
    }
}

impl ReaderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gather_statistics(mut self, enabled: bool) -> Self {
        self.gather_statistics = enabled;
        self
    }

    pub fn ordering_check(mut self, check: OrderingCheck) -> Self {
        self.ordering_check = check;
        self
    }
}
