//! Cooperative progress reporting and cancellation.
//!
//! A [`Progress`] handle wraps one shared integer. Decoders move it forward
//! through `0..=100` as they advance; any other holder of a clone may call
//! [`Progress::cancel`] (or store any negative value) to ask the decoder to
//! stop. Decoders check the value after every unit of work and bail out with
//! [`ReadError::Interrupted`].

use crate::utils::error::ReadError;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

/// Shared progress / cancellation signal
#[derive(Debug, Clone, Default)]
pub struct Progress {
    value: Arc<AtomicI32>,
}

impl Progress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value (negative once cancelled)
    pub fn value(&self) -> i32 {
        self.value.load(Ordering::Acquire)
    }

    /// Store an arbitrary value; negative values request cancellation
    pub fn set(&self, value: i32) {
        self.value.store(value, Ordering::Release);
    }

    /// Request cancellation of the running decode
    pub fn cancel(&self) {
        self.set(-1);
    }

    pub fn is_cancelled(&self) -> bool {
        self.value() < 0
    }

    /// Fail if cancellation was requested
    pub fn check(&self) -> Result<(), ReadError> {
        if self.is_cancelled() {
            Err(ReadError::Interrupted)
        } else {
            Ok(())
        }
    }

    /// Restart reporting at zero, unless the reader was already cancelled
    pub fn restart(&self) -> Result<(), ReadError> {
        self.value
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                (current >= 0).then_some(0)
            })
            .map(|_| ())
            .map_err(|_| ReadError::Interrupted)
    }

    /// Move progress forward to `value`.
    ///
    /// Never lowers the current value and never overwrites a cancellation.
    pub fn advance(&self, value: i32) -> Result<(), ReadError> {
        self.value
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                (current >= 0).then_some(current.max(value))
            })
            .map(|_| ())
            .map_err(|_| ReadError::Interrupted)
    }
}

/// Position inside a phase `[start, end]` after `done` of `total` units
pub fn phase_value(start: i32, end: i32, done: u64, total: u64) -> i32 {
    if total == 0 {
        return end;
    }
    let span = u64::try_from(end - start).unwrap_or(0);
    let offset = (u128::from(span) * u128::from(done) / u128::from(total)).min(u128::from(span));
    start + i32::try_from(offset).unwrap_or(0)
}
