//! Schedule generation: backtracking search, objective scoring, and the
//! multi-restart optimizer.
//!
//! # Modules
//!
//! - **`search`**: MRV + LCV depth-first backtracking over one attempt
//! - **`objective`**: strategy-specific schedule scoring (lower = better)
//! - **`optimizer`**: best-of-N restarts with seeded perturbation
//!
//! # Cancellation
//!
//! A single [`CancelToken`] is observable by every in-flight attempt.
//! The flag is checked at the top of every recursive search call and at
//! every restart-loop iteration — this is a hard requirement of the
//! engine contract, not an optimization — and once observed, all work
//! unwinds and the caller receives [`GenerateError::Cancelled`].

mod objective;
mod optimizer;
mod search;

pub use objective::score_schedule;
pub use optimizer::{
    GeneratedSchedule, GenerateError, GenerationReport, ScheduleGenerator, RESTART_ATTEMPTS,
};
pub use search::SearchStats;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Progress callback: `(fraction 0.0–1.0, status text)`.
///
/// Invoked from the search thread; marshaling to a UI thread is the
/// caller's responsibility.
pub type ProgressFn = dyn Fn(f64, &str) + Send + Sync;

/// Cooperative cancellation flag shared between the engine and callers.
///
/// Cloning yields another handle to the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Creates a token in the not-cancelled state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation of all work observing this token.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation has been requested.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// Resets the token for reuse across generation requests.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::Relaxed);
    }
}
