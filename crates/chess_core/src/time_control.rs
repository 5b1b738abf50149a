//! Search limits and the cancellable clock engines search against.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// How often the clock is actually consulted, in nodes. Checking the wall
/// clock on every node is wasteful.
const CHECK_INTERVAL: u64 = 1024;

/// Shared cancel handle for an in-flight search.
///
/// Cheap to clone; every clone refers to the same flag. A host holds a clone
/// to abort a search running on another thread.
#[derive(Debug, Clone, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request that the current search stops as soon as it notices.
    pub fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Clear the flag before starting a fresh search.
    pub fn clear(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    #[inline]
    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Wall-clock budget for one search call.
///
/// The clock starts when constructed. `time_up` is the only question engines
/// need to ask; it also latches the stop flag once the deadline passes so
/// every level of the recursion unwinds promptly.
#[derive(Debug, Clone)]
pub struct SearchClock {
    stop: StopFlag,
    started: Instant,
    deadline: Option<Instant>,
}

impl SearchClock {
    /// Start a clock with a time budget, cancellable through `stop`.
    pub fn start(budget: Option<Duration>, stop: StopFlag) -> Self {
        stop.clear();
        let started = Instant::now();
        Self {
            stop,
            started,
            deadline: budget.map(|b| started + b),
        }
    }

    /// A clock that never expires (still cancellable via its own flag).
    pub fn unlimited() -> Self {
        Self::start(None, StopFlag::new())
    }

    /// True once the budget is exhausted or a stop was requested.
    pub fn time_up(&self) -> bool {
        if self.stop.is_raised() {
            return true;
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => {
                self.stop.raise();
                true
            }
            _ => false,
        }
    }

    /// Whether the node counter warrants a clock check.
    #[inline]
    pub fn should_check(&self, nodes: u64) -> bool {
        nodes % CHECK_INTERVAL == 0
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

impl Default for SearchClock {
    fn default() -> Self {
        Self::unlimited()
    }
}

/// Depth and time bounds for one search invocation.
#[derive(Debug, Clone)]
pub struct SearchLimits {
    /// Maximum search depth in plies
    pub depth: u8,
    /// Clock the search checks while recursing
    pub clock: SearchClock,
}

impl SearchLimits {
    /// Depth-only limits with no time bound.
    pub fn depth(depth: u8) -> Self {
        Self {
            depth,
            clock: SearchClock::unlimited(),
        }
    }

    /// Depth plus a wall-clock budget, cancellable through `stop`.
    pub fn timed(depth: u8, budget: Duration, stop: StopFlag) -> Self {
        Self {
            depth,
            clock: SearchClock::start(Some(budget), stop),
        }
    }
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self::depth(4)
    }
}

#[cfg(test)]
#[path = "time_control_tests.rs"]
mod time_control_tests;
