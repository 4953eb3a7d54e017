//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Fixed-period tick timers
//! - Pointer coordinate translation (web)

#[cfg(target_arch = "wasm32")]
pub mod web;

/// Handle for an active periodic timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(pub u32);

/// Source of periodic tick callbacks.
///
/// What a firing does is up to the implementation; the driver only needs to
/// arm and cancel timers so that at most one is live.
pub trait TickScheduler {
    /// Arm a repeating timer; `None` if the platform refused
    fn schedule(&mut self, period_ms: u32) -> Option<TimerId>;
    /// Disarm a timer. Unknown or already-cancelled ids are ignored.
    fn cancel(&mut self, id: TimerId);
}

#[derive(Debug, Clone)]
struct ManualTimer {
    id: TimerId,
    period_ms: u32,
    elapsed_ms: u64,
}

/// Scheduler driven by explicit time advancement.
///
/// Used for headless runs and tests: `advance` reports how many times the
/// armed timers fired over the elapsed span.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    timers: Vec<ManualTimer>,
    next_id: u32,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of armed timers
    pub fn active(&self) -> usize {
        self.timers.len()
    }

    /// Let `ms` milliseconds pass; returns total firings across all timers
    pub fn advance(&mut self, ms: u64) -> u64 {
        let mut fired = 0;
        for timer in &mut self.timers {
            let period = timer.period_ms.max(1) as u64;
            let before = timer.elapsed_ms / period;
            timer.elapsed_ms += ms;
            fired += timer.elapsed_ms / period - before;
        }
        fired
    }
}

impl TickScheduler for ManualScheduler {
    fn schedule(&mut self, period_ms: u32) -> Option<TimerId> {
        self.next_id += 1;
        let id = TimerId(self.next_id);
        self.timers.push(ManualTimer {
            id,
            period_ms,
            elapsed_ms: 0,
        });
        Some(id)
    }

    fn cancel(&mut self, id: TimerId) {
        self.timers.retain(|t| t.id != id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_scheduler_fires_per_period() {
        let mut sched = ManualScheduler::new();
        let id = sched.schedule(50).unwrap();
        assert_eq!(sched.advance(49), 0);
        assert_eq!(sched.advance(1), 1);
        assert_eq!(sched.advance(125), 2);

        sched.cancel(id);
        assert_eq!(sched.active(), 0);
        assert_eq!(sched.advance(1000), 0);
    }

    #[test]
    fn test_cancel_unknown_is_noop() {
        let mut sched = ManualScheduler::new();
        sched.schedule(10);
        sched.cancel(TimerId(999));
        assert_eq!(sched.active(), 1);
    }
}
