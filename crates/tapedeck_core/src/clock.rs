//! Monotonic clock and precise waiter.
//!
//! All event timestamps are seconds on a process-wide monotonic clock.
//! Wall-clock adjustments never affect it, so only relative deltas between
//! timestamps are meaningful.

use std::sync::OnceLock;
use std::thread;
use std::time::{Duration, Instant};

static ANCHOR: OnceLock<Instant> = OnceLock::new();

/// Longest single sleep the precise waiter will issue.
///
/// OS sleep primitives have multi-millisecond granularity, so the waiter
/// polls near the deadline instead of issuing one coarse sleep.
const MAX_POLL_SLEEP: Duration = Duration::from_millis(1);

fn anchor() -> Instant {
    *ANCHOR.get_or_init(Instant::now)
}

/// Current monotonic time in seconds.
///
/// The zero point is the first call within this process; values are only
/// comparable to other readings from the same process run.
pub fn now() -> f64 {
    anchor().elapsed().as_secs_f64()
}

/// Block the calling thread for approximately `delay_secs`.
///
/// Returns immediately for zero or negative delays. Otherwise sleeps in
/// halving increments (capped at 1 ms) until an absolute deadline passes,
/// trading CPU for sub-millisecond accuracy. Not cancellable mid-wait;
/// callers that need cancellation check between waits.
pub fn precise_wait(delay_secs: f64) {
    if delay_secs <= 0.0 {
        return;
    }
    let target = Instant::now() + Duration::from_secs_f64(delay_secs);
    loop {
        let now = Instant::now();
        if now >= target {
            break;
        }
        let remaining = target - now;
        thread::sleep((remaining / 2).min(MAX_POLL_SLEEP));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_is_monotonic() {
        let a = now();
        let b = now();
        let c = now();
        assert!(a <= b);
        assert!(b <= c);
    }

    #[test]
    fn test_zero_and_negative_delays_return_immediately() {
        let start = Instant::now();
        precise_wait(0.0);
        precise_wait(-1.0);
        assert!(start.elapsed() < Duration::from_millis(5));
    }

    #[test]
    fn test_wait_accuracy() {
        let start = Instant::now();
        precise_wait(0.02);
        let elapsed = start.elapsed();

        assert!(elapsed >= Duration::from_millis(20), "woke early: {elapsed:?}");
        // Generous upper bound for loaded CI machines.
        assert!(elapsed < Duration::from_millis(70), "woke late: {elapsed:?}");
    }

    #[test]
    fn test_short_wait_does_not_undershoot() {
        for _ in 0..5 {
            let start = Instant::now();
            precise_wait(0.002);
            assert!(start.elapsed() >= Duration::from_millis(2));
        }
    }
}
