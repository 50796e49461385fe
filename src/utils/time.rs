use std::sync::OnceLock;
use std::time::{Duration, Instant};

/// Process-wide origin for the monotonic clock. Fixed on first read.
static ORIGIN: OnceLock<Instant> = OnceLock::new();

#[inline(always)]
fn origin() -> Instant {
    *ORIGIN.get_or_init(Instant::now)
}

/// Milliseconds elapsed on the monotonic clock since the process origin.
///
/// Never follows wall-clock adjustments, so `now_ms() - earlier` is always the real elapsed time.
#[inline(always)]
pub fn now_ms() -> u64 {
    origin().elapsed().as_millis() as u64
}

/// Microseconds elapsed on the monotonic clock since the process origin.
#[inline(always)]
pub fn now_us() -> u64 {
    origin().elapsed().as_micros() as u64
}

/// Best-effort sleep with nanosecond granularity.
///
/// The OS may round the request up to its timer resolution.
#[inline]
pub fn sleep_ns(ns: u64) {
    if ns == 0 {
        std::thread::yield_now();
        return;
    }
    std::thread::sleep(Duration::from_nanos(ns));
}

/// Elapsed milliseconds between two clock reads; an earlier `now` saturates to zero.
#[inline(always)]
pub fn elapsed_ms(now: u64, since: u64) -> u64 {
    now.saturating_sub(since)
}
