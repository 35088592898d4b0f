//! Wrap-safe arithmetic on the free-running millisecond counter.
//!
//! The host hands every component a `u32` millisecond timestamp that wraps
//! roughly every 49.7 days. Intervals are measured with wrapping subtraction
//! from the moment they started, so they stay correct across the wrap as
//! long as the start is forgotten within one full counter period.

/// Milliseconds elapsed from `since` to `now`, correct across counter wrap.
#[inline]
pub fn elapsed(now: u32, since: u32) -> u32 {
    now.wrapping_sub(since)
}

/// `true` while less than `span` ms have passed since `since`.
#[inline]
pub fn within(now: u32, since: u32, span: u32) -> bool {
    elapsed(now, since) < span
}
