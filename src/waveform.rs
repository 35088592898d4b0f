//! Hold-phase modulation waveforms.
//!
//! Each function maps time since the hold began (`t`, ms) and the mood's
//! period (`p`, ms) to a modulation magnitude in 0–255. A zero period is
//! treated as constant full modulation.

/// Symmetric triangle: 0 → 255 over the first half of the period, back to
/// 0 over the second half.
///
/// ```
/// use moodlight_core::waveform::triangle_wave;
/// assert_eq!(triangle_wave(0, 1000), 0);
/// assert_eq!(triangle_wave(500, 1000), 255);
/// ```
pub fn triangle_wave(t: u32, p: u16) -> u8 {
    if p == 0 {
        return 255;
    }
    let m = t % p as u32;
    let h = (p as u32 / 2).max(1);
    if m < h {
        (m * 255 / h).min(255) as u8
    } else {
        let d = m - h;
        255u32.saturating_sub(d * 255 / h) as u8
    }
}

/// Square pulse: 255 for the first `duty/256` of the period, else 0.
pub fn pulse_wave(t: u32, p: u16, duty: u8) -> u8 {
    if p == 0 {
        return 255;
    }
    let m = t % p as u32;
    let threshold = (p as u32 * duty as u32) >> 8;
    if m < threshold {
        255
    } else {
        0
    }
}

/// Two full beats (0–10% and 14–24% of the period) followed by a linear
/// decay tail from 200 to 0 over the next 8%, silent for the rest.
pub fn heartbeat_wave(t: u32, p: u16) -> u8 {
    if p == 0 {
        return 255;
    }
    let p = p as u32;
    let m = t % p;

    let first_off = p * 10 / 100;
    let second_on = p * 14 / 100;
    let second_off = p * 24 / 100;

    if m < first_off || (second_on..second_off).contains(&m) {
        return 255;
    }

    let tail = p * 8 / 100;
    if m >= second_off && m < second_off + tail {
        let d = m - second_off;
        return (200 - d * 200 / tail.max(1)) as u8;
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_triangle_edges() {
        assert_eq!(triangle_wave(0, 1000), 0);
        assert_eq!(triangle_wave(500, 1000), 255);
        // 499 into the falling half: 255 − ⌊499·255/500⌋ = 1
        assert_eq!(triangle_wave(999, 1000), 1);
        assert!(triangle_wave(999, 1000) <= 2);
    }

    #[test]
    fn test_triangle_monotonic_halves() {
        let mut prev = 0;
        for t in 0..=500 {
            let w = triangle_wave(t, 1000);
            assert!(w >= prev, "rising half not monotonic at t={}", t);
            prev = w;
        }
        for t in 500..1000 {
            let w = triangle_wave(t, 1000);
            assert!(w <= prev, "falling half not monotonic at t={}", t);
            prev = w;
        }
    }

    #[test]
    fn test_triangle_peaks_at_half_period() {
        assert_eq!(triangle_wave(499, 1000), 254);
        assert_eq!(triangle_wave(500, 1000), 255);
        assert_eq!(triangle_wave(502, 1000), 254);
    }

    #[test]
    fn test_triangle_wraps_period() {
        assert_eq!(triangle_wave(1250, 1000), triangle_wave(250, 1000));
    }

    #[test]
    fn test_zero_period_is_full() {
        assert_eq!(triangle_wave(123, 0), 255);
        assert_eq!(pulse_wave(123, 0, 60), 255);
        assert_eq!(heartbeat_wave(123, 0), 255);
    }

    #[test]
    fn test_pulse_duty() {
        // 1000 · 64 / 256 = 250
        assert_eq!(pulse_wave(0, 1000, 64), 255);
        assert_eq!(pulse_wave(249, 1000, 64), 255);
        assert_eq!(pulse_wave(250, 1000, 64), 0);
        assert_eq!(pulse_wave(999, 1000, 64), 0);
        assert_eq!(pulse_wave(500, 1000, 0), 0);
    }

    #[test]
    fn test_heartbeat_phases() {
        let p = 1000;
        assert_eq!(heartbeat_wave(0, p), 255);
        assert_eq!(heartbeat_wave(99, p), 255);
        assert_eq!(heartbeat_wave(100, p), 0);
        assert_eq!(heartbeat_wave(139, p), 0);
        assert_eq!(heartbeat_wave(140, p), 255);
        assert_eq!(heartbeat_wave(239, p), 255);
        assert_eq!(heartbeat_wave(240, p), 200);
        assert_eq!(heartbeat_wave(280, p), 100);
        assert_eq!(heartbeat_wave(320, p), 0);
        assert_eq!(heartbeat_wave(900, p), 0);
    }
}
