/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! Motion-envelope conditioning: raw accelerometer axes in, affect bias out.
//!
//! # Pipeline
//!
//! ```text
//! read_axes ─► >> raw_shift ─► |x|+|y|+|z| ─► MotionBaseline (EWMA) ─► delta
//!                                                                        │
//!                          ┌─────────────────────────────────────────────┤
//!                          ▼                                             ▼
//!                    SchmittGate ──open──► arousal = delta >> scale   StartleDetector
//! ```
//!
//! - [`MotionBaseline`]: slow exponentially-weighted baseline of the L1
//!   magnitude; `delta` is the distance of the current sample from it.
//! - [`SchmittGate`]: opens above `gate_on`, closes below `gate_off`. Only an
//!   open gate yields a valid signal.
//! - [`StartleDetector`]: confirms sudden jolts (large delta or large jerk)
//!   and rate-limits them with a cooldown.
//!
//! # Invariants
//!
//! - `gate_on > gate_off` for every constructed gate.
//! - Every early exit (disabled, absent, too early, bus failure) yields
//!   [`SensorSignal::NEUTRAL`].
//! - Bus failures are never fatal; sampling retries on the next interval.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::clock;
use crate::selector::BIAS_NEUTRAL;

// ─── Device seam ─────────────────────────────────────────────────────────────

/// Why an accelerometer operation failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum SensorError {
    /// Transient bus error; the next read may succeed.
    #[error("accelerometer bus communication failed")]
    Communication,
    /// The device did not answer its identity check.
    #[error("accelerometer not detected")]
    Absent,
}

/// A three-axis accelerometer.
///
/// Implementations talk to the actual hardware (I²C, SPI, a simulator); the
/// conditioner only sees raw left-aligned axis counts.
pub trait Accelerometer {
    /// Detect and configure the device. Called once from
    /// [`SignalConditioner::begin`].
    fn init(&mut self) -> Result<(), SensorError>;

    /// Read one raw `[x, y, z]` sample.
    fn read_axes(&mut self) -> Result<[i16; 3], SensorError>;
}

impl<A: Accelerometer + ?Sized> Accelerometer for &mut A {
    fn init(&mut self) -> Result<(), SensorError> {
        (**self).init()
    }

    fn read_axes(&mut self) -> Result<[i16; 3], SensorError> {
        (**self).read_axes()
    }
}

// ─── SensorConfig ────────────────────────────────────────────────────────────

/// Tuning for [`SignalConditioner`].
///
/// Default values:
/// - Sample every 40 ms (≈25 Hz), α = 8/255 (slow baseline).
/// - Gate: enter above 24, exit below 16 (8-count deadband).
/// - Startle: delta above 40 or jerk above 30, one confirming sample,
///   900 ms flag, 4000 ms cooldown.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SensorConfig {
    /// Minimum interval between device reads, ms.
    pub sample_interval_ms: u16,
    /// EWMA weight of a new sample, in 1/255ths.
    pub ewma_alpha: u8,
    /// Right shift applied to raw axis counts (left-aligned 12-bit → 4).
    pub raw_shift: u8,
    /// Delta above which a closed gate opens.
    pub gate_on: u16,
    /// Delta below which an open gate closes.
    pub gate_off: u16,
    /// Right shift turning delta into the 0–255 arousal scale.
    pub scale_shift: u8,
    /// Absolute delta that arms the startle detector.
    pub startle_abs: u16,
    /// Jerk (sample-to-sample delta increase) that arms the startle detector.
    pub startle_jerk: u16,
    /// Consecutive arming samples required to fire.
    pub startle_confirm: u8,
    /// How long the startle flag stays raised, ms.
    pub startle_ms: u16,
    /// Minimum gap between startles, ms.
    pub startle_cooldown_ms: u16,
    /// Consecutive read failures that trigger the one-shot warning.
    pub failure_warn_count: u8,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            sample_interval_ms: 40,
            ewma_alpha: 8,
            raw_shift: 4,
            gate_on: 24,
            gate_off: 16,
            scale_shift: 2,
            startle_abs: 40,
            startle_jerk: 30,
            startle_confirm: 1,
            startle_ms: 900,
            startle_cooldown_ms: 4000,
            failure_warn_count: 3,
        }
    }
}

// ─── MotionBaseline ──────────────────────────────────────────────────────────

/// Exponentially-weighted moving average of the motion magnitude.
///
/// The first update seeds the baseline. Later updates move it by
/// `(l1 − baseline)·α/255`, rounded away from zero, so a constant input is
/// reached exactly instead of stalling just short of it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MotionBaseline {
    value: Option<u32>,
    alpha: u8,
}

impl MotionBaseline {
    /// Unseeded baseline with weight `alpha / 255`.
    pub const fn new(alpha: u8) -> Self {
        Self { value: None, alpha }
    }

    /// Current baseline; `None` before the first update.
    pub fn value(&self) -> Option<u32> {
        self.value
    }

    /// Fold in one magnitude sample and return `|l1 − baseline|` against
    /// the updated baseline.
    pub fn update(&mut self, l1: u32) -> u32 {
        let b = match self.value {
            None => l1,
            Some(b) => {
                let diff = l1 as i64 - b as i64;
                let step = (diff.unsigned_abs() * self.alpha as u64 + 254) / 255;
                if diff >= 0 {
                    b + step as u32
                } else {
                    b - step as u32
                }
            }
        };
        self.value = Some(b);
        l1.abs_diff(b)
    }

    /// Forget the baseline; the next update reseeds it.
    pub fn reset(&mut self) {
        self.value = None;
    }
}

// ─── SchmittGate ─────────────────────────────────────────────────────────────

/// Two-threshold noise gate with hysteresis.
///
/// A delta between the two thresholds never changes the gate state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SchmittGate {
    on: u16,
    off: u16,
    open: bool,
}

impl SchmittGate {
    /// Closed gate. If `on <= off`, `on` is raised to `off + 1` (or `off`
    /// lowered when already at the ceiling) so the deadband is never empty.
    pub fn new(on: u16, off: u16) -> Self {
        let (on, off) = if on > off {
            (on, off)
        } else if off < u16::MAX {
            (off + 1, off)
        } else {
            (u16::MAX, u16::MAX - 1)
        };
        Self { on, off, open: false }
    }

    /// Enter threshold.
    pub fn on_threshold(&self) -> u16 {
        self.on
    }

    /// Exit threshold.
    pub fn off_threshold(&self) -> u16 {
        self.off
    }

    /// Feed one delta; returns the new state.
    pub fn update(&mut self, delta: u32) -> bool {
        if self.open {
            if delta < self.off as u32 {
                self.open = false;
            }
        } else if delta > self.on as u32 {
            self.open = true;
        }
        self.open
    }

    /// `true` while open.
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Force the gate closed.
    pub fn close(&mut self) {
        self.open = false;
    }
}

// ─── StartleDetector ─────────────────────────────────────────────────────────

/// Confirms sudden jolts and rate-limits them.
#[derive(Clone, Copy, Debug)]
pub struct StartleDetector {
    gate: u32,
    abs_on: u32,
    jerk_on: u32,
    confirm: u8,
    flag_ms: u16,
    cooldown_ms: u16,
    armed: u8,
    prev_delta: u32,
    fired_at: Option<u32>,
}

impl StartleDetector {
    /// Build from config; `gate` is the delta every hit must exceed.
    pub fn new(gate: u16, config: &SensorConfig) -> Self {
        Self {
            gate: gate as u32,
            abs_on: config.startle_abs as u32,
            jerk_on: config.startle_jerk as u32,
            confirm: config.startle_confirm.max(1),
            flag_ms: config.startle_ms,
            cooldown_ms: config.startle_cooldown_ms,
            armed: 0,
            prev_delta: 0,
            fired_at: None,
        }
    }

    /// Feed one delta. Returns `true` when this sample fires a new startle.
    ///
    /// Forgets the last event once both its flag and its cooldown have run
    /// out.
    pub fn update(&mut self, delta: u32, now_ms: u32) -> bool {
        let hold = self.flag_ms.max(self.cooldown_ms) as u32;
        if self.fired_at.is_some_and(|at| !clock::within(now_ms, at, hold)) {
            self.fired_at = None;
        }
        let jerk = delta.saturating_sub(self.prev_delta);
        self.prev_delta = delta;

        let hit = delta > self.gate && (delta > self.abs_on || jerk > self.jerk_on);
        if !hit {
            self.armed = 0;
            return false;
        }
        self.armed = self.armed.saturating_add(1);
        if self.armed < self.confirm {
            return false;
        }
        let cooling = self
            .fired_at
            .is_some_and(|at| clock::within(now_ms, at, self.cooldown_ms as u32));
        if cooling {
            return false;
        }
        self.armed = 0;
        self.fired_at = Some(now_ms);
        true
    }

    /// `true` while the startle flag is raised.
    pub fn is_active(&self, now_ms: u32) -> bool {
        self.fired_at
            .is_some_and(|at| clock::within(now_ms, at, self.flag_ms as u32))
    }

    /// Consecutive arming samples seen so far.
    pub fn armed_count(&self) -> u8 {
        self.armed
    }

    /// Drop any partial confirmation.
    pub fn disarm(&mut self) {
        self.armed = 0;
        self.prev_delta = 0;
    }
}

// ─── SensorSignal ────────────────────────────────────────────────────────────

/// One conditioned sample.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SensorSignal {
    /// 0 calm … 255 intense.
    pub arousal_bias: u8,
    /// 0 negative … 255 positive. Always neutral from motion alone.
    pub valence_bias: u8,
    /// `true` only when the gate is open on this sample.
    pub valid: bool,
    /// `true` on the sample that fired a new startle event.
    pub startled: bool,
}

impl SensorSignal {
    /// Neutral, invalid, no startle.
    pub const NEUTRAL: SensorSignal = SensorSignal {
        arousal_bias: BIAS_NEUTRAL,
        valence_bias: BIAS_NEUTRAL,
        valid: false,
        startled: false,
    };
}

impl Default for SensorSignal {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

// ─── SignalConditioner ───────────────────────────────────────────────────────

/// Turns accelerometer readings into an affect bias.
#[derive(Debug)]
pub struct SignalConditioner<A> {
    accel: A,
    config: SensorConfig,
    baseline: MotionBaseline,
    gate: SchmittGate,
    startle: StartleDetector,
    begun: bool,
    present: bool,
    enabled: bool,
    diag: bool,
    last_sample_ms: Option<u32>,
    failures: u8,
    last_delta: u32,
}

impl<A: Accelerometer> SignalConditioner<A> {
    /// Wrap `accel`. Sampling is enabled, diagnostics are off and the device
    /// counts as absent until [`begin`](Self::begin) detects it.
    pub fn new(accel: A, config: SensorConfig) -> Self {
        let gate = SchmittGate::new(config.gate_on, config.gate_off);
        Self {
            baseline: MotionBaseline::new(config.ewma_alpha),
            startle: StartleDetector::new(gate.on_threshold(), &config),
            gate,
            accel,
            config,
            begun: false,
            present: false,
            enabled: true,
            diag: false,
            last_sample_ms: None,
            failures: 0,
            last_delta: 0,
        }
    }

    /// Detect the device once. A failed detection leaves the conditioner absent
    /// for its whole lifetime. Later calls are no-ops.
    pub fn begin(&mut self) {
        if self.begun {
            return;
        }
        self.begun = true;
        match self.accel.init() {
            Ok(()) => {
                self.present = true;
                info!("accelerometer detected");
            }
            Err(err) => {
                self.present = false;
                warn!(%err, "accelerometer unavailable; motion input disabled");
            }
        }
    }

    /// Take one sample if the interval has elapsed.
    pub fn sample(&mut self, now_ms: u32) -> SensorSignal {
        if !self.enabled || !self.present {
            return SensorSignal::NEUTRAL;
        }
        if let Some(last) = self.last_sample_ms {
            if clock::elapsed(now_ms, last) < self.config.sample_interval_ms as u32 {
                return SensorSignal::NEUTRAL;
            }
        }
        self.last_sample_ms = Some(now_ms);

        let axes = match self.accel.read_axes() {
            Ok(axes) => axes,
            Err(err) => {
                self.failures = self.failures.saturating_add(1);
                if self.failures == self.config.failure_warn_count {
                    warn!(%err, failures = self.failures, "accelerometer read failing; muted until it recovers");
                }
                return SensorSignal::NEUTRAL;
            }
        };
        self.failures = 0;

        let shift = self.config.raw_shift.min(15);
        let l1: u32 = axes.iter().map(|&a| (a >> shift).unsigned_abs() as u32).sum();
        let delta = self.baseline.update(l1);
        self.last_delta = delta;

        let open = self.gate.update(delta);
        let startled = self.startle.update(delta, now_ms);
        if startled {
            debug!(delta, "startle");
        }

        if !open {
            if self.diag {
                debug!(l1, delta, "gated");
            }
            return SensorSignal { startled, ..SensorSignal::NEUTRAL };
        }

        let arousal = (delta >> self.config.scale_shift.min(31)).min(255) as u8;
        if self.diag {
            debug!(l1, delta, arousal, "motion");
        }
        SensorSignal {
            arousal_bias: arousal,
            valence_bias: BIAS_NEUTRAL,
            valid: true,
            startled,
        }
    }

    // ── Controls ──────────────────────────────────────────────────────────

    /// Enable or disable sampling. Disabling closes the gate and drops any
    /// partial startle confirmation.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.gate.close();
            self.startle.disarm();
        }
    }

    /// Whether sampling is enabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Log every sample at `debug` level.
    pub fn set_diag(&mut self, on: bool) {
        self.diag = on;
    }

    /// Whether diagnostic logging is on.
    pub fn is_diag(&self) -> bool {
        self.diag
    }

    // ── Queries ───────────────────────────────────────────────────────────

    /// Whether [`begin`](Self::begin) detected the device.
    pub fn is_present(&self) -> bool {
        self.present
    }

    /// Whether the noise gate is open.
    pub fn is_gate_open(&self) -> bool {
        self.gate.is_open()
    }

    /// Whether the startle flag is raised at `now_ms`.
    pub fn is_startled(&self, now_ms: u32) -> bool {
        self.startle.is_active(now_ms)
    }

    /// Current motion baseline, `None` before the first good sample.
    pub fn baseline(&self) -> Option<u32> {
        self.baseline.value()
    }

    /// Delta of the most recent good sample.
    pub fn last_delta(&self) -> u32 {
        self.last_delta
    }

    /// Consecutive read failures.
    pub fn failure_count(&self) -> u8 {
        self.failures
    }

    /// Configuration in use.
    pub fn config(&self) -> &SensorConfig {
        &self.config
    }

    /// The wrapped device.
    pub fn accelerometer(&self) -> &A {
        &self.accel
    }

    /// The wrapped device, mutably.
    pub fn accelerometer_mut(&mut self) -> &mut A {
        &mut self.accel
    }
}
