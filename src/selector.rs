/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! Weighted, anti-repeat stochastic mood selection.
//!
//! # How the next mood is chosen
//!
//! Every candidate mood gets a non-negative weight made of five independent
//! terms:
//!
//! | Term | Range | Effect |
//! |------|-------|--------|
//! | base | 200 | keeps every mood reachable |
//! | adjacency | 0–255 | favours moods close in (valence, arousal); staying scores a flat 40 |
//! | recency | 0–240 | moods seen in the last six changes score lower, the newest lowest |
//! | pattern | 200 − penalty … 200 | discourages repeating the current waveform kind |
//! | bias | 0–200 | leans toward moods matching the motion-derived affect bias |
//!
//! One LFSR draw is scaled into the cumulative weight range to pick a
//! candidate. A hard post-filter then refuses the current mood and the most
//! recent history entry, stepping forward through the catalog until the
//! pick differs from both.
//!
//! # Invariants
//!
//! - History is written only when the target accepts the change.
//! - An invalid bias contributes exactly 0 to every candidate.
//! - Selection is bit-for-bit reproducible from the seed.

use core::fmt;

use heapless::HistoryBuffer;
use tracing::debug;

use crate::catalog::{affect_of, Affect};
use crate::clock;
use crate::lfsr::Lfsr16;
use crate::target::{MoodError, MoodTarget};

// ─── Weight constants ────────────────────────────────────────────────────────

/// Number of recent mood changes remembered.
pub const HISTORY_LEN: usize = 6;

const BASE_WEIGHT: u16 = 200;
const STAY_WEIGHT: u16 = 40;
const ADJACENCY_MAX: u16 = 255;
const RECENCY_STEP: u16 = 40;
const RECENCY_MAX: u16 = 240;
const PATTERN_WEIGHT: u16 = 200;
const BIAS_MAX: u16 = 200;

/// Neutral midpoint of the 0–255 bias scales.
pub const BIAS_NEUTRAL: u8 = 128;

// ─── MoodHistory ─────────────────────────────────────────────────────────────

/// The last [`HISTORY_LEN`] selected mood indices, oldest overwritten first.
///
/// Unfilled slots are simply absent: a fresh history has no last entry and
/// penalises nothing.
#[derive(Clone)]
pub struct MoodHistory {
    ring: HistoryBuffer<u8, HISTORY_LEN>,
}

impl MoodHistory {
    /// Empty history.
    pub fn new() -> Self {
        Self {
            ring: HistoryBuffer::new(),
        }
    }

    /// Record a selected mood, evicting the oldest entry when full.
    pub fn push(&mut self, index: u8) {
        self.ring.write(index);
    }

    /// Most recently pushed index.
    pub fn last(&self) -> Option<u8> {
        self.ring.recent().copied()
    }

    /// Number of filled slots.
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    /// `true` before the first push.
    pub fn is_empty(&self) -> bool {
        self.ring.len() == 0
    }

    /// Forget every entry.
    pub fn clear(&mut self) {
        self.ring.clear();
    }

    /// `true` if `index` is anywhere in the history.
    pub fn contains(&self, index: u8) -> bool {
        self.ring.oldest_ordered().any(|&i| i == index)
    }

    /// Sum of `(HISTORY_LEN − age) × 40` over entries equal to `index`,
    /// where age 0 is the most recent entry.
    pub fn recency_penalty(&self, index: u8) -> u16 {
        let len = self.ring.len();
        self.ring
            .oldest_ordered()
            .enumerate()
            .filter(|&(_, &i)| i == index)
            .map(|(pos, _)| {
                let age = len - 1 - pos;
                (HISTORY_LEN - age) as u16 * RECENCY_STEP
            })
            .sum()
    }
}

impl Default for MoodHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MoodHistory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.ring.oldest_ordered()).finish()
    }
}

// ─── Bias ────────────────────────────────────────────────────────────────────

/// Smoothed external affect bias.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bias {
    /// 0 calm … 255 intense.
    pub arousal: u8,
    /// 0 negative … 255 positive.
    pub valence: u8,
    /// Whether the bias may influence selection at all.
    pub valid: bool,
}

impl Bias {
    /// (128, 128), invalid.
    pub const NEUTRAL: Bias = Bias {
        arousal: BIAS_NEUTRAL,
        valence: BIAS_NEUTRAL,
        valid: false,
    };
}

impl Default for Bias {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

// ─── SelectorConfig ──────────────────────────────────────────────────────────

/// Tuning for [`MoodSelector`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SelectorConfig {
    /// Initial LFSR state, mixed with the entropy passed to `begin`.
    /// Default 0xBEEF.
    pub seed: u16,
    /// Initial aversion to repeating the current waveform kind, 0–255.
    /// Default 120.
    pub pattern_penalty: u8,
    /// Bias smoothing: each valid sample moves the bias by
    /// `(input − bias) >> shift`. Default 2.
    pub bias_smoothing_shift: u8,
    /// Arousal floor applied to a valid bias while a startle boost is active.
    /// Default 220.
    pub startle_boost_strength: u8,
    /// Duration of a startle boost in milliseconds. Default 3000.
    pub startle_boost_ms: u16,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            seed: 0xBEEF,
            pattern_penalty: 120,
            bias_smoothing_shift: 2,
            startle_boost_strength: 220,
            startle_boost_ms: 3000,
        }
    }
}

// ─── CandidateWeights ────────────────────────────────────────────────────────

/// The five weight terms of one candidate, exposed for inspection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CandidateWeights {
    /// Constant reachability weight.
    pub base: u16,
    /// Affect-space closeness to the current mood.
    pub adjacency: u16,
    /// Inverted history penalty.
    pub recency: u16,
    /// Waveform-kind repeat aversion.
    pub pattern: u16,
    /// External bias contribution.
    pub bias: u16,
}

impl CandidateWeights {
    /// Sum of all five terms.
    pub fn total(&self) -> u16 {
        self.base + self.adjacency + self.recency + self.pattern + self.bias
    }
}

// ─── MoodSelector ────────────────────────────────────────────────────────────

/// Chooses each next mood for a [`MoodTarget`].
#[derive(Clone, Debug)]
pub struct MoodSelector {
    config: SelectorConfig,
    rng: Lfsr16,
    history: MoodHistory,
    pattern_penalty: u8,
    bias: Bias,
    boost: Option<StartleBoost>,
}

/// An armed startle boost: arousal floor `strength` for `duration_ms` after
/// `start_ms`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct StartleBoost {
    start_ms: u32,
    duration_ms: u16,
    strength: u8,
}

impl StartleBoost {
    fn is_live(&self, now_ms: u32) -> bool {
        clock::within(now_ms, self.start_ms, self.duration_ms as u32)
    }
}

impl MoodSelector {
    /// Construct a selector with an empty history and a neutral, invalid bias.
    pub fn new(config: SelectorConfig) -> Self {
        Self {
            rng: Lfsr16::new(config.seed),
            pattern_penalty: config.pattern_penalty,
            history: MoodHistory::new(),
            bias: Bias::NEUTRAL,
            boost: None,
            config,
        }
    }

    /// Reset the random source from the configured seed mixed with
    /// `entropy`, and clear the history.
    pub fn begin(&mut self, entropy: u16) {
        self.rng = Lfsr16::new(self.config.seed);
        self.rng.mix(entropy);
        self.history.clear();
    }

    /// Configuration this selector was built with.
    pub fn config(&self) -> &SelectorConfig {
        &self.config
    }

    /// Set the aversion to repeating the current waveform kind.
    pub fn set_pattern_penalty(&mut self, penalty: u8) {
        self.pattern_penalty = penalty;
    }

    /// Current waveform-repeat aversion.
    pub fn pattern_penalty(&self) -> u8 {
        self.pattern_penalty
    }

    /// Recent selections.
    pub fn history(&self) -> &MoodHistory {
        &self.history
    }

    /// Current smoothed bias.
    pub fn bias(&self) -> Bias {
        self.bias
    }

    /// Feed one bias sample.
    ///
    /// A valid sample moves the smoothed values toward the input; an invalid
    /// one resets the bias to neutral and invalid.
    pub fn set_bias(&mut self, arousal: u8, valence: u8, valid: bool) {
        if !valid {
            self.bias = Bias::NEUTRAL;
            return;
        }
        let k = self.config.bias_smoothing_shift.min(7);
        let smooth = |cur: u8, input: u8| -> u8 {
            let step = (input as i16 - cur as i16) >> k;
            (cur as i16 + step) as u8
        };
        self.bias = Bias {
            arousal: smooth(self.bias.arousal, arousal),
            valence: smooth(self.bias.valence, valence),
            valid: true,
        };
    }

    /// Raise the arousal floor of a valid bias to `strength` for
    /// `duration_ms` starting at `now_ms`. A later call replaces the boost.
    pub fn set_startle_boost(&mut self, strength: u8, duration_ms: u16, now_ms: u32) {
        self.boost = Some(StartleBoost { start_ms: now_ms, duration_ms, strength });
        debug!(strength, duration_ms, "startle boost armed");
    }

    /// `true` while a startle boost is in effect.
    ///
    /// Measured as elapsed time since the boost started, so a stale boost
    /// stays expired across the signed half of the counter. [`advance`]
    /// drops expired boosts for good.
    ///
    /// [`advance`]: Self::advance
    pub fn is_startle_boosted(&self, now_ms: u32) -> bool {
        self.boost_strength(now_ms).is_some()
    }

    fn boost_strength(&self, now_ms: u32) -> Option<u8> {
        self.boost
            .filter(|b| b.is_live(now_ms))
            .map(|b| b.strength)
    }

    /// Pick the next mood and apply it to `target`.
    ///
    /// Returns the applied index. When the target refuses the change the
    /// error is returned and the history is left untouched.
    pub fn advance<T: MoodTarget + ?Sized>(
        &mut self,
        target: &mut T,
        now_ms: u32,
    ) -> Result<u8, MoodError> {
        let count = target.mood_count();
        if count == 0 {
            return Err(MoodError::InvalidIndex { index: 0, count: 0 });
        }
        if self.boost.is_some_and(|b| !b.is_live(now_ms)) {
            self.boost = None;
        }
        let current = target.current_mood_index();
        let view: &T = target;

        let total: u32 = (0..count)
            .map(|i| self.candidate_weights(view, current, i, now_ms).total() as u32)
            .sum();
        let draw = self.rng.next_u16();
        let picked = if total == 0 {
            (draw % count as u16) as u8
        } else {
            let scaled = (draw as u32 * total) >> 16;
            let mut acc = 0u32;
            let mut choice = count - 1;
            for i in 0..count {
                acc += self.candidate_weights(view, current, i, now_ms).total() as u32;
                if scaled < acc {
                    choice = i;
                    break;
                }
            }
            choice
        };

        let next = self.reject_repeats(picked, current, count);
        target.set_mood_by_index(next, now_ms)?;
        self.history.push(next);
        debug!(from = current, to = next, picked, total, "mood advanced");
        Ok(next)
    }

    /// Step `picked` forward until it is neither `current` nor the last
    /// history entry. Gives up after `count` steps (catalogs of two or fewer).
    fn reject_repeats(&self, picked: u8, current: u8, count: u8) -> u8 {
        let last = self.history.last();
        let mut next = picked;
        for _ in 0..count {
            if next != current && Some(next) != last {
                break;
            }
            next = ((next as u16 + 1) % count as u16) as u8;
        }
        next
    }

    /// All five weight terms for moving from `current` to `candidate`.
    pub fn candidate_weights<T: MoodTarget + ?Sized>(
        &self,
        target: &T,
        current: u8,
        candidate: u8,
        now_ms: u32,
    ) -> CandidateWeights {
        CandidateWeights {
            base: BASE_WEIGHT,
            adjacency: adjacency_weight(current, candidate),
            recency: RECENCY_MAX - self.history.recency_penalty(candidate).min(RECENCY_MAX),
            pattern: self.pattern_weight(target, current, candidate),
            bias: self.bias_weight(candidate, now_ms),
        }
    }

    fn pattern_weight<T: MoodTarget + ?Sized>(&self, target: &T, current: u8, candidate: u8) -> u16 {
        if target.pattern_of_index(current) != target.pattern_of_index(candidate) {
            PATTERN_WEIGHT
        } else {
            PATTERN_WEIGHT - self.pattern_penalty.min(PATTERN_WEIGHT as u8) as u16
        }
    }

    /// Bias contribution for `candidate`, 0–200.
    ///
    /// Arousal is two-sided: high-arousal moods gain in proportion to the
    /// bias arousal, low-arousal moods in proportion to its complement.
    /// Valence only ever rewards a matching sign. The sum is scaled by 3/2
    /// and capped.
    pub fn bias_weight(&self, candidate: u8, now_ms: u32) -> u16 {
        if !self.bias.valid {
            return 0;
        }
        let mut arousal = self.bias.arousal;
        if let Some(strength) = self.boost_strength(now_ms) {
            arousal = arousal.max(strength);
        }
        bias_boost(affect_of(candidate), arousal, self.bias.valence)
    }
}

impl Default for MoodSelector {
    fn default() -> Self {
        Self::new(SelectorConfig::default())
    }
}

fn adjacency_weight(from: u8, to: u8) -> u16 {
    if from == to {
        return STAY_WEIGHT;
    }
    let dist = affect_of(from).distance(affect_of(to));
    ADJACENCY_MAX.saturating_sub(dist * 2)
}

fn bias_boost(mood: Affect, arousal: u8, valence: u8) -> u16 {
    let pos_a = mood.arousal.max(0) as u32;
    let neg_a = (-(mood.arousal as i16)).max(0) as u32;
    let a_hi = pos_a * arousal as u32 / 255;
    let a_lo = neg_a * (255 - arousal as u32) / 255;

    let bias_v = valence as i32 * 200 / 255 - 100;
    let v_boost = (mood.valence as i32 * bias_v / 100).max(0) as u32;

    let boost = (a_hi + a_lo + v_boost) * 3 / 2;
    boost.min(BIAS_MAX as u32) as u16
}
