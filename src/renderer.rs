/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! Fade / hold rendering of the current mood.
//!
//! The renderer is a two-phase state machine advanced from [`Renderer::tick`]:
//!
//! ```text
//!            mood change                 steps done
//!   ────────────────────► Fading ─────────────────────► Holding
//!                           ▲                             │
//!                           └──── hold elapsed, selector ◄┘
//!                                 picks next mood
//! ```
//!
//! - **Fading**: linear per-channel interpolation from the color on display
//!   to the new mood's target, one step per `fade_step_ms`, at least one step.
//! - **Holding**: the mood's waveform animates around the target color. Once
//!   the (scaled) hold duration has elapsed and the renderer is not frozen,
//!   it asks the [`MoodSelector`] for the next mood, which restarts the fade.
//!
//! Every catalog color is scaled by the global brightness before any fade or
//! pattern math; pattern amplitude operates on the scaled color.

use tracing::{debug, info, warn};

use crate::catalog::{self, Mood, MoodDefinition, PatternKind, MOOD_COUNT};
use crate::clock;
use crate::color::Rgb8;
use crate::lfsr::Lfsr16;
use crate::selector::MoodSelector;
use crate::target::{MoodError, MoodTarget};
use crate::waveform::{heartbeat_wave, pulse_wave, triangle_wave};

// ─── Output ──────────────────────────────────────────────────────────────────

/// Three-channel PWM light output.
pub trait LightDriver {
    /// Show `color`. Called at most once per tick.
    fn write(&mut self, color: Rgb8);
}

impl<D: LightDriver + ?Sized> LightDriver for &mut D {
    fn write(&mut self, color: Rgb8) {
        (**self).write(color)
    }
}

/// Adapter for common-anode LEDs: inverts every channel before writing.
#[derive(Clone, Debug, Default)]
pub struct CommonAnode<D>(pub D);

impl<D: LightDriver> LightDriver for CommonAnode<D> {
    fn write(&mut self, color: Rgb8) {
        self.0.write(color.inverted())
    }
}

// ─── Config ──────────────────────────────────────────────────────────────────

/// Timing and output tuning for [`Renderer`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RendererConfig {
    /// Total fade duration in milliseconds. Default 1100.
    pub fade_duration_ms: u16,
    /// Minimum interval between fade steps. Default 20; 0 is treated as 20.
    pub fade_step_ms: u16,
    /// Initial global brightness, 0–255. Default 200.
    pub brightness: u8,
    /// Hold duration scale in percent. Default 100.
    pub hold_scale_pct: u16,
    /// Pulse duty cycle in 1/256ths of the period. Default 60 (≈23%).
    pub pulse_duty: u8,
    /// Seed of the flicker jitter LFSR. Default 0xACE1.
    pub flicker_seed: u16,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            fade_duration_ms: 1100,
            fade_step_ms: 20,
            brightness: 200,
            hold_scale_pct: 100,
            pulse_duty: 60,
            flicker_seed: 0xACE1,
        }
    }
}

const DEFAULT_STEP_MS: u16 = 20;

// ─── Phase / status ──────────────────────────────────────────────────────────

/// Which half of the mood cycle the renderer is in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RenderPhase {
    /// Interpolating toward the current mood's target color.
    Fading,
    /// Playing the current mood's waveform.
    Holding,
}

/// Snapshot of the current mood as displayed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MoodStatus {
    /// Current mood.
    pub mood: Mood,
    /// Mood display name.
    pub name: &'static str,
    /// Hold waveform.
    pub pattern: PatternKind,
    /// Base color name.
    pub base_name: &'static str,
    /// Base color after brightness scaling.
    pub base: Rgb8,
    /// Alternate color name, for moods that have one.
    pub alt_name: Option<&'static str>,
    /// Alternate color after brightness scaling.
    pub alt: Option<Rgb8>,
    /// Modulation amplitude.
    pub amplitude: u8,
    /// Waveform period, ms.
    pub period_ms: u16,
    /// Unscaled hold duration, ms.
    pub hold_ms: u16,
    /// Global brightness.
    pub brightness: u8,
    /// Whether automatic advancement is suspended.
    pub frozen: bool,
}

// ─── Renderer ────────────────────────────────────────────────────────────────

/// Owns the light-output state machine.
#[derive(Clone, Debug)]
pub struct Renderer {
    fade_duration_ms: u16,
    fade_step_ms: u16,
    pulse_duty: u8,
    brightness: u8,
    hold_scale_pct: u16,

    mood_index: u8,
    phase: RenderPhase,
    start_color: Rgb8,
    target_color: Rgb8,
    displayed: Rgb8,
    steps_planned: u16,
    step: u16,
    last_step_ms: u32,
    hold_start_ms: u32,
    frozen: bool,
    status_logged: bool,
    flicker: Lfsr16,
}

impl Renderer {
    /// Construct a renderer showing the first catalog mood, fading in from
    /// black starting at `now_ms`.
    pub fn new(config: RendererConfig, now_ms: u32) -> Self {
        let fade_step_ms = if config.fade_step_ms == 0 {
            DEFAULT_STEP_MS
        } else {
            config.fade_step_ms
        };
        let mut r = Self {
            fade_duration_ms: config.fade_duration_ms.max(fade_step_ms),
            fade_step_ms,
            pulse_duty: config.pulse_duty,
            brightness: config.brightness,
            hold_scale_pct: config.hold_scale_pct,
            mood_index: 0,
            phase: RenderPhase::Fading,
            start_color: Rgb8::BLACK,
            target_color: Rgb8::BLACK,
            displayed: Rgb8::BLACK,
            steps_planned: 1,
            step: 0,
            last_step_ms: now_ms,
            hold_start_ms: now_ms,
            frozen: false,
            status_logged: false,
            flicker: Lfsr16::new(config.flicker_seed),
        };
        r.retarget();
        r.start_fade(now_ms);
        r
    }

    /// Mix extra entropy into the flicker jitter source.
    pub fn seed_flicker(&mut self, entropy: u16) {
        self.flicker.mix(entropy);
    }

    /// Advance the state machine by one tick and write the resulting color.
    ///
    /// While holding, an elapsed hold calls back into `selector` to choose
    /// the next mood (unless frozen).
    pub fn tick<D: LightDriver + ?Sized>(
        &mut self,
        now_ms: u32,
        selector: &mut MoodSelector,
        driver: &mut D,
    ) {
        match self.phase {
            RenderPhase::Holding => {
                let out = self.render_hold(now_ms);
                self.show(driver, out);

                if !self.status_logged {
                    self.log_status();
                    self.status_logged = true;
                }
                if self.frozen {
                    return;
                }
                if clock::elapsed(now_ms, self.hold_start_ms) < self.scaled_hold_ms() {
                    return;
                }
                if let Err(err) = selector.advance(self, now_ms) {
                    warn!(%err, "mood advance refused");
                }
            }
            RenderPhase::Fading => {
                if clock::elapsed(now_ms, self.last_step_ms) < self.fade_step_ms as u32 {
                    return;
                }
                self.last_step_ms = now_ms;
                if self.step >= self.steps_planned {
                    let target = self.target_color;
                    self.show(driver, target);
                    self.phase = RenderPhase::Holding;
                    self.hold_start_ms = now_ms;
                    self.status_logged = false;
                    return;
                }
                let out = self
                    .start_color
                    .lerp(self.target_color, self.step, self.steps_planned);
                self.show(driver, out);
                self.step += 1;
            }
        }
    }

    // ── Controls ──────────────────────────────────────────────────────────

    /// Suspend (or resume) automatic advancement at hold expiry. Pattern
    /// rendering continues while frozen.
    pub fn freeze(&mut self, enable: bool) {
        self.frozen = enable;
    }

    /// Set the global brightness; the next written color reflects it.
    pub fn set_global_brightness(&mut self, brightness: u8) {
        self.brightness = brightness;
        self.retarget();
    }

    /// Scale every hold duration by `pct` percent.
    pub fn set_hold_scale(&mut self, pct: u16) {
        self.hold_scale_pct = pct;
    }

    /// Step to the next catalog mood, bypassing the selector.
    pub fn jump_to_next(&mut self, now_ms: u32) {
        let next = ((self.mood_index as usize + 1) % MOOD_COUNT) as u8;
        self.apply_mood(next, now_ms);
    }

    // ── Queries ───────────────────────────────────────────────────────────

    /// Current phase.
    pub fn phase(&self) -> RenderPhase {
        self.phase
    }

    /// Global brightness.
    pub fn brightness(&self) -> u8 {
        self.brightness
    }

    /// Hold duration scale in percent.
    pub fn hold_scale(&self) -> u16 {
        self.hold_scale_pct
    }

    /// Last color written to the output.
    pub fn displayed_color(&self) -> Rgb8 {
        self.displayed
    }

    /// Fade steps planned for every transition.
    pub fn steps_planned(&self) -> u16 {
        self.steps_planned
    }

    /// Catalog entry of the current mood.
    pub fn current_definition(&self) -> &'static MoodDefinition {
        &catalog::MOODS[self.mood_index as usize]
    }

    /// Current mood.
    pub fn current_mood(&self) -> Mood {
        self.current_definition().mood
    }

    /// Display name of the current mood.
    pub fn current_mood_name(&self) -> &'static str {
        self.current_definition().name
    }

    /// Waveform of the current mood.
    pub fn current_pattern(&self) -> PatternKind {
        self.current_definition().pattern
    }

    /// Waveform name of the current mood.
    pub fn current_pattern_name(&self) -> &'static str {
        self.current_pattern().name()
    }

    /// Waveform period of the current mood, ms.
    pub fn current_period_ms(&self) -> u16 {
        self.current_definition().period_ms
    }

    /// Modulation amplitude of the current mood.
    pub fn current_amplitude(&self) -> u8 {
        self.current_definition().amplitude
    }

    /// Unscaled hold duration of the current mood, ms.
    pub fn current_hold_ms(&self) -> u16 {
        self.current_definition().hold_ms
    }

    /// Base color of the current mood after brightness scaling.
    pub fn current_base_color_scaled(&self) -> Rgb8 {
        self.current_definition().base.scaled(self.brightness)
    }

    /// Alternate color of the current mood after brightness scaling; black
    /// when the mood has none.
    pub fn current_alt_color_scaled(&self) -> Rgb8 {
        self.current_definition()
            .alt
            .unwrap_or(Rgb8::BLACK)
            .scaled(self.brightness)
    }

    /// Snapshot of the current mood.
    pub fn status(&self) -> MoodStatus {
        let d = self.current_definition();
        MoodStatus {
            mood: d.mood,
            name: d.name,
            pattern: d.pattern,
            base_name: d.base_name,
            base: self.current_base_color_scaled(),
            alt_name: d.alt_name,
            alt: d.alt.map(|c| c.scaled(self.brightness)),
            amplitude: d.amplitude,
            period_ms: d.period_ms,
            hold_ms: d.hold_ms,
            brightness: self.brightness,
            frozen: self.frozen,
        }
    }

    // ── Internals ─────────────────────────────────────────────────────────

    fn apply_mood(&mut self, index: u8, now_ms: u32) {
        self.mood_index = index;
        self.start_color = self.displayed;
        self.retarget();
        self.start_fade(now_ms);
        debug!(mood = self.current_mood_name(), "fading to mood");
    }

    fn retarget(&mut self) {
        self.target_color = self.current_base_color_scaled();
    }

    fn start_fade(&mut self, now_ms: u32) {
        self.phase = RenderPhase::Fading;
        self.step = 0;
        self.steps_planned = (self.fade_duration_ms / self.fade_step_ms).max(1);
        self.last_step_ms = now_ms;
    }

    fn scaled_hold_ms(&self) -> u32 {
        self.current_hold_ms() as u32 * self.hold_scale_pct as u32 / 100
    }

    fn show<D: LightDriver + ?Sized>(&mut self, driver: &mut D, color: Rgb8) {
        self.displayed = color;
        driver.write(color);
    }

    fn render_hold(&mut self, now_ms: u32) -> Rgb8 {
        let d = self.current_definition();
        let base = self.target_color;
        let t = clock::elapsed(now_ms, self.hold_start_ms);
        let amp = d.amplitude;
        let swell = |w: u8| base.swell(amp, ((w as u16 * amp as u16) >> 8) as u8);

        match d.pattern {
            PatternKind::Static => base,
            PatternKind::Breathe => swell(triangle_wave(t, d.period_ms)),
            PatternKind::Pulse => swell(pulse_wave(t, d.period_ms, self.pulse_duty)),
            PatternKind::Heartbeat => swell(heartbeat_wave(t, d.period_ms)),
            PatternKind::Flicker => {
                let jitter = self.flicker.next_u8() as i16 - 128;
                base.offset(amp as i16 * jitter / 128)
            }
            PatternKind::BlinkAlt => {
                let p = d.period_ms as u32;
                if p == 0 {
                    return base;
                }
                if t % p < p / 2 {
                    self.current_alt_color_scaled()
                } else {
                    base
                }
            }
        }
    }

    fn log_status(&self) {
        let s = self.status();
        info!(
            mood = s.name,
            pattern = s.pattern.name(),
            base = s.base_name,
            r = s.base.r,
            g = s.base.g,
            b = s.base.b,
            alt = s.alt_name.unwrap_or("-"),
            amplitude = s.amplitude,
            period_ms = s.period_ms,
            hold_ms = s.hold_ms,
            brightness = s.brightness,
            frozen = s.frozen,
            "holding mood"
        );
    }
}

impl MoodTarget for Renderer {
    fn mood_count(&self) -> u8 {
        MOOD_COUNT as u8
    }

    fn current_mood_index(&self) -> u8 {
        self.mood_index
    }

    fn set_mood_by_index(&mut self, index: u8, now_ms: u32) -> Result<(), MoodError> {
        if index as usize >= MOOD_COUNT {
            return Err(MoodError::InvalidIndex {
                index,
                count: MOOD_COUNT as u8,
            });
        }
        self.apply_mood(index, now_ms);
        Ok(())
    }

    fn set_mood_by_name(&mut self, name: &str, now_ms: u32) -> Result<(), MoodError> {
        let index = catalog::index_of_name(name).ok_or(MoodError::UnknownName)?;
        self.set_mood_by_index(index, now_ms)
    }

    fn pattern_of_index(&self, index: u8) -> PatternKind {
        catalog::definition(index)
            .unwrap_or(&catalog::MOODS[0])
            .pattern
    }

    fn is_frozen(&self) -> bool {
        self.frozen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        last: Option<Rgb8>,
        writes: usize,
    }

    impl LightDriver for Recorder {
        fn write(&mut self, color: Rgb8) {
            self.last = Some(color);
            self.writes += 1;
        }
    }

    fn fast_config() -> RendererConfig {
        RendererConfig {
            fade_duration_ms: 100,
            fade_step_ms: 20,
            brightness: 255,
            ..RendererConfig::default()
        }
    }

    /// Tick every `step` ms from `from` to `to` inclusive.
    fn run(r: &mut Renderer, sel: &mut MoodSelector, out: &mut Recorder, from: u32, to: u32, step: u32) {
        let mut t = from;
        while t <= to {
            r.tick(t, sel, out);
            t += step;
        }
    }

    #[test]
    fn test_starts_fading_first_mood() {
        let r = Renderer::new(RendererConfig::default(), 0);
        assert_eq!(r.current_mood_index(), 0);
        assert_eq!(r.phase(), RenderPhase::Fading);
        assert_eq!(r.steps_planned(), 55);
    }

    #[test]
    fn test_step_interval_zero_and_short_fade() {
        let r = Renderer::new(
            RendererConfig { fade_duration_ms: 5, fade_step_ms: 0, ..RendererConfig::default() },
            0,
        );
        assert_eq!(r.steps_planned(), 1);
    }

    #[test]
    fn test_fade_interpolates_then_holds() {
        let mut r = Renderer::new(fast_config(), 0);
        let mut sel = MoodSelector::default();
        let mut out = Recorder::default();
        let target = r.current_base_color_scaled();

        r.tick(10, &mut sel, &mut out);
        assert_eq!(out.writes, 0, "no step before the interval");

        r.tick(20, &mut sel, &mut out);
        assert_eq!(out.last, Some(Rgb8::BLACK), "step 0 shows the start color");

        r.tick(40, &mut sel, &mut out);
        assert_eq!(out.last, Some(Rgb8::BLACK.lerp(target, 1, 5)));

        run(&mut r, &mut sel, &mut out, 60, 100, 20);
        assert_eq!(r.phase(), RenderPhase::Fading);
        r.tick(120, &mut sel, &mut out);
        assert_eq!(r.phase(), RenderPhase::Holding);
        assert_eq!(out.last, Some(target));
    }

    #[test]
    fn test_hold_expiry_asks_selector() {
        let mut r = Renderer::new(fast_config(), 0);
        let mut sel = MoodSelector::default();
        let mut out = Recorder::default();
        run(&mut r, &mut sel, &mut out, 0, 120, 20);
        assert_eq!(r.phase(), RenderPhase::Holding);

        let hold = r.current_hold_ms() as u32;
        r.tick(120 + hold - 1, &mut sel, &mut out);
        assert_eq!(r.current_mood_index(), 0);
        r.tick(120 + hold, &mut sel, &mut out);
        assert_ne!(r.current_mood_index(), 0);
        assert_eq!(r.phase(), RenderPhase::Fading);
        assert_eq!(sel.history().last(), Some(r.current_mood_index()));
    }

    #[test]
    fn test_hold_scale_shortens_hold() {
        let mut r = Renderer::new(fast_config(), 0);
        r.set_hold_scale(50);
        let mut sel = MoodSelector::default();
        let mut out = Recorder::default();
        run(&mut r, &mut sel, &mut out, 0, 120, 20);
        let half = r.current_hold_ms() as u32 / 2;
        r.tick(120 + half, &mut sel, &mut out);
        assert_ne!(r.current_mood_index(), 0);
    }

    #[test]
    fn test_frozen_keeps_mood_but_renders() {
        let mut r = Renderer::new(fast_config(), 0);
        let mut sel = MoodSelector::default();
        let mut out = Recorder::default();
        r.freeze(true);
        run(&mut r, &mut sel, &mut out, 0, 10_000, 20);
        assert_eq!(r.current_mood_index(), 0);
        assert!(r.is_frozen());
        let writes = out.writes;
        r.tick(10_020, &mut sel, &mut out);
        assert_eq!(out.writes, writes + 1);
    }

    #[test]
    fn test_set_mood_by_index_and_invalid() {
        let mut r = Renderer::new(fast_config(), 0);
        assert_eq!(r.set_mood_by_index(5, 0), Ok(()));
        assert_eq!(r.current_mood_index(), 5);
        assert_eq!(
            r.set_mood_by_index(99, 0),
            Err(MoodError::InvalidIndex { index: 99, count: 16 })
        );
        assert_eq!(r.current_mood_index(), 5);
    }

    #[test]
    fn test_set_mood_by_name() {
        let mut r = Renderer::new(fast_config(), 0);
        assert!(r.set_mood_by_name("fEaR", 0).is_ok());
        assert_eq!(r.current_mood(), Mood::Fear);
        assert_eq!(r.set_mood_by_name("Ennui", 0), Err(MoodError::UnknownName));
        assert_eq!(r.current_mood(), Mood::Fear);
    }

    #[test]
    fn test_mood_change_fades_from_displayed_color() {
        let mut r = Renderer::new(fast_config(), 0);
        let mut sel = MoodSelector::default();
        let mut out = Recorder::default();
        run(&mut r, &mut sel, &mut out, 0, 60, 20);
        let shown = r.displayed_color();
        r.set_mood_by_index(12, 60).expect("in range");
        r.tick(80, &mut sel, &mut out);
        assert_eq!(out.last, Some(shown));
    }

    #[test]
    fn test_jump_to_next_wraps() {
        let mut r = Renderer::new(fast_config(), 0);
        r.set_mood_by_index(15, 0).expect("in range");
        r.jump_to_next(0);
        assert_eq!(r.current_mood_index(), 0);
        r.jump_to_next(0);
        assert_eq!(r.current_mood_index(), 1);
    }

    #[test]
    fn test_brightness_scales_target() {
        let mut r = Renderer::new(fast_config(), 0);
        r.set_global_brightness(128);
        // Serenity base (0,170,255)
        assert_eq!(r.current_base_color_scaled(), Rgb8::new(0, 85, 128));
        let mut sel = MoodSelector::default();
        let mut out = Recorder::default();
        run(&mut r, &mut sel, &mut out, 0, 120, 20);
        assert_eq!(out.last, Some(Rgb8::new(0, 85, 128)));
    }

    #[test]
    fn test_blink_alt_alternates() {
        let mut r = Renderer::new(fast_config(), 0);
        let mut sel = MoodSelector::default();
        let mut out = Recorder::default();
        r.freeze(true);
        r.set_mood_by_name("Playful", 0).expect("known");
        run(&mut r, &mut sel, &mut out, 0, 120, 20);
        assert_eq!(r.phase(), RenderPhase::Holding);
        // hold started at 120; period 600
        r.tick(120 + 100, &mut sel, &mut out);
        assert_eq!(out.last, Some(Rgb8::new(255, 0, 255)));
        r.tick(120 + 400, &mut sel, &mut out);
        assert_eq!(out.last, Some(Rgb8::new(0, 255, 255)));
    }

    #[test]
    fn test_breathe_swells_above_base() {
        let mut r = Renderer::new(fast_config(), 0);
        let mut sel = MoodSelector::default();
        let mut out = Recorder::default();
        r.freeze(true);
        r.set_mood_by_name("Sadness", 0).expect("known");
        run(&mut r, &mut sel, &mut out, 0, 120, 20);
        // period 3200: peak at 1600 into the hold
        r.tick(120 + 1600, &mut sel, &mut out);
        let peak = out.last.expect("written");
        // base (0,0,180), amp 40, m = 255·40>>8 = 39
        assert_eq!(peak, Rgb8::new(0, 0, 180).swell(40, 39));
        assert!(peak.b > 180);
    }

    #[test]
    fn test_flicker_stays_within_amplitude() {
        let mut r = Renderer::new(fast_config(), 0);
        let mut sel = MoodSelector::default();
        let mut out = Recorder::default();
        r.freeze(true);
        r.set_mood_by_name("Fear", 0).expect("known");
        run(&mut r, &mut sel, &mut out, 0, 120, 20);
        let base = r.current_base_color_scaled();
        for t in 0..200u32 {
            r.tick(140 + t * 20, &mut sel, &mut out);
            let c = out.last.expect("written");
            assert!((c.r as i16 - base.r as i16).abs() <= 40);
        }
    }

    #[test]
    fn test_common_anode_inverts() {
        let mut anode = CommonAnode(Recorder::default());
        anode.write(Rgb8::new(0, 100, 255));
        assert_eq!(anode.0.last, Some(Rgb8::new(255, 155, 0)));
    }

    #[test]
    fn test_pattern_of_index_out_of_range_is_first() {
        let r = Renderer::new(fast_config(), 0);
        assert_eq!(r.pattern_of_index(200), catalog::MOODS[0].pattern);
    }

    #[test]
    fn test_status_reflects_state() {
        let mut r = Renderer::new(fast_config(), 0);
        r.freeze(true);
        r.set_mood_by_name("Confusion", 0).expect("known");
        let s = r.status();
        assert_eq!(s.name, "Confusion");
        assert_eq!(s.alt_name, Some("Yellow"));
        assert_eq!(s.alt, Some(Rgb8::new(255, 200, 0)));
        assert!(s.frozen);
    }
}
