//! The per-tick control loop.
//!
//! ```text
//! Accelerometer → SignalConditioner ─bias─► MoodSelector ◄─hold expired─ Renderer → LightDriver
//!                        └──startle──► boost ──┘
//! ```
//!
//! [`MoodEngine`] owns one of each component and advances them in a fixed
//! order from [`MoodEngine::tick`]. Nothing here blocks; call `tick` as often
//! as the platform loop allows.

use crate::conditioner::{Accelerometer, SensorSignal, SignalConditioner};
use crate::renderer::{LightDriver, Renderer};
use crate::selector::{MoodSelector, BIAS_NEUTRAL};

/// Conditioner, selector, renderer and light output wired into one loop.
#[derive(Debug)]
pub struct MoodEngine<A, D> {
    renderer: Renderer,
    selector: MoodSelector,
    conditioner: SignalConditioner<A>,
    driver: D,
}

impl<A: Accelerometer, D: LightDriver> MoodEngine<A, D> {
    /// Assemble an engine from its parts.
    pub fn new(
        renderer: Renderer,
        selector: MoodSelector,
        conditioner: SignalConditioner<A>,
        driver: D,
    ) -> Self {
        Self { renderer, selector, conditioner, driver }
    }

    /// Detect the accelerometer and seed the random sources with `seed`.
    pub fn begin(&mut self, seed: u16) {
        self.conditioner.begin();
        self.selector.begin(seed);
        self.renderer.seed_flicker(seed);
    }

    /// Run one iteration of the loop and return the conditioned sample.
    ///
    /// A valid sample updates the selector bias. An invalid one resets the
    /// bias to neutral once the gate has closed or the last read failed, so
    /// the last reading persists only between good samples while motion
    /// continues.
    pub fn tick(&mut self, now_ms: u32) -> SensorSignal {
        let signal = self.conditioner.sample(now_ms);
        if signal.valid {
            self.selector
                .set_bias(signal.arousal_bias, signal.valence_bias, true);
        } else if !self.conditioner.is_gate_open() || self.conditioner.failure_count() > 0 {
            self.selector.set_bias(BIAS_NEUTRAL, BIAS_NEUTRAL, false);
        }
        if signal.startled {
            let cfg = self.selector.config();
            let (strength, duration) = (cfg.startle_boost_strength, cfg.startle_boost_ms);
            self.selector.set_startle_boost(strength, duration, now_ms);
        }
        self.renderer
            .tick(now_ms, &mut self.selector, &mut self.driver);
        signal
    }

    /// The renderer.
    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    /// The renderer, for manual mood and brightness control.
    pub fn renderer_mut(&mut self) -> &mut Renderer {
        &mut self.renderer
    }

    /// The selector.
    pub fn selector(&self) -> &MoodSelector {
        &self.selector
    }

    /// The selector, for tuning the pattern penalty.
    pub fn selector_mut(&mut self) -> &mut MoodSelector {
        &mut self.selector
    }

    /// The conditioner.
    pub fn conditioner(&self) -> &SignalConditioner<A> {
        &self.conditioner
    }

    /// The conditioner, for enable and diagnostic toggles.
    pub fn conditioner_mut(&mut self) -> &mut SignalConditioner<A> {
        &mut self.conditioner
    }

    /// The light output.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// The light output, mutably.
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Take the engine apart.
    pub fn into_parts(self) -> (Renderer, MoodSelector, SignalConditioner<A>, D) {
        (self.renderer, self.selector, self.conditioner, self.driver)
    }
}
