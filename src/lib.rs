//! # moodlight-core
//!
//! Affect-driven mood lighting for a single RGB LED on a small microcontroller.
//!
//! ---
//!
//! ## Three components, one cooperative loop
//!
//! **The selector** decides *what* to show next. Sixteen moods sit at fixed
//! points in a (valence, arousal) plane. When a mood has held long enough the
//! selector draws the next one from a weighted distribution that favours
//! nearby moods, avoids recent ones, discourages repeating the same waveform,
//! and leans toward whatever the motion sensor suggests. It never picks the
//! mood on display or the one before it.
//!
//! **The renderer** decides *how* it looks. Every change is a linear fade from
//! the color on display to the new target, then a hold phase in which the
//! mood's waveform (breathe, pulse, heartbeat, flicker, two-color blink)
//! animates around that target.
//!
//! **The conditioner** turns raw accelerometer axes into an arousal bias: a
//! slow baseline of the motion magnitude, a hysteresis gate that ignores
//! small wobbles, and a startle detector for sudden jolts.
//!
//! ---
//!
//! ## The pipeline
//!
//! ```text
//! Accelerometer → SignalConditioner → Bias → MoodSelector → Renderer → LightDriver
//!                        │                        ▲             │
//!                        └── startle boost ───────┘◄─ hold done ┘
//! ```
//!
//! ## Module overview
//!
//! | Module | Key types | What it does |
//! |--------|-----------|--------------|
//! | [`catalog`] | [`Mood`], [`MoodDefinition`], [`PatternKind`] | The fixed 16-mood table |
//! | [`selector`] | [`MoodSelector`], [`MoodHistory`], [`Bias`] | Weighted anti-repeat mood choice |
//! | [`target`] | [`MoodTarget`], [`MoodError`] | The capability the selector steers |
//! | [`renderer`] | [`Renderer`], [`LightDriver`], [`CommonAnode`] | Fade / hold state machine |
//! | [`waveform`] | [`triangle_wave`](waveform::triangle_wave) | Hold-phase modulation shapes |
//! | [`conditioner`] | [`SignalConditioner`], [`Accelerometer`], [`SchmittGate`] | Motion envelope → bias |
//! | [`engine`] | [`MoodEngine`] | One tick of the whole loop |
//! | [`color`], [`clock`], [`lfsr`] | [`Rgb8`], [`Lfsr16`] | Integer color math, wrap-safe time, PRNG |
//!
//! ## Example
//!
//! ```
//! use moodlight_core::{
//!     Accelerometer, LightDriver, MoodEngine, MoodSelector, MoodTarget, Renderer,
//!     RendererConfig, Rgb8, SelectorConfig, SensorConfig, SensorError, SignalConditioner,
//! };
//!
//! struct Still;
//! impl Accelerometer for Still {
//!     fn init(&mut self) -> Result<(), SensorError> { Ok(()) }
//!     fn read_axes(&mut self) -> Result<[i16; 3], SensorError> { Ok([0, 0, 16_384]) }
//! }
//!
//! struct Led(Rgb8);
//! impl LightDriver for Led {
//!     fn write(&mut self, c: Rgb8) { self.0 = c; }
//! }
//!
//! let mut engine = MoodEngine::new(
//!     Renderer::new(RendererConfig::default(), 0),
//!     MoodSelector::new(SelectorConfig::default()),
//!     SignalConditioner::new(Still, SensorConfig::default()),
//!     Led(Rgb8::BLACK),
//! );
//! engine.begin(0x5EED);
//! for now in (0..5_000).step_by(10) {
//!     engine.tick(now);
//! }
//! assert!(engine.renderer().current_mood_index() < 16);
//! ```
//!
//! ## `no_std`
//!
//! This crate is `#![no_std]` by default with no heap required. All state is
//! fixed-size and owned by one component; ticks are driven by the caller's
//! free-running millisecond counter and every deadline is compared with
//! wrap-safe arithmetic. Enable the `std` feature to route `tracing` through
//! std, and the `serde` feature for serialisable configuration and status.
//!
//! ## License
//!
//! Business Source License 1.1.

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![deny(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

#[cfg(feature = "std")]
extern crate std;

pub mod clock;
pub mod color;
pub mod lfsr;
pub mod catalog;
pub mod waveform;
pub mod target;
pub mod selector;
pub mod renderer;
pub mod conditioner;
pub mod engine;

pub use catalog::{Affect, Mood, MoodDefinition, PatternKind, MOODS, MOOD_COUNT};
pub use color::Rgb8;
pub use conditioner::{
    Accelerometer, MotionBaseline, SchmittGate, SensorConfig, SensorError, SensorSignal,
    SignalConditioner, StartleDetector,
};
pub use engine::MoodEngine;
pub use lfsr::Lfsr16;
pub use renderer::{CommonAnode, LightDriver, MoodStatus, RenderPhase, Renderer, RendererConfig};
pub use selector::{Bias, MoodHistory, MoodSelector, SelectorConfig};
pub use target::{MoodError, MoodTarget};
