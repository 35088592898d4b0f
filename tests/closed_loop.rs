//! Integration tests for the renderer / selector / conditioner loop.
//!
//! Everything runs on simulated time: ticks are issued every 10 ms from a
//! plain counter, the accelerometer is scripted and the light output only
//! records what it was asked to show.

use moodlight_core::{
    Accelerometer, CommonAnode, LightDriver, Mood, MoodEngine, MoodError, MoodSelector,
    MoodTarget, RenderPhase, Renderer, RendererConfig, Rgb8, SelectorConfig, SensorConfig,
    SensorError, SignalConditioner,
};

// ─── helpers ─────────────────────────────────────────────────────────────────

#[derive(Default)]
struct Recorder {
    last: Option<Rgb8>,
    writes: u32,
}

impl LightDriver for Recorder {
    fn write(&mut self, color: Rgb8) {
        self.last = Some(color);
        self.writes += 1;
    }
}

/// Still until read number `jolt_from_read`, then jolts on every other read.
struct Scripted {
    reads: u32,
    jolt_from_read: u32,
    broken: bool,
}

impl Accelerometer for Scripted {
    fn init(&mut self) -> Result<(), SensorError> {
        if self.broken {
            Err(SensorError::Absent)
        } else {
            Ok(())
        }
    }

    fn read_axes(&mut self) -> Result<[i16; 3], SensorError> {
        self.reads += 1;
        if self.reads < self.jolt_from_read {
            return Ok([0, 0, 16_384]);
        }
        if self.reads % 2 == 0 {
            Ok([12_000, -9_000, 16_384])
        } else {
            Ok([0, 0, 16_384])
        }
    }
}

fn run_renderer<D: LightDriver>(r: &mut Renderer, sel: &mut MoodSelector, out: &mut D, from: u32, to: u32) {
    for t in (from..=to).step_by(10) {
        r.tick(t, sel, out);
    }
}

fn engine(jolt_from_read: u32) -> MoodEngine<Scripted, Recorder> {
    MoodEngine::new(
        Renderer::new(RendererConfig::default(), 0),
        MoodSelector::new(SelectorConfig::default()),
        SignalConditioner::new(
            Scripted { reads: 0, jolt_from_read, broken: false },
            SensorConfig::default(),
        ),
        Recorder::default(),
    )
}

// ─── renderer + selector ─────────────────────────────────────────────────────

/// The current index stays inside the catalog on every tick of a long run,
/// and consecutive moods always differ.
#[test]
fn test_index_in_range_and_never_repeats() {
    let mut r = Renderer::new(RendererConfig::default(), 0);
    let mut sel = MoodSelector::default();
    sel.begin(0xC0DE);
    let mut out = Recorder::default();

    let mut prev = r.current_mood_index();
    let mut changes = 0u32;
    for t in (0..300_000u32).step_by(10) {
        r.tick(t, &mut sel, &mut out);
        let idx = r.current_mood_index();
        assert!(idx < r.mood_count());
        if idx != prev {
            changes += 1;
            prev = idx;
        }
    }
    assert!(changes > 50, "only {} changes", changes);
    assert_eq!(sel.history().len(), 6);
}

/// A manual change by index lands on that mood; an out-of-range index is
/// refused without touching the renderer.
#[test]
fn test_set_mood_by_index_five_then_ninety_nine() {
    let mut r = Renderer::new(RendererConfig::default(), 0);
    assert_eq!(r.set_mood_by_index(5, 100), Ok(()));
    assert_eq!(r.current_mood_index(), 5);
    assert_eq!(r.current_mood(), Mood::Determination);

    let phase = r.phase();
    let err = r.set_mood_by_index(99, 200).unwrap_err();
    assert_eq!(err, MoodError::InvalidIndex { index: 99, count: 16 });
    assert_eq!(r.current_mood_index(), 5);
    assert_eq!(r.phase(), phase);
}

/// After a manual change the selector still avoids both the manual mood and
/// its own last pick.
#[test]
fn test_selector_avoids_manual_mood_and_last_pick() {
    let mut r = Renderer::new(RendererConfig::default(), 0);
    let mut sel = MoodSelector::default();
    let last = sel.advance(&mut r, 0).expect("catalog accepts its own indices");
    for manual in 0..16u8 {
        r.set_mood_by_index(manual, 0).expect("in range");
        let mut trial = sel.clone();
        let next = trial.advance(&mut r, 0).expect("accepted");
        assert_ne!(next, manual);
        assert_ne!(next, last);
    }
}

/// Freezing holds the mood indefinitely but keeps the pattern running.
#[test]
fn test_freeze_holds_mood() {
    let mut r = Renderer::new(RendererConfig::default(), 0);
    let mut sel = MoodSelector::default();
    let mut out = Recorder::default();
    r.set_mood_by_name("excitement", 0).expect("known");
    r.freeze(true);
    run_renderer(&mut r, &mut sel, &mut out, 0, 30_000);
    assert_eq!(r.current_mood(), Mood::Excitement);
    assert_eq!(r.phase(), RenderPhase::Holding);
    assert!(sel.history().is_empty());

    // Excitement pulses: both the swelled and the plain color show up.
    let base = r.current_base_color_scaled();
    let mut saw_base = false;
    let mut saw_swell = false;
    for t in (30_010..31_000).step_by(10) {
        r.tick(t, &mut sel, &mut out);
        let c = out.last.expect("written");
        saw_base |= c == base;
        saw_swell |= c != base;
    }
    assert!(saw_base && saw_swell);

    r.freeze(false);
    run_renderer(&mut r, &mut sel, &mut out, 31_000, 33_000);
    assert_ne!(r.current_mood(), Mood::Excitement);
}

/// A brightness change is visible on the very next written color.
#[test]
fn test_brightness_applies_immediately() {
    let mut r = Renderer::new(RendererConfig::default(), 0);
    let mut sel = MoodSelector::default();
    let mut out = Recorder::default();
    r.set_mood_by_name("Anger", 0).expect("known");
    r.freeze(true);
    run_renderer(&mut r, &mut sel, &mut out, 0, 2_000);
    r.set_global_brightness(0);
    // Anger's heartbeat swell is relative to a black base: bounded by amplitude.
    r.tick(2_010, &mut sel, &mut out);
    let c = out.last.expect("written");
    assert_eq!((c.g, c.b), (c.r, c.r));
    assert_eq!(r.current_base_color_scaled(), Rgb8::BLACK);
}

/// A common-anode output receives the complement of what the renderer shows.
#[test]
fn test_common_anode_output() {
    let mut r = Renderer::new(RendererConfig::default(), 0);
    let mut sel = MoodSelector::default();
    let mut out = CommonAnode(Recorder::default());
    run_renderer(&mut r, &mut sel, &mut out, 0, 500);
    assert_eq!(out.0.last, Some(r.displayed_color().inverted()));
}

// ─── full engine ─────────────────────────────────────────────────────────────

/// A still device never validates the bias.
#[test]
fn test_still_device_keeps_bias_neutral() {
    let mut e = engine(u32::MAX);
    e.begin(42);
    for t in (0..20_000).step_by(10) {
        let s = e.tick(t);
        assert!(!s.valid);
    }
    assert!(!e.selector().bias().valid);
    assert!(!e.conditioner().is_gate_open());
}

/// Jolting opens the gate, validates the bias and fires a startle that
/// boosts the selector; the cooldown keeps a second startle away.
#[test]
fn test_jolts_drive_bias_and_startle() {
    let mut e = engine(50);
    e.begin(42);
    let mut startles = 0u32;
    let mut first_startle = None;
    for t in (0..6_000).step_by(10) {
        let s = e.tick(t);
        if s.startled {
            startles += 1;
            first_startle.get_or_insert(t);
        }
    }
    let first = first_startle.expect("jolts should startle");
    assert!(first >= 49 * 40);
    assert_eq!(startles, 2, "second startle only after the 4 s cooldown");
    assert!(e.selector().bias().valid);
    assert!(e.selector().bias().arousal > 128);
}

/// A device that fails detection is reported absent and the loop still runs.
#[test]
fn test_absent_device_loop_still_renders() {
    let mut e = MoodEngine::new(
        Renderer::new(RendererConfig::default(), 0),
        MoodSelector::default(),
        SignalConditioner::new(
            Scripted { reads: 0, jolt_from_read: 0, broken: true },
            SensorConfig::default(),
        ),
        Recorder::default(),
    );
    e.begin(1);
    for t in (0..10_000).step_by(10) {
        e.tick(t);
    }
    assert!(!e.conditioner().is_present());
    assert_eq!(e.conditioner().accelerometer().reads, 0);
    assert!(e.driver().writes > 100);
    assert!(!e.selector().history().is_empty());
}
