//! # Mood loop — a desk lamp that notices when it is bumped
//!
//! This example runs the full control loop on simulated time: a small RGB
//! lamp with an accelerometer sits on a desk. For the first half minute
//! nothing happens and the lamp drifts between moods on its own. Then someone
//! starts tapping the desk, and the motion bias pulls the selection toward
//! agitated moods. A hard knock fires a startle, which briefly pushes the
//! bias to its ceiling. Finally the desk goes still again and the bias decays
//! back to neutral once the noise gate closes.
//!
//! No hardware required. The LED is a common-anode part, so the driver
//! receives inverted duty cycles; the example prints both.
//!
//! ## Running this example
//!
//! ```text
//! RUST_LOG=moodlight_core=debug cargo run --example mood_loop --features std
//! ```

use moodlight_core::{
    Accelerometer, CommonAnode, LightDriver, MoodEngine, MoodSelector, Renderer, RendererConfig,
    Rgb8, SelectorConfig, SensorConfig, SensorError, SignalConditioner,
};
use tracing_subscriber::EnvFilter;

// ── Simulated hardware ───────────────────────────────────────────────────────

/// Desk-mounted accelerometer. Gravity sits on Z (1 g = 16 384 raw counts
/// left-aligned), and the scenario adds taps and one knock.
struct DeskAccelerometer {
    now_ms: u32,
}

impl DeskAccelerometer {
    const ONE_G: i16 = 16_384;
}

impl Accelerometer for DeskAccelerometer {
    fn init(&mut self) -> Result<(), SensorError> {
        Ok(())
    }

    fn read_axes(&mut self) -> Result<[i16; 3], SensorError> {
        let t = self.now_ms;
        let (x, y) = match t {
            // still
            0..=29_999 => (0, 0),
            // rhythmic tapping: a jolt every 200 ms
            30_000..=59_999 if t % 200 < 40 => (2_400, -1_600),
            30_000..=59_999 => (0, 0),
            // one hard knock
            60_000..=60_039 => (14_000, 9_000),
            // still again
            _ => (0, 0),
        };
        Ok([x, y, Self::ONE_G])
    }
}

/// Prints every color written, at most once per 250 ms.
struct PrintingLed {
    last_print_ms: Option<u32>,
    now_ms: u32,
}

impl LightDriver for PrintingLed {
    fn write(&mut self, duty: Rgb8) {
        if self
            .last_print_ms
            .is_some_and(|t| self.now_ms.wrapping_sub(t) < 250)
        {
            return;
        }
        self.last_print_ms = Some(self.now_ms);
        let shown = duty.inverted();
        println!(
            "  t={:>6} ms  color=({:>3},{:>3},{:>3})  duty=({:>3},{:>3},{:>3})",
            self.now_ms, shown.r, shown.g, shown.b, duty.r, duty.g, duty.b
        );
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("Mood loop — simulated desk lamp");
    println!("===============================\n");

    // ── Components ───────────────────────────────────────────────────────────
    //
    // A slightly dimmer lamp with quicker fades than the defaults; everything
    // else uses the tuned constants.
    let renderer = Renderer::new(
        RendererConfig {
            fade_duration_ms: 800,
            brightness: 180,
            ..RendererConfig::default()
        },
        0,
    );
    let selector = MoodSelector::new(SelectorConfig::default());
    let conditioner = SignalConditioner::new(
        DeskAccelerometer { now_ms: 0 },
        SensorConfig::default(),
    );
    let led = CommonAnode(PrintingLed { last_print_ms: None, now_ms: 0 });

    let mut engine = MoodEngine::new(renderer, selector, conditioner, led);
    engine.begin(0x5EED);

    // ── Run ──────────────────────────────────────────────────────────────────
    let mut last_mood = None;
    let mut startles = 0u32;
    for now in (0u32..90_000).step_by(10) {
        engine.conditioner_mut().accelerometer_mut().now_ms = now;
        engine.driver_mut().0.now_ms = now;

        let signal = engine.tick(now);
        if signal.startled {
            startles += 1;
            println!("\n  ** startle at t={} ms **\n", now);
        }

        let mood = engine.renderer().current_mood();
        if last_mood != Some(mood) {
            last_mood = Some(mood);
            let bias = engine.selector().bias();
            println!(
                "\n[{:>6} ms] {:<13} {:<9}  bias: arousal={:>3} valid={}",
                now,
                engine.renderer().current_mood_name(),
                engine.renderer().current_pattern_name(),
                bias.arousal,
                bias.valid,
            );
        }
    }

    // ── Summary ──────────────────────────────────────────────────────────────
    println!("\nSummary");
    println!("-------");
    println!("  moods remembered: {:?}", engine.selector().history());
    println!("  startles:         {}", startles);
    println!(
        "  gate open at end: {}",
        engine.conditioner().is_gate_open()
    );
}
