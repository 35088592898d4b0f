//! The fixed mood catalog.
//!
//! Sixteen moods, each with a color pair, a waveform kind, timing, and a
//! signed position in (valence, arousal) space. The table is `'static`
//! and never mutated; the renderer reads colors and timing from it, the
//! selector reads patterns and affect positions.

use core::fmt;

use crate::color::Rgb8;
use self::PatternKind::{BlinkAlt, Breathe, Flicker, Heartbeat, Pulse};

/// Identity of a catalog entry. The discriminant is the catalog index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Mood {
    /// Soft aqua breathing.
    Serenity = 0,
    /// Warm gold breathing.
    Joy,
    /// Hot pink pulse.
    Excitement,
    /// Rose heartbeat.
    Love,
    /// Royal purple breathing.
    Pride,
    /// Amber pulse.
    Determination,
    /// Cyan / magenta blink.
    Playful,
    /// Teal / lime blink.
    Curiosity,
    /// Blue / yellow blink.
    Confusion,
    /// White pulse.
    Surprise,
    /// Deep blue breathing.
    Sadness,
    /// Muted blue breathing.
    Melancholy,
    /// Red heartbeat.
    Anger,
    /// Red-white pulse.
    Panic,
    /// Dim violet flicker.
    Fear,
    /// Warm amber breathing.
    Sleepy,
}

/// Number of entries in [`MOODS`].
pub const MOOD_COUNT: usize = 16;

impl Mood {
    /// Look a mood up by catalog index.
    pub fn from_index(index: u8) -> Option<Mood> {
        MOODS.get(index as usize).map(|d| d.mood)
    }

    /// Catalog index of this mood.
    pub fn index(self) -> u8 {
        self as u8
    }

    /// The catalog entry for this mood.
    pub fn definition(self) -> &'static MoodDefinition {
        &MOODS[self as usize]
    }
}

/// Waveform played while a mood is holding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PatternKind {
    /// No modulation.
    Static,
    /// Symmetric triangle swell.
    Breathe,
    /// Duty-cycled square swell.
    Pulse,
    /// Two beats and a short decay tail per period.
    Heartbeat,
    /// Pseudo-random per-tick jitter.
    Flicker,
    /// Alternates base and alternate color every half period.
    BlinkAlt,
}

impl PatternKind {
    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            PatternKind::Static => "Static",
            PatternKind::Breathe => "Breathe",
            PatternKind::Pulse => "Pulse",
            PatternKind::Heartbeat => "Heartbeat",
            PatternKind::Flicker => "Flicker",
            PatternKind::BlinkAlt => "BlinkAlt",
        }
    }
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Signed position of a mood in affect space, both axes in [−100, 100].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Affect {
    /// Negative (−100) to positive (+100).
    pub valence: i8,
    /// Calm (−100) to agitated (+100).
    pub arousal: i8,
}

impl Affect {
    /// Construct an affect position.
    pub const fn new(valence: i8, arousal: i8) -> Self {
        Self { valence, arousal }
    }

    /// Manhattan distance `|Δvalence| + |Δarousal|`.
    pub fn distance(self, other: Affect) -> u16 {
        let dv = (self.valence as i16 - other.valence as i16).unsigned_abs();
        let da = (self.arousal as i16 - other.arousal as i16).unsigned_abs();
        dv + da
    }
}

/// One immutable catalog entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MoodDefinition {
    /// Identity; equals the entry's position in [`MOODS`].
    pub mood: Mood,
    /// Display name, matched case-insensitively by name lookups.
    pub name: &'static str,
    /// Human name of the base color.
    pub base_name: &'static str,
    /// Human name of the alternate color, if the mood has one.
    pub alt_name: Option<&'static str>,
    /// Base color at full brightness.
    pub base: Rgb8,
    /// Alternate color at full brightness (used by [`PatternKind::BlinkAlt`]).
    pub alt: Option<Rgb8>,
    /// Hold-phase waveform.
    pub pattern: PatternKind,
    /// Modulation amplitude, 0–255.
    pub amplitude: u8,
    /// Waveform period in milliseconds.
    pub period_ms: u16,
    /// Hold duration in milliseconds before the next mood is chosen.
    pub hold_ms: u16,
    /// Position in affect space.
    pub affect: Affect,
}

const fn def(
    mood: Mood,
    name: &'static str,
    base_name: &'static str,
    base: Rgb8,
    pattern: PatternKind,
    amplitude: u8,
    period_ms: u16,
    hold_ms: u16,
    affect: Affect,
) -> MoodDefinition {
    MoodDefinition {
        mood,
        name,
        base_name,
        alt_name: None,
        base,
        alt: None,
        pattern,
        amplitude,
        period_ms,
        hold_ms,
        affect,
    }
}

const fn with_alt(mut d: MoodDefinition, alt_name: &'static str, alt: Rgb8) -> MoodDefinition {
    d.alt_name = Some(alt_name);
    d.alt = Some(alt);
    d
}

/// The mood catalog, in index order.
pub static MOODS: [MoodDefinition; MOOD_COUNT] = [
    def(Mood::Serenity, "Serenity", "Soft Aqua", Rgb8::new(0, 170, 255), Breathe, 50, 2600, 1400, Affect::new(70, -60)),
    def(Mood::Joy, "Joy", "Warm Gold", Rgb8::new(255, 195, 60), Breathe, 90, 1800, 1300, Affect::new(90, 40)),
    def(Mood::Excitement, "Excitement", "Hot Pink", Rgb8::new(255, 0, 200), Pulse, 160, 480, 1100, Affect::new(85, 90)),
    def(Mood::Love, "Love", "Rose", Rgb8::new(255, 60, 120), Heartbeat, 110, 900, 1300, Affect::new(95, 45)),
    def(Mood::Pride, "Pride", "Royal Purple", Rgb8::new(160, 0, 200), Breathe, 60, 2200, 1300, Affect::new(65, 35)),
    def(Mood::Determination, "Determination", "Amber", Rgb8::new(230, 120, 0), Pulse, 90, 900, 1400, Affect::new(40, 55)),
    with_alt(
        def(Mood::Playful, "Playful", "Cyan", Rgb8::new(0, 255, 255), BlinkAlt, 0, 600, 1200, Affect::new(75, 65)),
        "Magenta",
        Rgb8::new(255, 0, 255),
    ),
    with_alt(
        def(Mood::Curiosity, "Curiosity", "Teal", Rgb8::new(0, 200, 160), BlinkAlt, 0, 800, 1300, Affect::new(40, 30)),
        "Lime",
        Rgb8::new(140, 255, 0),
    ),
    with_alt(
        def(Mood::Confusion, "Confusion", "Blue", Rgb8::new(40, 120, 255), BlinkAlt, 0, 700, 1200, Affect::new(-20, 25)),
        "Yellow",
        Rgb8::new(255, 200, 0),
    ),
    def(Mood::Surprise, "Surprise", "White", Rgb8::new(255, 255, 255), Pulse, 200, 320, 900, Affect::new(10, 85)),
    def(Mood::Sadness, "Sadness", "Deep Blue", Rgb8::new(0, 0, 180), Breathe, 40, 3200, 1600, Affect::new(-80, -50)),
    def(Mood::Melancholy, "Melancholy", "Muted Blue", Rgb8::new(20, 40, 120), Breathe, 25, 3800, 1600, Affect::new(-60, -65)),
    def(Mood::Anger, "Anger", "Red", Rgb8::new(255, 0, 0), Heartbeat, 150, 850, 1100, Affect::new(-70, 75)),
    def(Mood::Panic, "Panic", "Red-White", Rgb8::new(255, 120, 120), Pulse, 220, 420, 1000, Affect::new(-90, 95)),
    def(Mood::Fear, "Fear", "Dim Violet", Rgb8::new(120, 0, 180), Flicker, 40, 120, 1300, Affect::new(-85, 80)),
    def(Mood::Sleepy, "Sleepy", "Warm Amber", Rgb8::new(180, 70, 0), Breathe, 35, 4200, 1600, Affect::new(5, -90)),
];

/// Catalog entry at `index`, if in range.
pub fn definition(index: u8) -> Option<&'static MoodDefinition> {
    MOODS.get(index as usize)
}

/// Index of the mood whose name matches `name` ignoring ASCII case.
pub fn index_of_name(name: &str) -> Option<u8> {
    MOODS
        .iter()
        .position(|d| d.name.eq_ignore_ascii_case(name))
        .map(|i| i as u8)
}

/// Affect position of the mood at `index`; neutral when out of range.
pub fn affect_of(index: u8) -> Affect {
    definition(index).map(|d| d.affect).unwrap_or_default()
}
