//! The mood-target capability.
//!
//! [`MoodSelector`](crate::selector::MoodSelector) never touches a renderer
//! directly. It sees only this trait: how many moods exist, which one is
//! showing, what waveform each plays, and a way to request a change. The
//! [`Renderer`](crate::renderer::Renderer) is the production implementor;
//! tests drive the selector with small stubs.

use thiserror::Error;

use crate::catalog::PatternKind;

/// Why a mood change was refused. A refused change mutates nothing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum MoodError {
    /// Requested index is outside the catalog.
    #[error("mood index {index} out of range (catalog has {count} moods)")]
    InvalidIndex {
        /// The rejected index.
        index: u8,
        /// Catalog size at the time of the request.
        count: u8,
    },
    /// No mood carries the requested name.
    #[error("unknown mood name")]
    UnknownName,
}

/// Anything the selector can steer between moods.
pub trait MoodTarget {
    /// Number of selectable moods. Always at least 1.
    fn mood_count(&self) -> u8;

    /// Index of the mood currently shown; always `< mood_count()`.
    fn current_mood_index(&self) -> u8;

    /// Switch to mood `index`, starting its transition at `now_ms`.
    fn set_mood_by_index(&mut self, index: u8, now_ms: u32) -> Result<(), MoodError>;

    /// Switch to the mood named `name` (ASCII case-insensitive, exact).
    fn set_mood_by_name(&mut self, name: &str, now_ms: u32) -> Result<(), MoodError>;

    /// Waveform of mood `index`. Out-of-range indices report the first mood's.
    fn pattern_of_index(&self, index: u8) -> PatternKind;

    /// `true` while automatic advancement is suspended.
    fn is_frozen(&self) -> bool;
}

impl<T: MoodTarget + ?Sized> MoodTarget for &mut T {
    fn mood_count(&self) -> u8 {
        (**self).mood_count()
    }

    fn current_mood_index(&self) -> u8 {
        (**self).current_mood_index()
    }

    fn set_mood_by_index(&mut self, index: u8, now_ms: u32) -> Result<(), MoodError> {
        (**self).set_mood_by_index(index, now_ms)
    }

    fn set_mood_by_name(&mut self, name: &str, now_ms: u32) -> Result<(), MoodError> {
        (**self).set_mood_by_name(name, now_ms)
    }

    fn pattern_of_index(&self, index: u8) -> PatternKind {
        (**self).pattern_of_index(index)
    }

    fn is_frozen(&self) -> bool {
        (**self).is_frozen()
    }
}
