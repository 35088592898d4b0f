//! 16-bit linear-feedback shift register.
//!
//! The feedback bit is the XOR of bits 0, 2, 3 and 5; the register shifts
//! right and the new bit enters at bit 15. Sequences are bit-for-bit
//! reproducible from the seed, which the selection regression tests rely on.

/// Deterministic 16-bit pseudo-random source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Lfsr16 {
    state: u16,
}

/// Substituted for a zero seed; an all-zero register never leaves zero.
pub const FALLBACK_SEED: u16 = 0xBEEF;

impl Lfsr16 {
    /// Construct a register from `seed`. A zero seed is replaced by
    /// [`FALLBACK_SEED`].
    pub const fn new(seed: u16) -> Self {
        Self {
            state: if seed == 0 { FALLBACK_SEED } else { seed },
        }
    }

    /// Current register contents.
    pub fn state(&self) -> u16 {
        self.state
    }

    /// XOR `entropy` into the register, keeping it non-zero.
    pub fn mix(&mut self, entropy: u16) {
        self.state ^= entropy;
        if self.state == 0 {
            self.state = FALLBACK_SEED;
        }
    }

    /// Advance one step and return the new register value.
    pub fn next_u16(&mut self) -> u16 {
        let x = self.state;
        let bit = (x ^ (x >> 2) ^ (x >> 3) ^ (x >> 5)) & 1;
        self.state = (x >> 1) | (bit << 15);
        self.state
    }

    /// Advance one step and return the high byte of the register.
    pub fn next_u8(&mut self) -> u8 {
        (self.next_u16() >> 8) as u8
    }
}

impl Default for Lfsr16 {
    fn default() -> Self {
        Self::new(FALLBACK_SEED)
    }
}
