//! 8-bit RGB color and the integer channel math shared by fades and patterns.
//!
//! All arithmetic is per channel on `u8` with widened intermediates and
//! explicit clamping. No gamma or color-space correction is applied.

/// One 8-bit-per-channel RGB color.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rgb8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Rgb8 {
    /// All channels off.
    pub const BLACK: Rgb8 = Rgb8::new(0, 0, 0);

    /// Construct a color from its three channels.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Apply `f` to every channel.
    pub fn map(self, mut f: impl FnMut(u8) -> u8) -> Self {
        Self::new(f(self.r), f(self.g), f(self.b))
    }

    /// Scale every channel by `brightness / 255`.
    pub fn scaled(self, brightness: u8) -> Self {
        self.map(|c| scale_channel(c, brightness))
    }

    /// Per-channel linear interpolation `self + (to − self)·num/den`.
    ///
    /// `den == 0` yields `to`.
    pub fn lerp(self, to: Rgb8, num: u16, den: u16) -> Self {
        Self::new(
            lerp_channel(self.r, to.r, num, den),
            lerp_channel(self.g, to.g, num, den),
            lerp_channel(self.b, to.b, num, den),
        )
    }

    /// Blend toward `self + amplitude` (saturating) by modulation `m`:
    /// `(c·(255 − m) + sat(c + amplitude)·m) / 255` per channel.
    pub fn swell(self, amplitude: u8, m: u8) -> Self {
        self.map(|c| {
            let raised = c.saturating_add(amplitude) as u32;
            ((c as u32 * (255 - m as u32) + raised * m as u32) / 255) as u8
        })
    }

    /// Add a signed deviation to every channel, clamped to [0, 255].
    pub fn offset(self, delta: i16) -> Self {
        self.map(|c| (c as i32 + delta as i32).clamp(0, 255) as u8)
    }

    /// Channel-wise complement `255 − c`, the duty cycle a common-anode LED
    /// needs to show this color.
    pub fn inverted(self) -> Self {
        self.map(|c| 255 - c)
    }
}

/// `v · s / 255`, clamped to 255.
pub fn scale_channel(v: u8, s: u8) -> u8 {
    let r = v as u16 * s as u16 / 255;
    r.min(255) as u8
}

fn lerp_channel(a: u8, b: u8, num: u16, den: u16) -> u8 {
    if den == 0 {
        return b;
    }
    let diff = b as i32 - a as i32;
    let v = a as i32 + diff * num as i32 / den as i32;
    v.clamp(0, 255) as u8
}
