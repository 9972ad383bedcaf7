/// Straight (non-premultiplied) RGB color.
///
/// Invariant: channels are finite and within `[0, 1]` when built through the
/// normalizing constructors. `new` is `const` and trusts its input.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0.0, 0.0, 0.0);
    pub const WHITE: Rgb = Rgb::new(1.0, 1.0, 1.0);
    pub const RED: Rgb = Rgb::new(1.0, 0.0, 0.0);

    #[inline]
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Builds a color from `f64` components expected in `[0, 1]`.
    ///
    /// Out-of-range values are clamped; NaN becomes 0.
    #[inline]
    pub fn from_normalized(r: f64, g: f64, b: f64) -> Self {
        Self {
            r: unit(r) as f32,
            g: unit(g) as f32,
            b: unit(b) as f32,
        }
    }

    /// Creates a color from 8-bit channels (`0`–`255`).
    #[inline]
    pub fn from_u8(r: u8, g: u8, b: u8) -> Self {
        Self::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
    }

    /// Returns the 8-bit channels, rounding to nearest.
    #[inline]
    pub fn to_u8(self) -> [u8; 3] {
        let q = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b)]
    }

    #[inline]
    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.r.is_finite() && self.g.is_finite() && self.b.is_finite()
    }
}

#[inline]
fn unit(v: f64) -> f64 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_normalized_clamps_out_of_range() {
        let c = Rgb::from_normalized(1.5, -0.25, 0.5);
        assert_eq!(c, Rgb::new(1.0, 0.0, 0.5));
    }

    #[test]
    fn from_normalized_maps_nan_to_zero() {
        let c = Rgb::from_normalized(f64::NAN, 1.0, 1.0);
        assert_eq!(c.r, 0.0);
        assert!(c.is_finite());
    }

    #[test]
    fn u8_channels_survive_conversion() {
        assert_eq!(Rgb::from_u8(12, 200, 255).to_u8(), [12, 200, 255]);
    }
}
