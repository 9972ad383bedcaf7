//! Material state carried by actors.
//!
//! Scope:
//! - color representation (straight RGB in `[0, 1]`)
//! - per-actor surface state (color, opacity, visibility)

mod color;

pub use color::Rgb;

/// Surface state of one actor.
///
/// The UI actor and its VR clone each own a `Material` by value; recoloring
/// one never affects the other.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Material {
    pub color: Rgb,
    pub opacity: f32,
    pub visible: bool,
}

impl Material {
    #[inline]
    pub const fn new(color: Rgb) -> Self {
        Self {
            color,
            opacity: 1.0,
            visible: true,
        }
    }

    #[inline]
    pub fn is_opaque(&self) -> bool {
        self.opacity >= 1.0
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::new(Rgb::WHITE)
    }
}
