//! Interpolatable value types
//!
//! Anything the engine tweens implements [`Tweenable`]. The engine never looks
//! inside a value; it only asks for a blend between two endpoints.

use serde::{Deserialize, Serialize};

/// A value that can be linearly interpolated between two endpoints
pub trait Tweenable: Clone + Send + Sync + 'static {
    /// Blend from `self` toward `to` by factor `t`
    ///
    /// `t` is usually in `0.0..=1.0`, but overshooting curves (back, elastic)
    /// pass values outside that range and implementations must extrapolate.
    fn lerp(&self, to: &Self, t: f64) -> Self;
}

#[inline]
fn lerp_f32(a: f32, b: f32, t: f64) -> f32 {
    (a as f64 + (b as f64 - a as f64) * t) as f32
}

impl Tweenable for f64 {
    #[inline]
    fn lerp(&self, to: &Self, t: f64) -> Self {
        self + (to - self) * t
    }
}

impl Tweenable for f32 {
    #[inline]
    fn lerp(&self, to: &Self, t: f64) -> Self {
        lerp_f32(*self, *to, t)
    }
}

impl<const N: usize> Tweenable for [f32; N] {
    fn lerp(&self, to: &Self, t: f64) -> Self {
        let mut out = [0.0f32; N];
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = lerp_f32(self[i], to[i], t);
        }
        out
    }
}

/// 2D point or size
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl Tweenable for Vec2 {
    fn lerp(&self, to: &Self, t: f64) -> Self {
        Self {
            x: lerp_f32(self.x, to.x, t),
            y: lerp_f32(self.y, to.y, t),
        }
    }
}

/// Axis-aligned rectangle (origin + size)
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn origin(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }
}

impl Tweenable for Rect {
    fn lerp(&self, to: &Self, t: f64) -> Self {
        Self {
            x: lerp_f32(self.x, to.x, t),
            y: lerp_f32(self.y, to.y, t),
            width: lerp_f32(self.width, to.width, t),
            height: lerp_f32(self.height, to.height, t),
        }
    }
}

/// RGBA color with straight (non-premultiplied) alpha, components in 0.0-1.0
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::rgba(r, g, b, 1.0)
    }

    /// Parse from a 0xRRGGBB integer
    pub fn from_hex(hex: u32) -> Self {
        let r = ((hex >> 16) & 0xFF) as f32 / 255.0;
        let g = ((hex >> 8) & 0xFF) as f32 / 255.0;
        let b = (hex & 0xFF) as f32 / 255.0;
        Self::rgb(r, g, b)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

impl Tweenable for Color {
    fn lerp(&self, to: &Self, t: f64) -> Self {
        Self {
            r: lerp_f32(self.r, to.r, t),
            g: lerp_f32(self.g, to.g, t),
            b: lerp_f32(self.b, to.b, t),
            a: lerp_f32(self.a, to.a, t),
        }
    }
}
