//! Fixed-Point 2D Vector
//!
//! Positions, velocities and extents in world units. Y points up; the map
//! grows downward from row 0 at y = 0.

use std::fmt;
use std::ops::Add;
use serde::{Serialize, Deserialize};

use super::fixed::{Fixed, FIXED_SCALE, fixed_div, fixed_mul, fixed_sqrt, to_float};

/// 2D vector with Q16.16 components.
#[derive(Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FixedVec2 {
    /// Horizontal component.
    pub x: Fixed,
    /// Vertical component, up is positive.
    pub y: Fixed,
}

impl FixedVec2 {
    /// Origin, also "no movement".
    pub const ZERO: Self = Self { x: 0, y: 0 };

    /// Vector from raw fixed-point components.
    #[inline]
    pub const fn new(x: Fixed, y: Fixed) -> Self {
        Self { x, y }
    }

    /// Vector from whole world units.
    #[inline]
    pub const fn from_ints(x: i32, y: i32) -> Self {
        Self::new(x << FIXED_SCALE, y << FIXED_SCALE)
    }

    /// Both components multiplied by `factor`, e.g. acceleration times `dt`.
    #[inline]
    pub fn scale(self, factor: Fixed) -> Self {
        Self::new(fixed_mul(self.x, factor), fixed_mul(self.y, factor))
    }

    /// Squared magnitude. Input magnitudes stay within a few units, so this
    /// does not overflow.
    #[inline]
    pub fn length_squared(self) -> Fixed {
        fixed_mul(self.x, self.x) + fixed_mul(self.y, self.y)
    }

    /// Same direction, magnitude 1. The zero vector stays zero.
    pub fn normalize(self) -> Self {
        let length = fixed_sqrt(self.length_squared());
        if length == 0 {
            return Self::ZERO;
        }
        Self::new(fixed_div(self.x, length), fixed_div(self.y, length))
    }
}

impl Add for FixedVec2 {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl fmt::Debug for FixedVec2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.3}, {:.3})", to_float(self.x), to_float(self.y))
    }
}
