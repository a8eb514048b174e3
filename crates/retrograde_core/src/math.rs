//! # Fixed-Point Math
//!
//! World coordinates are 16.16 fixed-point integers. The integer part is the
//! pixel, the low 16 bits are the sub-pixel fraction.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Sub, SubAssign};

/// Number of fractional bits in a fixed-point coordinate.
pub const FIXED_SHIFT: u32 = 16;

/// One whole pixel in fixed-point units.
pub const FIXED_ONE: i32 = 1 << FIXED_SHIFT;

/// A 2D vector of 16.16 fixed-point values.
///
/// Used for positions, velocities, scales and update ranges.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable, Serialize, Deserialize,
)]
#[repr(C)]
pub struct Vector2 {
    /// Horizontal component (fixed-point).
    pub x: i32,
    /// Vertical component (fixed-point).
    pub y: i32,
}

impl Vector2 {
    /// The zero vector.
    pub const ZERO: Self = Self { x: 0, y: 0 };

    /// Creates a vector from raw fixed-point components.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Creates a vector from whole pixel values.
    #[inline]
    #[must_use]
    pub const fn from_pixels(x: i32, y: i32) -> Self {
        Self {
            x: x << FIXED_SHIFT,
            y: y << FIXED_SHIFT,
        }
    }
}

impl Add for Vector2 {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x.wrapping_add(rhs.x), self.y.wrapping_add(rhs.y))
    }
}

impl AddAssign for Vector2 {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Vector2 {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x.wrapping_sub(rhs.x), self.y.wrapping_sub(rhs.y))
    }
}

impl SubAssign for Vector2 {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}
