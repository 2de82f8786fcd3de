//! Basic building blocks.

use std::{
    f64::consts::{PI, TAU},
    ops::{Add, Mul, Neg, Sub},
};

use nalgebra::{Rotation2, Vector2};
use serde::{Deserialize, Serialize};

/// A point or a displacement in the world plane, in meters.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Position {
    x: f64,
    y: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn distance(&self, position: Self) -> f64 {
        (*self - position).length()
    }

    pub fn length(&self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn dot(&self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y
    }

    pub fn rotate_vector(&self, angle: Angle) -> Position {
        (Rotation2::new(angle.0) * Vector2::from(*self)).into()
    }
}

impl From<Position> for Vector2<f64> {
    fn from(value: Position) -> Self {
        Vector2::new(value.x, value.y)
    }
}

impl From<Vector2<f64>> for Position {
    fn from(value: Vector2<f64>) -> Self {
        Position::new(value.x, value.y)
    }
}

impl From<Position> for (f64, f64) {
    fn from(value: Position) -> Self {
        (value.x, value.y)
    }
}

impl Add for Position {
    type Output = Position;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl Sub for Position {
    type Output = Position;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

impl Mul<f64> for Position {
    type Output = Position;

    fn mul(self, rhs: f64) -> Self::Output {
        Self {
            x: self.x * rhs,
            y: self.y * rhs,
        }
    }
}

impl Neg for Position {
    type Output = Position;

    fn neg(self) -> Self::Output {
        Self {
            x: -self.x,
            y: -self.y,
        }
    }
}

/// Heading in radians, counter-clockwise from the +X axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Angle(f64);

impl Angle {
    pub fn new(radians: f64) -> Self {
        Self(radians)
    }

    pub fn from_deg(degree: f64) -> Self {
        Self(degree * PI / 180.0)
    }

    pub fn to_deg(self) -> f64 {
        (self.0 * (180.0 / PI) + 360.0) % 360.0
    }

    pub fn radians(self) -> f64 {
        self.0
    }

    /// The same direction expressed in `[0, 2π)`.
    pub fn wrapped(self) -> Self {
        let radians = self.0.rem_euclid(TAU);
        // rem_euclid rounds tiny negative inputs up to exactly TAU
        Self(if radians >= TAU { 0.0 } else { radians })
    }

    pub fn unit_vector(self) -> Position {
        Position::new(self.0.cos(), self.0.sin())
    }
}

impl Neg for Angle {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Angle(-self.0)
    }
}

impl Add for Angle {
    type Output = Angle;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl From<Angle> for f64 {
    fn from(value: Angle) -> Self {
        value.0
    }
}
