use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

pub const fn pos(x: f64, y: f64) -> Position {
    Position { x, y }
}

impl Position {
    pub const ZERO: Self = pos(0.0, 0.0);

    pub fn length_sq(self) -> f64 {
        (self.x * self.x) + (self.y * self.y)
    }

    pub fn length(self) -> f64 {
        self.length_sq().sqrt()
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Position {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        pos(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Position {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        pos(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Position {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        pos(self.x * rhs, self.y * rhs)
    }
}

impl Div<f64> for Position {
    type Output = Self;

    fn div(self, rhs: f64) -> Self {
        pos(self.x / rhs, self.y / rhs)
    }
}

impl Neg for Position {
    type Output = Self;

    fn neg(self) -> Self {
        pos(-self.x, -self.y)
    }
}

impl AddAssign for Position {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl SubAssign for Position {
    fn sub_assign(&mut self, rhs: Self) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl MulAssign<f64> for Position {
    fn mul_assign(&mut self, rhs: f64) {
        self.x *= rhs;
        self.y *= rhs;
    }
}

impl DivAssign<f64> for Position {
    fn div_assign(&mut self, rhs: f64) {
        self.x /= rhs;
        self.y /= rhs;
    }
}

/// Axis-aligned box around a set of positions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub min: Position,
    pub max: Position,
}

impl Bounds {
    pub fn from_points(points: impl IntoIterator<Item = Position>) -> Option<Self> {
        let mut min = pos(f64::INFINITY, f64::INFINITY);
        let mut max = pos(f64::NEG_INFINITY, f64::NEG_INFINITY);

        for point in points {
            min.x = min.x.min(point.x);
            min.y = min.y.min(point.y);
            max.x = max.x.max(point.x);
            max.y = max.y.max(point.y);
        }

        if !min.is_finite() || !max.is_finite() {
            return None;
        }

        Some(Self { min, max })
    }

    pub fn center(self) -> Position {
        (self.min + self.max) * 0.5
    }

    pub fn contains(self, point: Position) -> bool {
        (self.min.x..=self.max.x).contains(&point.x)
            && (self.min.y..=self.max.y).contains(&point.y)
    }
}
