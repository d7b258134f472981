use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

/// Magnitudes at or below this are treated as zero.
pub const EPSILON: f64 = 0.001;

pub const RAD_TO_DEG: f64 = 180.0 / std::f64::consts::PI;

/// Expects a non-negative input.
#[inline]
pub fn is_approximately_zero(t: f64) -> bool {
    t < EPSILON
}

/// Expects a non-negative input.
#[inline]
pub fn is_approximately_one(t: f64) -> bool {
    t > 1.0 - EPSILON
}

#[inline]
pub fn rad_to_deg(rad: f64) -> f64 {
    rad * RAD_TO_DEG
}

#[inline]
pub fn deg_to_rad(deg: f64) -> f64 {
    deg / RAD_TO_DEG
}

/// Wraps an angle in degrees into `(-180, 180]`.
pub fn wrap_degrees(deg: f64) -> f64 {
    let mut wrapped = deg % 360.0;
    if wrapped > 180.0 {
        wrapped -= 360.0;
    } else if wrapped <= -180.0 {
        wrapped += 360.0;
    }
    wrapped
}

// ── Float vector ────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector2 {
    pub x: f64,
    pub y: f64,
}

impl Vector2 {
    pub const ZERO: Vector2 = Vector2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Unit vector pointing along `deg` (0° = +x, 90° = +y).
    pub fn from_degrees(deg: f64) -> Self {
        let rad = deg_to_rad(deg);
        Self::new(rad.cos(), rad.sin())
    }

    pub fn magnitude(self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Returns `self` untouched when the magnitude is at or below [`EPSILON`].
    pub fn normalized(self) -> Self {
        let magnitude = self.magnitude();
        if magnitude > EPSILON {
            self / magnitude
        } else {
            self
        }
    }

    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Signed `atan2(y, x)` in degrees.
    pub fn tangent_angle(self) -> f64 {
        rad_to_deg(self.y.atan2(self.x))
    }

    /// Truncates toward zero, matching integer conversion of game coordinates.
    pub fn to_point(self) -> MapPoint {
        MapPoint::new(self.x as i32, self.y as i32)
    }
}

impl Add for Vector2 {
    type Output = Vector2;

    fn add(self, rhs: Self) -> Self::Output {
        Vector2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vector2 {
    type Output = Vector2;

    fn sub(self, rhs: Self) -> Self::Output {
        Vector2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vector2 {
    type Output = Vector2;

    fn mul(self, rhs: f64) -> Self::Output {
        Vector2::new(self.x * rhs, self.y * rhs)
    }
}

impl Div<f64> for Vector2 {
    type Output = Vector2;

    fn div(self, rhs: f64) -> Self::Output {
        Vector2::new(self.x / rhs, self.y / rhs)
    }
}

impl Neg for Vector2 {
    type Output = Vector2;

    fn neg(self) -> Self::Output {
        Vector2::new(-self.x, -self.y)
    }
}

// ── Integer map point ───────────────────────────────────────────────

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MapPoint {
    pub x: i32,
    pub y: i32,
}

impl MapPoint {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn to_vector(self) -> Vector2 {
        Vector2::new(self.x as f64, self.y as f64)
    }

    pub fn distance_to(self, other: Self) -> f64 {
        (other - self).to_vector().magnitude()
    }
}

impl Add for MapPoint {
    type Output = MapPoint;

    fn add(self, rhs: Self) -> Self::Output {
        MapPoint::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for MapPoint {
    type Output = MapPoint;

    fn sub(self, rhs: Self) -> Self::Output {
        MapPoint::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl fmt::Display for MapPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.x, self.y)
    }
}
