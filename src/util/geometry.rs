// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Geometric primitives.
//!
//! This module provides the 2D point type shared by the whole application,
//! plus the affine matrices used to move points between screen space,
//! the UI surface and the map element.

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Mul, Sub};

/// Determinants smaller than this are treated as singular.
const SINGULAR_EPSILON: f32 = 1e-9;

/// A 2D point or vector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    /// Create a new point.
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Multiply each component by the matching component of `other`.
    pub fn component_mul(self, other: Point) -> Point {
        Point::new(self.x * other.x, self.y * other.y)
    }

    /// Euclidean distance to `other`.
    pub fn distance(self, other: Point) -> f32 {
        let d = self - other;
        (d.x * d.x + d.y * d.y).sqrt()
    }

    /// Check whether both components are within `tolerance` of `other`.
    pub fn approx_eq(self, other: Point, tolerance: f32) -> bool {
        (self.x - other.x).abs() <= tolerance && (self.y - other.y).abs() <= tolerance
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Point {
    fn add_assign(&mut self, rhs: Point) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Point {
    type Output = Point;

    fn mul(self, rhs: f32) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

/// A 2D affine transform.
///
/// Maps `(x, y)` to `(a*x + b*y + tx, c*x + d*y + ty)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine2 {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub tx: f32,
    pub ty: f32,
}

impl Affine2 {
    pub const IDENTITY: Affine2 = Affine2 {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        tx: 0.0,
        ty: 0.0,
    };

    /// Pure translation.
    pub fn translation(offset: Point) -> Self {
        Self {
            tx: offset.x,
            ty: offset.y,
            ..Self::IDENTITY
        }
    }

    /// Non-uniform scale about the origin.
    pub fn scaling(scale: Point) -> Self {
        Self {
            a: scale.x,
            d: scale.y,
            ..Self::IDENTITY
        }
    }

    /// Counter-clockwise rotation about the origin, in radians.
    pub fn rotation(radians: f32) -> Self {
        let (sin, cos) = radians.sin_cos();
        Self {
            a: cos,
            b: -sin,
            c: sin,
            d: cos,
            tx: 0.0,
            ty: 0.0,
        }
    }

    /// Compose transforms: the result applies `other` first, then `self`.
    pub fn then_after(self, other: Affine2) -> Affine2 {
        Affine2 {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            tx: self.a * other.tx + self.b * other.ty + self.tx,
            ty: self.c * other.tx + self.d * other.ty + self.ty,
        }
    }

    /// Apply the transform to a point.
    pub fn transform_point(&self, p: Point) -> Point {
        Point::new(
            self.a * p.x + self.b * p.y + self.tx,
            self.c * p.x + self.d * p.y + self.ty,
        )
    }

    /// Determinant of the linear part.
    pub fn determinant(&self) -> f32 {
        self.a * self.d - self.b * self.c
    }

    /// Inverse transform, or `None` if the linear part is singular.
    pub fn inverse(&self) -> Option<Affine2> {
        let det = self.determinant();
        if det.abs() < SINGULAR_EPSILON {
            return None;
        }
        let inv_det = 1.0 / det;
        let a = self.d * inv_det;
        let b = -self.b * inv_det;
        let c = -self.c * inv_det;
        let d = self.a * inv_det;
        Some(Affine2 {
            a,
            b,
            c,
            d,
            tx: -(a * self.tx + b * self.ty),
            ty: -(c * self.tx + d * self.ty),
        })
    }
}

impl Default for Affine2 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Local transform of a UI element relative to its parent.
///
/// Applied as scale, then rotation, then translation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementTransform {
    pub position: Point,
    pub rotation: f32,
    pub scale: Point,
}

impl ElementTransform {
    /// Unrotated element at `position` with uniform `scale`.
    pub fn new(position: Point, scale: f32) -> Self {
        Self {
            position,
            rotation: 0.0,
            scale: Point::new(scale, scale),
        }
    }

    /// Matrix mapping element-local points into the parent's frame.
    pub fn to_parent(&self) -> Affine2 {
        Affine2::translation(self.position)
            .then_after(Affine2::rotation(self.rotation))
            .then_after(Affine2::scaling(self.scale))
    }
}

impl Default for ElementTransform {
    fn default() -> Self {
        Self::new(Point::ZERO, 1.0)
    }
}
