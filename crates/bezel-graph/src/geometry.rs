//! World/display coordinate plumbing and the small amount of planar geometry the
//! navigation subsystem needs.
//!
//! Display coordinates are pixels with the origin at the bottom-left corner of
//! the viewport and y pointing up. World coordinates are the graph layout's own
//! units.

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Mul, Neg, Sub};

/// Tolerance used for degenerate-geometry checks.
pub const GEOMETRY_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn length(&self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn distance(&self, other: Vec2) -> f64 {
        (*self - other).length()
    }

    pub fn distance_squared(&self, other: Vec2) -> f64 {
        let d = *self - other;
        d.x * d.x + d.y * d.y
    }

    pub fn dot(&self, other: Vec2) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// z component of the 3D cross product.
    pub fn cross(&self, other: Vec2) -> f64 {
        self.x * other.y - self.y * other.x
    }

    /// Rotate counter-clockwise about the origin.
    pub fn rotated(&self, degrees: f64) -> Vec2 {
        let (s, c) = degrees.to_radians().sin_cos();
        Vec2::new(self.x * c - self.y * s, self.x * s + self.y * c)
    }

    pub fn lerp(&self, other: Vec2, t: f64) -> Vec2 {
        Vec2::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Direction angle in degrees, normalised to `[0, 360)`. `None` for a zero vector.
    pub fn angle_degrees(&self) -> Option<f64> {
        if self.length() <= GEOMETRY_EPSILON || !self.is_finite() {
            return None;
        }
        Some(normalize_degrees(self.y.atan2(self.x).to_degrees()))
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Vec2;
    fn mul(self, rhs: f64) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Vec2 {
    type Output = Vec2;
    fn neg(self) -> Vec2 {
        Vec2::new(-self.x, -self.y)
    }
}

/// Wrap an angle in degrees into `[0, 360)`.
pub fn normalize_degrees(degrees: f64) -> f64 {
    if !degrees.is_finite() {
        return 0.0;
    }
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// A rectangle defined by min and max corners
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    pub fn from_min_max(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    pub fn from_center_half_extents(center: Vec2, half_width: f64, half_height: f64) -> Self {
        Self {
            min: Vec2::new(center.x - half_width, center.y - half_height),
            max: Vec2::new(center.x + half_width, center.y + half_height),
        }
    }

    /// Bounding box of a point set, `None` when the set is empty.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Vec2>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut rect = Rect::from_min_max(first, first);
        for p in iter {
            rect.include(p);
        }
        Some(rect)
    }

    pub fn include(&mut self, p: Vec2) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(
            self.min.x + self.width() * 0.5,
            self.min.y + self.height() * 0.5,
        )
    }

    /// Length of the diagonal.
    pub fn diagonal(&self) -> f64 {
        self.width().hypot(self.height())
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Inclusive containment: points on the border are inside.
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }

    /// Exclusive containment: points on the border are outside.
    pub fn strictly_contains(&self, point: Vec2) -> bool {
        point.x > self.min.x && point.x < self.max.x && point.y > self.min.y && point.y < self.max.y
    }

    pub fn corners(&self) -> [Vec2; 4] {
        [
            self.min,
            Vec2::new(self.max.x, self.min.y),
            self.max,
            Vec2::new(self.min.x, self.max.y),
        ]
    }
}

/// Outcome of a point-in-polygon test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Containment {
    Inside,
    Outside,
    /// The polygon has fewer than three vertices, zero area or non-finite
    /// coordinates. Callers treat this as "no match".
    Degenerate,
}

/// Signed area of a simple polygon (positive when counter-clockwise).
pub fn signed_area(polygon: &[Vec2]) -> f64 {
    if polygon.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for (i, a) in polygon.iter().enumerate() {
        let b = polygon[(i + 1) % polygon.len()];
        sum += a.cross(b);
    }
    sum * 0.5
}

/// Even-odd ray casting test.
pub fn point_in_polygon(point: Vec2, polygon: &[Vec2]) -> Containment {
    if polygon.len() < 3
        || !point.is_finite()
        || polygon.iter().any(|p| !p.is_finite())
        || signed_area(polygon).abs() <= GEOMETRY_EPSILON
    {
        return Containment::Degenerate;
    }

    let mut inside = false;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let (pi, pj) = (polygon[i], polygon[j]);
        if (pi.y > point.y) != (pj.y > point.y) {
            let x_cross = pj.x + (point.y - pj.y) * (pi.x - pj.x) / (pi.y - pj.y);
            if point.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }

    if inside {
        Containment::Inside
    } else {
        Containment::Outside
    }
}

/// Conversion between display pixels and world coordinates for the current view.
///
/// Implemented by whatever owns the camera; the navigation code never assumes a
/// particular renderer.
pub trait CoordinateTransform {
    fn display_to_world(&self, display: Vec2) -> Vec2;
    fn world_to_display(&self, world: Vec2) -> Vec2;
    /// Viewport size in pixels `(width, height)`.
    fn viewport_size(&self) -> (u32, u32);

    fn has_zero_area(&self) -> bool {
        let (w, h) = self.viewport_size();
        w == 0 || h == 0
    }

    /// Display centre in pixels.
    fn display_center(&self) -> Vec2 {
        let (w, h) = self.viewport_size();
        Vec2::new(f64::from(w) / 2.0, f64::from(h) / 2.0)
    }

    /// The viewport's visible region in world coordinates, or `None` for a
    /// zero-size viewport.
    fn display_bounds_in_world(&self) -> Option<Rect> {
        if self.has_zero_area() {
            return None;
        }
        let (w, h) = self.viewport_size();
        let a = self.display_to_world(Vec2::ZERO);
        let b = self.display_to_world(Vec2::new(f64::from(w), f64::from(h)));
        Rect::from_points([a, b])
    }
}

/// A fixed mapping of a pixel viewport onto a world-space window. The window may
/// have a different aspect ratio than the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub world: Rect,
}

impl Viewport {
    pub fn new(width: u32, height: u32, world: Rect) -> Self {
        Self {
            width,
            height,
            world,
        }
    }
}

impl CoordinateTransform for Viewport {
    fn display_to_world(&self, display: Vec2) -> Vec2 {
        if self.has_zero_area() {
            return self.world.center();
        }
        Vec2::new(
            self.world.min.x + display.x / f64::from(self.width) * self.world.width(),
            self.world.min.y + display.y / f64::from(self.height) * self.world.height(),
        )
    }

    fn world_to_display(&self, world: Vec2) -> Vec2 {
        if self.world.width().abs() <= GEOMETRY_EPSILON
            || self.world.height().abs() <= GEOMETRY_EPSILON
        {
            return self.display_center();
        }
        Vec2::new(
            (world.x - self.world.min.x) / self.world.width() * f64::from(self.width),
            (world.y - self.world.min.y) / self.world.height() * f64::from(self.height),
        )
    }

    fn viewport_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Orthographic 2D camera: a focal point and a parallel scale (half of the visible
/// world height), rendered into a pixel viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrthoCamera {
    pub focal_point: Vec2,
    pub parallel_scale: f64,
    pub viewport_width: u32,
    pub viewport_height: u32,
}

impl Default for OrthoCamera {
    fn default() -> Self {
        Self {
            focal_point: Vec2::ZERO,
            parallel_scale: 1.0,
            viewport_width: 800,
            viewport_height: 600,
        }
    }
}

impl OrthoCamera {
    pub fn new(focal_point: Vec2, parallel_scale: f64, width: u32, height: u32) -> Self {
        Self {
            focal_point,
            parallel_scale,
            viewport_width: width,
            viewport_height: height,
        }
    }

    /// The viewport this camera currently shows.
    pub fn viewport(&self) -> Viewport {
        let aspect = if self.viewport_height == 0 {
            0.0
        } else {
            f64::from(self.viewport_width) / f64::from(self.viewport_height)
        };
        let world = Rect::from_center_half_extents(
            self.focal_point,
            self.parallel_scale * aspect,
            self.parallel_scale,
        );
        Viewport::new(self.viewport_width, self.viewport_height, world)
    }

    pub fn move_to(&mut self, x: f64, y: f64, parallel_scale: f64) {
        self.focal_point = Vec2::new(x, y);
        if parallel_scale.is_finite() && parallel_scale > 0.0 {
            self.parallel_scale = parallel_scale;
        }
    }
}

impl CoordinateTransform for OrthoCamera {
    fn display_to_world(&self, display: Vec2) -> Vec2 {
        self.viewport().display_to_world(display)
    }

    fn world_to_display(&self, world: Vec2) -> Vec2 {
        self.viewport().world_to_display(world)
    }

    fn viewport_size(&self) -> (u32, u32) {
        (self.viewport_width, self.viewport_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn square() -> Vec<Vec2> {
        vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(10.0, 10.0),
            Vec2::new(0.0, 10.0),
        ]
    }

    #[test]
    fn test_point_in_polygon() {
        assert_eq!(
            point_in_polygon(Vec2::new(5.0, 5.0), &square()),
            Containment::Inside
        );
        assert_eq!(
            point_in_polygon(Vec2::new(15.0, 5.0), &square()),
            Containment::Outside
        );
    }

    #[test]
    fn test_point_in_degenerate_polygon() {
        let line = vec![Vec2::new(0.0, 0.0), Vec2::new(5.0, 5.0), Vec2::new(10.0, 10.0)];
        assert_eq!(
            point_in_polygon(Vec2::new(5.0, 5.0), &line),
            Containment::Degenerate
        );
        assert_eq!(
            point_in_polygon(Vec2::new(5.0, 5.0), &square()[..2]),
            Containment::Degenerate
        );
        let mut bad = square();
        bad[1].x = f64::NAN;
        assert_eq!(
            point_in_polygon(Vec2::new(5.0, 5.0), &bad),
            Containment::Degenerate
        );
    }

    #[test]
    fn test_normalize_degrees() {
        assert_eq!(normalize_degrees(-90.0), 270.0);
        assert_eq!(normalize_degrees(360.0), 0.0);
        assert_eq!(normalize_degrees(725.0), 5.0);
        assert!(normalize_degrees(-1e-18) < 360.0);
        assert_eq!(normalize_degrees(f64::NAN), 0.0);
    }

    #[test]
    fn test_zero_vector_has_no_angle() {
        assert_eq!(Vec2::ZERO.angle_degrees(), None);
        assert_eq!(Vec2::new(0.0, -2.0).angle_degrees(), Some(270.0));
    }

    #[test]
    fn test_viewport_maps_corners() {
        let vp = Viewport::new(
            800,
            600,
            Rect::from_min_max(Vec2::new(-100.0, -100.0), Vec2::new(100.0, 100.0)),
        );
        assert_eq!(vp.display_to_world(Vec2::ZERO), Vec2::new(-100.0, -100.0));
        assert_eq!(
            vp.display_to_world(Vec2::new(800.0, 600.0)),
            Vec2::new(100.0, 100.0)
        );
        assert_eq!(vp.display_center(), Vec2::new(400.0, 300.0));
        let bounds = vp.display_bounds_in_world().unwrap();
        assert_eq!(bounds.center(), Vec2::ZERO);
    }

    #[test]
    fn test_zero_size_viewport_has_no_bounds() {
        let vp = Viewport::new(0, 600, Rect::default());
        assert!(vp.display_bounds_in_world().is_none());
    }

    #[test]
    fn test_camera_viewport_aspect() {
        let cam = OrthoCamera::new(Vec2::new(10.0, 0.0), 50.0, 800, 400);
        let world = cam.viewport().world;
        assert!((world.width() - 200.0).abs() < 1e-9);
        assert!((world.height() - 100.0).abs() < 1e-9);
        assert_eq!(world.center(), Vec2::new(10.0, 0.0));
    }

    proptest! {
        #[test]
        fn prop_display_world_round_trip(
            x in 0.0f64..800.0,
            y in 0.0f64..600.0,
            fx in -1000.0f64..1000.0,
            fy in -1000.0f64..1000.0,
            scale in 0.1f64..500.0,
        ) {
            let cam = OrthoCamera::new(Vec2::new(fx, fy), scale, 800, 600);
            let p = Vec2::new(x, y);
            let back = cam.world_to_display(cam.display_to_world(p));
            prop_assert!((back.x - p.x).abs() < 1e-6, "x {} vs {}", back.x, p.x);
            prop_assert!((back.y - p.y).abs() < 1e-6, "y {} vs {}", back.y, p.y);
        }

        #[test]
        fn prop_normalized_angle_in_range(d in -1.0e6f64..1.0e6) {
            let n = normalize_degrees(d);
            prop_assert!((0.0..360.0).contains(&n));
        }
    }
}
