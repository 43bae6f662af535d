//! Renderable overlay shapes for the bezel and the off-screen proxies.
//!
//! Shapes are first built in "bezel units" (the bezel is a ring of radius ~0.7
//! around the origin) and then placed at the display centre, scaled by half of
//! the shorter viewport side. All output polygons are in display pixels.

use crate::geometry::{CoordinateTransform, Rect, Vec2};
use crate::landmark::LandmarkCenter;
use crate::offscreen::{OffScreenProxy, PROXY_WIDTH_DEGREES};
use bezel_core::{LandmarkId, NavigationError, Rgba};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShapeKind {
    BezelRing,
    CentreSpot,
    Wedge,
    Pointer,
}

/// What a proxy shape resolves to when picked.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProxyTarget {
    pub landmark: LandmarkId,
    pub label: String,
    /// World point the camera flies to.
    pub arrival: Vec2,
}

/// A filled polygon for the 2D overlay.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlayShape {
    pub kind: ShapeKind,
    pub polygon: Vec<Vec2>,
    pub color: Rgba,
    pub opacity: f32,
    pub target: Option<ProxyTarget>,
}

impl OverlayShape {
    pub fn landmark(&self) -> Option<LandmarkId> {
        self.target.as_ref().map(|t| t.landmark)
    }
}

/// Output of one geometry pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProxyGeometry {
    /// Ring and centre spot, in that order.
    pub bezel: Vec<OverlayShape>,
    /// Wedge and pointer of each proxy, in drawing order.
    pub proxies: Vec<OverlayShape>,
    /// Display centre in pixels.
    pub center: Vec2,
    /// Pixels per bezel unit.
    pub scale: f64,
    pub inner_radius: f64,
    pub outer_radius: f64,
    pub spot_radius: f64,
}

impl ProxyGeometry {
    /// All proxy shapes belonging to `landmark`.
    pub fn shapes_for(&self, landmark: LandmarkId) -> impl Iterator<Item = &OverlayShape> {
        self.proxies
            .iter()
            .filter(move |s| s.landmark() == Some(landmark))
    }

    pub fn is_empty(&self) -> bool {
        self.bezel.is_empty() && self.proxies.is_empty()
    }

    /// Multiply the bezel opacity and every proxy alpha by `factor`.
    pub fn dim(&mut self, factor: f32) {
        for shape in self.bezel.iter_mut() {
            shape.opacity = (shape.opacity * factor).clamp(0.0, 1.0);
        }
        for shape in self.proxies.iter_mut() {
            shape.color = shape.color.fade(factor);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyGeometryBuilder {
    pub inner_radius: f64,
    pub outer_radius: f64,
    pub spot_radius: f64,
    /// Outer radius of the pointer sector before distance scaling.
    pub pointer_radius: f64,
    pub wedge_width: f64,
    pub pointer_width: f64,
    pub ring_resolution: usize,
    pub resolution: usize,
    /// Explicit world size; `<= 0` infers it from the scene bounds.
    pub world_size: f64,
    pub reduce_overlaps: bool,
    pub show_error: bool,
    pub bezel_color: Rgba,
    pub bezel_opacity: f32,
}

impl Default for ProxyGeometryBuilder {
    fn default() -> Self {
        Self {
            inner_radius: 0.65,
            outer_radius: 0.70,
            spot_radius: 0.03,
            pointer_radius: 0.95,
            wedge_width: PROXY_WIDTH_DEGREES,
            pointer_width: 0.75,
            ring_resolution: 128,
            resolution: 16,
            world_size: 0.0,
            reduce_overlaps: false,
            show_error: false,
            bezel_color: Rgba::GREY,
            bezel_opacity: 0.25,
        }
    }
}

impl ProxyGeometryBuilder {
    /// The explicit world size if set, otherwise the diagonal of the scene
    /// bounds. The landmark centres stand in when the scene has no extent.
    pub fn world_size_for(
        &self,
        scene_bounds: Option<Rect>,
        centers: &[LandmarkCenter],
    ) -> f64 {
        if self.world_size > 0.0 {
            return self.world_size;
        }
        match scene_bounds.map(|r| r.diagonal()) {
            Some(diagonal) if diagonal > 0.0 => diagonal,
            _ => infer_world_size(centers),
        }
    }

    /// Build bezel and proxy shapes for the current view.
    pub fn build<T>(
        &self,
        proxies: &[OffScreenProxy],
        world_size: f64,
        view: &T,
    ) -> Result<ProxyGeometry, NavigationError>
    where
        T: CoordinateTransform + ?Sized,
    {
        if view.has_zero_area() {
            tracing::warn!("Zero size viewport, skipping proxy geometry");
            return Err(NavigationError::ZeroSizeViewport);
        }
        let (w, h) = view.viewport_size();
        let center = view.display_center();
        let scale = f64::from(w.min(h)) / 2.0;
        let place = |p: Vec2| center + p * scale;

        let bezel = vec![
            OverlayShape {
                kind: ShapeKind::BezelRing,
                polygon: annulus(self.inner_radius, self.outer_radius, self.ring_resolution)
                    .into_iter()
                    .map(place)
                    .collect(),
                color: self.bezel_color,
                opacity: self.bezel_opacity,
                target: None,
            },
            OverlayShape {
                kind: ShapeKind::CentreSpot,
                polygon: disk(self.spot_radius, self.resolution)
                    .into_iter()
                    .map(place)
                    .collect(),
                color: self.bezel_color,
                opacity: self.bezel_opacity,
                target: None,
            },
        ];

        let wedge = sector(
            self.inner_radius,
            self.outer_radius,
            self.wedge_width,
            self.resolution,
        );
        let pointer = sector(
            self.outer_radius,
            self.pointer_radius,
            self.pointer_width,
            self.resolution,
        );

        let mut shapes = Vec::with_capacity(proxies.len() * 2);
        for proxy in proxies {
            let target = ProxyTarget {
                landmark: proxy.landmark,
                label: proxy.label.clone(),
                arrival: proxy.world_point,
            };

            let wedge_rotation = proxy.angle - self.wedge_width / 2.0;
            shapes.push(OverlayShape {
                kind: ShapeKind::Wedge,
                polygon: wedge
                    .iter()
                    .map(|p| place(p.rotated(wedge_rotation)))
                    .collect(),
                color: proxy.color,
                opacity: 1.0,
                target: Some(target.clone()),
            });

            // The pointer is stretched radially about the outer ring, and
            // optionally tilted by the overlap correction, before being
            // rotated into place. It never reaches past `pointer_radius`.
            let stretch = if world_size > 0.0 {
                (proxy.distance / world_size).clamp(0.0, 1.0)
            } else {
                1.0
            };
            let tilt = if self.reduce_overlaps && self.show_error {
                proxy.error
            } else {
                0.0
            };
            let pointer_rotation = proxy.angle - self.pointer_width / 2.0;
            let hinge = Vec2::new(self.outer_radius, 0.0);
            shapes.push(OverlayShape {
                kind: ShapeKind::Pointer,
                polygon: pointer
                    .iter()
                    .map(|&p| {
                        let local = (p - hinge).rotated(tilt);
                        let stretched = Vec2::new(local.x * stretch, local.y) + hinge;
                        place(stretched.rotated(pointer_rotation))
                    })
                    .collect(),
                color: proxy.color,
                opacity: 1.0,
                target: Some(target),
            });
        }

        Ok(ProxyGeometry {
            bezel,
            proxies: shapes,
            center,
            scale,
            inner_radius: self.inner_radius * scale,
            outer_radius: self.outer_radius * scale,
            spot_radius: self.spot_radius * scale,
        })
    }
}

/// Diagonal of the bounding box of the landmark centres; 0 when empty.
pub fn infer_world_size(centers: &[LandmarkCenter]) -> f64 {
    Rect::from_points(centers.iter().map(|c| c.point))
        .map(|r| r.diagonal())
        .unwrap_or(0.0)
}

fn arc(radius: f64, start: f64, end: f64, resolution: usize) -> impl Iterator<Item = Vec2> {
    let steps = resolution.max(1);
    (0..=steps).map(move |i| {
        let a = start + (end - start) * i as f64 / steps as f64;
        Vec2::new(radius, 0.0).rotated(a)
    })
}

/// Annulus sector from 0 to `width` degrees.
fn sector(inner: f64, outer: f64, width: f64, resolution: usize) -> Vec<Vec2> {
    let mut points: Vec<Vec2> = arc(outer, 0.0, width, resolution).collect();
    points.extend(arc(inner, width, 0.0, resolution));
    points
}

fn disk(radius: f64, resolution: usize) -> Vec<Vec2> {
    let steps = resolution.max(3);
    let mut points: Vec<Vec2> = arc(radius, 0.0, 360.0, steps).collect();
    points.pop();
    points
}

/// Full ring as a single keyhole polygon: outer circle counter-clockwise, then
/// the inner circle clockwise, joined along the 0 degree seam.
fn annulus(inner: f64, outer: f64, resolution: usize) -> Vec<Vec2> {
    let steps = resolution.max(3);
    let mut points: Vec<Vec2> = arc(outer, 0.0, 360.0, steps).collect();
    points.extend(arc(inner, 360.0, 0.0, steps));
    points
}
