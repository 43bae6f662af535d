//! Landmark groupings over graph vertices, their hull polygons and centres.

use crate::geometry::{GEOMETRY_EPSILON, Rect, Vec2, signed_area};
use crate::graph::Graph;
use bezel_core::{HullShape, LandmarkId, Rgba, VertexId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A named, colourable group of vertices. A landmark may consist of several
/// disjoint clusters; each cluster gets its own hull and centre.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub id: LandmarkId,
    pub name: String,
    #[serde(default)]
    pub color: Rgba,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub clusters: Vec<Vec<VertexId>>,
}

fn default_enabled() -> bool {
    true
}

impl Landmark {
    pub fn new(id: LandmarkId, name: impl Into<String>, members: Vec<VertexId>) -> Self {
        Self {
            id,
            name: name.into(),
            color: Rgba::default(),
            enabled: true,
            clusters: vec![members],
        }
    }

    pub fn with_color(mut self, color: Rgba) -> Self {
        self.color = color;
        self
    }

    pub fn members(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.clusters.iter().flatten().copied()
    }
}

/// Hull polygon of one landmark cluster, in world coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LandmarkHull {
    pub landmark: LandmarkId,
    pub cluster: usize,
    pub polygon: Vec<Vec2>,
    pub color: Rgba,
}

/// Centre of one landmark cluster. Serves as both the off-screen test point and
/// the flight arrival point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LandmarkCenter {
    pub landmark: LandmarkId,
    pub cluster: usize,
    pub point: Vec2,
    pub label: String,
    pub color: Rgba,
}

/// The externally managed landmark collection. Every mutation bumps the
/// revision so cached flight maps can detect enable-state changes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LandmarkSet {
    landmarks: Vec<Landmark>,
    #[serde(skip)]
    revision: u64,
}

impl LandmarkSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a landmark, replacing any existing one with the same id.
    pub fn insert(&mut self, landmark: Landmark) {
        match self.landmarks.iter_mut().find(|l| l.id == landmark.id) {
            Some(existing) => *existing = landmark,
            None => self.landmarks.push(landmark),
        }
        self.revision += 1;
    }

    pub fn remove(&mut self, id: LandmarkId) -> Option<Landmark> {
        let pos = self.landmarks.iter().position(|l| l.id == id)?;
        self.revision += 1;
        Some(self.landmarks.remove(pos))
    }

    pub fn set_enabled(&mut self, id: LandmarkId, enabled: bool) -> bool {
        self.modify(id, |l| l.enabled = enabled)
    }

    pub fn rename(&mut self, id: LandmarkId, name: impl Into<String>) -> bool {
        let name = name.into();
        self.modify(id, |l| l.name = name)
    }

    pub fn set_color(&mut self, id: LandmarkId, color: Rgba) -> bool {
        self.modify(id, |l| l.color = color)
    }

    fn modify(&mut self, id: LandmarkId, f: impl FnOnce(&mut Landmark)) -> bool {
        match self.landmarks.iter_mut().find(|l| l.id == id) {
            Some(l) => {
                f(l);
                self.revision += 1;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: LandmarkId) -> Option<&Landmark> {
        self.landmarks.iter().find(|l| l.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Landmark> {
        self.landmarks.iter()
    }

    pub fn enabled(&self) -> impl Iterator<Item = &Landmark> {
        self.landmarks.iter().filter(|l| l.enabled)
    }

    pub fn len(&self) -> usize {
        self.landmarks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.landmarks.is_empty()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Union of the member vertices of all enabled landmarks.
    pub fn selected_vertices(&self) -> HashSet<VertexId> {
        self.enabled().flat_map(|l| l.members()).collect()
    }

    /// Hull polygons for every non-empty cluster of every enabled landmark.
    /// Members that are not vertices of `graph` are ignored.
    pub fn hulls(&self, graph: &Graph, shape: HullShape) -> Vec<LandmarkHull> {
        let mut hulls = Vec::new();
        for landmark in self.enabled() {
            for (cluster, members) in landmark.clusters.iter().enumerate() {
                let points = member_positions(graph, members);
                if points.is_empty() {
                    continue;
                }
                hulls.push(LandmarkHull {
                    landmark: landmark.id,
                    cluster,
                    polygon: hull_polygon(&points, shape),
                    color: landmark.color,
                });
            }
        }
        hulls
    }

    /// Centres of every hull returned by [`LandmarkSet::hulls`].
    pub fn centers(&self, graph: &Graph, shape: HullShape) -> Vec<LandmarkCenter> {
        let mut centers = Vec::new();
        for landmark in self.enabled() {
            for (cluster, members) in landmark.clusters.iter().enumerate() {
                let points = member_positions(graph, members);
                if points.is_empty() {
                    continue;
                }
                let hull = hull_polygon(&points, shape);
                centers.push(LandmarkCenter {
                    landmark: landmark.id,
                    cluster,
                    point: polygon_center(&hull, &points),
                    label: landmark.name.clone(),
                    color: landmark.color,
                });
            }
        }
        centers
    }
}

fn member_positions(graph: &Graph, members: &[VertexId]) -> Vec<Vec2> {
    members
        .iter()
        .filter_map(|&v| graph.position(v))
        .filter(|p| p.is_finite())
        .collect()
}

pub fn hull_polygon(points: &[Vec2], shape: HullShape) -> Vec<Vec2> {
    match shape {
        HullShape::ConvexHull => convex_hull(points),
        HullShape::BoundingRectangle => Rect::from_points(points.iter().copied())
            .map(|r| r.corners().to_vec())
            .unwrap_or_default(),
    }
}

/// Andrew's monotone chain. Returns the hull counter-clockwise without a repeated
/// closing vertex; collinear or coincident input yields fewer than three points.
pub fn convex_hull(points: &[Vec2]) -> Vec<Vec2> {
    let mut pts: Vec<Vec2> = points.to_vec();
    pts.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    pts.dedup();
    if pts.len() < 3 {
        return pts;
    }

    let turn = |o: Vec2, a: Vec2, b: Vec2| (a - o).cross(b - o);
    let mut hull: Vec<Vec2> = Vec::with_capacity(pts.len() * 2);
    for &p in &pts {
        while hull.len() >= 2 && turn(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0.0 {
            hull.pop();
        }
        hull.push(p);
    }
    let lower_len = hull.len() + 1;
    for &p in pts.iter().rev().skip(1) {
        while hull.len() >= lower_len && turn(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0.0
        {
            hull.pop();
        }
        hull.push(p);
    }
    hull.pop();
    hull
}

/// Area centroid of `polygon`; falls back to the mean of `members` when the
/// polygon has no area.
pub fn polygon_center(polygon: &[Vec2], members: &[Vec2]) -> Vec2 {
    let area = signed_area(polygon);
    if area.abs() > GEOMETRY_EPSILON {
        let mut c = Vec2::ZERO;
        for (i, a) in polygon.iter().enumerate() {
            let b = polygon[(i + 1) % polygon.len()];
            let f = a.cross(b);
            c += (*a + b) * f;
        }
        return c * (1.0 / (6.0 * area));
    }
    mean(members)
}

fn mean(points: &[Vec2]) -> Vec2 {
    if points.is_empty() {
        return Vec2::ZERO;
    }
    let mut sum = Vec2::ZERO;
    for p in points {
        sum += *p;
    }
    sum * (1.0 / points.len() as f64)
}
