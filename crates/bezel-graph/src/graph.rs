use crate::geometry::{Rect, Vec2};
use bezel_core::{EdgeId, VertexId};
use serde::{Deserialize, Serialize};
use std::ops::Index;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub position: Vec2,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Vertex {
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            position: Vec2::new(x, y),
            label: None,
        }
    }
}

/// An undirected edge as produced by the layout. `bends` is the routed polyline
/// between the endpoints, excluding the endpoints themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub source: VertexId,
    pub target: VertexId,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bends: Vec<Vec2>,
    #[serde(default = "default_edge_weight")]
    pub weight: f64,
}

fn default_edge_weight() -> f64 {
    1.0
}

/// Laid-out input graph. Vertex ids are arena indices and stay stable across
/// position updates; every mutation bumps `revision` so derived data (the flight
/// map) knows when it is stale.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Graph {
    vertices: Vec<Vertex>,
    edges: Vec<Edge>,
    #[serde(skip)]
    revision: u64,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_vertex(&mut self, vertex: Vertex) -> VertexId {
        let idx = VertexId(self.vertices.len());
        self.vertices.push(vertex);
        self.revision += 1;
        idx
    }

    /// Add an edge between two existing vertices. Returns `None` if either
    /// endpoint is out of range.
    pub fn add_edge(&mut self, source: VertexId, target: VertexId) -> Option<EdgeId> {
        self.add_routed_edge(source, target, Vec::new())
    }

    pub fn add_routed_edge(
        &mut self,
        source: VertexId,
        target: VertexId,
        bends: Vec<Vec2>,
    ) -> Option<EdgeId> {
        if source.0 >= self.vertices.len() || target.0 >= self.vertices.len() {
            return None;
        }
        let idx = EdgeId(self.edges.len());
        self.edges.push(Edge {
            source,
            target,
            bends,
            weight: default_edge_weight(),
        });
        self.revision += 1;
        Some(idx)
    }

    pub fn set_position(&mut self, vertex: VertexId, position: Vec2) -> bool {
        match self.vertices.get_mut(vertex.0) {
            Some(v) => {
                v.position = position;
                self.revision += 1;
                true
            }
            None => false,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId> {
        (0..self.vertices.len()).map(VertexId)
    }

    pub fn edge_ids(&self) -> impl Iterator<Item = EdgeId> {
        (0..self.edges.len()).map(EdgeId)
    }

    pub fn vertex(&self, id: VertexId) -> Option<&Vertex> {
        self.vertices.get(id.0)
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id.0)
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn position(&self, id: VertexId) -> Option<Vec2> {
        self.vertices.get(id.0).map(|v| v.position)
    }

    pub fn edge_endpoints(&self, id: EdgeId) -> Option<(VertexId, VertexId)> {
        self.edges.get(id.0).map(|e| (e.source, e.target))
    }

    /// Total number of incident edge ends for every vertex (in + out; a
    /// self-loop counts twice). Edges with unknown endpoints are ignored.
    pub fn degrees(&self) -> Vec<usize> {
        let n = self.vertices.len();
        let mut degrees = vec![0; n];
        for e in self.edges.iter().filter(|e| e.source.0 < n && e.target.0 < n) {
            degrees[e.source.0] += 1;
            degrees[e.target.0] += 1;
        }
        degrees
    }

    pub fn bounds(&self) -> Option<Rect> {
        Rect::from_points(self.vertices.iter().map(|v| v.position))
    }

    /// Drop edges whose endpoints do not exist, e.g. after deserialising an
    /// untrusted scene. Returns how many were dropped.
    pub fn retain_valid_edges(&mut self) -> usize {
        let n = self.vertices.len();
        let before = self.edges.len();
        self.edges.retain(|e| e.source.0 < n && e.target.0 < n);
        let dropped = before - self.edges.len();
        if dropped > 0 {
            self.revision += 1;
        }
        dropped
    }
}

impl Index<VertexId> for Graph {
    type Output = Vertex;
    fn index(&self, index: VertexId) -> &Self::Output {
        &self.vertices[index.0]
    }
}

impl Index<EdgeId> for Graph {
    type Output = Edge;
    fn index(&self, index: EdgeId) -> &Self::Output {
        &self.edges[index.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_index() {
        let mut g = Graph::new();
        let a = g.add_vertex(Vertex::at(0.0, 0.0));
        let b = g.add_vertex(Vertex::at(3.0, 4.0));
        let e = g.add_edge(a, b).unwrap();
        assert_eq!(g.vertex_count(), 2);
        assert_eq!(g.edge_endpoints(e), Some((a, b)));
        assert_eq!(g[b].position, Vec2::new(3.0, 4.0));
        assert_eq!(g.degrees(), vec![1, 1]);
    }

    #[test]
    fn test_edge_to_missing_vertex_is_rejected() {
        let mut g = Graph::new();
        let a = g.add_vertex(Vertex::at(0.0, 0.0));
        assert!(g.add_edge(a, VertexId(5)).is_none());
        assert_eq!(g.edge_count(), 0);
    }

    #[test]
    fn test_revision_tracks_mutations() {
        let mut g = Graph::new();
        let r0 = g.revision();
        let a = g.add_vertex(Vertex::at(0.0, 0.0));
        assert!(g.revision() > r0);
        let r1 = g.revision();
        assert!(g.set_position(a, Vec2::new(1.0, 1.0)));
        assert!(g.revision() > r1);
        assert!(!g.set_position(VertexId(9), Vec2::ZERO));
    }

    #[test]
    fn test_deserialize_and_sanitize() {
        let json = r#"{
            "vertices": [{"position": {"x": 0.0, "y": 0.0}}, {"position": {"x": 1.0, "y": 0.0}}],
            "edges": [{"source": 0, "target": 1}, {"source": 0, "target": 7}]
        }"#;
        let mut g: Graph = serde_json::from_str(json).unwrap();
        assert_eq!(g.edges()[0].weight, 1.0);
        assert_eq!(g.degrees(), vec![1, 1]);
        assert_eq!(g.retain_valid_edges(), 1);
        assert_eq!(g.edge_count(), 1);
    }
}
