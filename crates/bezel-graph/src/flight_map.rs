//! Weighted spanning forest ("flight map") over the input graph, used to route
//! camera flights.

use crate::geometry::Vec2;
use crate::graph::Graph;
use crate::landmark::LandmarkSet;
use bezel_core::{EdgeId, FlightPreset, VertexId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Starting weight of every edge before the weighting terms are subtracted.
pub const DEFAULT_EDGE_WEIGHT: f64 = 1500.0;
const LENGTH_MULTIPLIER: f64 = 10.0;
const DEGREE_MULTIPLIER: f64 = 10.0;
const PROXIMITY_MULTIPLIER: f64 = 50.0;

/// Factors of the three weighting terms and the tree variant. A factor of zero
/// (or below) disables its term.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlightWeights {
    pub length_factor: f64,
    pub degree_factor: f64,
    pub proximity_factor: f64,
    /// `true` for a minimum spanning tree, `false` for a maximum one.
    pub minimum_tree: bool,
}

impl FlightWeights {
    pub const EXPRESS: Self = Self {
        length_factor: 1.0,
        degree_factor: 0.5,
        proximity_factor: 0.0,
        minimum_tree: true,
    };

    pub const TOURIST: Self = Self {
        length_factor: 0.0,
        degree_factor: 1.0,
        proximity_factor: 1.0,
        minimum_tree: false,
    };
}

impl Default for FlightWeights {
    fn default() -> Self {
        Self::EXPRESS
    }
}

impl From<FlightPreset> for FlightWeights {
    fn from(preset: FlightPreset) -> Self {
        match preset {
            FlightPreset::Express => Self::EXPRESS,
            FlightPreset::Tourist => Self::TOURIST,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightEdge {
    pub source: VertexId,
    pub target: VertexId,
    pub weight: f64,
    /// Bend points of the original edge route, ordered source to target.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bends: Vec<Vec2>,
    /// The graph edge this was extracted from, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original: Option<EdgeId>,
}

impl FlightEdge {
    pub fn new(source: VertexId, target: VertexId, weight: f64) -> Self {
        Self {
            source,
            target,
            weight,
            bends: Vec::new(),
            original: None,
        }
    }

    pub fn other(&self, v: VertexId) -> VertexId {
        if self.source == v { self.target } else { self.source }
    }

    /// Bend points ordered for travel starting at `from`.
    pub fn bends_from(&self, from: VertexId) -> Vec<Vec2> {
        let mut bends = self.bends.clone();
        if from != self.source {
            bends.reverse();
        }
        bends
    }
}

/// Undirected forest over the graph's vertex set. Vertex ids match the graph's.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlightMap {
    positions: Vec<Vec2>,
    edges: Vec<FlightEdge>,
    #[serde(skip)]
    adjacency: Vec<Vec<usize>>,
}

impl FlightMap {
    /// Assemble a flight map from explicit parts. Edges referencing missing
    /// vertices are dropped.
    pub fn from_edges(positions: Vec<Vec2>, edges: Vec<FlightEdge>) -> Self {
        let n = positions.len();
        let edges: Vec<FlightEdge> = edges
            .into_iter()
            .filter(|e| e.source.0 < n && e.target.0 < n)
            .collect();
        let mut adjacency = vec![Vec::new(); n];
        for (i, e) in edges.iter().enumerate() {
            adjacency[e.source.0].push(i);
            if e.target != e.source {
                adjacency[e.target.0].push(i);
            }
        }
        Self {
            positions,
            edges,
            adjacency,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId> {
        (0..self.positions.len()).map(VertexId)
    }

    pub fn position(&self, v: VertexId) -> Option<Vec2> {
        self.positions.get(v.0).copied()
    }

    pub fn edges(&self) -> &[FlightEdge] {
        &self.edges
    }

    /// Edges incident to `v`.
    pub fn incident(&self, v: VertexId) -> impl Iterator<Item = &FlightEdge> {
        self.adjacency
            .get(v.0)
            .into_iter()
            .flatten()
            .map(|&i| &self.edges[i])
    }

    pub fn degree(&self, v: VertexId) -> usize {
        self.adjacency.get(v.0).map_or(0, Vec::len)
    }

    /// The edge joining `a` and `b`, if there is one.
    pub fn edge_between(&self, a: VertexId, b: VertexId) -> Option<&FlightEdge> {
        self.incident(a).find(|e| e.other(a) == b)
    }

    /// Number of connected components, counting isolated vertices.
    pub fn component_count(&self) -> usize {
        let mut uf = UnionFind::new(self.positions.len());
        let mut components = self.positions.len();
        for e in &self.edges {
            if uf.union(e.source.0, e.target.0) {
                components -= 1;
            }
        }
        components
    }
}

/// Builds flight maps and caches the last result until the graph, the
/// landmark set or the weights change.
#[derive(Debug, Default)]
pub struct FlightMapBuilder {
    weights: FlightWeights,
    cached: Option<CachedMap>,
}

#[derive(Debug)]
struct CachedMap {
    graph_revision: u64,
    landmark_revision: u64,
    weights: FlightWeights,
    map: FlightMap,
}

impl FlightMapBuilder {
    pub fn new(weights: FlightWeights) -> Self {
        Self {
            weights,
            cached: None,
        }
    }

    pub fn weights(&self) -> FlightWeights {
        self.weights
    }

    pub fn set_weights(&mut self, weights: FlightWeights) {
        self.weights = weights;
    }

    pub fn set_preset(&mut self, preset: FlightPreset) {
        self.weights = preset.into();
    }

    pub fn invalidate(&mut self) {
        self.cached = None;
    }

    /// Last built map, if any, regardless of staleness.
    pub fn current(&self) -> Option<&FlightMap> {
        self.cached.as_ref().map(|c| &c.map)
    }

    pub fn is_stale(&self, graph: &Graph, landmarks: &LandmarkSet) -> bool {
        match &self.cached {
            Some(c) => {
                c.graph_revision != graph.revision()
                    || c.landmark_revision != landmarks.revision()
                    || c.weights != self.weights
            }
            None => true,
        }
    }

    /// Return the cached map, rebuilding it first if any input changed.
    pub fn update(&mut self, graph: &Graph, landmarks: &LandmarkSet) -> &FlightMap {
        let stale = self.is_stale(graph, landmarks);
        let cached = match self.cached.take() {
            Some(cached) if !stale => cached,
            _ => CachedMap {
                graph_revision: graph.revision(),
                landmark_revision: landmarks.revision(),
                weights: self.weights,
                map: Self::build(graph, landmarks, &self.weights),
            },
        };
        &self.cached.insert(cached).map
    }

    /// Weight every graph edge and extract a minimum or maximum spanning
    /// forest with Kruskal's algorithm. Isolated vertices stay in the map.
    pub fn build(graph: &Graph, landmarks: &LandmarkSet, weights: &FlightWeights) -> FlightMap {
        let positions: Vec<Vec2> = graph
            .vertex_ids()
            .filter_map(|v| graph.position(v))
            .collect();
        if positions.is_empty() {
            tracing::debug!("Empty graph, flight map has no vertices");
            return FlightMap::default();
        }

        let edge_weights = edge_weights(graph, landmarks, weights);

        let mut order: Vec<usize> = (0..graph.edge_count()).collect();
        if weights.minimum_tree {
            order.sort_by(|&a, &b| edge_weights[a].total_cmp(&edge_weights[b]));
        } else {
            order.sort_by(|&a, &b| edge_weights[b].total_cmp(&edge_weights[a]));
        }

        let mut uf = UnionFind::new(positions.len());
        let mut tree = Vec::with_capacity(positions.len().saturating_sub(1));
        let mut skipped = 0;
        for i in order {
            let edge = &graph.edges()[i];
            if edge.source.0 >= positions.len() || edge.target.0 >= positions.len() {
                skipped += 1;
                continue;
            }
            if uf.union(edge.source.0, edge.target.0) {
                tree.push(FlightEdge {
                    source: edge.source,
                    target: edge.target,
                    weight: edge_weights[i],
                    bends: edge.bends.clone(),
                    original: Some(EdgeId(i)),
                });
            }
        }

        if skipped > 0 {
            tracing::warn!("Skipped {} edges with unknown endpoints", skipped);
        }
        tracing::debug!(
            vertices = positions.len(),
            graph_edges = graph.edge_count(),
            tree_edges = tree.len(),
            minimum = weights.minimum_tree,
            "Built flight map"
        );
        FlightMap::from_edges(positions, tree)
    }
}

/// Per-edge weights, indexed like `graph.edges()`.
pub fn edge_weights(graph: &Graph, landmarks: &LandmarkSet, weights: &FlightWeights) -> Vec<f64> {
    let mut out = vec![DEFAULT_EDGE_WEIGHT; graph.edge_count()];

    if weights.length_factor > 0.0 {
        for (w, e) in out.iter_mut().zip(graph.edges()) {
            let (Some(a), Some(b)) = (graph.position(e.source), graph.position(e.target)) else {
                continue;
            };
            *w -= a.distance(b) * weights.length_factor * LENGTH_MULTIPLIER;
        }
    }

    if weights.degree_factor > 0.0 {
        let degrees = graph.degrees();
        for (w, e) in out.iter_mut().zip(graph.edges()) {
            let combined = (degrees[e.source.0] + degrees[e.target.0]) as f64;
            *w -= combined * weights.degree_factor * DEGREE_MULTIPLIER;
        }
    }

    if weights.proximity_factor > 0.0 {
        let selected: HashSet<VertexId> = landmarks.selected_vertices();
        for (w, e) in out.iter_mut().zip(graph.edges()) {
            let indicator = u8::from(selected.contains(&e.source))
                + u8::from(selected.contains(&e.target));
            *w -= f64::from(indicator) * weights.proximity_factor * PROXIMITY_MULTIPLIER;
        }
    }

    out
}

/// Disjoint sets with path halving and union by rank.
#[derive(Debug, Clone)]
struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    /// Merge the sets of `a` and `b`; `false` if they were already joined.
    fn union(&mut self, a: usize, b: usize) -> bool {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return false;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
        true
    }
}
