//! Synthetic scenes for the navigator benchmarks.

use bezel_core::{LandmarkId, Rgba};
use bezel_graph::{Graph, Landmark, LandmarkCenter, LandmarkSet, Vec2, Vertex};

/// A `side` x `side` lattice with unit weights, spaced 10 world units apart.
/// Every fifth row is a landmark of `side / 4` vertices.
pub fn grid_scene(side: usize) -> (Graph, LandmarkSet) {
    let mut graph = Graph::new();
    let mut ids = Vec::with_capacity(side * side);
    for row in 0..side {
        for col in 0..side {
            ids.push(graph.add_vertex(Vertex::at(col as f64 * 10.0, row as f64 * 10.0)));
        }
    }
    for row in 0..side {
        for col in 0..side {
            let v = ids[row * side + col];
            if col + 1 < side {
                graph.add_edge(v, ids[row * side + col + 1]);
            }
            if row + 1 < side {
                graph.add_edge(v, ids[(row + 1) * side + col]);
            }
        }
    }

    let mut landmarks = LandmarkSet::new();
    let width = (side / 4).max(1);
    for (n, row) in (0..side).step_by(5).enumerate() {
        let members = ids[row * side..row * side + width].to_vec();
        landmarks.insert(Landmark::new(
            LandmarkId(n as u32),
            format!("row_{}", row),
            members,
        ));
    }
    (graph, landmarks)
}

/// `count` landmark centres packed into a narrow arc far outside a view
/// centred on the origin, so that every proxy overlaps its neighbours.
pub fn clustered_centers(count: usize, arc_degrees: f64) -> Vec<LandmarkCenter> {
    (0..count)
        .map(|i| {
            let angle = (i as f64 / count.max(1) as f64 * arc_degrees).to_radians();
            LandmarkCenter {
                landmark: LandmarkId(i as u32),
                cluster: 0,
                point: Vec2::new(angle.cos() * 1000.0, angle.sin() * 1000.0),
                label: format!("landmark_{}", i),
                color: Rgba::default(),
            }
        })
        .collect()
}
