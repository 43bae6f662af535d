//! Flight routing over the flight map and smoothing into a camera itinerary.

use crate::flight_map::FlightMap;
use crate::geometry::{GEOMETRY_EPSILON, Rect, Vec2};
use crate::spline::KochanekSpline;
use bezel_core::VertexId;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Number of points in the straight-line fallback route.
pub const FALLBACK_POINTS: usize = 5;
/// Samples taken across the bend points of a curved edge.
pub const BEND_SAMPLES: usize = 4;

/// One camera pose along a flight: focal point and parallel scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraPoint {
    pub x: f64,
    pub y: f64,
    pub zoom: f64,
}

impl CameraPoint {
    pub fn new(x: f64, y: f64, zoom: f64) -> Self {
        Self { x, y, zoom }
    }

    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

/// Unsmoothed route through the flight map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawRoute {
    pub points: Vec<Vec2>,
    /// Flight-map vertices visited, empty for the fallback route.
    pub vertices: Vec<VertexId>,
    /// Sum of the flight-map weights of the traversed edges.
    pub total_weight: f64,
    /// `false` when the route is the straight-line fallback.
    pub connected: bool,
}

/// A planned flight, ready for the timer-driven stepper.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Itinerary {
    pub points: Vec<CameraPoint>,
    pub route: RawRoute,
    pub departure: Vec2,
    pub arrival: Vec2,
}

impl Itinerary {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn connected(&self) -> bool {
        self.route.connected
    }
}

/// Spline shape parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplineShape {
    pub tension: f64,
    pub bias: f64,
    pub continuity: f64,
}

impl SplineShape {
    fn spline(&self) -> KochanekSpline {
        KochanekSpline::new(self.tension, self.bias, self.continuity)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlightPlanner {
    pub zoom_shape: SplineShape,
    pub path_shape: SplineShape,
    /// Smoothed points per raw route point.
    pub oversampling: usize,
}

impl Default for FlightPlanner {
    fn default() -> Self {
        Self {
            zoom_shape: SplineShape {
                tension: 0.0,
                bias: 0.0,
                continuity: 0.0,
            },
            path_shape: SplineShape {
                tension: 0.25,
                bias: 0.5,
                continuity: -1.0,
            },
            oversampling: 4,
        }
    }
}

impl FlightPlanner {
    /// Plan a smoothed flight from `departure` to `arrival`.
    ///
    /// `start_zoom` is the current parallel scale and `world_bounds` the extent
    /// of the scene; together they determine how far the camera pulls back.
    pub fn plan(
        &self,
        map: &FlightMap,
        departure: Vec2,
        arrival: Vec2,
        start_zoom: f64,
        world_bounds: Option<Rect>,
    ) -> Itinerary {
        let route = Self::route(map, departure, arrival);
        let max_zoom = peak_zoom(departure.distance(arrival), start_zoom, world_bounds);
        let points = self.smooth(&route.points, start_zoom, max_zoom);
        tracing::debug!(
            raw_points = route.points.len(),
            smoothed_points = points.len(),
            connected = route.connected,
            "Planned flight"
        );
        Itinerary {
            points,
            route,
            departure,
            arrival,
        }
    }

    /// Route along the flight map, or a straight line if the arrival cannot be
    /// reached.
    pub fn route(map: &FlightMap, departure: Vec2, arrival: Vec2) -> RawRoute {
        let Some(start) = departure_vertex(map, departure, arrival) else {
            tracing::debug!("Flight map is empty, flying straight");
            return straight_route(departure, arrival);
        };
        let Some(end) = nearest_vertex(map, arrival, |_| true) else {
            return straight_route(departure, arrival);
        };
        let Some((vertices, total_weight)) = shortest_path(map, start, end) else {
            tracing::debug!(%start, %end, "Arrival unreachable on flight map, flying straight");
            return straight_route(departure, arrival);
        };

        let mut points = Vec::with_capacity(vertices.len() * (BEND_SAMPLES + 1));
        if let Some(p) = map.position(vertices[0]) {
            points.push(p);
        }
        for pair in vertices.windows(2) {
            let (from, to) = (pair[0], pair[1]);
            if let Some(edge) = map.edge_between(from, to) {
                points.extend(sample_bends(&edge.bends_from(from)));
            }
            if let Some(p) = map.position(to) {
                points.push(p);
            }
        }

        RawRoute {
            points,
            vertices,
            total_weight,
            connected: true,
        }
    }

    /// Resample a raw route into camera poses: a zoom spline that rises to
    /// `max_zoom` over the middle third and an independent, looser x/y spline.
    pub fn smooth(&self, raw: &[Vec2], start_zoom: f64, max_zoom: f64) -> Vec<CameraPoint> {
        if raw.is_empty() {
            return Vec::new();
        }
        let n = raw.len() as f64;

        let mut zoom = self.zoom_shape.spline();
        zoom.add_point(0.0, start_zoom);
        zoom.add_point(0.3333 * n, max_zoom);
        zoom.add_point(0.6667 * n, max_zoom);
        zoom.add_point(n, start_zoom);

        let mut xs = self.path_shape.spline();
        let mut ys = self.path_shape.spline();
        for (i, p) in raw.iter().enumerate() {
            xs.add_point(i as f64, p.x);
            ys.add_point(i as f64, p.y);
        }

        let rate = self.oversampling.max(1);
        (0..raw.len() * rate)
            .map(|i| {
                let t = i as f64 / rate as f64;
                CameraPoint::new(xs.evaluate(t), ys.evaluate(t), zoom.evaluate(t))
            })
            .collect()
    }
}

/// Highest zoom (parallel scale) reached mid-flight: the flight's share of the
/// world diagonal applied to the world height, never below `start_zoom`.
pub fn peak_zoom(flight_distance: f64, start_zoom: f64, world_bounds: Option<Rect>) -> f64 {
    let Some(bounds) = world_bounds else {
        return start_zoom;
    };
    let diagonal = bounds.diagonal();
    if diagonal <= GEOMETRY_EPSILON || !diagonal.is_finite() {
        return start_zoom;
    }
    let zoom = flight_distance / diagonal * bounds.height();
    if zoom.is_finite() {
        zoom.max(start_zoom)
    } else {
        start_zoom
    }
}

/// Evenly spaced points from `departure` to `arrival`.
pub fn straight_route(departure: Vec2, arrival: Vec2) -> RawRoute {
    let steps = (FALLBACK_POINTS - 1) as f64;
    RawRoute {
        points: (0..FALLBACK_POINTS)
            .map(|i| departure.lerp(arrival, i as f64 / steps))
            .collect(),
        vertices: Vec::new(),
        total_weight: 0.0,
        connected: false,
    }
}

/// Nearest flight-map vertex to `departure`, restricted to vertices on the
/// arrival side of the line through `departure` perpendicular to the flight
/// direction, so the flight does not start by backtracking. Falls back to the
/// unrestricted nearest vertex when that side is empty.
pub fn departure_vertex(map: &FlightMap, departure: Vec2, arrival: Vec2) -> Option<VertexId> {
    let direction = arrival - departure;
    let a = departure + direction.rotated(90.0);
    let b = departure + direction.rotated(-90.0);
    let side = |p: Vec2| (b - a).cross(p - a) <= 0.0;
    let arrival_side = side(arrival);

    nearest_vertex(map, departure, |p| side(p) == arrival_side)
        .or_else(|| nearest_vertex(map, departure, |_| true))
}

/// Nearest vertex to `point` among those whose position satisfies `filter`.
/// Ties go to the lowest vertex id.
pub fn nearest_vertex<F>(map: &FlightMap, point: Vec2, filter: F) -> Option<VertexId>
where
    F: Fn(Vec2) -> bool,
{
    let mut best: Option<(VertexId, f64)> = None;
    for v in map.vertex_ids() {
        let Some(p) = map.position(v) else { continue };
        if !filter(p) {
            continue;
        }
        let d = p.distance_squared(point);
        if best.is_none_or(|(_, bd)| d < bd) {
            best = Some((v, d));
        }
    }
    best.map(|(v, _)| v)
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct QueueEntry {
    distance: f64,
    vertex: VertexId,
}

impl Eq for QueueEntry {}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; reverse for smallest distance first.
        other
            .distance
            .total_cmp(&self.distance)
            .then_with(|| other.vertex.cmp(&self.vertex))
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Dijkstra from `start` to `end`. Returns the vertex path and its total weight,
/// or `None` if `end` is unreachable.
///
/// Settled vertices are never relaxed again, which keeps the search exact on
/// a forest even though flight-map weights may be negative: every vertex has a
/// single path from the start.
pub fn shortest_path(
    map: &FlightMap,
    start: VertexId,
    end: VertexId,
) -> Option<(Vec<VertexId>, f64)> {
    let n = map.vertex_count();
    if start.0 >= n || end.0 >= n {
        return None;
    }
    let mut distance = vec![f64::INFINITY; n];
    let mut predecessor: Vec<Option<VertexId>> = vec![None; n];
    let mut settled = vec![false; n];
    let mut queue = BinaryHeap::new();

    distance[start.0] = 0.0;
    queue.push(QueueEntry {
        distance: 0.0,
        vertex: start,
    });

    while let Some(QueueEntry { distance: d, vertex: u }) = queue.pop() {
        if settled[u.0] {
            continue;
        }
        settled[u.0] = true;
        if u == end {
            break;
        }
        for edge in map.incident(u) {
            let v = edge.other(u);
            if settled[v.0] {
                continue;
            }
            let candidate = d + edge.weight;
            if candidate < distance[v.0] {
                distance[v.0] = candidate;
                predecessor[v.0] = Some(u);
                queue.push(QueueEntry {
                    distance: candidate,
                    vertex: v,
                });
            }
        }
    }

    if !settled[end.0] {
        return None;
    }
    let mut path = vec![end];
    let mut current = end;
    while let Some(prev) = predecessor[current.0] {
        path.push(prev);
        current = prev;
    }
    path.reverse();
    Some((path, distance[end.0]))
}

/// Linear samples across a bend polyline, in travel order.
fn sample_bends(bends: &[Vec2]) -> Vec<Vec2> {
    match bends.len() {
        0 => Vec::new(),
        1 => bends.to_vec(),
        len => {
            let segments = (len - 1) as f64;
            (0..BEND_SAMPLES)
                .map(|j| {
                    let t = j as f64 / (BEND_SAMPLES - 1) as f64 * segments;
                    let i = (t.floor() as usize).min(len - 2);
                    bends[i].lerp(bends[i + 1], t - i as f64)
                })
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flight_map::FlightEdge;
    use proptest::prelude::*;

    fn v(i: usize) -> VertexId {
        VertexId(i)
    }

    fn line_map() -> FlightMap {
        let positions = (0..5).map(|i| Vec2::new(i as f64 * 10.0, 0.0)).collect();
        let edges = (0..4)
            .map(|i| FlightEdge::new(v(i), v(i + 1), 1.0 + i as f64))
            .collect();
        FlightMap::from_edges(positions, edges)
    }

    #[test]
    fn test_route_along_line() {
        let route = FlightPlanner::route(&line_map(), Vec2::new(-1.0, 0.0), Vec2::new(41.0, 0.0));
        assert!(route.connected);
        assert_eq!(route.vertices, vec![v(0), v(1), v(2), v(3), v(4)]);
        assert_eq!(route.total_weight, 10.0);
        assert_eq!(route.points.len(), 5);
        assert_eq!(route.points[4], Vec2::new(40.0, 0.0));
    }

    #[test]
    fn test_unreachable_arrival_flies_straight() {
        let positions = vec![Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(100.0, 0.0)];
        let map = FlightMap::from_edges(positions, vec![FlightEdge::new(v(0), v(1), 1.0)]);
        let route = FlightPlanner::route(&map, Vec2::new(0.0, 0.0), Vec2::new(100.0, 0.0));
        assert!(!route.connected);
        assert_eq!(route.points.len(), FALLBACK_POINTS);
        assert_eq!(route.points[0], Vec2::new(0.0, 0.0));
        assert_eq!(route.points[2], Vec2::new(50.0, 0.0));
        assert_eq!(route.points[4], Vec2::new(100.0, 0.0));
    }

    #[test]
    fn test_empty_map_flies_straight() {
        let route = FlightPlanner::route(&FlightMap::default(), Vec2::ZERO, Vec2::new(4.0, 0.0));
        assert!(!route.connected);
        assert_eq!(route.points[1], Vec2::new(1.0, 0.0));
    }

    #[test]
    fn test_departure_vertex_avoids_backtracking() {
        // Vertex 0 is closest to the departure but lies behind it.
        let positions = vec![Vec2::new(-1.0, 0.0), Vec2::new(3.0, 0.0), Vec2::new(10.0, 0.0)];
        let map = FlightMap::from_edges(positions, Vec::new());
        assert_eq!(
            departure_vertex(&map, Vec2::ZERO, Vec2::new(10.0, 0.0)),
            Some(v(1))
        );
        assert_eq!(
            departure_vertex(&map, Vec2::ZERO, Vec2::new(-10.0, 0.0)),
            Some(v(0))
        );
    }

    #[test]
    fn test_bend_points_are_sampled_in_travel_order() {
        let positions = vec![Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0)];
        let mut edge = FlightEdge::new(v(0), v(1), 1.0);
        edge.bends = vec![Vec2::new(2.0, 5.0), Vec2::new(8.0, 5.0)];
        let map = FlightMap::from_edges(positions, vec![edge]);

        let forward = FlightPlanner::route(&map, Vec2::new(-1.0, 0.0), Vec2::new(11.0, 0.0));
        assert_eq!(forward.points.len(), 2 + BEND_SAMPLES);
        assert_eq!(forward.points[1], Vec2::new(2.0, 5.0));
        assert_eq!(forward.points[4], Vec2::new(8.0, 5.0));

        let backward = FlightPlanner::route(&map, Vec2::new(11.0, 0.0), Vec2::new(-1.0, 0.0));
        assert_eq!(backward.points[1], Vec2::new(8.0, 5.0));
        assert_eq!(backward.points[0], Vec2::new(10.0, 0.0));
    }

    #[test]
    fn test_zero_length_flight() {
        let planner = FlightPlanner::default();
        let p = Vec2::new(10.0, 0.0);
        let itinerary = planner.plan(&line_map(), p, p, 5.0, None);
        assert!(!itinerary.is_empty());
        for point in &itinerary.points {
            assert_eq!(point.position(), p);
            assert!((point.zoom - 5.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_smoothing_oversamples_and_bounds_zoom() {
        let planner = FlightPlanner::default();
        let raw: Vec<Vec2> = (0..6).map(|i| Vec2::new(i as f64, 0.0)).collect();
        let points = planner.smooth(&raw, 2.0, 8.0);
        assert_eq!(points.len(), 24);
        assert_eq!(points[0], CameraPoint::new(0.0, 0.0, 2.0));
        let peak = points.iter().map(|p| p.zoom).fold(0.0, f64::max);
        assert!(peak >= 8.0 - 1e-9);
        // every raw point is hit exactly at integer parameters
        for (i, p) in raw.iter().enumerate() {
            assert!((points[i * 4].x - p.x).abs() < 1e-9);
        }
    }

    #[test]
    fn test_peak_zoom() {
        let bounds = Rect::from_min_max(Vec2::new(0.0, 0.0), Vec2::new(30.0, 40.0));
        assert_eq!(peak_zoom(25.0, 1.0, Some(bounds)), 20.0);
        assert_eq!(peak_zoom(25.0, 30.0, Some(bounds)), 30.0);
        assert_eq!(peak_zoom(25.0, 3.0, None), 3.0);
    }

    /// Brute force shortest path weights by Bellman-Ford for cross-checking.
    fn bellman_ford(map: &FlightMap, start: VertexId) -> Vec<f64> {
        let mut dist = vec![f64::INFINITY; map.vertex_count()];
        dist[start.0] = 0.0;
        for _ in 0..map.vertex_count() {
            for e in map.edges() {
                for (a, b) in [(e.source, e.target), (e.target, e.source)] {
                    if dist[a.0] + e.weight < dist[b.0] {
                        dist[b.0] = dist[a.0] + e.weight;
                    }
                }
            }
        }
        dist
    }

    proptest! {
        /// Property: on a connected map with distinct positive weights the
        /// route is connected and its weight is the shortest distance.
        #[test]
        fn prop_route_weight_is_shortest(
            n in 2usize..12,
            extra in prop::collection::vec((0usize..12, 0usize..12), 0..20),
            seed in 1u32..1000,
        ) {
            let positions: Vec<Vec2> = (0..n).map(|i| Vec2::new(i as f64, (i * 7 % 5) as f64)).collect();
            let mut edges = Vec::new();
            let mut w = f64::from(seed);
            // spanning chain guarantees connectivity
            for i in 1..n {
                w += 1.37;
                edges.push(FlightEdge::new(v(i - 1), v(i), w % 97.0 + 0.01 * i as f64 + 1.0));
            }
            for (k, (a, b)) in extra.iter().enumerate() {
                let (a, b) = (a % n, b % n);
                if a != b {
                    edges.push(FlightEdge::new(v(a), v(b), 0.5 + k as f64 * 3.1 + f64::from(seed) * 0.001));
                }
            }
            let map = FlightMap::from_edges(positions, edges);
            let (path, total) = shortest_path(&map, v(0), v(n - 1)).unwrap();
            let expected = bellman_ford(&map, v(0))[n - 1];
            prop_assert!((total - expected).abs() < 1e-9, "{} vs {}", total, expected);
            prop_assert_eq!(path[0], v(0));
            prop_assert_eq!(*path.last().unwrap(), v(n - 1));

            let walked: f64 = path
                .windows(2)
                .map(|p| {
                    map.incident(p[0])
                        .filter(|e| e.other(p[0]) == p[1])
                        .map(|e| e.weight)
                        .fold(f64::INFINITY, f64::min)
                })
                .sum();
            prop_assert!((walked - total).abs() < 1e-9);
        }

        /// Property: the fallback route is always five evenly spaced points.
        #[test]
        fn prop_fallback_is_linear(
            ax in -100.0f64..100.0, ay in -100.0f64..100.0,
            bx in -100.0f64..100.0, by in -100.0f64..100.0,
        ) {
            let (a, b) = (Vec2::new(ax, ay), Vec2::new(bx, by));
            let route = straight_route(a, b);
            prop_assert_eq!(route.points.len(), 5);
            for (i, p) in route.points.iter().enumerate() {
                let expected = a.lerp(b, i as f64 * 0.25);
                prop_assert!(p.distance(expected) < 1e-9);
            }
        }
    }
}
