pub mod flight;
pub mod flight_map;
pub mod geometry;
pub mod graph;
pub mod hit_tester;
pub mod landmark;
pub mod offscreen;
pub mod proxy_geometry;
pub mod spline;

pub use flight::{CameraPoint, FlightPlanner, Itinerary, RawRoute};
pub use flight_map::{FlightEdge, FlightMap, FlightMapBuilder, FlightWeights};
pub use geometry::{
    Containment, CoordinateTransform, OrthoCamera, Rect, Vec2, Viewport, point_in_polygon,
};
pub use graph::{Edge, Graph, Vertex};
pub use hit_tester::{PickResult, ProxyHitTester};
pub use landmark::{Landmark, LandmarkCenter, LandmarkHull, LandmarkSet};
pub use offscreen::{OffScreenProxy, compute_proxies, reduce_overlaps};
pub use proxy_geometry::{
    OverlayShape, ProxyGeometry, ProxyGeometryBuilder, ProxyTarget, ShapeKind,
};
pub use spline::KochanekSpline;
