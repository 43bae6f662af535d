use anyhow::{Context, Result, anyhow};
use bezel_core::LandmarkId;
use bezel_graph::{
    FlightMapBuilder, FlightPlanner, FlightWeights, Graph, Itinerary, Landmark, LandmarkSet,
    OffScreenProxy, OrthoCamera, compute_proxies,
};
use bezel_nav::NavigatorSettings;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A laid-out graph, its landmarks and the camera looking at it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scene {
    pub graph: Graph,
    #[serde(default)]
    pub landmarks: Vec<Landmark>,
    #[serde(default)]
    pub camera: OrthoCamera,
}

impl Scene {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scene {:?}", path))?;
        Self::from_json(&content).with_context(|| format!("Invalid scene {:?}", path))
    }

    /// Parse a scene and drop edges that reference missing vertices.
    pub fn from_json(content: &str) -> Result<Self> {
        let mut scene: Scene = serde_json::from_str(content)?;
        let dropped = scene.graph.retain_valid_edges();
        if dropped > 0 {
            tracing::warn!("Dropped {} edges with unknown endpoints", dropped);
        }
        for landmark in &scene.landmarks {
            let missing = landmark
                .members()
                .filter(|v| scene.graph.vertex(*v).is_none())
                .count();
            if missing > 0 {
                tracing::warn!(
                    landmark = %landmark.id,
                    missing,
                    "Landmark references unknown vertices"
                );
            }
        }
        tracing::debug!(
            vertices = scene.graph.vertex_count(),
            edges = scene.graph.edge_count(),
            landmarks = scene.landmarks.len(),
            "Scene loaded"
        );
        Ok(scene)
    }

    pub fn landmark_set(&self) -> LandmarkSet {
        let mut set = LandmarkSet::new();
        for landmark in &self.landmarks {
            set.insert(landmark.clone());
        }
        set
    }

    /// Off-screen proxies as seen from the scene camera.
    pub fn proxies(&self, settings: &NavigatorSettings) -> Vec<OffScreenProxy> {
        let centers = self
            .landmark_set()
            .centers(&self.graph, settings.hull_shape);
        compute_proxies(&centers, &self.camera, settings.reduce_overlaps)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanReport {
    pub landmark: LandmarkId,
    pub cluster: usize,
    pub connected: bool,
    pub itinerary: Itinerary,
}

/// Plan a flight from the scene camera to one cluster of `landmark`.
pub fn plan_flight(
    scene: &Scene,
    settings: &NavigatorSettings,
    landmark: LandmarkId,
    cluster: usize,
) -> Result<PlanReport> {
    let landmarks = scene.landmark_set();
    let center = landmarks
        .centers(&scene.graph, settings.hull_shape)
        .into_iter()
        .find(|c| c.landmark == landmark && c.cluster == cluster)
        .ok_or_else(|| anyhow!("Landmark {} has no cluster {}", landmark, cluster))?;

    let weights = FlightWeights::from(settings.flight_preset);
    let map = FlightMapBuilder::build(&scene.graph, &landmarks, &weights);
    let itinerary = FlightPlanner::default().plan(
        &map,
        scene.camera.focal_point,
        center.point,
        scene.camera.parallel_scale,
        scene.graph.bounds(),
    );
    Ok(PlanReport {
        landmark,
        cluster,
        connected: itinerary.connected(),
        itinerary,
    })
}
