use crate::geometry::{Containment, Vec2, point_in_polygon};
use crate::proxy_geometry::{ProxyGeometry, ProxyTarget};

/// Result of a pick test at a display position.
///
/// Priority order: Proxy > Bezel > None
#[derive(Debug, Clone, PartialEq)]
pub enum PickResult {
    /// Nothing was hit at the tested position.
    None,
    /// The bezel ring or the centre spot was hit.
    Bezel,
    /// A proxy wedge or pointer was hit.
    Proxy(ProxyTarget),
}

impl PickResult {
    pub fn target(&self) -> Option<&ProxyTarget> {
        match self {
            PickResult::Proxy(target) => Some(target),
            _ => None,
        }
    }
}

/// Picks against the most recently built bezel/proxy geometry.
#[derive(Debug, Clone, Default)]
pub struct ProxyHitTester {
    geometry: ProxyGeometry,
}

impl ProxyHitTester {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the pick regions. Call after every geometry rebuild.
    pub fn update(&mut self, geometry: &ProxyGeometry) {
        self.geometry = geometry.clone();
    }

    pub fn clear(&mut self) {
        self.geometry = ProxyGeometry::default();
    }

    pub fn geometry(&self) -> &ProxyGeometry {
        &self.geometry
    }

    /// Full pick: proxies first, then the bezel.
    pub fn hit_test(&self, point: Vec2) -> PickResult {
        if let Some(target) = self.hit_test_proxies(point) {
            return PickResult::Proxy(target.clone());
        }
        if self.hit_bezel(point) {
            return PickResult::Bezel;
        }
        PickResult::None
    }

    /// Proxy-only pick. Shapes drawn later sit on top, so they are tested first.
    pub fn hit_test_proxies(&self, point: Vec2) -> Option<&ProxyTarget> {
        self.geometry
            .proxies
            .iter()
            .rev()
            .find(|shape| point_in_polygon(point, &shape.polygon) == Containment::Inside)
            .and_then(|shape| shape.target.as_ref())
    }

    fn hit_bezel(&self, point: Vec2) -> bool {
        if self.geometry.bezel.is_empty() || !point.is_finite() {
            return false;
        }
        let r = point.distance(self.geometry.center);
        r <= self.geometry.spot_radius
            || (r >= self.geometry.inner_radius && r <= self.geometry.outer_radius)
    }
}
