//! Off-screen landmark detection and angular proxy layout around the bezel.

use crate::geometry::{CoordinateTransform, GEOMETRY_EPSILON, Rect, Vec2, normalize_degrees};
use crate::landmark::LandmarkCenter;
use bezel_core::{LandmarkId, Rgba};
use serde::Serialize;

/// Angular width of one proxy wedge, in degrees.
pub const PROXY_WIDTH_DEGREES: f64 = 3.0;
/// Gap kept between neighbouring proxies, as a fraction of the width.
pub const PROXY_SPACING_FRACTION: f64 = 0.1;

/// Directional marker for one off-screen landmark centre.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OffScreenProxy {
    pub landmark: LandmarkId,
    pub cluster: usize,
    pub label: String,
    pub color: Rgba,
    /// Landmark centre in world coordinates; the flight arrival point.
    pub world_point: Vec2,
    /// World distance from the viewport centre.
    pub distance: f64,
    /// World distance beyond the viewport edge along the proxy direction.
    pub overshoot: f64,
    /// Direction from the viewport centre in degrees, in `[0, 360)`.
    pub angle: f64,
    /// Original angle minus the angle after overlap reduction.
    pub error: f64,
}

/// Find the landmark centres outside the visible world region and build a proxy
/// for each. Points on the viewport border count as off-screen; with a
/// zero-size viewport every point does.
pub fn compute_proxies<T>(
    centers: &[LandmarkCenter],
    view: &T,
    reduce_overlaps: bool,
) -> Vec<OffScreenProxy>
where
    T: CoordinateTransform + ?Sized,
{
    let bounds = view.display_bounds_in_world();
    if bounds.is_none() && !centers.is_empty() {
        tracing::warn!("Zero size viewport, treating every landmark as off-screen");
    }
    let origin = view.display_to_world(view.display_center());

    let mut proxies = Vec::new();
    for center in centers {
        if let Some(b) = &bounds
            && b.strictly_contains(center.point)
        {
            continue;
        }
        let direction = center.point - origin;
        let Some(angle) = direction.angle_degrees() else {
            tracing::debug!(landmark = %center.landmark, "Landmark centre coincides with view centre");
            continue;
        };
        let distance = direction.length();
        let overshoot = match &bounds {
            Some(b) => (distance - exit_distance(origin, direction, b)).max(0.0),
            None => distance,
        };
        proxies.push(OffScreenProxy {
            landmark: center.landmark,
            cluster: center.cluster,
            label: center.label.clone(),
            color: center.color,
            world_point: center.point,
            distance,
            overshoot,
            angle,
            error: 0.0,
        });
    }

    if reduce_overlaps {
        self::reduce_overlaps(
            &mut proxies,
            PROXY_WIDTH_DEGREES,
            PROXY_WIDTH_DEGREES * PROXY_SPACING_FRACTION,
        );
    }
    proxies
}

/// Distance from `origin` along `direction` to the border of `bounds`.
fn exit_distance(origin: Vec2, direction: Vec2, bounds: &Rect) -> f64 {
    let length = direction.length();
    let unit = direction * (1.0 / length);
    let half_w = bounds.width() / 2.0;
    let half_h = bounds.height() / 2.0;
    let offset = origin - bounds.center();
    let mut t = f64::INFINITY;
    if unit.x.abs() > GEOMETRY_EPSILON {
        let edge = if unit.x > 0.0 { half_w } else { -half_w };
        t = t.min((edge - offset.x) / unit.x);
    }
    if unit.y.abs() > GEOMETRY_EPSILON {
        let edge = if unit.y > 0.0 { half_h } else { -half_h };
        t = t.min((edge - offset.y) / unit.y);
    }
    if t.is_finite() { t.max(0.0) } else { 0.0 }
}

/// A run of consecutive proxies that must be spread out together. Angles are
/// "unwrapped": a run crossing 0 degrees continues past 360.
#[derive(Debug, Clone)]
struct Segment {
    members: Vec<usize>,
    first: f64,
    last: f64,
}

impl Segment {
    fn forward(&self, width: f64) -> f64 {
        self.last + width / 2.0
    }

    fn reverse(&self, width: f64) -> f64 {
        self.first - width / 2.0
    }

    fn centre(&self, width: f64) -> f64 {
        (self.reverse(width) + self.forward(width)) / 2.0
    }

    fn expanded_width(&self, separation: f64) -> f64 {
        separation * self.members.len() as f64
    }

    fn expanded_forward(&self, width: f64, separation: f64) -> f64 {
        self.centre(width) + self.expanded_width(separation) / 2.0
    }

    fn expanded_reverse(&self, width: f64, separation: f64) -> f64 {
        self.centre(width) - self.expanded_width(separation) / 2.0
    }

    fn absorb(&mut self, next: Segment) {
        self.members.extend(next.members);
        self.last = next.last;
    }
}

/// Spread proxies whose wedges would overlap, keeping their circular order.
///
/// Proxies are grouped into segments of mutually overlapping neighbours; each
/// segment is laid out at a uniform `width + spacing` pitch centred on its
/// original angular centre. The pair straddling 0/360 degrees is examined on
/// every pass like any other adjacent pair.
pub fn reduce_overlaps(proxies: &mut [OffScreenProxy], width: f64, spacing: f64) {
    if proxies.len() < 2 {
        return;
    }
    proxies.sort_by(|a, b| a.angle.total_cmp(&b.angle));

    let separation = width + spacing;
    let mut unwrapped: Vec<f64> = proxies.iter().map(|p| p.angle).collect();
    let mut segments: Vec<Segment> = unwrapped
        .iter()
        .enumerate()
        .map(|(i, &a)| Segment {
            members: vec![i],
            first: a,
            last: a,
        })
        .collect();

    loop {
        let before = segments.len();

        let mut merged: Vec<Segment> = Vec::with_capacity(segments.len());
        for segment in segments {
            if let Some(previous) = merged.last_mut()
                && previous.expanded_forward(width, separation)
                    > segment.expanded_reverse(width, separation)
            {
                previous.absorb(segment);
            } else {
                merged.push(segment);
            }
        }

        // Wraparound: the last segment against the first one shifted by a turn.
        if merged.len() > 1 {
            let last = &merged[merged.len() - 1];
            let first = &merged[0];
            if last.expanded_forward(width, separation)
                > first.expanded_reverse(width, separation) + 360.0
            {
                let mut head = merged.remove(0);
                for &i in &head.members {
                    unwrapped[i] += 360.0;
                }
                head.first += 360.0;
                head.last += 360.0;
                if let Some(tail) = merged.last_mut() {
                    tail.absorb(head);
                }
            }
        }

        segments = merged;
        if segments.len() <= 1 || segments.len() == before {
            break;
        }
    }

    for segment in &segments {
        let mut angle = segment.expanded_reverse(width, separation) + separation / 2.0;
        for &i in &segment.members {
            proxies[i].error = unwrapped[i] - angle;
            proxies[i].angle = normalize_degrees(angle);
            angle += separation;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Viewport;
    use proptest::prelude::*;

    fn proxy(id: u32, angle: f64) -> OffScreenProxy {
        OffScreenProxy {
            landmark: LandmarkId(id),
            cluster: 0,
            label: format!("l{id}"),
            color: Rgba::default(),
            world_point: Vec2::ZERO,
            distance: 1.0,
            overshoot: 0.0,
            angle,
            error: 0.0,
        }
    }

    fn center(id: u32, x: f64, y: f64) -> LandmarkCenter {
        LandmarkCenter {
            landmark: LandmarkId(id),
            cluster: 0,
            point: Vec2::new(x, y),
            label: format!("l{id}"),
            color: Rgba::default(),
        }
    }

    fn square_viewport() -> Viewport {
        Viewport::new(
            800,
            600,
            Rect::from_min_max(Vec2::new(-100.0, -100.0), Vec2::new(100.0, 100.0)),
        )
    }

    #[test]
    fn test_single_landmark_to_the_right() {
        let proxies = compute_proxies(&[center(1, 150.0, 0.0)], &square_viewport(), false);
        assert_eq!(proxies.len(), 1);
        let p = &proxies[0];
        assert!(p.angle.abs() < 1e-9);
        assert!((p.distance - 150.0).abs() < 1e-9);
        assert!((p.overshoot - 50.0).abs() < 1e-9);
        assert_eq!(p.error, 0.0);
    }

    #[test]
    fn test_border_counts_as_off_screen() {
        let proxies = compute_proxies(
            &[center(1, 100.0, 0.0), center(2, 0.0, 50.0)],
            &square_viewport(),
            false,
        );
        assert_eq!(proxies.len(), 1);
        assert_eq!(proxies[0].landmark, LandmarkId(1));
        assert!(proxies[0].overshoot.abs() < 1e-9);
    }

    #[test]
    fn test_zero_size_viewport_reports_everything() {
        let vp = Viewport::new(0, 0, square_viewport().world);
        let proxies = compute_proxies(
            &[center(1, 10.0, 0.0), center(2, 0.0, -10.0)],
            &vp,
            false,
        );
        assert_eq!(proxies.len(), 2);
        assert!((proxies[1].angle - 270.0).abs() < 1e-9);
        assert!((proxies[1].overshoot - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_centre_point_is_skipped() {
        let vp = Viewport::new(0, 0, square_viewport().world);
        assert!(compute_proxies(&[center(1, 0.0, 0.0)], &vp, false).is_empty());
    }

    #[test]
    fn test_diagonal_overshoot() {
        let proxies = compute_proxies(&[center(1, 200.0, 200.0)], &square_viewport(), false);
        let p = &proxies[0];
        assert!((p.angle - 45.0).abs() < 1e-9);
        let expected = 200.0 * 2f64.sqrt() - 100.0 * 2f64.sqrt();
        assert!((p.overshoot - expected).abs() < 1e-9);
    }

    #[test]
    fn test_symmetric_segment_errors_cancel() {
        let mut proxies = vec![proxy(1, 100.0), proxy(2, 101.0), proxy(3, 102.0)];
        reduce_overlaps(&mut proxies, 3.0, 0.3);
        let angles: Vec<f64> = proxies.iter().map(|p| p.angle).collect();
        assert!((angles[0] - 97.7).abs() < 1e-9);
        assert!((angles[1] - 101.0).abs() < 1e-9);
        assert!((angles[2] - 104.3).abs() < 1e-9);
        let sum: f64 = proxies.iter().map(|p| p.error).sum();
        assert!(sum.abs() < 1e-9);
    }

    #[test]
    fn test_far_apart_proxies_untouched() {
        let mut proxies = vec![proxy(1, 10.0), proxy(2, 90.0), proxy(3, 200.0)];
        reduce_overlaps(&mut proxies, 3.0, 0.3);
        for (p, expected) in proxies.iter().zip([10.0, 90.0, 200.0]) {
            assert!((p.angle - expected).abs() < 1e-9);
            assert!(p.error.abs() < 1e-9);
        }
    }

    #[test]
    fn test_overlap_across_zero_is_resolved() {
        let mut proxies = vec![proxy(1, 0.5), proxy(2, 359.5)];
        reduce_overlaps(&mut proxies, 3.0, 0.3);
        // Sorted input is [0.5 (id 1), 359.5 (id 2)]; they merge into one
        // segment centred on 0.
        let by_id = |id: u32| proxies.iter().find(|p| p.landmark == LandmarkId(id)).unwrap();
        assert!((by_id(2).angle - 358.35).abs() < 1e-9);
        assert!((by_id(1).angle - 1.65).abs() < 1e-9);
        assert!((by_id(1).error + 1.15).abs() < 1e-9);
        assert!((by_id(2).error - 1.15).abs() < 1e-9);
    }

    #[test]
    fn test_single_proxy_is_noop() {
        let mut proxies = vec![proxy(1, 42.0)];
        reduce_overlaps(&mut proxies, 3.0, 0.3);
        assert_eq!(proxies[0].angle, 42.0);
    }

    fn circular_order(proxies: &[OffScreenProxy]) -> Vec<u32> {
        let mut sorted: Vec<&OffScreenProxy> = proxies.iter().collect();
        sorted.sort_by(|a, b| a.angle.total_cmp(&b.angle));
        sorted.iter().map(|p| p.landmark.0).collect()
    }

    fn is_rotation(a: &[u32], b: &[u32]) -> bool {
        if a.len() != b.len() {
            return false;
        }
        a.is_empty()
            || (0..a.len()).any(|k| a.iter().cycle().skip(k).take(a.len()).eq(b.iter()))
    }

    proptest! {
        /// Property 1: centres strictly inside the viewport never produce proxies.
        #[test]
        fn prop_on_screen_centres_yield_nothing(
            points in prop::collection::vec((-99.0f64..99.0, -99.0f64..99.0), 0..30),
        ) {
            let centers: Vec<LandmarkCenter> = points
                .iter()
                .enumerate()
                .map(|(i, (x, y))| center(i as u32, *x, *y))
                .collect();
            prop_assert!(compute_proxies(&centers, &square_viewport(), true).is_empty());
        }

        /// Property 2: with zero width and spacing nothing moves.
        #[test]
        fn prop_zero_width_is_noop(angles in prop::collection::vec(0.0f64..360.0, 0..40)) {
            let mut proxies: Vec<OffScreenProxy> =
                angles.iter().enumerate().map(|(i, a)| proxy(i as u32, *a)).collect();
            reduce_overlaps(&mut proxies, 0.0, 0.0);
            for p in &proxies {
                prop_assert_eq!(p.angle, angles[p.landmark.0 as usize]);
                prop_assert_eq!(p.error, 0.0);
            }
        }

        /// Property 3: circular order survives overlap reduction.
        #[test]
        fn prop_reduction_preserves_circular_order(
            angles in prop::collection::vec(0.0f64..360.0, 2..100),
        ) {
            let mut proxies: Vec<OffScreenProxy> =
                angles.iter().enumerate().map(|(i, a)| proxy(i as u32, *a)).collect();
            let mut before: Vec<(f64, u32)> =
                proxies.iter().map(|p| (p.angle, p.landmark.0)).collect();
            before.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
            let before: Vec<u32> = before.into_iter().map(|(_, id)| id).collect();

            reduce_overlaps(&mut proxies, PROXY_WIDTH_DEGREES, 0.3);

            for p in &proxies {
                prop_assert!((0.0..360.0).contains(&p.angle));
            }
            let after = circular_order(&proxies);
            prop_assert!(is_rotation(&before, &after), "{:?} vs {:?}", before, after);
        }
    }
}
