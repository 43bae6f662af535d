use bezel_graph::{CameraPoint, CoordinateTransform, OrthoCamera};

/// The render-side camera the controller drives.
///
/// The pose is the focal point in world coordinates plus the orthographic
/// parallel scale.
pub trait ViewportHost: CoordinateTransform {
    fn camera(&self) -> CameraPoint;
    fn move_camera_to(&mut self, pose: CameraPoint);
}

impl ViewportHost for OrthoCamera {
    fn camera(&self) -> CameraPoint {
        CameraPoint::new(self.focal_point.x, self.focal_point.y, self.parallel_scale)
    }

    fn move_camera_to(&mut self, pose: CameraPoint) {
        self.move_to(pose.x, pose.y, pose.zoom);
    }
}
