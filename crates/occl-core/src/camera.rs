use glam::{Mat4, Vec3};

use crate::constants::{
    DEFAULT_AZIMUTH_DEG, DEFAULT_DISTANCE, DEFAULT_ELEVATION_DEG, DISTANCE_MAX, DISTANCE_MIN,
    DRAG_DEG_PER_PX, ELEVATION_LIMIT_DEG, FOV_Y_RADIANS, ZOOM_IN_FACTOR, ZOOM_OUT_FACTOR, Z_FAR,
    Z_NEAR,
};

/// Orbital camera: always looks at `target` from a spherical offset.
///
/// The eye position is derived from the angles on every call and never
/// stored, so the spherical parameters stay the single source of truth and
/// cannot drift from the position actually rendered.
#[derive(Clone, Debug, PartialEq)]
pub struct OrbitCamera {
    pub target: Vec3,
    /// Orbit radius, clamped to [DISTANCE_MIN, DISTANCE_MAX].
    pub distance: f32,
    /// Horizontal angle in degrees, unbounded.
    pub azimuth: f32,
    /// Vertical angle in degrees, clamped to [-89, 89].
    pub elevation: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            distance: DEFAULT_DISTANCE,
            azimuth: DEFAULT_AZIMUTH_DEG,
            elevation: DEFAULT_ELEVATION_DEG,
        }
    }
}

impl OrbitCamera {
    /// Eye position from spherical coordinates: `target + distance * dir`.
    pub fn eye(&self) -> Vec3 {
        let az = self.azimuth.to_radians();
        let el = self.elevation.to_radians();
        self.target
            + self.distance * Vec3::new(el.cos() * az.sin(), el.sin(), el.cos() * az.cos())
    }

    /// View matrix looking from the derived eye toward `target`, up = +Y.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye(), self.target, Vec3::Y)
    }

    /// Perspective projection with the fixed 45-degree vertical FOV and
    /// [0, 1] clip depth.
    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(FOV_Y_RADIANS, aspect, Z_NEAR, Z_FAR)
    }

    /// Combined view-projection, recomputed on every call.
    pub fn view_proj(&self, aspect: f32) -> Mat4 {
        self.projection_matrix(aspect) * self.view_matrix()
    }

    /// Apply a mouse-drag delta in pixels. Elevation re-clamps on every
    /// mutation; out-of-range states cannot be observed.
    pub fn drag(&mut self, dx: f32, dy: f32) {
        self.azimuth += dx * DRAG_DEG_PER_PX;
        self.elevation = (self.elevation + dy * DRAG_DEG_PER_PX)
            .clamp(-ELEVATION_LIMIT_DEG, ELEVATION_LIMIT_DEG);
    }

    /// Apply one wheel event: positive scroll zooms in, negative zooms out.
    pub fn zoom_scroll(&mut self, notches: f32) {
        if notches == 0.0 {
            return;
        }
        let factor = if notches > 0.0 {
            ZOOM_IN_FACTOR
        } else {
            ZOOM_OUT_FACTOR
        };
        self.distance = (self.distance * factor).clamp(DISTANCE_MIN, DISTANCE_MAX);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eye_matches_spherical_formula() {
        let cam = OrbitCamera::default();
        let az = cam.azimuth.to_radians();
        let el = cam.elevation.to_radians();
        let expected = cam.target
            + cam.distance * Vec3::new(el.cos() * az.sin(), el.sin(), el.cos() * az.cos());
        assert_eq!(cam.eye(), expected);
    }

    #[test]
    fn drag_scales_by_half_degree_per_pixel() {
        let mut cam = OrbitCamera::default();
        cam.drag(10.0, -4.0);
        assert_eq!(cam.azimuth, DEFAULT_AZIMUTH_DEG + 5.0);
        assert_eq!(cam.elevation, DEFAULT_ELEVATION_DEG - 2.0);
    }

    #[test]
    fn view_matrix_tracks_mutation() {
        let mut cam = OrbitCamera::default();
        let before = cam.view_matrix();
        cam.drag(40.0, 0.0);
        assert_ne!(before, cam.view_matrix());
    }
}
