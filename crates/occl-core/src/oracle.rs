use glam::Vec3;

use crate::constants::RAY_EPSILON;

/// Ground-truth ray/plane test, used for generation-time baselines and
/// validation only — the interactive result always comes from one of the
/// GPU-coupled strategies.
///
/// Forms the segment from `eye` to `point` and reports occluded when the
/// segment crosses the plane strictly between its endpoints (`0 < t < 1`).
/// A segment nearly parallel to the plane (`|dy| < RAY_EPSILON`) counts as
/// visible regardless of which side of the plane the point lies on.
pub fn expected_occlusion(eye: Vec3, point: Vec3, plane_y: f32) -> bool {
    let ray = point - eye;
    if ray.y.abs() < RAY_EPSILON {
        return false;
    }
    let t = (plane_y - eye.y) / ray.y;
    t > 0.0 && t < 1.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crossing_between_eye_and_point_is_occluded() {
        // Eye above the plane, point below: segment crosses at t = 0.5.
        let eye = Vec3::new(0.0, 4.0, 0.0);
        let point = Vec3::new(0.0, -4.0, 0.0);
        assert!(expected_occlusion(eye, point, 0.0));
    }

    #[test]
    fn crossing_beyond_point_is_visible() {
        // Plane below both endpoints: t > 1.
        let eye = Vec3::new(0.0, 8.0, 0.0);
        let point = Vec3::new(0.0, 4.0, 0.0);
        assert!(!expected_occlusion(eye, point, 0.0));
    }

    #[test]
    fn crossing_behind_eye_is_visible() {
        // Plane above both endpoints: t < 0.
        let eye = Vec3::new(0.0, -2.0, 0.0);
        let point = Vec3::new(0.0, -6.0, 0.0);
        assert!(!expected_occlusion(eye, point, 0.0));
    }

    #[test]
    fn near_parallel_ray_is_visible() {
        let eye = Vec3::new(0.0, 1.0, 0.0);
        let point = Vec3::new(10.0, 1.0 + 1e-8, 0.0);
        assert!(!expected_occlusion(eye, point, 0.0));
    }
}
