use glam::Vec3;
use rand::prelude::*;

use crate::camera::OrbitCamera;
use crate::constants::{GRID_STEPS, PLANE_HALF_EXTENT, PLANE_HEIGHT_RANGE, POINT_RANGE};
use crate::oracle;

/// Immutable per-session scene: one horizontal occluder plane and the query
/// points whose visibility is under test.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneData {
    /// Height of the occluder plane along the up axis.
    pub plane_y: f32,
    pub points: Vec<Vec3>,
    /// Analytic baseline computed at generation time from the default eye
    /// position. Kept for mismatch logging, never shown as the result.
    pub expected: Vec<bool>,
}

impl SceneData {
    /// Generate the session scene. The draw order (plane height first, then
    /// per-point x/y/z) is fixed so a given seed always produces the same
    /// scene.
    pub fn generate(seed: u64, n: usize) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let plane_y = rng.gen_range(-PLANE_HEIGHT_RANGE..PLANE_HEIGHT_RANGE);
        let eye = OrbitCamera::default().eye();

        let mut points = Vec::with_capacity(n);
        let mut expected = Vec::with_capacity(n);
        for _ in 0..n {
            let p = Vec3::new(
                rng.gen_range(-POINT_RANGE..POINT_RANGE),
                rng.gen_range(-POINT_RANGE..POINT_RANGE),
                rng.gen_range(-POINT_RANGE..POINT_RANGE),
            );
            expected.push(oracle::expected_occlusion(eye, p, plane_y));
            points.push(p);
        }
        log::debug!(
            "generated scene: plane_y={plane_y:.3}, {} points, {} expected occluded",
            points.len(),
            expected.iter().filter(|&&o| o).count()
        );
        Self {
            plane_y,
            points,
            expected,
        }
    }
}

/// Two triangles covering the occluder's bounded display quad.
pub fn plane_triangles(plane_y: f32) -> [[f32; 3]; 6] {
    let s = PLANE_HALF_EXTENT;
    [
        [-s, plane_y, -s],
        [s, plane_y, -s],
        [s, plane_y, s],
        [-s, plane_y, -s],
        [s, plane_y, s],
        [-s, plane_y, s],
    ]
}

/// Endpoint pairs for the wireframe grid overlaying the display quad.
pub fn grid_lines(plane_y: f32) -> Vec<[f32; 3]> {
    let s = PLANE_HALF_EXTENT;
    let step = s / GRID_STEPS as f32;
    let mut v = Vec::with_capacity(((GRID_STEPS * 2 + 1) * 4) as usize);
    for i in -GRID_STEPS..=GRID_STEPS {
        let a = i as f32 * step;
        v.push([a, plane_y, -s]);
        v.push([a, plane_y, s]);
        v.push([-s, plane_y, a]);
        v.push([s, plane_y, a]);
    }
    v
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{POINT_COUNT, SCENE_SEED};

    #[test]
    fn generation_is_deterministic() {
        let a = SceneData::generate(SCENE_SEED, POINT_COUNT);
        let b = SceneData::generate(SCENE_SEED, POINT_COUNT);
        assert_eq!(a, b);
    }

    #[test]
    fn generated_values_stay_in_range() {
        let scene = SceneData::generate(SCENE_SEED, POINT_COUNT);
        assert!(scene.plane_y.abs() < PLANE_HEIGHT_RANGE);
        assert_eq!(scene.points.len(), POINT_COUNT);
        for p in &scene.points {
            assert!(p.abs().max_element() < POINT_RANGE);
        }
    }

    #[test]
    fn grid_line_count_matches_divisions() {
        let lines = grid_lines(0.0);
        // 2 * GRID_STEPS + 1 lines per axis, two axes, two endpoints each.
        assert_eq!(lines.len(), ((GRID_STEPS * 2 + 1) * 4) as usize);
    }
}
