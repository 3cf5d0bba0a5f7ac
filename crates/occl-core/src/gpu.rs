//! GPU-packed data shared between the scene logic and the renderer.

use glam::Mat4;

use crate::constants::{MARKER_SIZE_PX, OCCLUDED_COLOR, UNTESTED_COLOR, VISIBLE_COLOR};
use crate::project::Viewport;
use crate::scene::SceneData;

/// Per-frame uniforms for every scene pipeline.
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SceneUniforms {
    pub view_proj: [[f32; 4]; 4],
    /// x, y: viewport size in pixels; z: marker size in pixels; w unused.
    pub params: [f32; 4],
}

impl SceneUniforms {
    pub fn new(view_proj: Mat4, viewport: Viewport) -> Self {
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            params: [
                viewport.width as f32,
                viewport.height as f32,
                MARKER_SIZE_PX,
                0.0,
            ],
        }
    }
}

/// One query-point marker: world position plus classification color.
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MarkerInstance {
    pub pos: [f32; 3],
    pub color: [f32; 3],
}

/// Build the marker instances for the current classification. With no
/// result yet, every marker renders in the untested color.
pub fn marker_instances(scene: &SceneData, results: Option<&[bool]>) -> Vec<MarkerInstance> {
    scene
        .points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let color = match results.and_then(|r| r.get(i).copied()) {
                Some(true) => OCCLUDED_COLOR,
                Some(false) => VISIBLE_COLOR,
                None => UNTESTED_COLOR,
            };
            MarkerInstance {
                pos: p.to_array(),
                color,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{POINT_COUNT, SCENE_SEED};

    #[test]
    fn markers_follow_classification() {
        let scene = SceneData::generate(SCENE_SEED, POINT_COUNT);
        let untested = marker_instances(&scene, None);
        assert!(untested.iter().all(|m| m.color == UNTESTED_COLOR));

        let mut results = vec![false; POINT_COUNT];
        results[3] = true;
        let tested = marker_instances(&scene, Some(&results));
        assert_eq!(tested[3].color, OCCLUDED_COLOR);
        assert_eq!(tested[0].color, VISIBLE_COLOR);
    }
}
