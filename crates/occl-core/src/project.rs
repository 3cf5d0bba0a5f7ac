use glam::{Mat4, Vec3, Vec4};

use crate::constants::DEPTH_EPSILON;

/// Integer pixel rectangle of the current render target. Must be re-read
/// after every resize before any projection math.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Viewport {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }

    pub fn contains(&self, px: i32, py: i32) -> bool {
        px >= self.x
            && px < self.x + self.width as i32
            && py >= self.y
            && py < self.y + self.height as i32
    }
}

/// A projected point in window space: pixel x/y with the origin at the
/// top-left (framebuffer row order) and depth in the [0, 1] range of the
/// depth attachment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WindowCoord {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// Project a world-space point through `view_proj` into window coordinates.
///
/// Returns `None` when the point sits at or behind the eye plane
/// (clip w <= 0), where the perspective divide has no screen location.
pub fn project(world: Vec3, view_proj: Mat4, viewport: Viewport) -> Option<WindowCoord> {
    let clip = view_proj * Vec4::new(world.x, world.y, world.z, 1.0);
    if clip.w <= 0.0 {
        return None;
    }
    let ndc = clip.truncate() / clip.w;
    Some(WindowCoord {
        x: viewport.x as f32 + (ndc.x + 1.0) * 0.5 * viewport.width as f32,
        y: viewport.y as f32 + (1.0 - ndc.y) * 0.5 * viewport.height as f32,
        z: ndc.z,
    })
}

/// CPU-side copy of a depth attachment: one f32 texel per pixel, row 0 at
/// the top, matching the window-coordinate convention of [`project`].
#[derive(Clone, Debug, PartialEq)]
pub struct DepthGrid {
    pub width: u32,
    pub height: u32,
    texels: Vec<f32>,
}

impl DepthGrid {
    pub fn new(width: u32, height: u32, texels: Vec<f32>) -> Self {
        debug_assert_eq!(texels.len(), (width * height) as usize);
        Self {
            width,
            height,
            texels,
        }
    }

    pub fn texel(&self, px: u32, py: u32) -> f32 {
        self.texels[(py * self.width + px) as usize]
    }
}

/// Classify one projected point against a depth grid; `true` = occluded.
///
/// Unprojectable and outside-the-viewport coordinates are occluded:
/// off-screen points cannot be seen. Window coordinates are truncated, not
/// rounded, to match the rasterizer's pixel-ownership convention; points
/// landing exactly on an occluder edge may jitter by one pixel.
pub fn classify_against_depth(
    win: Option<WindowCoord>,
    viewport: Viewport,
    depth: &DepthGrid,
) -> bool {
    let Some(win) = win else {
        return true;
    };
    let px = win.x.floor() as i32;
    let py = win.y.floor() as i32;
    if !viewport.contains(px, py) {
        return true;
    }
    let stored = depth.texel((px - viewport.x) as u32, (py - viewport.y) as u32);
    stored < win.z - DEPTH_EPSILON
}

/// Classify every point in one pass. The returned mapping is index-aligned
/// with `points` and intended to replace any previous result wholesale.
pub fn classify_points(
    points: &[Vec3],
    view_proj: Mat4,
    viewport: Viewport,
    depth: &DepthGrid,
) -> Vec<bool> {
    points
        .iter()
        .map(|p| classify_against_depth(project(*p, view_proj, viewport), viewport, depth))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::OrbitCamera;

    #[test]
    fn viewport_contains_is_half_open() {
        let vp = Viewport::new(100, 50);
        assert!(vp.contains(0, 0));
        assert!(vp.contains(99, 49));
        assert!(!vp.contains(100, 49));
        assert!(!vp.contains(0, 50));
        assert!(!vp.contains(-1, 0));
    }

    #[test]
    fn target_projects_to_viewport_center() {
        let cam = OrbitCamera::default();
        let vp = Viewport::new(800, 600);
        let win = project(cam.target, cam.view_proj(vp.aspect()), vp).unwrap();
        assert!((win.x - 400.0).abs() < 1.0);
        assert!((win.y - 300.0).abs() < 1.0);
        assert!(win.z > 0.0 && win.z < 1.0);
    }

    #[test]
    fn behind_eye_does_not_project() {
        let cam = OrbitCamera::default();
        let vp = Viewport::new(800, 600);
        // One orbit radius past the eye, directly away from the target.
        let behind = cam.eye() + (cam.eye() - cam.target);
        assert!(project(behind, cam.view_proj(vp.aspect()), vp).is_none());
    }

    #[test]
    fn equal_depth_is_not_occluded() {
        let vp = Viewport::new(4, 4);
        let grid = DepthGrid::new(4, 4, vec![0.5; 16]);
        let win = WindowCoord {
            x: 2.0,
            y: 2.0,
            z: 0.5,
        };
        // Stored depth equals the point's own depth: nothing nearer.
        assert!(!classify_against_depth(Some(win), vp, &grid));
    }
}
