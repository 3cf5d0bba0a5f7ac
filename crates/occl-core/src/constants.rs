// Shared camera/scene tuning constants used by the native frontend and tests.

// Orbital camera defaults
pub const DEFAULT_DISTANCE: f32 = 15.0;
pub const DEFAULT_AZIMUTH_DEG: f32 = 45.0;
pub const DEFAULT_ELEVATION_DEG: f32 = 25.0;

// Camera limits and input response
pub const ELEVATION_LIMIT_DEG: f32 = 89.0; // keep away from the up-axis poles
pub const DISTANCE_MIN: f32 = 3.0;
pub const DISTANCE_MAX: f32 = 50.0;
pub const DRAG_DEG_PER_PX: f32 = 0.5; // degrees of rotation per pixel dragged
pub const ZOOM_IN_FACTOR: f32 = 0.9;
pub const ZOOM_OUT_FACTOR: f32 = 1.1;

// Projection
pub const FOV_Y_RADIANS: f32 = std::f32::consts::FRAC_PI_4; // 45 degrees
pub const Z_NEAR: f32 = 0.1;
pub const Z_FAR: f32 = 100.0;

// Scene generation
pub const SCENE_SEED: u64 = 42;
pub const POINT_COUNT: usize = 20;
pub const PLANE_HEIGHT_RANGE: f32 = 2.0; // plane_y drawn from [-2, 2]
pub const POINT_RANGE: f32 = 5.0; // query points drawn from [-5, 5]^3

// Occluder display geometry. The render quad is bounded; visibility math
// treats the plane as infinite, so the extent must far exceed POINT_RANGE.
pub const PLANE_HALF_EXTENT: f32 = 1000.0;
pub const GRID_STEPS: i32 = 20;

// Classification tolerances
pub const DEPTH_EPSILON: f32 = 1e-6; // slack when comparing window depth to the depth buffer
pub const RAY_EPSILON: f32 = 1e-6; // below this |dy| a ray counts as parallel to the plane

// Display
pub const MARKER_SIZE_PX: f32 = 8.0; // on-screen marker diameter
pub const CLEAR_COLOR: [f64; 4] = [0.05, 0.05, 0.08, 1.0];
pub const OCCLUDED_COLOR: [f32; 3] = [1.0, 0.2, 0.2];
pub const VISIBLE_COLOR: [f32; 3] = [0.2, 1.0, 0.2];
pub const UNTESTED_COLOR: [f32; 3] = [0.6, 0.6, 0.6];
