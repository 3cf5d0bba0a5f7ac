use glam::Vec3;
use rand::prelude::*;

use occl_core::constants::{
    DEFAULT_AZIMUTH_DEG, DEFAULT_DISTANCE, DEFAULT_ELEVATION_DEG, DISTANCE_MAX, DISTANCE_MIN,
    ELEVATION_LIMIT_DEG,
};
use occl_core::OrbitCamera;

#[test]
fn default_camera_matches_session_defaults() {
    let cam = OrbitCamera::default();
    assert_eq!(cam.target, Vec3::ZERO);
    assert_eq!(cam.distance, DEFAULT_DISTANCE);
    assert_eq!(cam.azimuth, DEFAULT_AZIMUTH_DEG);
    assert_eq!(cam.elevation, DEFAULT_ELEVATION_DEG);
}

#[test]
fn eye_position_invariant_holds_for_arbitrary_states() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..200 {
        let cam = OrbitCamera {
            target: Vec3::new(
                rng.gen_range(-10.0..10.0),
                rng.gen_range(-10.0..10.0),
                rng.gen_range(-10.0..10.0),
            ),
            distance: rng.gen_range(DISTANCE_MIN..DISTANCE_MAX),
            azimuth: rng.gen_range(-720.0..720.0),
            elevation: rng.gen_range(-ELEVATION_LIMIT_DEG..ELEVATION_LIMIT_DEG),
        };
        let az = cam.azimuth.to_radians();
        let el = cam.elevation.to_radians();
        let expected = cam.target
            + cam.distance * Vec3::new(el.cos() * az.sin(), el.sin(), el.cos() * az.cos());
        assert_eq!(cam.eye(), expected);
    }
}

#[test]
fn elevation_stays_clamped_under_any_drag_sequence() {
    let mut rng = StdRng::seed_from_u64(11);
    let mut cam = OrbitCamera::default();
    for _ in 0..1000 {
        cam.drag(rng.gen_range(-500.0..500.0), rng.gen_range(-500.0..500.0));
        assert!(cam.elevation >= -ELEVATION_LIMIT_DEG);
        assert!(cam.elevation <= ELEVATION_LIMIT_DEG);
    }
}

#[test]
fn distance_stays_clamped_under_any_scroll_sequence() {
    let mut rng = StdRng::seed_from_u64(13);
    let mut cam = OrbitCamera::default();
    for _ in 0..1000 {
        cam.zoom_scroll(rng.gen_range(-3.0..3.0f32));
        assert!(cam.distance >= DISTANCE_MIN);
        assert!(cam.distance <= DISTANCE_MAX);
    }
}

#[test]
fn zoom_scales_distance_per_notch() {
    let mut cam = OrbitCamera::default();
    cam.zoom_scroll(1.0);
    assert!((cam.distance - DEFAULT_DISTANCE * 0.9).abs() < 1e-6);

    let mut cam = OrbitCamera::default();
    cam.zoom_scroll(-1.0);
    assert!((cam.distance - DEFAULT_DISTANCE * 1.1).abs() < 1e-6);
}

#[test]
fn matrices_are_recomputed_after_every_mutation() {
    let mut cam = OrbitCamera::default();
    let aspect = 900.0 / 700.0;
    let v0 = cam.view_matrix();
    let vp0 = cam.view_proj(aspect);

    cam.drag(30.0, -10.0);
    assert_ne!(v0, cam.view_matrix());
    assert_ne!(vp0, cam.view_proj(aspect));

    cam.zoom_scroll(1.0);
    let vp1 = cam.view_proj(aspect);
    assert_ne!(vp0, vp1);
}
