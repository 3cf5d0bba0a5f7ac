use thiserror::Error;

use crate::camera::OrbitCamera;
use crate::constants::{POINT_COUNT, SCENE_SEED};
use crate::scene::SceneData;

/// Which visibility-testing strategy services the next run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strategy {
    /// Project each point on the CPU and compare against a read-back copy
    /// of the depth buffer.
    DepthReadback,
    /// Rasterize each point inside a GPU any-samples-passed occlusion query.
    OcclusionQuery,
}

impl Strategy {
    pub fn toggled(self) -> Self {
        match self {
            Strategy::DepthReadback => Strategy::OcclusionQuery,
            Strategy::OcclusionQuery => Strategy::DepthReadback,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Strategy::DepthReadback => "depth-readback",
            Strategy::OcclusionQuery => "occlusion-query",
        }
    }
}

/// Lifecycle of a visibility-test run. A trigger marks the test pending;
/// the frontend promotes it to running at the start of the next frame, once
/// the occluder's depth pass has been submitted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TestPhase {
    Idle,
    TestPending,
    TestRunning,
    TestComplete,
}

/// A failed test run. The previous occlusion result stays in place.
#[derive(Debug, Error)]
pub enum TestError {
    #[error("occlusion query allocation failed: {0}")]
    QueryAlloc(String),
    #[error("occlusion query readback failed: {0}")]
    QueryReadback(String),
    #[error("depth readback failed: {0}")]
    Readback(String),
}

/// All mutable application state, owned by the frontend and passed by
/// reference into the camera model, renderer, and visibility tester. No
/// component keeps a private mutable copy.
#[derive(Clone, Debug)]
pub struct SceneState {
    pub camera: OrbitCamera,
    pub scene: SceneData,
    pub strategy: Strategy,
    phase: TestPhase,
    /// `true` = occluded, index-aligned with `scene.points`. `None` until
    /// the first completed run. Replaced wholesale, never edited in place.
    results: Option<Vec<bool>>,
}

impl Default for SceneState {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneState {
    pub fn new() -> Self {
        Self {
            camera: OrbitCamera::default(),
            scene: SceneData::generate(SCENE_SEED, POINT_COUNT),
            strategy: Strategy::DepthReadback,
            phase: TestPhase::Idle,
            results: None,
        }
    }

    pub fn phase(&self) -> TestPhase {
        self.phase
    }

    pub fn results(&self) -> Option<&[bool]> {
        self.results.as_deref()
    }

    /// Trigger surface: mark a test pending. Ignored while a run is already
    /// in flight (runs are never cancelled or restarted mid-flight).
    pub fn request_test(&mut self) {
        if self.phase != TestPhase::TestRunning {
            self.phase = TestPhase::TestPending;
        }
    }

    /// Promote a pending test to running. Returns whether the caller should
    /// perform the run this frame.
    pub fn begin_run(&mut self) -> bool {
        if self.phase == TestPhase::TestPending {
            self.phase = TestPhase::TestRunning;
            true
        } else {
            false
        }
    }

    /// Swap in the full result mapping and finish the run.
    pub fn complete_run(&mut self, results: Vec<bool>) {
        debug_assert_eq!(results.len(), self.scene.points.len());
        self.results = Some(results);
        self.phase = TestPhase::TestComplete;
    }

    /// Abort the in-flight run, leaving any previous result untouched.
    pub fn abort_run(&mut self) {
        self.phase = if self.results.is_some() {
            TestPhase::TestComplete
        } else {
            TestPhase::Idle
        };
    }

    pub fn toggle_strategy(&mut self) {
        self.strategy = self.strategy.toggled();
        log::info!("visibility strategy: {}", self.strategy.label());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_then_run_then_complete() {
        let mut state = SceneState::new();
        assert_eq!(state.phase(), TestPhase::Idle);
        assert!(!state.begin_run());

        state.request_test();
        assert_eq!(state.phase(), TestPhase::TestPending);
        assert!(state.begin_run());
        assert_eq!(state.phase(), TestPhase::TestRunning);

        let n = state.scene.points.len();
        state.complete_run(vec![false; n]);
        assert_eq!(state.phase(), TestPhase::TestComplete);
        assert_eq!(state.results().unwrap().len(), n);
    }

    #[test]
    fn abort_keeps_previous_results() {
        let mut state = SceneState::new();
        let n = state.scene.points.len();

        state.request_test();
        state.begin_run();
        let mut first = vec![false; n];
        first[0] = true;
        state.complete_run(first.clone());

        state.request_test();
        state.begin_run();
        state.abort_run();
        assert_eq!(state.phase(), TestPhase::TestComplete);
        assert_eq!(state.results().unwrap(), first.as_slice());
    }

    #[test]
    fn abort_without_results_returns_to_idle() {
        let mut state = SceneState::new();
        state.request_test();
        state.begin_run();
        state.abort_run();
        assert_eq!(state.phase(), TestPhase::Idle);
        assert!(state.results().is_none());
    }

    #[test]
    fn request_while_running_is_ignored() {
        let mut state = SceneState::new();
        state.request_test();
        state.begin_run();
        state.request_test();
        assert_eq!(state.phase(), TestPhase::TestRunning);
    }

    #[test]
    fn strategy_toggle_round_trips() {
        let mut state = SceneState::new();
        let initial = state.strategy;
        state.toggle_strategy();
        assert_ne!(state.strategy, initial);
        state.toggle_strategy();
        assert_eq!(state.strategy, initial);
    }
}
