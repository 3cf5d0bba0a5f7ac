pub mod camera;
pub mod constants;
pub mod gpu;
pub mod oracle;
pub mod project;
pub mod scene;
pub mod state;

pub static SCENE_WGSL: &str = include_str!("../shaders/scene.wgsl");

pub use camera::*;
pub use project::*;
pub use scene::*;
pub use state::*;
