//! Render-facing side of the scene: camera rig, reflections, post-fx parameters
//! and GPU data layouts.

pub mod camera;
pub mod cube_capture;
pub mod post_fx;
pub mod reflection;
pub mod vertex;

pub use camera::*;
pub use cube_capture::*;
pub use post_fx::*;
pub use reflection::*;
pub use vertex::*;
