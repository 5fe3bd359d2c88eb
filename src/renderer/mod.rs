//! WebGPU rendering module
//!
//! The scene is projected on the CPU and tessellated into flat-colored
//! triangles in screen pixels; the GPU pipeline only blends them.

pub mod pipeline;
pub mod projection;
pub mod scene;
pub mod shapes;
pub mod vertex;
pub mod wireframe;

pub use pipeline::RenderState;
pub use projection::{Projected, Projector, project};
pub use scene::build_frame;
pub use vertex::Vertex;
