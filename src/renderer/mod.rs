//! Pseudo-3D rendering module
//!
//! Procedurally generated meshes drawn through one instanced WebGPU
//! pipeline; `BoardProjection` lifts the flat playfield into a receding
//! 3D scene.

pub mod mesh;
pub mod projection;
pub mod scene;
pub mod vertex;

pub use projection::BoardProjection;
pub use scene::{RendererError, SceneRenderer};
