//! # Skylit
//!
//! **A Phong-lit model under a procedural sky, on wgpu.**
//!
//! Skylit loads a mesh, puts it in front of a camera and lights it with one
//! directional light that sweeps across a gradient sky. The interesting part
//! is small and fully testable without a GPU: [`Transform`], [`Camera`] and
//! [`DirectionalLight`] produce the matrices, and [`FrameContext`] packs them
//! into the fixed-layout records the shaders read.
//!
//! ## Quick Start
//!
//! ```no_run
//! use skylit::AppConfig;
//!
//! fn main() -> Result<(), skylit::AppError> {
//!     skylit::run(
//!         AppConfig::new()
//!             .title("Bunny")
//!             .size(1280, 720)
//!             .model("assets/bunny.stl")
//!             .texture("assets/marble.png"),
//!     )
//! }
//! ```
//!
//! ## Per-frame math without a window
//!
//! ```
//! use skylit::{Camera, FrameContext, Transform, Vec3};
//!
//! let camera = Camera::perspective(60f32.to_radians()).at(Vec3::new(0.0, 0.0, -5.0));
//! let model = Transform::from_position(Vec3::new(0.0, -0.3, -3.0)).uniform_scale(0.3);
//!
//! let mut ctx = FrameContext::new(camera, model);
//! ctx.advance(60.0);
//! let frame = ctx.assemble();
//! assert_eq!(frame.phong.view_position, [0.0, 0.0, -5.0]);
//! ```
//!
//! ## Conventions
//!
//! - Left-handed, +X right, +Y up, +Z forward.
//! - Euler rotations compose as `Rz * Ry * Rx`.
//! - Clip-space depth runs from 0 at the near plane to 1 at the far plane.

mod app;
mod camera;
mod config;
mod frame;
mod geometry;
mod gpu;
mod light;
mod mesh;
mod renderer;
mod texture;
mod transform;
mod uniforms;

pub use app::{AppError, run};
pub use camera::{Camera, CameraError, Projection};
pub use config::{AppConfig, ConfigError};
pub use frame::{FrameContext, FrameUniforms, PhongSettings, SkySettings};
pub use geometry::{GeometryError, MeshData, ModelLoader};
pub use gpu::{GpuContext, GpuError};
pub use light::DirectionalLight;
pub use mesh::{Mesh, MeshLayout, NORMAL_LAYOUT, POSITION_LAYOUT, UV_LAYOUT};
pub use renderer::{FramePlan, Renderer};
pub use texture::Texture;
pub use transform::{Transform, euler_rotation};
pub use uniforms::{PhongUniforms, SkyboxUniforms, Uniforms};

pub use glam::{Mat4, Vec3, Vec4};
