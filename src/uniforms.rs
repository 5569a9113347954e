//! Fixed-layout uniform records shared with the WGSL shaders.
//!
//! Every record is `#[repr(C)]` and [`bytemuck::Pod`] so it can be written to a
//! uniform buffer as raw bytes. Field order and padding mirror the structs in
//! `shaders/skybox.wgsl` and `shaders/phong.wgsl`: in a WGSL uniform block a
//! `vec3<f32>` is 16-byte aligned, so each 3-vector is followed by one padding
//! float unless a trailing scalar can take that slot.
//!
//! | Record            | Group | Size |
//! |-------------------|-------|------|
//! | [`Uniforms`]       | 0     | 192  |
//! | [`SkyboxUniforms`] | 1     | 80   |
//! | [`PhongUniforms`]  | 1     | 64   |

use glam::{Mat4, Vec3};

/// Per-draw transform matrices, column-major.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Uniforms {
    /// Object space to world space.
    pub model: [[f32; 4]; 4],
    /// World space to camera space.
    pub view: [[f32; 4]; 4],
    /// Camera space to clip space.
    pub projection: [[f32; 4]; 4],
}

impl Uniforms {
    pub fn new(model: Mat4, view: Mat4, projection: Mat4) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            view: view.to_cols_array_2d(),
            projection: projection.to_cols_array_2d(),
        }
    }
}

/// Procedural sky parameters consumed by the skybox fragment shader.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SkyboxUniforms {
    pub light_dir: [f32; 3],
    _pad0: f32,
    pub light_color: [f32; 3],
    _pad1: f32,
    pub sky_color: [f32; 3],
    _pad2: f32,
    pub horizon_color: [f32; 3],
    _pad3: f32,
    pub ground_color: [f32; 3],
    /// Angular radius of the sun disc, as `1 - cos(angle)`.
    pub sun_size: f32,
}

impl SkyboxUniforms {
    pub fn new(
        light_dir: Vec3,
        light_color: Vec3,
        sky_color: Vec3,
        horizon_color: Vec3,
        ground_color: Vec3,
        sun_size: f32,
    ) -> Self {
        Self {
            light_dir: light_dir.to_array(),
            light_color: light_color.to_array(),
            sky_color: sky_color.to_array(),
            horizon_color: horizon_color.to_array(),
            ground_color: ground_color.to_array(),
            sun_size,
            ..bytemuck::Zeroable::zeroed()
        }
    }
}

/// Lighting parameters for the Phong fragment shader.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PhongUniforms {
    pub ambient_color: [f32; 3],
    _pad0: f32,
    /// Camera position in world space, for the specular term.
    pub view_position: [f32; 3],
    _pad1: f32,
    pub light_dir: [f32; 3],
    _pad2: f32,
    pub light_color: [f32; 3],
    pub specular_intensity: f32,
}

impl PhongUniforms {
    pub fn new(
        ambient_color: Vec3,
        view_position: Vec3,
        light_dir: Vec3,
        light_color: Vec3,
        specular_intensity: f32,
    ) -> Self {
        Self {
            ambient_color: ambient_color.to_array(),
            view_position: view_position.to_array(),
            light_dir: light_dir.to_array(),
            light_color: light_color.to_array(),
            specular_intensity,
            ..bytemuck::Zeroable::zeroed()
        }
    }
}

// Catch CPU/GPU layout mismatches at compile time
const _: () = assert!(std::mem::size_of::<Uniforms>() == 192);
const _: () = assert!(std::mem::size_of::<SkyboxUniforms>() == 80);
const _: () = assert!(std::mem::size_of::<PhongUniforms>() == 64);
