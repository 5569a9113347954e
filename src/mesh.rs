//! GPU-resident mesh geometry.
//!
//! A [`Mesh`] keeps each vertex attribute in its own buffer and splits its
//! triangles into sub-meshes, each with its own `u32` index buffer. All
//! sub-meshes index into the shared vertex streams. [`MeshLayout`] records
//! the draw counts without touching the GPU.
//!
//! # Vertex Streams
//!
//! | Stream   | Format    | Buffer slot | Shader location |
//! |----------|-----------|-------------|-----------------|
//! | position | Float32x3 | 0           | 0               |
//! | normal   | Float32x3 | 1           | 1               |
//! | uv       | Float32x2 | 2           | 2               |
//!
//! The skybox pipeline only binds slots 0 and 1.

use log::debug;

use crate::geometry::MeshData;
use crate::gpu::GpuContext;

/// Vertex buffer layout for the position stream (slot 0).
pub const POSITION_LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
    array_stride: std::mem::size_of::<[f32; 3]>() as u64,
    step_mode: wgpu::VertexStepMode::Vertex,
    attributes: &[wgpu::VertexAttribute {
        offset: 0,
        shader_location: 0,
        format: wgpu::VertexFormat::Float32x3,
    }],
};

/// Vertex buffer layout for the normal stream (slot 1).
pub const NORMAL_LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
    array_stride: std::mem::size_of::<[f32; 3]>() as u64,
    step_mode: wgpu::VertexStepMode::Vertex,
    attributes: &[wgpu::VertexAttribute {
        offset: 0,
        shader_location: 1,
        format: wgpu::VertexFormat::Float32x3,
    }],
};

/// Vertex buffer layout for the texture coordinate stream (slot 2).
pub const UV_LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
    array_stride: std::mem::size_of::<[f32; 2]>() as u64,
    step_mode: wgpu::VertexStepMode::Vertex,
    attributes: &[wgpu::VertexAttribute {
        offset: 0,
        shader_location: 2,
        format: wgpu::VertexFormat::Float32x2,
    }],
};

/// Draw counts for a mesh, known before anything is uploaded.
///
/// `index_counts` holds one entry per non-empty sub-mesh, in draw order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MeshLayout {
    pub vertex_count: u32,
    pub index_counts: Vec<u32>,
}

impl MeshLayout {
    pub fn of(data: &MeshData) -> Self {
        Self {
            vertex_count: data.vertex_count() as u32,
            index_counts: data
                .sub_meshes
                .iter()
                .filter(|indices| !indices.is_empty())
                .map(|indices| indices.len() as u32)
                .collect(),
        }
    }

    /// False when binding the mesh would mean slicing an empty buffer.
    pub fn is_drawable(&self) -> bool {
        self.vertex_count > 0 && !self.index_counts.is_empty()
    }
}

/// Geometry uploaded to the GPU.
///
/// Meshes are immutable once created. Re-importing a model builds a new
/// `Mesh`; dropping the old one releases its buffers.
#[derive(Debug)]
pub struct Mesh {
    pub(crate) position_buffer: wgpu::Buffer,
    pub(crate) normal_buffer: wgpu::Buffer,
    pub(crate) uv_buffer: wgpu::Buffer,
    pub(crate) index_buffers: Vec<wgpu::Buffer>,
    layout: MeshLayout,
}

impl Mesh {
    /// Uploads `data` into fresh vertex and index buffers.
    ///
    /// Empty sub-meshes are dropped, since a zero-sized buffer can't be bound.
    pub fn new(gpu: &GpuContext, data: &MeshData, label: &str) -> Self {
        use wgpu::util::DeviceExt;

        let buffer = |name: String, contents: &[u8], usage| {
            gpu.device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("{label} {name}")),
                    contents,
                    usage,
                })
        };
        let vertex = wgpu::BufferUsages::VERTEX;

        let stream = |name: &str, contents: &[u8]| buffer(name.to_string(), contents, vertex);

        let position_buffer = stream("Positions", bytemuck::cast_slice(&data.positions));
        let normal_buffer = stream("Normals", bytemuck::cast_slice(&data.normals));
        let uv_buffer = stream("UVs", bytemuck::cast_slice(&data.uvs));

        let index_buffers: Vec<wgpu::Buffer> = data
            .sub_meshes
            .iter()
            .filter(|indices| !indices.is_empty())
            .enumerate()
            .map(|(i, indices)| {
                buffer(
                    format!("Indices {i}"),
                    bytemuck::cast_slice(indices),
                    wgpu::BufferUsages::INDEX,
                )
            })
            .collect();

        let layout = MeshLayout::of(data);
        debug!(
            "uploaded mesh '{}': {} vertices, {} sub-meshes, {} indices",
            label,
            layout.vertex_count,
            layout.index_counts.len(),
            data.index_count()
        );

        Self {
            position_buffer,
            normal_buffer,
            uv_buffer,
            index_buffers,
            layout,
        }
    }

    pub fn layout(&self) -> &MeshLayout {
        &self.layout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_skips_empty_sub_meshes() {
        let mut data = MeshData::uv_sphere(4, 2, 1.0);
        data.sub_meshes.insert(0, Vec::new());
        data.sub_meshes.push(vec![0, 1, 2]);

        let layout = MeshLayout::of(&data);
        assert_eq!(layout.vertex_count, 15);
        assert_eq!(layout.index_counts, vec![48, 3]);
        assert!(layout.is_drawable());
    }

    #[test]
    fn empty_geometry_is_not_drawable() {
        assert!(!MeshLayout::of(&MeshData::default()).is_drawable());

        let no_triangles = MeshData {
            positions: vec![[0.0; 3]; 3],
            normals: vec![[0.0, 1.0, 0.0]; 3],
            uvs: vec![[0.0; 2]; 3],
            sub_meshes: vec![Vec::new()],
        };
        let layout = MeshLayout::of(&no_triangles);
        assert_eq!(layout.vertex_count, 3);
        assert!(layout.index_counts.is_empty());
        assert!(!layout.is_drawable());
    }
}
