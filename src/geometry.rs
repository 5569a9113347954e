//! CPU-side geometry: importing, generating and reshaping meshes before upload.
//!
//! [`MeshData`] holds separate position / normal / UV streams plus one index
//! list per sub-mesh. It is produced by [`ModelLoader`] (STL through `stl_io`,
//! OBJ through `tobj`) or by [`MeshData::uv_sphere`], and turned into a GPU
//! [`Mesh`](crate::Mesh) once loading has finished.
//!
//! # Quick Start
//!
//! ```no_run
//! use skylit::ModelLoader;
//!
//! let data = ModelLoader::from_file("assets/character.obj")
//!     .centered()
//!     .normalized()
//!     .spherical_uvs()
//!     .load()?;
//!
//! println!("{} triangles", data.index_count() / 3);
//! # Ok::<(), skylit::GeometryError>(())
//! ```
//!
//! # Supported Formats
//!
//! | Format | Extensions | Notes |
//! |--------|------------|-------|
//! | STL    | `.stl`     | Binary and ASCII, no UV coordinates |
//! | OBJ    | `.obj`     | One sub-mesh per object, UVs kept, materials ignored |

use std::f32::consts::PI;
use std::path::{Path, PathBuf};

use glam::Vec3;
use log::info;
use thiserror::Error;

/// Errors that can occur when loading or building geometry.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unknown geometry format: '{0}'")]
    UnknownFormat(String),
    #[error("STL parse error: {0}")]
    Parse(#[source] std::io::Error),
    #[error("OBJ parse error: {0}")]
    Obj(#[source] tobj::LoadError),
    #[error("invalid mesh: {0}")]
    InvalidMesh(String),
}

/// Vertex streams and per-sub-mesh triangle indices.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    /// Triangle lists, three indices per triangle, all indexing the shared streams.
    pub sub_meshes: Vec<Vec<u32>>,
}

impl MeshData {
    /// Builds mesh data, checking that streams line up and indices are in range.
    pub fn new(
        positions: Vec<[f32; 3]>,
        normals: Vec<[f32; 3]>,
        uvs: Vec<[f32; 2]>,
        sub_meshes: Vec<Vec<u32>>,
    ) -> Result<Self, GeometryError> {
        let data = Self {
            positions,
            normals,
            uvs,
            sub_meshes,
        };
        data.validate()?;
        Ok(data)
    }

    pub fn validate(&self) -> Result<(), GeometryError> {
        let count = self.positions.len();
        if self.normals.len() != count || self.uvs.len() != count {
            return Err(GeometryError::InvalidMesh(format!(
                "stream lengths differ: {} positions, {} normals, {} uvs",
                count,
                self.normals.len(),
                self.uvs.len()
            )));
        }

        for (i, indices) in self.sub_meshes.iter().enumerate() {
            if indices.len() % 3 != 0 {
                return Err(GeometryError::InvalidMesh(format!(
                    "sub-mesh {} has {} indices, not a multiple of 3",
                    i,
                    indices.len()
                )));
            }
            if let Some(&bad) = indices.iter().find(|&&idx| idx as usize >= count) {
                return Err(GeometryError::InvalidMesh(format!(
                    "sub-mesh {} references vertex {} of {}",
                    i, bad, count
                )));
            }
        }
        Ok(())
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Total indices across all sub-meshes.
    pub fn index_count(&self) -> usize {
        self.sub_meshes.iter().map(Vec::len).sum()
    }

    /// Moves `other`'s streams onto the end of these, keeping its sub-meshes
    /// separate.
    pub fn append(&mut self, other: MeshData) {
        let base = self.positions.len() as u32;
        self.positions.extend(other.positions);
        self.normals.extend(other.normals);
        self.uvs.extend(other.uvs);
        self.sub_meshes.extend(
            other
                .sub_meshes
                .into_iter()
                .map(|indices| indices.into_iter().map(|i| i + base).collect()),
        );
    }

    /// A UV sphere centred at the origin with outward normals.
    ///
    /// `segments` divide the equator, `rings` run pole to pole. The seam and
    /// poles carry duplicated vertices so UVs stay continuous, giving
    /// `(segments + 1) * (rings + 1)` vertices and `segments * rings * 6`
    /// indices in a single sub-mesh.
    pub fn uv_sphere(segments: u32, rings: u32, radius: f32) -> Self {
        let segments = segments.max(3);
        let rings = rings.max(2);

        let vertex_count = ((segments + 1) * (rings + 1)) as usize;
        let mut positions = Vec::with_capacity(vertex_count);
        let mut normals = Vec::with_capacity(vertex_count);
        let mut uvs = Vec::with_capacity(vertex_count);

        for ring in 0..=rings {
            let phi = PI * ring as f32 / rings as f32;
            let y = phi.cos();
            let ring_radius = phi.sin();

            for seg in 0..=segments {
                let theta = 2.0 * PI * seg as f32 / segments as f32;
                let x = ring_radius * theta.cos();
                let z = -ring_radius * theta.sin();

                positions.push([x * radius, y * radius, z * radius]);
                normals.push([x, y, z]);
                uvs.push([seg as f32 / segments as f32, ring as f32 / rings as f32]);
            }
        }

        let mut indices = Vec::with_capacity((segments * rings * 6) as usize);
        for ring in 0..rings {
            for seg in 0..segments {
                let current = ring * (segments + 1) + seg;
                let next = current + segments + 1;

                indices.extend_from_slice(&[current, next, current + 1]);
                indices.extend_from_slice(&[current + 1, next, next + 1]);
            }
        }

        Self {
            positions,
            normals,
            uvs,
            sub_meshes: vec![indices],
        }
    }

    /// Axis-aligned bounds as `(min, max)`.
    pub fn bounds(&self) -> (Vec3, Vec3) {
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);

        for &p in &self.positions {
            let p = Vec3::from(p);
            min = min.min(p);
            max = max.max(p);
        }

        (min, max)
    }

    pub fn center(&self) -> Vec3 {
        let (min, max) = self.bounds();
        (min + max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        let (min, max) = self.bounds();
        max - min
    }

    pub fn translate(&mut self, offset: Vec3) {
        for p in &mut self.positions {
            *p = (Vec3::from(*p) + offset).to_array();
        }
    }

    pub fn scale(&mut self, factor: f32) {
        for p in &mut self.positions {
            *p = (Vec3::from(*p) * factor).to_array();
        }
    }

    /// Moves the bounding box centre to the origin.
    pub fn recenter(&mut self) {
        let center = self.center();
        self.translate(-center);
    }

    /// Scales uniformly so the largest dimension is 1.
    pub fn normalize(&mut self) {
        let size = self.size();
        let max_dim = size.max_element();
        if max_dim > 0.0 {
            self.scale(1.0 / max_dim);
        }
    }

    /// Area-weighted smooth normals from the triangle geometry.
    pub fn recalculate_normals(&mut self) {
        let mut accum = vec![Vec3::ZERO; self.positions.len()];

        for tri in self.sub_meshes.iter().flat_map(|s| s.chunks_exact(3)) {
            let [i0, i1, i2] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let p0 = Vec3::from(self.positions[i0]);
            let face_normal =
                (Vec3::from(self.positions[i1]) - p0).cross(Vec3::from(self.positions[i2]) - p0);

            for i in [i0, i1, i2] {
                accum[i] += face_normal;
            }
        }

        self.normals = accum
            .into_iter()
            .map(|n| n.normalize_or_zero().to_array())
            .collect();
    }

    /// Gives every triangle its own three vertices with the face normal, for flat
    /// shading.
    pub fn unweld(&mut self) {
        let mut positions = Vec::with_capacity(self.index_count());
        let mut normals = Vec::with_capacity(self.index_count());
        let mut uvs = Vec::with_capacity(self.index_count());
        let mut sub_meshes = Vec::with_capacity(self.sub_meshes.len());

        for indices in &self.sub_meshes {
            let mut flat = Vec::with_capacity(indices.len());
            for tri in indices.chunks_exact(3) {
                let corners = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
                let p = corners.map(|i| Vec3::from(self.positions[i]));
                let normal = (p[1] - p[0]).cross(p[2] - p[0]).normalize_or_zero();

                for (k, &i) in corners.iter().enumerate() {
                    flat.push(positions.len() as u32);
                    positions.push(p[k].to_array());
                    normals.push(normal.to_array());
                    uvs.push(self.uvs[i]);
                }
            }
            sub_meshes.push(flat);
        }

        *self = Self {
            positions,
            normals,
            uvs,
            sub_meshes,
        };
    }

    /// Projects texture coordinates from the bounding box centre onto a sphere.
    ///
    /// `u` follows the angle around +Y, `v` runs from the top (0) to the bottom (1).
    pub fn apply_spherical_uvs(&mut self) {
        let center = self.center();
        self.uvs = self
            .positions
            .iter()
            .map(|&p| {
                let d = (Vec3::from(p) - center).normalize_or(Vec3::Y);
                let u = 0.5 + d.z.atan2(d.x) / (2.0 * PI);
                let v = d.y.clamp(-1.0, 1.0).acos() / PI;
                [u, v]
            })
            .collect();
    }
}

/// A fluent builder for importing a model file into [`MeshData`].
///
/// Transformations run in a fixed order when [`ModelLoader::load`] is called:
/// 1. Center (if requested)
/// 2. Normalize (if requested)
/// 3. Scale (if specified)
/// 4. Spherical UVs (if requested and the file has none)
/// 5. Flat shading (if requested)
pub struct ModelLoader {
    source: Source,
    center: bool,
    normalize: bool,
    scale_factor: Option<f32>,
    spherical_uvs: bool,
    flat_shaded: bool,
}

enum Source {
    File(PathBuf),
    StlBytes(Vec<u8>),
    ObjBytes(Vec<u8>),
}

/// Parsed geometry plus whether the file authored its own texture coordinates.
struct Imported {
    data: MeshData,
    has_uvs: bool,
}

impl ModelLoader {
    /// Loads geometry from a file, picking the format from its extension.
    pub fn from_file(path: impl AsRef<Path>) -> Self {
        Self::with_source(Source::File(path.as_ref().to_path_buf()))
    }

    /// Parses STL geometry from bytes, e.g. an `include_bytes!` asset.
    pub fn from_stl_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self::with_source(Source::StlBytes(bytes.into()))
    }

    /// Parses Wavefront OBJ text from bytes. Material libraries are not read.
    pub fn from_obj_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self::with_source(Source::ObjBytes(bytes.into()))
    }

    fn with_source(source: Source) -> Self {
        Self {
            source,
            center: false,
            normalize: false,
            scale_factor: None,
            spherical_uvs: false,
            flat_shaded: false,
        }
    }

    pub fn centered(mut self) -> Self {
        self.center = true;
        self
    }

    /// Scales the model so its largest dimension is one unit.
    pub fn normalized(mut self) -> Self {
        self.normalize = true;
        self
    }

    pub fn scaled(mut self, factor: f32) -> Self {
        self.scale_factor = Some(factor);
        self
    }

    /// Generates spherical UVs when the file carries none: always for STL,
    /// and for OBJ files where some object lacks `vt` coordinates.
    pub fn spherical_uvs(mut self) -> Self {
        self.spherical_uvs = true;
        self
    }

    /// Uses per-face normals instead of smooth vertex normals.
    pub fn flat_shaded(mut self) -> Self {
        self.flat_shaded = true;
        self
    }

    /// Reads, parses and reshapes the model.
    pub fn load(self) -> Result<MeshData, GeometryError> {
        let (label, imported) = match &self.source {
            Source::File(path) => (path.display().to_string(), load_file(path)?),
            Source::StlBytes(bytes) => {
                let mut cursor = std::io::Cursor::new(bytes.as_slice());
                ("<stl bytes>".to_string(), parse_stl(&mut cursor)?)
            }
            Source::ObjBytes(bytes) => {
                ("<obj bytes>".to_string(), parse_obj(&mut bytes.as_slice())?)
            }
        };
        let Imported { mut data, has_uvs } = imported;
        if data.index_count() == 0 {
            return Err(GeometryError::InvalidMesh(format!("{label} has no triangles")));
        }

        if self.center {
            data.recenter();
        }
        if self.normalize {
            data.normalize();
        }
        if let Some(factor) = self.scale_factor {
            data.scale(factor);
        }
        if self.spherical_uvs && !has_uvs {
            data.apply_spherical_uvs();
        }
        if self.flat_shaded {
            data.unweld();
        }

        data.validate()?;
        info!(
            "imported {}: {} vertices, {} triangles, {} sub-meshes",
            label,
            data.vertex_count(),
            data.index_count() / 3,
            data.sub_meshes.len()
        );
        Ok(data)
    }
}

fn load_file(path: &Path) -> Result<Imported, GeometryError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default();
    if !matches!(ext.as_str(), "stl" | "obj") {
        return Err(GeometryError::UnknownFormat(ext));
    }

    let file = std::fs::File::open(path).map_err(|source| GeometryError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = std::io::BufReader::new(file);
    match ext.as_str() {
        "stl" => parse_stl(&mut reader),
        _ => parse_obj(&mut reader),
    }
}

// stl_io hands back welded vertices plus indexed faces; normals are rebuilt
// from the triangles since many exporters leave the facet normals zeroed.
fn parse_stl<R: std::io::Read + std::io::Seek>(reader: &mut R) -> Result<Imported, GeometryError> {
    let stl = stl_io::read_stl(reader).map_err(GeometryError::Parse)?;

    let positions: Vec<[f32; 3]> = stl.vertices.iter().map(|&v| v.into()).collect();
    let indices: Vec<u32> = stl
        .faces
        .iter()
        .flat_map(|face| face.vertices.map(|i| i as u32))
        .collect();

    let mut data = MeshData {
        uvs: vec![[0.0, 0.0]; positions.len()],
        normals: Vec::new(),
        positions,
        sub_meshes: vec![indices],
    };
    data.recalculate_normals();
    Ok(Imported {
        data,
        has_uvs: false,
    })
}

// Each OBJ object or group becomes one sub-mesh. `single_index` makes tobj
// duplicate vertices whose position/uv/normal triples differ, so the streams
// line up. OBJ puts v = 0 at the bottom of the image; wgpu samples from the top.
fn parse_obj<R: std::io::BufRead>(reader: &mut R) -> Result<Imported, GeometryError> {
    let options = tobj::LoadOptions {
        triangulate: true,
        single_index: true,
        ..Default::default()
    };
    let (models, _) = tobj::load_obj_buf(reader, &options, |_| {
        Err(tobj::LoadError::OpenFileFailed)
    })
    .map_err(GeometryError::Obj)?;

    let mut data = MeshData::default();
    let mut has_uvs = !models.is_empty();
    for model in models {
        let mesh = model.mesh;
        let positions: Vec<[f32; 3]> = mesh
            .positions
            .chunks_exact(3)
            .map(|p| [p[0], p[1], p[2]])
            .collect();
        let count = positions.len();

        let uvs: Vec<[f32; 2]> = if mesh.texcoords.len() == count * 2 {
            mesh.texcoords.chunks_exact(2).map(|t| [t[0], 1.0 - t[1]]).collect()
        } else {
            has_uvs = false;
            vec![[0.0, 0.0]; count]
        };

        let mut part = MeshData {
            normals: Vec::new(),
            positions,
            uvs,
            sub_meshes: vec![mesh.indices],
        };
        if mesh.normals.len() == count * 3 {
            part.normals = mesh.normals.chunks_exact(3).map(|n| [n[0], n[1], n[2]]).collect();
        } else {
            part.recalculate_normals();
        }
        data.append(part);
    }

    Ok(Imported { data, has_uvs })
}
