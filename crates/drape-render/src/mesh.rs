//! Garment mesh loading.
//!
//! Parses Wavefront OBJ text with `winnow` into an indexed triangle mesh.
//! Faces are grouped into islands by their `usemtl` material: names
//! containing `front` or `back` receive that surface's texture, anything
//! else is drawn plain. The mesh is recentered on its bounding-box center
//! so the orbit camera can look at the origin.

use bytemuck::{Pod, Zeroable};
use drape_core::model::SurfaceSide;
use glam::Vec3;
use log::debug;
use std::collections::HashMap;
use std::path::Path;
use winnow::ascii::{dec_int, float, space0, space1};
use winnow::combinator::{opt, separated};
use winnow::prelude::*;
use winnow::token::{take_till, take_while};

#[derive(Debug, thiserror::Error)]
pub enum MeshError {
    #[error("could not read mesh: {0}")]
    Io(#[from] std::io::Error),
    #[error("mesh is not valid UTF-8")]
    Encoding(#[from] std::str::Utf8Error),
    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },
    #[error("line {line}: index {index} is out of range")]
    BadIndex { line: usize, index: i64 },
    #[error("mesh has no faces")]
    Empty,
}

/// Which texture an island samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Island {
    Surface(SurfaceSide),
    Plain,
}

impl Island {
    fn from_material(name: &str) -> Self {
        let name = name.to_ascii_lowercase();
        if name.contains("front") {
            Island::Surface(SurfaceSide::Front)
        } else if name.contains("back") {
            Island::Surface(SurfaceSide::Back)
        } else {
            Island::Plain
        }
    }
}

/// GPU vertex layout: position, normal, uv.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

/// Triangles that share one island.
#[derive(Debug, Clone, PartialEq)]
pub struct Submesh {
    pub island: Island,
    pub indices: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GarmentMesh {
    pub vertices: Vec<MeshVertex>,
    pub submeshes: Vec<Submesh>,
    /// Half the bounding-box diagonal after recentering.
    pub radius: f32,
}

// ─── OBJ lines ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
struct FaceVertex {
    v: i64,
    vt: Option<i64>,
    vn: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
enum ObjLine<'a> {
    Position([f32; 3]),
    TexCoord([f32; 2]),
    Normal([f32; 3]),
    Face(Vec<FaceVertex>),
    Material(&'a str),
    Ignored,
}

fn number(input: &mut &str) -> ModalResult<f32> {
    float.parse_next(input)
}

fn index(input: &mut &str) -> ModalResult<i64> {
    dec_int.parse_next(input)
}

fn gap(input: &mut &str) -> ModalResult<()> {
    space1.void().parse_next(input)
}

fn skip_space(input: &mut &str) -> ModalResult<()> {
    space0.void().parse_next(input)
}

fn slash(input: &mut &str) -> ModalResult<bool> {
    opt('/').map(|s| s.is_some()).parse_next(input)
}

fn vec3(input: &mut &str) -> ModalResult<[f32; 3]> {
    let x = number(input)?;
    gap(input)?;
    let y = number(input)?;
    gap(input)?;
    let z = number(input)?;
    Ok([x, y, z])
}

/// `v`, `v/vt`, `v//vn` or `v/vt/vn`.
fn face_vertex(input: &mut &str) -> ModalResult<FaceVertex> {
    let v = index(input)?;
    let mut vt = None;
    let mut vn = None;
    if slash(input)? {
        vt = opt(index).parse_next(input)?;
        if slash(input)? {
            vn = opt(index).parse_next(input)?;
        }
    }
    Ok(FaceVertex { v, vt, vn })
}

fn obj_line<'a>(input: &mut &'a str) -> ModalResult<ObjLine<'a>> {
    let keyword = take_while(1.., |c: char| !c.is_whitespace()).parse_next(input)?;
    skip_space(input)?;
    match keyword {
        "v" => vec3.map(ObjLine::Position).parse_next(input),
        "vn" => vec3.map(ObjLine::Normal).parse_next(input),
        "vt" => {
            let u = number(input)?;
            gap(input)?;
            let v = number(input)?;
            Ok(ObjLine::TexCoord([u, v]))
        }
        "f" => separated(3.., face_vertex, space1)
            .map(ObjLine::Face)
            .parse_next(input),
        "usemtl" => take_till(1.., |c: char| c == '\r' || c == '\n')
            .map(|name: &'a str| ObjLine::Material(name.trim()))
            .parse_next(input),
        _ => Ok(ObjLine::Ignored),
    }
}

// ─── Mesh building ───────────────────────────────────────────────────────

/// Resolve a 1-based (or negative, relative) OBJ index.
fn resolve(index: i64, len: usize, line: usize) -> Result<usize, MeshError> {
    let resolved = if index > 0 {
        index - 1
    } else {
        len as i64 + index
    };
    if index == 0 || resolved < 0 || resolved >= len as i64 {
        return Err(MeshError::BadIndex { line, index });
    }
    Ok(resolved as usize)
}

impl GarmentMesh {
    /// Read and parse an OBJ file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, MeshError> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MeshError> {
        Self::parse_obj(std::str::from_utf8(bytes)?)
    }

    pub fn parse_obj(source: &str) -> Result<Self, MeshError> {
        let mut positions: Vec<[f32; 3]> = Vec::new();
        let mut tex_coords: Vec<[f32; 2]> = Vec::new();
        let mut normals: Vec<[f32; 3]> = Vec::new();

        let mut vertices: Vec<MeshVertex> = Vec::new();
        let mut has_normal: Vec<bool> = Vec::new();
        let mut dedup: HashMap<(usize, Option<usize>, Option<usize>), u32> = HashMap::new();
        let mut islands: Vec<Submesh> = Vec::new();
        let mut current = Island::Plain;

        for (n, raw) in source.lines().enumerate() {
            let line_no = n + 1;
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut rest = line;
            let parsed = obj_line.parse_next(&mut rest).map_err(|e| MeshError::Syntax {
                line: line_no,
                message: e.to_string(),
            })?;

            match parsed {
                ObjLine::Position(p) => positions.push(p),
                ObjLine::TexCoord(t) => tex_coords.push(t),
                ObjLine::Normal(v) => normals.push(v),
                ObjLine::Material(name) => current = Island::from_material(name),
                ObjLine::Ignored => {}
                ObjLine::Face(corners) => {
                    let mut face = Vec::with_capacity(corners.len());
                    for c in corners {
                        let key = (
                            resolve(c.v, positions.len(), line_no)?,
                            c.vt.map(|i| resolve(i, tex_coords.len(), line_no)).transpose()?,
                            c.vn.map(|i| resolve(i, normals.len(), line_no)).transpose()?,
                        );
                        let idx = *dedup.entry(key).or_insert_with(|| {
                            let (p, t, nrm) = key;
                            // OBJ puts v = 0 at the bottom; rasters put it on top.
                            let uv = t.map(|t| [tex_coords[t][0], 1.0 - tex_coords[t][1]]);
                            vertices.push(MeshVertex {
                                position: positions[p],
                                normal: nrm.map(|i| normals[i]).unwrap_or_default(),
                                uv: uv.unwrap_or_default(),
                            });
                            has_normal.push(nrm.is_some());
                            (vertices.len() - 1) as u32
                        });
                        face.push(idx);
                    }

                    let slot = match islands.iter().position(|s| s.island == current) {
                        Some(i) => i,
                        None => {
                            islands.push(Submesh {
                                island: current,
                                indices: Vec::new(),
                            });
                            islands.len() - 1
                        }
                    };
                    let submesh = &mut islands[slot];
                    // Fan triangulation for quads and larger polygons.
                    for i in 1..face.len() - 1 {
                        submesh.indices.extend([face[0], face[i], face[i + 1]]);
                    }
                }
            }
        }

        if islands.iter().all(|s| s.indices.is_empty()) {
            return Err(MeshError::Empty);
        }

        fill_missing_normals(&mut vertices, &has_normal, &islands);
        let radius = recenter(&mut vertices);
        debug!(
            "garment mesh: {} vertices, {} island(s)",
            vertices.len(),
            islands.len()
        );
        Ok(GarmentMesh {
            vertices,
            submeshes: islands,
            radius,
        })
    }

    pub fn triangle_count(&self) -> usize {
        self.submeshes.iter().map(|s| s.indices.len() / 3).sum()
    }

    pub fn submesh(&self, island: Island) -> Option<&Submesh> {
        self.submeshes.iter().find(|s| s.island == island)
    }
}

/// Smooth normals for vertices the file gave none.
fn fill_missing_normals(vertices: &mut [MeshVertex], has_normal: &[bool], islands: &[Submesh]) {
    if has_normal.iter().all(|h| *h) {
        return;
    }
    let mut acc = vec![Vec3::ZERO; vertices.len()];
    for tri in islands.iter().flat_map(|s| s.indices.chunks_exact(3)) {
        let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| i as usize);
        let pa = Vec3::from(vertices[a].position);
        let pb = Vec3::from(vertices[b].position);
        let pc = Vec3::from(vertices[c].position);
        let n = (pb - pa).cross(pc - pa);
        for i in [a, b, c] {
            acc[i] += n;
        }
    }
    for (i, v) in vertices.iter_mut().enumerate() {
        if !has_normal[i] {
            v.normal = acc[i].normalize_or_zero().to_array();
        }
    }
}

/// Move the bounding-box center to the origin; returns the bounding radius.
fn recenter(vertices: &mut [MeshVertex]) -> f32 {
    let mut min = Vec3::splat(f32::INFINITY);
    let mut max = Vec3::splat(f32::NEG_INFINITY);
    for v in vertices.iter() {
        let p = Vec3::from(v.position);
        min = min.min(p);
        max = max.max(p);
    }
    if !min.is_finite() || !max.is_finite() {
        return 0.0;
    }
    let center = (min + max) / 2.0;
    for v in vertices.iter_mut() {
        v.position = (Vec3::from(v.position) - center).to_array();
    }
    (max - min).length() / 2.0
}
