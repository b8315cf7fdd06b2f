//! glTF scene import.
//!
//! Walks the default scene's node tree depth-first and converts every
//! triangle primitive into a [`SceneMesh`]. Parsing itself delegates to the
//! `gltf` crate; this adapter only reshapes its output into the collaborator
//! data model: per-bone weight lists, paired tangents/bitangents, row-vector
//! offset transforms.

use std::path::Path;

use crate::error::LoadError;
use crate::scene::{Scene, SceneBone, SceneMesh, IDENTITY_OFFSET};

pub(crate) fn import_scene(path: &Path) -> Result<Scene, LoadError> {
    let (document, buffers, _images) =
        gltf::import(path).map_err(|source| LoadError::Import {
            path: path.to_path_buf(),
            source: Some(source),
        })?;

    let root = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .ok_or_else(|| LoadError::Import {
            path: path.to_path_buf(),
            source: None,
        })?;

    let mut meshes = Vec::new();
    for node in root.nodes() {
        collect_node(&node, &buffers, &mut meshes);
    }
    Ok(Scene { meshes })
}

fn collect_node(node: &gltf::Node, buffers: &[gltf::buffer::Data], out: &mut Vec<SceneMesh>) {
    if let Some(mesh) = node.mesh() {
        let skin = node.skin();
        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                tracing::warn!("skipping non-triangle primitive in mesh '{}'", mesh.name().unwrap_or("unnamed"));
                continue;
            }
            out.push(convert_primitive(&primitive, skin.as_ref(), buffers));
        }
    }
    for child in node.children() {
        collect_node(&child, buffers, out);
    }
}

fn convert_primitive(
    primitive: &gltf::Primitive,
    skin: Option<&gltf::Skin>,
    buffers: &[gltf::buffer::Data],
) -> SceneMesh {
    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|d| d.0.as_slice()));

    let positions: Option<Vec<[f32; 3]>> = reader.read_positions().map(|iter| iter.collect());
    let normals: Option<Vec<[f32; 3]>> = reader.read_normals().map(|iter| iter.collect());
    let texcoords: Option<Vec<[f32; 2]>> = reader
        .read_tex_coords(0)
        .map(|iter| iter.into_f32().collect());
    let tangents4: Option<Vec<[f32; 4]>> = reader.read_tangents().map(|iter| iter.collect());

    let vertex_count = positions
        .as_ref()
        .map(Vec::len)
        .or_else(|| normals.as_ref().map(Vec::len))
        .or_else(|| texcoords.as_ref().map(Vec::len))
        .unwrap_or(0);

    let positions = consistent("position(s)", positions, vertex_count);
    let normals = consistent("normal(s)", normals, vertex_count);
    let texcoords = consistent("texcoord(s)", texcoords, vertex_count);
    let tangents4 = consistent("tangent(s)", tangents4, vertex_count);

    // glTF supplies vec4 tangents; the bitangent is reconstructed from the
    // normal and the handedness sign in w. Both sides of the pair need
    // normals, so tangents without normals are dropped.
    let (tangents, bitangents) = match (&normals, tangents4) {
        (Some(normals), Some(tangents4)) => {
            let mut tangents = Vec::with_capacity(normals.len());
            let mut bitangents = Vec::with_capacity(normals.len());
            for (n, t) in normals.iter().zip(&tangents4) {
                let normal = glam::Vec3::from(*n);
                let tangent = glam::Vec3::new(t[0], t[1], t[2]);
                let bitangent = normal.cross(tangent) * t[3];
                tangents.push(tangent.to_array());
                bitangents.push(bitangent.to_array());
            }
            (Some(tangents), Some(bitangents))
        }
        _ => (None, None),
    };

    let indices: Vec<u32> = reader
        .read_indices()
        .map(|iter| iter.into_u32().collect())
        .unwrap_or_else(|| (0..vertex_count as u32).collect());

    let material_id = primitive
        .material()
        .index()
        .map(|i| i as i32)
        .unwrap_or(-1);

    let bones = match skin {
        Some(skin) => convert_skin(skin, &reader, buffers, vertex_count),
        None => Vec::new(),
    };

    SceneMesh {
        vertex_count,
        positions,
        normals,
        texcoords,
        tangents,
        bitangents,
        indices,
        material_id,
        bones,
    }
}

/// Turn a skin plus per-vertex joint/weight tuples into per-bone weight lists.
fn convert_skin<'a, 's, F>(
    skin: &gltf::Skin,
    reader: &gltf::mesh::Reader<'a, 's, F>,
    buffers: &[gltf::buffer::Data],
    vertex_count: usize,
) -> Vec<SceneBone>
where
    F: Clone + Fn(gltf::Buffer<'a>) -> Option<&'s [u8]>,
{
    let skin_reader = skin.reader(|buffer| buffers.get(buffer.index()).map(|d| d.0.as_slice()));
    let inverse_binds: Vec<[[f32; 4]; 4]> = skin_reader
        .read_inverse_bind_matrices()
        .map(|iter| iter.collect())
        .unwrap_or_default();

    let mut bones: Vec<SceneBone> = skin
        .joints()
        .enumerate()
        .map(|(i, node)| SceneBone {
            name: node
                .name()
                .map(str::to_owned)
                .unwrap_or_else(|| format!("joint_{}", node.index())),
            offset_matrix: inverse_binds
                .get(i)
                .map(|m| transpose_to_rows(*m))
                .unwrap_or(IDENTITY_OFFSET),
            weights: Vec::new(),
        })
        .collect();

    let joints: Option<Vec<[u16; 4]>> = reader.read_joints(0).map(|iter| iter.into_u16().collect());
    let weights: Option<Vec<[f32; 4]>> = reader.read_weights(0).map(|iter| iter.into_f32().collect());

    match (joints, weights) {
        (Some(joints), Some(weights))
            if joints.len() == vertex_count && weights.len() == vertex_count =>
        {
            let mut unknown_joints = 0usize;
            for (vertex, (js, ws)) in joints.iter().zip(&weights).enumerate() {
                for k in 0..4 {
                    let weight = ws[k];
                    if weight <= 0.0 {
                        continue;
                    }
                    match bones.get_mut(js[k] as usize) {
                        Some(bone) => bone.weights.push((vertex as u32, weight)),
                        None => unknown_joints += 1,
                    }
                }
            }
            if unknown_joints > 0 {
                tracing::warn!(
                    "ignored {} weight(s) referencing joints outside the skin",
                    unknown_joints
                );
            }
        }
        (None, None) => {}
        _ => {
            tracing::warn!(
                "mesh has partial skinning data (joints or weights missing), ignoring skinning"
            );
        }
    }

    bones
}

/// glTF matrices are column-major; the collaborator contract wants four row
/// vectors.
fn transpose_to_rows(columns: [[f32; 4]; 4]) -> [[f32; 4]; 4] {
    glam::Mat4::from_cols_array_2d(&columns)
        .transpose()
        .to_cols_array_2d()
}

fn consistent<T>(label: &str, values: Option<Vec<T>>, vertex_count: usize) -> Option<Vec<T>> {
    match values {
        Some(v) if v.len() == vertex_count => Some(v),
        Some(v) => {
            tracing::warn!(
                "mesh has {} {} for {} vertices, ignoring the attribute",
                v.len(),
                label,
                vertex_count
            );
            None
        }
        None => None,
    }
}
