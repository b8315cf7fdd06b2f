//! Per-mesh assembly: attribute resolution, stream allocation, vertex
//! emission, index append, bone merge.
//!
//! Source coordinates are converted to the target handedness on emission by
//! swapping the y and z axes. The swap applies to positions, normals and
//! tangent/bitangent pairs, never to texture coordinates.

use crate::attribute::Attribute;
use crate::bones::{bone_index_to_f32, merge_mesh_bones, NO_BONE};
use crate::layout::{StreamPlan, StreamTarget};
use crate::model::{Mesh, Model, ModelSettings};
use crate::scene::SceneMesh;

/// Assemble one source mesh into the model.
///
/// Phases run strictly in order: resolve attributes, allocate streams, emit
/// vertices, append indices, merge bones. With `merge_meshes` enabled the
/// mesh lands in an existing bucket when one matches its attribute set and
/// material, and all vertex references shift by the bucket's prior vertex
/// count.
pub(crate) fn assemble_mesh(model: &mut Model, settings: &ModelSettings, src: &SceneMesh) {
    let max_bones = settings.max_influential_bones;
    let attributes = src.detected_attributes().union(settings.force_attributes);
    let plan = StreamPlan::new(attributes, settings.interleave_attributes, max_bones);

    let bucket = if settings.merge_meshes {
        model
            .meshes
            .iter()
            .position(|m| m.attributes == attributes && m.material_id == src.material_id)
    } else {
        None
    };
    let mesh_index = match bucket {
        Some(index) => index,
        None => {
            model
                .meshes
                .push(Mesh::with_plan(&plan, attributes, src.material_id, src.vertex_count));
            model.meshes.len() - 1
        }
    };

    let mesh = &mut model.meshes[mesh_index];
    let base_vertex = mesh.vertex_count;

    for vertex in 0..src.vertex_count {
        emit_vertex(mesh, &plan, src, vertex, max_bones);
    }

    mesh.indices
        .extend(src.indices.iter().map(|i| base_vertex as u32 + i));
    mesh.vertex_count += src.vertex_count;

    merge_mesh_bones(
        &mut model.bones,
        mesh,
        &plan,
        &src.bones,
        base_vertex,
        max_bones,
    );
}

/// Append one vertex's values for every attribute in the set, catalog order.
fn emit_vertex(
    mesh: &mut Mesh,
    plan: &StreamPlan,
    src: &SceneMesh,
    vertex: usize,
    max_bones: usize,
) {
    for attr in mesh.attributes.iter() {
        match plan.target(attr) {
            Some(StreamTarget::Float(stream)) => {
                emit_attribute(&mut mesh.streams[stream], src, vertex, attr, max_bones);
            }
            Some(StreamTarget::BoneIds) => {
                // Planar bone indices pre-fill as plain sentinels; the merge
                // engine claims slots afterwards.
                mesh.bone_ids.extend(std::iter::repeat(NO_BONE).take(max_bones));
            }
            None => {}
        }
    }
}

fn emit_attribute(
    target: &mut Vec<f32>,
    src: &SceneMesh,
    vertex: usize,
    attr: Attribute,
    max_bones: usize,
) {
    match attr {
        Attribute::Position => match &src.positions {
            Some(positions) => push_swapped(target, at(positions, vertex)),
            None => push_zeros(target, 3),
        },
        Attribute::Normal => match &src.normals {
            Some(normals) => push_swapped(target, at(normals, vertex)),
            None => push_zeros(target, 3),
        },
        Attribute::TexCoord => match &src.texcoords {
            Some(texcoords) => {
                let [u, v] = texcoords.get(vertex).copied().unwrap_or([0.0; 2]);
                target.push(u);
                target.push(v);
            }
            None => push_zeros(target, 2),
        },
        Attribute::TangentBitangent => match (&src.tangents, &src.bitangents) {
            (Some(tangents), Some(bitangents)) => {
                push_swapped(target, at(tangents, vertex));
                push_swapped(target, at(bitangents, vertex));
            }
            _ => push_zeros(target, 6),
        },
        Attribute::BoneIndices => {
            // Sentinel bit pattern keeps the float stream homogeneous.
            let sentinel = bone_index_to_f32(NO_BONE);
            target.extend(std::iter::repeat(sentinel).take(max_bones));
        }
        Attribute::BoneWeights => push_zeros(target, max_bones),
    }
}

#[inline]
fn at(values: &[[f32; 3]], vertex: usize) -> [f32; 3] {
    values.get(vertex).copied().unwrap_or([0.0; 3])
}

/// Handedness conversion: source (x, y, z) lands as (x, z, y).
#[inline]
fn push_swapped(target: &mut Vec<f32>, [x, y, z]: [f32; 3]) {
    target.push(x);
    target.push(z);
    target.push(y);
}

#[inline]
fn push_zeros(target: &mut Vec<f32>, count: usize) {
    target.extend(std::iter::repeat(0.0).take(count));
}
