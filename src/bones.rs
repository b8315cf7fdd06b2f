//! Bone table and influence merging.
//!
//! Bone names map to dense ids shared across the whole model; each vertex
//! holds up to `max_bones` (id, weight) influence slots. Free slots carry the
//! [`NO_BONE`] sentinel with a zero weight. In interleaved streams the
//! sentinel and bone ids are stored as raw `i32` bit patterns inside `f32`
//! slots so the stream stays homogeneous; [`bone_index_to_f32`] and
//! [`bone_index_from_f32`] are the only sanctioned way to cross that boundary.

use hashbrown::HashMap;

use crate::attribute::Attribute;
use crate::layout::{StreamPlan, StreamTarget};
use crate::model::Mesh;
use crate::scene::SceneBone;

/// Sentinel bone index marking a free influence slot.
pub const NO_BONE: i32 = -1;

/// Reinterpret a bone index as the `f32` whose bit pattern carries it.
///
/// The value is not numerically meaningful; only the bits are. Negative
/// indices (the sentinel) round-trip exactly, as does any id a model can
/// realistically hold.
#[inline]
pub fn bone_index_to_f32(id: i32) -> f32 {
    f32::from_bits(id as u32)
}

/// Inverse of [`bone_index_to_f32`].
#[inline]
pub fn bone_index_from_f32(v: f32) -> i32 {
    v.to_bits() as i32
}

/// One bone of the baked model.
#[derive(Debug, Clone, PartialEq)]
pub struct BoneInfo {
    /// Dense id, assigned in first-seen order across the whole model.
    pub id: i32,
    /// Bind-pose offset transform as four row vectors.
    pub offset_matrix: [[f32; 4]; 4],
}

/// Merge one source mesh's bones into the model-wide table and write its
/// influences into the mesh's pre-allocated slots.
///
/// `base_vertex` translates mesh-local vertex ids into the output mesh's
/// vertex space (non-zero when meshes share a bucket). Each vertex accepts at
/// most `max_bones` influences in encounter order; pairs beyond that are
/// dropped, never merged or renormalized.
pub(crate) fn merge_mesh_bones(
    bones: &mut HashMap<String, BoneInfo>,
    mesh: &mut Mesh,
    plan: &StreamPlan,
    scene_bones: &[SceneBone],
    base_vertex: usize,
    max_bones: usize,
) {
    if scene_bones.is_empty() {
        return;
    }
    if !mesh.attributes.contains(Attribute::BoneIndices)
        || !mesh.attributes.contains(Attribute::BoneWeights)
    {
        return;
    }

    let mut dropped = 0usize;
    let mut out_of_range = 0usize;

    for bone in scene_bones {
        // First sight assigns the next sequential id and records the offset
        // transform; duplicates keep the original entry untouched.
        let next_id = bones.len() as i32;
        let id = bones
            .entry_ref(bone.name.as_str())
            .or_insert_with(|| BoneInfo {
                id: next_id,
                offset_matrix: bone.offset_matrix,
            })
            .id;

        for &(local_vertex, weight) in &bone.weights {
            // A claimed slot must carry a non-zero weight; weightless pairs
            // would pin a bone id to a slot that contributes nothing.
            if weight <= 0.0 {
                continue;
            }
            let vertex = base_vertex + local_vertex as usize;
            if vertex >= mesh.vertex_count {
                out_of_range += 1;
                continue;
            }
            if !write_influence(mesh, plan, vertex, id, weight, max_bones) {
                dropped += 1;
            }
        }
    }

    if out_of_range > 0 {
        tracing::warn!(
            "skipped {} weight pair(s) referencing vertices outside the mesh",
            out_of_range
        );
    }
    if dropped > 0 {
        tracing::warn!(
            "dropped {} influence(s) beyond the {}-bone budget",
            dropped,
            max_bones
        );
    }
}

/// Write (id, weight) into the first free slot of `vertex`. Returns false when
/// every slot is taken.
fn write_influence(
    mesh: &mut Mesh,
    plan: &StreamPlan,
    vertex: usize,
    id: i32,
    weight: f32,
    max_bones: usize,
) -> bool {
    if plan.is_interleaved() {
        let index_offset = mesh.attributes.offset_of(Attribute::BoneIndices, max_bones);
        let weight_offset = mesh.attributes.offset_of(Attribute::BoneWeights, max_bones);
        let base = vertex * plan.interleaved_stride();
        let stream = &mut mesh.streams[0];

        for slot in 0..max_bones {
            let p = base + index_offset + slot;
            if bone_index_from_f32(stream[p]) == NO_BONE {
                stream[p] = bone_index_to_f32(id);
                stream[base + weight_offset + slot] = weight;
                return true;
            }
        }
    } else {
        let Some(StreamTarget::Float(weights_stream)) = plan.target(Attribute::BoneWeights) else {
            return false;
        };
        let base = vertex * max_bones;

        for slot in 0..max_bones {
            if mesh.bone_ids[base + slot] == NO_BONE {
                mesh.bone_ids[base + slot] = id;
                mesh.streams[weights_stream][base + slot] = weight;
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::AttributeSet;
    use crate::model::{bake_scene, ModelSettings};
    use crate::scene::{Scene, SceneMesh, IDENTITY_OFFSET};

    fn bone(name: &str, weights: Vec<(u32, f32)>) -> SceneBone {
        SceneBone {
            name: name.into(),
            offset_matrix: IDENTITY_OFFSET,
            weights,
        }
    }

    fn rigged_mesh(vertex_count: usize, bones: Vec<SceneBone>) -> SceneMesh {
        SceneMesh {
            vertex_count,
            positions: Some(vec![[0.0; 3]; vertex_count]),
            bones,
            ..Default::default()
        }
    }

    #[test]
    fn test_sentinel_round_trip() {
        assert_eq!(bone_index_from_f32(bone_index_to_f32(NO_BONE)), NO_BONE);
        assert_eq!(bone_index_from_f32(bone_index_to_f32(0)), 0);
        assert_eq!(bone_index_from_f32(bone_index_to_f32(12345)), 12345);
    }

    #[test]
    fn test_bone_ids_shared_across_meshes() {
        let scene = Scene {
            meshes: vec![
                rigged_mesh(1, vec![bone("A", vec![(0, 1.0)])]),
                rigged_mesh(1, vec![bone("B", vec![(0, 0.5)]), bone("A", vec![(0, 0.5)])]),
                rigged_mesh(1, vec![bone("A", vec![(0, 1.0)])]),
            ],
        };
        let model = bake_scene(&scene, &ModelSettings::default());

        assert_eq!(model.bones.len(), 2);
        assert_eq!(model.bones["A"].id, 0);
        assert_eq!(model.bones["B"].id, 1);
    }

    #[test]
    fn test_first_seen_transform_wins() {
        let mut changed = IDENTITY_OFFSET;
        changed[0][3] = 7.0;

        let scene = Scene {
            meshes: vec![
                rigged_mesh(1, vec![bone("A", vec![(0, 1.0)])]),
                rigged_mesh(
                    1,
                    vec![SceneBone {
                        name: "A".into(),
                        offset_matrix: changed,
                        weights: vec![(0, 1.0)],
                    }],
                ),
            ],
        };
        let model = bake_scene(&scene, &ModelSettings::default());
        assert_eq!(model.bones["A"].offset_matrix, IDENTITY_OFFSET);
    }

    #[test]
    fn test_overflow_keeps_first_four_in_encounter_order() {
        let names = ["A", "B", "C", "D", "E"];
        let bones = names
            .iter()
            .map(|n| bone(n, vec![(0, 0.2)]))
            .collect::<Vec<_>>();

        let scene = Scene {
            meshes: vec![rigged_mesh(1, bones)],
        };
        let model = bake_scene(&scene, &ModelSettings::default());
        let mesh = &model.meshes[0];

        // Interleaved: [position 3][indices 4][weights 4].
        let stream = &mesh.streams[0];
        for slot in 0..4 {
            assert_eq!(bone_index_from_f32(stream[3 + slot]), slot as i32);
            assert_eq!(stream[7 + slot], 0.2);
        }
        // "E" got an id but no slot.
        assert_eq!(model.bones["E"].id, 4);
        assert!(stream.iter().skip(3).take(4).all(|&v| bone_index_from_f32(v) != 4));
    }

    #[test]
    fn test_planar_merge_writes_at_free_slot() {
        let scene = Scene {
            meshes: vec![rigged_mesh(
                2,
                vec![bone("A", vec![(1, 0.75)]), bone("B", vec![(1, 0.25)])],
            )],
        };
        let settings = ModelSettings {
            interleave_attributes: false,
            ..Default::default()
        };
        let model = bake_scene(&scene, &settings);
        let mesh = &model.meshes[0];

        // Vertex 0 untouched, vertex 1 holds both influences in order.
        assert_eq!(&mesh.bone_ids[0..4], &[NO_BONE; 4]);
        assert_eq!(&mesh.bone_ids[4..8], &[0, 1, NO_BONE, NO_BONE]);

        let weights = mesh.stream_for(Attribute::BoneWeights).unwrap();
        assert_eq!(&weights[0..4], &[0.0; 4]);
        assert_eq!(&weights[4..8], &[0.75, 0.25, 0.0, 0.0]);
    }

    #[test]
    fn test_sentinel_slots_pair_with_zero_weight() {
        let scene = Scene {
            meshes: vec![rigged_mesh(2, vec![bone("A", vec![(0, 1.0)])])],
        };
        let model = bake_scene(&scene, &ModelSettings::default());
        let stream = &model.meshes[0].streams[0];
        let stride = 3 + 4 + 4;

        for vertex in 0..2 {
            for slot in 0..4 {
                let id = bone_index_from_f32(stream[vertex * stride + 3 + slot]);
                let weight = stream[vertex * stride + 7 + slot];
                if id == NO_BONE {
                    assert_eq!(weight, 0.0);
                } else {
                    assert!((0.0..=1.0).contains(&weight));
                }
            }
        }
    }

    #[test]
    fn test_zero_weight_pairs_never_claim_slots() {
        let scene = Scene {
            meshes: vec![rigged_mesh(
                1,
                vec![bone("A", vec![(0, 0.0)]), bone("B", vec![(0, 0.5)])],
            )],
        };
        let model = bake_scene(&scene, &ModelSettings::default());
        let stream = &model.meshes[0].streams[0];

        // "A" still enters the bone table but holds no slot; "B" lands first.
        assert_eq!(model.bones["A"].id, 0);
        assert_eq!(bone_index_from_f32(stream[3]), 1);
        assert_eq!(stream[7], 0.5);
        assert_eq!(bone_index_from_f32(stream[4]), NO_BONE);
        assert_eq!(stream[8], 0.0);
    }

    #[test]
    fn test_out_of_range_vertex_ids_are_skipped() {
        let scene = Scene {
            meshes: vec![rigged_mesh(1, vec![bone("A", vec![(5, 1.0), (0, 0.5)])])],
        };
        let model = bake_scene(&scene, &ModelSettings::default());
        let stream = &model.meshes[0].streams[0];
        assert_eq!(bone_index_from_f32(stream[3]), 0);
        assert_eq!(stream[7], 0.5);
    }

    #[test]
    fn test_forced_attributes_alone_never_merge() {
        // A mesh without bones but with forced bone attributes keeps every
        // slot at the sentinel.
        let scene = Scene {
            meshes: vec![SceneMesh {
                vertex_count: 2,
                positions: Some(vec![[0.0; 3]; 2]),
                ..Default::default()
            }],
        };
        let settings = ModelSettings {
            force_attributes: [Attribute::BoneIndices, Attribute::BoneWeights]
                .into_iter()
                .collect::<AttributeSet>(),
            ..Default::default()
        };
        let model = bake_scene(&scene, &settings);
        assert!(model.bones.is_empty());

        let stream = &model.meshes[0].streams[0];
        let stride = 3 + 4 + 4;
        for vertex in 0..2 {
            for slot in 0..4 {
                assert_eq!(
                    bone_index_from_f32(stream[vertex * stride + 3 + slot]),
                    NO_BONE
                );
                assert_eq!(stream[vertex * stride + 7 + slot], 0.0);
            }
        }
    }
}
