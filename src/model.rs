//! Baked model types and the `load_model` entry point.

use std::path::Path;

use hashbrown::HashMap;

use crate::assemble::assemble_mesh;
use crate::attribute::{Attribute, AttributeSet};
use crate::bones::BoneInfo;
use crate::error::LoadError;
use crate::layout::{planar_stream_index, StreamPlan};
use crate::scene::Scene;

/// Settings for one bake.
#[derive(Debug, Clone)]
pub struct ModelSettings {
    /// Pack all attributes into one stream per mesh instead of one stream per
    /// attribute.
    pub interleave_attributes: bool,
    /// Influence slots per vertex. Weight pairs beyond this budget are
    /// silently dropped in encounter order, never merged or renormalized.
    pub max_influential_bones: usize,
    /// Attributes emitted even when the source mesh lacks them (zero-filled).
    pub force_attributes: AttributeSet,
    /// Merge meshes with identical attribute set and material into one
    /// bucket, offsetting indices and bone vertex references accordingly.
    pub merge_meshes: bool,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            interleave_attributes: true,
            max_influential_bones: 4,
            force_attributes: AttributeSet::EMPTY,
            merge_meshes: false,
        }
    }
}

/// One baked mesh: flat vertex streams plus a flat triangle index list.
#[derive(Debug, Clone)]
pub struct Mesh {
    pub attributes: AttributeSet,
    /// True when all attributes share `streams[0]`.
    pub interleaved: bool,
    pub vertex_count: usize,
    /// Float vertex streams; one entry when interleaved, one per non-bone-index
    /// attribute otherwise.
    pub streams: Vec<Vec<f32>>,
    /// Bone indices parallel to the bone-weight stream. Populated only in
    /// planar mode; interleaved meshes carry indices inside `streams[0]` as
    /// bit patterns.
    pub bone_ids: Vec<i32>,
    /// Flattened triangle list.
    pub indices: Vec<u32>,
    /// Opaque reference into the caller's material table (-1 = none).
    pub material_id: i32,
}

/// Equality over float streams is bitwise, not numeric. Interleaved streams
/// carry bone-index sentinels whose bit pattern is a NaN as `f32`; two
/// byte-identical bakes must still compare equal.
impl PartialEq for Mesh {
    fn eq(&self, other: &Self) -> bool {
        self.attributes == other.attributes
            && self.interleaved == other.interleaved
            && self.vertex_count == other.vertex_count
            && self.streams.len() == other.streams.len()
            && self
                .streams
                .iter()
                .zip(&other.streams)
                .all(|(a, b)| bytemuck::cast_slice::<f32, u8>(a) == bytemuck::cast_slice::<f32, u8>(b))
            && self.bone_ids == other.bone_ids
            && self.indices == other.indices
            && self.material_id == other.material_id
    }
}

impl Mesh {
    pub(crate) fn with_plan(
        plan: &StreamPlan,
        attributes: AttributeSet,
        material_id: i32,
        vertex_count: usize,
    ) -> Self {
        let (streams, bone_ids) = plan.alloc_streams(vertex_count);
        Self {
            attributes,
            interleaved: plan.is_interleaved(),
            vertex_count: 0,
            streams,
            bone_ids,
            indices: Vec::new(),
            material_id,
        }
    }

    /// The dedicated float stream for `attr` in a planar mesh.
    ///
    /// Returns `None` for interleaved meshes, absent attributes, and
    /// `BoneIndices` (which lives in [`Mesh::bone_ids`]).
    pub fn stream_for(&self, attr: Attribute) -> Option<&[f32]> {
        if self.interleaved {
            return None;
        }
        let index = planar_stream_index(self.attributes, attr)?;
        self.streams.get(index).map(Vec::as_slice)
    }

    /// Byte view of one float stream, ready for GPU upload.
    pub fn stream_bytes(&self, stream: usize) -> &[u8] {
        bytemuck::cast_slice(&self.streams[stream])
    }

    /// Byte view of the index list.
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    /// Byte view of the planar bone-index container.
    pub fn bone_id_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.bone_ids)
    }
}

/// A fully baked model. Immutable once returned; dropping it releases
/// everything (no pooled or borrowed native resources inside).
#[derive(Debug, Clone, Default)]
pub struct Model {
    /// Model-wide bone table shared by all meshes. Ids are dense, unique and
    /// stable in first-seen order.
    pub bones: HashMap<String, BoneInfo>,
    pub meshes: Vec<Mesh>,
}

/// Bake an already-imported scene.
///
/// Meshes are assembled strictly in sequence; the bone table threads through
/// as shared context. This is the pure core of [`load_model`], usable
/// directly when the caller has its own scene source.
pub fn bake_scene(scene: &Scene, settings: &ModelSettings) -> Model {
    let mut model = Model::default();
    for mesh in &scene.meshes {
        assemble_mesh(&mut model, settings, mesh);
    }
    model
}

/// Load a scene file and bake it into a [`Model`].
///
/// Fails only when the scene itself cannot be imported; missing per-vertex
/// attributes inside an imported scene are zero-filled, never errors.
pub fn load_model(path: impl AsRef<Path>, settings: &ModelSettings) -> Result<Model, LoadError> {
    let path = path.as_ref();
    let scene = crate::gltf::import_scene(path)?;
    let model = bake_scene(&scene, settings);

    tracing::info!(
        "Baked {}: {} mesh(es), {} bone(s)",
        path.display(),
        model.meshes.len(),
        model.bones.len()
    );

    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bones::NO_BONE;
    use crate::scene::{SceneBone, SceneMesh, IDENTITY_OFFSET};

    fn flat_mesh(vertex_count: usize, material_id: i32) -> SceneMesh {
        let positions = (0..vertex_count)
            .map(|i| [i as f32, 0.0, 0.0])
            .collect::<Vec<_>>();
        SceneMesh {
            vertex_count,
            positions: Some(positions),
            indices: (0..vertex_count as u32).collect(),
            material_id,
            ..Default::default()
        }
    }

    #[test]
    fn test_bucketing_merges_matching_meshes() {
        let scene = Scene {
            meshes: vec![flat_mesh(2, 0), flat_mesh(2, 0)],
        };
        let settings = ModelSettings {
            merge_meshes: true,
            ..Default::default()
        };
        let model = bake_scene(&scene, &settings);

        assert_eq!(model.meshes.len(), 1);
        let mesh = &model.meshes[0];
        assert_eq!(mesh.vertex_count, 4);
        assert_eq!(mesh.streams[0].len(), 12);
        // Second mesh's indices shift by the bucket's prior vertex count.
        assert_eq!(mesh.indices, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_bucketing_respects_material_and_attributes() {
        let mut textured = flat_mesh(2, 0);
        textured.texcoords = Some(vec![[0.0; 2]; 2]);

        let scene = Scene {
            meshes: vec![flat_mesh(2, 0), flat_mesh(2, 1), textured],
        };
        let settings = ModelSettings {
            merge_meshes: true,
            ..Default::default()
        };
        let model = bake_scene(&scene, &settings);
        assert_eq!(model.meshes.len(), 3);
    }

    #[test]
    fn test_bucketing_translates_bone_vertex_ids() {
        let mut first = flat_mesh(2, 0);
        first.bones.push(SceneBone {
            name: "A".into(),
            offset_matrix: IDENTITY_OFFSET,
            weights: vec![(0, 1.0)],
        });
        let mut second = flat_mesh(2, 0);
        second.bones.push(SceneBone {
            name: "A".into(),
            offset_matrix: IDENTITY_OFFSET,
            weights: vec![(0, 0.5)],
        });

        let scene = Scene {
            meshes: vec![first, second],
        };
        let settings = ModelSettings {
            merge_meshes: true,
            interleave_attributes: false,
            ..Default::default()
        };
        let model = bake_scene(&scene, &settings);

        assert_eq!(model.meshes.len(), 1);
        let mesh = &model.meshes[0];
        assert_eq!(mesh.vertex_count, 4);

        // Local vertex 0 of the second mesh is bucket vertex 2.
        assert_eq!(mesh.bone_ids[0], 0);
        assert_eq!(mesh.bone_ids[4], NO_BONE);
        assert_eq!(mesh.bone_ids[8], 0);
        let weights = mesh.stream_for(Attribute::BoneWeights).unwrap();
        assert_eq!(weights[0], 1.0);
        assert_eq!(weights[8], 0.5);
    }

    #[test]
    fn test_without_merge_meshes_stay_separate() {
        let scene = Scene {
            meshes: vec![flat_mesh(2, 0), flat_mesh(2, 0)],
        };
        let model = bake_scene(&scene, &ModelSettings::default());
        assert_eq!(model.meshes.len(), 2);
        assert_eq!(model.meshes[1].indices, vec![0, 1]);
    }

    #[test]
    fn test_byte_views_match_element_counts() {
        let scene = Scene {
            meshes: vec![flat_mesh(3, 0)],
        };
        let model = bake_scene(&scene, &ModelSettings::default());
        let mesh = &model.meshes[0];

        assert_eq!(mesh.stream_bytes(0).len(), mesh.streams[0].len() * 4);
        assert_eq!(mesh.index_bytes().len(), mesh.indices.len() * 4);
    }

    #[test]
    fn test_mesh_equality_survives_sentinel_bit_patterns() {
        let mut mesh = flat_mesh(2, 0);
        mesh.bones.push(SceneBone {
            name: "A".into(),
            offset_matrix: IDENTITY_OFFSET,
            weights: vec![(0, 1.0)],
        });
        let scene = Scene { meshes: vec![mesh] };
        let settings = ModelSettings::default();
        let a = bake_scene(&scene, &settings);
        let b = bake_scene(&scene, &settings);

        // Free influence slots put NaN bit patterns into the interleaved
        // stream; bitwise equality must still hold across identical bakes.
        assert!(a.meshes[0].streams[0].iter().any(|v| v.is_nan()));
        assert_eq!(a.meshes, b.meshes);

        let mut c = b;
        c.meshes[0].streams[0][0] = 9.0;
        assert_ne!(a.meshes, c.meshes);
    }

    #[test]
    fn test_empty_scene_bakes_empty_model() {
        let model = bake_scene(&Scene::default(), &ModelSettings::default());
        assert!(model.meshes.is_empty());
        assert!(model.bones.is_empty());
    }
}
