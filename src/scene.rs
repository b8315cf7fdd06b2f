//! Parsed-scene data model handed to the assembler.
//!
//! This is the boundary to the scene-import collaborator: a flat list of
//! meshes in depth-first node order, each with per-vertex attribute arrays
//! that are either fully present or fully absent, a triangle index list, a
//! material reference and per-bone weight lists.

use crate::attribute::{Attribute, AttributeSet};

/// A scene reduced to its meshes, in depth-first node visitation order.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    pub meshes: Vec<SceneMesh>,
}

/// One source mesh as supplied by the importer.
#[derive(Debug, Clone, Default)]
pub struct SceneMesh {
    pub vertex_count: usize,
    /// Present arrays hold exactly `vertex_count` entries.
    pub positions: Option<Vec<[f32; 3]>>,
    pub normals: Option<Vec<[f32; 3]>>,
    /// First UV channel only.
    pub texcoords: Option<Vec<[f32; 2]>>,
    /// Present together with `bitangents` or not at all.
    pub tangents: Option<Vec<[f32; 3]>>,
    pub bitangents: Option<Vec<[f32; 3]>>,
    /// Flattened triangle list, face order, face-local index order.
    pub indices: Vec<u32>,
    /// Opaque reference into the caller's material table (-1 = none).
    pub material_id: i32,
    pub bones: Vec<SceneBone>,
}

/// One bone of a source mesh.
#[derive(Debug, Clone)]
pub struct SceneBone {
    pub name: String,
    /// Bind-pose offset transform as four row vectors.
    pub offset_matrix: [[f32; 4]; 4],
    /// (mesh-local vertex id, weight) pairs.
    pub weights: Vec<(u32, f32)>,
}

impl SceneMesh {
    /// Attributes this mesh physically carries.
    ///
    /// Bone indices and weights are detected as a pair: a rigged mesh always
    /// needs both.
    pub fn detected_attributes(&self) -> AttributeSet {
        let mut set = AttributeSet::EMPTY;
        if self.positions.is_some() {
            set.insert(Attribute::Position);
        }
        if self.normals.is_some() {
            set.insert(Attribute::Normal);
        }
        if self.texcoords.is_some() {
            set.insert(Attribute::TexCoord);
        }
        if self.tangents.is_some() && self.bitangents.is_some() {
            set.insert(Attribute::TangentBitangent);
        }
        if !self.bones.is_empty() {
            set.insert(Attribute::BoneIndices);
            set.insert(Attribute::BoneWeights);
        }
        set
    }
}

/// Identity offset transform, used when the importer supplies no bind matrix.
pub(crate) const IDENTITY_OFFSET: [[f32; 4]; 4] = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];
