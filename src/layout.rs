//! Vertex stream layout planning.
//!
//! Maps each attribute of a mesh to the container that receives its values:
//! either a single interleaved float stream carrying every attribute in
//! catalog order, or one stream per attribute, with bone indices going to a
//! dedicated integer container in planar mode.

use crate::attribute::{Attribute, AttributeSet};

/// Where one attribute's values are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamTarget {
    /// Index into the mesh's float streams.
    Float(usize),
    /// The mesh's dedicated `i32` bone-index container (planar mode only).
    BoneIds,
}

/// Index of `attr`'s dedicated float stream in planar mode.
///
/// Bone indices have no float stream; they live in the integer container.
pub(crate) fn planar_stream_index(attributes: AttributeSet, attr: Attribute) -> Option<usize> {
    if !attributes.contains(attr) || attr == Attribute::BoneIndices {
        return None;
    }
    Some(
        attributes
            .iter()
            .take_while(|a| *a != attr)
            .filter(|a| *a != Attribute::BoneIndices)
            .count(),
    )
}

/// Storage plan for one mesh's attribute set.
#[derive(Debug, Clone)]
pub struct StreamPlan {
    attributes: AttributeSet,
    interleave: bool,
    max_bones: usize,
    targets: [Option<StreamTarget>; Attribute::COUNT],
    float_streams: usize,
}

impl StreamPlan {
    pub fn new(attributes: AttributeSet, interleave: bool, max_bones: usize) -> Self {
        let mut targets = [None; Attribute::COUNT];
        let mut float_streams = 0;

        if interleave {
            if !attributes.is_empty() {
                float_streams = 1;
            }
            for attr in attributes.iter() {
                targets[attr as usize] = Some(StreamTarget::Float(0));
            }
        } else {
            for attr in attributes.iter() {
                let target = match planar_stream_index(attributes, attr) {
                    Some(index) => {
                        float_streams = float_streams.max(index + 1);
                        StreamTarget::Float(index)
                    }
                    None => StreamTarget::BoneIds,
                };
                targets[attr as usize] = Some(target);
            }
        }

        Self {
            attributes,
            interleave,
            max_bones,
            targets,
            float_streams,
        }
    }

    #[inline]
    pub fn target(&self, attr: Attribute) -> Option<StreamTarget> {
        self.targets[attr as usize]
    }

    #[inline]
    pub fn is_interleaved(&self) -> bool {
        self.interleave
    }

    #[inline]
    pub fn float_stream_count(&self) -> usize {
        self.float_streams
    }

    /// Elements per vertex in the interleaved stream (sum over all attributes).
    #[inline]
    pub fn interleaved_stride(&self) -> usize {
        self.attributes.vertex_stride(self.max_bones)
    }

    /// Allocate the mesh's containers with capacity reserved for
    /// `vertex_count` vertices.
    ///
    /// The reservation is an optimization hint, not a bound; emission appends
    /// and may grow past it.
    pub fn alloc_streams(&self, vertex_count: usize) -> (Vec<Vec<f32>>, Vec<i32>) {
        let mut streams = Vec::with_capacity(self.float_streams);
        let mut bone_ids = Vec::new();

        if self.interleave {
            if !self.attributes.is_empty() {
                streams.push(Vec::with_capacity(vertex_count * self.interleaved_stride()));
            }
        } else {
            for attr in self.attributes.iter() {
                match self.target(attr) {
                    Some(StreamTarget::Float(_)) => {
                        streams
                            .push(Vec::with_capacity(vertex_count * attr.element_count(self.max_bones)));
                    }
                    Some(StreamTarget::BoneIds) => {
                        bone_ids.reserve(vertex_count * self.max_bones);
                    }
                    None => {}
                }
            }
        }

        (streams, bone_ids)
    }
}
