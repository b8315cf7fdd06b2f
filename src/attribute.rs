//! Vertex attribute catalog.
//!
//! Every attribute a baked mesh can carry, with its per-vertex element count
//! and a compact set type whose iteration order is fixed to catalog order.
//! That order matters: it defines the field order inside interleaved streams.

use std::str::FromStr;

/// A semantic vertex attribute.
///
/// Declaration order is catalog order. Tangents and bitangents are one
/// attribute because source data supplies both together or neither.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Attribute {
    Position = 0,
    Normal = 1,
    TexCoord = 2,
    TangentBitangent = 3,
    BoneIndices = 4,
    BoneWeights = 5,
}

impl Attribute {
    /// All attributes in catalog order.
    pub const ALL: [Attribute; 6] = [
        Attribute::Position,
        Attribute::Normal,
        Attribute::TexCoord,
        Attribute::TangentBitangent,
        Attribute::BoneIndices,
        Attribute::BoneWeights,
    ];

    pub const COUNT: usize = Self::ALL.len();

    /// Elements this attribute contributes per vertex.
    ///
    /// Bone indices and weights scale with the configured influence budget.
    #[inline]
    pub const fn element_count(self, max_bones: usize) -> usize {
        match self {
            Attribute::Position => 3,
            Attribute::Normal => 3,
            Attribute::TexCoord => 2,
            Attribute::TangentBitangent => 6,
            Attribute::BoneIndices => max_bones,
            Attribute::BoneWeights => max_bones,
        }
    }

    #[inline]
    const fn bit(self) -> u8 {
        1 << self as u8
    }
}

impl FromStr for Attribute {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "position" => Ok(Attribute::Position),
            "normal" => Ok(Attribute::Normal),
            "texcoord" => Ok(Attribute::TexCoord),
            "tangent-bitangent" => Ok(Attribute::TangentBitangent),
            "bone-indices" => Ok(Attribute::BoneIndices),
            "bone-weights" => Ok(Attribute::BoneWeights),
            other => Err(format!("unknown attribute '{other}'")),
        }
    }
}

/// Set of attributes emitted for one mesh.
///
/// Stored as a bitmask; iteration always yields catalog order regardless of
/// insertion order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct AttributeSet(u8);

impl AttributeSet {
    pub const EMPTY: AttributeSet = AttributeSet(0);

    #[inline]
    pub fn contains(self, attr: Attribute) -> bool {
        self.0 & attr.bit() != 0
    }

    #[inline]
    pub fn insert(&mut self, attr: Attribute) {
        self.0 |= attr.bit();
    }

    #[inline]
    pub fn union(self, other: AttributeSet) -> AttributeSet {
        AttributeSet(self.0 | other.0)
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Attributes in catalog order.
    pub fn iter(self) -> impl Iterator<Item = Attribute> {
        Attribute::ALL.into_iter().filter(move |a| self.contains(*a))
    }

    /// Total elements per vertex across the set (the interleaved stride).
    pub fn vertex_stride(self, max_bones: usize) -> usize {
        self.iter().map(|a| a.element_count(max_bones)).sum()
    }

    /// Element offset of `attr` within an interleaved vertex, counting the
    /// catalog-order attributes that precede it in this set.
    pub fn offset_of(self, attr: Attribute, max_bones: usize) -> usize {
        self.iter()
            .take_while(|a| *a != attr)
            .map(|a| a.element_count(max_bones))
            .sum()
    }
}

impl FromIterator<Attribute> for AttributeSet {
    fn from_iter<I: IntoIterator<Item = Attribute>>(iter: I) -> Self {
        let mut set = AttributeSet::EMPTY;
        for attr in iter {
            set.insert(attr);
        }
        set
    }
}
