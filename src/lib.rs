//! Bakes parsed 3D scenes into flat, GPU-ready vertex and index buffers.
//!
//! A scene file is imported into a [`Scene`], then every mesh is assembled
//! into contiguous vertex streams: either one interleaved stream carrying all
//! attributes per vertex, or one stream per attribute. Skinned meshes get a
//! bounded number of bone influences per vertex, resolved against a
//! model-wide bone table. Image decoding rides along for texture sources.
//!
//! ```no_run
//! use mesh_bake::{load_model, ModelSettings};
//!
//! let model = load_model("character.gltf", &ModelSettings::default())?;
//! for mesh in &model.meshes {
//!     let bytes = mesh.stream_bytes(0);
//!     // upload bytes, mesh.index_bytes() ...
//! }
//! # Ok::<(), mesh_bake::LoadError>(())
//! ```

mod assemble;
pub mod attribute;
pub mod bones;
pub mod error;
mod gltf;
pub mod image;
pub mod layout;
pub mod model;
pub mod scene;

pub use attribute::{Attribute, AttributeSet};
pub use bones::{bone_index_from_f32, bone_index_to_f32, BoneInfo, NO_BONE};
pub use error::LoadError;
pub use image::{load_image, Image, ImageSettings};
pub use layout::{StreamPlan, StreamTarget};
pub use model::{bake_scene, load_model, Mesh, Model, ModelSettings};
pub use scene::{Scene, SceneBone, SceneMesh};
