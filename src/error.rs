//! Load failure kinds.
//!
//! Exactly two things can fail: decoding an image and importing a scene.
//! Everything downstream of a successful import is total; missing attributes
//! fall back to zeros and influence overflow truncates silently.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    /// Image bytes were unreadable or in an unsupported format.
    #[error("failed to decode image {}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Scene file unreadable, incomplete, or missing a root scene.
    ///
    /// `source` is `None` when the file parsed but contains no scene to walk.
    #[error("failed to import scene {}", path.display())]
    Import {
        path: PathBuf,
        #[source]
        source: Option<gltf::Error>,
    },
}
