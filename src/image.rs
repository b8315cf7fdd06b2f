//! Image loading.
//!
//! Decoding delegates entirely to the `image` crate; this module only fixes
//! row order and hands back the raw pixel buffer with its native channel
//! count.

use std::path::Path;

use crate::error::LoadError;

/// Settings for [`load_image`].
#[derive(Debug, Clone)]
pub struct ImageSettings {
    /// Flip rows so the first pixel is the bottom-left one, as GL samplers
    /// expect.
    pub flip_vertically: bool,
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self {
            flip_vertically: true,
        }
    }
}

/// A decoded image. Dropping it releases the pixel buffer.
#[derive(Debug, Clone)]
pub struct Image {
    pub width: u32,
    pub height: u32,
    /// Channels per pixel as stored in the source (1, 2, 3 or 4).
    pub color_channels: u8,
    /// `width * height * color_channels` bytes, row-major.
    pub pixel_data: Vec<u8>,
}

/// Decode an image file (PNG, JPEG) into a raw pixel buffer.
///
/// The source's channel count is preserved where the decoder exposes it
/// directly; exotic bit depths are converted to 8-bit RGBA.
pub fn load_image(path: impl AsRef<Path>, settings: &ImageSettings) -> Result<Image, LoadError> {
    let path = path.as_ref();
    let decoded = image::open(path).map_err(|source| LoadError::Decode {
        path: path.to_path_buf(),
        source,
    })?;

    let decoded = if settings.flip_vertically {
        decoded.flipv()
    } else {
        decoded
    };

    let (width, height, color_channels, pixel_data) = match decoded {
        image::DynamicImage::ImageLuma8(buf) => {
            let (w, h) = buf.dimensions();
            (w, h, 1, buf.into_raw())
        }
        image::DynamicImage::ImageLumaA8(buf) => {
            let (w, h) = buf.dimensions();
            (w, h, 2, buf.into_raw())
        }
        image::DynamicImage::ImageRgb8(buf) => {
            let (w, h) = buf.dimensions();
            (w, h, 3, buf.into_raw())
        }
        image::DynamicImage::ImageRgba8(buf) => {
            let (w, h) = buf.dimensions();
            (w, h, 4, buf.into_raw())
        }
        other => {
            let buf = other.to_rgba8();
            let (w, h) = buf.dimensions();
            (w, h, 4, buf.into_raw())
        }
    };

    tracing::debug!(
        "Decoded {}: {}x{}, {} channel(s)",
        path.display(),
        width,
        height,
        color_channels
    );

    Ok(Image {
        width,
        height,
        color_channels,
        pixel_data,
    })
}
