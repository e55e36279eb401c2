// Decoder — turns raw file bytes into a decoded image
//
// Both adapters read files themselves and hand the bytes to an `ImageDecoder`.
// The default implementation lets the `image` crate guess the format from the
// magic bytes, so the file extension only matters for enumeration.

use std::fs;
use std::path::Path;

use image::DynamicImage;
use marten_core::{Error, Result};

/// Decodes an in-memory byte stream into an image.
pub trait ImageDecoder: Send + Sync {
    /// Decode `bytes`. `path` is only used to label errors.
    fn decode(&self, path: &Path, bytes: &[u8]) -> Result<DynamicImage>;
}

/// Decoder backed by [`image::load_from_memory`].
///
/// Every image comes back as 8-bit RGB whatever the file stores, so luma,
/// alpha and 16-bit files all yield three channels.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultDecoder;

impl ImageDecoder for DefaultDecoder {
    fn decode(&self, path: &Path, bytes: &[u8]) -> Result<DynamicImage> {
        let img = image::load_from_memory(bytes).map_err(|e| Error::Decode {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(match img {
            DynamicImage::ImageRgb8(_) => img,
            other => DynamicImage::ImageRgb8(other.to_rgb8()),
        })
    }
}

/// Read the whole file at `path` into memory.
pub fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| Error::io(path, e))
}

/// Read the file at `path` and decode it.
pub fn read_and_decode(decoder: &dyn ImageDecoder, path: &Path) -> Result<DynamicImage> {
    let bytes = read_bytes(path)?;
    decoder.decode(path, &bytes)
}
