use crate::foundation::core::Canvas;
use crate::foundation::error::{MemeError, MemeResult};

/// Decoded source raster: straight-alpha RGBA8, row-major, tightly packed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedImage {
    /// Pixel dimensions as decoded (no scaling or cropping).
    pub canvas: Canvas,
    /// Straight (unpremultiplied) RGBA8 pixels.
    pub rgba8: Vec<u8>,
}

/// Decode raster bytes, sniffing the format from content.
///
/// Empty payloads, unknown formats, corrupt data, and zero-area images are all
/// [`MemeError::ImageAcquisition`].
pub fn decode_image(bytes: &[u8]) -> MemeResult<DecodedImage> {
    if bytes.is_empty() {
        return Err(MemeError::image_acquisition("image payload is empty"));
    }

    let dyn_img = image::load_from_memory(bytes)
        .map_err(|e| MemeError::image_acquisition(format!("decode image from memory: {e}")))?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        return Err(MemeError::image_acquisition(format!(
            "decoded image has zero area ({width}x{height})"
        )));
    }

    Ok(DecodedImage {
        canvas: Canvas { width, height },
        rgba8: rgba.into_raw(),
    })
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
