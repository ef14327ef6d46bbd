use crate::foundation::core::Canvas;
use crate::foundation::error::{MemeError, MemeResult};
use crate::foundation::math::unpremultiply_rgba8_in_place;

/// The flattened output of one render.
///
/// Pixels are **premultiplied** RGBA8, tightly packed, row-major, with exactly the source image's
/// dimensions. The buffer cannot be modified once produced.
#[derive(Clone, PartialEq, Eq)]
pub struct RenderedImage {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl std::fmt::Debug for RenderedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderedImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.data.len())
            .finish()
    }
}

impl RenderedImage {
    pub(crate) fn new(canvas: Canvas, data: Vec<u8>) -> MemeResult<Self> {
        if data.len() != canvas.rgba8_len()? {
            return Err(MemeError::render(format!(
                "output buffer has {} bytes, expected {}x{}x4",
                data.len(),
                canvas.width,
                canvas.height
            )));
        }
        Ok(Self {
            width: canvas.width,
            height: canvas.height,
            data,
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Premultiplied RGBA8 bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Premultiplied `[r, g, b, a]` at `(x, y)`, or `None` outside the image.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        self.data
            .get(i..i + 4)
            .map(|p| [p[0], p[1], p[2], p[3]])
    }

    /// Give up ownership of the premultiplied bytes.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Straight-alpha copy for encoders (PNG, JPEG, ...).
    pub fn to_rgba_image(&self) -> MemeResult<image::RgbaImage> {
        let mut straight = self.data.clone();
        unpremultiply_rgba8_in_place(&mut straight);
        image::RgbaImage::from_raw(self.width, self.height, straight)
            .ok_or_else(|| MemeError::render("output buffer does not match its dimensions"))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/frame.rs"]
mod tests;
