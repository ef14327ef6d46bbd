use crate::foundation::error::{MemeError, MemeResult};

pub use kurbo::{Affine, Point};

/// Pixel dimensions of a decoded source image, which are also the output dimensions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Number of bytes in a tightly packed RGBA8 buffer of this size.
    pub fn rgba8_len(self) -> MemeResult<usize> {
        (self.width as usize)
            .checked_mul(self.height as usize)
            .and_then(|v| v.checked_mul(4))
            .ok_or_else(|| MemeError::validation("canvas byte size overflows usize"))
    }

    /// Dimensions as the `u16` pair the CPU rasterizer addresses.
    pub(crate) fn to_u16(self) -> MemeResult<(u16, u16)> {
        let w: u16 = self.width.try_into().map_err(|_| {
            MemeError::validation(format!("image width {} exceeds 65535", self.width))
        })?;
        let h: u16 = self.height.try_into().map_err(|_| {
            MemeError::validation(format!("image height {} exceeds 65535", self.height))
        })?;
        Ok((w, h))
    }

    /// Horizontal center in pixels.
    pub fn center_x(self) -> f64 {
        f64::from(self.width) / 2.0
    }
}

/// Premultiplied RGBA8 (r,g,b already multiplied by a).
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgba8Premul {
    /// Red channel premultiplied by alpha.
    pub r: u8,
    /// Green channel premultiplied by alpha.
    pub g: u8,
    /// Blue channel premultiplied by alpha.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Rgba8Premul {
    /// Fully transparent black.
    pub fn transparent() -> Self {
        Self {
            r: 0,
            g: 0,
            b: 0,
            a: 0,
        }
    }

    /// Convert straight-alpha RGBA8 into premultiplied RGBA8.
    pub fn from_straight_rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        use crate::foundation::math::mul_div255_u8;

        Self {
            r: mul_div255_u8(r, a),
            g: mul_div255_u8(g, a),
            b: mul_div255_u8(b, a),
            a,
        }
    }

    /// Channels as `[r, g, b, a]`.
    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
