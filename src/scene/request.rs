use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::assets::color::Color;
use crate::assets::source::ImageSource;
use crate::effects::filter::Filter;
use crate::foundation::core::Affine;
use crate::foundation::error::{MemeError, MemeResult};

/// Everything needed for one render. Built fresh per call and never mutated by the engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RenderRequest {
    /// Base image reference or bytes.
    pub image_source: ImageSource,
    /// Caption anchored to the top edge.
    #[serde(default)]
    pub top_band: Option<TextBand>,
    /// Caption anchored to the bottom edge.
    #[serde(default)]
    pub bottom_band: Option<TextBand>,
    /// Whole-image filter applied before any caption.
    #[serde(default)]
    pub filter: Filter,
}

impl RenderRequest {
    /// Request with no captions and no filter.
    pub fn new(image_source: ImageSource) -> Self {
        Self {
            image_source,
            top_band: None,
            bottom_band: None,
            filter: Filter::none(),
        }
    }

    /// Set the top caption.
    pub fn with_top(mut self, band: TextBand) -> Self {
        self.top_band = Some(band);
        self
    }

    /// Set the bottom caption.
    pub fn with_bottom(mut self, band: TextBand) -> Self {
        self.bottom_band = Some(band);
        self
    }

    /// Set the base-image filter.
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    /// Bands that will actually be drawn, in draw order (top first). Empty text is skipped.
    pub fn drawable_bands(&self) -> impl Iterator<Item = (BandEdge, &TextBand)> {
        [
            (BandEdge::Top, self.top_band.as_ref()),
            (BandEdge::Bottom, self.bottom_band.as_ref()),
        ]
        .into_iter()
        .filter_map(|(edge, band)| band.filter(|b| !b.is_empty()).map(|b| (edge, b)))
    }

    /// Check every input that does not depend on the image.
    ///
    /// Runs before acquisition so permanently invalid requests fail without any I/O.
    pub fn validate(&self) -> MemeResult<()> {
        self.filter.validate()?;
        for (edge, band) in self.drawable_bands() {
            band.validate()
                .map_err(|e| with_band_context(e, edge))?;
        }
        Ok(())
    }
}

fn with_band_context(err: MemeError, edge: BandEdge) -> MemeError {
    match err {
        MemeError::InvalidTransform(m) => MemeError::InvalidTransform(format!("{edge} band: {m}")),
        MemeError::Validation(m) => MemeError::Validation(format!("{edge} band: {m}")),
        other => other,
    }
}

/// Which image edge a band's `position_percent` is measured from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BandEdge {
    /// Distance measured down from the top edge.
    Top,
    /// Distance measured up from the bottom edge.
    Bottom,
}

impl fmt::Display for BandEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Top => "top",
            Self::Bottom => "bottom",
        })
    }
}

/// One caption overlay.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextBand {
    /// Caption text. Empty means "no band". `\n` starts a new line.
    pub text: String,
    /// Font size in pixels; also sets the outline width (`font_size_px / 20`).
    pub font_size_px: f32,
    /// Glyph fill color.
    #[serde(default = "default_fill")]
    pub fill_color: Color,
    /// Glyph outline color.
    #[serde(default = "default_stroke")]
    pub stroke_color: Color,
    /// Distance of the anchor from the band's edge, as a percentage of image height.
    pub position_percent: f32,
    /// Affine transform scoped to this band's draw calls.
    #[serde(default)]
    pub transform: Transform,
}

fn default_fill() -> Color {
    Color::WHITE
}

fn default_stroke() -> Color {
    Color::BLACK
}

impl TextBand {
    /// White text with a black outline, untransformed.
    pub fn new(text: impl Into<String>, font_size_px: f32, position_percent: f32) -> Self {
        Self {
            text: text.into(),
            font_size_px,
            fill_color: default_fill(),
            stroke_color: default_stroke(),
            position_percent,
            transform: Transform::Identity,
        }
    }

    /// Set fill and stroke colors.
    pub fn with_colors(mut self, fill: Color, stroke: Color) -> Self {
        self.fill_color = fill;
        self.stroke_color = stroke;
        self
    }

    /// Set the band transform.
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// `true` when the band has nothing to draw.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Outline width in pixels.
    pub fn stroke_width_px(&self) -> f64 {
        f64::from(self.font_size_px) / 20.0
    }

    /// Range-check the band's numeric inputs and its transform.
    pub fn validate(&self) -> MemeResult<()> {
        if !self.font_size_px.is_finite() || self.font_size_px <= 0.0 {
            return Err(MemeError::validation(format!(
                "font_size_px must be finite and > 0, got {}",
                self.font_size_px
            )));
        }
        if !self.position_percent.is_finite() || !(0.0..=100.0).contains(&self.position_percent) {
            return Err(MemeError::validation(format!(
                "position_percent must be within 0..=100, got {}",
                self.position_percent
            )));
        }
        self.transform.validate()
    }
}

/// Band-scoped affine transform.
///
/// Matrix order is the canvas one: `[a, b, c, d, e, f]` maps `(x, y)` to
/// `(a*x + c*y + e, b*x + d*y + f)`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Transform {
    /// No transform.
    #[default]
    Identity,
    /// Explicit 2x3 matrix.
    Matrix([f64; 6]),
}

impl Transform {
    /// Validated matrix. Non-finite components are [`MemeError::InvalidTransform`].
    pub fn matrix(coeffs: [f64; 6]) -> MemeResult<Self> {
        let t = Self::Matrix(coeffs);
        t.validate()?;
        Ok(t)
    }

    /// Parse `"none"` or six whitespace/comma separated numbers.
    pub fn parse(s: &str) -> MemeResult<Self> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("none") {
            return Ok(Self::Identity);
        }

        let parts: Vec<&str> = s
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|p| !p.is_empty())
            .collect();
        if parts.len() != 6 {
            return Err(MemeError::invalid_transform(format!(
                "expected 6 numbers, got {} in {s:?}",
                parts.len()
            )));
        }

        let mut coeffs = [0.0f64; 6];
        for (slot, part) in coeffs.iter_mut().zip(&parts) {
            *slot = part.parse().map_err(|_| {
                MemeError::invalid_transform(format!("invalid number \"{part}\" in {s:?}"))
            })?;
        }
        Self::matrix(coeffs)
    }

    /// Reject non-finite matrix components.
    pub fn validate(&self) -> MemeResult<()> {
        if let Self::Matrix(m) = self
            && let Some(bad) = m.iter().find(|v| !v.is_finite())
        {
            return Err(MemeError::invalid_transform(format!(
                "matrix component {bad} is not finite"
            )));
        }
        Ok(())
    }

    /// `true` for [`Transform::Identity`] and for a matrix equal to the identity.
    pub fn is_identity(&self) -> bool {
        match self {
            Self::Identity => true,
            Self::Matrix(m) => *m == [1.0, 0.0, 0.0, 1.0, 0.0, 0.0],
        }
    }

    /// As a `kurbo` affine (same coefficient order).
    pub fn to_affine(&self) -> Affine {
        match self {
            Self::Identity => Affine::IDENTITY,
            Self::Matrix(m) => Affine::new(*m),
        }
    }
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identity => f.write_str("none"),
            Self::Matrix([a, b, c, d, e, g]) => write!(f, "{a} {b} {c} {d} {e} {g}"),
        }
    }
}

impl FromStr for Transform {
    type Err = MemeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Transform {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Transform {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Text(String),
            Arr(Vec<f64>),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Text(s) => Self::parse(&s).map_err(serde::de::Error::custom),
            Repr::Arr(v) => {
                let coeffs: [f64; 6] = v.as_slice().try_into().map_err(|_| {
                    serde::de::Error::custom(MemeError::invalid_transform(format!(
                        "expected 6 numbers, got {}",
                        v.len()
                    )))
                })?;
                Self::matrix(coeffs).map_err(serde::de::Error::custom)
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/request.rs"]
mod tests;
