//! Whole-image filters applied to the base image before any caption is drawn.
//!
//! The accepted syntax is the CSS `filter` property subset a browser canvas understands,
//! e.g. `"grayscale(100%)"`, `"sepia(0.5) brightness(120%)"`, or `"none"`. Color-matrix
//! coefficients follow the Filter Effects Module Level 1 definitions and run on straight
//! (unpremultiplied) sRGB values.

use std::fmt;
use std::str::FromStr;

use crate::assets::decode::DecodedImage;
use crate::effects::blur::gaussian_blur_premul;
use crate::foundation::error::{MemeError, MemeResult};
use crate::foundation::math::{
    clamp_unit_to_u8, premultiply_rgba8_in_place, unpremultiply_rgba8_in_place,
};

/// Supported filter functions and the argument a bare name implies.
pub const FILTER_FUNCTIONS: &[(&str, &str)] = &[
    ("grayscale", "100%"),
    ("sepia", "100%"),
    ("saturate", "100%"),
    ("hue-rotate", "0deg"),
    ("invert", "100%"),
    ("brightness", "100%"),
    ("contrast", "100%"),
    ("opacity", "100%"),
    ("blur", "0px"),
];

/// One filter function with its resolved argument.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FilterOp {
    /// Desaturate toward luminance; amount in `0..=1`.
    Grayscale(f32),
    /// Sepia tone; amount in `0..=1`.
    Sepia(f32),
    /// Saturation multiplier, `>= 0`.
    Saturate(f32),
    /// Hue rotation in degrees.
    HueRotate(f32),
    /// Channel inversion; amount in `0..=1`.
    Invert(f32),
    /// Linear brightness multiplier, `>= 0`.
    Brightness(f32),
    /// Contrast around mid-gray, `>= 0`.
    Contrast(f32),
    /// Alpha multiplier; amount in `0..=1`.
    Opacity(f32),
    /// Gaussian blur standard deviation in pixels, `>= 0`.
    Blur(f32),
}

/// An ordered chain of filter functions. The empty chain is `none`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Filter {
    ops: Vec<FilterOp>,
}

impl Filter {
    /// The identity filter (pure copy).
    pub fn none() -> Self {
        Self::default()
    }

    /// Chain from already-resolved ops. Arguments are range-checked.
    pub fn from_ops(ops: Vec<FilterOp>) -> MemeResult<Self> {
        for op in &ops {
            op.validate()?;
        }
        Ok(Self { ops })
    }

    /// Parse CSS filter syntax. Unknown names and malformed arguments are
    /// [`MemeError::InvalidFilter`].
    pub fn parse(s: &str) -> MemeResult<Self> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("none") {
            return Ok(Self::none());
        }

        let mut ops = Vec::new();
        let mut rest = s;
        while !rest.is_empty() {
            let name_len = rest
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-'))
                .unwrap_or(rest.len());
            if name_len == 0 {
                return Err(MemeError::invalid_filter(format!(
                    "unexpected character in {s:?}"
                )));
            }
            let name = rest[..name_len].to_ascii_lowercase();
            rest = rest[name_len..].trim_start();

            let arg = if let Some(after_open) = rest.strip_prefix('(') {
                let close = after_open.find(')').ok_or_else(|| {
                    MemeError::invalid_filter(format!("unclosed '(' after \"{name}\" in {s:?}"))
                })?;
                let arg = after_open[..close].trim();
                rest = after_open[close + 1..].trim_start();
                Some(arg)
            } else {
                None
            };

            if name == "none" {
                return Err(MemeError::invalid_filter(
                    "\"none\" cannot be combined with other filters",
                ));
            }
            ops.push(parse_op(&name, arg)?);
        }
        Ok(Self { ops })
    }

    /// Filter functions in application order.
    pub fn ops(&self) -> &[FilterOp] {
        &self.ops
    }

    /// `true` for the identity filter.
    pub fn is_none(&self) -> bool {
        self.ops.is_empty()
    }

    /// Range-check every op. Values built through [`Filter::parse`] always pass.
    pub fn validate(&self) -> MemeResult<()> {
        self.ops.iter().try_for_each(FilterOp::validate)
    }

    /// Run the chain over a decoded base image and return premultiplied RGBA8 for the
    /// rasterizer. The source image is left untouched.
    pub(crate) fn apply_premul(&self, image: &DecodedImage) -> MemeResult<Vec<u8>> {
        self.validate()?;
        let mut px = image.rgba8.clone();
        for op in &self.ops {
            match *op {
                FilterOp::Blur(sigma) => {
                    premultiply_rgba8_in_place(&mut px);
                    px = gaussian_blur_premul(&px, image.canvas, sigma)?;
                    unpremultiply_rgba8_in_place(&mut px);
                }
                FilterOp::Opacity(a) => {
                    for p in px.chunks_exact_mut(4) {
                        p[3] = clamp_unit_to_u8(f32::from(p[3]) / 255.0 * a);
                    }
                }
                _ => {
                    let (m, offset) = op.color_matrix();
                    apply_color_matrix(&mut px, &m, offset);
                }
            }
        }
        premultiply_rgba8_in_place(&mut px);
        Ok(px)
    }
}

impl FilterOp {
    fn validate(&self) -> MemeResult<()> {
        let (name, v) = (self.name(), self.arg());
        if !v.is_finite() {
            return Err(MemeError::invalid_filter(format!(
                "{name} argument must be finite"
            )));
        }
        let bounded = matches!(
            self,
            Self::Grayscale(_) | Self::Sepia(_) | Self::Invert(_) | Self::Opacity(_)
        );
        if !matches!(self, Self::HueRotate(_)) && v < 0.0 {
            return Err(MemeError::invalid_filter(format!(
                "{name} argument must be >= 0"
            )));
        }
        if bounded && v > 1.0 {
            return Err(MemeError::invalid_filter(format!(
                "{name} amount must be <= 1 (100%)"
            )));
        }
        Ok(())
    }

    /// CSS function name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Grayscale(_) => "grayscale",
            Self::Sepia(_) => "sepia",
            Self::Saturate(_) => "saturate",
            Self::HueRotate(_) => "hue-rotate",
            Self::Invert(_) => "invert",
            Self::Brightness(_) => "brightness",
            Self::Contrast(_) => "contrast",
            Self::Opacity(_) => "opacity",
            Self::Blur(_) => "blur",
        }
    }

    fn arg(&self) -> f32 {
        match *self {
            Self::Grayscale(v)
            | Self::Sepia(v)
            | Self::Saturate(v)
            | Self::HueRotate(v)
            | Self::Invert(v)
            | Self::Brightness(v)
            | Self::Contrast(v)
            | Self::Opacity(v)
            | Self::Blur(v) => v,
        }
    }

    /// Row-major 3x3 RGB matrix plus a per-channel offset.
    fn color_matrix(&self) -> ([[f32; 3]; 3], f32) {
        match *self {
            Self::Grayscale(a) => {
                let s = 1.0 - a;
                (
                    [
                        [0.2126 + 0.7874 * s, 0.7152 - 0.7152 * s, 0.0722 - 0.0722 * s],
                        [0.2126 - 0.2126 * s, 0.7152 + 0.2848 * s, 0.0722 - 0.0722 * s],
                        [0.2126 - 0.2126 * s, 0.7152 - 0.7152 * s, 0.0722 + 0.9278 * s],
                    ],
                    0.0,
                )
            }
            Self::Sepia(a) => {
                let s = 1.0 - a;
                (
                    [
                        [0.393 + 0.607 * s, 0.769 - 0.769 * s, 0.189 - 0.189 * s],
                        [0.349 - 0.349 * s, 0.686 + 0.314 * s, 0.168 - 0.168 * s],
                        [0.272 - 0.272 * s, 0.534 - 0.534 * s, 0.131 + 0.869 * s],
                    ],
                    0.0,
                )
            }
            Self::Saturate(s) => (
                [
                    [0.213 + 0.787 * s, 0.715 - 0.715 * s, 0.072 - 0.072 * s],
                    [0.213 - 0.213 * s, 0.715 + 0.285 * s, 0.072 - 0.072 * s],
                    [0.213 - 0.213 * s, 0.715 - 0.715 * s, 0.072 + 0.928 * s],
                ],
                0.0,
            ),
            Self::HueRotate(deg) => {
                let (sin, cos) = deg.to_radians().sin_cos();
                (
                    [
                        [
                            0.213 + cos * 0.787 - sin * 0.213,
                            0.715 - cos * 0.715 - sin * 0.715,
                            0.072 - cos * 0.072 + sin * 0.928,
                        ],
                        [
                            0.213 - cos * 0.213 + sin * 0.143,
                            0.715 + cos * 0.285 + sin * 0.140,
                            0.072 - cos * 0.072 - sin * 0.283,
                        ],
                        [
                            0.213 - cos * 0.213 - sin * 0.787,
                            0.715 - cos * 0.715 + sin * 0.715,
                            0.072 + cos * 0.928 + sin * 0.072,
                        ],
                    ],
                    0.0,
                )
            }
            Self::Invert(a) => (diagonal(1.0 - 2.0 * a), a),
            Self::Brightness(b) => (diagonal(b), 0.0),
            Self::Contrast(c) => (diagonal(c), 0.5 - 0.5 * c),
            Self::Opacity(_) | Self::Blur(_) => (diagonal(1.0), 0.0),
        }
    }
}

fn diagonal(v: f32) -> [[f32; 3]; 3] {
    [[v, 0.0, 0.0], [0.0, v, 0.0], [0.0, 0.0, v]]
}

fn apply_color_matrix(px: &mut [u8], m: &[[f32; 3]; 3], offset: f32) {
    for p in px.chunks_exact_mut(4) {
        let rgb = [
            f32::from(p[0]) / 255.0,
            f32::from(p[1]) / 255.0,
            f32::from(p[2]) / 255.0,
        ];
        for (c, row) in m.iter().enumerate() {
            let v = row[0] * rgb[0] + row[1] * rgb[1] + row[2] * rgb[2] + offset;
            p[c] = clamp_unit_to_u8(v);
        }
    }
}

fn parse_op(name: &str, arg: Option<&str>) -> MemeResult<FilterOp> {
    let default_arg = FILTER_FUNCTIONS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, d)| *d)
        .ok_or_else(|| MemeError::invalid_filter(format!("unknown filter \"{name}\"")))?;
    let arg = match arg {
        Some(a) if !a.is_empty() => a,
        _ => default_arg,
    };

    let op = match name {
        "grayscale" => FilterOp::Grayscale(parse_amount(name, arg)?),
        "sepia" => FilterOp::Sepia(parse_amount(name, arg)?),
        "saturate" => FilterOp::Saturate(parse_amount(name, arg)?),
        "invert" => FilterOp::Invert(parse_amount(name, arg)?),
        "brightness" => FilterOp::Brightness(parse_amount(name, arg)?),
        "contrast" => FilterOp::Contrast(parse_amount(name, arg)?),
        "opacity" => FilterOp::Opacity(parse_amount(name, arg)?),
        "hue-rotate" => FilterOp::HueRotate(parse_angle(arg)?),
        "blur" => FilterOp::Blur(parse_length(arg)?),
        _ => {
            return Err(MemeError::invalid_filter(format!(
                "unknown filter \"{name}\""
            )));
        }
    };

    // CSS clamps these amounts rather than rejecting them.
    let op = match op {
        FilterOp::Grayscale(v) => FilterOp::Grayscale(v.min(1.0)),
        FilterOp::Sepia(v) => FilterOp::Sepia(v.min(1.0)),
        FilterOp::Invert(v) => FilterOp::Invert(v.min(1.0)),
        FilterOp::Opacity(v) => FilterOp::Opacity(v.min(1.0)),
        other => other,
    };
    op.validate()?;
    Ok(op)
}

fn parse_f32(tok: &str, what: &str) -> MemeResult<f32> {
    let v: f32 = tok
        .trim()
        .parse()
        .map_err(|_| MemeError::invalid_filter(format!("invalid {what} \"{tok}\"")))?;
    if !v.is_finite() {
        return Err(MemeError::invalid_filter(format!(
            "non-finite {what} \"{tok}\""
        )));
    }
    Ok(v)
}

fn parse_amount(name: &str, arg: &str) -> MemeResult<f32> {
    let v = match arg.strip_suffix('%') {
        Some(p) => parse_f32(p, "percentage")? / 100.0,
        None => parse_f32(arg, "amount")?,
    };
    if v < 0.0 {
        return Err(MemeError::invalid_filter(format!(
            "{name} amount must be >= 0"
        )));
    }
    Ok(v)
}

fn parse_angle(arg: &str) -> MemeResult<f32> {
    const UNITS: &[(&str, f32)] = &[
        ("deg", 1.0),
        ("grad", 0.9),
        ("rad", 180.0 / std::f32::consts::PI),
        ("turn", 360.0),
    ];
    for (unit, scale) in UNITS {
        if let Some(v) = arg.strip_suffix(unit) {
            return Ok(parse_f32(v, "angle")? * scale);
        }
    }
    let v = parse_f32(arg, "angle")?;
    if v != 0.0 {
        return Err(MemeError::invalid_filter(format!(
            "hue-rotate angle \"{arg}\" needs a unit (deg, rad, grad, turn)"
        )));
    }
    Ok(0.0)
}

fn parse_length(arg: &str) -> MemeResult<f32> {
    let v = match arg.strip_suffix("px") {
        Some(v) => parse_f32(v, "length")?,
        None => parse_f32(arg, "length")?,
    };
    if v < 0.0 {
        return Err(MemeError::invalid_filter("blur radius must be >= 0"));
    }
    Ok(v)
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ops.is_empty() {
            return f.write_str("none");
        }
        for (i, op) in self.ops.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            match op {
                FilterOp::HueRotate(v) => write!(f, "hue-rotate({v}deg)")?,
                FilterOp::Blur(v) => write!(f, "blur({v}px)")?,
                other => write!(f, "{}({})", other.name(), other.arg())?,
            }
        }
        Ok(())
    }
}

impl FromStr for Filter {
    type Err = MemeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl serde::Serialize for Filter {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for Filter {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = <String as serde::Deserialize>::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/filter.rs"]
mod tests;
