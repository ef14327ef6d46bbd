use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::foundation::core::Rgba8Premul;
use crate::foundation::error::{MemeError, MemeResult};

/// Straight-alpha sRGB color used for caption fill and stroke.
///
/// Parses the CSS forms a caption editor hands over: `#rgb`, `#rgba`, `#rrggbb`,
/// `#rrggbbaa`, `rgb()`/`rgba()`, `hsl()`/`hsla()`, `transparent`, and common named colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel (255 = opaque).
    pub a: u8,
}

impl Color {
    /// Opaque white.
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    /// Opaque black.
    pub const BLACK: Self = Self::rgb(0, 0, 0);

    /// Opaque color from channels.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Color from channels including alpha.
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse a CSS color string.
    pub fn parse(s: &str) -> MemeResult<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(MemeError::validation("color string is empty"));
        }
        let lower = s.to_ascii_lowercase();

        if let Some(hex) = lower.strip_prefix('#') {
            return parse_hex(hex).map_err(|e| MemeError::validation(format!("{s:?}: {e}")));
        }
        if let Some((name, args)) = split_function(&lower) {
            let parsed = match name {
                "rgb" | "rgba" => parse_rgb_args(args),
                "hsl" | "hsla" => parse_hsl_args(args),
                _ => Err(format!("unknown color function \"{name}\"")),
            };
            return parsed.map_err(|e| MemeError::validation(format!("{s:?}: {e}")));
        }
        named(&lower).ok_or_else(|| MemeError::validation(format!("unknown color {s:?}")))
    }

    /// `true` when fully transparent; such paints are skipped at draw time.
    pub fn is_transparent(self) -> bool {
        self.a == 0
    }

    /// Premultiplied representation.
    pub fn to_premul(self) -> Rgba8Premul {
        Rgba8Premul::from_straight_rgba(self.r, self.g, self.b, self.a)
    }

    pub(crate) fn to_cpu(self) -> vello_cpu::peniko::Color {
        vello_cpu::peniko::Color::from_rgba8(self.r, self.g, self.b, self.a)
    }

    /// `#rrggbbaa` form, which [`Color::parse`] reads back.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
    }
}

impl FromStr for Color {
    type Err = MemeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Color {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Css(String),
            Arr(Vec<u8>),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Css(s) => Self::parse(&s).map_err(serde::de::Error::custom),
            Repr::Arr(v) => match v.as_slice() {
                [r, g, b] => Ok(Self::rgb(*r, *g, *b)),
                [r, g, b, a] => Ok(Self::rgba(*r, *g, *b, *a)),
                _ => Err(serde::de::Error::custom(
                    "color array must have len 3 ([r,g,b]) or 4 ([r,g,b,a])",
                )),
            },
        }
    }
}

fn split_function(s: &str) -> Option<(&str, &str)> {
    let open = s.find('(')?;
    let inner = s[open + 1..].strip_suffix(')')?;
    Some((s[..open].trim(), inner))
}

fn parse_hex(s: &str) -> Result<Color, String> {
    fn nibble(c: u8) -> Result<u8, String> {
        (c as char)
            .to_digit(16)
            .map(|d| d as u8)
            .ok_or_else(|| format!("invalid hex digit '{}'", c as char))
    }

    let bytes = s.as_bytes();
    let digits = bytes
        .iter()
        .map(|&c| nibble(c))
        .collect::<Result<Vec<u8>, String>>()?;

    match digits.as_slice() {
        [r, g, b] => Ok(Color::rgb(r * 17, g * 17, b * 17)),
        [r, g, b, a] => Ok(Color::rgba(r * 17, g * 17, b * 17, a * 17)),
        [r1, r2, g1, g2, b1, b2] => Ok(Color::rgb(r1 << 4 | r2, g1 << 4 | g2, b1 << 4 | b2)),
        [r1, r2, g1, g2, b1, b2, a1, a2] => Ok(Color::rgba(
            r1 << 4 | r2,
            g1 << 4 | g2,
            b1 << 4 | b2,
            a1 << 4 | a2,
        )),
        _ => Err("hex color must have 3, 4, 6, or 8 digits".to_owned()),
    }
}

fn split_args(args: &str) -> Vec<&str> {
    args.split(|c: char| c == ',' || c == '/' || c.is_whitespace())
        .filter(|p| !p.is_empty())
        .collect()
}

fn parse_number(tok: &str) -> Result<f64, String> {
    let v: f64 = tok
        .parse()
        .map_err(|_| format!("invalid number \"{tok}\""))?;
    if !v.is_finite() {
        return Err(format!("non-finite number \"{tok}\""));
    }
    Ok(v)
}

/// Alpha as `0..=1` or percent.
fn parse_alpha(tok: &str) -> Result<f64, String> {
    match tok.strip_suffix('%') {
        Some(p) => Ok((parse_number(p)? / 100.0).clamp(0.0, 1.0)),
        None => Ok(parse_number(tok)?.clamp(0.0, 1.0)),
    }
}

fn unit_to_u8(v: f64) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn parse_rgb_args(args: &str) -> Result<Color, String> {
    let parts = split_args(args);
    if parts.len() != 3 && parts.len() != 4 {
        return Err(format!("rgb() takes 3 or 4 arguments, got {}", parts.len()));
    }

    let channel = |tok: &str| -> Result<u8, String> {
        match tok.strip_suffix('%') {
            Some(p) => Ok(unit_to_u8(parse_number(p)? / 100.0)),
            None => Ok(parse_number(tok)?.clamp(0.0, 255.0).round() as u8),
        }
    };

    let a = match parts.get(3) {
        Some(tok) => unit_to_u8(parse_alpha(tok)?),
        None => 255,
    };
    Ok(Color::rgba(
        channel(parts[0])?,
        channel(parts[1])?,
        channel(parts[2])?,
        a,
    ))
}

fn parse_hsl_args(args: &str) -> Result<Color, String> {
    let parts = split_args(args);
    if parts.len() != 3 && parts.len() != 4 {
        return Err(format!("hsl() takes 3 or 4 arguments, got {}", parts.len()));
    }

    let h = parse_number(parts[0].trim_end_matches("deg"))?;
    let pct = |tok: &str| -> Result<f64, String> {
        let p = tok
            .strip_suffix('%')
            .ok_or_else(|| format!("hsl saturation/lightness must be a percentage: \"{tok}\""))?;
        Ok(parse_number(p)? / 100.0)
    };
    let s = pct(parts[1])?;
    let l = pct(parts[2])?;
    let a = match parts.get(3) {
        Some(tok) => parse_alpha(tok)?,
        None => 1.0,
    };

    let [r, g, b] = hsl_to_rgb(h, s, l);
    Ok(Color::rgba(
        unit_to_u8(r),
        unit_to_u8(g),
        unit_to_u8(b),
        unit_to_u8(a),
    ))
}

fn hsl_to_rgb(h: f64, s: f64, l: f64) -> [f64; 3] {
    let h = (h % 360.0 + 360.0) % 360.0 / 360.0;
    let s = s.clamp(0.0, 1.0);
    let l = l.clamp(0.0, 1.0);

    if s == 0.0 {
        return [l, l, l];
    }

    fn hue_to_rgb(p: f64, q: f64, mut t: f64) -> f64 {
        if t < 0.0 {
            t += 1.0;
        }
        if t > 1.0 {
            t -= 1.0;
        }
        if t < 1.0 / 6.0 {
            return p + (q - p) * 6.0 * t;
        }
        if t < 1.0 / 2.0 {
            return q;
        }
        if t < 2.0 / 3.0 {
            return p + (q - p) * (2.0 / 3.0 - t) * 6.0;
        }
        p
    }

    let q = if l < 0.5 {
        l * (1.0 + s)
    } else {
        l + s - l * s
    };
    let p = 2.0 * l - q;

    [
        hue_to_rgb(p, q, h + 1.0 / 3.0),
        hue_to_rgb(p, q, h),
        hue_to_rgb(p, q, h - 1.0 / 3.0),
    ]
}

fn named(name: &str) -> Option<Color> {
    let c = match name {
        "transparent" => Color::rgba(0, 0, 0, 0),
        "black" => Color::rgb(0, 0, 0),
        "white" => Color::rgb(255, 255, 255),
        "red" => Color::rgb(255, 0, 0),
        "lime" => Color::rgb(0, 255, 0),
        "green" => Color::rgb(0, 128, 0),
        "blue" => Color::rgb(0, 0, 255),
        "yellow" => Color::rgb(255, 255, 0),
        "cyan" | "aqua" => Color::rgb(0, 255, 255),
        "magenta" | "fuchsia" => Color::rgb(255, 0, 255),
        "gray" | "grey" => Color::rgb(128, 128, 128),
        "silver" => Color::rgb(192, 192, 192),
        "maroon" => Color::rgb(128, 0, 0),
        "olive" => Color::rgb(128, 128, 0),
        "navy" => Color::rgb(0, 0, 128),
        "purple" => Color::rgb(128, 0, 128),
        "teal" => Color::rgb(0, 128, 128),
        "orange" => Color::rgb(255, 165, 0),
        "pink" => Color::rgb(255, 192, 203),
        "brown" => Color::rgb(165, 42, 42),
        "gold" => Color::rgb(255, 215, 0),
        "hotpink" => Color::rgb(255, 105, 180),
        _ => return None,
    };
    Some(c)
}

#[cfg(test)]
#[path = "../../tests/unit/assets/color.rs"]
mod tests;
