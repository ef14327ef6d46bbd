use crate::foundation::core::{Canvas, Point};
use crate::scene::request::BandEdge;

/// Pixel anchor for a band: horizontal center, and `position_percent` of the image height
/// measured from the band's edge.
///
/// Depends only on the resolved image dimensions.
pub fn band_anchor(edge: BandEdge, position_percent: f32, canvas: Canvas) -> Point {
    let height = f64::from(canvas.height);
    let offset = f64::from(position_percent) * height / 100.0;
    let y = match edge {
        BandEdge::Top => offset,
        BandEdge::Bottom => height - offset,
    };
    Point::new(canvas.center_x(), y)
}

#[cfg(test)]
#[path = "../../tests/unit/render/layout.rs"]
mod tests;
