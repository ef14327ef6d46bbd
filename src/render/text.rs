use std::borrow::Cow;

use crate::assets::font::{FontFace, isolated_font_context};
use crate::foundation::core::Point;
use crate::foundation::error::{MemeError, MemeResult};

/// A glyph positioned in band user space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct PlacedGlyph {
    pub(crate) id: u32,
    pub(crate) x: f32,
    pub(crate) y: f32,
}

/// Shaped caption, already centered on its anchor.
#[derive(Clone, Debug, Default)]
pub(crate) struct ShapedText {
    pub(crate) glyphs: Vec<PlacedGlyph>,
    pub(crate) font_size: f32,
    pub(crate) width: f32,
    pub(crate) height: f32,
}

/// Shapes caption text with `parley`. One instance per render; nothing is shared across calls.
pub(crate) struct TextShaper {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<()>,
    registered: Option<u64>,
}

impl TextShaper {
    pub(crate) fn new() -> Self {
        Self {
            font_ctx: isolated_font_context(),
            layout_ctx: parley::LayoutContext::new(),
            registered: None,
        }
    }

    fn ensure_registered(&mut self, font: &FontFace) {
        let blob = font.shaping_blob();
        if self.registered == Some(blob.id()) {
            return;
        }
        let id = blob.id();
        self.font_ctx.collection.register_fonts(blob, None);
        self.registered = Some(id);
    }

    /// Shape `text` and place it so every line is horizontally centered on `anchor.x` and the
    /// whole block is vertically centered on `anchor.y`.
    pub(crate) fn shape_centered(
        &mut self,
        text: &str,
        font: &FontFace,
        size_px: f32,
        anchor: Point,
    ) -> MemeResult<ShapedText> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(MemeError::validation("font size must be finite and > 0"));
        }
        self.ensure_registered(font);

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        let face = font.shaping_face();
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(Cow::Owned(face.family.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontWeight(face.weight));
        builder.push_default(parley::style::StyleProperty::FontStyle(face.style));
        builder.push_default(parley::style::StyleProperty::FontWidth(face.width));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));

        let mut layout: parley::Layout<()> = builder.build(text);
        layout.break_all_lines(None);

        let anchor_x = anchor.x as f32;
        let block_top = anchor.y as f32 - layout.height() / 2.0;

        let blob_id = font.shaping_blob().id();
        let mut glyphs = Vec::new();
        let mut foreign_runs = 0usize;
        for line in layout.lines() {
            let runs: Vec<_> = line
                .items()
                .filter_map(|item| match item {
                    parley::layout::PositionedLayoutItem::GlyphRun(run) => Some(run),
                    _ => None,
                })
                .collect();

            let left = runs.iter().map(|r| r.offset()).fold(f32::INFINITY, f32::min);
            let right = runs
                .iter()
                .map(|r| r.offset() + r.advance())
                .fold(f32::NEG_INFINITY, f32::max);
            if !left.is_finite() || !right.is_finite() {
                continue;
            }
            let shift_x = anchor_x - (left + right) / 2.0;

            for run in &runs {
                // Glyph ids are only meaningful for the face the rasterizer draws with.
                let run_font = run.run().font();
                if run_font.data.id() != blob_id || run_font.index != font.index() {
                    foreign_runs += 1;
                    continue;
                }
                let mut x = run.offset();
                let baseline = block_top + run.baseline();
                for g in run.glyphs() {
                    glyphs.push(PlacedGlyph {
                        id: g.id,
                        x: shift_x + x + g.x,
                        y: baseline - g.y,
                    });
                    x += g.advance;
                }
            }
        }

        if foreign_runs > 0 {
            tracing::debug!(foreign_runs, "dropped runs shaped with a different face");
        }

        Ok(ShapedText {
            glyphs,
            font_size: size_px,
            width: layout.width(),
            height: layout.height(),
        })
    }
}

impl ShapedText {
    pub(crate) fn cpu_glyphs(&self) -> impl Iterator<Item = vello_cpu::Glyph> + '_ {
        self.glyphs.iter().map(|g| vello_cpu::Glyph {
            id: g.id,
            x: g.x,
            y: g.y,
        })
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/text.rs"]
mod tests;
