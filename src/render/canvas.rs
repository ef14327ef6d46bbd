use std::sync::Arc;

use crate::assets::font::FontFace;
use crate::foundation::core::{Affine, Canvas};
use crate::foundation::error::{MemeError, MemeResult};
use crate::render::state::StateStack;
use crate::render::text::ShapedText;

/// CPU raster surface for one render, with an explicit drawing-state stack.
///
/// Every draw call reads its transform and paint from [`StateStack::current`]; the
/// rasterizer's own state is overwritten before each call, never saved or restored.
pub(crate) struct CpuCanvas {
    ctx: vello_cpu::RenderContext,
    canvas: Canvas,
    state: StateStack,
}

impl CpuCanvas {
    pub(crate) fn new(canvas: Canvas) -> MemeResult<Self> {
        let (w, h) = canvas.to_u16()?;
        Ok(Self {
            ctx: vello_cpu::RenderContext::new(w, h),
            canvas,
            state: StateStack::default(),
        })
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> &StateStack {
        &self.state
    }

    pub(crate) fn state_mut(&mut self) -> &mut StateStack {
        &mut self.state
    }

    /// Run `f` with the drawing state saved; the state is restored however `f` exits.
    pub(crate) fn scoped<R>(
        &mut self,
        f: impl FnOnce(&mut Self) -> MemeResult<R>,
    ) -> MemeResult<R> {
        StateStack::scoped(self, Self::state_mut, f)
    }

    /// Paint premultiplied RGBA8 pixels over the whole surface, untransformed.
    pub(crate) fn draw_base_image(&mut self, rgba8_premul: &[u8]) -> MemeResult<()> {
        let pixmap = pixmap_from_premul(rgba8_premul, self.canvas)?;
        let paint = vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        };

        self.ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx
            .set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_paint(paint);
        self.ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(self.canvas.width),
            f64::from(self.canvas.height),
        ));
        Ok(())
    }

    /// Outline glyphs with the current stroke color and line width.
    pub(crate) fn stroke_text(&mut self, text: &ShapedText, font: &FontFace) {
        let state = *self.state.current();
        if text.is_empty() || state.stroke.is_transparent() || state.line_width <= 0.0 {
            return;
        }
        self.apply_transform(state.transform);
        self.ctx.set_paint(state.stroke.to_cpu());
        self.ctx
            .set_stroke(vello_cpu::kurbo::Stroke::new(state.line_width));
        self.ctx
            .glyph_run(font.raster_font())
            .font_size(text.font_size)
            .stroke_glyphs(text.cpu_glyphs());
    }

    /// Fill glyphs with the current fill color.
    pub(crate) fn fill_text(&mut self, text: &ShapedText, font: &FontFace) {
        let state = *self.state.current();
        if text.is_empty() || state.fill.is_transparent() {
            return;
        }
        self.apply_transform(state.transform);
        self.ctx.set_paint(state.fill.to_cpu());
        self.ctx
            .glyph_run(font.raster_font())
            .font_size(text.font_size)
            .fill_glyphs(text.cpu_glyphs());
    }

    /// Rasterize everything drawn so far into premultiplied RGBA8.
    pub(crate) fn finish(mut self) -> MemeResult<Vec<u8>> {
        let (w, h) = self.canvas.to_u16()?;
        let mut pixmap = vello_cpu::Pixmap::new(w, h);
        self.ctx.flush();
        self.ctx.render_to_pixmap(&mut pixmap);

        let data = pixmap.data_as_u8_slice();
        if data.len() != self.canvas.rgba8_len()? {
            return Err(MemeError::render("rasterized pixmap has an unexpected size"));
        }
        Ok(data.to_vec())
    }

    fn apply_transform(&mut self, transform: Affine) {
        self.ctx.set_transform(affine_to_cpu(transform));
    }
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn pixmap_from_premul(bytes: &[u8], canvas: Canvas) -> MemeResult<vello_cpu::Pixmap> {
    let (w, h) = canvas.to_u16()?;
    if bytes.len() != canvas.rgba8_len()? {
        return Err(MemeError::render("base image byte length mismatch"));
    }
    let pixels: Vec<vello_cpu::peniko::color::PremulRgba8> = bytes
        .chunks_exact(4)
        .map(|px| {
            vello_cpu::peniko::color::PremulRgba8::from_u8_array([px[0], px[1], px[2], px[3]])
        })
        .collect();
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(pixels, w, h, true))
}

#[cfg(test)]
#[path = "../../tests/unit/render/canvas.rs"]
mod tests;
