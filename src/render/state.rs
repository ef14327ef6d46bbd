use crate::assets::color::Color;
use crate::foundation::core::Affine;
use crate::foundation::error::{MemeError, MemeResult};

/// Drawing attributes consulted by every draw call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct DrawState {
    pub(crate) transform: Affine,
    pub(crate) fill: Color,
    pub(crate) stroke: Color,
    pub(crate) line_width: f64,
}

impl Default for DrawState {
    fn default() -> Self {
        Self {
            transform: Affine::IDENTITY,
            fill: Color::BLACK,
            stroke: Color::BLACK,
            line_width: 1.0,
        }
    }
}

/// Explicit save/restore stack over [`DrawState`], independent of any raster backend.
#[derive(Clone, Debug, Default)]
pub(crate) struct StateStack {
    current: DrawState,
    saved: Vec<DrawState>,
}

impl StateStack {
    pub(crate) fn current(&self) -> &DrawState {
        &self.current
    }

    pub(crate) fn depth(&self) -> usize {
        self.saved.len()
    }

    pub(crate) fn save(&mut self) {
        self.saved.push(self.current);
    }

    pub(crate) fn restore(&mut self) -> MemeResult<()> {
        self.current = self
            .saved
            .pop()
            .ok_or_else(|| MemeError::render("restore without a matching save"))?;
        Ok(())
    }

    /// Post-multiply the current transform, so `t` applies in the current user space.
    pub(crate) fn transform(&mut self, t: Affine) {
        self.current.transform *= t;
    }

    pub(crate) fn set_fill(&mut self, color: Color) {
        self.current.fill = color;
    }

    pub(crate) fn set_stroke(&mut self, color: Color, line_width: f64) {
        self.current.stroke = color;
        self.current.line_width = line_width;
    }

    /// Run `f` between a save and its restore. The restore happens on every exit path,
    /// including when `f` returns an error.
    pub(crate) fn scoped<T, R>(
        target: &mut T,
        stack: impl Fn(&mut T) -> &mut Self,
        f: impl FnOnce(&mut T) -> MemeResult<R>,
    ) -> MemeResult<R> {
        stack(target).save();
        let depth = stack(target).depth();
        let out = f(target);

        let inner = stack(target);
        while inner.depth() > depth {
            inner.restore()?;
        }
        inner.restore()?;
        out
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/state.rs"]
mod tests;
