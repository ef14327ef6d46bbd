use std::sync::Arc;
use std::time::Duration;

use crate::assets::decode::DecodedImage;
use crate::assets::fetch::{HttpFetcher, ImageFetcher, acquire_image};
use crate::assets::font::FontFace;
use crate::foundation::error::{MemeError, MemeResult};
use crate::render::canvas::CpuCanvas;
use crate::render::frame::RenderedImage;
use crate::render::layout::band_anchor;
use crate::render::text::TextShaper;
use crate::scene::request::{BandEdge, RenderRequest};

/// Engine configuration. Immutable once a [`Compositor`] is built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompositorOpts {
    /// Whole-request timeout for remote image fetches.
    pub fetch_timeout: Duration,
    /// Largest accepted encoded source payload, in bytes.
    pub max_source_bytes: usize,
    /// `User-Agent` sent with remote fetches.
    pub user_agent: String,
}

impl Default for CompositorOpts {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(15),
            max_source_bytes: 32 * 1024 * 1024,
            user_agent: format!("memeforge/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl CompositorOpts {
    /// Defaults, overridden by `MEMEFORGE_FETCH_TIMEOUT_MS` and `MEMEFORGE_MAX_SOURCE_BYTES`
    /// when they hold positive integers.
    pub fn from_env() -> Self {
        let mut opts = Self::default();
        if let Some(ms) = std::env::var("MEMEFORGE_FETCH_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|&n| n > 0)
        {
            opts.fetch_timeout = Duration::from_millis(ms);
        }
        if let Some(n) = std::env::var("MEMEFORGE_MAX_SOURCE_BYTES")
            .ok()
            .and_then(|v| v.trim().parse::<usize>().ok())
            .filter(|&n| n > 0)
        {
            opts.max_source_bytes = n;
        }
        opts
    }
}

/// The meme compositing engine.
///
/// Holds only immutable configuration, so one instance can serve any number of concurrent
/// renders. Each render gets its own surface, drawing state, and text shaper.
#[derive(Clone)]
pub struct Compositor {
    font: Option<FontFace>,
    fetcher: Arc<dyn ImageFetcher>,
    opts: CompositorOpts,
}

impl std::fmt::Debug for Compositor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compositor")
            .field("font", &self.font)
            .field("opts", &self.opts)
            .finish_non_exhaustive()
    }
}

impl Compositor {
    /// Engine with an HTTP fetcher built from `opts` and no caption font.
    pub fn new(opts: CompositorOpts) -> MemeResult<Self> {
        let fetcher = HttpFetcher::new(opts.fetch_timeout, &opts.user_agent)?;
        Ok(Self {
            font: None,
            fetcher: Arc::new(fetcher),
            opts,
        })
    }

    /// Use `font` for every caption.
    pub fn with_font(mut self, font: FontFace) -> Self {
        self.font = Some(font);
        self
    }

    /// Replace the remote fetcher.
    pub fn with_fetcher(mut self, fetcher: Arc<dyn ImageFetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    /// Configured caption font, if any.
    pub fn font(&self) -> Option<&FontFace> {
        self.font.as_ref()
    }

    /// Active configuration.
    pub fn opts(&self) -> &CompositorOpts {
        &self.opts
    }

    /// Acquire the source image, then composite it.
    ///
    /// Request validation runs first, so malformed filters, transforms, and band values fail
    /// without any I/O. Acquisition is the only await point; dropping the future before it
    /// resolves leaves nothing behind.
    #[tracing::instrument(skip(self, request), fields(source = %request.image_source.describe()))]
    pub async fn render(&self, request: &RenderRequest) -> MemeResult<RenderedImage> {
        self.check(request)?;
        let image = acquire_image(
            &request.image_source,
            self.fetcher.as_ref(),
            self.opts.max_source_bytes,
        )
        .await?;
        tracing::debug!(
            width = image.canvas.width,
            height = image.canvas.height,
            "decoded source image"
        );
        self.compose_checked(&image, request)
    }

    /// Composite an already decoded image. `request.image_source` is ignored.
    pub fn compose(
        &self,
        image: &DecodedImage,
        request: &RenderRequest,
    ) -> MemeResult<RenderedImage> {
        self.check(request)?;
        self.compose_checked(image, request)
    }

    fn compose_checked(
        &self,
        image: &DecodedImage,
        request: &RenderRequest,
    ) -> MemeResult<RenderedImage> {
        let base = request.filter.apply_premul(image)?;
        let mut canvas = CpuCanvas::new(image.canvas)?;
        canvas.draw_base_image(&base)?;

        let mut shaper = TextShaper::new();
        let bands = [
            (BandEdge::Top, request.top_band.as_ref()),
            (BandEdge::Bottom, request.bottom_band.as_ref()),
        ];
        for (edge, band) in bands {
            let Some(band) = band else {
                continue;
            };
            if band.is_empty() {
                tracing::debug!(band = %edge, "skipping band with empty text");
                continue;
            }

            let font = self.caption_font()?;
            let anchor = band_anchor(edge, band.position_percent, image.canvas);
            let shaped = shaper.shape_centered(&band.text, font, band.font_size_px, anchor)?;
            tracing::debug!(
                band = %edge,
                x = anchor.x,
                y = anchor.y,
                glyphs = shaped.glyphs.len(),
                width = shaped.width,
                height = shaped.height,
                "drawing band"
            );

            canvas.scoped(|c| {
                if !band.transform.is_identity() {
                    c.state_mut().transform(band.transform.to_affine());
                }
                c.state_mut()
                    .set_stroke(band.stroke_color, band.stroke_width_px());
                c.state_mut().set_fill(band.fill_color);
                c.stroke_text(&shaped, font);
                c.fill_text(&shaped, font);
                Ok(())
            })?;
        }

        let data = canvas.finish()?;
        RenderedImage::new(image.canvas, data)
    }

    fn check(&self, request: &RenderRequest) -> MemeResult<()> {
        request.validate()?;
        if request.drawable_bands().next().is_some() {
            self.caption_font()?;
        }
        Ok(())
    }

    fn caption_font(&self) -> MemeResult<&FontFace> {
        self.font
            .as_ref()
            .ok_or_else(|| MemeError::validation("caption text requires a configured font"))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;
