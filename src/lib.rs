//! memeforge composites meme images: a filtered base image with up to two outlined caption bands.
//!
//! A render is a pure function of a [`RenderRequest`] and the immutable [`Compositor`]
//! configuration:
//!
//! - acquire and decode the source image (the only await point)
//! - apply the whole-image [`Filter`]
//! - anchor each [`TextBand`] by percentage of the image height
//! - stroke, then fill, each band inside its own scoped [`Transform`]
//!
//! The output is a [`RenderedImage`] with the source image's exact dimensions.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod assets;
mod effects;
mod foundation;
mod render;
mod scene;

pub use crate::assets::color::Color;
pub use crate::assets::decode::{DecodedImage, decode_image};
pub use crate::assets::fetch::{HttpFetcher, ImageFetcher, acquire_image};
pub use crate::assets::font::{DEFAULT_CAPTION_FAMILIES, FontFace};
pub use crate::assets::source::ImageSource;
pub use crate::effects::filter::{FILTER_FUNCTIONS, Filter, FilterOp};
pub use crate::foundation::core::{Affine, Canvas, Point, Rgba8Premul};
pub use crate::foundation::error::{MemeError, MemeResult};
pub use crate::render::compositor::{Compositor, CompositorOpts};
pub use crate::render::frame::RenderedImage;
pub use crate::render::layout::band_anchor;
pub use crate::scene::request::{BandEdge, RenderRequest, TextBand, Transform};
