use std::path::Path;
use std::sync::Arc;

use anyhow::Context as _;

use crate::foundation::error::{MemeError, MemeResult};

/// Families tried, in order, when no explicit caption font is configured.
pub const DEFAULT_CAPTION_FAMILIES: &[&str] = &["Impact", "Anton", "Arial Black", "DejaVu Sans"];

/// Family and attributes that make `parley` resolve exactly the face at `FontFace::index`.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct ShapingFace {
    pub(crate) family: String,
    pub(crate) weight: parley::style::FontWeight,
    pub(crate) style: parley::style::FontStyle,
    pub(crate) width: parley::style::FontWidth,
}

/// Font context holding only explicitly registered fonts, never system fallbacks.
pub(crate) fn isolated_font_context() -> parley::FontContext {
    parley::FontContext {
        collection: parley::fontique::Collection::new(parley::fontique::CollectionOptions {
            shared: false,
            system_fonts: false,
        }),
        source_cache: parley::fontique::SourceCache::default(),
    }
}

/// An outline font used to shape and rasterize caption text.
///
/// Cheap to clone; the font bytes are shared.
#[derive(Clone)]
pub struct FontFace {
    family: String,
    shaping: ShapingFace,
    index: u32,
    bytes: Arc<Vec<u8>>,
    shaping_blob: parley::fontique::Blob<u8>,
    raster_font: vello_cpu::peniko::FontData,
}

impl std::fmt::Debug for FontFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontFace")
            .field("family", &self.family)
            .field("index", &self.index)
            .field("bytes_len", &self.bytes.len())
            .finish()
    }
}

impl FontFace {
    /// Load a TrueType/OpenType font from raw bytes (first face).
    pub fn from_bytes(bytes: Vec<u8>) -> MemeResult<Self> {
        Self::from_parts(bytes, 0, None)
    }

    /// Load face `index` of a font collection (`.ttc`/`.otc`).
    pub fn from_collection_bytes(bytes: Vec<u8>, index: u32) -> MemeResult<Self> {
        Self::from_parts(bytes, index, None)
    }

    /// Load a font file from disk.
    pub fn from_path(path: impl AsRef<Path>) -> MemeResult<Self> {
        let path = path.as_ref();
        let bytes =
            std::fs::read(path).with_context(|| format!("read font '{}'", path.display()))?;
        Self::from_bytes(bytes)
    }

    /// Find an installed font, trying `families` in order and then any sans-serif face.
    pub fn system(families: &[&str]) -> MemeResult<Self> {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();

        let mut query_families: Vec<usvg::fontdb::Family<'_>> = families
            .iter()
            .map(|name| usvg::fontdb::Family::Name(*name))
            .collect();
        query_families.push(usvg::fontdb::Family::SansSerif);

        let id = db
            .query(&usvg::fontdb::Query {
                families: &query_families,
                ..Default::default()
            })
            .or_else(|| db.faces().next().map(|face| face.id))
            .ok_or_else(|| MemeError::validation("no system font is installed"))?;

        let family = db
            .face(id)
            .and_then(|face| face.families.first().map(|(name, _)| name.clone()));
        let (bytes, index) = db
            .with_face_data(id, |data, index| (data.to_vec(), index))
            .ok_or_else(|| MemeError::validation("system font data is unavailable"))?;

        tracing::debug!(family = ?family, index, "resolved system caption font");
        Self::from_parts(bytes, index, family)
    }

    /// [`FontFace::system`] with [`DEFAULT_CAPTION_FAMILIES`].
    pub fn system_default() -> MemeResult<Self> {
        Self::system(DEFAULT_CAPTION_FAMILIES)
    }

    fn from_parts(bytes: Vec<u8>, index: u32, family_hint: Option<String>) -> MemeResult<Self> {
        if bytes.is_empty() {
            return Err(MemeError::validation("font bytes are empty"));
        }

        let shaping_blob = parley::fontique::Blob::from(bytes.clone());
        let mut font_ctx = isolated_font_context();
        let families = font_ctx
            .collection
            .register_fonts(shaping_blob.clone(), None);
        if families.is_empty() {
            return Err(MemeError::validation(
                "no font families registered from font bytes",
            ));
        }
        let (family_id, info) = families
            .iter()
            .find_map(|(id, faces)| {
                faces
                    .iter()
                    .find(|info| info.index() == index)
                    .map(|info| (*id, info.clone()))
            })
            .ok_or_else(|| MemeError::validation(format!("font data has no face at index {index}")))?;
        let registered = font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| MemeError::validation("registered font family has no name"))?
            .to_string();
        let shaping = ShapingFace {
            family: registered,
            weight: info.weight(),
            style: info.style(),
            width: info.width(),
        };

        let raster_font =
            vello_cpu::peniko::FontData::new(vello_cpu::peniko::Blob::from(bytes.clone()), index);

        Ok(Self {
            family: family_hint.unwrap_or_else(|| shaping.family.clone()),
            shaping,
            index,
            bytes: Arc::new(bytes),
            shaping_blob,
            raster_font,
        })
    }

    /// Primary family name.
    pub fn family(&self) -> &str {
        &self.family
    }

    /// Raw font file bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Face index inside the font file (non-zero only for collections).
    pub fn index(&self) -> u32 {
        self.index
    }

    pub(crate) fn shaping_face(&self) -> &ShapingFace {
        &self.shaping
    }

    pub(crate) fn shaping_blob(&self) -> parley::fontique::Blob<u8> {
        self.shaping_blob.clone()
    }

    pub(crate) fn raster_font(&self) -> &vello_cpu::peniko::FontData {
        &self.raster_font
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/font.rs"]
mod tests;
