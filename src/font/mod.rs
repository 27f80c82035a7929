//! Font module root.
//!
//! Ring lettering is built from **vector glyph outlines**:
//! - Discover system fonts (`fontdb`).
//! - Resolve a requested family/weight/style to a concrete face (`resolve`).
//! - Extract glyph outlines from TTF/OTF as `lyon::path::Path` (`outline`).
//! - Tessellate and extrude outlines into 3D meshes (`tessellate`).
//! - Serve per-character outlines + bounds to the ring engine (`provider`).

pub mod outline;
pub mod provider;
pub mod resolve;
pub mod tessellate;

use std::{fs, path::Path as FsPath, sync::Arc};

use fontdb::{Database, ID, Query, Source, Style, Weight};
use log::{debug, info};

pub use provider::{FontMetricsProvider, GlyphOutline, OutlineGlyphs};

/// A stable identifier for a selected font face (`fontdb::ID` is Copy and hashable).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct FontFaceId(pub ID);

/// Simplified font style selection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FontQuery {
    /// Preferred font family names, in priority order.
    /// Example: `["Helvetica", "Arial", "sans-serif"]`
    pub families: Vec<String>,

    /// Weight in CSS-ish terms (100..900): 400 = regular, 700 = bold.
    pub weight: u16,

    /// Italic / oblique.
    pub italic: bool,
}

/// A resolved face plus enough information to access its bytes.
///
/// - `bytes` contains the full font file/collection.
/// - `index` selects the face within the collection.
#[derive(Debug, Clone)]
pub struct ResolvedFace {
    pub face_id: FontFaceId,
    pub family: String,
    pub bytes: Arc<[u8]>,
    pub index: u32,
    pub units_per_em: f32,
}

impl ResolvedFace {
    /// Scale factor mapping font units to world units for an em size of `size`.
    #[inline]
    pub fn font_units_to_world_scale(&self, size: f32) -> f32 {
        size / self.units_per_em
    }

    /// Parse the face. `ttf-parser` parsing is cheap (no allocation), so callers
    /// re-parse instead of holding a borrowed `Face`.
    #[inline]
    pub fn parse(&self) -> Result<ttf_parser::Face<'_>, FontError> {
        ttf_parser::Face::parse(&self.bytes, self.index).map_err(|_| FontError::ParseFailed)
    }
}

/// Errors produced by the font subsystem.
#[derive(thiserror::Error, Debug)]
pub enum FontError {
    #[error("no fonts found on this system")]
    NoFontsAvailable,

    #[error("failed to resolve a font face for query: {0:?}")]
    ResolveFailed(FontQuery),

    #[error("font face has no file-backed source")]
    NonFileBackedSource,

    #[error("failed to read font file {path}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse font face")]
    ParseFailed,

    #[error("font has no glyph for character {0:?}")]
    MissingChar(char),

    #[error("glyph outline not found for glyph id {glyph_id}")]
    MissingGlyph { glyph_id: u16 },

    #[error("tessellation failed: {0}")]
    Tessellation(String),
}

/// The primary entrypoint to the font system.
///
/// Owns a `fontdb::Database` loaded with the system fonts and resolves faces from it.
pub struct FontSystem {
    db: Database,
}

impl FontSystem {
    /// Create a new font system and load system fonts.
    pub fn new() -> Result<Self, FontError> {
        let mut db = Database::new();
        db.load_system_fonts();

        let count = db.faces().count();
        if count == 0 {
            return Err(FontError::NoFontsAvailable);
        }
        info!("font: loaded {count} system font faces");

        Ok(Self { db })
    }

    /// Resolve a `FontQuery` to a concrete face.
    ///
    /// Resolution order:
    /// - the query's families, in order, with the requested weight/style
    /// - generic serif with the same weight/style
    /// - the first face in the database
    pub fn resolve(&self, query: &FontQuery) -> Result<ResolvedFace, FontError> {
        let style = if query.italic {
            Style::Italic
        } else {
            Style::Normal
        };
        let weight = Weight(query.weight.clamp(1, 1000));
        let families = resolve::query_families(query);

        let id = self
            .db
            .query(&Query {
                families: &families,
                weight,
                style,
                stretch: fontdb::Stretch::Normal,
            })
            .or_else(|| {
                self.db.query(&Query {
                    families: &[fontdb::Family::Serif],
                    weight,
                    style,
                    stretch: fontdb::Stretch::Normal,
                })
            })
            .or_else(|| self.db.faces().next().map(|f| f.id))
            .ok_or(FontError::NoFontsAvailable)?;

        let face = self
            .db
            .face(id)
            .ok_or_else(|| FontError::ResolveFailed(query.clone()))?;

        let (path, index) = match &face.source {
            Source::File(p) => (p.to_path_buf(), face.index),
            _ => return Err(FontError::NonFileBackedSource),
        };
        let family = face
            .families
            .first()
            .map(|(name, _)| name.clone())
            .unwrap_or_default();

        let bytes = read_font_bytes(&path)?;
        let parsed = ttf_parser::Face::parse(&bytes, index).map_err(|_| FontError::ParseFailed)?;
        let units_per_em = parsed.units_per_em() as f32;

        debug!(
            "font: resolved {:?} -> {family:?} ({}#{index}, upm {units_per_em})",
            query.families,
            path.display()
        );

        Ok(ResolvedFace {
            face_id: FontFaceId(id),
            family,
            bytes,
            index,
            units_per_em,
        })
    }
}

fn read_font_bytes(path: &FsPath) -> Result<Arc<[u8]>, FontError> {
    let data = fs::read(path).map_err(|source| FontError::ReadFailed {
        path: path.display().to_string(),
        source,
    })?;
    Ok(Arc::<[u8]>::from(data))
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn test_unreadable_font_file_keeps_path_and_cause() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.ttf");

        match read_font_bytes(&path) {
            Err(err @ FontError::ReadFailed { .. }) => {
                assert!(err.to_string().contains("missing.ttf"));
                let cause = err.source().and_then(|e| e.downcast_ref::<std::io::Error>());
                assert_eq!(
                    cause.map(std::io::Error::kind),
                    Some(std::io::ErrorKind::NotFound)
                );
            }
            other => panic!("expected ReadFailed, got {other:?}"),
        }
    }
}
