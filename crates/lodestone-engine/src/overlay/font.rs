use std::path::{Path, PathBuf};

use crate::coords::Vec2;

/// Font files tried by [`FontSystem::load_system_font`], in order.
pub const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\segoeui.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

#[derive(Debug, thiserror::Error)]
pub enum FontLoadError {
    #[error("font parse error: {0}")]
    Parse(String),
    #[error("no usable font among {} candidate(s)", .0.len())]
    NotFound(Vec<PathBuf>),
}

/// Opaque handle to a font loaded into a [`FontSystem`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct FontId(pub(crate) usize);

/// Loaded fonts. The overlay draws with the first one.
#[derive(Default)]
pub struct FontSystem {
    fonts: Vec<fontdue::Font>,
}

impl FontSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a TrueType or OpenType font from raw bytes.
    pub fn load_font(&mut self, bytes: &[u8]) -> Result<FontId, FontLoadError> {
        let font = fontdue::Font::from_bytes(bytes, fontdue::FontSettings::default())
            .map_err(|e| FontLoadError::Parse(e.to_string()))?;
        let id = FontId(self.fonts.len());
        self.fonts.push(font);
        Ok(id)
    }

    /// Loads the first parseable font among `extra` followed by the
    /// platform's usual locations.
    pub fn load_system_font(&mut self, extra: &[PathBuf]) -> Result<FontId, FontLoadError> {
        let candidates: Vec<PathBuf> = extra
            .iter()
            .cloned()
            .chain(SYSTEM_FONT_CANDIDATES.iter().map(PathBuf::from))
            .collect();

        for path in &candidates {
            let Ok(bytes) = std::fs::read(path) else { continue };
            match self.load_font(&bytes) {
                Ok(id) => {
                    log::info!("overlay font: {}", path.display());
                    return Ok(id);
                }
                Err(e) => log::warn!("skipping font {}: {e}", path.display()),
            }
        }
        Err(FontLoadError::NotFound(candidates))
    }

    pub fn load_file(&mut self, path: &Path) -> Result<FontId, FontLoadError> {
        let bytes = std::fs::read(path).map_err(|_| FontLoadError::NotFound(vec![path.to_path_buf()]))?;
        self.load_font(&bytes)
    }

    pub(crate) fn get(&self, id: FontId) -> Option<&fontdue::Font> {
        self.fonts.get(id.0)
    }

    /// The font the overlay renders with.
    pub(crate) fn primary(&self) -> Option<&fontdue::Font> {
        self.fonts.first()
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }

    /// Bounding box of `text` laid out on one line, in logical pixels.
    #[must_use]
    pub fn measure_text(&self, text: &str, id: FontId, size: f32) -> Vec2 {
        use fontdue::layout::{CoordinateSystem, Layout, LayoutSettings, TextStyle};

        let Some(font) = self.get(id) else {
            return Vec2::new(0.0, size * 1.2);
        };

        let mut layout: Layout<()> = Layout::new(CoordinateSystem::PositiveYDown);
        layout.reset(&LayoutSettings::default());
        layout.append(&[font], &TextStyle::new(text, size, 0));

        let glyphs = layout.glyphs();
        if glyphs.is_empty() {
            return Vec2::new(0.0, size * 1.2);
        }

        // Pen position after each glyph, not the bitmap edge.
        let w = glyphs
            .iter()
            .map(|g| {
                let m = font.metrics_indexed(g.key.glyph_index, size);
                (g.x - m.xmin as f32 + m.advance_width).max(0.0)
            })
            .fold(0.0f32, f32::max);
        let h = glyphs.iter().map(|g| g.y + g.height as f32).fold(size, f32::max);
        Vec2::new(w, h)
    }
}
