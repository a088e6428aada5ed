//! Asset loading: images for texture layers, shader sources, raw bytes.
//!
//! Loaders return owned CPU data; GPU upload happens in `render`.

use std::path::{Path, PathBuf};

/// An asset could not be read or decoded.
#[derive(Debug, thiserror::Error)]
pub enum ResourceLoadError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

impl ResourceLoadError {
    pub fn path(&self) -> &Path {
        match self {
            ResourceLoadError::Io { path, .. } | ResourceLoadError::Decode { path, .. } => path,
        }
    }
}

/// Tightly packed RGBA8 pixels, bottom row first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl RawImage {
    /// Two-color checkerboard; stands in for missing art.
    pub fn checkerboard(width: u32, height: u32, cell: u32, a: [u8; 4], b: [u8; 4]) -> Self {
        let cell = cell.max(1);
        let mut pixels = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            for x in 0..width {
                let even = ((x / cell) + (y / cell)) % 2 == 0;
                pixels.extend_from_slice(if even { &a } else { &b });
            }
        }
        Self { width, height, pixels }
    }

    /// Resamples to `width` x `height` (bilinear).
    pub fn resized(&self, width: u32, height: u32) -> Self {
        if self.width == width && self.height == height {
            return self.clone();
        }
        let Some(src) = image::RgbaImage::from_raw(self.width, self.height, self.pixels.clone()) else {
            log::warn!("RawImage: pixel data does not match {}x{}; substituting blank", self.width, self.height);
            return Self {
                width,
                height,
                pixels: vec![0; (width * height * 4) as usize],
            };
        };
        let out = image::imageops::resize(&src, width, height, image::imageops::FilterType::Triangle);
        Self {
            width,
            height,
            pixels: out.into_raw(),
        }
    }
}

/// Loads an image file as RGBA8, flipped so the first row is the bottom one
/// (scene space is +Y up).
pub fn load_texture(path: impl AsRef<Path>) -> Result<RawImage, ResourceLoadError> {
    let path = path.as_ref();
    let decoded = image::open(path).map_err(|source| match source {
        image::ImageError::IoError(source) => ResourceLoadError::Io {
            path: path.to_path_buf(),
            source,
        },
        source => ResourceLoadError::Decode {
            path: path.to_path_buf(),
            source,
        },
    })?;

    let rgba = decoded.flipv().to_rgba8();
    log::debug!("loaded texture {} ({}x{})", path.display(), rgba.width(), rgba.height());

    Ok(RawImage {
        width: rgba.width(),
        height: rgba.height(),
        pixels: rgba.into_raw(),
    })
}

/// Reads a shader source file.
pub fn load_shader_source(path: impl AsRef<Path>) -> Result<String, ResourceLoadError> {
    let path = path.as_ref();
    std::fs::read_to_string(path).map_err(|source| ResourceLoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads the first of `candidates` that exists.
pub fn load_first_bytes<P: AsRef<Path>>(candidates: &[P]) -> Option<(PathBuf, Vec<u8>)> {
    candidates.iter().find_map(|p| {
        let p = p.as_ref();
        std::fs::read(p).ok().map(|bytes| (p.to_path_buf(), bytes))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("lodestone-assets-{name}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn missing_texture_is_io_error_with_path() {
        let err = load_texture("does/not/exist.png").unwrap_err();
        assert!(matches!(err, ResourceLoadError::Io { .. }));
        assert_eq!(err.path(), Path::new("does/not/exist.png"));
        assert!(err.to_string().contains("does/not/exist.png"));
    }

    #[test]
    fn garbage_texture_is_decode_error() {
        let dir = scratch_dir("garbage");
        let path = dir.join("broken.png");
        std::fs::write(&path, b"definitely not a png").unwrap();

        let err = load_texture(&path).unwrap_err();
        assert!(matches!(err, ResourceLoadError::Decode { .. }), "{err}");
    }

    #[test]
    fn texture_rows_are_flipped() {
        let dir = scratch_dir("flip");
        let path = dir.join("two_rows.png");
        let mut img = image::RgbaImage::new(1, 2);
        img.put_pixel(0, 0, image::Rgba([255, 0, 0, 255]));
        img.put_pixel(0, 1, image::Rgba([0, 0, 255, 255]));
        img.save(&path).unwrap();

        let raw = load_texture(&path).unwrap();
        assert_eq!((raw.width, raw.height), (1, 2));
        assert_eq!(&raw.pixels[..4], &[0, 0, 255, 255]);
        assert_eq!(&raw.pixels[4..], &[255, 0, 0, 255]);
    }

    #[test]
    fn missing_shader_source_is_io_error() {
        assert!(matches!(
            load_shader_source("nowhere/quad.wgsl"),
            Err(ResourceLoadError::Io { .. })
        ));
    }

    #[test]
    fn checkerboard_alternates_cells() {
        let img = RawImage::checkerboard(4, 2, 2, [1; 4], [2; 4]);
        assert_eq!(img.pixels.len(), 4 * 2 * 4);
        assert_eq!(&img.pixels[0..4], &[1; 4]);
        assert_eq!(&img.pixels[8..12], &[2; 4]);
    }

    #[test]
    fn resized_changes_dimensions() {
        let img = RawImage::checkerboard(8, 8, 1, [0; 4], [255; 4]).resized(4, 2);
        assert_eq!((img.width, img.height), (4, 2));
        assert_eq!(img.pixels.len(), 4 * 2 * 4);
    }
}
