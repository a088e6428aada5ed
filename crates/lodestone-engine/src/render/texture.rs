use crate::assets::RawImage;
use crate::device::call::call;
use crate::device::GpuError;
use crate::render::RenderCtx;

#[derive(Debug, thiserror::Error)]
pub enum TextureError {
    #[error("texture array needs at least one layer")]
    Empty,

    #[error("layer {index} is {found:?}, expected {expected:?} like layer 0")]
    LayerSize {
        index: usize,
        expected: (u32, u32),
        found: (u32, u32),
    },

    #[error("layer {index} holds {len} bytes, expected {expected}")]
    LayerData { index: usize, len: usize, expected: usize },

    #[error("{layers} layers of {width}x{height} exceed the device limits ({max_layers} layers, {max_dimension} px)")]
    TooLarge {
        layers: u32,
        width: u32,
        height: u32,
        max_layers: u32,
        max_dimension: u32,
    },

    #[error(transparent)]
    Gpu(#[from] GpuError),
}

/// Verifies that all layers share layer 0's size and hold RGBA8 data.
/// Returns that size.
pub fn check_layers(layers: &[RawImage]) -> Result<(u32, u32), TextureError> {
    let first = layers.first().ok_or(TextureError::Empty)?;
    let expected = (first.width, first.height);

    for (index, layer) in layers.iter().enumerate() {
        let found = (layer.width, layer.height);
        if found != expected {
            return Err(TextureError::LayerSize { index, expected, found });
        }
        let bytes = (layer.width as usize) * (layer.height as usize) * 4;
        if layer.pixels.len() != bytes {
            return Err(TextureError::LayerData {
                index,
                len: layer.pixels.len(),
                expected: bytes,
            });
        }
    }
    Ok(expected)
}

/// RGBA8 (sRGB) 2D texture array; quads pick a layer per vertex.
pub struct TextureArray {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    width: u32,
    height: u32,
    layers: u32,
}

impl TextureArray {
    /// A plain 2D texture: one layer, sampled as layer 0.
    pub fn single(ctx: &RenderCtx<'_>, label: &str, image: &RawImage) -> Result<Self, TextureError> {
        Self::new(ctx, label, std::slice::from_ref(image))
    }

    pub fn new(ctx: &RenderCtx<'_>, label: &str, layers: &[RawImage]) -> Result<Self, TextureError> {
        let (width, height) = check_layers(layers)?;
        let count = layers.len() as u32;

        let limits = ctx.device.limits();
        if count > limits.max_texture_array_layers
            || width > limits.max_texture_dimension_2d
            || height > limits.max_texture_dimension_2d
        {
            return Err(TextureError::TooLarge {
                layers: count,
                width,
                height,
                max_layers: limits.max_texture_array_layers,
                max_dimension: limits.max_texture_dimension_2d,
            });
        }

        let texture = call(|| {
            let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: count,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            });

            for (z, layer) in layers.iter().enumerate() {
                ctx.queue.write_texture(
                    wgpu::TexelCopyTextureInfo {
                        texture: &texture,
                        mip_level: 0,
                        origin: wgpu::Origin3d { x: 0, y: 0, z: z as u32 },
                        aspect: wgpu::TextureAspect::All,
                    },
                    &layer.pixels,
                    wgpu::TexelCopyBufferLayout {
                        offset: 0,
                        bytes_per_row: Some(4 * width),
                        rows_per_image: Some(height),
                    },
                    wgpu::Extent3d {
                        width,
                        height,
                        depth_or_array_layers: 1,
                    },
                );
            }
            texture
        })?;

        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some(label),
            dimension: Some(wgpu::TextureViewDimension::D2Array),
            ..Default::default()
        });

        log::debug!("texture array {label}: {count} layer(s) of {width}x{height}");
        Ok(Self {
            texture,
            view,
            width,
            height,
            layers: count,
        })
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn layers(&self) -> u32 {
        self.layers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(w: u32, h: u32) -> RawImage {
        RawImage::checkerboard(w, h, 1, [255; 4], [255; 4])
    }

    #[test]
    fn empty_layer_list_is_rejected() {
        assert!(matches!(check_layers(&[]), Err(TextureError::Empty)));
    }

    #[test]
    fn mismatched_layer_is_reported_by_index() {
        let err = check_layers(&[solid(4, 4), solid(4, 4), solid(2, 4)]).unwrap_err();
        match err {
            TextureError::LayerSize { index, expected, found } => {
                assert_eq!(index, 2);
                assert_eq!(expected, (4, 4));
                assert_eq!(found, (2, 4));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn truncated_pixels_are_rejected() {
        let mut bad = solid(2, 2);
        bad.pixels.pop();
        assert!(matches!(
            check_layers(&[solid(2, 2), bad]),
            Err(TextureError::LayerData { index: 1, len: 15, expected: 16 })
        ));
    }

    #[test]
    fn single_image_is_a_valid_one_layer_array() {
        let image = solid(16, 8);
        assert_eq!(check_layers(std::slice::from_ref(&image)).unwrap(), (16, 8));
    }

    #[test]
    fn uniform_layers_report_their_size() {
        assert_eq!(check_layers(&[solid(8, 4), solid(8, 4)]).unwrap(), (8, 4));
    }
}
