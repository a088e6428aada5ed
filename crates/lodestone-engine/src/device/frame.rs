/// One acquired swapchain image and the encoder recording into it.
///
/// Drop or submit it promptly; the next image cannot be acquired meanwhile.
pub struct GpuFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
}
