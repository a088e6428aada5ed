mod config;
mod scenes;

use anyhow::Context;
use winit::dpi::LogicalSize;

use lodestone_engine::device::GpuInit;
use lodestone_engine::logging::{init_logging, LoggingConfig};
use lodestone_engine::scene::{SceneHost, SceneHostConfig, SceneRegistry};
use lodestone_engine::window::{Runtime, RuntimeConfig};

use config::SandboxConfig;
use scenes::{clear_color, texture, ClearColor, TextureScene};

fn main() -> anyhow::Result<()> {
    let config = SandboxConfig::from_env();

    init_logging(LoggingConfig {
        log_file: config.log_file.clone(),
        ..LoggingConfig::default()
    });
    log::info!(
        "assets: {}, shaders: {}",
        config.assets_root.display(),
        config.shaders_root.display()
    );

    let mut registry = SceneRegistry::new();
    // ── SCENES ────────────────────────────────────────────────────────────
    {
        let shader = config.shader_path("quad.wgsl");
        let layers: Vec<_> = texture::LAYER_FILES.iter().map(|f| config.texture_path(f)).collect();
        registry.register(texture::NAME, move |ctx| TextureScene::new(ctx, &shader, &layers));
    }
    registry.register(clear_color::NAME, |_| Ok(ClearColor::default()));

    Runtime::run(
        RuntimeConfig {
            title: "Lodestone sandbox".to_string(),
            initial_size: LogicalSize::new(800.0, 800.0),
            resizable: false,
            fullscreen: config.fullscreen,
        },
        GpuInit::default().with_vsync(config.vsync),
        SceneHost::new(registry, SceneHostConfig::default()),
    )
    .context("sandbox runtime failed")
}
