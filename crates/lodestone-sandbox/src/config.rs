use std::path::PathBuf;

pub const ASSETS_VAR: &str = "LODESTONE_ASSETS";
pub const SHADERS_VAR: &str = "LODESTONE_SHADERS";

/// Startup settings for the sandbox binary.
#[derive(Debug, Clone, PartialEq)]
pub struct SandboxConfig {
    /// Root of `textures/`.
    pub assets_root: PathBuf,
    pub shaders_root: PathBuf,
    pub vsync: bool,
    pub fullscreen: bool,
    /// Session log, appended to. `None` logs to stderr.
    pub log_file: Option<PathBuf>,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        let crate_root = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        Self {
            assets_root: crate_root.join("assets"),
            shaders_root: crate_root.join("shaders"),
            vsync: false,
            fullscreen: false,
            log_file: Some(PathBuf::from("log.txt")),
        }
    }
}

impl SandboxConfig {
    pub fn from_env() -> Self {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Defaults, with the roots replaced by any non-empty variable `lookup` yields.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(dir) = non_empty(ASSETS_VAR) {
            config.assets_root = PathBuf::from(dir);
        }
        if let Some(dir) = non_empty(SHADERS_VAR) {
            config.shaders_root = PathBuf::from(dir);
        }
        config
    }

    pub fn texture_path(&self, file: &str) -> PathBuf {
        self.assets_root.join("textures").join(file)
    }

    pub fn shader_path(&self, file: &str) -> PathBuf {
        self.shaders_root.join(file)
    }
}
