use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Once;
use std::time::{SystemTime, UNIX_EPOCH};

/// How [`init_logging`] sets up the global logger.
///
/// `env_filter` uses `env_logger` directives such as
/// `"lodestone_engine=debug,wgpu=warn"`; without it `RUST_LOG` applies, then
/// `info`. With `log_file` set, records are appended to that file uncolored
/// instead of going to stderr.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub env_filter: Option<String>,
    pub write_style: env_logger::WriteStyle,
    pub log_file: Option<PathBuf>,
    /// Emit a session banner as the first record.
    pub banner: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            write_style: env_logger::WriteStyle::Auto,
            log_file: None,
            banner: true,
        }
    }
}

static LOGGER: Once = Once::new();

/// Installs the global logger. Only the first call has any effect.
pub fn init_logging(config: LoggingConfig) {
    LOGGER.call_once(|| {
        let mut builder = env_logger::Builder::new();

        if let Some(filter) = config.env_filter.as_deref() {
            builder.parse_filters(filter);
        } else if let Ok(filter) = std::env::var("RUST_LOG") {
            builder.parse_filters(&filter);
        } else {
            builder.filter_level(log::LevelFilter::Info);
        }

        let mut file_error = None;
        match config.log_file.as_ref() {
            Some(path) => match OpenOptions::new().create(true).append(true).open(path) {
                Ok(file) => {
                    builder.target(env_logger::Target::Pipe(Box::new(file)));
                    builder.write_style(env_logger::WriteStyle::Never);
                }
                Err(e) => {
                    builder.write_style(config.write_style);
                    file_error = Some(format!("{}: {e}", path.display()));
                }
            },
            None => {
                builder.write_style(config.write_style);
            }
        }

        builder.init();

        if let Some(err) = file_error {
            log::warn!("could not open log file, logging to stderr instead ({err})");
        }

        if config.banner {
            let since_epoch = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or_default();
            log::info!("======== session started (unix time {since_epoch}) ========");
        }

    });
}
