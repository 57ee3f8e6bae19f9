//! Shared setup for every subcommand.

use std::path::PathBuf;

use clap::Args;
use tokio_util::sync::CancellationToken;
use tracing::info;

use meshview::app::{ViewerConfig, ENV_CACHE_DIR, ENV_LOG_DIR, ENV_SERVER_URL, ENV_TILE_URL};
use meshview::logging::init_logging;
use meshview::supervisor::install_fatal_hook;

use crate::error::CliError;

/// Options accepted by every subcommand. Flags override the environment.
#[derive(Debug, Clone, Default, Args)]
pub struct GlobalArgs {
    /// Server base URL (overrides MESHVIEW_SERVER_URL)
    #[arg(long, global = true)]
    pub server: Option<String>,

    /// Tile cache directory (overrides MESHVIEW_CACHE_DIR)
    #[arg(long, global = true)]
    pub cache_dir: Option<PathBuf>,

    /// Log directory (overrides MESHVIEW_LOG_DIR)
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    /// Tile URL template with {z}, {x} and {y} (overrides MESHVIEW_TILE_URL)
    #[arg(long, global = true)]
    pub tile_url: Option<String>,
}

impl GlobalArgs {
    /// Flag value for a configuration key, if given and non-empty.
    fn flag(&self, key: &str) -> Option<String> {
        let path = |dir: &Option<PathBuf>| {
            dir.as_ref()
                .map(|dir| dir.to_string_lossy().into_owned())
        };
        match key {
            ENV_SERVER_URL => self.server.clone(),
            ENV_TILE_URL => self.tile_url.clone(),
            ENV_CACHE_DIR => path(&self.cache_dir),
            ENV_LOG_DIR => path(&self.log_dir),
            _ => None,
        }
        .filter(|value| !value.trim().is_empty())
    }

    /// Build the configuration with flags layered over `env`.
    ///
    /// Validation runs once on the merged values, so a flag can replace a
    /// broken environment variable.
    pub fn resolve<F>(&self, env: F) -> Result<ViewerConfig, CliError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(ViewerConfig::from_lookup(|key| {
            self.flag(key).or_else(|| env(key))
        })?)
    }
}

/// Resolved configuration plus process-wide setup.
pub struct CliRunner {
    config: ViewerConfig,
}

impl CliRunner {
    /// Resolve configuration, start logging and install the fatal fault hook.
    pub fn new(args: &GlobalArgs) -> Result<Self, CliError> {
        let config = args.resolve(|key| std::env::var(key).ok())?;
        init_logging(&config.log_dir)?;
        install_fatal_hook();
        Ok(Self { config })
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn into_config(self) -> ViewerConfig {
        self.config
    }

    pub fn log_startup(&self, command: &str) {
        info!(
            command,
            server = %self.config.server_url,
            cache = %self.config.cache_dir.display(),
            "meshview {}",
            meshview::VERSION
        );
    }

    /// Token cancelled by Ctrl+C or SIGTERM.
    pub fn shutdown_token(&self) -> Result<CancellationToken, CliError> {
        let token = CancellationToken::new();
        let handler_token = token.clone();
        ctrlc::set_handler(move || {
            info!("Received shutdown signal");
            handler_token.cancel();
        })
        .map_err(|e| CliError::Config(format!("Failed to set signal handler: {}", e)))?;
        Ok(token)
    }
}
