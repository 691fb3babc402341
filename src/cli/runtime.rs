use std::path::PathBuf;

use anyhow::{Context, Result};
use gp_moderation_policy::{LoadOptions, SharedModerationCenter};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const LOCAL_CONFIG: &str = "config/moderation.yaml";

pub fn init_logging(level: &str, debug: bool) -> Result<()> {
    let level = if debug {
        tracing::Level::DEBUG
    } else {
        level.parse().context("Invalid log level")?
    };

    // stdout carries command output; diagnostics go to stderr.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.to_string())),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    Ok(())
}

pub struct LoadedConfig {
    pub center: SharedModerationCenter,
    pub path: PathBuf,
    pub found: bool,
}

pub fn resolve_config_path(config_path: Option<&PathBuf>) -> Result<PathBuf> {
    if let Some(path) = config_path {
        return Ok(path.clone());
    }
    // Priority: ./config/moderation.yaml > ~/.config/gp-moderation/moderation.yaml
    let local_config = PathBuf::from(LOCAL_CONFIG);
    if local_config.exists() {
        return Ok(local_config);
    }
    let mut path = dirs::config_dir().context("Failed to get config directory")?;
    path.push("gp-moderation");
    path.push("moderation.yaml");
    Ok(path)
}

pub fn load_config(config_path: Option<&PathBuf>) -> Result<LoadedConfig> {
    let path = resolve_config_path(config_path)?;
    let found = path.exists();
    if found {
        info!("Loading moderation configuration from: {}", path.display());
    } else {
        warn!(
            "Config file not found, using defaults: {}",
            path.display()
        );
    }

    let center = SharedModerationCenter::load(LoadOptions::with_path(path.clone()))
        .with_context(|| format!("Failed to load moderation configuration {}", path.display()))?;

    Ok(LoadedConfig {
        center,
        path,
        found,
    })
}
