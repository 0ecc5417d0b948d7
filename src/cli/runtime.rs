use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::fs;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::ReplayConfig;

const LOCAL_CONFIG: &str = "config/soulreplay.yaml";

pub fn init_logging(level: &str, debug: bool) -> Result<()> {
    let level = if debug {
        tracing::Level::DEBUG
    } else {
        level.parse().context("Invalid log level")?
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.to_string())),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    Ok(())
}

#[derive(Debug)]
pub struct LoadedConfig {
    pub config: ReplayConfig,
    pub path: Option<PathBuf>,
}

/// Resolve the configuration file: explicit path, then the working
/// directory, then the user config directory.
pub fn config_candidates(explicit: Option<&PathBuf>) -> Vec<PathBuf> {
    if let Some(path) = explicit {
        return vec![path.clone()];
    }
    let mut candidates = vec![PathBuf::from(LOCAL_CONFIG)];
    if let Some(mut path) = dirs::config_dir() {
        path.push("soulreplay");
        path.push("config.yaml");
        candidates.push(path);
    }
    candidates
}

pub async fn load_config(config_path: Option<&PathBuf>) -> Result<LoadedConfig> {
    for candidate in config_candidates(config_path) {
        if candidate.exists() {
            let config = read_config(&candidate).await?;
            info!("Loaded configuration from: {}", candidate.display());
            return Ok(LoadedConfig {
                config,
                path: Some(candidate),
            });
        }
        if config_path.is_some() {
            anyhow::bail!("Config file not found: {}", candidate.display());
        }
    }

    warn!("Config file not found, using defaults");
    Ok(LoadedConfig {
        config: ReplayConfig::default(),
        path: None,
    })
}

async fn read_config(path: &Path) -> Result<ReplayConfig> {
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    ReplayConfig::from_yaml(&content)
        .with_context(|| format!("Failed to parse config file {}", path.display()))
}
