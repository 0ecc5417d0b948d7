use std::path::{Path, PathBuf};

use crate::cli::output::OutputFormat;
use crate::config::ReplayConfig;

pub struct CliContext {
    config: ReplayConfig,
    config_path: Option<PathBuf>,
    output: OutputFormat,
}

impl CliContext {
    pub fn new(config: ReplayConfig, config_path: Option<PathBuf>, output: OutputFormat) -> Self {
        Self {
            config,
            config_path,
            output,
        }
    }

    pub fn config(&self) -> &ReplayConfig {
        &self.config
    }

    /// File the configuration came from; `None` when running on defaults.
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    pub fn output(&self) -> OutputFormat {
        self.output
    }
}
