use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::net::{DEFAULT_MAX_STEPS, ExecutionOptions};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct SimConfig {
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
    #[serde(default)]
    pub seed: Option<u64>,
    /// Log connectivity warnings before running.
    #[serde(default = "default_diagnostics")]
    pub diagnostics: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            max_steps: default_max_steps(),
            seed: None,
            diagnostics: default_diagnostics(),
        }
    }
}

impl SimConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            log::debug!("config file {:?} not found, using defaults", path);
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: SimConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;
        Ok(config)
    }

    pub fn execution_options(&self) -> ExecutionOptions {
        ExecutionOptions {
            max_steps: self.max_steps,
            seed: self.seed,
            observer: None,
        }
    }
}

fn default_max_steps() -> usize {
    DEFAULT_MAX_STEPS
}

fn default_diagnostics() -> bool {
    true
}
