//! Workspace configuration, read from `marksd.toml` in the workspace directory.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::calc::{DEFAULT_PASS_THRESHOLD, MAX_MARK};
use crate::ranking::DEFAULT_RANK_SIZE;

pub const CONFIG_FILE_NAME: &str = "marksd.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    default,
    rename_all(serialize = "camelCase", deserialize = "snake_case"),
    deny_unknown_fields
)]
pub struct Config {
    /// Marks at or above this count as a pass.
    pub pass_threshold: i64,
    /// Length of each list returned by class ranking.
    pub rank_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pass_threshold: DEFAULT_PASS_THRESHOLD,
            rank_size: DEFAULT_RANK_SIZE,
        }
    }
}

impl Config {
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `marksd.toml` from the workspace; `None` when the file is absent.
    pub fn load_from_workspace(workspace: &Path) -> anyhow::Result<Option<Self>> {
        let path = workspace.join(CONFIG_FILE_NAME);
        if !path.is_file() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config = Self::from_toml_str(&content)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(Some(config))
    }

    fn validate(&self) -> anyhow::Result<()> {
        if !(0..=MAX_MARK).contains(&self.pass_threshold) {
            anyhow::bail!(
                "pass_threshold must be between 0 and {}, got {}",
                MAX_MARK,
                self.pass_threshold
            );
        }
        Ok(())
    }
}
