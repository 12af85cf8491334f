use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::connection::{Connection, ConnectionSource};
use crate::error::HookError;

const DEFAULT_CONFIG_NAME: &str = "slackhook.toml";

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub connections: HashMap<String, Connection>,
}

impl Config {
    /// Load configuration from an explicit path, or search upward from current dir.
    ///
    /// An explicit path must exist. When searching, a missing file yields an
    /// empty configuration.
    pub fn load(path_override: Option<PathBuf>) -> Result<Self> {
        let path = match path_override {
            Some(p) => p,
            None => {
                let cwd = std::env::current_dir().context("Reading current directory")?;
                match find_upwards(&cwd, DEFAULT_CONFIG_NAME) {
                    Some(p) => p,
                    None => return Ok(Config::default()),
                }
            }
        };

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Reading config file {}", path.display()))?;
        Self::from_toml(&contents).with_context(|| format!("Parsing TOML config {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }
}

impl ConnectionSource for Config {
    fn lookup(&self, name: &str) -> Result<Connection, HookError> {
        self.connections.lookup(name)
    }
}

/// Nearest `file_name` in `start` or one of its ancestors.
fn find_upwards(start: &Path, file_name: &str) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(file_name))
        .find(|candidate| candidate.is_file())
}
