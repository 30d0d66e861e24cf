//! Runtime configuration of the dnf family backends.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Host side directories shared with the image build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SharedDnfDir {
    pub reposd_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub pluginconf_dir: PathBuf,
    pub vars_dir: PathBuf,
}

/// Everything a dnf style backend needs to know about the target root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnfRuntimeConfig {
    /// Image root packages are installed into.
    pub root_dir: PathBuf,
    /// Arguments passed to every dnf call (e.g. `--config <file> -y`).
    #[serde(default)]
    pub dnf_args: Vec<String>,
    /// Environment overrides for every call.
    #[serde(default)]
    pub command_env: BTreeMap<String, String>,
    pub shared_dnf_dir: SharedDnfDir,
}

impl DnfRuntimeConfig {
    /// Load from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid package manager config: {}", path.display()))
    }
}

/// Repository module streams to switch before installing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryModules {
    #[serde(default)]
    pub disable: Vec<String>,
    /// Entries are `name` or `name:stream`.
    #[serde(default)]
    pub enable: Vec<String>,
}
