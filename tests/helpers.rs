//! Shared test utilities for imagekit tests.

#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use imagekit::package_manager::{DnfRuntimeConfig, SharedDnfDir};

/// Test environment with a temporary image root and mountpoint.
pub struct TestEnv {
    /// Temporary directory (kept alive for lifetime of TestEnv)
    pub _temp_dir: TempDir,
    /// Mock image root
    pub root: PathBuf,
    /// Mountpoint that does not exist yet
    pub mountpoint: PathBuf,
}

impl TestEnv {
    /// Create a new test environment with temporary directories.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let root = temp_dir.path().join("root");
        let mountpoint = temp_dir.path().join("mnt/image");

        fs::create_dir_all(&root).expect("Failed to create root dir");

        Self {
            _temp_dir: temp_dir,
            root,
            mountpoint,
        }
    }

    /// Runtime config pointing microdnf at the mock root.
    pub fn dnf_config(&self) -> DnfRuntimeConfig {
        DnfRuntimeConfig {
            root_dir: self.root.clone(),
            dnf_args: vec![
                "--config".to_string(),
                self.root.join("dnf.conf").display().to_string(),
                "-y".to_string(),
            ],
            command_env: Default::default(),
            shared_dnf_dir: SharedDnfDir {
                reposd_dir: PathBuf::from("/var/cache/imagekit/dnf/repos"),
                cache_dir: PathBuf::from("/var/cache/imagekit/dnf/cache"),
                pluginconf_dir: PathBuf::from("/var/cache/imagekit/dnf/pluginconf"),
                vars_dir: PathBuf::from("/var/cache/imagekit/dnf/vars"),
            },
        }
    }

    pub fn root_str(&self) -> String {
        self.root.display().to_string()
    }
}

/// Create a mock executable file.
pub fn create_mock_binary(path: &Path) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create parent dir for binary");
    }

    fs::write(path, "#!/bin/sh\necho mock\n").expect("Failed to create mock binary");

    let mut perms = fs::metadata(path).expect("Failed to get metadata").permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms).expect("Failed to set permissions");
}

/// Convert a list of literals into an argv vector.
pub fn argv(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
