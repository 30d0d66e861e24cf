//! Utilities for path checking and directory management.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Ensure a directory exists, creating it if necessary.
///
/// This is a convenience wrapper around fs::create_dir_all that doesn't fail
/// if the directory already exists.
///
/// # Arguments
/// * `path` - Path to the directory
pub fn ensure_dir_exists(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .with_context(|| format!("Failed to create directory {}", path.display()))?;
    Ok(())
}

/// Ensure all parent directories of a file exist.
///
/// Creates all parent directories of the given path. If the path has no parents,
/// does nothing (doesn't error).
pub fn ensure_parent_exists(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir_exists(parent)?;
    }
    Ok(())
}

/// Rewrite host paths below `root` so they are valid inside a chroot of `root`.
///
/// Arguments that do not start with `root` are passed through untouched, so
/// `["--config", "/image/dnf.conf", "-y"]` under root `/image` becomes
/// `["--config", "/dnf.conf", "-y"]`.
pub fn move_to_root(root: &Path, args: &[String]) -> Vec<String> {
    let root = root.to_string_lossy();
    let root = root.trim_end_matches('/');

    args.iter()
        .map(|arg| match arg.strip_prefix(root) {
            Some(rest) if !root.is_empty() && rest.starts_with('/') => rest.to_string(),
            Some("") if !root.is_empty() => "/".to_string(),
            _ => arg.clone(),
        })
        .collect()
}
