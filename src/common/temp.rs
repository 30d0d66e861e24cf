//! Utilities for managing temporary work directories.

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Allocate a uniquely named directory in the system temp dir.
///
/// The directory is handed over to the caller: it is not removed when the
/// returned path goes out of scope. Remove it once done.
///
/// # Arguments
/// * `prefix` - Name prefix identifying the owner (e.g., "imagekit_mount_manager.")
pub fn new_temp_dir(prefix: &str) -> Result<PathBuf> {
    let dir = tempfile::Builder::new()
        .prefix(prefix)
        .tempdir()
        .with_context(|| format!("Failed to create temporary directory with prefix '{}'", prefix))?;
    Ok(dir.keep())
}
