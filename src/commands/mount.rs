//! Mount commands - scoped mounts for image builds.

use anyhow::Result;
use std::path::{Path, PathBuf};

use imagekit::config::Config;
use imagekit::MountManager;

/// How the device gets mounted.
pub enum MountKind {
    /// Standard mount with optional `-o` options
    Standard(Vec<String>),
    /// Bind mount of a directory
    Bind,
    /// In-memory tmpfs, device ignored
    Tmpfs,
}

/// Execute the mount command. Prints the mountpoint in use.
pub fn cmd_mount(
    device: &str,
    mountpoint: Option<&Path>,
    kind: MountKind,
    config: &Config,
) -> Result<PathBuf> {
    let manager = MountManager::with_temp_prefix(device, mountpoint, &config.temp_prefix)?;

    match kind {
        MountKind::Standard(options) => manager.mount(&options)?,
        MountKind::Bind => manager.bind_mount()?,
        MountKind::Tmpfs => manager.tmpfs_mount()?,
    }

    tracing::info!(device, mountpoint = %manager.mountpoint().display(), "mounted");
    println!("{}", manager.mountpoint().display());
    Ok(manager.mountpoint().to_path_buf())
}

/// Execute the umount command.
///
/// Returns false if the mountpoint stayed busy and `raise_on_busy` was off.
pub fn cmd_umount(mountpoint: &Path, lazy: bool, raise_on_busy: bool, config: &Config) -> Result<bool> {
    let manager = MountManager::existing("", mountpoint)?.with_policy(config.retry_policy());

    if lazy {
        manager.umount_lazy()?;
        return Ok(true);
    }
    manager.umount(raise_on_busy)
}

/// Execute the status command.
pub fn cmd_status(mountpoint: &Path) -> Result<bool> {
    let manager = MountManager::existing("", mountpoint)?;
    let mounted = manager.is_mounted();
    println!(
        "{}: {}",
        mountpoint.display(),
        if mounted { "mounted" } else { "not mounted" }
    );
    Ok(mounted)
}
