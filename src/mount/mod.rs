//! Mount lifecycle management for a single device/mountpoint pair.
//!
//! A [`MountManager`] never caches whether it is mounted; every operation asks
//! the host through `mountpoint -q`, so a mount changed behind our back is
//! still handled correctly. The manager also never unmounts on its own:
//! whoever mounted is responsible for calling [`MountManager::umount`] or
//! [`MountManager::umount_lazy`] before dropping it.

mod retry;

pub use retry::{
    Delay, RetryPolicy, ThreadDelay, UmountAttempt, DEFAULT_UMOUNT_ATTEMPTS, DEFAULT_UMOUNT_DELAY,
};

use anyhow::{bail, Result};
use std::path::{Path, PathBuf};

use crate::common::{ensure_dir_exists, new_temp_dir};
use crate::error::MountBusyError;
use crate::log::{Log, TracingLog};
use crate::process::{Cmd, CommandRunner, HostRunner};

/// Prefix of mountpoint directories allocated when none is given.
pub const DEFAULT_TEMP_PREFIX: &str = "imagekit_mount_manager.";

const COMPONENT: &str = "MountManager";

/// Mounts and unmounts one device at one mountpoint.
#[derive(Debug)]
pub struct MountManager<R = HostRunner, D = ThreadDelay, L = TracingLog> {
    device: String,
    mountpoint: PathBuf,
    runner: R,
    delay: D,
    log: L,
    policy: RetryPolicy,
}

impl MountManager {
    /// Create a manager for `device`.
    ///
    /// With no (or an empty) mountpoint a fresh temporary directory is
    /// allocated; it is not removed by the manager. A given mountpoint is
    /// created if missing and used verbatim.
    pub fn new(device: impl Into<String>, mountpoint: Option<&Path>) -> Result<Self> {
        Self::with_temp_prefix(device, mountpoint, DEFAULT_TEMP_PREFIX)
    }

    /// Like [`MountManager::new`], naming allocated directories with `prefix`.
    pub fn with_temp_prefix(
        device: impl Into<String>,
        mountpoint: Option<&Path>,
        prefix: &str,
    ) -> Result<Self> {
        let mountpoint = match mountpoint {
            Some(path) if !path.as_os_str().is_empty() => {
                require_utf8(path)?;
                ensure_dir_exists(path)?;
                path.to_path_buf()
            }
            _ => new_temp_dir(prefix)?,
        };

        Ok(Self::from_parts(device.into(), mountpoint))
    }

    /// Create a manager for a mountpoint that must already exist.
    ///
    /// Nothing is created on the host, which makes this the constructor for
    /// queries and unmounts of a path someone else set up.
    pub fn existing(device: impl Into<String>, mountpoint: &Path) -> Result<Self> {
        require_utf8(mountpoint)?;
        if !mountpoint.is_dir() {
            bail!("Mountpoint {} does not exist", mountpoint.display());
        }

        Ok(Self::from_parts(device.into(), mountpoint.to_path_buf()))
    }

    fn from_parts(device: String, mountpoint: PathBuf) -> Self {
        Self {
            device,
            mountpoint,
            runner: HostRunner,
            delay: ThreadDelay,
            log: TracingLog::new(COMPONENT),
            policy: RetryPolicy::default(),
        }
    }
}

/// Mount tools take the mountpoint as text; a lossy conversion would target
/// another path.
fn require_utf8(path: &Path) -> Result<()> {
    if path.to_str().is_none() {
        bail!("Mountpoint is not valid UTF-8: {}", path.display());
    }
    Ok(())
}

impl<R, D, L> MountManager<R, D, L> {
    /// Execute commands through `runner` instead of the host.
    pub fn with_runner<R2: CommandRunner>(self, runner: R2) -> MountManager<R2, D, L> {
        MountManager {
            device: self.device,
            mountpoint: self.mountpoint,
            runner,
            delay: self.delay,
            log: self.log,
            policy: self.policy,
        }
    }

    /// Wait between unmount attempts through `delay`.
    pub fn with_delay<D2: Delay>(self, delay: D2) -> MountManager<R, D2, L> {
        MountManager {
            device: self.device,
            mountpoint: self.mountpoint,
            runner: self.runner,
            delay,
            log: self.log,
            policy: self.policy,
        }
    }

    /// Report diagnostics to `log`.
    pub fn with_log<L2: Log>(self, log: L2) -> MountManager<R, D, L2> {
        MountManager {
            device: self.device,
            mountpoint: self.mountpoint,
            runner: self.runner,
            delay: self.delay,
            log,
            policy: self.policy,
        }
    }

    /// Retry graceful unmounts according to `policy`.
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Device, image file or source directory passed to `mount`.
    pub fn device(&self) -> &str {
        &self.device
    }

    /// Directory the device is mounted on.
    pub fn mountpoint(&self) -> &Path {
        &self.mountpoint
    }

    /// Retry policy used by [`MountManager::umount`].
    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }
}

impl<R: CommandRunner, D: Delay, L: Log> MountManager<R, D, L> {
    /// Check whether something is mounted at the mountpoint.
    ///
    /// A probe that cannot even be executed counts as "not mounted".
    pub fn is_mounted(&self) -> bool {
        let probe = Cmd::new("mountpoint")
            .arg("-q")
            .arg_path(&self.mountpoint)
            .allow_fail();

        self.runner
            .run(&probe)
            .map(|result| result.success())
            .unwrap_or(false)
    }

    /// Standard mount of the device, optionally with `-o a,b,...`.
    pub fn mount<S: AsRef<str>>(&self, options: &[S]) -> Result<()> {
        if self.is_mounted() {
            return Ok(());
        }

        let mut cmd = Cmd::new("mount");
        if !options.is_empty() {
            let joined: Vec<&str> = options.iter().map(AsRef::as_ref).collect();
            cmd = cmd.arg("-o").arg(joined.join(","));
        }
        let cmd = cmd.arg(&self.device).arg_path(&self.mountpoint);

        self.runner.run(&cmd)?;
        Ok(())
    }

    /// Bind mount the device path to the mountpoint without touching mtab.
    pub fn bind_mount(&self) -> Result<()> {
        if self.is_mounted() {
            return Ok(());
        }

        let cmd = Cmd::new("mount")
            .args(["-n", "--bind"])
            .arg(&self.device)
            .arg_path(&self.mountpoint);
        self.runner.run(&cmd)?;
        Ok(())
    }

    /// Mount a tmpfs at the mountpoint. The device is ignored.
    pub fn tmpfs_mount(&self) -> Result<()> {
        if self.is_mounted() {
            return Ok(());
        }

        let cmd = Cmd::new("mount")
            .args(["-t", "tmpfs", "tmpfs"])
            .arg_path(&self.mountpoint);
        self.runner.run(&cmd)?;
        Ok(())
    }

    /// Detach the mount immediately; the kernel releases it once idle.
    pub fn umount_lazy(&self) -> Result<()> {
        if !self.is_mounted() {
            return Ok(());
        }

        let cmd = Cmd::new("umount").arg("-l").arg_path(&self.mountpoint);
        self.runner.run(&cmd)?;
        Ok(())
    }

    /// Unmount, retrying while the mountpoint is busy.
    ///
    /// Returns `Ok(true)` once nothing is mounted. If every attempt fails and
    /// `raise_on_busy` is set, fails with [`MountBusyError`]; otherwise logs a
    /// warning and returns `Ok(false)`, leaving the decision to the caller.
    pub fn umount(&self, raise_on_busy: bool) -> Result<bool> {
        if !self.is_mounted() {
            return Ok(true);
        }

        if self.umount_with_retries() {
            return Ok(true);
        }

        if raise_on_busy {
            return Err(MountBusyError {
                mountpoint: self.mountpoint.clone(),
                open_files: self.open_files_info(),
            }
            .into());
        }

        self.log.warn(&format!(
            "{} still busy at {}",
            self.mountpoint.display(),
            COMPONENT
        ));
        Ok(false)
    }

    fn umount_with_retries(&self) -> bool {
        // Busy is only declared after at least one real attempt.
        for attempt in 0..self.policy.attempts.max(1) {
            match self.try_umount() {
                UmountAttempt::Released => return true,
                UmountAttempt::Failed(reason) => {
                    self.log.warn(&format!(
                        "{} umount of {} failed, try again in {}s: {:#}",
                        attempt,
                        self.mountpoint.display(),
                        self.policy.delay.as_secs_f64(),
                        reason
                    ));
                    self.delay.sleep(self.policy.delay);
                }
            }
        }
        false
    }

    fn try_umount(&self) -> UmountAttempt {
        let cmd = Cmd::new("umount").arg_path(&self.mountpoint);
        self.runner.run(&cmd).map(|_| ()).into()
    }

    /// Describe who keeps the mountpoint busy, as far as we can tell.
    fn open_files_info(&self) -> String {
        let Some(lsof) = self.runner.which("lsof") else {
            return "For further details install: lsof".to_string();
        };

        let cmd = Cmd::new(lsof.to_string_lossy())
            .args(["+c", "0"])
            .arg_path(&self.mountpoint)
            .allow_fail();
        match self.runner.run(&cmd) {
            Ok(result) => format!("Open files status:\n{}", result.stdout),
            Err(err) => format!("Open files status unavailable: {:#}", err),
        }
    }
}
