//! Bounded retry for graceful unmounts.

use std::thread;
use std::time::Duration;

/// Default number of `umount` attempts before giving up.
pub const DEFAULT_UMOUNT_ATTEMPTS: u32 = 10;

/// Default wait after a failed attempt.
pub const DEFAULT_UMOUNT_DELAY: Duration = Duration::from_secs(1);

/// How hard `umount` tries before the mount is declared busy.
///
/// An `attempts` of zero still makes one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_UMOUNT_ATTEMPTS,
            delay: DEFAULT_UMOUNT_DELAY,
        }
    }
}

/// Outcome of a single `umount` invocation.
///
/// A busy mountpoint and any other command failure both end up in
/// `Failed`; the retry loop treats them the same.
#[derive(Debug)]
pub enum UmountAttempt {
    Released,
    Failed(anyhow::Error),
}

impl From<anyhow::Result<()>> for UmountAttempt {
    fn from(result: anyhow::Result<()>) -> Self {
        match result {
            Ok(()) => Self::Released,
            Err(err) => Self::Failed(err),
        }
    }
}

/// Blocks the calling thread between attempts.
pub trait Delay {
    fn sleep(&self, duration: Duration);
}

impl<D: Delay + ?Sized> Delay for &D {
    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}

/// Real wall-clock delay.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadDelay;

impl Delay for ThreadDelay {
    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}
