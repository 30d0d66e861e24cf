//! imagekit library exports.
//!
//! Building blocks for OS image builds: scoped mounts, a microdnf package
//! manager backend, rpm database helpers and bootloader configuration.

pub mod bootloader;
pub mod common;
pub mod config;
pub mod error;
pub mod log;
pub mod mount;
pub mod package_manager;
pub mod process;
pub mod rpm;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use error::{MountBusyError, RequestError};
pub use mount::MountManager;
