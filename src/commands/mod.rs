//! CLI command handlers.
//!
//! Each submodule handles a specific CLI command:
//! - `mount` - Mount, unmount and probe mountpoints
//! - `packages` - Drive the microdnf backend against an image root
//! - `show` - Display information

pub mod mount;
pub mod packages;
pub mod show;

pub use mount::{cmd_mount, cmd_status, cmd_umount};
pub use packages::cmd_packages;
pub use show::cmd_show;
