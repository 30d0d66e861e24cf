//! Shared utilities across imagekit modules.

pub mod paths;
pub mod temp;

pub use paths::{ensure_dir_exists, ensure_parent_exists, move_to_root};
pub use temp::new_temp_dir;
