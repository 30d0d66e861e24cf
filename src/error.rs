//! Distinguished failure kinds.
//!
//! Everything is propagated as `anyhow::Error`; callers that need to react to
//! a specific condition use `err.downcast_ref::<MountBusyError>()`.

use std::path::PathBuf;

/// A mountpoint stayed busy after every unmount attempt.
///
/// The message is written for the operator running the image build.
#[derive(Debug, thiserror::Error)]
#[error(
    "\n\nFailed to umount: {}.\n\n\
     Your build host system is in an inconsistent state.\n\
     The cleanup of the created resource was not possible\n\
     because it is still busy. This resource and all nested\n\
     resources stays active on your host and needs a manual\n\
     cleanup.\n\n\
     Please do not use the intermediate state of the image\n\
     files created so far. There is no guarantee that the\n\
     produced results are valid.\n\n\
     {open_files}\n",
    .mountpoint.display()
)]
pub struct MountBusyError {
    pub mountpoint: PathBuf,
    /// Open file listing, or a hint how to obtain one.
    pub open_files: String,
}

/// A package manager request could not be processed.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct RequestError(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_busy_message_is_operator_facing() {
        let err = MountBusyError {
            mountpoint: PathBuf::from("/tmp/imagekit_mount_manager.abc"),
            open_files: "For further details install: lsof".to_string(),
        };
        let msg = err.to_string();

        assert!(msg.contains("Failed to umount: /tmp/imagekit_mount_manager.abc."));
        assert!(msg.contains("inconsistent state"));
        assert!(msg.contains("manual\ncleanup"));
        assert!(msg.contains("Please do not use the intermediate state"));
        assert!(msg.ends_with("For further details install: lsof\n"));
    }

    #[test]
    fn test_busy_error_survives_anyhow() {
        let err: anyhow::Error = MountBusyError {
            mountpoint: PathBuf::from("/mnt"),
            open_files: String::new(),
        }
        .into();

        let busy = err.downcast_ref::<MountBusyError>().unwrap();
        assert_eq!(busy.mountpoint, PathBuf::from("/mnt"));
    }
}
