//! RPM database and macro handling inside an image root.
//!
//! The package manager backends install into `root_dir` from the host, so the
//! rpm database may end up where the host rpm expects it rather than where the
//! image rpm does. [`RpmDataBase`] moves it; [`RpmMacros`] manages the macro
//! file used to steer rpm during the build.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let rpmdb = RpmDataBase::new(root_dir);
//! if rpmdb.has_rpm() {
//!     rpmdb.set_database_to_image_path()?;
//! }
//! ```

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::common::ensure_parent_exists;
use crate::process::{Cmd, CommandRunner, HostRunner};

/// Macro directory relative to the image root.
pub const MACROS_DIR: &str = "usr/lib/rpm/macros.d";

/// Macro file written while building an image and wiped afterwards.
pub const IMAGE_CONFIG_MACROS: &str = "macros.imagekit-image-config";

/// An rpm macro file below [`MACROS_DIR`] of an image root.
#[derive(Debug, Clone)]
pub struct RpmMacros {
    root_dir: PathBuf,
    name: String,
    macros: Vec<String>,
}

impl RpmMacros {
    pub fn new(root_dir: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            root_dir: root_dir.into(),
            name: name.into(),
            macros: Vec::new(),
        }
    }

    /// Location of the macro file on the host.
    pub fn config_path(&self) -> PathBuf {
        self.root_dir.join(MACROS_DIR).join(&self.name)
    }

    /// Queue a macro definition, given as `name value` without the `%`.
    pub fn set_macro(&mut self, definition: &str) {
        self.macros.push(format!("%{}", definition.trim_start_matches('%')));
    }

    pub fn macros(&self) -> &[String] {
        &self.macros
    }

    /// Write all queued macros, replacing the file.
    pub fn write_config(&self) -> Result<()> {
        let path = self.config_path();
        ensure_parent_exists(&path)?;

        let mut content = self.macros.join("\n");
        content.push('\n');
        fs::write(&path, content)
            .with_context(|| format!("Failed to write rpm macros: {}", path.display()))
    }

    /// Remove the macro file. Missing files are fine.
    pub fn wipe_config(&self) -> Result<()> {
        let path = self.config_path();
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e)
                .with_context(|| format!("Failed to remove rpm macros: {}", path.display())),
        }
    }
}

/// The rpm database of an image root.
pub struct RpmDataBase<R = HostRunner> {
    root_dir: PathBuf,
    runner: R,
}

impl RpmDataBase {
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self::with_runner(root_dir, HostRunner)
    }
}

impl<R: CommandRunner> RpmDataBase<R> {
    pub fn with_runner(root_dir: impl Into<PathBuf>, runner: R) -> Self {
        Self {
            root_dir: root_dir.into(),
            runner,
        }
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// True if the image root ships an rpm binary of its own.
    pub fn has_rpm(&self) -> bool {
        ["usr/bin/rpm", "bin/rpm"]
            .iter()
            .any(|rel| self.root_dir.join(rel).is_file())
    }

    /// Ask the image rpm where it keeps its database.
    pub fn image_dbpath(&self) -> Result<String> {
        let result = self.runner.run(
            &Cmd::new("chroot")
                .arg_path(&self.root_dir)
                .args(["rpm", "-E", "%_dbpath"])
                .error_msg("Failed to query rpm database path in image"),
        )?;

        let dbpath = result.stdout_trimmed();
        if dbpath.is_empty() || dbpath.starts_with('%') {
            bail!(
                "Image rpm in {} did not expand %_dbpath",
                self.root_dir.display()
            );
        }
        Ok(dbpath.to_string())
    }

    /// Point rpm at the image database location and rebuild it there.
    pub fn set_database_to_image_path(&self) -> Result<()> {
        let dbpath = self.image_dbpath()?;

        let mut macros = RpmMacros::new(&self.root_dir, IMAGE_CONFIG_MACROS);
        macros.set_macro(&format!("_dbpath {}", dbpath));
        macros.write_config()?;

        self.runner.run(
            &Cmd::new("chroot")
                .arg_path(&self.root_dir)
                .args(["rpm", "--rebuilddb"])
                .error_msg("Failed to rebuild rpm database in image"),
        )?;
        Ok(())
    }
}
