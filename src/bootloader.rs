//! Bootloader configuration for loaders following the Boot Loader Specification.
//!
//! [`SystemdSpecLoader`] provides the image-type entry points (disk, install
//! ISO, live ISO). They record the boot parameters in `custom_args` and hand
//! off to the loader-specific hooks with the matching [`BootTarget`].

use anyhow::Result;
use std::collections::BTreeMap;
use std::fmt;

/// Boot parameters collected for the loader hooks.
pub type CustomArgs = BTreeMap<String, String>;

/// Kind of image a loader is configured for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BootTarget {
    Disk,
    Install,
    Live,
}

impl BootTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disk => "disk",
            Self::Install => "install(iso)",
            Self::Live => "live(iso)",
        }
    }
}

impl fmt::Display for BootTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A bootloader driven through the Boot Loader Specification.
///
/// Implementors supply storage for `custom_args` and the three hooks; the
/// image-type entry points are provided.
pub trait SystemdSpecLoader {
    fn custom_args(&self) -> &CustomArgs;
    fn custom_args_mut(&mut self) -> &mut CustomArgs;

    /// Install the loader itself for `target`.
    fn setup_loader(&mut self, target: BootTarget) -> Result<()>;

    /// Write the boot entry for `target`.
    fn set_loader_entry(&mut self, target: BootTarget) -> Result<()>;

    /// Produce the bootable loader image for `target`.
    fn create_loader_image(&mut self, target: BootTarget) -> Result<()>;

    #[allow(clippy::too_many_arguments)]
    fn setup_disk_image_config(
        &mut self,
        boot_uuid: &str,
        root_uuid: &str,
        _hypervisor: &str,
        kernel: &str,
        initrd: &str,
        boot_options: &str,
    ) -> Result<()> {
        record(
            self.custom_args_mut(),
            [
                ("boot_uuid", boot_uuid),
                ("root_uuid", root_uuid),
                ("kernel", kernel),
                ("initrd", initrd),
                ("boot_options", boot_options),
            ],
        );
        self.setup_loader(BootTarget::Disk)?;
        self.set_loader_entry(BootTarget::Disk)
    }

    fn setup_install_image_config(
        &mut self,
        mbrid: &str,
        _hypervisor: &str,
        kernel: &str,
        initrd: &str,
    ) -> Result<()> {
        record(
            self.custom_args_mut(),
            [("mbrid", mbrid), ("kernel", kernel), ("initrd", initrd)],
        );
        self.setup_loader(BootTarget::Install)?;
        self.set_loader_entry(BootTarget::Install)
    }

    fn setup_live_image_config(
        &mut self,
        mbrid: &str,
        _hypervisor: &str,
        kernel: &str,
        initrd: &str,
    ) -> Result<()> {
        record(
            self.custom_args_mut(),
            [("mbrid", mbrid), ("kernel", kernel), ("initrd", initrd)],
        );
        self.setup_loader(BootTarget::Live)?;
        self.set_loader_entry(BootTarget::Live)
    }

    fn setup_disk_boot_images(&mut self, boot_uuid: &str) -> Result<()> {
        record(self.custom_args_mut(), [("boot_uuid", boot_uuid)]);
        self.create_loader_image(BootTarget::Disk)
    }

    fn setup_install_boot_images(&mut self, mbrid: &str) -> Result<()> {
        record(self.custom_args_mut(), [("mbrid", mbrid)]);
        self.create_loader_image(BootTarget::Install)
    }

    fn setup_live_boot_images(&mut self, mbrid: &str) -> Result<()> {
        record(self.custom_args_mut(), [("mbrid", mbrid)]);
        self.create_loader_image(BootTarget::Live)
    }

    /// Everything is written by the hooks already.
    fn write(&mut self) -> Result<()> {
        Ok(())
    }

    fn setup_sysconfig_bootloader(&mut self) -> Result<()> {
        Ok(())
    }

    fn write_meta_data(&mut self) -> Result<()> {
        Ok(())
    }
}

fn record<const N: usize>(args: &mut CustomArgs, values: [(&str, &str); N]) {
    for (key, value) in values {
        args.insert(key.to_string(), value.to_string());
    }
}
