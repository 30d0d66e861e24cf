//! Packages command - microdnf requests against an image root.

use anyhow::Result;
use std::path::Path;

use imagekit::package_manager::{DnfRuntimeConfig, MicroDnf, PackageManager};

/// What to do with the package manager.
pub enum PackagesAction {
    Install {
        bootstrap: bool,
        only_required: bool,
        exclude: Vec<String>,
        packages: Vec<String>,
    },
    Remove {
        force: bool,
        packages: Vec<String>,
    },
    Update,
    Clean,
}

/// Execute the packages command.
pub fn cmd_packages(config_file: &Path, action: PackagesAction) -> Result<()> {
    let config = DnfRuntimeConfig::from_file(config_file)?;
    let mut manager = MicroDnf::new(config);

    let result = match action {
        PackagesAction::Install {
            bootstrap,
            only_required,
            exclude,
            packages,
        } => {
            if only_required {
                manager.process_only_required();
            }
            for name in &exclude {
                manager.request_package_exclusion(name);
            }
            for name in &packages {
                manager.request_package(name);
            }

            if bootstrap {
                let result = manager.process_install_requests_bootstrap()?;
                manager.post_process_install_requests_bootstrap()?;
                result
            } else {
                manager.process_install_requests()?
            }
        }
        PackagesAction::Remove { force, packages } => {
            for name in &packages {
                manager.request_package(name);
            }
            manager.process_delete_requests(force)?
        }
        PackagesAction::Update => manager.update()?,
        PackagesAction::Clean => {
            manager.clean_leftovers()?;
            return Ok(());
        }
    };

    print!("{}", result.stdout);
    Ok(())
}
