//! microdnf backend.
//!
//! Bootstrap installs run the host microdnf against `--installroot`; every
//! later call runs the microdnf of the image through `chroot`.

use anyhow::Result;
use regex::Regex;

use super::{DnfRuntimeConfig, PackageManager, RepositoryModules, Requests};
use crate::common::move_to_root;
use crate::error::RequestError;
use crate::process::{Cmd, CommandResult, CommandRunner, HostRunner};
use crate::rpm::{RpmDataBase, RpmMacros, IMAGE_CONFIG_MACROS};

const ONLY_REQUIRED: &str = "--setopt=install_weak_deps=0";

/// Package manager driving microdnf and rpm.
pub struct MicroDnf<R = HostRunner> {
    config: DnfRuntimeConfig,
    runner: R,
    requests: Requests,
    custom_args: Vec<String>,
}

impl MicroDnf {
    pub fn new(config: DnfRuntimeConfig) -> Self {
        Self::with_runner(config, HostRunner)
    }
}

impl<R: CommandRunner> MicroDnf<R> {
    pub fn with_runner(config: DnfRuntimeConfig, runner: R) -> Self {
        Self {
            config,
            runner,
            requests: Requests::default(),
            custom_args: Vec::new(),
        }
    }

    pub fn config(&self) -> &DnfRuntimeConfig {
        &self.config
    }

    /// Host microdnf operating on the image root.
    fn bootstrap_cmd(&self) -> Cmd {
        let shared = &self.config.shared_dnf_dir;
        Cmd::new("microdnf")
            .arg("--refresh")
            .args(&self.config.dnf_args)
            .arg("--installroot")
            .arg_path(&self.config.root_dir)
            .args(["--releasever=0", "--noplugins"])
            .arg(format!("--setopt=cachedir={}", shared.cache_dir.display()))
            .arg(format!("--setopt=reposdir={}", shared.reposd_dir.display()))
            .arg(format!("--setopt=varsdir={}", shared.vars_dir.display()))
            .envs(&self.config.command_env)
    }

    /// Image microdnf running inside the root.
    fn chroot_cmd(&self) -> Cmd {
        Cmd::new("chroot")
            .arg_path(&self.config.root_dir)
            .arg("microdnf")
            .args(move_to_root(&self.config.root_dir, &self.config.dnf_args))
            .arg("--releasever=0")
            .envs(&self.config.command_env)
    }

    fn chroot_rpm(&self) -> Cmd {
        Cmd::new("chroot")
            .arg_path(&self.config.root_dir)
            .arg("rpm")
            .envs(&self.config.command_env)
    }

    fn exclude_args(&self) -> Vec<String> {
        self.requests
            .exclude_requests
            .iter()
            .map(|name| format!("--exclude={}", name))
            .collect()
    }

    /// Requested packages that are actually installed in the root.
    fn installed_delete_items(&self) -> Vec<String> {
        self.requests
            .package_requests
            .iter()
            .filter(|name| {
                let query = self.chroot_rpm().args(["-q", name.as_str()]);
                match self.runner.run(&query) {
                    Ok(_) => true,
                    Err(_) => {
                        tracing::debug!(package = %name, "not installed, skipping removal");
                        false
                    }
                }
            })
            .cloned()
            .collect()
    }
}

impl<R: CommandRunner> PackageManager for MicroDnf<R> {
    fn requests(&self) -> &Requests {
        &self.requests
    }

    fn custom_args(&self) -> &[String] {
        &self.custom_args
    }

    fn request_package(&mut self, name: &str) {
        self.requests.package_requests.push(name.to_string());
    }

    /// microdnf has no collections; the request is dropped.
    fn request_collection(&mut self, name: &str) {
        tracing::warn!(collection = name, "collections are not supported by microdnf");
    }

    /// microdnf has no products; the request is dropped.
    fn request_product(&mut self, name: &str) {
        tracing::warn!(product = name, "products are not supported by microdnf");
    }

    fn request_package_exclusion(&mut self, name: &str) {
        self.requests.exclude_requests.push(name.to_string());
    }

    fn setup_repository_modules(&mut self, modules: &RepositoryModules) -> Result<()> {
        for module in &modules.disable {
            self.runner
                .run(&self.bootstrap_cmd().args(["module", "disable", module.as_str()]))?;
        }
        for module in &modules.enable {
            let name = module.split(':').next().unwrap_or(module);
            self.runner
                .run(&self.bootstrap_cmd().args(["module", "reset", name]))?;
            self.runner
                .run(&self.bootstrap_cmd().args(["module", "enable", module.as_str()]))?;
        }
        Ok(())
    }

    fn process_install_requests_bootstrap(&mut self) -> Result<CommandResult> {
        let cmd = self
            .bootstrap_cmd()
            .args(&self.custom_args)
            .args(self.exclude_args())
            .arg("install")
            .args(&self.requests.package_requests);
        self.cleanup_requests();
        self.runner.run(&cmd)
    }

    fn process_install_requests(&mut self) -> Result<CommandResult> {
        let cmd = self
            .chroot_cmd()
            .args(&self.custom_args)
            .args(self.exclude_args())
            .arg("install")
            .args(&self.requests.package_requests);
        self.cleanup_requests();
        self.runner.run(&cmd)
    }

    fn process_delete_requests(&mut self, force: bool) -> Result<CommandResult> {
        let delete_items = self.installed_delete_items();
        if delete_items.is_empty() {
            self.cleanup_requests();
            return Err(RequestError(
                "None of the requested packages to delete are installed".to_string(),
            )
            .into());
        }

        let cmd = if force {
            self.chroot_rpm()
                .args(["-e", "--nodeps", "--allmatches", "--noscripts"])
                .args(&delete_items)
        } else {
            self.chroot_cmd()
                .args(&self.custom_args)
                .arg("remove")
                .args(&delete_items)
        };
        self.cleanup_requests();
        self.runner.run(&cmd)
    }

    fn update(&mut self) -> Result<CommandResult> {
        let cmd = self.chroot_cmd().args(&self.custom_args).arg("upgrade");
        self.runner.run(&cmd)
    }

    fn process_only_required(&mut self) {
        if !self.custom_args.iter().any(|arg| arg == ONLY_REQUIRED) {
            self.custom_args.push(ONLY_REQUIRED.to_string());
        }
    }

    fn process_plus_recommended(&mut self) {
        self.custom_args.retain(|arg| arg != ONLY_REQUIRED);
    }

    fn match_package_installed(&self, name: &str, log_line: &str) -> bool {
        matches_line(&format!("Installing *: {}", regex::escape(name)), log_line)
    }

    fn match_package_deleted(&self, name: &str, log_line: &str) -> bool {
        matches_line(&format!("Removing: {}", regex::escape(name)), log_line)
    }

    fn post_process_install_requests_bootstrap(&mut self) -> Result<()> {
        let rpmdb = RpmDataBase::with_runner(&self.config.root_dir, &self.runner);
        if rpmdb.has_rpm() {
            rpmdb.set_database_to_image_path()?;
        }
        Ok(())
    }

    fn clean_leftovers(&mut self) -> Result<()> {
        RpmMacros::new(&self.config.root_dir, IMAGE_CONFIG_MACROS).wipe_config()
    }

    fn cleanup_requests(&mut self) {
        self.requests.clear();
    }
}

fn matches_line(pattern: &str, log_line: &str) -> bool {
    Regex::new(pattern)
        .map(|re| re.is_match(log_line))
        .unwrap_or(false)
}
