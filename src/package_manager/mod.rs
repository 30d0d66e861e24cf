//! Package manager backends installing into an image root.
//!
//! A backend collects requests first (`request_*`) and turns them into one
//! command when a `process_*` call is made. The request lists are cleared
//! after every processed batch.

pub mod config;
pub mod microdnf;

pub use config::{DnfRuntimeConfig, RepositoryModules, SharedDnfDir};
pub use microdnf::MicroDnf;

use anyhow::Result;

use crate::process::CommandResult;

/// Pending requests of a package manager.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Requests {
    pub package_requests: Vec<String>,
    pub collection_requests: Vec<String>,
    pub product_requests: Vec<String>,
    pub exclude_requests: Vec<String>,
}

impl Requests {
    pub fn clear(&mut self) {
        self.package_requests.clear();
        self.collection_requests.clear();
        self.product_requests.clear();
        self.exclude_requests.clear();
    }
}

/// Operations every package manager backend provides.
pub trait PackageManager {
    fn requests(&self) -> &Requests;

    /// Extra arguments added to every install, remove and update call.
    fn custom_args(&self) -> &[String];

    fn request_package(&mut self, name: &str);
    fn request_collection(&mut self, name: &str);
    fn request_product(&mut self, name: &str);
    fn request_package_exclusion(&mut self, name: &str);

    fn setup_repository_modules(&mut self, modules: &RepositoryModules) -> Result<()>;

    /// Install requested packages into an empty root from the host.
    fn process_install_requests_bootstrap(&mut self) -> Result<CommandResult>;

    /// Install requested packages from within the root.
    fn process_install_requests(&mut self) -> Result<CommandResult>;

    /// Remove requested packages; `force` skips dependency checks and scripts.
    fn process_delete_requests(&mut self, force: bool) -> Result<CommandResult>;

    fn update(&mut self) -> Result<CommandResult>;

    /// Do not pull in weak dependencies.
    fn process_only_required(&mut self);

    /// Pull in weak dependencies again.
    fn process_plus_recommended(&mut self);

    fn match_package_installed(&self, name: &str, log_line: &str) -> bool;
    fn match_package_deleted(&self, name: &str, log_line: &str) -> bool;

    fn post_process_install_requests_bootstrap(&mut self) -> Result<()>;

    /// Remove build-time configuration from the root.
    fn clean_leftovers(&mut self) -> Result<()>;

    fn cleanup_requests(&mut self);
}
