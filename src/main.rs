//! imagekit - OS image build helpers.
//!
//! Scoped mounts for build roots, microdnf package installs into an image
//! root, and a look at the configuration and host tools in use.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use commands::mount::MountKind;
use commands::packages::PackagesAction;
use commands::show::ShowTarget;
use imagekit::config::Config;

#[derive(Parser)]
#[command(name = "imagekit")]
#[command(about = "OS image build helpers")]
#[command(version)]
#[command(
    after_help = "QUICK START:\n  imagekit mount /dev/loop0p2        Mount on a fresh temp dir\n  imagekit umount /tmp/imagekit_...   Unmount, retrying while busy\n  imagekit show tools                 Check host tools"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Mount a device (prints the mountpoint)
    Mount {
        /// Device, image file or source directory
        device: String,

        /// Mountpoint (default: fresh temporary directory)
        #[arg(short, long)]
        mountpoint: Option<PathBuf>,

        /// Mount option, may be repeated (joined with ',')
        #[arg(short = 'o', long = "option", value_name = "OPT")]
        options: Vec<String>,

        /// Bind mount the device path
        #[arg(long, conflicts_with_all = ["tmpfs", "options"])]
        bind: bool,

        /// Mount a tmpfs, ignoring the device
        #[arg(long, conflicts_with = "options")]
        tmpfs: bool,
    },

    /// Unmount a mountpoint, retrying while it is busy
    Umount {
        mountpoint: PathBuf,

        /// Detach immediately and let the kernel release it later
        #[arg(long)]
        lazy: bool,

        /// Exit 1 with a warning instead of failing when still busy
        #[arg(long)]
        no_raise: bool,
    },

    /// Report whether something is mounted (exit 1 if not)
    Status { mountpoint: PathBuf },

    /// Install or remove packages in an image root with microdnf
    Packages {
        /// Runtime configuration (JSON)
        #[arg(short, long, value_name = "FILE")]
        config: PathBuf,

        #[command(subcommand)]
        action: PackagesCommand,
    },

    /// Show information
    Show {
        #[command(subcommand)]
        what: ShowCommand,
    },
}

#[derive(Subcommand)]
enum PackagesCommand {
    /// Install packages
    Install {
        /// Install into an empty root using the host microdnf
        #[arg(long)]
        bootstrap: bool,

        /// Skip weak dependencies
        #[arg(long)]
        only_required: bool,

        /// Package to exclude, may be repeated
        #[arg(long, value_name = "PKG")]
        exclude: Vec<String>,

        #[arg(required = true)]
        packages: Vec<String>,
    },
    /// Remove packages
    Remove {
        /// Remove with rpm, ignoring dependencies and scripts
        #[arg(long)]
        force: bool,

        #[arg(required = true)]
        packages: Vec<String>,
    },
    /// Upgrade all packages
    Update,
    /// Remove build-time rpm configuration from the root
    Clean,
}

#[derive(Subcommand)]
enum ShowCommand {
    /// Show current configuration
    Config,
    /// Show which host tools are available
    Tools,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load .env if present
    dotenvy::dotenv().ok();
    init_logging();
    let config = Config::load()?;

    match cli.command {
        Commands::Mount {
            device,
            mountpoint,
            options,
            bind,
            tmpfs,
        } => {
            let kind = if bind {
                MountKind::Bind
            } else if tmpfs {
                MountKind::Tmpfs
            } else {
                MountKind::Standard(options)
            };
            commands::cmd_mount(&device, mountpoint.as_deref(), kind, &config)?;
        }

        Commands::Umount {
            mountpoint,
            lazy,
            no_raise,
        } => {
            if !commands::cmd_umount(&mountpoint, lazy, !no_raise, &config)? {
                std::process::exit(1);
            }
        }

        Commands::Status { mountpoint } => {
            if !commands::cmd_status(&mountpoint)? {
                std::process::exit(1);
            }
        }

        Commands::Packages { config: file, action } => {
            let action = match action {
                PackagesCommand::Install {
                    bootstrap,
                    only_required,
                    exclude,
                    packages,
                } => PackagesAction::Install {
                    bootstrap,
                    only_required,
                    exclude,
                    packages,
                },
                PackagesCommand::Remove { force, packages } => {
                    PackagesAction::Remove { force, packages }
                }
                PackagesCommand::Update => PackagesAction::Update,
                PackagesCommand::Clean => PackagesAction::Clean,
            };
            commands::cmd_packages(&file, action)?;
        }

        Commands::Show { what } => {
            let show_target = match what {
                ShowCommand::Config => ShowTarget::Config,
                ShowCommand::Tools => ShowTarget::Tools,
            };
            commands::cmd_show(show_target, &config)?;
        }
    }

    Ok(())
}

/// Initialize the tracing subscriber (`IMAGEKIT_LOG`, default `info`).
fn init_logging() {
    let filter = EnvFilter::try_from_env("IMAGEKIT_LOG")
        .unwrap_or_else(|_| EnvFilter::new("imagekit=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
