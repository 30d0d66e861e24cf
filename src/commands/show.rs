//! Show command - displays information.

use anyhow::Result;

use imagekit::config::Config;
use imagekit::process;

/// Show target for the show command.
pub enum ShowTarget {
    /// Show configuration
    Config,
    /// Show which host tools are available
    Tools,
}

/// Host tools imagekit shells out to, with the package providing them.
const HOST_TOOLS: &[(&str, &str)] = &[
    ("mount", "util-linux"),
    ("umount", "util-linux"),
    ("mountpoint", "util-linux"),
    ("lsof", "lsof"),
    ("microdnf", "microdnf"),
    ("chroot", "coreutils"),
];

/// Execute the show command.
pub fn cmd_show(target: ShowTarget, config: &Config) -> Result<()> {
    match target {
        ShowTarget::Config => {
            config.print();
        }
        ShowTarget::Tools => {
            println!("Host tools:");
            for (tool, package) in HOST_TOOLS {
                match process::which(tool) {
                    Some(path) => println!("  [OK]   {} ({})", tool, path.display()),
                    None => println!("  [MISS] {} (install '{}')", tool, package),
                }
            }
        }
    }
    Ok(())
}
