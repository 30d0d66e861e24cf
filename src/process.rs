//! Centralized command execution with consistent error handling.
//!
//! Every component that shells out (mount, package manager, rpm) goes through
//! a [`CommandRunner`], so the exact argv and environment can be recorded and
//! scripted in tests instead of touching the host.

use anyhow::{bail, Context, Result};
use std::os::unix::process::ExitStatusExt;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

/// Result of a command execution.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Exit status of the command.
    pub status: ExitStatus,
    /// Captured stdout as a string.
    pub stdout: String,
    /// Captured stderr as a string.
    pub stderr: String,
}

impl CommandResult {
    /// Build a result from a plain exit code, as a process would have reported it.
    pub fn from_code(code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            status: ExitStatus::from_raw((code & 0xff) << 8),
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    /// Returns true if the command exited successfully.
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Get the exit code, or -1 if terminated by signal.
    pub fn code(&self) -> i32 {
        self.status.code().unwrap_or(-1)
    }

    /// Get stdout, trimmed of whitespace.
    pub fn stdout_trimmed(&self) -> &str {
        self.stdout.trim()
    }

    /// Get stderr, trimmed of whitespace.
    pub fn stderr_trimmed(&self) -> &str {
        self.stderr.trim()
    }
}

/// Builder for configuring command execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cmd {
    program: String,
    args: Vec<String>,
    envs: Vec<(String, String)>,
    /// If true, don't fail on non-zero exit.
    allow_fail: bool,
    /// Custom error message prefix.
    error_prefix: Option<String>,
}

impl Cmd {
    /// Create a new command builder.
    pub fn new(program: impl AsRef<str>) -> Self {
        Self {
            program: program.as_ref().to_string(),
            args: Vec::new(),
            envs: Vec::new(),
            allow_fail: false,
            error_prefix: None,
        }
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl AsRef<str>) -> Self {
        self.args.push(arg.as_ref().to_string());
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for arg in args {
            self.args.push(arg.as_ref().to_string());
        }
        self
    }

    /// Add a path as an argument.
    pub fn arg_path(mut self, path: &Path) -> Self {
        self.args.push(path.to_string_lossy().into_owned());
        self
    }

    /// Add environment overrides for the child process.
    pub fn envs<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in vars {
            self.envs
                .push((key.as_ref().to_string(), value.as_ref().to_string()));
        }
        self
    }

    /// Allow non-zero exit codes without failing.
    pub fn allow_fail(mut self) -> Self {
        self.allow_fail = true;
        self
    }

    /// Set a custom error message prefix.
    pub fn error_msg(mut self, msg: impl AsRef<str>) -> Self {
        self.error_prefix = Some(msg.as_ref().to_string());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn get_envs(&self) -> &[(String, String)] {
        &self.envs
    }

    /// Program followed by its arguments, the way tests compare invocations.
    pub fn argv(&self) -> Vec<String> {
        let mut argv = Vec::with_capacity(self.args.len() + 1);
        argv.push(self.program.clone());
        argv.extend(self.args.iter().cloned());
        argv
    }

    /// Turn a finished execution into an error unless it succeeded or
    /// failures are allowed.
    pub fn check(&self, result: CommandResult) -> Result<CommandResult> {
        if !self.allow_fail && !result.success() {
            let prefix = self
                .error_prefix
                .clone()
                .unwrap_or_else(|| format!("'{}' failed", self.program));

            let stderr = result.stderr_trimmed();
            if stderr.is_empty() {
                bail!("{} (exit code {})", prefix, result.code());
            } else {
                bail!("{} (exit code {}):\n{}", prefix, result.code(), stderr);
            }
        }
        Ok(result)
    }

    /// Run the command on the host and capture output.
    pub fn run(self) -> Result<CommandResult> {
        HostRunner.run(&self)
    }

    fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd.envs(self.envs.iter().map(|(k, v)| (k, v)));
        cmd
    }
}

/// Something that can execute a [`Cmd`].
pub trait CommandRunner {
    /// Execute the command, honoring its `allow_fail` setting.
    fn run(&self, cmd: &Cmd) -> Result<CommandResult>;

    /// Locate an executable on `PATH`.
    fn which(&self, program: &str) -> Option<PathBuf> {
        which(program)
    }
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn run(&self, cmd: &Cmd) -> Result<CommandResult> {
        (**self).run(cmd)
    }

    fn which(&self, program: &str) -> Option<PathBuf> {
        (**self).which(program)
    }
}

/// Runs commands on the build host.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostRunner;

impl CommandRunner for HostRunner {
    fn run(&self, cmd: &Cmd) -> Result<CommandResult> {
        tracing::debug!(command = %format_command(cmd), "running");

        let output = cmd.to_command().output().with_context(|| {
            format!("Failed to execute '{}'. Is it installed?", cmd.program)
        })?;

        cmd.check(CommandResult {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

// =============================================================================
// Convenience functions
// =============================================================================

/// Check if a program exists in PATH and is executable.
///
/// Returns the full path if found, None otherwise.
pub fn which(program: &str) -> Option<PathBuf> {
    ::which::which(program).ok()
}

/// Render a command line for logs.
pub fn format_command(cmd: &Cmd) -> String {
    cmd.argv().join(" ")
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_success() {
        let result = Cmd::new("echo").arg("hello").run().unwrap();
        assert!(result.success());
        assert_eq!(result.stdout_trimmed(), "hello");
    }

    #[test]
    fn test_run_captures_stderr() {
        let result = Cmd::new("ls")
            .arg("/nonexistent_path_12345")
            .allow_fail()
            .run()
            .unwrap();

        assert!(!result.success());
        assert!(!result.stderr.is_empty());
    }

    #[test]
    fn test_run_failure_includes_stderr() {
        let err = Cmd::new("ls").arg("/nonexistent_path_12345").run().unwrap_err();
        let msg = err.to_string();

        assert!(msg.contains("No such file") || msg.contains("cannot access"));
    }

    #[test]
    fn test_env_overrides_reach_child() {
        let result = Cmd::new("sh")
            .args(["-c", "echo $IMAGEKIT_PROBE"])
            .envs([("IMAGEKIT_PROBE", "visible")])
            .run()
            .unwrap();

        assert_eq!(result.stdout_trimmed(), "visible");
    }

    #[test]
    fn test_which_exists() {
        assert!(which("sh").is_some());
        assert!(which("nonexistent_program_12345").is_none());
    }

    #[test]
    fn test_custom_error_message() {
        let err = Cmd::new("false")
            .error_msg("Custom build step failed")
            .run()
            .unwrap_err();

        assert!(err.to_string().contains("Custom build step failed"));
    }

    #[test]
    fn test_allow_fail() {
        let result = Cmd::new("false").allow_fail().run().unwrap();

        assert!(!result.success());
        assert_eq!(result.code(), 1);
    }

    #[test]
    fn test_from_code_roundtrips_exit_code() {
        let ok = CommandResult::from_code(0, "", "");
        let busy = CommandResult::from_code(32, "", "target is busy");

        assert!(ok.success());
        assert_eq!(busy.code(), 32);
        assert!(!busy.success());
    }

    #[test]
    fn test_check_respects_allow_fail() {
        let failed = CommandResult::from_code(1, "", "boom");

        let err = Cmd::new("umount").check(failed.clone()).unwrap_err();
        assert!(err.to_string().contains("'umount' failed (exit code 1)"));
        assert!(err.to_string().contains("boom"));

        assert!(Cmd::new("umount").allow_fail().check(failed).is_ok());
    }

    #[test]
    fn test_format_command() {
        let cmd = Cmd::new("mount").args(["-o", "ro"]).arg_path(Path::new("/dev/loop0"));
        assert_eq!(format_command(&cmd), "mount -o ro /dev/loop0");
    }
}
