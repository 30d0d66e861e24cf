//! Test doubles for components that shell out, sleep or log.
//!
//! [`ScriptedRunner`] records every [`Cmd`] it is asked to run and answers
//! from per-command queues, so tests can assert exact invocations without
//! root privileges or a real block device. Built only for this crate's own
//! tests or with the `testing` feature.

use std::cell::RefCell;
use std::collections::{HashSet, VecDeque};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;

use crate::log::Log;
use crate::mount::Delay;
use crate::process::{Cmd, CommandResult, CommandRunner};

type Matcher = Box<dyn Fn(&Cmd) -> bool>;

struct Rule {
    matcher: Matcher,
    /// The last queued result is repeated once the others are used up.
    queue: RefCell<VecDeque<CommandResult>>,
}

/// Successful result with the given stdout.
pub fn ok(stdout: &str) -> CommandResult {
    CommandResult::from_code(0, stdout, "")
}

/// Failed result with the given exit code and stderr.
pub fn fail(code: i32, stderr: &str) -> CommandResult {
    CommandResult::from_code(code, "", stderr)
}

/// Command runner answering from scripted results.
///
/// Commands that match no rule succeed with empty output.
#[derive(Default)]
pub struct ScriptedRunner {
    rules: Vec<Rule>,
    missing: HashSet<String>,
    calls: RefCell<Vec<Cmd>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer invocations of `program` with `results` in order.
    pub fn respond<I>(self, program: &str, results: I) -> Self
    where
        I: IntoIterator<Item = CommandResult>,
    {
        let program = program.to_string();
        self.respond_when(move |cmd| cmd.program() == program, results)
    }

    /// Answer invocations whose argv contains `needle` in sequence.
    pub fn respond_to_args<I>(self, needle: &[&str], results: I) -> Self
    where
        I: IntoIterator<Item = CommandResult>,
    {
        let needle: Vec<String> = needle.iter().map(|s| s.to_string()).collect();
        self.respond_when(
            move |cmd| cmd.argv().windows(needle.len()).any(|w| w == needle.as_slice()),
            results,
        )
    }

    /// Answer invocations accepted by `matcher`. Earlier rules win.
    pub fn respond_when<F, I>(mut self, matcher: F, results: I) -> Self
    where
        F: Fn(&Cmd) -> bool + 'static,
        I: IntoIterator<Item = CommandResult>,
    {
        self.rules.push(Rule {
            matcher: Box::new(matcher),
            queue: RefCell::new(results.into_iter().collect()),
        });
        self
    }

    /// Pretend `program` is not installed.
    pub fn without(mut self, program: &str) -> Self {
        self.missing.insert(program.to_string());
        self
    }

    /// Every command run so far.
    pub fn calls(&self) -> Vec<Cmd> {
        self.calls.borrow().clone()
    }

    /// Every command run so far, as argv vectors.
    pub fn argvs(&self) -> Vec<Vec<String>> {
        self.calls.borrow().iter().map(Cmd::argv).collect()
    }

    /// Number of invocations of `program`.
    pub fn count(&self, program: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|cmd| cmd.program() == program)
            .count()
    }

    fn answer(&self, cmd: &Cmd) -> CommandResult {
        for rule in &self.rules {
            if (rule.matcher)(cmd) {
                let mut queue = rule.queue.borrow_mut();
                let result = if queue.len() > 1 {
                    queue.pop_front()
                } else {
                    queue.front().cloned()
                };
                return result.unwrap_or_else(|| ok(""));
            }
        }
        ok("")
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, cmd: &Cmd) -> Result<CommandResult> {
        self.calls.borrow_mut().push(cmd.clone());
        cmd.check(self.answer(cmd))
    }

    fn which(&self, program: &str) -> Option<PathBuf> {
        if self.missing.contains(program) {
            None
        } else {
            Some(PathBuf::from("/usr/bin").join(program))
        }
    }
}

/// Delay that returns immediately and remembers what it was asked for.
#[derive(Debug, Default)]
pub struct RecordingDelay {
    sleeps: RefCell<Vec<Duration>>,
}

impl RecordingDelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.borrow().clone()
    }
}

impl Delay for RecordingDelay {
    fn sleep(&self, duration: Duration) {
        self.sleeps.borrow_mut().push(duration);
    }
}

/// Log that keeps messages in memory.
#[derive(Debug, Default)]
pub struct RecordingLog {
    warnings: RefCell<Vec<String>>,
}

impl RecordingLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.warnings.borrow().clone()
    }
}

impl Log for RecordingLog {
    fn warn(&self, message: &str) {
        self.warnings.borrow_mut().push(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_result_is_sticky() {
        let runner = ScriptedRunner::new().respond("umount", [fail(32, "busy"), ok("")]);

        assert!(runner.run(&Cmd::new("umount")).is_err());
        assert!(runner.run(&Cmd::new("umount")).is_ok());
        assert!(runner.run(&Cmd::new("umount")).is_ok());
        assert_eq!(runner.count("umount"), 3);
    }

    #[test]
    fn test_allow_fail_is_honored() {
        let runner = ScriptedRunner::new().respond("mountpoint", [fail(1, "")]);
        let result = runner.run(&Cmd::new("mountpoint").allow_fail()).unwrap();
        assert_eq!(result.code(), 1);
    }

    #[test]
    fn test_respond_to_args_matches_subsequence() {
        let runner = ScriptedRunner::new().respond_to_args(&["rpm", "-q"], [fail(1, "")]);

        assert!(runner.run(&Cmd::new("chroot").args(["/root", "rpm", "-q", "vim"])).is_err());
        assert!(runner.run(&Cmd::new("chroot").args(["/root", "rpm", "-e", "vim"])).is_ok());
    }

    #[test]
    fn test_which_honors_missing() {
        let runner = ScriptedRunner::new().without("lsof");
        assert!(runner.which("lsof").is_none());
        assert_eq!(runner.which("mount"), Some(PathBuf::from("/usr/bin/mount")));
    }
}
