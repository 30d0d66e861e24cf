//! Configuration management for imagekit.
//!
//! Reads configuration from environment variables. `main` loads a `.env`
//! file first (via dotenvy), so real environment variables take precedence.

use anyhow::{bail, Context, Result};
use std::collections::HashMap;
use std::time::Duration;

use crate::mount::{RetryPolicy, DEFAULT_TEMP_PREFIX, DEFAULT_UMOUNT_ATTEMPTS, DEFAULT_UMOUNT_DELAY};

/// imagekit configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Number of `umount` attempts before a mount is declared busy
    pub umount_attempts: u32,
    /// Wait between failed `umount` attempts
    pub umount_delay: Duration,
    /// Name prefix of allocated mountpoint directories
    pub temp_prefix: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            umount_attempts: DEFAULT_UMOUNT_ATTEMPTS,
            umount_delay: DEFAULT_UMOUNT_DELAY,
            temp_prefix: DEFAULT_TEMP_PREFIX.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the process environment.
    pub fn load() -> Result<Self> {
        Self::from_vars(std::env::vars())
    }

    /// Build configuration from `KEY=value` pairs, defaulting what is unset.
    pub fn from_vars<I>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let env_vars: HashMap<String, String> = vars.into_iter().collect();
        let defaults = Self::default();

        let umount_attempts = match env_vars.get("IMAGEKIT_UMOUNT_ATTEMPTS") {
            Some(value) => value
                .trim()
                .parse()
                .with_context(|| format!("IMAGEKIT_UMOUNT_ATTEMPTS is not a number: '{}'", value))?,
            None => defaults.umount_attempts,
        };
        if umount_attempts == 0 {
            bail!("IMAGEKIT_UMOUNT_ATTEMPTS must be at least 1");
        }

        let umount_delay = match env_vars.get("IMAGEKIT_UMOUNT_DELAY_MS") {
            Some(value) => Duration::from_millis(
                value
                    .trim()
                    .parse()
                    .with_context(|| format!("IMAGEKIT_UMOUNT_DELAY_MS is not a number: '{}'", value))?,
            ),
            None => defaults.umount_delay,
        };

        let temp_prefix = env_vars
            .get("IMAGEKIT_TEMP_PREFIX")
            .filter(|s| !s.is_empty())
            .cloned()
            .unwrap_or(defaults.temp_prefix);

        Ok(Self {
            umount_attempts,
            umount_delay,
            temp_prefix,
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            attempts: self.umount_attempts,
            delay: self.umount_delay,
        }
    }

    /// Print configuration for debugging.
    pub fn print(&self) {
        println!("Configuration:");
        println!("  IMAGEKIT_UMOUNT_ATTEMPTS: {}", self.umount_attempts);
        println!("  IMAGEKIT_UMOUNT_DELAY_MS: {}", self.umount_delay.as_millis());
        println!("  IMAGEKIT_TEMP_PREFIX: {}", self.temp_prefix);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_vars(Vec::new()).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.retry_policy(), RetryPolicy::default());
        assert_eq!(config.temp_prefix, "imagekit_mount_manager.");
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_vars(vars(&[
            ("IMAGEKIT_UMOUNT_ATTEMPTS", "3"),
            ("IMAGEKIT_UMOUNT_DELAY_MS", "250"),
            ("IMAGEKIT_TEMP_PREFIX", "build_mnt."),
        ]))
        .unwrap();

        assert_eq!(config.umount_attempts, 3);
        assert_eq!(config.umount_delay, Duration::from_millis(250));
        assert_eq!(config.temp_prefix, "build_mnt.");
    }

    #[test]
    fn test_invalid_number_is_an_error() {
        let err = Config::from_vars(vars(&[("IMAGEKIT_UMOUNT_ATTEMPTS", "ten")])).unwrap_err();
        assert!(err.to_string().contains("IMAGEKIT_UMOUNT_ATTEMPTS"));
    }

    #[test]
    fn test_zero_attempts_is_an_error() {
        let err = Config::from_vars(vars(&[("IMAGEKIT_UMOUNT_ATTEMPTS", "0")])).unwrap_err();
        assert!(err.to_string().contains("IMAGEKIT_UMOUNT_ATTEMPTS must be at least 1"));
    }
}
