//! Environment driven configuration.

use imagekit::config::Config;
use serial_test::serial;
use std::time::Duration;

#[test]
#[serial]
fn test_load_reads_process_environment() {
    std::env::set_var("IMAGEKIT_UMOUNT_ATTEMPTS", "4");
    std::env::set_var("IMAGEKIT_UMOUNT_DELAY_MS", "10");
    let config = Config::load();
    std::env::remove_var("IMAGEKIT_UMOUNT_ATTEMPTS");
    std::env::remove_var("IMAGEKIT_UMOUNT_DELAY_MS");

    let config = config.unwrap();
    assert_eq!(config.umount_attempts, 4);
    assert_eq!(config.retry_policy().delay, Duration::from_millis(10));
}

#[test]
#[serial]
fn test_load_defaults_without_environment() {
    std::env::remove_var("IMAGEKIT_UMOUNT_ATTEMPTS");
    std::env::remove_var("IMAGEKIT_UMOUNT_DELAY_MS");
    std::env::remove_var("IMAGEKIT_TEMP_PREFIX");

    let config = Config::load().unwrap();
    assert_eq!(config, Config::default());
}
