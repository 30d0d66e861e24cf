//! microdnf backend tests against a mock image root.

mod helpers;

use helpers::{argv, create_mock_binary, TestEnv};
use imagekit::package_manager::{MicroDnf, PackageManager, RepositoryModules};
use imagekit::rpm::{RpmMacros, IMAGE_CONFIG_MACROS, MACROS_DIR};
use imagekit::testing::{ok, ScriptedRunner};
use imagekit::RequestError;

#[test]
fn test_chroot_args_are_moved_into_root() {
    let env = TestEnv::new();
    let runner = ScriptedRunner::new();
    let mut manager = MicroDnf::with_runner(env.dnf_config(), &runner);
    manager.request_package("bash");

    manager.process_install_requests().unwrap();

    assert_eq!(
        runner.argvs(),
        vec![argv(&[
            "chroot",
            &env.root_str(),
            "microdnf",
            "--config",
            "/dnf.conf",
            "-y",
            "--releasever=0",
            "install",
            "bash",
        ])]
    );
}

#[test]
fn test_bootstrap_then_post_process_moves_rpmdb() {
    let env = TestEnv::new();
    create_mock_binary(&env.root.join("usr/bin/rpm"));
    let runner = ScriptedRunner::new()
        .respond_to_args(&["rpm", "-E", "%_dbpath"], [ok("/usr/lib/sysimage/rpm\n")]);
    let mut manager = MicroDnf::with_runner(env.dnf_config(), &runner);
    manager.request_package("filesystem");
    manager.request_package("rpm");

    manager.process_install_requests_bootstrap().unwrap();
    manager.post_process_install_requests_bootstrap().unwrap();

    let calls = runner.argvs();
    assert_eq!(calls[0][0], "microdnf");
    assert_eq!(&calls[0][calls[0].len() - 3..], ["install", "filesystem", "rpm"]);
    assert_eq!(calls[2], argv(&["chroot", &env.root_str(), "rpm", "--rebuilddb"]));

    let macros = RpmMacros::new(&env.root, IMAGE_CONFIG_MACROS);
    assert!(macros.config_path().starts_with(env.root.join(MACROS_DIR)));
    assert!(macros.config_path().is_file());

    manager.clean_leftovers().unwrap();
    assert!(!macros.config_path().exists());
}

#[test]
fn test_post_process_without_rpm_in_root_is_noop() {
    let env = TestEnv::new();
    let runner = ScriptedRunner::new();
    let mut manager = MicroDnf::with_runner(env.dnf_config(), &runner);

    manager.post_process_install_requests_bootstrap().unwrap();

    assert!(runner.calls().is_empty());
}

#[test]
fn test_delete_nothing_installed_is_request_error() {
    let env = TestEnv::new();
    let runner = ScriptedRunner::new()
        .respond_to_args(&["rpm", "-q"], [imagekit::testing::fail(1, "not installed")]);
    let mut manager = MicroDnf::with_runner(env.dnf_config(), &runner);
    manager.request_package("vim");
    manager.request_package("nano");

    let err = manager.process_delete_requests(false).unwrap_err();

    assert!(err.downcast_ref::<RequestError>().is_some());
    assert_eq!(runner.calls().len(), 2);
    assert!(manager.requests().package_requests.is_empty());
}

#[test]
fn test_module_streams_use_bootstrap_microdnf() {
    let env = TestEnv::new();
    let runner = ScriptedRunner::new();
    let mut manager = MicroDnf::with_runner(env.dnf_config(), &runner);

    manager
        .setup_repository_modules(&RepositoryModules {
            disable: vec![],
            enable: vec!["nodejs:20".to_string()],
        })
        .unwrap();

    let calls = runner.argvs();
    assert_eq!(calls.len(), 2);
    assert!(calls.iter().all(|c| c[0] == "microdnf" && c.contains(&"--installroot".to_string())));
    assert_eq!(&calls[0][calls[0].len() - 3..], ["module", "reset", "nodejs"]);
    assert_eq!(&calls[1][calls[1].len() - 3..], ["module", "enable", "nodejs:20"]);
}
