#[path = "../src/install/mod.rs"]
mod install;

use std::fs;
use std::os::unix::fs::PermissionsExt;

use install::InstallerError;

#[test]
fn install_copies_and_marks_executable() {
    let tmp = tempfile::tempdir().unwrap();
    let source = tmp.path().join("imagine-pi-source");
    fs::write(&source, b"#!/bin/sh\necho imagine\n").unwrap();
    let bin_dir = tmp.path().join("bin");

    let dest = install::install_binary(&source, &bin_dir).unwrap();

    assert_eq!(dest, bin_dir.join(install::BINARY_NAME));
    assert_eq!(fs::read(&dest).unwrap(), fs::read(&source).unwrap());
    let mode = fs::metadata(&dest).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o755);
}

#[test]
fn reinstall_overwrites_the_previous_binary() {
    let tmp = tempfile::tempdir().unwrap();
    let bin_dir = tmp.path().join("bin");

    let first = tmp.path().join("v1");
    fs::write(&first, b"first build").unwrap();
    install::install_binary(&first, &bin_dir).unwrap();

    let second = tmp.path().join("v2");
    fs::write(&second, b"second build, longer than the first").unwrap();
    let dest = install::install_binary(&second, &bin_dir).unwrap();

    assert_eq!(fs::read(&dest).unwrap(), fs::read(&second).unwrap());
}

#[test]
fn missing_source_fails_without_touching_the_destination() {
    let tmp = tempfile::tempdir().unwrap();
    let bin_dir = tmp.path().join("bin");

    let err = install::install_binary(&tmp.path().join("gone"), &bin_dir).unwrap_err();

    assert!(matches!(err, InstallerError::SourceMissing(_)));
    assert_ne!(err.exit_code(), 0);
    assert!(!bin_dir.join(install::BINARY_NAME).exists());
}

#[test]
fn step_errors_surface_the_real_os_code() {
    let tmp = tempfile::tempdir().unwrap();
    let source = tmp.path().join("source");
    fs::write(&source, b"bytes").unwrap();

    // A destination that collides with a file cannot be created as a dir.
    let blocked = tmp.path().join("blocked");
    fs::write(&blocked, b"i am a file").unwrap();

    let err = install::install_binary(&source, &blocked).unwrap_err();
    match &err {
        InstallerError::Step { source, .. } => {
            assert_eq!(err.exit_code(), source.raw_os_error().unwrap_or(1));
        }
        other => panic!("expected step error, got {other:?}"),
    }
}
