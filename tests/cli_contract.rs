// SPDX-FileCopyrightText: 2024 Gabriel Marcano
//
// SPDX-License-Identifier: BSD-3-Clause

//! Integration tests for the c2prog command line.

use {predicates::prelude::*, std::fs, tempfile::tempdir};

fn cli_cmd() -> assert_cmd::Command {
    assert_cmd::cargo::cargo_bin_cmd!("c2prog")
}

#[test]
fn help_lists_arguments() {
    cli_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("<PORT>"))
        .stdout(predicate::str::contains("<FILE>"))
        .stdout(predicate::str::contains("--verbose"));
}

#[test]
fn missing_arguments_fail() {
    cli_cmd().assert().failure().stdout(predicate::str::is_empty());
}

#[test]
fn bad_port_is_reported_and_file_is_never_read() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("missing.hex");

    cli_cmd()
        .args(["/dev/c2prog-does-not-exist", file.to_str().unwrap()])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Done."))
        .stdout(predicate::str::contains("Connecting...").not())
        .stderr(predicate::str::contains(
            "Could not open serial port: /dev/c2prog-does-not-exist",
        ))
        .stderr(predicate::str::contains("missing.hex").not());
}

#[test]
fn bad_port_with_valid_file() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("blink.hex");
    fs::write(&file, ":0300000002000BF0\n:00000001FF\n").unwrap();

    cli_cmd()
        .args(["-v", "/dev/c2prog-does-not-exist", file.to_str().unwrap()])
        .assert()
        .failure()
        .stdout(predicate::str::contains(":0300000002000BF0").not())
        .stdout(predicate::str::ends_with("Done.\n"));
}
