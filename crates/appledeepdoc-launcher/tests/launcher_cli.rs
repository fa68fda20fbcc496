#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Copies the built launcher into `dir` so interpreter resolution happens
/// relative to that directory.
fn install_launcher(dir: &Path) -> PathBuf {
    let source = assert_cmd::cargo::cargo_bin("appledeepdoc-launcher");
    let target = dir.join("appledeepdoc-launcher");
    fs::copy(&source, &target).unwrap();
    fs::set_permissions(&target, fs::Permissions::from_mode(0o755)).unwrap();
    target
}

/// Writes a fake interpreter that reports how it was invoked.
fn write_interpreter(path: &Path, marker: &str, exit_code: i32) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let script = format!(
        "#!/bin/sh\n\
         echo \"interpreter={marker}\"\n\
         for a in \"$@\"; do printf 'arg=%s\\n' \"$a\"; done\n\
         echo \"pythonpath=$PYTHONPATH\"\n\
         echo \"cwd=$(pwd)\"\n\
         exit {exit_code}\n"
    );
    fs::write(path, script).unwrap();
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
}

fn launcher_command(launcher: &Path) -> Command {
    let mut command = Command::from_std(std::process::Command::new(launcher));
    command.env_remove("PYTHONPATH");
    command
}

#[test]
fn prefers_dot_venv_over_venv() {
    let temp = TempDir::new().unwrap();
    let launcher = install_launcher(temp.path());
    write_interpreter(&temp.path().join(".venv/bin/python"), "dot-venv", 0);
    write_interpreter(&temp.path().join("venv/bin/python"), "plain-venv", 0);

    launcher_command(&launcher)
        .assert()
        .success()
        .stdout(predicate::str::contains("interpreter=dot-venv"));
}

#[test]
fn uses_venv_when_dot_venv_is_absent() {
    let temp = TempDir::new().unwrap();
    let launcher = install_launcher(temp.path());
    write_interpreter(&temp.path().join("venv/bin/python"), "plain-venv", 0);

    launcher_command(&launcher)
        .assert()
        .success()
        .stdout(predicate::str::contains("interpreter=plain-venv"));
}

#[test]
fn falls_back_to_python3_on_the_search_path() {
    let temp = TempDir::new().unwrap();
    let launcher = install_launcher(temp.path());

    let bin_dir = temp.path().join("fakebin");
    write_interpreter(&bin_dir.join("python3"), "path-python3", 0);

    launcher_command(&launcher)
        .env("PATH", &bin_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("interpreter=path-python3"));
}

#[test]
fn runs_the_target_module_and_forwards_arguments_verbatim() {
    let temp = TempDir::new().unwrap();
    let launcher = install_launcher(temp.path());
    write_interpreter(&temp.path().join(".venv/bin/python"), "dot-venv", 0);

    launcher_command(&launcher)
        .args(["--flag", "hello world", "a&b;c"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "arg=-m\narg=appledeepdoc_mcp.main\narg=--flag\narg=hello world\narg=a&b;c\n",
        ));
}

#[test]
fn module_search_path_is_the_launcher_directory_when_unset() {
    let temp = TempDir::new().unwrap();
    let launcher = install_launcher(temp.path());
    write_interpreter(&temp.path().join(".venv/bin/python"), "dot-venv", 0);

    let resolved = fs::canonicalize(temp.path()).unwrap();
    launcher_command(&launcher)
        .assert()
        .success()
        .stdout(predicate::str::contains(format!(
            "pythonpath={}\n",
            resolved.display()
        )));
}

#[test]
fn module_search_path_prepends_to_an_existing_value() {
    let temp = TempDir::new().unwrap();
    let launcher = install_launcher(temp.path());
    write_interpreter(&temp.path().join(".venv/bin/python"), "dot-venv", 0);

    let resolved = fs::canonicalize(temp.path()).unwrap();
    launcher_command(&launcher)
        .env("PYTHONPATH", "/usr/lib/site-packages")
        .assert()
        .success()
        .stdout(predicate::str::contains(format!(
            "pythonpath={}:/usr/lib/site-packages\n",
            resolved.display()
        )));
}

#[test]
fn exit_status_propagates_exactly() {
    let temp = TempDir::new().unwrap();
    let launcher = install_launcher(temp.path());
    write_interpreter(&temp.path().join(".venv/bin/python"), "dot-venv", 3);

    launcher_command(&launcher).assert().code(3);
}

#[test]
fn working_directory_is_the_resolved_launcher_directory() {
    let temp = TempDir::new().unwrap();
    let launcher = install_launcher(temp.path());
    write_interpreter(&temp.path().join(".venv/bin/python"), "dot-venv", 0);

    let resolved = fs::canonicalize(temp.path()).unwrap();
    launcher_command(&launcher)
        .assert()
        .success()
        .stdout(predicate::str::contains(format!(
            "cwd={}\n",
            resolved.display()
        )));
}

#[test]
fn symlinked_invocation_resolves_to_the_target_directory() {
    let temp = TempDir::new().unwrap();
    let target_dir = temp.path().join("install");
    let link_dir = temp.path().join("bin");
    fs::create_dir_all(&target_dir).unwrap();
    fs::create_dir_all(&link_dir).unwrap();

    let launcher = install_launcher(&target_dir);
    write_interpreter(&target_dir.join(".venv/bin/python"), "target-venv", 0);
    // A decoy in the symlink's own directory must not be picked up.
    write_interpreter(&link_dir.join(".venv/bin/python"), "decoy-venv", 0);

    let link = link_dir.join("appledeepdoc-launcher");
    std::os::unix::fs::symlink(&launcher, &link).unwrap();

    let resolved = fs::canonicalize(&target_dir).unwrap();
    launcher_command(&link)
        .assert()
        .success()
        .stdout(
            predicate::str::contains("interpreter=target-venv").and(predicate::str::contains(
                format!("cwd={}\n", resolved.display()),
            )),
        );
}

#[test]
fn unresolvable_interpreter_fails_with_a_diagnostic() {
    let temp = TempDir::new().unwrap();
    let launcher = install_launcher(temp.path());

    let empty_bin = temp.path().join("emptybin");
    fs::create_dir_all(&empty_bin).unwrap();

    launcher_command(&launcher)
        .env("PATH", &empty_bin)
        .assert()
        .code(127)
        .stderr(predicate::str::contains("failed to execute"));
}
