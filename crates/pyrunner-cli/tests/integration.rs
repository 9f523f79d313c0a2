//! Integration tests for the pyrunner binary

use assert_cmd::{cargo::cargo_bin_cmd, Command};
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn fixture_config_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("pyrunner.toml")
}

fn pyrunner_cmd(log_dir: &Path) -> Command {
    let mut cmd = cargo_bin_cmd!("pyrunner");
    cmd.env("PYRUNNER_CONFIG", fixture_config_path());
    cmd.env("PYRUNNER_LOG_FILE", log_dir.join("pyrunner.log"));
    cmd.env_remove("PYRUNNER_MODULE_PATH");
    cmd
}

#[test]
fn test_version() {
    let logs = TempDir::new().unwrap();
    pyrunner_cmd(logs.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("pyrunner"));
}

#[test]
fn test_help() {
    let logs = TempDir::new().unwrap();
    pyrunner_cmd(logs.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("embedded interpreter context"));
}

#[test]
fn test_invalid_command() {
    let logs = TempDir::new().unwrap();
    pyrunner_cmd(logs.path()).arg("invalid").assert().failure();
}

#[test]
fn test_run_without_module_path_fails() {
    let logs = TempDir::new().unwrap();
    pyrunner_cmd(logs.path())
        .args(["run", "--once"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("module path is not configured"));
}

#[test]
fn test_run_with_blank_module_path_fails() {
    let logs = TempDir::new().unwrap();
    pyrunner_cmd(logs.path())
        .args(["run", "--module-path", "   "])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("must not be blank"));
}

#[test]
fn test_blank_module_path_from_environment_fails() {
    let logs = TempDir::new().unwrap();
    pyrunner_cmd(logs.path())
        .env("PYRUNNER_MODULE_PATH", "")
        .args(["run", "--once"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("PYRUNNER_MODULE_PATH"));
}

#[test]
fn test_config_show() {
    let logs = TempDir::new().unwrap();
    pyrunner_cmd(logs.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration:"))
        .stdout(predicate::str::contains("interval-secs"));
}

#[test]
fn test_config_set_and_get() {
    let logs = TempDir::new().unwrap();
    let config_path = logs.path().join("config").join("pyrunner.toml");

    pyrunner_cmd(logs.path())
        .env("PYRUNNER_CONFIG", &config_path)
        .args(["config", "set", "module-path", "/srv/modules"])
        .assert()
        .success();
    assert!(fs::read_to_string(&config_path)
        .unwrap()
        .contains("/srv/modules"));

    pyrunner_cmd(logs.path())
        .env("PYRUNNER_CONFIG", &config_path)
        .args(["config", "get", "module-path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("/srv/modules"));

    pyrunner_cmd(logs.path())
        .env("PYRUNNER_CONFIG", &config_path)
        .args(["config", "set", "interval-secs", "0"])
        .assert()
        .failure();
}

#[test]
fn test_config_path_honors_override() {
    let logs = TempDir::new().unwrap();
    pyrunner_cmd(logs.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("pyrunner.toml"));
}

#[test]
fn test_run_once_executes_modules() {
    let logs = TempDir::new().unwrap();
    let modules = TempDir::new().unwrap();
    fs::write(
        modules.path().join("answer.py"),
        "def execute():\n    return 6 * 7\n",
    )
    .unwrap();

    pyrunner_cmd(logs.path())
        .args(["-v", "--log-python", "run", "--once", "--module-path"])
        .arg(modules.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("result: 42"))
        .stderr(predicate::str::contains("Loader tick completed"));

    let log = fs::read_to_string(logs.path().join("pyrunner.log")).unwrap();
    assert!(log.contains("[PYTHON]"));
    assert!(log.contains("Using Python module path from command line"));
}

#[test]
fn test_run_once_reports_missing_loader() {
    let logs = TempDir::new().unwrap();
    let modules = TempDir::new().unwrap();
    let resources = TempDir::new().unwrap();
    fs::write(resources.path().join("runner.py"), "x = 1\n").unwrap();

    pyrunner_cmd(logs.path())
        .args(["run", "--once", "--module-path"])
        .arg(modules.path())
        .arg("--resources-dir")
        .arg(resources.path())
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("load_all_py_files"));
}

#[cfg(unix)]
#[test]
fn test_run_with_non_utf8_resources_dir_reports_missing_resource() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let logs = TempDir::new().unwrap();
    let modules = TempDir::new().unwrap();
    let resources = logs.path().join(OsStr::from_bytes(b"res-\xff"));

    pyrunner_cmd(logs.path())
        .args(["run", "--once", "--module-path"])
        .arg(modules.path())
        .arg("--resources-dir")
        .arg(&resources)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Bootstrap resource 'runner.py' not found"));
}

#[test]
fn test_probe() {
    let logs = TempDir::new().unwrap();
    pyrunner_cmd(logs.path())
        .arg("probe")
        .assert()
        .success()
        .stdout(predicate::str::contains("Processed: probe"))
        .stdout(predicate::str::contains("Other Processed"));
}
