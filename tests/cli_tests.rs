//! Integration tests for CLI

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Binary isolated from the user's own configuration and environment.
fn cliconf(home: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("cliconf"));
    cmd.env("XDG_CONFIG_HOME", home)
        .env("HOME", home)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .env_remove("CLICONF_CONFIG")
        .env_remove("CLICONF_VERBOSE")
        .env_remove("CLICONF_COLOR")
        .env_remove("CLICONF_PARAMS_OUTPUT")
        .env_remove("CLICONF_DUMP_FORMAT");
    cmd
}

#[test]
fn test_cli_version() {
    let home = TempDir::new().expect("tmp");
    let mut cmd = cliconf(home.path());
    cmd.arg("--version");
    cmd.assert().success().stdout(predicate::str::contains("cliconf"));
}

#[test]
fn test_cli_help() {
    let home = TempDir::new().expect("tmp");
    let mut cmd = cliconf(home.path());
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("environment variables"))
        .stdout(predicate::str::contains("params"))
        .stdout(predicate::str::contains("locate"))
        .stdout(predicate::str::contains("envvars"))
        .stdout(predicate::str::contains("dump"))
        .stdout(predicate::str::contains("completions"));
}

#[test]
fn test_params_defaults_without_config() {
    let home = TempDir::new().expect("tmp");
    let mut cmd = cliconf(home.path());
    cmd.args(["params", "--output", "json"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"source\": null"))
        .stdout(predicate::str::contains("\"cliconf.verbose\""))
        .stdout(predicate::str::contains("\"provenance\": \"default\""))
        .stdout(predicate::str::contains("\"cliconf.config\"").not());
}

#[test]
fn test_params_reads_explicit_config_file() {
    let home = TempDir::new().expect("tmp");
    let config = home.path().join("settings.toml");
    fs::write(&config, "[cliconf.params]\noutput = \"json\"\n").expect("write config");

    let mut cmd = cliconf(home.path());
    cmd.args(["--config", config.to_str().expect("utf8 path"), "params"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"format\": \"toml\""))
        .stdout(predicate::str::contains("settings.toml"))
        .stdout(predicate::str::contains("\"provenance\": \"config\""));
}

#[test]
fn test_config_value_outside_choices_fails() {
    let home = TempDir::new().expect("tmp");
    let config = home.path().join("settings.toml");
    fs::write(&config, "[cliconf.params]\noutput = \"xml\"\n").expect("write config");

    let mut cmd = cliconf(home.path());
    cmd.args(["--config", config.to_str().expect("utf8 path"), "params"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("cliconf.params.output"))
        .stderr(predicate::str::contains("is not one of: table, json"));
}

#[test]
fn test_missing_explicit_config_fails() {
    let home = TempDir::new().expect("tmp");
    let mut cmd = cliconf(home.path());
    cmd.args(["--config", "/missing/file.toml", "params"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Failed to resolve configuration"))
        .stderr(predicate::str::contains("/missing/file.toml is unavailable"));
}

#[test]
fn test_strict_mode_lists_unknown_keys() {
    let home = TempDir::new().expect("tmp");
    let config = home.path().join("settings.yaml");
    fs::write(&config, "cliconf:\n  bogus: 1\n  params:\n    nope: true\n    help: true\n")
        .expect("write config");

    let mut cmd = cliconf(home.path());
    cmd.args(["--strict", "--config", config.to_str().expect("utf8 path"), "params"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized configuration options"))
        .stderr(predicate::str::contains("cliconf.bogus, cliconf.params.nope"));

    let mut lenient = cliconf(home.path());
    lenient.args(["--config", config.to_str().expect("utf8 path"), "params"]);
    lenient
        .assert()
        .success()
        .stdout(predicate::str::contains("Ignored keys:"))
        .stdout(predicate::str::contains("cliconf.params.nope"));
}

#[test]
fn test_environment_sits_below_command_line() {
    let home = TempDir::new().expect("tmp");
    let mut cmd = cliconf(home.path());
    cmd.env("CLICONF_PARAMS_OUTPUT", "json").arg("params");
    cmd.assert().success().stdout(predicate::str::contains("\"provenance\": \"envvar\""));

    let mut cmd = cliconf(home.path());
    cmd.env("CLICONF_PARAMS_OUTPUT", "json").args(["params", "--output", "table"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Configuration: none"))
        .stdout(predicate::str::contains("cli"));
}

#[test]
fn test_no_config_skips_the_default_file() {
    let home = TempDir::new().expect("tmp");
    let dir = home.path().join("cliconf");
    fs::create_dir_all(&dir).expect("mkdir");
    fs::write(dir.join("config.json"), "{\"cliconf\": {\"params\": {\"output\": \"json\"}}}")
        .expect("write config");

    let mut cmd = cliconf(home.path());
    cmd.args(["--no-config", "params"]);
    cmd.assert().success().stdout(predicate::str::contains("Configuration: none"));
}

#[cfg(target_os = "linux")]
#[test]
fn test_locate_reports_the_selected_candidate() {
    let home = TempDir::new().expect("tmp");
    let dir = home.path().join("cliconf");
    fs::create_dir_all(&dir).expect("mkdir");
    fs::write(dir.join("config.yml"), "cliconf:\n  color: never\n").expect("write config");

    let mut cmd = cliconf(home.path());
    cmd.arg("locate");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("config.toml"))
        .stdout(predicate::str::contains("config.xml"))
        .stdout(predicate::str::contains("* "))
        .stdout(predicate::str::is_match(r"Selected: .*config\.yml \(yaml\)").expect("regex"));
}

#[test]
fn test_envvars_lists_derived_names() {
    let home = TempDir::new().expect("tmp");
    let mut cmd = cliconf(home.path());
    cmd.env("CLICONF_VERBOSE", "0").arg("envvars");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("CLICONF_VERBOSE (set)"))
        .stdout(predicate::str::contains("CLICONF_PARAMS_OUTPUT"))
        .stdout(predicate::str::contains("CLICONF_STRICT").not());
}

#[test]
fn test_dump_strips_json_comments() {
    let home = TempDir::new().expect("tmp");
    let file = home.path().join("app.jsonc");
    let content = "{\n  \"app\": {\n    \"port\": 80 // trailing comment\n  }\n}\n";
    fs::write(&file, content).expect("write");

    let mut cmd = cliconf(home.path());
    cmd.args(["dump", file.to_str().expect("utf8 path")]);
    cmd.assert().success().stdout(predicate::str::contains("\"port\": 80"));
}

#[test]
fn test_dump_rejects_malformed_file() {
    let home = TempDir::new().expect("tmp");
    let file = home.path().join("app.toml");
    fs::write(&file, "[app\nport = 80\n").expect("write");

    let mut cmd = cliconf(home.path());
    cmd.args(["dump", file.to_str().expect("utf8 path")]);
    cmd.assert().failure().stderr(predicate::str::contains("malformed configuration"));
}

#[test]
fn test_completions_for_bash() {
    let home = TempDir::new().expect("tmp");
    let mut cmd = cliconf(home.path());
    cmd.args(["completions", "bash"]);
    cmd.assert().success().stdout(predicate::str::contains("cliconf"));
}
