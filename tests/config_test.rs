use anyhow::Result;
use clap::Parser;
use rego_check::config::{AppConfig, DEFAULT_CONFIG_FILE};
use rego_check::utils::validation::Validate;
use rego_check::{AuState, Cli, Command};
use std::io::Write;
use tempfile::NamedTempFile;
use tokio_test::{assert_err, assert_ok};

const FULL_CONFIG: &str = r#"
[server]
host = "127.0.0.1"
port = 8088
request_timeout_seconds = 90

[webdriver]
chromedriver_path = "${REGO_CONFIG_TEST_DRIVER}"
headless = true
max_sessions = 3
user_agent_versions = ["124.0.0.0"]

[stealth]
platform = "MacIntel"

[checks]
pacing = 0.5
states = ["NSW", "QLD", "TAS"]
"#;

fn config_file(content: &str) -> Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    file.write_all(content.as_bytes())?;
    Ok(file)
}

#[test]
fn test_full_config_file_round_trips_every_section() -> Result<()> {
    std::env::set_var("REGO_CONFIG_TEST_DRIVER", "/opt/chromedriver");
    let file = config_file(FULL_CONFIG)?;

    let config = AppConfig::load(Some(file.path()))?;
    std::env::remove_var("REGO_CONFIG_TEST_DRIVER");

    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 8088);
    assert_eq!(config.server.request_timeout_seconds, 90);
    assert_eq!(config.webdriver.chromedriver_path, "/opt/chromedriver");
    assert_eq!(config.webdriver.max_sessions, 3);
    assert_eq!(config.webdriver.user_agent_versions, vec!["124.0.0.0"]);
    assert_eq!(config.stealth.platform, "MacIntel");
    assert_eq!(config.stealth.vendor, "Google Inc.");
    assert_eq!(config.checks.pacing, 0.5);
    assert_eq!(
        config.checks.states,
        vec![AuState::Nsw, AuState::Qld, AuState::Tas]
    );
    assert_ok!(config.validate());
    Ok(())
}

#[test]
fn test_unset_variables_are_left_in_place() -> Result<()> {
    let config = AppConfig::from_toml_str(
        "[webdriver]\nchromedriver_path = \"${REGO_CONFIG_TEST_NEVER_SET}\"\n",
    )?;
    assert_eq!(
        config.webdriver.chromedriver_path,
        "${REGO_CONFIG_TEST_NEVER_SET}"
    );
    Ok(())
}

#[test]
fn test_missing_file_and_bad_toml_are_errors() -> Result<()> {
    let err = AppConfig::load(Some(std::path::Path::new("/nonexistent/rego.toml"))).unwrap_err();
    assert_eq!(err.kind(), "IoError");

    let file = config_file("[server\nport = 1")?;
    let err = AppConfig::from_file(file.path()).unwrap_err();
    assert_eq!(err.kind(), "ConfigError");
    assert!(err.to_string().contains("TOML parsing error"));
    Ok(())
}

#[test]
fn test_out_of_range_values_fail_validation() -> Result<()> {
    let pacing = AppConfig::from_toml_str("[checks]\npacing = 12.0\n")?;
    assert_err!(pacing.validate());

    let no_agents = AppConfig::from_toml_str("[webdriver]\nuser_agent_versions = []\n")?;
    assert_eq!(no_agents.validate().unwrap_err().kind(), "MissingConfigError");

    let port = AppConfig::from_toml_str("[server]\nport = 0\n")?;
    assert_err!(port.validate());
    Ok(())
}

#[test]
fn test_cli_flags_override_the_file() -> Result<()> {
    let mut config = AppConfig::from_toml_str(FULL_CONFIG)?;
    let cli = Cli::try_parse_from([
        "rego-check",
        "--remote-url",
        "http://localhost:4444",
        "--pacing",
        "0",
        "--max-sessions",
        "1",
        "--no-headless",
        "serve",
        "--port",
        "9000",
    ])?;

    assert_ok!(cli.validate());
    cli.apply_overrides(&mut config);

    assert_eq!(config.webdriver.remote_url.as_deref(), Some("http://localhost:4444"));
    assert_eq!(config.checks.pacing, 0.0);
    assert_eq!(config.webdriver.max_sessions, 1);
    assert!(!config.webdriver.headless);
    assert_eq!(config.server.port, 9000);
    assert_eq!(config.server.host, "127.0.0.1");
    assert_ok!(config.validate());
    Ok(())
}

#[test]
fn test_cli_defaults_to_serving() -> Result<()> {
    let cli = Cli::try_parse_from(["rego-check"])?;
    assert!(matches!(cli.command(), Command::Serve { .. }));
    assert!(cli.config.is_none());
    assert_eq!(DEFAULT_CONFIG_FILE, "rego-check.toml");
    Ok(())
}

#[test]
fn test_cli_rejects_unknown_states_and_bad_urls() -> Result<()> {
    let cli = Cli::try_parse_from(["rego-check", "check", "WA", "ABC123"])?;
    assert_err!(cli.validate());

    let cli = Cli::try_parse_from(["rego-check", "--remote-url", "not a url", "check", "ACT", "A1"])?;
    assert_err!(cli.validate());

    let cli = Cli::try_parse_from(["rego-check", "--pacing", "20", "interactive"])?;
    assert_err!(cli.validate());
    Ok(())
}
