#[cfg(feature = "cli")]
pub mod cli;

use crate::domain::model::AuState;
use crate::utils::error::{RegoError, Result};
use crate::utils::validation::{
    validate_chrome_versions, validate_non_empty_string, validate_path, validate_positive_number,
    validate_range, validate_url, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// File looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "rego-check.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub webdriver: WebDriverSettings,
    pub stealth: StealthSettings,
    pub checks: CheckSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub request_timeout_seconds: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            request_timeout_seconds: 180,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebDriverSettings {
    pub chromedriver_path: String,
    /// Use an already running WebDriver server instead of spawning ChromeDriver.
    pub remote_url: Option<String>,
    pub chrome_binary: Option<String>,
    pub headless: bool,
    pub disable_images: bool,
    pub startup_timeout_seconds: u64,
    pub command_timeout_seconds: u64,
    pub max_sessions: usize,
    pub user_agent_versions: Vec<String>,
    pub extra_args: Vec<String>,
}

impl Default for WebDriverSettings {
    fn default() -> Self {
        Self {
            chromedriver_path: "/usr/local/bin/chromedriver".to_string(),
            remote_url: None,
            chrome_binary: None,
            headless: true,
            disable_images: true,
            startup_timeout_seconds: 20,
            command_timeout_seconds: 120,
            max_sessions: 2,
            user_agent_versions: ["120.0.0.0", "119.0.0.0", "118.0.0.0", "121.0.0.0", "122.0.0.0", "123.0.0.0"]
                .iter()
                .map(|v| v.to_string())
                .collect(),
            extra_args: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StealthSettings {
    pub enabled: bool,
    pub languages: Vec<String>,
    pub vendor: String,
    pub platform: String,
    pub webgl_vendor: String,
    pub renderer: String,
    pub fix_hairline: bool,
}

impl Default for StealthSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            languages: vec!["en-US".to_string(), "en".to_string()],
            vendor: "Google Inc.".to_string(),
            platform: "Win32".to_string(),
            webgl_vendor: "Intel Inc.".to_string(),
            renderer: "Intel Iris OpenGL Engine".to_string(),
            fix_hairline: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckSettings {
    /// Multiplier for the human-like pauses between interactions; 0 disables them.
    pub pacing: f64,
    pub states: Vec<AuState>,
}

impl Default for CheckSettings {
    fn default() -> Self {
        Self {
            pacing: 1.0,
            states: AuState::ALL.to_vec(),
        }
    }
}

impl AppConfig {
    /// Loads and parses a TOML config file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(RegoError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| RegoError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Explicit path, else `rego-check.toml` in the working directory, else defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Self::from_file(DEFAULT_CONFIG_FILE),
            None => Ok(Self::default()),
        }
    }

    /// Replaces `${VAR}` with the environment value; unset variables are left as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| RegoError::ConfigError {
            message: format!("env substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_non_empty_string("server.host", &self.server.host)?;
        validate_range("server.port", self.server.port, 1, u16::MAX)?;

        match &self.webdriver.remote_url {
            Some(url) => validate_url("webdriver.remote_url", url)?,
            None => validate_path("webdriver.chromedriver_path", &self.webdriver.chromedriver_path)?,
        }
        validate_positive_number("webdriver.max_sessions", self.webdriver.max_sessions, 1)?;
        validate_positive_number(
            "webdriver.startup_timeout_seconds",
            self.webdriver.startup_timeout_seconds as usize,
            1,
        )?;
        validate_chrome_versions(
            "webdriver.user_agent_versions",
            &self.webdriver.user_agent_versions,
        )?;

        validate_range("checks.pacing", self.checks.pacing, 0.0, 10.0)?;
        if self.checks.states.is_empty() {
            return Err(RegoError::MissingConfigError {
                field: "checks.states".to_string(),
            });
        }

        Ok(())
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn empty_file_gives_defaults() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.webdriver.chromedriver_path, "/usr/local/bin/chromedriver");
        assert_eq!(config.checks.states.len(), 6);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let toml_content = r#"
[server]
port = 8080

[webdriver]
remote_url = "http://selenium:4444/wd/hub"
max_sessions = 4

[checks]
pacing = 0.0
states = ["ACT", "VIC"]
"#;

        let config = AppConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.webdriver.max_sessions, 4);
        assert!(config.webdriver.headless);
        assert_eq!(config.checks.states, vec![AuState::Act, AuState::Vic]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("REGO_TEST_DRIVER_URL", "http://driver.internal:9515");

        let config = AppConfig::from_toml_str(
            r#"
[webdriver]
remote_url = "${REGO_TEST_DRIVER_URL}"
"#,
        )
        .unwrap();
        assert_eq!(
            config.webdriver.remote_url.as_deref(),
            Some("http://driver.internal:9515")
        );

        std::env::remove_var("REGO_TEST_DRIVER_URL");
    }

    #[test]
    fn test_config_validation() {
        let config = AppConfig::from_toml_str(
            r#"
[webdriver]
remote_url = "invalid-url"
"#,
        )
        .unwrap();
        assert!(config.validate().is_err());

        let config = AppConfig::from_toml_str("[checks]\nstates = []\n").unwrap();
        assert!(config.validate().is_err());

        let config = AppConfig::from_toml_str("[webdriver]\nmax_sessions = 0\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_state_is_a_parse_error() {
        assert!(AppConfig::from_toml_str("[checks]\nstates = [\"WA\"]\n").is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[server]\nhost = \"127.0.0.1\"\n")
            .unwrap();

        let config = AppConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
    }
}
