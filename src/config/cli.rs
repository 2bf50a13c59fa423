use crate::config::AppConfig;
use crate::domain::model::AuState;
use crate::utils::error::Result;
use crate::utils::validation::{validate_existing_file, validate_range, validate_url, Validate};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "rego-check")]
#[command(about = "Australian vehicle registration checks through headless Chrome")]
pub struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    /// Log as JSON lines instead of compact text
    #[arg(long, global = true)]
    pub log_json: bool,

    /// ChromeDriver executable to launch
    #[arg(long, global = true)]
    pub chromedriver: Option<String>,

    /// Use an already running WebDriver server instead of launching ChromeDriver
    #[arg(long, global = true)]
    pub remote_url: Option<String>,

    /// Multiplier for the pauses between page interactions (0 disables them)
    #[arg(long, global = true)]
    pub pacing: Option<f64>,

    #[arg(long, global = true)]
    pub max_sessions: Option<usize>,

    /// Show the browser window
    #[arg(long, global = true)]
    pub no_headless: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the web form and JSON API (the default)
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    /// Check a single plate
    Check {
        state: String,
        plate: String,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Prompt for plates one at a time
    Interactive {
        #[arg(long, default_value = "ACT")]
        state: String,
    },
    /// Check every `state,plate` row of a CSV file
    Batch {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

impl Cli {
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Serve {
            host: None,
            port: None,
        })
    }

    /// Command line flags win over file values.
    pub fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(path) = &self.chromedriver {
            config.webdriver.chromedriver_path = path.clone();
        }
        if let Some(url) = &self.remote_url {
            config.webdriver.remote_url = Some(url.clone());
        }
        if let Some(pacing) = self.pacing {
            config.checks.pacing = pacing;
        }
        if let Some(max) = self.max_sessions {
            config.webdriver.max_sessions = max;
        }
        if self.no_headless {
            config.webdriver.headless = false;
        }
        if let Some(Command::Serve { host, port }) = &self.command {
            if let Some(host) = host {
                config.server.host = host.clone();
            }
            if let Some(port) = port {
                config.server.port = *port;
            }
        }
    }
}

impl Validate for Cli {
    fn validate(&self) -> Result<()> {
        if let Some(url) = &self.remote_url {
            validate_url("--remote-url", url)?;
        }
        if let Some(pacing) = self.pacing {
            validate_range("--pacing", pacing, 0.0, 10.0)?;
        }
        match &self.command {
            Some(Command::Check { state, .. }) | Some(Command::Interactive { state }) => {
                state.parse::<AuState>()?;
            }
            Some(Command::Batch { input, .. }) => validate_existing_file("input", input)?,
            _ => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::parse_from(["rego-check"]);
        assert!(matches!(cli.command(), Command::Serve { host: None, port: None }));
    }

    #[test]
    fn flags_override_file_settings() {
        let cli = Cli::parse_from([
            "rego-check",
            "--pacing",
            "0",
            "--remote-url",
            "http://selenium:4444",
            "serve",
            "--port",
            "8080",
        ]);
        let mut config = AppConfig::default();
        cli.apply_overrides(&mut config);
        assert_eq!(config.checks.pacing, 0.0);
        assert_eq!(config.webdriver.remote_url.as_deref(), Some("http://selenium:4444"));
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
    }

    #[test]
    fn global_flags_work_after_the_subcommand() {
        let cli = Cli::parse_from(["rego-check", "check", "act", "abc123", "--json", "-v"]);
        assert!(cli.verbose);
        assert!(matches!(cli.command(), Command::Check { json: true, .. }));
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn unknown_state_fails_validation() {
        let cli = Cli::parse_from(["rego-check", "check", "WA", "ABC123"]);
        assert!(cli.validate().is_err());
    }

    #[test]
    fn missing_batch_file_fails_validation() {
        let cli = Cli::parse_from(["rego-check", "batch", "/definitely/not/here.csv"]);
        let err = cli.validate().unwrap_err();
        assert_eq!(err.kind(), "InvalidConfigValueError");
    }
}
