use crate::adapters::webdriver::capabilities::ChromeOptions;
use crate::adapters::webdriver::client::WebDriverSession;
use crate::adapters::webdriver::stealth;
use crate::config::{StealthSettings, WebDriverSettings};
use crate::domain::ports::{Browser, SessionFactory};
use crate::utils::error::{RegoError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::net::TcpListener;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::{Child, Command};

const STATUS_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// A ChromeDriver child process owned by this application.
#[derive(Debug)]
pub struct ChromeDriverService {
    child: Child,
    url: String,
}

impl ChromeDriverService {
    /// Spawns `path` on a free local port and waits until it reports ready.
    pub async fn start(path: &str, startup_timeout: Duration, client: &Client) -> Result<Self> {
        let port = free_port()?;
        tracing::info!("Starting ChromeDriver {} on port {}", path, port);

        let child = Command::new(path)
            .arg(format!("--port={}", port))
            .arg("--silent")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| RegoError::DriverStartError {
                message: format!("could not spawn {}: {}", path, e),
            })?;

        let service = Self {
            child,
            url: format!("http://127.0.0.1:{}", port),
        };
        wait_until_ready(client, &service.url, startup_timeout).await?;
        tracing::info!("ChromeDriver ready at {}", service.url);
        Ok(service)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn stop(mut self) -> Result<()> {
        tracing::info!("Stopping ChromeDriver at {}", self.url);
        self.child.kill().await?;
        Ok(())
    }
}

/// Polls `GET /status` until the driver says it accepts new sessions.
pub async fn wait_until_ready(client: &Client, url: &str, timeout: Duration) -> Result<()> {
    let deadline = tokio::time::Instant::now() + timeout;
    let status_url = format!("{}/status", url.trim_end_matches('/'));

    loop {
        let ready = match client.get(&status_url).send().await {
            Ok(response) => response
                .json::<Value>()
                .await
                .ok()
                .and_then(|body| body.pointer("/value/ready").and_then(Value::as_bool))
                .unwrap_or(false),
            Err(e) => {
                tracing::debug!("WebDriver status not reachable yet: {}", e);
                false
            }
        };
        if ready {
            return Ok(());
        }
        if tokio::time::Instant::now() >= deadline {
            return Err(RegoError::DriverStartError {
                message: format!("{} did not become ready within {:?}", status_url, timeout),
            });
        }
        tokio::time::sleep(STATUS_POLL_INTERVAL).await;
    }
}

fn free_port() -> Result<u16> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    Ok(listener.local_addr()?.port())
}

#[derive(Debug)]
pub enum DriverEndpoint {
    Managed(ChromeDriverService),
    Remote(String),
}

impl DriverEndpoint {
    pub fn url(&self) -> &str {
        match self {
            DriverEndpoint::Managed(service) => service.url(),
            DriverEndpoint::Remote(url) => url,
        }
    }
}

/// Opens Chrome sessions against a managed or remote WebDriver endpoint.
pub struct WebDriverFactory {
    client: Client,
    endpoint: DriverEndpoint,
    settings: WebDriverSettings,
    stealth: StealthSettings,
}

impl WebDriverFactory {
    pub async fn connect(settings: WebDriverSettings, stealth: StealthSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.command_timeout_seconds))
            .build()?;
        let startup_timeout = Duration::from_secs(settings.startup_timeout_seconds);

        let endpoint = match &settings.remote_url {
            Some(url) => {
                tracing::info!("Using remote WebDriver at {}", url);
                wait_until_ready(&client, url, startup_timeout).await?;
                DriverEndpoint::Remote(url.clone())
            }
            None => DriverEndpoint::Managed(
                ChromeDriverService::start(&settings.chromedriver_path, startup_timeout, &client)
                    .await?,
            ),
        };

        Ok(Self {
            client,
            endpoint,
            settings,
            stealth,
        })
    }

    pub fn endpoint(&self) -> &DriverEndpoint {
        &self.endpoint
    }

    pub async fn shutdown(self) -> Result<()> {
        match self.endpoint {
            DriverEndpoint::Managed(service) => service.stop().await,
            DriverEndpoint::Remote(_) => Ok(()),
        }
    }
}

#[async_trait]
impl SessionFactory for WebDriverFactory {
    async fn open(&self) -> Result<Box<dyn Browser>> {
        let options = ChromeOptions::randomized(&self.settings, &mut rand::thread_rng());
        let session =
            WebDriverSession::start(&self.client, self.endpoint.url(), options.to_capabilities())
                .await?;

        if let Err(e) = stealth::apply(&session, &self.stealth, &options.user_agent).await {
            tracing::warn!("Stealth patches not applied to session {}: {}", session.session_id(), e);
        }
        Ok(Box::new(session))
    }
}
