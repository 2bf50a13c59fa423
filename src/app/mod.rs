pub mod checkers;

use crate::adapters::webdriver::WebDriverFactory;
use crate::config::AppConfig;
use crate::core::pacing::Pacing;
use crate::core::service::RegoService;
use crate::domain::ports::SessionFactory;
use crate::utils::error::Result;
use std::sync::Arc;

/// A running lookup service and the WebDriver endpoint behind it.
pub struct App {
    pub service: Arc<RegoService>,
    factory: Arc<WebDriverFactory>,
}

impl App {
    /// Connects to (or launches) ChromeDriver and wires up the enabled states.
    pub async fn start(config: &AppConfig) -> Result<Self> {
        let factory = Arc::new(
            WebDriverFactory::connect(config.webdriver.clone(), config.stealth.clone()).await?,
        );
        let pacing = Pacing::new(config.checks.pacing);
        let checkers = checkers::build_checkers(&config.checks.states, pacing);
        let sessions: Arc<dyn SessionFactory> = factory.clone();

        let service = RegoService::new(sessions, checkers, config.webdriver.max_sessions);
        tracing::info!(
            "Registration checks enabled for {}",
            service
                .supported_states()
                .iter()
                .map(|s| s.code())
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(Self {
            service: Arc::new(service),
            factory,
        })
    }

    /// Stops a launched ChromeDriver. Call once nothing else holds the service.
    pub async fn shutdown(self) -> Result<()> {
        drop(self.service);
        match Arc::try_unwrap(self.factory) {
            Ok(factory) => factory.shutdown().await,
            Err(_) => {
                tracing::warn!("WebDriver factory still in use; ChromeDriver stops on exit");
                Ok(())
            }
        }
    }
}
