use crate::domain::model::{AuState, Plate, RegoStatus, VehicleInfo};
use crate::domain::ports::{Browser, SessionFactory, StateChecker};
use crate::utils::error::{RegoError, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Runs registration lookups, one fresh browser session per lookup.
pub struct RegoService {
    factory: Arc<dyn SessionFactory>,
    checkers: HashMap<AuState, Arc<dyn StateChecker>>,
    sessions: Arc<Semaphore>,
}

impl RegoService {
    pub fn new(
        factory: Arc<dyn SessionFactory>,
        checkers: Vec<Arc<dyn StateChecker>>,
        max_sessions: usize,
    ) -> Self {
        let checkers = checkers
            .into_iter()
            .map(|checker| (checker.state(), checker))
            .collect();
        Self {
            factory,
            checkers,
            sessions: Arc::new(Semaphore::new(max_sessions.max(1))),
        }
    }

    /// Supported states in their canonical order.
    pub fn supported_states(&self) -> Vec<AuState> {
        AuState::ALL
            .iter()
            .copied()
            .filter(|state| self.checkers.contains_key(state))
            .collect()
    }

    pub fn supports(&self, state: AuState) -> bool {
        self.checkers.contains_key(&state)
    }

    /// Parses a state code, accepting only states with a checker.
    pub fn resolve_state(&self, raw: &str) -> Result<AuState> {
        let unsupported = || RegoError::ValidationError {
            message: format!("State \"{}\" is not supported.", raw.trim().to_uppercase()),
        };
        let state: AuState = raw.parse().map_err(|_| unsupported())?;
        if self.supports(state) {
            Ok(state)
        } else {
            Err(unsupported())
        }
    }

    /// Checks one plate.
    ///
    /// Site trouble is reported inside the returned [`VehicleInfo`]; `Err` means
    /// the lookup could not run at all (unsupported state, no browser session).
    pub async fn check(&self, state: AuState, plate: &Plate) -> Result<VehicleInfo> {
        let checker = self
            .checkers
            .get(&state)
            .cloned()
            .ok_or_else(|| RegoError::ValidationError {
                message: format!("State \"{}\" is not supported.", state),
            })?;

        let permit = Arc::clone(&self.sessions)
            .acquire_owned()
            .await
            .map_err(|e| RegoError::DriverStartError {
                message: format!("session pool closed: {}", e),
            })?;

        tracing::info!(state = %state, plate = %plate, "Checking registration");
        let browser = self.factory.open().await.map_err(|e| {
            tracing::error!("WebDriver setup failed: {}", e);
            match e {
                RegoError::DriverStartError { .. } => e,
                other => RegoError::DriverStartError {
                    message: other.to_string(),
                },
            }
        })?;

        let session = Session::new(browser, permit);
        let outcome = checker.check(session.browser(), plate).await;
        session.close().await;

        let info = settle(state, outcome);
        tracing::info!(
            state = %state,
            plate = %plate,
            status = %info.status,
            "Registration check finished"
        );
        Ok(info)
    }

    /// Lookup from raw user input that always yields a result record.
    pub async fn get_vehicle_info(&self, state: &str, plate: &str) -> VehicleInfo {
        let plate = match Plate::parse(plate) {
            Ok(plate) => plate,
            Err(e) => return VehicleInfo::failed(RegoStatus::Error, validation_message(e)),
        };
        let state = match self.resolve_state(state) {
            Ok(state) => state,
            Err(e) => return VehicleInfo::failed(RegoStatus::Error, validation_message(e)),
        };

        match self.check(state, &plate).await {
            Ok(info) => info,
            Err(RegoError::DriverStartError { .. }) => {
                VehicleInfo::failed(RegoStatus::Error, "Failed to initialize the WebDriver.")
            }
            Err(e) => {
                tracing::error!("Unexpected error for {} - {}: {}", state, plate, e);
                VehicleInfo::failed(
                    RegoStatus::Error,
                    format!("An unexpected system error occurred: {}", e.kind()),
                )
            }
        }
    }
}

/// An open browser session and the permit it was opened under.
///
/// Dropped without [`Session::close`] (the lookup future was cancelled, e.g.
/// by the request timeout), it quits the browser on a spawned task and only
/// then releases the permit.
struct Session {
    browser: Arc<dyn Browser>,
    permit: Option<OwnedSemaphorePermit>,
    closed: bool,
}

impl Session {
    fn new(browser: Box<dyn Browser>, permit: OwnedSemaphorePermit) -> Self {
        Self {
            browser: Arc::from(browser),
            permit: Some(permit),
            closed: false,
        }
    }

    fn browser(&self) -> &dyn Browser {
        self.browser.as_ref()
    }

    async fn close(mut self) {
        quit(self.browser()).await;
        self.closed = true;
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        let browser = Arc::clone(&self.browser);
        let permit = self.permit.take();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                tracing::warn!("Lookup cancelled; closing its browser session");
                handle.spawn(async move {
                    quit(browser.as_ref()).await;
                    drop(permit);
                });
            }
            Err(_) => tracing::error!("No runtime left to close a cancelled browser session"),
        }
    }
}

async fn quit(browser: &dyn Browser) {
    if let Err(e) = browser.quit().await {
        tracing::error!("Error quitting WebDriver session: {}", e);
    }
}

/// Folds a checker failure into a result record.
fn settle(state: AuState, outcome: Result<VehicleInfo>) -> VehicleInfo {
    match outcome {
        Ok(info) => info,
        Err(e) if e.is_timeout() => {
            tracing::error!("Timeout during {} check: {}", state, e);
            VehicleInfo::failed(RegoStatus::Error, "Page load or interaction timeout.")
        }
        Err(RegoError::WebDriverError { code, message }) => {
            tracing::error!("WebDriver error during {} check: {} ({})", state, code, message);
            VehicleInfo::failed(RegoStatus::Error, format!("WebDriver error: {}", code))
        }
        Err(e) => {
            tracing::error!("Unexpected error during {} check: {}", state, e);
            VehicleInfo::failed(
                RegoStatus::Error,
                format!("An unexpected error occurred: {}.", e.kind()),
            )
        }
    }
}

fn validation_message(e: RegoError) -> String {
    match e {
        RegoError::ValidationError { message } => message,
        other => other.to_string(),
    }
}
