use crate::domain::locator::{ElementRef, Locator};
use crate::domain::model::{AuState, Plate, VehicleInfo};
use crate::utils::error::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

/// One live browser session.
///
/// Single-element lookups return `Ok(None)` when nothing matches; every other
/// WebDriver failure is an error.
#[async_trait]
pub trait Browser: Send + Sync {
    async fn goto(&self, url: &str) -> Result<()>;
    async fn set_page_load_timeout(&self, timeout: Duration) -> Result<()>;

    async fn find(&self, locator: &Locator) -> Result<Option<ElementRef>>;
    async fn find_all(&self, locator: &Locator) -> Result<Vec<ElementRef>>;
    async fn find_in(&self, parent: &ElementRef, locator: &Locator) -> Result<Option<ElementRef>>;
    async fn find_all_in(&self, parent: &ElementRef, locator: &Locator) -> Result<Vec<ElementRef>>;

    /// Rendered text of the element.
    async fn text(&self, element: &ElementRef) -> Result<String>;
    /// DOM property, e.g. the current `value` of an input.
    async fn property(&self, element: &ElementRef, name: &str) -> Result<Option<String>>;
    async fn attribute(&self, element: &ElementRef, name: &str) -> Result<Option<String>>;
    async fn is_displayed(&self, element: &ElementRef) -> Result<bool>;
    async fn is_enabled(&self, element: &ElementRef) -> Result<bool>;

    async fn clear(&self, element: &ElementRef) -> Result<()>;
    async fn send_keys(&self, element: &ElementRef, text: &str) -> Result<()>;

    async fn execute(&self, script: &str, args: Vec<Value>) -> Result<Value>;
    /// Chrome DevTools command routed through the driver.
    async fn cdp(&self, command: &str, params: Value) -> Result<Value>;

    async fn quit(&self) -> Result<()>;
}

/// Opens fresh browser sessions.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open(&self) -> Result<Box<dyn Browser>>;
}

/// Walks one state's registration check site.
#[async_trait]
pub trait StateChecker: Send + Sync {
    fn state(&self) -> AuState;
    async fn check(&self, browser: &dyn Browser, plate: &Plate) -> Result<VehicleInfo>;
}
