//! Chrome automation over the W3C WebDriver wire protocol.

pub mod capabilities;
pub mod client;
pub mod service;
pub mod stealth;

pub use capabilities::ChromeOptions;
pub use client::WebDriverSession;
pub use service::{ChromeDriverService, DriverEndpoint, WebDriverFactory};
