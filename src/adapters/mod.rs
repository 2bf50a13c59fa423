// Adapters layer: concrete implementations for external systems (browser driver, HTTP surface, files).

pub mod batch;
pub mod webdriver;
