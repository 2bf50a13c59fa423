// Domain layer: lookup models and the ports the browser adapters implement.

pub mod locator;
pub mod model;
pub mod ports;
