pub mod adapters;
pub mod api;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;

#[cfg(feature = "cli")]
pub use crate::config::cli::{Cli, Command};

pub use crate::app::App;
pub use crate::config::AppConfig;
pub use crate::core::service::RegoService;
pub use crate::domain::model::{AuState, CheckOutcome, Plate, RegoStatus, VehicleInfo};
pub use crate::utils::error::{RegoError, Result};
