pub mod interact;
pub mod pacing;
pub mod service;
pub mod wait;

pub use crate::domain::locator::{ElementRef, Locator};
pub use crate::domain::model::{AuState, Plate, RegoStatus, VehicleDetails, VehicleInfo};
pub use crate::domain::ports::{Browser, SessionFactory, StateChecker};
pub use crate::utils::error::Result;
