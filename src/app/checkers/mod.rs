pub mod act;
pub mod nsw;
pub mod qld;
pub mod sa;
pub mod tas;
pub mod vic;

pub use act::ActChecker;
pub use nsw::NswChecker;
pub use qld::QldChecker;
pub use sa::SaChecker;
pub use tas::TasChecker;
pub use vic::VicChecker;

use crate::core::pacing::Pacing;
use crate::core::{AuState, StateChecker};
use std::sync::Arc;

pub fn checker_for(state: AuState, pacing: Pacing) -> Arc<dyn StateChecker> {
    match state {
        AuState::Act => Arc::new(ActChecker::new(pacing)),
        AuState::Nsw => Arc::new(NswChecker::new(pacing)),
        AuState::Qld => Arc::new(QldChecker::new(pacing)),
        AuState::Sa => Arc::new(SaChecker::new(pacing)),
        AuState::Vic => Arc::new(VicChecker::new(pacing)),
        AuState::Tas => Arc::new(TasChecker::new(pacing)),
    }
}

/// One checker per enabled state, sharing the same pacing.
pub fn build_checkers(states: &[AuState], pacing: Pacing) -> Vec<Arc<dyn StateChecker>> {
    states
        .iter()
        .map(|state| checker_for(*state, pacing))
        .collect()
}
