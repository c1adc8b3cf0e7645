// Alert banner module for transient on-screen notifications.
//
// Architecture:
// - model.rs: Alert state published to subscribers and alert presets
// - controller.rs: Show / auto-hide / dismiss lifecycle with stale-timer guard
// - escalation.rs: Raises alerts when a risk category rises to High

pub mod controller;
pub mod escalation;
pub mod model;

pub use controller::AlertController;
pub use escalation::EscalationEngine;
pub use model::{AlertEvent, AlertKind, AlertState};
