// Escalation engine - turns classified snapshots into alert events.
//
// Fires on the rising edge only: a category that stays High does not re-alert
// until it has dropped below High at least once.

use super::model::{AlertEvent, AlertKind};
use crate::core::model::{RiskLevel, SensorSnapshot};

/// Tracks the last seen level per category
#[derive(Debug, Clone, Default)]
pub struct EscalationEngine {
    physio: RiskLevel,
    env: RiskLevel,
}

impl EscalationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate a freshly classified snapshot.
    /// Returns an event when either category has just risen to High.
    pub fn evaluate(&mut self, snapshot: &SensorSnapshot) -> Option<AlertEvent> {
        let physio_rose = rose_to_high(self.physio, snapshot.physio_risk());
        let env_rose = rose_to_high(self.env, snapshot.env_risk());
        self.physio = snapshot.physio_risk();
        self.env = snapshot.env_risk();

        let mut parts = Vec::new();
        if physio_rose {
            parts.push(format!(
                "High physiological risk: {}",
                snapshot.physio_triggers().join(", ")
            ));
        }
        if env_rose {
            parts.push(format!(
                "High environmental risk: {}",
                snapshot.env_triggers().join(", ")
            ));
        }

        if parts.is_empty() {
            return None;
        }
        Some(AlertEvent {
            kind: AlertKind::RiskEscalation,
            message: parts.join(". "),
        })
    }
}

fn rose_to_high(previous: RiskLevel, current: RiskLevel) -> bool {
    previous < RiskLevel::High && current == RiskLevel::High
}
