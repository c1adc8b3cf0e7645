// Alert model types shared by the controller and its subscribers.

use serde::{Deserialize, Serialize};
use tokio::time::{Duration, Instant};

/// Where an alert came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlertKind {
    /// Operator-initiated "simulate high-risk scenario" command
    HighRiskSimulation,
    /// A risk category rose to High on a vitals tick
    RiskEscalation,
}

impl AlertKind {
    /// Get the display name for this alert
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::HighRiskSimulation => "High-Risk Simulation",
            Self::RiskEscalation => "Risk Escalation",
        }
    }

    /// Get a description of what raises this alert
    pub fn description(&self) -> &'static str {
        match self {
            Self::HighRiskSimulation => "Shown when a high-risk scenario simulation is started from the dashboard",
            Self::RiskEscalation => "Shown when physiological or environmental risk rises to high",
        }
    }

    /// Banner text for presets with a fixed message
    pub fn preset_message(&self) -> Option<&'static str> {
        match self {
            Self::HighRiskSimulation => Some("System Alert: High-risk scenario simulation active."),
            Self::RiskEscalation => None,
        }
    }
}

/// Alert raised by a system event, before it reaches the controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub kind: AlertKind,
    pub message: String,
}

/// Current banner state. Only the alert controller publishes it.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertState {
    /// Incremented on every trigger; kept when the alert hides
    pub id: u64,
    pub visible: bool,
    pub message: String,
    #[serde(skip)]
    pub expires_at: Option<Instant>,
}

impl AlertState {
    pub fn hidden() -> Self {
        Self::default()
    }

    /// Time left before auto-hide, if visible
    pub fn remaining(&self) -> Option<Duration> {
        match (self.visible, self.expires_at) {
            (true, Some(at)) => Some(at.saturating_duration_since(Instant::now())),
            _ => None,
        }
    }

    pub(crate) fn hide(&mut self) {
        self.visible = false;
        self.message.clear();
        self.expires_at = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_kinds_have_names() {
        for kind in [AlertKind::HighRiskSimulation, AlertKind::RiskEscalation] {
            assert!(!kind.display_name().is_empty());
            assert!(!kind.description().is_empty());
        }
    }

    #[test]
    fn test_preset_messages() {
        assert_eq!(
            AlertKind::HighRiskSimulation.preset_message(),
            Some("System Alert: High-risk scenario simulation active.")
        );
        assert_eq!(AlertKind::RiskEscalation.preset_message(), None);
    }

    #[test]
    fn test_hide_keeps_id() {
        let mut state = AlertState {
            id: 4,
            visible: true,
            message: "Check inhaler".to_string(),
            expires_at: Some(Instant::now()),
        };
        state.hide();
        assert_eq!(state.id, 4);
        assert!(!state.visible);
        assert!(state.message.is_empty());
        assert_eq!(state.remaining(), None);
    }

    #[test]
    fn test_hidden_serializes_without_expiry() {
        let json = serde_json::to_value(AlertState::hidden()).unwrap();
        assert_eq!(json, serde_json::json!({"id": 0, "visible": false, "message": ""}));
    }
}
