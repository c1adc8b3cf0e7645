use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::risk::RiskAssessment;

/// Ordinal severity for a category of readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    #[default]
    Safe,
    Medium,
    High,
}

impl RiskLevel {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Safe => "safe",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// 0, 1 or 2, used for weighted risk scores
    pub fn severity(&self) -> u8 {
        match self {
            Self::Safe => 0,
            Self::Medium => 1,
            Self::High => 2,
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classified respiratory sound from the acoustic sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RespiratorySound {
    #[default]
    Normal,
    Wheeze,
    Crackle,
    Cough,
}

impl RespiratorySound {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::Wheeze => "Wheeze",
            Self::Crackle => "Crackle",
            Self::Cough => "Cough",
        }
    }
}

impl fmt::Display for RespiratorySound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Complete set of readings and derived risk fields at one instant.
///
/// Derived fields (`physio_*`, `env_*`) are only written through
/// [`SensorSnapshot::apply_assessment`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorSnapshot {
    pub spo2: f64,
    pub heart_rate: u32,
    pub breathing_rate: u32,
    pub respiratory_sounds: RespiratorySound,
    pub temperature: f64,
    pub humidity: f64,
    pub pm25: f64,
    physio_risk: RiskLevel,
    env_risk: RiskLevel,
    physio_triggers: Vec<String>,
    env_triggers: Vec<String>,
}

impl SensorSnapshot {
    /// Raw readings with no risk derived yet (both categories Safe).
    pub fn from_readings(
        spo2: f64,
        heart_rate: u32,
        breathing_rate: u32,
        respiratory_sounds: RespiratorySound,
        temperature: f64,
        humidity: f64,
        pm25: f64,
    ) -> Self {
        Self {
            spo2,
            heart_rate,
            breathing_rate,
            respiratory_sounds,
            temperature,
            humidity,
            pm25,
            physio_risk: RiskLevel::Safe,
            env_risk: RiskLevel::Safe,
            physio_triggers: Vec::new(),
            env_triggers: Vec::new(),
        }
    }

    pub fn apply_assessment(&mut self, assessment: RiskAssessment) {
        self.physio_risk = assessment.physio.level;
        self.physio_triggers = assessment.physio.triggers;
        self.env_risk = assessment.env.level;
        self.env_triggers = assessment.env.triggers;
    }

    pub fn physio_risk(&self) -> RiskLevel {
        self.physio_risk
    }

    pub fn env_risk(&self) -> RiskLevel {
        self.env_risk
    }

    pub fn physio_triggers(&self) -> &[String] {
        &self.physio_triggers
    }

    pub fn env_triggers(&self) -> &[String] {
        &self.env_triggers
    }

    /// Worst level across both categories
    pub fn overall_risk(&self) -> RiskLevel {
        self.physio_risk.max(self.env_risk)
    }
}

/// One published update of the vitals feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VitalsFrame {
    /// 0 for the baseline, +1 per tick
    pub sequence: u64,
    pub synced_at: DateTime<Utc>,
    pub snapshot: SensorSnapshot,
}

impl VitalsFrame {
    pub fn baseline(snapshot: SensorSnapshot) -> Self {
        Self {
            sequence: 0,
            synced_at: Utc::now(),
            snapshot,
        }
    }

    pub fn next(&self, snapshot: SensorSnapshot) -> Self {
        Self {
            sequence: self.sequence + 1,
            synced_at: Utc::now(),
            snapshot,
        }
    }
}
