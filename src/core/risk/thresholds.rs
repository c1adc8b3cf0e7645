// Threshold table for risk classification.
//
// Values are configurable defaults persisted in settings.json, not a clinical
// contract. The comfortable temperature band ends at 26°C so the dashboard
// baseline (24.5°C) reads as safe.

use serde::{Deserialize, Serialize};

use crate::core::model::{RespiratorySound, RiskLevel};

/// Identifier for each classified reading, in check order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Metric {
    Spo2,
    HeartRate,
    BreathingRate,
    RespiratorySounds,
    Temperature,
    Humidity,
    Pm25,
}

impl Metric {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Spo2 => "SpO2",
            Self::HeartRate => "Heart Rate",
            Self::BreathingRate => "Breathing Rate",
            Self::RespiratorySounds => "Respiratory Sounds",
            Self::Temperature => "Temperature",
            Self::Humidity => "Humidity",
            Self::Pm25 => "PM2.5",
        }
    }

    /// Weight in the category's fused risk score. SpO2 and PM2.5 dominate.
    pub fn fusion_weight(&self) -> f64 {
        match self {
            Self::Spo2 => 2.5,
            Self::HeartRate => 1.0,
            Self::BreathingRate => 1.5,
            Self::RespiratorySounds => 1.0,
            Self::Temperature => 1.0,
            Self::Humidity => 1.5,
            Self::Pm25 => 2.0,
        }
    }

    /// Physiological metrics in trigger order
    pub fn physiological() -> &'static [Metric] {
        &[Self::Spo2, Self::HeartRate, Self::BreathingRate, Self::RespiratorySounds]
    }

    /// Environmental metrics in trigger order
    pub fn environmental() -> &'static [Metric] {
        &[Self::Temperature, Self::Humidity, Self::Pm25]
    }
}

/// Risk rises as the value falls (e.g. SpO2)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LowerLimit {
    pub high_below: f64,
    pub medium_below: f64,
}

impl LowerLimit {
    pub fn level(&self, value: f64) -> RiskLevel {
        if value < self.high_below {
            RiskLevel::High
        } else if value < self.medium_below {
            RiskLevel::Medium
        } else {
            RiskLevel::Safe
        }
    }
}

/// Risk rises as the value climbs (e.g. heart rate, PM2.5)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UpperLimit {
    pub high_above: f64,
    pub medium_above: f64,
}

impl UpperLimit {
    pub fn level(&self, value: f64) -> RiskLevel {
        if value > self.high_above {
            RiskLevel::High
        } else if value > self.medium_above {
            RiskLevel::Medium
        } else {
            RiskLevel::Safe
        }
    }
}

/// Which side of a comfort band a reading fell out of
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BandSide {
    Below,
    Above,
}

/// Comfort band with risk on both sides (temperature, humidity)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComfortBand {
    pub high_below: f64,
    pub medium_below: f64,
    pub medium_above: f64,
    pub high_above: f64,
}

impl ComfortBand {
    pub fn level(&self, value: f64) -> (RiskLevel, BandSide) {
        let side = if value < self.medium_below {
            BandSide::Below
        } else {
            BandSide::Above
        };
        let level = if value < self.high_below || value > self.high_above {
            RiskLevel::High
        } else if value < self.medium_below || value > self.medium_above {
            RiskLevel::Medium
        } else {
            RiskLevel::Safe
        };
        (level, side)
    }
}

/// Full threshold table used by the classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskThresholds {
    pub spo2: LowerLimit,
    pub heart_rate: UpperLimit,
    pub breathing_rate: UpperLimit,
    pub temperature: ComfortBand,
    pub humidity: ComfortBand,
    pub pm25: UpperLimit,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            spo2: LowerLimit {
                high_below: 90.0,
                medium_below: 95.0,
            },
            heart_rate: UpperLimit {
                high_above: 120.0,
                medium_above: 100.0,
            },
            // 3-7 year old range
            breathing_rate: UpperLimit {
                high_above: 40.0,
                medium_above: 34.0,
            },
            temperature: ComfortBand {
                high_below: 15.0,
                medium_below: 18.0,
                medium_above: 26.0,
                high_above: 28.0,
            },
            humidity: ComfortBand {
                high_below: 30.0,
                medium_below: 40.0,
                medium_above: 60.0,
                high_above: 70.0,
            },
            pm25: UpperLimit {
                high_above: 35.0,
                medium_above: 12.0,
            },
        }
    }
}

impl RiskThresholds {
    /// Sound classes are fixed: wheeze is a warning, crackle and cough are critical.
    pub fn sound_level(&self, sound: RespiratorySound) -> RiskLevel {
        match sound {
            RespiratorySound::Normal => RiskLevel::Safe,
            RespiratorySound::Wheeze => RiskLevel::Medium,
            RespiratorySound::Crackle | RespiratorySound::Cough => RiskLevel::High,
        }
    }
}
