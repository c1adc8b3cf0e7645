// Breach evaluation for each metric and aggregation into category levels.
//
// Every metric in a category is checked (no early exit); each breach adds its
// label in check order and the category level is the worst breach. The fused
// score and confidence are informational and never change the level.

use serde::Serialize;

use super::thresholds::{BandSide, Metric, RiskThresholds};
use crate::core::model::{RiskLevel, SensorSnapshot};

const PHYSIO_SPREAD_PENALTY: f64 = 0.5;
const ENV_SPREAD_PENALTY: f64 = 0.4;
const MIN_CONFIDENCE: f64 = 0.5;

/// A single threshold breach
#[derive(Debug, Clone, PartialEq)]
pub struct Breach {
    pub metric: Metric,
    pub level: RiskLevel,
    pub label: String,
}

/// Level and ordered trigger labels for one category
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CategoryAssessment {
    pub level: RiskLevel,
    pub triggers: Vec<String>,
    /// Weighted mean severity (0.0 to 2.0) over the graded metrics
    pub score: f64,
    /// Agreement between metrics: 1.0 when all share a severity, floor 0.5
    pub confidence: f64,
}

impl CategoryAssessment {
    fn from_grades(grades: Vec<(Metric, RiskLevel, String)>, spread_penalty: f64) -> Self {
        let level = grades
            .iter()
            .map(|(_, level, _)| *level)
            .max()
            .unwrap_or(RiskLevel::Safe);

        let total_weight: f64 = grades.iter().map(|(metric, _, _)| metric.fusion_weight()).sum();
        let score = if total_weight > 0.0 {
            grades
                .iter()
                .map(|(metric, level, _)| metric.fusion_weight() * f64::from(level.severity()))
                .sum::<f64>()
                / total_weight
        } else {
            0.0
        };

        let severities: Vec<f64> = grades
            .iter()
            .map(|(_, level, _)| f64::from(level.severity()))
            .collect();
        let confidence = (1.0 - std_dev(&severities) * spread_penalty).max(MIN_CONFIDENCE);

        let triggers = grades
            .into_iter()
            .filter(|(_, level, _)| *level > RiskLevel::Safe)
            .map(|(_, _, label)| label)
            .collect();

        Self {
            level,
            triggers,
            score,
            confidence,
        }
    }
}

/// Population standard deviation; 0 for an empty slice
fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt()
}

/// Classifier output for one snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RiskAssessment {
    pub physio: CategoryAssessment,
    pub env: CategoryAssessment,
}

impl RiskAssessment {
    pub fn overall(&self) -> RiskLevel {
        self.physio.level.max(self.env.level)
    }

    /// One-line reasoning for logs and the dashboard status line
    pub fn summary(&self) -> String {
        let triggers: Vec<&str> = self
            .physio
            .triggers
            .iter()
            .chain(&self.env.triggers)
            .map(String::as_str)
            .collect();
        let levels = format!(
            "Physiological: {} (score {:.2}), environmental: {} (score {:.2})",
            self.physio.level, self.physio.score, self.env.level, self.env.score
        );
        if triggers.is_empty() {
            format!("All readings within optimal range. {}", levels)
        } else {
            format!("Triggers detected: {}. {}", triggers.join(", "), levels)
        }
    }
}

/// Maps snapshots to risk levels using a threshold table
#[derive(Debug, Clone, Default)]
pub struct RiskClassifier {
    thresholds: RiskThresholds,
}

impl RiskClassifier {
    pub fn new(thresholds: RiskThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &RiskThresholds {
        &self.thresholds
    }

    /// Classify a snapshot. Pure and total: out-of-range readings are
    /// saturated and non-finite readings are skipped.
    pub fn classify(&self, snapshot: &SensorSnapshot) -> RiskAssessment {
        RiskAssessment {
            physio: self.assess(Metric::physiological(), snapshot, PHYSIO_SPREAD_PENALTY),
            env: self.assess(Metric::environmental(), snapshot, ENV_SPREAD_PENALTY),
        }
    }

    fn assess(&self, metrics: &[Metric], snapshot: &SensorSnapshot, spread_penalty: f64) -> CategoryAssessment {
        let grades = metrics
            .iter()
            .filter_map(|metric| {
                grade(*metric, snapshot, &self.thresholds).map(|(level, label)| (*metric, level, label))
            })
            .collect();
        CategoryAssessment::from_grades(grades, spread_penalty)
    }
}

/// Evaluate one metric. Returns Some(breach) if it is above Safe.
pub fn evaluate_metric(
    metric: Metric,
    snapshot: &SensorSnapshot,
    thresholds: &RiskThresholds,
) -> Option<Breach> {
    let (level, label) = grade(metric, snapshot, thresholds)?;
    if level == RiskLevel::Safe {
        return None;
    }
    Some(Breach { metric, level, label })
}

/// Level and label for one reading; None when the reading is not finite.
fn grade(metric: Metric, snapshot: &SensorSnapshot, thresholds: &RiskThresholds) -> Option<(RiskLevel, String)> {
    let graded = match metric {
        Metric::Spo2 => {
            let spo2 = saturate(snapshot.spo2, 0.0, 100.0)?;
            (thresholds.spo2.level(spo2), format!("Low SpO2 ({:.1}%)", spo2))
        }
        Metric::HeartRate => {
            let bpm = snapshot.heart_rate;
            (
                thresholds.heart_rate.level(f64::from(bpm)),
                format!("Elevated heart rate ({} bpm)", bpm),
            )
        }
        Metric::BreathingRate => {
            let rate = snapshot.breathing_rate;
            (
                thresholds.breathing_rate.level(f64::from(rate)),
                format!("Elevated breathing rate ({} bpm)", rate),
            )
        }
        Metric::RespiratorySounds => {
            let sound = snapshot.respiratory_sounds;
            (thresholds.sound_level(sound), format!("{} detected", sound))
        }
        Metric::Temperature => {
            let celsius = saturate(snapshot.temperature, f64::MIN, f64::MAX)?;
            let (level, side) = thresholds.temperature.level(celsius);
            let label = match side {
                BandSide::Below => format!("Cold temperature ({:.1}°C)", celsius),
                BandSide::Above => format!("High temperature ({:.1}°C)", celsius),
            };
            (level, label)
        }
        Metric::Humidity => {
            let percent = saturate(snapshot.humidity, 0.0, 100.0)?;
            let (level, side) = thresholds.humidity.level(percent);
            let label = match side {
                BandSide::Below => format!("Low humidity ({:.1}%)", percent),
                BandSide::Above => format!("High humidity ({:.1}%)", percent),
            };
            (level, label)
        }
        Metric::Pm25 => {
            let pm25 = saturate(snapshot.pm25, 0.0, f64::MAX)?;
            (
                thresholds.pm25.level(pm25),
                format!("Elevated PM2.5 ({:.1} µg/m³)", pm25),
            )
        }
    };
    Some(graded)
}

/// Clamp a reading into its physical range; None for NaN/inf noise.
fn saturate(value: f64, min: f64, max: f64) -> Option<f64> {
    value.is_finite().then(|| value.clamp(min, max))
}
