// Risk classification for sensor snapshots.
//
// Architecture:
// - thresholds.rs: Configurable threshold table and metric identifiers
// - classifier.rs: Per-metric breach evaluation and category aggregation

pub mod classifier;
pub mod thresholds;

pub use classifier::{CategoryAssessment, RiskAssessment, RiskClassifier};
pub use thresholds::{Metric, RiskThresholds};
