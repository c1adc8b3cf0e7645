pub mod alerts;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod feedback;
pub mod model;
pub mod risk;
pub mod simulator;
