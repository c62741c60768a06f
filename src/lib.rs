//! Chiller performance-loss engine: derives efficiency losses, costs and
//! plausibility flags from operator log readings.

pub mod app;
pub mod chiller;
pub mod config;
pub mod conversion;
pub mod engine;
pub mod error;
pub mod imbalance;
pub mod logging;
pub mod reading;
pub mod refrigerant;
pub mod report;
pub mod run_hours;
pub mod sanitize;
pub mod timestamp;
pub mod units;
