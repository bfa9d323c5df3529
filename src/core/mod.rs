//! Core module - errors, configuration, and shared statistics

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod record;
pub mod stats;

pub use config::{
    Config, HealthConfig, HealthWeights, PriorityConfig, QuadrantCutoffs,
    RecommendationConfig, RiskConfig, RiskWeights, RoiMultipliers, SimulationConfig, TierBounds,
};
pub use diagnostics::ConfigSyntaxError;
pub use error::{Error, Result};
pub use record::{from_row, from_rows, Record};
