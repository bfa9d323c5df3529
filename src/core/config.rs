//! Configuration management with layered hierarchy
//!
//! Every weight table, cutoff, and threshold the analytics use lives here so
//! that tests and deployments can override them without touching the scoring
//! code. `Config::default()` reproduces the reference tables exactly.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::core::diagnostics::ConfigSyntaxError;
use crate::core::error::{Error, Result};

/// Environment variable naming an extra config file
pub const CONFIG_ENV: &str = "SPRINTLENS_CONFIG";
/// Environment override for the Monte Carlo sample count
pub const SIMULATIONS_ENV: &str = "SPRINTLENS_SIMULATIONS";
/// Environment override for the Monte Carlo seed
pub const SEED_ENV: &str = "SPRINTLENS_SEED";

/// Analytics configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub simulation: SimulationConfig,
    pub risk: RiskConfig,
    pub health: HealthConfig,
    pub priority: PriorityConfig,
    pub recommendations: RecommendationConfig,
}

/// Monte Carlo settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Samples drawn per completion-probability estimate
    pub n_simulations: usize,

    /// Fixed seed for reproducible runs; entropy-seeded when absent
    pub seed: Option<u64>,

    /// Histogram bins for distribution chart data
    pub histogram_bins: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            n_simulations: 1000,
            seed: None,
            histogram_bins: 30,
        }
    }
}

/// Relative weights of the four risk factors
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RiskWeights {
    pub capacity: f64,
    pub volatility: f64,
    pub utilization: f64,
    pub progress: f64,
}

impl Default for RiskWeights {
    fn default() -> Self {
        Self {
            capacity: 0.35,
            volatility: 0.25,
            utilization: 0.25,
            progress: 0.15,
        }
    }
}

/// Initiative risk model settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RiskConfig {
    pub weights: RiskWeights,

    /// Share of projected capacity at which capacity risk saturates
    pub capacity_saturation: f64,

    /// Coefficient of variation at which volatility risk saturates
    pub volatility_saturation: f64,

    /// Scores below this are Low
    pub low_threshold: f64,

    /// Scores below this (and not Low) are Medium
    pub medium_threshold: f64,

    /// Trailing sprints used for velocity mean and spread
    pub velocity_window: usize,

    /// Team utilization assumed when the caller has none
    pub default_utilization: f64,

    /// Sprints granted when an initiative has no target sprint
    pub default_runway: u32,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            weights: RiskWeights::default(),
            capacity_saturation: 0.8,
            volatility_saturation: 0.15,
            low_threshold: 0.3,
            medium_threshold: 0.6,
            velocity_window: 5,
            default_utilization: 0.85,
            default_runway: 10,
        }
    }
}

/// Relative weights of the sprint health components
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HealthWeights {
    pub velocity_consistency: f64,
    pub estimation_accuracy: f64,
    pub completion_rate: f64,
    pub blocker_impact: f64,
}

impl Default for HealthWeights {
    fn default() -> Self {
        Self {
            velocity_consistency: 0.30,
            estimation_accuracy: 0.25,
            completion_rate: 0.25,
            blocker_impact: 0.20,
        }
    }
}

/// Sprint health settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HealthConfig {
    pub weights: HealthWeights,

    /// Used when a sprint carries no aggregated estimation accuracy
    pub default_estimation_accuracy: f64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            weights: HealthWeights::default(),
            default_estimation_accuracy: 0.85,
        }
    }
}

/// ROI multipliers applied to priority scores
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RoiMultipliers {
    pub high: f64,
    pub medium: f64,
    pub low: f64,
    /// Applied when an initiative has no ROI estimate
    pub unknown: f64,
}

impl Default for RoiMultipliers {
    fn default() -> Self {
        Self {
            high: 1.3,
            medium: 1.0,
            low: 0.7,
            unknown: 1.0,
        }
    }
}

/// Impact/effort cutoffs; values at the cutoff fall on the low side
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QuadrantCutoffs {
    pub impact: f64,
    pub effort: f64,
}

impl Default for QuadrantCutoffs {
    fn default() -> Self {
        Self {
            impact: 6.0,
            effort: 5.0,
        }
    }
}

/// Upper-inclusive tier bin edges
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TierBounds {
    /// Scores up to and including this are Low
    pub low_max: f64,
    /// Scores up to and including this (above `low_max`) are Medium
    pub medium_max: f64,
}

impl Default for TierBounds {
    fn default() -> Self {
        Self {
            low_max: 1.5,
            medium_max: 2.5,
        }
    }
}

/// Prioritization tables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PriorityConfig {
    /// Strategic category -> weight
    pub strategic_weights: BTreeMap<String, f64>,

    /// Weight for categories missing from the table
    pub default_strategic_weight: f64,

    pub roi: RoiMultipliers,
    pub quadrant: QuadrantCutoffs,
    pub tiers: TierBounds,
}

impl Default for PriorityConfig {
    fn default() -> Self {
        let strategic_weights = [
            ("Revenue Growth", 1.5),
            ("Customer Experience", 1.3),
            ("Cost Reduction", 1.2),
            ("Technical Excellence", 1.1),
            ("Process Improvement", 1.0),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        Self {
            strategic_weights,
            default_strategic_weight: 1.0,
            roi: RoiMultipliers::default(),
            quadrant: QuadrantCutoffs::default(),
            tiers: TierBounds::default(),
        }
    }
}

impl PriorityConfig {
    /// Weight for a strategic category, falling back to the default
    pub fn strategic_weight(&self, category: &str) -> f64 {
        self.strategic_weights
            .get(category)
            .copied()
            .unwrap_or(self.default_strategic_weight)
    }
}

/// Recommendation thresholds and windows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RecommendationConfig {
    /// Sprint health score (0-100) below which a warning is raised
    pub min_health_score: f64,

    /// Mean story estimation accuracy below which a warning is raised
    pub min_estimation_accuracy: f64,

    /// Mean cycle time in days above which a warning is raised
    pub max_cycle_time_days: f64,

    /// Per-member utilization above which a member is over-utilized
    pub max_member_utilization: f64,

    /// Capacity allocation utilization (percent) considered overcommitted
    pub max_capacity_utilization_pct: f64,

    /// Revenue Growth share (percent) below which alignment is flagged
    pub min_revenue_growth_pct: f64,

    /// Major Projects share (percent) above which the portfolio is unbalanced
    pub max_major_projects_pct: f64,

    /// Sprints averaged for commitment planning
    pub velocity_window: usize,

    /// Sprints back from the current one whose stories are inspected
    pub story_lookback: u32,

    /// Fraction of recent velocity recommended as the next commitment
    pub commitment_factor: f64,

    /// Future sprints covered by the capacity allocation check
    pub allocation_sprints: u32,

    /// Quick wins considered when looking for ready backlog items
    pub quick_win_limit: usize,
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            min_health_score: 70.0,
            min_estimation_accuracy: 0.75,
            max_cycle_time_days: 7.0,
            max_member_utilization: 1.05,
            max_capacity_utilization_pct: 110.0,
            min_revenue_growth_pct: 20.0,
            max_major_projects_pct: 40.0,
            velocity_window: 3,
            story_lookback: 2,
            commitment_factor: 0.95,
            allocation_sprints: 3,
            quick_win_limit: 5,
        }
    }
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    ///
    /// 1. Built-in defaults
    /// 2. Global user config (`<config dir>/sprintlens/config.yaml`)
    /// 3. The file named by `SPRINTLENS_CONFIG`
    /// 4. `SPRINTLENS_SIMULATIONS` and `SPRINTLENS_SEED`
    ///
    /// A missing global file is skipped. A file that exists but cannot be
    /// read or parsed is an error.
    pub fn load() -> Result<Self> {
        let mut layers = Vec::new();

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                layers.push(read_layer(&global_path)?);
            }
        }

        if let Ok(path) = std::env::var(CONFIG_ENV) {
            layers.push(read_layer(Path::new(&path))?);
        }

        let mut config = merge_layers(layers)?;
        config.apply_env_overrides(|key| std::env::var(key).ok())?;

        tracing::debug!(
            n_simulations = config.simulation.n_simulations,
            seeded = config.simulation.seed.is_some(),
            "configuration loaded"
        );
        Ok(config)
    }

    /// Load a single config file over the built-in defaults
    pub fn from_path(path: &Path) -> Result<Self> {
        merge_layers(vec![read_layer(path)?])
    }

    /// Parse YAML text over the built-in defaults
    pub fn from_yaml_str(source: &str) -> Result<Self> {
        merge_layers(vec![parse_layer(source, "<inline>")?])
    }

    /// Get the path to the global config file
    pub fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "sprintlens")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Apply environment overrides through a lookup function
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(SIMULATIONS_ENV) {
            self.simulation.n_simulations =
                raw.trim().parse().map_err(|_| Error::ConfigEnv {
                    var: SIMULATIONS_ENV,
                    value: raw.clone(),
                })?;
        }
        if let Some(raw) = lookup(SEED_ENV) {
            let seed = raw.trim().parse().map_err(|_| Error::ConfigEnv {
                var: SEED_ENV,
                value: raw.clone(),
            })?;
            self.simulation.seed = Some(seed);
        }
        Ok(())
    }
}

struct Layer {
    name: String,
    source: String,
    value: serde_yml::Value,
}

fn read_layer(path: &Path) -> Result<Layer> {
    let source = std::fs::read_to_string(path).map_err(|source| Error::ConfigIo {
        path: path.to_path_buf(),
        source,
    })?;
    parse_layer(&source, &path.display().to_string())
}

fn parse_layer(source: &str, name: &str) -> Result<Layer> {
    let value = serde_yml::from_str::<serde_yml::Value>(source)
        .map_err(|e| ConfigSyntaxError::from_serde_error(&e, source, name))?;
    Ok(Layer {
        name: name.to_string(),
        source: source.to_string(),
        value,
    })
}

/// Deep-merge layers (later wins) and deserialize once
fn merge_layers(layers: Vec<Layer>) -> Result<Config> {
    let mut merged = serde_yml::Value::Mapping(serde_yml::Mapping::new());
    let mut last: Option<(String, String)> = None;

    for layer in layers {
        merge_value(&mut merged, layer.value);
        last = Some((layer.name, layer.source));
    }

    serde_yml::from_value::<Config>(merged).map_err(|e| {
        let (name, source) = last.unwrap_or_else(|| ("<defaults>".to_string(), String::new()));
        Error::from(ConfigSyntaxError::from_serde_error(&e, &source, &name))
    })
}

fn merge_value(base: &mut serde_yml::Value, overlay: serde_yml::Value) {
    match (base, overlay) {
        (serde_yml::Value::Mapping(base_map), serde_yml::Value::Mapping(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_value(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        // An empty document contributes nothing
        (_, serde_yml::Value::Null) => {}
        (slot, value) => *slot = value,
    }
}
