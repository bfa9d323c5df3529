//! Velocity forecasting - Monte Carlo completion probability and trend forecasts
//!
//! The Monte Carlo estimator fits a normal distribution to historical
//! velocity and counts how often a simulated sprint meets the commitment.
//! The trend forecaster blends a least-squares line over recent sprints with
//! their moving average, trusting the line only when it explains a meaningful
//! share of the variance.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::core::config::SimulationConfig;
use crate::core::stats;
use crate::entities::Sprint;

/// Fewest samples the Monte Carlo estimator will fit a distribution to
pub const MIN_SIMULATION_HISTORY: usize = 2;

/// Fewest sprints the trend forecaster will fit a line to
pub const MIN_TREND_HISTORY: usize = 3;

/// Recent sprints considered by the trend forecaster
pub const TREND_WINDOW: usize = 5;

/// Flat forecast used when there is no history at all
pub const DEFAULT_VELOCITY: f64 = 40.0;

const STRONG_CORRELATION: f64 = 0.5;
const STRONG_TREND_WEIGHT: f64 = 0.7;
const WEAK_TREND_WEIGHT: f64 = 0.3;
const FORECAST_FLOOR: f64 = 20.0;
const FORECAST_CEILING: f64 = 60.0;
const BAND_SIGMAS: f64 = 1.5;
const BAND_FLOOR: f64 = 15.0;
const BAND_CEILING: f64 = 70.0;
const FALLBACK_LOWER: f64 = 0.8;
const FALLBACK_UPPER: f64 = 1.2;

/// Monte Carlo completion estimate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastResult {
    /// Share of simulated sprints that met the commitment
    pub probability: f64,

    /// Mean historical velocity
    pub expected_velocity: f64,

    /// 50th percentile of the simulated sample
    pub median_velocity: f64,

    /// 10th percentile of the simulated sample
    pub percentile_10: f64,

    /// 90th percentile of the simulated sample
    pub percentile_90: f64,

    pub committed_points: f64,

    /// Every simulated velocity, in draw order
    pub simulated_velocities: Vec<f64>,
}

impl ForecastResult {
    fn neutral(committed_points: f64) -> Self {
        Self {
            probability: 0.5,
            expected_velocity: committed_points,
            median_velocity: committed_points,
            percentile_10: committed_points,
            percentile_90: committed_points,
            committed_points,
            simulated_velocities: Vec::new(),
        }
    }

    /// True when the estimate came from simulation rather than the fallback
    pub fn is_simulated(&self) -> bool {
        !self.simulated_velocities.is_empty()
    }
}

/// Histogram of a Monte Carlo run, ready for charting
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributionChart {
    pub hist_counts: Vec<usize>,
    /// `hist_counts.len() + 1` edges, or empty with an empty sample
    pub bin_edges: Vec<f64>,
    pub committed_points: f64,
    pub probability: f64,
    pub expected_velocity: f64,
}

/// Per-sprint velocity projection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VelocityForecast {
    pub forecast: Vec<f64>,
    pub lower_bound: Vec<f64>,
    pub upper_bound: Vec<f64>,
    /// Moving average the forecast was anchored on
    pub avg_velocity: f64,
    /// Regression slope (0 for the flat fallback)
    pub trend_slope: f64,
}

/// Estimate the probability of completing `committed_points`
///
/// With fewer than two historical samples (or zero simulations) the result
/// is neutral: probability 0.5 and every statistic equal to the commitment.
/// Otherwise `n_simulations` draws from Normal(mean, population std) are
/// clipped at zero and compared against the commitment.
pub fn predict_completion_probability<R: Rng>(
    committed_points: f64,
    historical_velocities: &[f64],
    n_simulations: usize,
    rng: &mut R,
) -> ForecastResult {
    if historical_velocities.len() < MIN_SIMULATION_HISTORY || n_simulations == 0 {
        tracing::warn!(
            samples = historical_velocities.len(),
            n_simulations,
            "insufficient velocity history, returning neutral forecast"
        );
        return ForecastResult::neutral(committed_points);
    }

    let mean = stats::mean(historical_velocities);
    let sigma = stats::std_dev(historical_velocities);

    let simulated: Vec<f64> = (0..n_simulations)
        .map(|_| sample_normal(rng, mean, sigma).max(0.0))
        .collect();

    let successes = simulated.iter().filter(|&&v| v >= committed_points).count();
    let probability = successes as f64 / n_simulations as f64;

    let mut sorted = simulated.clone();
    sorted.sort_by(f64::total_cmp);

    tracing::debug!(
        committed_points,
        mean,
        sigma,
        probability,
        "monte carlo completion estimate"
    );

    ForecastResult {
        probability,
        expected_velocity: mean,
        median_velocity: stats::percentile_sorted(&sorted, 50.0),
        percentile_10: stats::percentile_sorted(&sorted, 10.0),
        percentile_90: stats::percentile_sorted(&sorted, 90.0),
        committed_points,
        simulated_velocities: simulated,
    }
}

/// Run the simulation and bin the sample for a distribution chart
pub fn distribution_chart<R: Rng>(
    committed_points: f64,
    historical_velocities: &[f64],
    n_simulations: usize,
    bins: usize,
    rng: &mut R,
) -> DistributionChart {
    let prediction =
        predict_completion_probability(committed_points, historical_velocities, n_simulations, rng);
    let (hist_counts, bin_edges) = stats::histogram(&prediction.simulated_velocities, bins);

    DistributionChart {
        hist_counts,
        bin_edges,
        committed_points,
        probability: prediction.probability,
        expected_velocity: prediction.expected_velocity,
    }
}

/// Normal variate via the Box-Muller transform
fn sample_normal<R: Rng>(rng: &mut R, mean: f64, sigma: f64) -> f64 {
    // 1 - U keeps u1 in (0, 1] so ln() stays finite
    let u1: f64 = 1.0 - rng.random::<f64>();
    let u2: f64 = rng.random();
    let z = (-2.0_f64 * u1.ln()).sqrt() * (2.0_f64 * std::f64::consts::PI * u2).cos();
    mean + sigma * z
}

/// Project velocity for the next `n_sprints` sprints
///
/// Fewer than three sprints yields a flat forecast at the mean (40 when the
/// history is empty) with bounds at 80% and 120% of it.
pub fn forecast_velocity(history: &[Sprint], n_sprints: usize) -> VelocityForecast {
    let velocities: Vec<f64> = history.iter().map(Sprint::velocity).collect();

    if velocities.len() < MIN_TREND_HISTORY {
        let avg = if velocities.is_empty() {
            DEFAULT_VELOCITY
        } else {
            stats::mean(&velocities)
        };
        tracing::warn!(
            sprints = velocities.len(),
            "insufficient history for trend forecast, using flat mean"
        );
        return VelocityForecast {
            forecast: vec![avg; n_sprints],
            lower_bound: vec![avg * FALLBACK_LOWER; n_sprints],
            upper_bound: vec![avg * FALLBACK_UPPER; n_sprints],
            avg_velocity: avg,
            trend_slope: 0.0,
        };
    }

    let start = history.len().saturating_sub(TREND_WINDOW);
    let recent = &history[start..];
    let xs: Vec<f64> = recent.iter().map(|s| s.sprint_number as f64).collect();
    let ys: Vec<f64> = recent.iter().map(Sprint::velocity).collect();

    let moving_avg = stats::mean(&ys);
    let sigma = stats::std_dev(&ys);
    let (slope, intercept, r) = match stats::linear_regression(&xs, &ys) {
        Some(fit) => (fit.slope, fit.intercept, fit.r),
        None => (0.0, moving_avg, 0.0),
    };

    let trend_weight = if r.abs() > STRONG_CORRELATION {
        STRONG_TREND_WEIGHT
    } else {
        WEAK_TREND_WEIGHT
    };

    let last_sprint = recent.last().map(|s| s.sprint_number).unwrap_or(0) as f64;
    let mut forecast = Vec::with_capacity(n_sprints);
    let mut lower_bound = Vec::with_capacity(n_sprints);
    let mut upper_bound = Vec::with_capacity(n_sprints);

    for i in 1..=n_sprints {
        let trend = slope * (last_sprint + i as f64) + intercept;
        let blended = trend_weight * trend + (1.0 - trend_weight) * moving_avg;
        let predicted = blended.clamp(FORECAST_FLOOR, FORECAST_CEILING);

        forecast.push(predicted);
        lower_bound.push((predicted - BAND_SIGMAS * sigma).max(BAND_FLOOR));
        upper_bound.push((predicted + BAND_SIGMAS * sigma).min(BAND_CEILING));
    }

    tracing::debug!(slope, r, moving_avg, n_sprints, "velocity trend forecast");

    VelocityForecast {
        forecast,
        lower_bound,
        upper_bound,
        avg_velocity: moving_avg,
        trend_slope: slope,
    }
}

/// Forecasting entry point carrying simulation settings
///
/// Builds a fresh generator per call: seeded from the config when a seed is
/// set, from OS entropy otherwise.
#[derive(Debug, Clone, Default)]
pub struct Forecaster {
    simulation: SimulationConfig,
}

impl Forecaster {
    pub fn new(simulation: SimulationConfig) -> Self {
        Self { simulation }
    }

    fn rng(&self) -> StdRng {
        match self.simulation.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }

    /// Completion probability for a commitment against a sprint history
    pub fn completion_probability(
        &self,
        committed_points: f64,
        history: &[Sprint],
    ) -> ForecastResult {
        let velocities: Vec<f64> = history.iter().map(Sprint::velocity).collect();
        predict_completion_probability(
            committed_points,
            &velocities,
            self.simulation.n_simulations,
            &mut self.rng(),
        )
    }

    /// Histogram data for a commitment against a sprint history
    pub fn distribution_chart(
        &self,
        committed_points: f64,
        history: &[Sprint],
    ) -> DistributionChart {
        let velocities: Vec<f64> = history.iter().map(Sprint::velocity).collect();
        distribution_chart(
            committed_points,
            &velocities,
            self.simulation.n_simulations,
            self.simulation.histogram_bins,
            &mut self.rng(),
        )
    }

    /// Trend forecast for the next `n_sprints` sprints
    pub fn forecast(&self, history: &[Sprint], n_sprints: usize) -> VelocityForecast {
        forecast_velocity(history, n_sprints)
    }
}
