//! Initiative delivery risk
//!
//! Four factors, each in `[0, 1]`, are combined with configurable weights:
//!
//! - **capacity** - remaining work against velocity times sprints left
//! - **volatility** - coefficient of variation of recent velocity
//! - **utilization** - how hard the team is already running
//! - **progress** - completion relative to the timeline

use serde::Serialize;

use crate::core::config::RiskConfig;
use crate::core::stats;
use crate::entities::{trailing_velocities, Initiative, InitiativeStatus, Sprint};

const OVERLOADED: f64 = 1.05;
const SATURATED: f64 = 0.95;
const HEALTHY: f64 = 0.70;

const LOW_TEXT: &str = "No action needed - on track for delivery";
const MEDIUM_TEXT: &str = "Monitor closely - may need resource adjustment or scope review";
const HIGH_CAPACITY_TEXT: &str =
    "High risk - consider descoping, extending timeline, or adding resources";
const HIGH_TEXT: &str = "High risk - immediate intervention needed";
const TERMINAL_TEXT: &str = "No action needed";

/// Capacity risk above which a High assessment gets the capacity-specific advice
const CAPACITY_ADVICE_THRESHOLD: f64 = 0.7;

/// Risk band
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum RiskLevel {
    /// Completed or deprioritized, no longer at risk
    None,
    Low,
    Medium,
    High,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::None => write!(f, "None"),
            RiskLevel::Low => write!(f, "Low"),
            RiskLevel::Medium => write!(f, "Medium"),
            RiskLevel::High => write!(f, "High"),
        }
    }
}

/// Individual risk factors
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RiskFactors {
    pub capacity_risk: f64,
    pub volatility_risk: f64,
    pub utilization_risk: f64,
    pub progress_risk: f64,
}

/// Risk of one initiative missing its target sprint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskAssessment {
    pub initiative_id: String,
    pub name: String,
    pub status: InitiativeStatus,
    pub risk_score: f64,
    pub risk_level: RiskLevel,
    /// Absent for completed and deprioritized initiatives
    pub factors: Option<RiskFactors>,
    pub remaining_points: f64,
    pub sprints_available: u32,
    pub capacity_available: f64,
    pub recommendation: String,
}

/// Score the delivery risk of a single initiative
///
/// `target_sprint` defaults to the current sprint plus the configured
/// runway. At least one sprint is always considered available.
pub fn score_initiative_risk(
    initiative: &Initiative,
    current_sprint: u32,
    avg_velocity: f64,
    velocity_std: f64,
    team_utilization: f64,
    config: &RiskConfig,
) -> RiskAssessment {
    let remaining_points = initiative.remaining_points();
    let target = initiative
        .target_sprint
        .unwrap_or(current_sprint.saturating_add(config.default_runway));
    let sprints_available = target.saturating_sub(current_sprint).max(1);
    let capacity_available = avg_velocity * sprints_available as f64;

    let mut assessment = RiskAssessment {
        initiative_id: initiative.initiative_id.clone(),
        name: initiative.name.clone(),
        status: initiative.status,
        risk_score: 0.0,
        risk_level: RiskLevel::None,
        factors: None,
        remaining_points,
        sprints_available,
        capacity_available,
        recommendation: TERMINAL_TEXT.to_string(),
    };

    if initiative.status.is_terminal() {
        return assessment;
    }

    let capacity_risk = if capacity_available > 0.0 {
        (remaining_points / capacity_available / config.capacity_saturation).min(1.0)
    } else {
        1.0
    };

    let volatility_risk = if avg_velocity > 0.0 {
        (velocity_std / avg_velocity / config.volatility_saturation).min(1.0)
    } else {
        0.5
    };

    let utilization_risk = if team_utilization > OVERLOADED {
        0.9
    } else if team_utilization > SATURATED {
        0.5
    } else if team_utilization > HEALTHY {
        0.2
    } else {
        // idle teams are a signal too
        0.4
    };

    let progress_risk = match initiative.completion_ratio() {
        None => 0.5,
        Some(done) if initiative.status == InitiativeStatus::Active => {
            if sprints_available < 3 && done < 0.5 {
                0.8
            } else if done < 0.3 {
                0.6
            } else {
                0.2
            }
        }
        Some(_) => 0.1,
    };

    let w = &config.weights;
    let risk_score = capacity_risk * w.capacity
        + volatility_risk * w.volatility
        + utilization_risk * w.utilization
        + progress_risk * w.progress;

    let (risk_level, recommendation) = if risk_score < config.low_threshold {
        (RiskLevel::Low, LOW_TEXT)
    } else if risk_score < config.medium_threshold {
        (RiskLevel::Medium, MEDIUM_TEXT)
    } else if capacity_risk > CAPACITY_ADVICE_THRESHOLD {
        (RiskLevel::High, HIGH_CAPACITY_TEXT)
    } else {
        (RiskLevel::High, HIGH_TEXT)
    };

    tracing::debug!(
        initiative = %initiative.initiative_id,
        risk_score,
        level = %risk_level,
        capacity_risk,
        volatility_risk,
        "initiative risk"
    );

    assessment.risk_score = risk_score;
    assessment.risk_level = risk_level;
    assessment.factors = Some(RiskFactors {
        capacity_risk,
        volatility_risk,
        utilization_risk,
        progress_risk,
    });
    assessment.recommendation = recommendation.to_string();
    assessment
}

/// Score every active and backlog initiative, riskiest first
///
/// Velocity statistics come from the trailing window of `history`; an empty
/// history scores against zero velocity. `team_utilization` falls back to the
/// configured default. Ties keep input order.
pub fn assess_all_initiatives_risk(
    initiatives: &[Initiative],
    current_sprint: u32,
    history: &[Sprint],
    team_utilization: Option<f64>,
    config: &RiskConfig,
) -> Vec<RiskAssessment> {
    let recent = trailing_velocities(history, config.velocity_window);
    let avg_velocity = stats::mean(&recent);
    let velocity_std = stats::std_dev(&recent);
    let utilization = team_utilization.unwrap_or(config.default_utilization);

    if recent.is_empty() {
        tracing::warn!("no sprint history, scoring risk against zero velocity");
    }

    let mut assessments: Vec<RiskAssessment> = initiatives
        .iter()
        .filter(|i| i.status.is_pending())
        .map(|i| {
            score_initiative_risk(
                i,
                current_sprint,
                avg_velocity,
                velocity_std,
                utilization,
                config,
            )
        })
        .collect();

    assessments.sort_by(|a, b| b.risk_score.total_cmp(&a.risk_score));
    assessments
}
