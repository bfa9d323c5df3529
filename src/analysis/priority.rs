//! Initiative prioritization and portfolio shape
//!
//! Priority is value density: impact over effort, scaled by how strongly the
//! initiative's category and expected return are weighted. Initiatives are
//! also placed on a 2x2 impact/effort grid whose quadrants drive the
//! portfolio views below.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::core::config::{PriorityConfig, QuadrantCutoffs, TierBounds};
use crate::core::stats;
use crate::entities::{Initiative, InitiativeStatus, RoiEstimate};

/// Impact/effort grid cell
///
/// Ordered by display name so grouped output is alphabetical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Quadrant {
    #[serde(rename = "Fill-ins")]
    FillIns,
    #[serde(rename = "Major Projects")]
    MajorProjects,
    #[serde(rename = "Quick Wins")]
    QuickWins,
    #[serde(rename = "Time Sinks")]
    TimeSinks,
}

impl std::fmt::Display for Quadrant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Quadrant::FillIns => write!(f, "Fill-ins"),
            Quadrant::MajorProjects => write!(f, "Major Projects"),
            Quadrant::QuickWins => write!(f, "Quick Wins"),
            Quadrant::TimeSinks => write!(f, "Time Sinks"),
        }
    }
}

/// Priority band
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum PriorityTier {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for PriorityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PriorityTier::Low => write!(f, "Low"),
            PriorityTier::Medium => write!(f, "Medium"),
            PriorityTier::High => write!(f, "High"),
        }
    }
}

/// An initiative with its computed priority
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriorityRecord {
    pub initiative_id: String,
    pub name: String,
    pub status: InitiativeStatus,
    pub strategic_category: String,
    pub impact_score: f64,
    pub effort_score: f64,
    pub total_story_points: f64,
    pub priority_score: f64,
    /// Dense rank, 1 is the highest score
    pub priority_rank: usize,
    pub priority_tier: PriorityTier,
    pub quadrant: Quadrant,
}

/// Per-quadrant roll-up
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuadrantSummary {
    pub quadrant: Quadrant,
    pub initiative_count: usize,
    pub total_points: f64,
    pub avg_impact: f64,
    pub avg_effort: f64,
    pub initiative_pct: f64,
    pub points_pct: f64,
}

/// Portfolio-level health, 0-100, with ratios as percentages
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioHealth {
    pub health_score: f64,
    pub quick_wins_ratio: f64,
    pub time_sinks_ratio: f64,
    pub completion_rate: f64,
    pub deprioritized_ratio: f64,
    pub active_count: usize,
    pub completed_count: usize,
    pub deprioritized_count: usize,
}

/// One stage of the intake funnel
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunnelStage {
    pub stage: &'static str,
    pub count: usize,
    pub percentage: f64,
}

/// Value-density score; 0 when effort is 0
pub fn priority_score(initiative: &Initiative, config: &PriorityConfig) -> f64 {
    if initiative.effort_score == 0.0 {
        return 0.0;
    }
    let roi = match initiative.roi_estimate {
        Some(RoiEstimate::High) => config.roi.high,
        Some(RoiEstimate::Medium) => config.roi.medium,
        Some(RoiEstimate::Low) => config.roi.low,
        None => config.roi.unknown,
    };
    initiative.impact_score / initiative.effort_score
        * config.strategic_weight(&initiative.strategic_category)
        * roi
}

/// Place an initiative on the impact/effort grid
///
/// Values equal to a cutoff fall on the low side.
pub fn quadrant(initiative: &Initiative, cutoffs: &QuadrantCutoffs) -> Quadrant {
    let high_impact = initiative.impact_score > cutoffs.impact;
    let high_effort = initiative.effort_score > cutoffs.effort;
    match (high_impact, high_effort) {
        (true, false) => Quadrant::QuickWins,
        (true, true) => Quadrant::MajorProjects,
        (false, false) => Quadrant::FillIns,
        (false, true) => Quadrant::TimeSinks,
    }
}

/// Tier for a score; bins are closed on the upper edge and non-positive
/// scores land in Low
pub fn tier(score: f64, bounds: &TierBounds) -> PriorityTier {
    if score > bounds.medium_max {
        PriorityTier::High
    } else if score > bounds.low_max {
        PriorityTier::Medium
    } else {
        PriorityTier::Low
    }
}

/// Score, rank, tier and classify every initiative, in input order
pub fn prioritize(initiatives: &[Initiative], config: &PriorityConfig) -> Vec<PriorityRecord> {
    let scores: Vec<f64> = initiatives.iter().map(|i| priority_score(i, config)).collect();

    let mut distinct = scores.clone();
    distinct.sort_by(|a, b| b.total_cmp(a));
    distinct.dedup();

    initiatives
        .iter()
        .zip(scores)
        .map(|(init, score)| {
            let rank = distinct.iter().position(|&s| s == score).unwrap_or(0) + 1;
            PriorityRecord {
                initiative_id: init.initiative_id.clone(),
                name: init.name.clone(),
                status: init.status,
                strategic_category: init.strategic_category.clone(),
                impact_score: init.impact_score,
                effort_score: init.effort_score,
                total_story_points: init.total_story_points,
                priority_score: score,
                priority_rank: rank,
                priority_tier: tier(score, &config.tiers),
                quadrant: quadrant(init, &config.quadrant),
            }
        })
        .collect()
}

/// Roll initiatives up by quadrant, omitting empty quadrants
pub fn portfolio_composition(
    initiatives: &[Initiative],
    cutoffs: &QuadrantCutoffs,
) -> Vec<QuadrantSummary> {
    let mut groups: BTreeMap<Quadrant, Vec<&Initiative>> = BTreeMap::new();
    for init in initiatives {
        groups.entry(quadrant(init, cutoffs)).or_default().push(init);
    }

    let total_count = initiatives.len();
    let total_points: f64 = initiatives.iter().map(|i| i.total_story_points).sum();

    groups
        .into_iter()
        .map(|(quadrant, members)| {
            let points: f64 = members.iter().map(|i| i.total_story_points).sum();
            let impacts: Vec<f64> = members.iter().map(|i| i.impact_score).collect();
            let efforts: Vec<f64> = members.iter().map(|i| i.effort_score).collect();
            QuadrantSummary {
                quadrant,
                initiative_count: members.len(),
                total_points: points,
                avg_impact: stats::mean(&impacts),
                avg_effort: stats::mean(&efforts),
                initiative_pct: percent(members.len() as f64, total_count as f64),
                points_pct: percent(points, total_points),
            }
        })
        .collect()
}

/// Quick Wins by priority score, best first, at most `limit`
pub fn quick_wins(
    initiatives: &[Initiative],
    limit: usize,
    config: &PriorityConfig,
) -> Vec<PriorityRecord> {
    let mut wins: Vec<PriorityRecord> = prioritize(initiatives, config)
        .into_iter()
        .filter(|r| r.quadrant == Quadrant::QuickWins)
        .collect();
    wins.sort_by(|a, b| b.priority_score.total_cmp(&a.priority_score));
    wins.truncate(limit);
    wins
}

/// Time Sinks by effort, largest first
pub fn time_sinks(initiatives: &[Initiative], config: &PriorityConfig) -> Vec<PriorityRecord> {
    let mut sinks: Vec<PriorityRecord> = prioritize(initiatives, config)
        .into_iter()
        .filter(|r| r.quadrant == Quadrant::TimeSinks)
        .collect();
    sinks.sort_by(|a, b| b.effort_score.total_cmp(&a.effort_score));
    sinks
}

/// Portfolio health from shape and throughput
///
/// Ratios are 0 for an empty portfolio, which still scores the
/// "no time sinks" and "nothing deprioritized" terms.
pub fn portfolio_health(initiatives: &[Initiative], cutoffs: &QuadrantCutoffs) -> PortfolioHealth {
    let total = initiatives.len() as f64;
    let ratio = |count: usize| if total > 0.0 { count as f64 / total } else { 0.0 };

    let count_quadrant = |q: Quadrant| {
        initiatives
            .iter()
            .filter(|i| quadrant(i, cutoffs) == q)
            .count()
    };
    let count_status = |s: InitiativeStatus| initiatives.iter().filter(|i| i.status == s).count();

    let quick_wins_ratio = ratio(count_quadrant(Quadrant::QuickWins));
    let time_sinks_ratio = ratio(count_quadrant(Quadrant::TimeSinks));
    let active_count = count_status(InitiativeStatus::Active);
    let completed_count = count_status(InitiativeStatus::Completed);
    let deprioritized_count = count_status(InitiativeStatus::Deprioritized);
    let completion_rate = ratio(completed_count);
    let deprioritized_ratio = ratio(deprioritized_count);

    let health_score = 100.0
        * (0.30 * quick_wins_ratio
            + 0.20 * (1.0 - time_sinks_ratio)
            + 0.30 * completion_rate
            + 0.20 * (1.0 - deprioritized_ratio));

    tracing::debug!(health_score, initiatives = initiatives.len(), "portfolio health");

    PortfolioHealth {
        health_score,
        quick_wins_ratio: quick_wins_ratio * 100.0,
        time_sinks_ratio: time_sinks_ratio * 100.0,
        completion_rate: completion_rate * 100.0,
        deprioritized_ratio: deprioritized_ratio * 100.0,
        active_count,
        completed_count,
        deprioritized_count,
    }
}

/// Submitted, Backlog, Active, Completed counts for a funnel chart
pub fn intake_funnel(initiatives: &[Initiative]) -> Vec<FunnelStage> {
    let total = initiatives.len();
    let stage = |name: &'static str, count: usize| FunnelStage {
        stage: name,
        count,
        percentage: percent(count as f64, total as f64),
    };
    let count = |s: InitiativeStatus| initiatives.iter().filter(|i| i.status == s).count();

    vec![
        FunnelStage {
            stage: "Submitted",
            count: total,
            percentage: 100.0,
        },
        stage("Backlog", count(InitiativeStatus::Backlog)),
        stage("Active", count(InitiativeStatus::Active)),
        stage("Completed", count(InitiativeStatus::Completed)),
    ]
}

fn percent(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        part / whole * 100.0
    } else {
        0.0
    }
}
