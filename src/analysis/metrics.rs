//! Delivery metrics over sprints and stories
//!
//! Every function here is a reduction over a snapshot. Grouped outputs are
//! ordered by their group key unless documented otherwise. Empty inputs
//! produce zeros or empty collections rather than errors.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::core::stats;
use crate::entities::{find_member, velocities, Sprint, Story, StoryStatus, StoryType, TeamMember};

const TREND_SLOPE: f64 = 0.5;
const CONTROL_SIGMAS: f64 = 3.0;
const MIN_CORRELATION_SAMPLE: usize = 10;
const SLOW_FACTOR: f64 = 1.5;
const VERY_SLOW_FACTOR: f64 = 2.0;
const BLOCKER_ALERT: f64 = 0.20;
const CARRYOVER_ALERT: f64 = 0.15;

/// Direction of a velocity trend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
    #[serde(rename = "Insufficient data")]
    InsufficientData,
}

impl std::fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrendDirection::Increasing => write!(f, "Increasing"),
            TrendDirection::Decreasing => write!(f, "Decreasing"),
            TrendDirection::Stable => write!(f, "Stable"),
            TrendDirection::InsufficientData => write!(f, "Insufficient data"),
        }
    }
}

/// Regression of velocity against sprint number
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VelocityTrend {
    pub trend: TrendDirection,
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
    pub p_value: f64,
}

/// Cycle-time statistics with 3-sigma control limits
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleTimeMetrics {
    pub mean: f64,
    pub median: f64,
    pub std: f64,
    pub upper_control_limit: f64,
    pub lower_control_limit: f64,
    pub num_outliers: usize,
    pub outlier_rate: f64,
}

/// Cycle time of stories sharing one estimate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointsCycleTime {
    pub story_points: f64,
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation, absent for a single story
    pub std: Option<f64>,
    pub count: usize,
}

/// How a sprint's delivery compares with capacity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UtilizationStatus {
    #[serde(rename = "Over-utilized")]
    OverUtilized,
    #[serde(rename = "At capacity")]
    AtCapacity,
    Healthy,
    #[serde(rename = "Under-utilized")]
    UnderUtilized,
}

impl UtilizationStatus {
    /// Over- and under-utilization both warrant attention
    pub fn is_warning(self) -> bool {
        matches!(self, UtilizationStatus::OverUtilized | UtilizationStatus::UnderUtilized)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapacityUtilization {
    /// Committed over capacity, percent
    pub commitment_utilization: f64,
    /// Completed over capacity, percent
    pub actual_utilization: f64,
    pub status: UtilizationStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SprintAccuracy {
    pub sprint_number: u32,
    pub avg_accuracy: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeShare {
    pub story_type: StoryType,
    pub count: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SprintQuality {
    pub sprint_number: u32,
    pub bug_ratio_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockerImpact {
    pub blocker_rate: f64,
    pub stories_blocked: usize,
    /// Mean blocker duration among blocked stories
    pub avg_delay_days: f64,
    /// Blockers vs cycle time; 0 for samples of ten stories or fewer
    pub cycle_time_correlation: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberContribution {
    pub member_id: String,
    /// Absent when the assignee is not on the roster
    pub name: Option<String>,
    pub role: Option<String>,
    pub points_delivered: f64,
    pub stories_completed: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoleWorkload {
    pub role: String,
    pub total_points: f64,
    pub story_count: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BottleneckKind {
    #[serde(rename = "Story Type")]
    StoryType,
    #[serde(rename = "Team Member")]
    TeamMember,
    Blockers,
    Carryover,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Medium,
    High,
}

/// A delivery constraint worth investigating
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bottleneck {
    pub kind: BottleneckKind,
    pub description: String,
    pub impact: Severity,
    pub recommendation: String,
}

/// Fit velocity against sprint number
pub fn velocity_trend(history: &[Sprint]) -> VelocityTrend {
    let insufficient = VelocityTrend {
        trend: TrendDirection::InsufficientData,
        slope: 0.0,
        intercept: 0.0,
        r_squared: 0.0,
        p_value: 1.0,
    };
    if history.len() < 2 {
        return insufficient;
    }

    let xs: Vec<f64> = history.iter().map(|s| s.sprint_number as f64).collect();
    let Some(fit) = stats::linear_regression(&xs, &velocities(history)) else {
        return insufficient;
    };

    let trend = if fit.slope > TREND_SLOPE {
        TrendDirection::Increasing
    } else if fit.slope < -TREND_SLOPE {
        TrendDirection::Decreasing
    } else {
        TrendDirection::Stable
    };

    VelocityTrend {
        trend,
        slope: fit.slope,
        intercept: fit.intercept,
        r_squared: fit.r_squared(),
        p_value: fit.p_value,
    }
}

/// `1 - min(CV, 1)`, 0 when mean velocity is 0
pub fn predictability_score(history: &[Sprint]) -> f64 {
    let vels = velocities(history);
    let avg = stats::mean(&vels);
    if avg == 0.0 {
        return 0.0;
    }
    (1.0 - (stats::std_dev(&vels) / avg).min(1.0)).max(0.0)
}

/// Cycle-time distribution and control limits
///
/// Pass completed stories for a flow view; every story is counted as given.
pub fn cycle_time_metrics(stories: &[Story]) -> CycleTimeMetrics {
    let times: Vec<f64> = stories.iter().map(|s| s.cycle_time_days).collect();
    let mean = stats::mean(&times);
    let std = stats::std_dev(&times);
    let upper = mean + CONTROL_SIGMAS * std;
    let lower = (mean - CONTROL_SIGMAS * std).max(0.0);

    let num_outliers = times.iter().filter(|&&t| t > upper || t < lower).count();

    CycleTimeMetrics {
        mean,
        median: stats::median(&times),
        std,
        upper_control_limit: upper,
        lower_control_limit: lower,
        num_outliers,
        outlier_rate: ratio(num_outliers, stories.len()),
    }
}

/// Cycle time grouped by original estimate, ascending
pub fn cycle_time_by_points(stories: &[Story]) -> Vec<PointsCycleTime> {
    let mut pairs: Vec<(f64, f64)> = stories
        .iter()
        .map(|s| (s.story_points, s.cycle_time_days))
        .collect();
    pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut groups: Vec<(f64, Vec<f64>)> = Vec::new();
    for (points, time) in pairs {
        match groups.last_mut() {
            Some((key, times)) if *key == points => times.push(time),
            _ => groups.push((points, vec![time])),
        }
    }

    groups
        .into_iter()
        .map(|(story_points, times)| PointsCycleTime {
            story_points,
            mean: stats::mean(&times),
            median: stats::median(&times),
            std: stats::sample_std_dev(&times),
            count: times.len(),
        })
        .collect()
}

/// Commitment and delivery against capacity
pub fn capacity_utilization(sprint: &Sprint) -> CapacityUtilization {
    let (commitment_utilization, actual_utilization) = if sprint.team_capacity > 0.0 {
        (
            sprint.committed_points / sprint.team_capacity * 100.0,
            sprint.completed_points / sprint.team_capacity * 100.0,
        )
    } else {
        (0.0, 0.0)
    };

    let status = if actual_utilization > 105.0 {
        UtilizationStatus::OverUtilized
    } else if actual_utilization > 95.0 {
        UtilizationStatus::AtCapacity
    } else if actual_utilization > 70.0 {
        UtilizationStatus::Healthy
    } else {
        UtilizationStatus::UnderUtilized
    };

    CapacityUtilization {
        commitment_utilization,
        actual_utilization,
        status,
    }
}

/// Mean story estimation accuracy per sprint
pub fn estimation_accuracy_trend(stories: &[Story]) -> Vec<SprintAccuracy> {
    by_sprint(stories)
        .into_iter()
        .map(|(sprint_number, group)| {
            let acc: Vec<f64> = group.iter().map(|s| s.estimation_accuracy()).collect();
            SprintAccuracy {
                sprint_number,
                avg_accuracy: stats::mean(&acc),
            }
        })
        .collect()
}

/// Count and share of each story type present
pub fn story_type_mix(stories: &[Story]) -> Vec<TypeShare> {
    let mut counts: BTreeMap<StoryType, usize> = BTreeMap::new();
    for story in stories {
        *counts.entry(story.story_type).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(story_type, count)| TypeShare {
            story_type,
            count,
            percentage: ratio(count, stories.len()) * 100.0,
        })
        .collect()
}

/// Share of stories that are bugs, 0-1
pub fn bug_ratio(stories: &[Story]) -> f64 {
    let bugs = stories.iter().filter(|s| s.story_type == StoryType::Bug).count();
    ratio(bugs, stories.len())
}

/// Share of stories carried over, 0-1
pub fn carryover_rate(stories: &[Story]) -> f64 {
    let carried = stories
        .iter()
        .filter(|s| s.status == StoryStatus::CarriedOver)
        .count();
    ratio(carried, stories.len())
}

/// Bug percentage per sprint
pub fn quality_trend(stories: &[Story]) -> Vec<SprintQuality> {
    by_sprint(stories)
        .into_iter()
        .map(|(sprint_number, group)| {
            let bugs = group.iter().filter(|s| s.story_type == StoryType::Bug).count();
            SprintQuality {
                sprint_number,
                bug_ratio_pct: ratio(bugs, group.len()) * 100.0,
            }
        })
        .collect()
}

/// How often blockers occur and how much they hurt
pub fn blocker_impact(stories: &[Story]) -> BlockerImpact {
    let delays: Vec<f64> = stories
        .iter()
        .filter(|s| s.is_blocked())
        .map(|s| s.blocker_duration_days)
        .collect();

    let cycle_time_correlation = if stories.len() > MIN_CORRELATION_SAMPLE {
        let blockers: Vec<f64> = stories.iter().map(|s| s.num_blockers as f64).collect();
        let times: Vec<f64> = stories.iter().map(|s| s.cycle_time_days).collect();
        stats::pearson(&blockers, &times)
    } else {
        0.0
    };

    BlockerImpact {
        blocker_rate: ratio(delays.len(), stories.len()),
        stories_blocked: delays.len(),
        avg_delay_days: stats::mean(&delays),
        cycle_time_correlation,
    }
}

/// Points delivered per assignee from completed stories, largest first
pub fn team_velocity_contribution(
    stories: &[Story],
    team: &[TeamMember],
) -> Vec<MemberContribution> {
    let mut per_member: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for story in stories.iter().filter(|s| s.is_completed()) {
        let entry = per_member.entry(story.assignee_id.as_str()).or_default();
        entry.0 += story.final_story_points;
        entry.1 += 1;
    }
    let total: f64 = per_member.values().map(|(points, _)| points).sum();

    let mut contributions: Vec<MemberContribution> = per_member
        .into_iter()
        .map(|(member_id, (points, count))| {
            let member = find_member(team, member_id);
            MemberContribution {
                member_id: member_id.to_string(),
                name: member.map(|m| m.name.clone()),
                role: member.map(|m| m.role.clone()),
                points_delivered: points,
                stories_completed: count,
                percentage: if total > 0.0 { points / total * 100.0 } else { 0.0 },
            }
        })
        .collect();

    contributions.sort_by(|a, b| b.points_delivered.total_cmp(&a.points_delivered));
    contributions
}

/// Estimated points and story counts per role, largest first
///
/// Stories whose assignee is not on the roster are left out.
pub fn work_distribution_by_role(stories: &[Story], team: &[TeamMember]) -> Vec<RoleWorkload> {
    let mut per_role: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for story in stories {
        let Some(member) = find_member(team, &story.assignee_id) else {
            continue;
        };
        let entry = per_role.entry(member.role.as_str()).or_default();
        entry.0 += story.story_points;
        entry.1 += 1;
    }
    let total: f64 = per_role.values().map(|(points, _)| points).sum();

    let mut roles: Vec<RoleWorkload> = per_role
        .into_iter()
        .map(|(role, (points, count))| RoleWorkload {
            role: role.to_string(),
            total_points: points,
            story_count: count,
            percentage: if total > 0.0 { points / total * 100.0 } else { 0.0 },
        })
        .collect();

    roles.sort_by(|a, b| b.total_points.total_cmp(&a.total_points));
    roles
}

/// Slow story types, slow assignees, frequent blockers and heavy carryover
pub fn identify_bottlenecks(stories: &[Story], team: &[TeamMember]) -> Vec<Bottleneck> {
    let mut bottlenecks = Vec::new();
    if stories.is_empty() {
        return bottlenecks;
    }

    let times: Vec<f64> = stories.iter().map(|s| s.cycle_time_days).collect();
    let avg_time = stats::mean(&times);

    if let Some((story_type, slowest)) = slowest_group(stories, |s| s.story_type) {
        if slowest > avg_time * SLOW_FACTOR {
            bottlenecks.push(Bottleneck {
                kind: BottleneckKind::StoryType,
                description: format!("{story_type} stories take {slowest:.1} days on average"),
                impact: if slowest > avg_time * VERY_SLOW_FACTOR {
                    Severity::High
                } else {
                    Severity::Medium
                },
                recommendation: format!(
                    "Investigate why {story_type} stories take longer. Consider breaking them down or allocating specialist resources."
                ),
            });
        }
    }

    if let Some((member_id, slowest)) = slowest_group(stories, |s| s.assignee_id.as_str()) {
        if slowest > avg_time * SLOW_FACTOR {
            let name = find_member(team, member_id)
                .map(|m| m.name.as_str())
                .unwrap_or(member_id);
            bottlenecks.push(Bottleneck {
                kind: BottleneckKind::TeamMember,
                description: format!("{name} has average cycle time of {slowest:.1} days"),
                impact: Severity::Medium,
                recommendation: format!(
                    "Review workload and support needs for {name}. May need mentoring or have capacity constraints."
                ),
            });
        }
    }

    let blockers = blocker_impact(stories);
    if blockers.blocker_rate > BLOCKER_ALERT {
        bottlenecks.push(Bottleneck {
            kind: BottleneckKind::Blockers,
            description: format!(
                "{:.1}% of stories encounter blockers",
                blockers.blocker_rate * 100.0
            ),
            impact: Severity::High,
            recommendation: "High blocker rate suggests dependency or process issues. Conduct blocker retrospective and implement mitigation strategies.".to_string(),
        });
    }

    let carryover = carryover_rate(stories);
    if carryover > CARRYOVER_ALERT {
        bottlenecks.push(Bottleneck {
            kind: BottleneckKind::Carryover,
            description: format!("{:.1}% of stories are carried over", carryover * 100.0),
            impact: Severity::Medium,
            recommendation: "High carryover suggests scope issues or overcommitment. Review sprint planning process and estimation practices.".to_string(),
        });
    }

    tracing::debug!(found = bottlenecks.len(), "bottleneck scan");
    bottlenecks
}

/// Group with the highest mean cycle time; first key wins ties
fn slowest_group<'a, K, F>(stories: &'a [Story], key: F) -> Option<(K, f64)>
where
    K: Ord + Copy,
    F: Fn(&'a Story) -> K,
{
    let mut groups: BTreeMap<K, Vec<f64>> = BTreeMap::new();
    for story in stories {
        groups.entry(key(story)).or_default().push(story.cycle_time_days);
    }

    let mut slowest: Option<(K, f64)> = None;
    for (k, times) in groups {
        let avg = stats::mean(&times);
        if slowest.map_or(true, |(_, best)| avg > best) {
            slowest = Some((k, avg));
        }
    }
    slowest
}

pub(crate) fn by_sprint(stories: &[Story]) -> BTreeMap<u32, Vec<&Story>> {
    let mut groups: BTreeMap<u32, Vec<&Story>> = BTreeMap::new();
    for story in stories {
        groups.entry(story.sprint_number).or_default().push(story);
    }
    groups
}

fn ratio(part: usize, whole: usize) -> f64 {
    if whole > 0 {
        part as f64 / whole as f64
    } else {
        0.0
    }
}
