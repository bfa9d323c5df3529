//! Advisory records built from the scorers' outputs
//!
//! Two sets are produced: predictive advice about the current sprint and the
//! team, and portfolio advice about the initiative mix. Thresholds and
//! windows come from [`RecommendationConfig`]. Records are emitted in a fixed
//! order and never deduplicated.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::analysis::allocation::allocate_from_history;
use crate::analysis::health::score_sprint_health;
use crate::analysis::priority::{portfolio_composition, quick_wins, time_sinks, Quadrant};
use crate::analysis::risk::{assess_all_initiatives_risk, RiskLevel};
use crate::core::config::{Config, RecommendationConfig};
use crate::core::stats;
use crate::entities::{
    find_member, trailing_velocities, Initiative, InitiativeStatus, Sprint, Story, TeamMember,
    REVENUE_GROWTH,
};

/// Topic of a recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RecommendationCategory {
    #[serde(rename = "Sprint Health")]
    SprintHealth,
    Estimation,
    #[serde(rename = "Cycle Time")]
    CycleTime,
    #[serde(rename = "Capacity Planning")]
    CapacityPlanning,
    #[serde(rename = "Team Capacity")]
    TeamCapacity,
    #[serde(rename = "Initiative Risk")]
    InitiativeRisk,
    #[serde(rename = "Quick Wins")]
    QuickWins,
    #[serde(rename = "Time Sinks")]
    TimeSinks,
    #[serde(rename = "Portfolio Balance")]
    PortfolioBalance,
    Capacity,
    #[serde(rename = "Strategic Alignment")]
    StrategicAlignment,
}

impl std::fmt::Display for RecommendationCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RecommendationCategory::SprintHealth => "Sprint Health",
            RecommendationCategory::Estimation => "Estimation",
            RecommendationCategory::CycleTime => "Cycle Time",
            RecommendationCategory::CapacityPlanning => "Capacity Planning",
            RecommendationCategory::TeamCapacity => "Team Capacity",
            RecommendationCategory::InitiativeRisk => "Initiative Risk",
            RecommendationCategory::QuickWins => "Quick Wins",
            RecommendationCategory::TimeSinks => "Time Sinks",
            RecommendationCategory::PortfolioBalance => "Portfolio Balance",
            RecommendationCategory::Capacity => "Capacity",
            RecommendationCategory::StrategicAlignment => "Strategic Alignment",
        };
        write!(f, "{name}")
    }
}

/// Urgency of a recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Priority {
    Medium,
    High,
}

/// One piece of advice
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub category: RecommendationCategory,
    pub priority: Priority,
    /// What the data shows
    pub insight: String,
    /// What to do about it
    pub action: String,
    /// Expected effect of acting
    pub impact: String,
}

impl Recommendation {
    fn new(
        category: RecommendationCategory,
        priority: Priority,
        insight: String,
        action: impl Into<String>,
        impact: &str,
    ) -> Self {
        Self {
            category,
            priority,
            insight,
            action: action.into(),
            impact: impact.to_string(),
        }
    }
}

/// Advice about the current sprint, the team and initiative risk
///
/// The last sprint of `history` is the current one; an empty history yields
/// no advice. Sprint health reads the current sprint's story aggregates, so
/// pass enriched sprints when they are available.
pub fn predictive_recommendations(
    history: &[Sprint],
    stories: &[Story],
    initiatives: &[Initiative],
    team: &[TeamMember],
    config: &Config,
) -> Vec<Recommendation> {
    let Some(current) = history.last() else {
        tracing::warn!("no sprint history, skipping predictive recommendations");
        return Vec::new();
    };
    let rc = &config.recommendations;
    let mut recs = Vec::new();

    let health = score_sprint_health(current, history, &config.health);
    if health.health_score < rc.min_health_score {
        recs.push(Recommendation::new(
            RecommendationCategory::SprintHealth,
            Priority::High,
            format!(
                "Current sprint health score is {:.0}/100 (below healthy threshold)",
                health.health_score
            ),
            "Review sprint commitments and address blockers proactively. Consider reducing scope for current sprint.",
            "Prevents sprint failure and team burnout",
        ));
    }

    let since = current.sprint_number.saturating_sub(rc.story_lookback);
    let recent: Vec<&Story> = stories.iter().filter(|s| s.sprint_number >= since).collect();
    if !recent.is_empty() {
        let accuracy: Vec<f64> = recent.iter().map(|s| s.estimation_accuracy()).collect();
        let avg_accuracy = stats::mean(&accuracy);
        if avg_accuracy < rc.min_estimation_accuracy {
            recs.push(Recommendation::new(
                RecommendationCategory::Estimation,
                Priority::Medium,
                format!(
                    "Recent estimation accuracy is {:.0}% (target: >85%)",
                    avg_accuracy * 100.0
                ),
                "Conduct estimation calibration session. Consider increasing story point estimates for historically underestimated work types.",
                "Improves sprint predictability and team confidence",
            ));
        }

        let cycle: Vec<f64> = recent.iter().map(|s| s.cycle_time_days).collect();
        let avg_cycle_time = stats::mean(&cycle);
        if avg_cycle_time > rc.max_cycle_time_days {
            recs.push(Recommendation::new(
                RecommendationCategory::CycleTime,
                Priority::Medium,
                format!(
                    "Average cycle time is {avg_cycle_time:.1} days (target: <{:.0} days)",
                    rc.max_cycle_time_days
                ),
                "Break down larger stories into smaller increments. Review WIP limits and consider pair programming for faster completion.",
                "Faster value delivery and improved flow",
            ));
        }
    }

    recs.push(capacity_planning(history, rc));

    if let Some(rec) = team_capacity(history, stories, team, rc) {
        recs.push(rec);
    }

    let risks = assess_all_initiatives_risk(
        initiatives,
        current.sprint_number,
        history,
        Some(current.utilization()),
        &config.risk,
    );
    let high: Vec<_> = risks.iter().filter(|r| r.risk_level == RiskLevel::High).collect();
    if let Some(worst) = high.first() {
        recs.push(Recommendation::new(
            RecommendationCategory::InitiativeRisk,
            Priority::High,
            format!("{} initiative(s) at high risk of missing target dates", high.len()),
            format!(
                "Immediate review needed for: {}. Consider descoping, extending timeline, or adding resources.",
                worst.name
            ),
            "Prevents initiative failures and sets realistic stakeholder expectations",
        ));
    }

    tracing::debug!(count = recs.len(), "predictive recommendations");
    recs
}

fn capacity_planning(history: &[Sprint], rc: &RecommendationConfig) -> Recommendation {
    let avg = stats::mean(&trailing_velocities(history, rc.velocity_window));
    let optimal = (avg * rc.commitment_factor).floor() as i64;
    Recommendation::new(
        RecommendationCategory::CapacityPlanning,
        Priority::High,
        format!(
            "Based on last {} sprints (avg velocity: {avg:.0}), optimal commitment is {optimal} points",
            rc.velocity_window
        ),
        format!(
            "Recommend committing {optimal}±3 points for next sprint to maintain healthy {:.0}% completion rate.",
            rc.commitment_factor * 100.0
        ),
        "Maximizes throughput while maintaining sustainable pace",
    )
}

/// Members delivering more per sprint than their stated capacity
fn team_capacity(
    history: &[Sprint],
    stories: &[Story],
    team: &[TeamMember],
    rc: &RecommendationConfig,
) -> Option<Recommendation> {
    let sprint_count = history
        .iter()
        .map(|s| s.sprint_number)
        .collect::<BTreeSet<_>>()
        .len() as f64;

    let mut delivered: BTreeMap<&str, f64> = BTreeMap::new();
    for story in stories {
        *delivered.entry(story.assignee_id.as_str()).or_default() += story.final_story_points;
    }

    let overloaded: Vec<&str> = delivered
        .into_iter()
        .filter_map(|(id, points)| {
            let member = find_member(team, id)?;
            let capacity = member.avg_capacity_per_sprint;
            (capacity > 0.0 && points / sprint_count / capacity > rc.max_member_utilization)
                .then_some(member.name.as_str())
        })
        .collect();

    if overloaded.is_empty() {
        return None;
    }

    let names = overloaded.iter().take(2).copied().collect::<Vec<_>>().join(", ");
    Some(Recommendation::new(
        RecommendationCategory::TeamCapacity,
        Priority::High,
        format!(
            "{} team member(s) consistently over-utilized (>{:.0}%): {names}",
            overloaded.len(),
            rc.max_member_utilization * 100.0
        ),
        "Rebalance work distribution or increase capacity in bottleneck areas. Risk of burnout if sustained.",
        "Prevents burnout and improves team sustainability",
    ))
}

/// Advice about the initiative mix and its fit to capacity
pub fn portfolio_recommendations(
    initiatives: &[Initiative],
    history: &[Sprint],
    config: &Config,
) -> Vec<Recommendation> {
    let rc = &config.recommendations;
    let pc = &config.priority;
    let mut recs = Vec::new();

    let backlog_wins: Vec<_> = quick_wins(initiatives, rc.quick_win_limit, pc)
        .into_iter()
        .filter(|w| w.status == InitiativeStatus::Backlog)
        .collect();
    if !backlog_wins.is_empty() {
        let points: f64 = backlog_wins.iter().map(|w| w.total_story_points).sum();
        recs.push(Recommendation::new(
            RecommendationCategory::QuickWins,
            Priority::High,
            format!(
                "{n} Quick Win initiatives ready: {n} high-impact, low-effort initiatives identified with combined effort of {points} points.",
                n = backlog_wins.len()
            ),
            "Prioritize these for immediate execution in next sprint.",
            "Early value delivery for little effort",
        ));
    }

    let pending_sinks = time_sinks(initiatives, pc)
        .into_iter()
        .filter(|s| s.status.is_pending())
        .count();
    if pending_sinks > 0 {
        recs.push(Recommendation::new(
            RecommendationCategory::TimeSinks,
            Priority::Medium,
            format!(
                "{pending_sinks} low-impact, high-effort initiatives identified. These represent opportunity cost."
            ),
            "Review and consider deprioritizing to free up capacity for higher-value work.",
            "Frees capacity for higher-value work",
        ));
    }

    let major_pct = portfolio_composition(initiatives, &pc.quadrant)
        .into_iter()
        .find(|q| q.quadrant == Quadrant::MajorProjects)
        .map(|q| q.initiative_pct);
    if let Some(pct) = major_pct.filter(|&pct| pct > rc.max_major_projects_pct) {
        recs.push(Recommendation::new(
            RecommendationCategory::PortfolioBalance,
            Priority::Medium,
            format!("{pct:.0}% of initiatives are major projects (high impact, high effort)."),
            "Balance portfolio with quick wins to maintain steady value delivery while major projects are in progress.",
            "Steady value delivery while large efforts are under way",
        ));
    }

    let plan = allocate_from_history(initiatives, history, rc.allocation_sprints, pc);
    let demand: f64 = initiatives
        .iter()
        .filter(|i| i.status.is_pending())
        .map(Initiative::remaining_points)
        .sum();
    if plan.capacity_utilization > rc.max_capacity_utilization_pct {
        recs.push(Recommendation::new(
            RecommendationCategory::Capacity,
            Priority::High,
            format!(
                "Active initiatives require {demand:.0} points but only {:.0} points available in next {} sprints.",
                plan.available_capacity, rc.allocation_sprints
            ),
            "Review active initiatives and descope or deprioritize to match team capacity.",
            "Commitments that match what the team can deliver",
        ));
    }

    let revenue = initiatives
        .iter()
        .filter(|i| i.strategic_category == REVENUE_GROWTH)
        .count();
    let revenue_pct = if initiatives.is_empty() {
        0.0
    } else {
        revenue as f64 / initiatives.len() as f64 * 100.0
    };
    if revenue_pct < rc.min_revenue_growth_pct {
        recs.push(Recommendation::new(
            RecommendationCategory::StrategicAlignment,
            Priority::Medium,
            format!("Only {revenue_pct:.0}% of initiatives directly target revenue growth."),
            "Consider increasing focus on revenue-generating initiatives to support business goals.",
            "Closer alignment with business goals",
        ));
    }

    tracing::debug!(count = recs.len(), "portfolio recommendations");
    recs
}

/// Predictive advice followed by portfolio advice
pub fn generate_recommendations(
    history: &[Sprint],
    stories: &[Story],
    initiatives: &[Initiative],
    team: &[TeamMember],
    config: &Config,
) -> Vec<Recommendation> {
    let mut recs = predictive_recommendations(history, stories, initiatives, team, config);
    recs.extend(portfolio_recommendations(initiatives, history, config));
    recs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::PriorityConfig;
    use crate::entities::{StoryStatus, StoryType};

    fn categories(recs: &[Recommendation]) -> Vec<RecommendationCategory> {
        recs.iter().map(|r| r.category).collect()
    }

    fn story(id: &str, sprint: u32, assignee: &str, points: f64, actual: f64, cycle: f64) -> Story {
        Story {
            story_id: id.to_string(),
            sprint_number: sprint,
            story_points: points,
            final_story_points: actual,
            story_type: StoryType::Feature,
            status: StoryStatus::Completed,
            cycle_time_days: cycle,
            num_blockers: 0,
            blocker_duration_days: 0.0,
            assignee_id: assignee.to_string(),
            initiative_id: None,
            start_date: None,
        }
    }

    fn steady_history() -> Vec<Sprint> {
        (1..=4)
            .map(|n| Sprint::new(n, 40.0, 40.0, 45.0).with_story_aggregates(10, 0.9, 0))
            .collect()
    }

    #[test]
    fn test_empty_history_has_no_predictive_advice() {
        let recs = predictive_recommendations(&[], &[], &[], &[], &Config::default());
        assert!(recs.is_empty());
    }

    #[test]
    fn test_capacity_planning_always_present() {
        let recs = predictive_recommendations(&steady_history(), &[], &[], &[], &Config::default());
        assert_eq!(categories(&recs), vec![RecommendationCategory::CapacityPlanning]);
        assert_eq!(
            recs[0].insight,
            "Based on last 3 sprints (avg velocity: 40), optimal commitment is 38 points"
        );
        assert_eq!(recs[0].priority, Priority::High);
    }

    #[test]
    fn test_unhealthy_sprint_and_slow_stories() {
        let mut history: Vec<Sprint> = [20.0, 60.0, 25.0]
            .iter()
            .enumerate()
            .map(|(i, &v)| Sprint::new(i as u32 + 1, 50.0, v, 45.0))
            .collect();
        history[2] = history[2].with_story_aggregates(4, 0.5, 3);
        let stories = vec![
            story("A", 1, "TM001", 3.0, 3.0, 12.0),
            story("B", 3, "TM001", 3.0, 3.0, 9.0),
        ];
        let recs = predictive_recommendations(&history, &stories, &[], &[], &Config::default());
        assert_eq!(
            categories(&recs),
            vec![
                RecommendationCategory::SprintHealth,
                RecommendationCategory::Estimation,
                RecommendationCategory::CycleTime,
                RecommendationCategory::CapacityPlanning,
            ]
        );
        assert!(recs[2].insight.starts_with("Average cycle time is 10.5 days"));
    }

    #[test]
    fn test_estimation_threshold_on_recent_stories() {
        // only sprint >= 2 counts; the old story would otherwise lift the mean
        let stories = vec![
            story("OLD", 1, "TM001", 1.0, 9.0, 2.0),
            story("A", 3, "TM001", 5.0, 5.0, 2.0),
            story("B", 4, "TM001", 5.0, 5.0, 2.0),
        ];
        let recs =
            predictive_recommendations(&steady_history(), &stories, &[], &[], &Config::default());
        let est = recs
            .iter()
            .find(|r| r.category == RecommendationCategory::Estimation)
            .unwrap();
        assert_eq!(est.insight, "Recent estimation accuracy is 0% (target: >85%)");
    }

    #[test]
    fn test_overloaded_members_named() {
        let team = vec![
            TeamMember::new("TM001", "Ada", "Backend", 5.0),
            TeamMember::new("TM002", "Lin", "Frontend", 5.0),
            TeamMember::new("TM003", "Sam", "QA", 5.0),
            TeamMember::new("TM004", "Kai", "Design", 50.0),
        ];
        let stories: Vec<Story> = ["TM001", "TM002", "TM003", "TM004"]
            .iter()
            .map(|id| story(id, 1, id, 5.0, 24.0, 2.0))
            .collect();
        let recs =
            predictive_recommendations(&steady_history(), &stories, &[], &team, &Config::default());
        let rec = recs
            .iter()
            .find(|r| r.category == RecommendationCategory::TeamCapacity)
            .unwrap();
        assert_eq!(
            rec.insight,
            "3 team member(s) consistently over-utilized (>105%): Ada, Lin"
        );
    }

    #[test]
    fn test_high_risk_initiative_flagged() {
        let mut tight = Initiative::new("INIT-009", 9.0, 8.0, 500.0);
        tight.name = "Platform rewrite".to_string();
        tight.status = InitiativeStatus::Active;
        tight.target_sprint = Some(5);
        let overloaded: Vec<Sprint> = (1..=4).map(|n| Sprint::new(n, 50.0, 50.0, 45.0)).collect();
        let recs = predictive_recommendations(&overloaded, &[], &[tight], &[], &Config::default());
        let rec = recs.last().unwrap();
        assert_eq!(rec.category, RecommendationCategory::InitiativeRisk);
        assert!(rec.action.contains("Platform rewrite"));
    }

    #[test]
    fn test_portfolio_recommendations_order() {
        let mut quick = Initiative::new("QW", 9.0, 2.0, 20.0);
        quick.strategic_category = REVENUE_GROWTH.to_string();
        let mut sink = Initiative::new("TS", 3.0, 9.0, 400.0);
        sink.status = InitiativeStatus::Active;
        let major_a = Initiative::new("MP1", 9.0, 9.0, 10.0);
        let major_b = Initiative::new("MP2", 8.0, 8.0, 10.0);
        let initiatives = vec![quick, sink, major_a, major_b];

        let recs = portfolio_recommendations(&initiatives, &steady_history(), &Config::default());
        assert_eq!(
            categories(&recs),
            vec![
                RecommendationCategory::QuickWins,
                RecommendationCategory::TimeSinks,
                RecommendationCategory::PortfolioBalance,
            ]
        );
        assert!(recs[0].insight.contains("combined effort of 20 points"));
    }

    #[test]
    fn test_capacity_follows_allocation_utilization() {
        let mut big = Initiative::new("BIG", 9.0, 2.0, 500.0);
        big.status = InitiativeStatus::Active;
        big.strategic_category = REVENUE_GROWTH.to_string();
        let history: Vec<Sprint> = (1..=3).map(|n| Sprint::new(n, 40.0, 40.0, 45.0)).collect();
        let initiatives = vec![big];

        // demand far above capacity still leaves the allocation at exactly 100%
        let plan = allocate_from_history(&initiatives, &history, 3, &PriorityConfig::default());
        assert_eq!(plan.capacity_utilization, 100.0);
        let recs = portfolio_recommendations(&initiatives, &history, &Config::default());
        assert!(recs.iter().all(|r| r.category != RecommendationCategory::Capacity));

        let mut config = Config::default();
        config.recommendations.max_capacity_utilization_pct = 90.0;
        let recs = portfolio_recommendations(&initiatives, &history, &config);
        assert_eq!(categories(&recs), vec![RecommendationCategory::Capacity]);
        assert_eq!(
            recs[0].insight,
            "Active initiatives require 500 points but only 120 points available in next 3 sprints."
        );
    }

    #[test]
    fn test_strategic_alignment_and_composition() {
        let fill_in = [Initiative::new("A", 5.0, 5.0, 10.0)];
        let recs = portfolio_recommendations(&fill_in, &steady_history(), &Config::default());
        assert_eq!(categories(&recs), vec![RecommendationCategory::StrategicAlignment]);

        let all = generate_recommendations(
            &steady_history(),
            &[],
            &[Initiative::new("A", 5.0, 5.0, 10.0)],
            &[],
            &Config::default(),
        );
        assert_eq!(
            categories(&all),
            vec![
                RecommendationCategory::CapacityPlanning,
                RecommendationCategory::StrategicAlignment,
            ]
        );
    }
}
