//! Group-by rollups that feed the scorers and dashboards

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::Serialize;

use crate::analysis::metrics::by_sprint;
use crate::core::stats;
use crate::entities::{
    find_member, velocities, Initiative, InitiativeStatus, Sprint, Story, StoryStatus, StoryType,
    TeamMember,
};

/// Default trailing window for rolling metrics
pub const ROLLING_WINDOW: usize = 3;

/// Story rollup for one sprint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SprintStoryMetrics {
    pub sprint_number: u32,
    pub total_stories: usize,
    pub planned_points: f64,
    pub actual_points: f64,
    pub avg_cycle_time: f64,
    pub total_blockers: u32,
    pub total_blocker_days: f64,
    pub avg_estimation_accuracy: f64,
    pub stories_with_blockers: usize,
}

/// Trailing-window view of one sprint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RollingMetrics {
    pub sprint_number: u32,
    pub velocity_rolling_avg: f64,
    /// Sample std of the window, absent while it holds one sprint
    pub velocity_rolling_std: Option<f64>,
    pub completion_rate_rolling_avg: f64,
}

/// Per-assignee delivery figures
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberMetrics {
    pub member_id: String,
    pub name: Option<String>,
    pub role: Option<String>,
    pub total_points_planned: f64,
    pub total_points_delivered: f64,
    pub avg_cycle_time: f64,
    pub stories_count: usize,
    pub avg_estimation_accuracy: f64,
    pub avg_points_per_sprint: f64,
    /// Delivered per sprint over capacity, percent; absent off-roster or at zero capacity
    pub utilization_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InitiativeSummary {
    pub initiative_id: String,
    pub name: String,
    pub status: InitiativeStatus,
    pub completion_pct: f64,
    /// Impact over effort before any weighting
    pub priority_score_base: f64,
    pub actual_story_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SprintSummaryStats {
    pub total_sprints: usize,
    pub avg_velocity: f64,
    pub velocity_std: Option<f64>,
    pub avg_completion_rate: f64,
    pub total_stories: usize,
    pub total_points_delivered: f64,
    pub avg_cycle_time: f64,
    pub total_blockers: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeCount {
    pub sprint_number: u32,
    pub story_type: StoryType,
    pub count: usize,
}

/// Roll stories up per sprint, ordered by sprint number
pub fn story_metrics_by_sprint(stories: &[Story]) -> Vec<SprintStoryMetrics> {
    by_sprint(stories)
        .into_iter()
        .map(|(sprint_number, group)| {
            let cycle: Vec<f64> = group.iter().map(|s| s.cycle_time_days).collect();
            let accuracy: Vec<f64> = group.iter().map(|s| s.estimation_accuracy()).collect();
            SprintStoryMetrics {
                sprint_number,
                total_stories: group.len(),
                planned_points: group.iter().map(|s| s.story_points).sum(),
                actual_points: group.iter().map(|s| s.final_story_points).sum(),
                avg_cycle_time: stats::mean(&cycle),
                total_blockers: group.iter().map(|s| s.num_blockers).sum(),
                total_blocker_days: group.iter().map(|s| s.blocker_duration_days).sum(),
                avg_estimation_accuracy: stats::mean(&accuracy),
                stories_with_blockers: group.iter().filter(|s| s.is_blocked()).count(),
            }
        })
        .collect()
}

/// Copy of each sprint carrying its story aggregates
///
/// Sprints with no stories are returned unchanged.
pub fn enrich_sprints(history: &[Sprint], stories: &[Story]) -> Vec<Sprint> {
    let metrics: BTreeMap<u32, SprintStoryMetrics> = story_metrics_by_sprint(stories)
        .into_iter()
        .map(|m| (m.sprint_number, m))
        .collect();

    history
        .iter()
        .map(|sprint| match metrics.get(&sprint.sprint_number) {
            Some(m) => sprint.with_story_aggregates(
                m.total_stories as u32,
                m.avg_estimation_accuracy,
                m.stories_with_blockers as u32,
            ),
            None => sprint.clone(),
        })
        .collect()
}

/// Trailing-window velocity and completion statistics per sprint
///
/// Windows shorter than `window` are used at the start of the history.
pub fn rolling_metrics(history: &[Sprint], window: usize) -> Vec<RollingMetrics> {
    let window = window.max(1);
    history
        .iter()
        .enumerate()
        .map(|(i, sprint)| {
            let slice = &history[(i + 1).saturating_sub(window)..=i];
            let vels = velocities(slice);
            let rates: Vec<f64> = slice.iter().map(Sprint::completion_rate).collect();
            RollingMetrics {
                sprint_number: sprint.sprint_number,
                velocity_rolling_avg: stats::mean(&vels),
                velocity_rolling_std: stats::sample_std_dev(&vels),
                completion_rate_rolling_avg: stats::mean(&rates),
            }
        })
        .collect()
}

/// Per-assignee totals, utilization over the distinct sprints in `stories`
pub fn team_member_metrics(stories: &[Story], team: &[TeamMember]) -> Vec<MemberMetrics> {
    let sprint_count = stories
        .iter()
        .map(|s| s.sprint_number)
        .collect::<BTreeSet<_>>()
        .len();

    let mut per_member: BTreeMap<&str, Vec<&Story>> = BTreeMap::new();
    for story in stories {
        per_member.entry(story.assignee_id.as_str()).or_default().push(story);
    }

    per_member
        .into_iter()
        .map(|(member_id, group)| {
            let member = find_member(team, member_id);
            let delivered: f64 = group.iter().map(|s| s.final_story_points).sum();
            let cycle: Vec<f64> = group.iter().map(|s| s.cycle_time_days).collect();
            let accuracy: Vec<f64> = group.iter().map(|s| s.estimation_accuracy()).collect();
            let avg_points_per_sprint = delivered / sprint_count as f64;
            let utilization_pct = member
                .filter(|m| m.avg_capacity_per_sprint > 0.0)
                .map(|m| avg_points_per_sprint / m.avg_capacity_per_sprint * 100.0);

            MemberMetrics {
                member_id: member_id.to_string(),
                name: member.map(|m| m.name.clone()),
                role: member.map(|m| m.role.clone()),
                total_points_planned: group.iter().map(|s| s.story_points).sum(),
                total_points_delivered: delivered,
                avg_cycle_time: stats::mean(&cycle),
                stories_count: group.len(),
                avg_estimation_accuracy: stats::mean(&accuracy),
                avg_points_per_sprint,
                utilization_pct,
            }
        })
        .collect()
}

/// Completion, base priority and story count per initiative, in input order
pub fn initiative_summary(initiatives: &[Initiative], stories: &[Story]) -> Vec<InitiativeSummary> {
    let mut story_counts: BTreeMap<&str, usize> = BTreeMap::new();
    for id in stories.iter().filter_map(|s| s.initiative_id.as_deref()) {
        *story_counts.entry(id).or_default() += 1;
    }

    initiatives
        .iter()
        .map(|init| InitiativeSummary {
            initiative_id: init.initiative_id.clone(),
            name: init.name.clone(),
            status: init.status,
            completion_pct: init.completion_ratio().map_or(0.0, |r| r * 100.0),
            priority_score_base: if init.effort_score != 0.0 {
                init.impact_score / init.effort_score
            } else {
                0.0
            },
            actual_story_count: story_counts
                .get(init.initiative_id.as_str())
                .copied()
                .unwrap_or(0),
        })
        .collect()
}

/// Headline totals across a whole history
pub fn sprint_summary_stats(history: &[Sprint], stories: &[Story]) -> SprintSummaryStats {
    let vels = velocities(history);
    let rates: Vec<f64> = history.iter().map(Sprint::completion_rate).collect();
    let cycle: Vec<f64> = stories.iter().map(|s| s.cycle_time_days).collect();

    SprintSummaryStats {
        total_sprints: history.len(),
        avg_velocity: stats::mean(&vels),
        velocity_std: stats::sample_std_dev(&vels),
        avg_completion_rate: stats::mean(&rates),
        total_stories: stories.len(),
        total_points_delivered: history.iter().map(|s| s.completed_points).sum(),
        avg_cycle_time: stats::mean(&cycle),
        total_blockers: stories.iter().map(|s| s.num_blockers).sum(),
    }
}

/// Story counts per status, optionally for one sprint
pub fn stories_by_status(
    stories: &[Story],
    sprint_number: Option<u32>,
) -> BTreeMap<StoryStatus, usize> {
    let mut counts = BTreeMap::new();
    for story in stories
        .iter()
        .filter(|s| sprint_number.map_or(true, |n| s.sprint_number == n))
    {
        *counts.entry(story.status).or_default() += 1;
    }
    counts
}

/// Story counts per sprint and type
pub fn story_type_distribution(stories: &[Story]) -> Vec<TypeCount> {
    let mut counts: BTreeMap<(u32, StoryType), usize> = BTreeMap::new();
    for story in stories {
        *counts.entry((story.sprint_number, story.story_type)).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|((sprint_number, story_type), count)| TypeCount {
            sprint_number,
            story_type,
            count,
        })
        .collect()
}

/// Stories started within `[start, end]`; undated stories are excluded
pub fn stories_between(stories: &[Story], start: NaiveDate, end: NaiveDate) -> Vec<&Story> {
    stories
        .iter()
        .filter(|s| s.start_date.is_some_and(|d| d >= start && d <= end))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn story(id: &str, sprint: u32, assignee: &str, points: f64, actual: f64) -> Story {
        Story {
            story_id: id.to_string(),
            sprint_number: sprint,
            story_points: points,
            final_story_points: actual,
            story_type: StoryType::Feature,
            status: StoryStatus::Completed,
            cycle_time_days: 4.0,
            num_blockers: 0,
            blocker_duration_days: 0.0,
            assignee_id: assignee.to_string(),
            initiative_id: None,
            start_date: None,
        }
    }

    #[test]
    fn test_story_metrics_by_sprint() {
        let mut blocked = story("B", 1, "TM001", 5.0, 8.0);
        blocked.num_blockers = 2;
        blocked.blocker_duration_days = 1.5;
        blocked.cycle_time_days = 6.0;
        let stories = vec![
            story("A", 1, "TM001", 3.0, 3.0),
            blocked,
            story("C", 2, "TM002", 2.0, 2.0),
        ];

        let metrics = story_metrics_by_sprint(&stories);
        assert_eq!(metrics.len(), 2);
        let first = &metrics[0];
        assert_eq!(first.total_stories, 2);
        assert_eq!(first.planned_points, 8.0);
        assert_eq!(first.actual_points, 11.0);
        assert_eq!(first.avg_cycle_time, 5.0);
        assert_eq!(first.total_blockers, 2);
        assert_eq!(first.stories_with_blockers, 1);
        assert!((first.avg_estimation_accuracy - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_enrich_sprints() {
        let history = vec![Sprint::new(1, 10.0, 10.0, 12.0), Sprint::new(2, 10.0, 8.0, 12.0)];
        let enriched = enrich_sprints(&history, &[story("A", 1, "TM001", 3.0, 3.0)]);
        assert_eq!(enriched[0].stories_count, 1);
        assert_eq!(enriched[0].avg_estimation_accuracy, Some(0.0));
        assert_eq!(enriched[0].stories_with_blockers, Some(0));
        assert_eq!(enriched[1], history[1]);
    }

    #[test]
    fn test_rolling_metrics() {
        let history: Vec<Sprint> = [30.0, 36.0, 33.0, 45.0]
            .iter()
            .enumerate()
            .map(|(i, &v)| Sprint::new(i as u32 + 1, 40.0, v, 45.0))
            .collect();
        let rolling = rolling_metrics(&history, ROLLING_WINDOW);

        assert_eq!(rolling[0].velocity_rolling_avg, 30.0);
        assert_eq!(rolling[0].velocity_rolling_std, None);
        assert_eq!(rolling[1].velocity_rolling_avg, 33.0);
        assert_eq!(rolling[2].velocity_rolling_avg, 33.0);
        assert!((rolling[2].velocity_rolling_std.unwrap() - 3.0).abs() < 1e-12);
        assert_eq!(rolling[3].velocity_rolling_avg, 38.0);
        assert!((rolling[3].completion_rate_rolling_avg - 0.95).abs() < 1e-12);
    }

    #[test]
    fn test_team_member_metrics() {
        let team = vec![TeamMember::new("TM001", "Ada", "Backend", 10.0)];
        let stories = vec![
            story("A", 1, "TM001", 5.0, 6.0),
            story("B", 2, "TM001", 5.0, 6.0),
            story("C", 2, "TM009", 3.0, 3.0),
        ];
        let metrics = team_member_metrics(&stories, &team);
        assert_eq!(metrics.len(), 2);
        assert_eq!(metrics[0].total_points_delivered, 12.0);
        assert_eq!(metrics[0].avg_points_per_sprint, 6.0);
        assert_eq!(metrics[0].utilization_pct, Some(60.0));
        assert_eq!(metrics[1].name, None);
        assert_eq!(metrics[1].utilization_pct, None);
    }

    #[test]
    fn test_initiative_summary() {
        let mut init = Initiative::new("INIT-001", 8.0, 4.0, 40.0);
        init.completed_story_points = 10.0;
        let empty = Initiative::new("INIT-002", 5.0, 0.0, 0.0);
        let mut tagged = story("A", 1, "TM001", 3.0, 3.0);
        tagged.initiative_id = Some("INIT-001".to_string());

        let summary =
            initiative_summary(&[init, empty], &[tagged, story("B", 1, "TM001", 1.0, 1.0)]);
        assert_eq!(summary[0].completion_pct, 25.0);
        assert_eq!(summary[0].priority_score_base, 2.0);
        assert_eq!(summary[0].actual_story_count, 1);
        assert_eq!(summary[1].completion_pct, 0.0);
        assert_eq!(summary[1].priority_score_base, 0.0);
    }

    #[test]
    fn test_sprint_summary_and_status_counts() {
        let history = vec![Sprint::new(1, 40.0, 30.0, 45.0), Sprint::new(2, 40.0, 40.0, 45.0)];
        let mut carried = story("B", 2, "TM001", 3.0, 3.0);
        carried.status = StoryStatus::CarriedOver;
        carried.num_blockers = 3;
        let stories = vec![story("A", 1, "TM001", 3.0, 3.0), carried];

        let summary = sprint_summary_stats(&history, &stories);
        assert_eq!(summary.total_sprints, 2);
        assert_eq!(summary.avg_velocity, 35.0);
        assert_eq!(summary.total_points_delivered, 70.0);
        assert_eq!(summary.total_blockers, 3);
        assert!((summary.avg_completion_rate - 0.875).abs() < 1e-12);

        let all = stories_by_status(&stories, None);
        assert_eq!(all.get(&StoryStatus::Completed), Some(&1));
        let second = stories_by_status(&stories, Some(2));
        assert_eq!(second.len(), 1);
        assert_eq!(second.get(&StoryStatus::CarriedOver), Some(&1));
    }

    #[test]
    fn test_type_distribution_and_date_filter() {
        let mut bug = story("B", 1, "TM001", 1.0, 1.0);
        bug.story_type = StoryType::Bug;
        bug.start_date = NaiveDate::from_ymd_opt(2024, 3, 4);
        let mut late = story("C", 2, "TM001", 1.0, 1.0);
        late.start_date = NaiveDate::from_ymd_opt(2024, 4, 1);
        let stories = vec![story("A", 1, "TM001", 1.0, 1.0), bug, late];

        let dist = story_type_distribution(&stories);
        assert_eq!(dist.len(), 3);
        assert_eq!(dist[0].story_type, StoryType::Feature);
        assert_eq!(dist[1].story_type, StoryType::Bug);

        let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
        let march = stories_between(&stories, start, end);
        assert_eq!(march.len(), 1);
        assert_eq!(march[0].story_id, "B");
    }
}
