//! Sprint health scoring

use serde::Serialize;

use crate::core::config::HealthConfig;
use crate::core::stats;
use crate::entities::{velocities, Sprint};

/// Composite 0-100 health of a sprint with its components as percentages
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthAssessment {
    pub health_score: f64,
    pub velocity_consistency: f64,
    pub estimation_accuracy: f64,
    pub completion_rate: f64,
    /// Share of stories that ran without blockers
    pub blocker_impact: f64,
}

/// Score one sprint against the team's full velocity history
pub fn score_sprint_health(
    sprint: &Sprint,
    history: &[Sprint],
    config: &HealthConfig,
) -> HealthAssessment {
    let vels = velocities(history);
    let avg = stats::mean(&vels);
    let consistency = if avg > 0.0 {
        let cv = stats::std_dev(&vels) / avg;
        (1.0 - cv.min(1.0)).max(0.0)
    } else {
        0.0
    };

    let accuracy = sprint
        .avg_estimation_accuracy
        .unwrap_or(config.default_estimation_accuracy);

    let completion = sprint.completion_rate().min(1.0);

    let blocker_rate = if sprint.stories_count > 0 {
        sprint.stories_with_blockers.unwrap_or(0) as f64 / sprint.stories_count as f64
    } else {
        0.0
    };
    let unblocked = 1.0 - blocker_rate;

    let w = &config.weights;
    let health_score = 100.0
        * (w.velocity_consistency * consistency
            + w.estimation_accuracy * accuracy
            + w.completion_rate * completion
            + w.blocker_impact * unblocked);

    tracing::debug!(
        sprint = sprint.sprint_number,
        health_score,
        consistency,
        completion,
        blocker_rate,
        "sprint health"
    );

    HealthAssessment {
        health_score,
        velocity_consistency: consistency * 100.0,
        estimation_accuracy: accuracy * 100.0,
        completion_rate: completion * 100.0,
        blocker_impact: unblocked * 100.0,
    }
}
