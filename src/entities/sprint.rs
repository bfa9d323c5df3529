//! Sprint record - one fixed-length delivery iteration

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::error::{Error, Result};
use crate::core::record::Record;

/// A completed or in-flight sprint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sprint {
    /// Positive, strictly increasing across a history
    pub sprint_number: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,

    /// Points the team committed to at planning
    pub committed_points: f64,

    /// Points delivered; this is the sprint's velocity
    pub completed_points: f64,

    /// Points the team could sustain this sprint (> 0)
    pub team_capacity: f64,

    #[serde(default)]
    pub stories_count: u32,

    #[serde(default)]
    pub stories_completed: u32,

    #[serde(default)]
    pub stories_carried_over: u32,

    /// Mean story estimation accuracy, when aggregated from stories
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_estimation_accuracy: Option<f64>,

    /// Stories that hit at least one blocker, when aggregated from stories
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stories_with_blockers: Option<u32>,
}

impl Record for Sprint {
    const KIND: &'static str = "Sprint";

    const REQUIRED_FIELDS: &'static [&'static str] = &[
        "sprint_number",
        "committed_points",
        "completed_points",
        "team_capacity",
    ];
}

impl Sprint {
    /// Create a sprint with the required figures
    pub fn new(
        sprint_number: u32,
        committed_points: f64,
        completed_points: f64,
        team_capacity: f64,
    ) -> Self {
        Self {
            sprint_number,
            start_date: None,
            end_date: None,
            committed_points,
            completed_points,
            team_capacity,
            stories_count: 0,
            stories_completed: 0,
            stories_carried_over: 0,
            avg_estimation_accuracy: None,
            stories_with_blockers: None,
        }
    }

    /// Points completed in the sprint
    pub fn velocity(&self) -> f64 {
        self.completed_points
    }

    /// Completed over committed; 0 when nothing was committed
    ///
    /// Not capped: over-delivery yields a rate above 1.0.
    pub fn completion_rate(&self) -> f64 {
        if self.committed_points > 0.0 {
            self.completed_points / self.committed_points
        } else {
            0.0
        }
    }

    /// Completed points over team capacity; 0 when capacity is not positive
    pub fn utilization(&self) -> f64 {
        if self.team_capacity > 0.0 {
            self.completed_points / self.team_capacity
        } else {
            0.0
        }
    }

    /// Copy of this sprint carrying story-level aggregates
    pub fn with_story_aggregates(
        &self,
        stories_count: u32,
        avg_estimation_accuracy: f64,
        stories_with_blockers: u32,
    ) -> Sprint {
        Sprint {
            stories_count,
            avg_estimation_accuracy: Some(avg_estimation_accuracy),
            stories_with_blockers: Some(stories_with_blockers),
            ..self.clone()
        }
    }
}

/// Velocities of a sprint history, in order
pub fn velocities(history: &[Sprint]) -> Vec<f64> {
    history.iter().map(Sprint::velocity).collect()
}

/// Velocities of the last `n` sprints of a history
pub fn trailing_velocities(history: &[Sprint], n: usize) -> Vec<f64> {
    let start = history.len().saturating_sub(n);
    velocities(&history[start..])
}

/// Check that a history is usable for trend analysis
///
/// Sprint numbers must be positive and strictly increasing, and every sprint
/// must have positive team capacity.
pub fn validate_history(history: &[Sprint]) -> Result<()> {
    let mut previous: Option<u32> = None;

    for sprint in history {
        if sprint.sprint_number == 0 {
            return Err(Error::InvalidField {
                record: Sprint::KIND,
                message: "sprint_number must be positive".to_string(),
            });
        }
        if let Some(prev) = previous {
            if sprint.sprint_number <= prev {
                return Err(Error::NonIncreasingSprint {
                    previous: prev,
                    current: sprint.sprint_number,
                });
            }
        }
        if !(sprint.team_capacity > 0.0) {
            return Err(Error::InvalidCapacity {
                sprint_number: sprint.sprint_number,
                capacity: sprint.team_capacity,
            });
        }
        previous = Some(sprint.sprint_number);
    }

    Ok(())
}
