//! Story record - a unit of work with an estimate and an actual

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::record::Record;

/// Kind of work a story represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[derive(Default)]
pub enum StoryType {
    #[default]
    Feature,
    Bug,
    #[serde(rename = "Technical Debt")]
    TechnicalDebt,
    Spike,
}

impl std::fmt::Display for StoryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoryType::Feature => write!(f, "Feature"),
            StoryType::Bug => write!(f, "Bug"),
            StoryType::TechnicalDebt => write!(f, "Technical Debt"),
            StoryType::Spike => write!(f, "Spike"),
        }
    }
}

/// Where a story ended up at the close of its sprint
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StoryStatus {
    Completed,
    #[serde(rename = "Carried Over")]
    CarriedOver,
    Incomplete,
    Descoped,
}

impl std::fmt::Display for StoryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoryStatus::Completed => write!(f, "Completed"),
            StoryStatus::CarriedOver => write!(f, "Carried Over"),
            StoryStatus::Incomplete => write!(f, "Incomplete"),
            StoryStatus::Descoped => write!(f, "Descoped"),
        }
    }
}

/// A story delivered (or not) within a sprint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    pub story_id: String,

    /// Sprint the story was planned into
    pub sprint_number: u32,

    /// Estimate at planning
    pub story_points: f64,

    /// Actual size once done
    pub final_story_points: f64,

    #[serde(default)]
    pub story_type: StoryType,

    pub status: StoryStatus,

    #[serde(default)]
    pub cycle_time_days: f64,

    #[serde(default)]
    pub num_blockers: u32,

    #[serde(default)]
    pub blocker_duration_days: f64,

    pub assignee_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initiative_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
}

impl Record for Story {
    const KIND: &'static str = "Story";

    const REQUIRED_FIELDS: &'static [&'static str] = &[
        "story_id",
        "sprint_number",
        "story_points",
        "final_story_points",
        "status",
        "assignee_id",
    ];
}

impl Story {
    /// Relative estimation error: |estimate - actual| / estimate
    ///
    /// Returns 1.0 when the estimate is zero.
    pub fn estimation_accuracy(&self) -> f64 {
        if self.story_points > 0.0 {
            (self.story_points - self.final_story_points).abs() / self.story_points
        } else {
            1.0
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == StoryStatus::Completed
    }

    pub fn is_blocked(&self) -> bool {
        self.num_blockers > 0
    }
}

/// Stories planned into one sprint
pub fn sprint_stories(stories: &[Story], sprint_number: u32) -> Vec<&Story> {
    stories
        .iter()
        .filter(|s| s.sprint_number == sprint_number)
        .collect()
}

/// Stories attached to one initiative
pub fn initiative_stories<'a>(stories: &'a [Story], initiative_id: &str) -> Vec<&'a Story> {
    stories
        .iter()
        .filter(|s| s.initiative_id.as_deref() == Some(initiative_id))
        .collect()
}

/// Completed stories only
pub fn completed_stories(stories: &[Story]) -> Vec<&Story> {
    stories.iter().filter(|s| s.is_completed()).collect()
}
