//! Initiative record - a portfolio-level effort spanning several sprints

use serde::{Deserialize, Serialize};

use crate::core::record::Record;

/// Lifecycle state of an initiative
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[derive(Default)]
pub enum InitiativeStatus {
    #[default]
    Backlog,
    Active,
    Completed,
    Deprioritized,
}

impl InitiativeStatus {
    /// Completed and Deprioritized initiatives carry no delivery risk
    pub fn is_terminal(self) -> bool {
        matches!(self, InitiativeStatus::Completed | InitiativeStatus::Deprioritized)
    }

    /// Active and Backlog initiatives still compete for capacity
    pub fn is_pending(self) -> bool {
        matches!(self, InitiativeStatus::Active | InitiativeStatus::Backlog)
    }
}

impl std::fmt::Display for InitiativeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InitiativeStatus::Backlog => write!(f, "Backlog"),
            InitiativeStatus::Active => write!(f, "Active"),
            InitiativeStatus::Completed => write!(f, "Completed"),
            InitiativeStatus::Deprioritized => write!(f, "Deprioritized"),
        }
    }
}

/// Rough return-on-investment estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoiEstimate {
    High,
    Medium,
    Low,
}

impl std::fmt::Display for RoiEstimate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoiEstimate::High => write!(f, "High"),
            RoiEstimate::Medium => write!(f, "Medium"),
            RoiEstimate::Low => write!(f, "Low"),
        }
    }
}

/// Strategic category that receives the heaviest priority weight
pub const REVENUE_GROWTH: &str = "Revenue Growth";

/// A portfolio initiative
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Initiative {
    pub initiative_id: String,

    #[serde(default)]
    pub name: String,

    /// Business impact, 1-10
    pub impact_score: f64,

    /// Delivery effort, 1-10
    pub effort_score: f64,

    /// Free-text category, weighted through the priority table
    #[serde(default)]
    pub strategic_category: String,

    #[serde(default)]
    pub status: InitiativeStatus,

    pub total_story_points: f64,

    #[serde(default)]
    pub completed_story_points: f64,

    /// Sprint the initiative should land in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_sprint: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roi_estimate: Option<RoiEstimate>,
}

impl Record for Initiative {
    const KIND: &'static str = "Initiative";

    const REQUIRED_FIELDS: &'static [&'static str] = &[
        "initiative_id",
        "impact_score",
        "effort_score",
        "total_story_points",
    ];
}

impl Initiative {
    /// Create a backlog initiative with the required figures
    pub fn new(
        initiative_id: impl Into<String>,
        impact_score: f64,
        effort_score: f64,
        total_story_points: f64,
    ) -> Self {
        let initiative_id = initiative_id.into();
        Self {
            name: initiative_id.clone(),
            initiative_id,
            impact_score,
            effort_score,
            strategic_category: String::new(),
            status: InitiativeStatus::Backlog,
            total_story_points,
            completed_story_points: 0.0,
            target_sprint: None,
            roi_estimate: None,
        }
    }

    /// Work left, never negative
    pub fn remaining_points(&self) -> f64 {
        (self.total_story_points - self.completed_story_points).max(0.0)
    }

    /// Completed share of total points, `None` when the total is zero
    pub fn completion_ratio(&self) -> Option<f64> {
        if self.total_story_points > 0.0 {
            Some(self.completed_story_points / self.total_story_points)
        } else {
            None
        }
    }
}
