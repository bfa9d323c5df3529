//! Input record types
//!
//! The analytics consume four record kinds, all supplied already parsed by
//! the data-access layer:
//!
//! - [`Sprint`] - committed/completed points and capacity per iteration
//! - [`Story`] - estimate, actual, status, cycle time, and blockers
//! - [`Initiative`] - portfolio effort scored by impact and effort
//! - [`TeamMember`] - per-person sustainable capacity

pub mod initiative;
pub mod sprint;
pub mod story;
pub mod team;

pub use initiative::{Initiative, InitiativeStatus, RoiEstimate, REVENUE_GROWTH};
pub use sprint::{trailing_velocities, validate_history, velocities, Sprint};
pub use story::{
    completed_stories, initiative_stories, sprint_stories, Story, StoryStatus, StoryType,
};
pub use team::{find_member, TeamMember};
