//! Delivery analytics
//!
//! Every function is a pure computation over immutable record snapshots.
//! Insufficient history and zero denominators degrade to documented defaults
//! instead of failing.
//!
//! - [`forecast`] - Monte Carlo completion probability and velocity trends
//! - [`health`] - composite sprint health
//! - [`risk`] - initiative delivery risk
//! - [`priority`] - priority scores, quadrants and portfolio views
//! - [`allocation`] - greedy capacity allocation
//! - [`metrics`] - delivery KPIs over sprints and stories
//! - [`aggregate`] - group-by rollups
//! - [`recommend`] - advisory records composed from the above

pub mod aggregate;
pub mod allocation;
pub mod forecast;
pub mod health;
pub mod metrics;
pub mod priority;
pub mod recommend;
pub mod risk;

pub use allocation::{
    allocate_from_history, simulate_capacity_allocation, Allocation, AllocationPlan,
};
pub use forecast::{
    distribution_chart, forecast_velocity, predict_completion_probability, DistributionChart,
    ForecastResult, Forecaster, VelocityForecast,
};
pub use health::{score_sprint_health, HealthAssessment};
pub use priority::{
    intake_funnel, portfolio_composition, portfolio_health, prioritize, priority_score, quadrant,
    quick_wins, tier, time_sinks, FunnelStage, PortfolioHealth, PriorityRecord, PriorityTier,
    Quadrant, QuadrantSummary,
};
pub use recommend::{
    generate_recommendations, portfolio_recommendations, predictive_recommendations, Priority,
    Recommendation, RecommendationCategory,
};
pub use risk::{
    assess_all_initiatives_risk, score_initiative_risk, RiskAssessment, RiskFactors, RiskLevel,
};
