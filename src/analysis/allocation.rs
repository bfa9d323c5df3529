//! Greedy capacity allocation over upcoming sprints
//!
//! Pending initiatives are walked in priority order and funded from the
//! available velocity budget. The first initiative that does not fit takes
//! whatever budget is left and the walk stops there; later initiatives are
//! not considered even if they would fit.

use serde::Serialize;

use crate::analysis::priority::priority_score;
use crate::core::config::PriorityConfig;
use crate::core::stats;
use crate::entities::{trailing_velocities, Initiative, Sprint};

/// Sprints averaged when deriving velocity from history
pub const HISTORY_WINDOW: usize = 3;

/// Points given to one initiative
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Allocation {
    pub initiative_id: String,
    pub name: String,
    pub points_allocated: f64,
    pub priority_score: f64,
    /// False for the single partially funded initiative
    pub fits_in_capacity: bool,
}

/// Outcome of an allocation run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllocationPlan {
    pub available_capacity: f64,
    pub capacity_used: f64,
    /// Used over available, as a percentage (0 with no capacity)
    pub capacity_utilization: f64,
    pub allocations: Vec<Allocation>,
    pub initiatives_fully_allocated: usize,
}

/// Fund active and backlog initiatives from `recent_velocity_avg * future_sprints`
pub fn simulate_capacity_allocation(
    initiatives: &[Initiative],
    recent_velocity_avg: f64,
    future_sprints: u32,
    config: &PriorityConfig,
) -> AllocationPlan {
    let available_capacity = (recent_velocity_avg * future_sprints as f64).max(0.0);

    let mut pending: Vec<(&Initiative, f64)> = initiatives
        .iter()
        .filter(|i| i.status.is_pending())
        .map(|i| (i, priority_score(i, config)))
        .collect();
    pending.sort_by(|a, b| b.1.total_cmp(&a.1));

    let mut allocations = Vec::new();
    let mut capacity_used = 0.0;

    for (init, score) in pending {
        let remaining = init.remaining_points();

        if capacity_used + remaining <= available_capacity {
            allocations.push(Allocation {
                initiative_id: init.initiative_id.clone(),
                name: init.name.clone(),
                points_allocated: remaining,
                priority_score: score,
                fits_in_capacity: true,
            });
            capacity_used += remaining;
            continue;
        }

        let leftover = available_capacity - capacity_used;
        if leftover > 0.0 {
            allocations.push(Allocation {
                initiative_id: init.initiative_id.clone(),
                name: init.name.clone(),
                points_allocated: leftover,
                priority_score: score,
                fits_in_capacity: false,
            });
            capacity_used = available_capacity;
        }
        break;
    }

    let capacity_utilization = if available_capacity > 0.0 {
        capacity_used / available_capacity * 100.0
    } else {
        0.0
    };
    let initiatives_fully_allocated = allocations.iter().filter(|a| a.fits_in_capacity).count();

    tracing::debug!(
        available_capacity,
        capacity_used,
        funded = allocations.len(),
        "capacity allocation"
    );

    AllocationPlan {
        available_capacity,
        capacity_used,
        capacity_utilization,
        allocations,
        initiatives_fully_allocated,
    }
}

/// Allocate using the mean velocity of the last three sprints
pub fn allocate_from_history(
    initiatives: &[Initiative],
    history: &[Sprint],
    future_sprints: u32,
    config: &PriorityConfig,
) -> AllocationPlan {
    let recent = trailing_velocities(history, HISTORY_WINDOW);
    if recent.is_empty() {
        tracing::warn!("no sprint history, allocating against zero capacity");
    }
    simulate_capacity_allocation(initiatives, stats::mean(&recent), future_sprints, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::InitiativeStatus;

    fn pending(id: &str, impact: f64, effort: f64, total: f64) -> Initiative {
        let mut i = Initiative::new(id, impact, effort, total);
        i.status = InitiativeStatus::Active;
        i
    }

    #[test]
    fn test_everything_fits() {
        let initiatives = vec![pending("A", 9.0, 3.0, 30.0), pending("B", 5.0, 5.0, 20.0)];
        let plan = simulate_capacity_allocation(&initiatives, 40.0, 3, &PriorityConfig::default());
        assert_eq!(plan.available_capacity, 120.0);
        assert_eq!(plan.capacity_used, 50.0);
        assert_eq!(plan.initiatives_fully_allocated, 2);
        assert!((plan.capacity_utilization - 50.0 / 120.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_first_misfit_takes_leftover_and_stops() {
        let initiatives = vec![
            pending("HIGH", 9.0, 1.0, 50.0),
            pending("MID", 8.0, 2.0, 60.0),
            pending("SMALL", 1.0, 5.0, 5.0),
        ];
        let plan = simulate_capacity_allocation(&initiatives, 30.0, 3, &PriorityConfig::default());

        assert_eq!(plan.allocations.len(), 2);
        assert_eq!(plan.allocations[0].initiative_id, "HIGH");
        assert_eq!(plan.allocations[1].initiative_id, "MID");
        assert_eq!(plan.allocations[1].points_allocated, 40.0);
        assert!(!plan.allocations[1].fits_in_capacity);
        assert_eq!(plan.capacity_used, 90.0);
        assert_eq!(plan.initiatives_fully_allocated, 1);
    }

    #[test]
    fn test_exhausted_budget_records_no_partial() {
        let initiatives = vec![pending("A", 9.0, 1.0, 90.0), pending("B", 8.0, 2.0, 10.0)];
        let plan = simulate_capacity_allocation(&initiatives, 30.0, 3, &PriorityConfig::default());
        assert_eq!(plan.allocations.len(), 1);
        assert_eq!(plan.capacity_used, 90.0);
    }

    #[test]
    fn test_terminal_and_overdelivered_initiatives() {
        let mut done = pending("DONE", 9.0, 1.0, 40.0);
        done.status = InitiativeStatus::Completed;
        let mut over = pending("OVER", 9.0, 2.0, 10.0);
        over.completed_story_points = 15.0;
        let plan = simulate_capacity_allocation(&[done, over], 10.0, 1, &PriorityConfig::default());
        assert_eq!(plan.allocations.len(), 1);
        assert_eq!(plan.allocations[0].points_allocated, 0.0);
        assert!(plan.allocations[0].fits_in_capacity);
    }

    #[test]
    fn test_allocate_from_history_uses_last_three() {
        let history: Vec<Sprint> = [10.0, 30.0, 30.0, 30.0]
            .iter()
            .enumerate()
            .map(|(n, &v)| Sprint::new(n as u32 + 1, v, v, 40.0))
            .collect();
        let config = PriorityConfig::default();
        let plan = allocate_from_history(&[pending("A", 5.0, 5.0, 200.0)], &history, 3, &config);
        assert_eq!(plan.available_capacity, 90.0);
        assert_eq!(plan.capacity_utilization, 100.0);

        let empty = allocate_from_history(&[pending("A", 5.0, 5.0, 10.0)], &[], 3, &config);
        assert_eq!(empty.available_capacity, 0.0);
        assert_eq!(empty.capacity_utilization, 0.0);
    }

    #[test]
    fn test_equal_priority_funded_in_input_order() {
        let initiatives = vec![
            pending("SECOND-ID", 6.0, 3.0, 50.0),
            pending("FIRST-ID", 6.0, 3.0, 50.0),
        ];
        let plan = simulate_capacity_allocation(&initiatives, 20.0, 4, &PriorityConfig::default());

        assert_eq!(plan.allocations.len(), 2);
        assert_eq!(plan.allocations[0].priority_score, plan.allocations[1].priority_score);
        assert_eq!(plan.allocations[0].initiative_id, "SECOND-ID");
        assert!(plan.allocations[0].fits_in_capacity);
        assert_eq!(plan.allocations[1].initiative_id, "FIRST-ID");
        assert_eq!(plan.allocations[1].points_allocated, 30.0);
        assert!(!plan.allocations[1].fits_in_capacity);
    }
}
