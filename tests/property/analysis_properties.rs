use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use sprintlens::analysis::{
    predict_completion_probability, priority_score, quadrant, score_initiative_risk,
    simulate_capacity_allocation, Quadrant, RiskLevel,
};
use sprintlens::core::config::{PriorityConfig, QuadrantCutoffs, RiskConfig};
use sprintlens::entities::{Initiative, InitiativeStatus, RoiEstimate};

fn arb_status() -> impl Strategy<Value = InitiativeStatus> {
    prop_oneof![
        Just(InitiativeStatus::Backlog),
        Just(InitiativeStatus::Active),
        Just(InitiativeStatus::Completed),
        Just(InitiativeStatus::Deprioritized),
    ]
}

fn arb_roi() -> impl Strategy<Value = Option<RoiEstimate>> {
    prop_oneof![
        Just(None),
        Just(Some(RoiEstimate::High)),
        Just(Some(RoiEstimate::Medium)),
        Just(Some(RoiEstimate::Low)),
    ]
}

fn arb_category() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("Revenue Growth".to_string()),
        Just("Customer Experience".to_string()),
        Just("Cost Reduction".to_string()),
        Just("Technical Excellence".to_string()),
        Just("Process Improvement".to_string()),
        Just("Other".to_string()),
    ]
}

prop_compose! {
    fn arb_initiative()(
        id in 0u32..1000,
        impact in 1u32..=10,
        effort in 0u32..=10,
        total in 0.0f64..200.0,
        done_share in 0.0f64..1.2,
        status in arb_status(),
        roi in arb_roi(),
        category in arb_category(),
        target in proptest::option::of(1u32..40),
    ) -> Initiative {
        let id = format!("INIT-{id:03}");
        let mut init = Initiative::new(id, impact as f64, effort as f64, total);
        init.completed_story_points = total * done_share;
        init.status = status;
        init.roi_estimate = roi;
        init.strategic_category = category;
        init.target_sprint = target;
        init
    }
}

// ── Monte Carlo ──────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn probability_non_increasing_in_commitment(
        history in prop::collection::vec(0.0f64..80.0, 2..12),
        low in 0.0f64..100.0,
        step in 0.0f64..50.0,
        seed in any::<u64>(),
    ) {
        let mut rng = StdRng::seed_from_u64(seed);
        let a = predict_completion_probability(low, &history, 300, &mut rng);
        let mut rng = StdRng::seed_from_u64(seed);
        let b = predict_completion_probability(low + step, &history, 300, &mut rng);
        prop_assert!(b.probability <= a.probability);
    }

    #[test]
    fn sample_has_requested_length_and_is_non_negative(
        history in prop::collection::vec(0.0f64..80.0, 2..12),
        committed in 0.0f64..100.0,
        n in 1usize..500,
        seed in any::<u64>(),
    ) {
        let mut rng = StdRng::seed_from_u64(seed);
        let result = predict_completion_probability(committed, &history, n, &mut rng);
        prop_assert_eq!(result.simulated_velocities.len(), n);
        prop_assert!(result.simulated_velocities.iter().all(|&v| v >= 0.0));
        prop_assert!((0.0..=1.0).contains(&result.probability));
        prop_assert!(result.percentile_10 <= result.median_velocity);
        prop_assert!(result.median_velocity <= result.percentile_90);
    }
}

// ── Risk ─────────────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn terminal_initiatives_carry_no_risk(
        mut init in arb_initiative(),
        terminal in prop_oneof![
            Just(InitiativeStatus::Completed),
            Just(InitiativeStatus::Deprioritized),
        ],
        current in 1u32..30,
        avg in 0.0f64..80.0,
        std in 0.0f64..20.0,
        util in 0.0f64..1.5,
    ) {
        init.status = terminal;
        let risk = score_initiative_risk(&init, current, avg, std, util, &RiskConfig::default());
        prop_assert_eq!(risk.risk_score, 0.0);
        prop_assert_eq!(risk.risk_level, RiskLevel::None);
        prop_assert!(risk.factors.is_none());
    }

    #[test]
    fn factors_and_composite_stay_in_unit_interval(
        init in arb_initiative(),
        current in 1u32..30,
        avg in 0.0f64..80.0,
        std in 0.0f64..40.0,
        util in 0.0f64..1.5,
    ) {
        let risk = score_initiative_risk(&init, current, avg, std, util, &RiskConfig::default());
        prop_assert!((0.0..=1.0).contains(&risk.risk_score));
        prop_assert!(risk.sprints_available >= 1);
        if let Some(f) = risk.factors {
            let factors = [f.capacity_risk, f.volatility_risk, f.utilization_risk, f.progress_risk];
            for factor in factors {
                prop_assert!((0.0..=1.0).contains(&factor));
            }
        }
    }
}

// ── Prioritization ───────────────────────────────────────────────────────

proptest! {
    #[test]
    fn priority_is_zero_exactly_when_effort_is_zero(init in arb_initiative()) {
        let score = priority_score(&init, &PriorityConfig::default());
        prop_assert!(score >= 0.0);
        prop_assert_eq!(score == 0.0, init.effort_score == 0.0);
    }

    #[test]
    fn quadrant_is_total_with_low_side_boundaries(
        impact in 0.0f64..=10.0,
        effort in 0.0f64..=10.0,
    ) {
        let init = Initiative::new("INIT-001", impact, effort, 10.0);
        let q = quadrant(&init, &QuadrantCutoffs::default());
        let expected = match (impact > 6.0, effort > 5.0) {
            (true, false) => Quadrant::QuickWins,
            (true, true) => Quadrant::MajorProjects,
            (false, false) => Quadrant::FillIns,
            (false, true) => Quadrant::TimeSinks,
        };
        prop_assert_eq!(q, expected);
    }
}

// ── Capacity allocation ──────────────────────────────────────────────────

proptest! {
    #[test]
    fn allocation_never_exceeds_available(
        initiatives in prop::collection::vec(arb_initiative(), 0..15),
        velocity in 0.0f64..80.0,
        sprints in 0u32..6,
    ) {
        let config = PriorityConfig::default();
        let plan = simulate_capacity_allocation(&initiatives, velocity, sprints, &config);
        prop_assert!(plan.capacity_used <= plan.available_capacity + 1e-9);

        let allocated: f64 = plan.allocations.iter().map(|a| a.points_allocated).sum();
        prop_assert!((allocated - plan.capacity_used).abs() < 1e-6);
        prop_assert!(plan.allocations.iter().filter(|a| !a.fits_in_capacity).count() <= 1);
        if let Some(last) = plan.allocations.last() {
            let head = &plan.allocations[..plan.allocations.len() - 1];
            prop_assert!(head.iter().all(|a| a.fits_in_capacity));
            prop_assert!(last.points_allocated >= 0.0);
        }
    }

    #[test]
    fn capacity_used_grows_with_available(
        initiatives in prop::collection::vec(arb_initiative(), 0..15),
        velocity in 0.0f64..60.0,
        extra in 0.0f64..40.0,
    ) {
        let config = PriorityConfig::default();
        let small = simulate_capacity_allocation(&initiatives, velocity, 3, &config);
        let large = simulate_capacity_allocation(&initiatives, velocity + extra, 3, &config);
        prop_assert!(large.capacity_used + 1e-9 >= small.capacity_used);
    }
}
