//! Priority policy tests
//!
//! FIFO ranks purely by arrival; SMART blends wait, tier, job length and
//! fairness with configurable weights.

use barista_simulator_core_rs::arrivals::ArrivalMode;
use barista_simulator_core_rs::dispatch::Dispatcher;
use barista_simulator_core_rs::models::{CustomerType, DrinkType, Order, SimulationState, Urgency};
use barista_simulator_core_rs::policy::{
    build_policy, compare_ranked, priority_reason, FifoPolicy, PolicySettings, PriorityPolicy, QueueMode,
    SmartPolicy, SmartWeights, UrgencyThresholds,
};
use barista_simulator_core_rs::pool::WorkerPool;
use std::cmp::Ordering;

fn order(id: u64, drink: DrinkType, customer: CustomerType, arrival: u32) -> Order {
    Order::new(id, drink, customer, arrival)
}

// ============================================================================
// FIFO
// ============================================================================

#[test]
fn test_fifo_ignores_tier_and_drink() {
    let policy = FifoPolicy::default();
    let old_slow_new = order(1, DrinkType::Mocha, CustomerType::New, 0);
    let young_fast_gold = order(2, DrinkType::ColdBrew, CustomerType::Gold, 1);

    let a = policy.score(&old_slow_new, 5).value;
    let b = policy.score(&young_fast_gold, 5).value;
    assert_eq!(compare_ranked(&old_slow_new, a, &young_fast_gold, b), Ordering::Less);
}

#[test]
fn test_fifo_same_minute_falls_back_to_id() {
    let policy = FifoPolicy::default();
    let first = order(3, DrinkType::Latte, CustomerType::Regular, 4);
    let second = order(4, DrinkType::ColdBrew, CustomerType::Gold, 4);

    let a = policy.score(&first, 4).value;
    let b = policy.score(&second, 4).value;
    assert_eq!(a, b);
    assert_eq!(compare_ranked(&first, a, &second, b), Ordering::Less);
}

#[test]
fn test_fifo_reports_urgency() {
    let policy = FifoPolicy::new(UrgencyThresholds::default());
    let o = order(1, DrinkType::Latte, CustomerType::Regular, 0);

    assert_eq!(policy.score(&o, 3).urgency, Urgency::Normal);
    assert_eq!(policy.score(&o, 6).urgency, Urgency::Elevated);
    assert_eq!(policy.score(&o, 9).urgency, Urgency::Urgent);
}

// ============================================================================
// SMART
// ============================================================================

#[test]
fn test_smart_components_at_arrival() {
    let policy = SmartPolicy::new(PolicySettings::default());
    let c = policy.components(&order(1, DrinkType::Cappuccino, CustomerType::Regular, 0), 0);

    assert_eq!(c.wait, 0.0);
    assert_eq!(c.tier, 0.5);
    assert_eq!(c.short_job, 0.25);
    assert_eq!(c.fairness, 0.0);
}

#[test]
fn test_smart_default_score_value() {
    let policy = SmartPolicy::new(PolicySettings::default());
    // Gold espresso after 5 minutes: 0.40*0.5 + 0.25*1.0 + 0.10*0.5 + 0.25*0
    let score = policy
        .score(&order(1, DrinkType::Espresso, CustomerType::Gold, 0), 5)
        .value;
    assert!((score - 0.50).abs() < 1e-12, "score was {}", score);
}

#[test]
fn test_smart_quick_gold_beats_fresh_mocha() {
    let policy = SmartPolicy::new(PolicySettings::default());
    let waiting = order(1, DrinkType::Mocha, CustomerType::New, 0);
    let fresh_gold = order(2, DrinkType::ColdBrew, CustomerType::Gold, 8);

    // 0.40*0.8 + 0.10/6 = 0.3367 vs 0.25 + 0.10 = 0.35
    assert!(policy.score(&waiting, 8).value < policy.score(&fresh_gold, 8).value);
    // 0.40 + 0.10/6 = 0.4167 vs 0.40*0.4 + 0.35 = 0.51
    assert!(policy.score(&waiting, 12).value < policy.score(&fresh_gold, 12).value);
}

#[test]
fn test_skips_feed_back_into_smart_score() {
    let settings = PolicySettings::default();
    let dispatcher = Dispatcher::new(QueueMode::Smart, settings);
    let mut state = SimulationState::new(WorkerPool::with_default_names(1), QueueMode::Smart, ArrivalMode::Manual);
    state.enqueue(DrinkType::Mocha, CustomerType::New);
    state.enqueue(DrinkType::ColdBrew, CustomerType::Gold);

    let before = dispatcher.score(&state.pending()[0], 0).value;
    let outcome = dispatcher.assign(&mut state).unwrap();
    assert_eq!(outcome.assignments[0].order_id, 2);

    let mocha = &state.pending()[0];
    assert_eq!(mocha.people_served_ahead(), 1);
    let after = dispatcher.score(mocha, 0).value;
    // One skip out of a tolerance of three, weighted 0.25
    assert!((after - before - 0.25 / 3.0).abs() < 1e-12);
    assert_eq!(priority_reason(mocha, 0, &settings), "Standard priority | Skipped 1 times");
}

#[test]
fn test_smart_weights_are_tunable() {
    let settings = PolicySettings {
        weights: SmartWeights {
            wait: 0.0,
            tier: 0.0,
            short_job: 1.0,
            fairness: 0.0,
        },
        ..PolicySettings::default()
    };
    let policy = build_policy(QueueMode::Smart, &settings);

    let quick = order(1, DrinkType::ColdBrew, CustomerType::New, 0);
    let gold_slow = order(2, DrinkType::Mocha, CustomerType::Gold, 0);
    assert_eq!(policy.score(&quick, 9).value, 1.0);
    assert!(policy.score(&gold_slow, 9).value < 0.2);
}

#[test]
fn test_build_policy_matches_mode() {
    let settings = PolicySettings::default();
    assert_eq!(build_policy(QueueMode::Fifo, &settings).mode(), QueueMode::Fifo);
    assert_eq!(build_policy(QueueMode::Smart, &settings).mode(), QueueMode::Smart);
}

#[test]
fn test_compare_ranked_handles_equal_everything() {
    let a = order(9, DrinkType::Latte, CustomerType::Regular, 2);
    assert_eq!(compare_ranked(&a, 0.3, &a, 0.3), Ordering::Equal);
}

// ============================================================================
// Priority reasons
// ============================================================================

#[test]
fn test_priority_reason_labels() {
    let settings = PolicySettings::default();

    let gold = order(1, DrinkType::Latte, CustomerType::Gold, 0);
    assert_eq!(priority_reason(&gold, 1, &settings), "Gold member");

    let quick = order(2, DrinkType::Espresso, CustomerType::Regular, 0);
    assert_eq!(priority_reason(&quick, 1, &settings), "Quick order");

    let standard = order(3, DrinkType::Mocha, CustomerType::New, 0);
    assert_eq!(priority_reason(&standard, 1, &settings), "Standard priority");

    assert_eq!(
        priority_reason(&standard, 6, &settings),
        "Approaching timeout - 2 min remaining"
    );
    assert_eq!(priority_reason(&gold, 9, &settings), "Urgent - waiting 9 min");
}
