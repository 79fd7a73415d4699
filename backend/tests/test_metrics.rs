//! Metrics and analytics driven through a live clock

use barista_simulator_core_rs::models::{CustomerType, DrinkType};
use barista_simulator_core_rs::policy::QueueMode;
use barista_simulator_core_rs::{EngineConfig, SimulationClock};

fn two_worker_fifo() -> SimulationClock {
    SimulationClock::new(EngineConfig {
        worker_count: 2,
        initial_mode: QueueMode::Fifo,
        ..EngineConfig::default()
    })
    .unwrap()
}

#[test]
fn test_empty_clock_reports_zeroes() {
    let clock = two_worker_fifo();
    let metrics = clock.metrics();

    assert_eq!(metrics.total_created, 0);
    assert_eq!(metrics.complaint_rate, 0.0);
    assert_eq!(metrics.average_wait_minutes, 0.0);
    assert_eq!(metrics.fairness_violation_rate, 0.0);
    assert_eq!(metrics.justified_skip_share, 0.0);
    assert!(!metrics.auto_arrivals);
    assert_eq!(metrics.arrival_rate, None);

    let analytics = clock.analytics();
    assert_eq!(analytics.workload_balance, 100.0);
    assert_eq!(analytics.total_processed, 0);
    assert_eq!(analytics.complaints_by_customer.len(), 3);
    assert_eq!(analytics.rolling.samples, 0);
}

#[test]
fn test_averages_and_worker_breakdown() {
    let mut clock = two_worker_fifo();
    clock.create_order(DrinkType::Mocha, Some(CustomerType::Regular));
    clock.create_order(DrinkType::Espresso, Some(CustomerType::Regular));
    clock.create_order(DrinkType::ColdBrew, Some(CustomerType::Regular));
    clock.run_minutes(7).unwrap();

    // Mocha 0..6 on barista 0; espresso 0..2 then cold brew 2..3 on barista 1
    let metrics = clock.metrics();
    assert_eq!(metrics.completed, 3);
    assert!((metrics.average_wait_minutes - 2.0 / 3.0).abs() < 1e-12);
    assert!((metrics.average_completion_minutes - 11.0 / 3.0).abs() < 1e-12);
    assert_eq!(metrics.max_wait_minutes, 2);

    let analytics = clock.analytics();
    assert_eq!(analytics.total_processed, 3);
    assert_eq!(analytics.rolling.samples, 3);

    let workers = &analytics.workers;
    assert_eq!(workers[0].total_work_minutes, 6);
    assert_eq!(workers[1].total_work_minutes, 3);
    assert_eq!(workers[1].orders_completed, 2);
    assert_eq!(workers[1].average_minutes_per_order, 1.5);
    assert!(workers[0].overloaded);
    assert!(workers[1].underutilized);

    // mean 4.5, std 1.5
    assert!((analytics.workload_balance - (100.0 - 100.0 / 3.0)).abs() < 1e-9);
}

#[test]
fn test_snapshot_tracks_live_queue_and_pool() {
    let mut clock = two_worker_fifo();
    clock.toggle_auto_arrivals(true, Some(0.8)).unwrap();
    for _ in 0..4 {
        clock.create_order(DrinkType::Latte, Some(CustomerType::Gold));
    }
    clock.advance_one_minute().unwrap();

    let metrics = clock.metrics();
    assert!(metrics.auto_arrivals);
    assert_eq!(metrics.arrival_rate, Some(0.8));
    assert_eq!(metrics.in_service, 2);
    assert_eq!(metrics.queue_length, clock.state().queue_len());
    assert_eq!(metrics.current_minute, 1);
}

#[test]
fn test_complaints_split_by_customer() {
    let mut clock = SimulationClock::new(EngineConfig {
        worker_count: 1,
        initial_mode: QueueMode::Fifo,
        ..EngineConfig::default()
    })
    .unwrap();
    clock.create_order(DrinkType::Mocha, Some(CustomerType::Gold));
    clock.create_order(DrinkType::Mocha, Some(CustomerType::Gold));
    clock.create_order(DrinkType::Espresso, Some(CustomerType::New));
    clock.create_order(DrinkType::Espresso, Some(CustomerType::Regular));
    clock.run_minutes(20).unwrap();

    let by_customer = clock.analytics().complaints_by_customer;
    assert_eq!(by_customer[&CustomerType::New], 1);
    assert_eq!(by_customer[&CustomerType::Regular], 1);
    assert_eq!(by_customer[&CustomerType::Gold], 0);
}

#[test]
fn test_smart_skips_mostly_justified() {
    let mut clock = SimulationClock::new(EngineConfig {
        worker_count: 2,
        rng_seed: 5,
        ..EngineConfig::default()
    })
    .unwrap();
    clock.toggle_auto_arrivals(true, Some(1.6)).unwrap();
    clock.run_minutes(200).unwrap();

    let metrics = clock.metrics();
    assert!(metrics.skip_events > 0);
    assert!((0.0..=1.0).contains(&metrics.justified_skip_share));
    // every violation is a skip, but one order can rack up several
    assert!(metrics.fairness_violations <= metrics.skip_events);
    assert!(metrics.fairness_violation_rate >= 0.0);
    assert!(metrics.complaint_rate <= 100.0);
}
