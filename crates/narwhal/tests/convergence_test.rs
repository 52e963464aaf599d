use narwhal::{ConvergenceMonitor, Trigger, Verdict};
use proptest::prelude::*;

#[test]
fn iteration_trigger_stops_exactly_at_threshold() {
    let mut monitor = ConvergenceMonitor::new(Trigger::Iterations(10));
    for i in 1..10 {
        assert_eq!(monitor.observe(i, 0.0), Verdict::Continue, "iteration {i}");
    }
    assert_eq!(monitor.observe(10, 1e9), Verdict::Stop);
}

#[test]
fn quantity_trigger_stops_first_time_at_or_below_threshold() {
    let mut monitor = ConvergenceMonitor::new(Trigger::Quantity(0.01));
    assert_eq!(monitor.observe(1, 0.5), Verdict::Continue);
    assert_eq!(monitor.observe(2, 0.010_001), Verdict::Continue);
    assert_eq!(monitor.observe(3, 0.01), Verdict::Stop);
}

#[test]
fn disabled_monitor_never_stops() {
    let mut monitor = ConvergenceMonitor::new(Trigger::Disabled);
    for i in 0..1000 {
        assert_eq!(monitor.observe(i, 0.0), Verdict::Continue);
    }
}

#[test]
fn hot_swapped_threshold_keeps_the_iteration_count() {
    let mut monitor = ConvergenceMonitor::new(Trigger::Iterations(100));
    for i in 1..=20 {
        monitor.observe(i, 1.0);
    }
    monitor.set_trigger(Trigger::Iterations(15));
    assert_eq!(monitor.last().map(|o| o.iteration), Some(20));
    assert_eq!(monitor.observe(21, 1.0), Verdict::Stop);
}

#[test]
fn arming_one_kind_disarms_the_other() {
    let mut monitor = ConvergenceMonitor::new(Trigger::Iterations(1));
    monitor.set_trigger(Trigger::Quantity(0.0));
    assert_eq!(monitor.observe(50, 0.1), Verdict::Continue);
    monitor.disable();
    assert!(!monitor.trigger().is_armed());
    assert_eq!(monitor.observe(51, 0.0), Verdict::Continue);
}

#[test]
fn nan_quantity_never_converges() {
    let mut monitor = ConvergenceMonitor::new(Trigger::Quantity(1.0));
    assert_eq!(monitor.observe(1, f64::NAN), Verdict::Continue);
}

#[test]
fn reset_forgets_observations() {
    let mut monitor = ConvergenceMonitor::new(Trigger::Iterations(3));
    monitor.observe(1, 0.2);
    monitor.reset();
    assert!(monitor.last().is_none());
    assert_eq!(monitor.trigger(), Trigger::Iterations(3));
}

#[test]
fn invalid_thresholds_are_rejected() {
    assert!(Trigger::Quantity(-0.5).validate().is_err());
    assert!(Trigger::Quantity(f64::INFINITY).validate().is_err());
    assert!(Trigger::Quantity(0.0).validate().is_ok());
    assert!(Trigger::Iterations(0).validate().is_ok());
}

#[test]
fn triggers_serialise_with_kind_and_threshold() {
    let json = serde_json::to_value(Trigger::Iterations(12)).unwrap();
    assert_eq!(json, serde_json::json!({"kind": "iterations", "threshold": 12}));
    let back: Trigger = serde_json::from_value(serde_json::json!({"kind": "disabled"})).unwrap();
    assert_eq!(back, Trigger::Disabled);
}

proptest! {
    #[test]
    fn iteration_policy_depends_only_on_the_count(
        threshold in 0u64..500,
        iteration in 0u64..1000,
        quantity in proptest::num::f64::ANY,
    ) {
        let mut monitor = ConvergenceMonitor::new(Trigger::Iterations(threshold));
        let expected = if iteration >= threshold { Verdict::Stop } else { Verdict::Continue };
        prop_assert_eq!(monitor.observe(iteration, quantity), expected);
    }

    #[test]
    fn quantity_policy_depends_only_on_the_value(
        threshold in 0.0f64..10.0,
        quantity in 0.0f64..20.0,
        iteration in 0u64..1000,
    ) {
        let mut monitor = ConvergenceMonitor::new(Trigger::Quantity(threshold));
        let expected = if quantity <= threshold { Verdict::Stop } else { Verdict::Continue };
        prop_assert_eq!(monitor.observe(iteration, quantity), expected);
    }
}
