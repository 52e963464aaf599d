use std::sync::Arc;

use serde_json::json;
use shoal::{
    ColumnType, Dissimilarity, DissimilarityModel, Engine, EngineConfig, Error, InitialLayout,
    ModelSource, Point, SolverKind, SpringSolver, StopReason, TableBuilder, Trigger,
    Value,
};

fn unit_square() -> DissimilarityModel {
    let mut builder =
        TableBuilder::new([("x", ColumnType::Double), ("y", ColumnType::Double)]).unwrap();
    for (x, y) in [(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0)] {
        builder
            .push_record([Value::Double(x), Value::Double(y)])
            .unwrap();
    }
    builder.build()
}

fn mixed() -> DissimilarityModel {
    let mut builder = TableBuilder::new([
        ("height", ColumnType::Double),
        ("weight", ColumnType::Integer),
        ("colour", ColumnType::String),
    ])
    .unwrap();
    let rows = [
        (1.2, 30, "red"),
        (1.5, 42, "blue"),
        (1.1, 28, "red"),
        (1.9, 70, "green"),
        (1.7, 66, "blue"),
        (1.3, 35, "green"),
    ];
    for (h, w, c) in rows {
        builder
            .push_record([Value::Double(h), Value::Integer(w), Value::from(c)])
            .unwrap();
    }
    builder.build()
}

fn spring_config() -> EngineConfig {
    EngineConfig::from_value(json!({
        "spring": { "freeness": 0.5, "springForce": 0.5, "dampingFactor": 0.9 },
        "trigger": { "kind": "iterations", "threshold": 200 }
    }))
}

#[test]
fn unit_square_scenario_through_the_model() {
    let engine = Engine::new(unit_square()).with_config(spring_config());
    let mut options = engine.config().spring_options().unwrap();
    options.initial = InitialLayout::Explicit(vec![
        Point::new(-0.3, -0.25),
        Point::new(0.35, -0.2),
        Point::new(0.3, 0.4),
        Point::new(-0.2, 0.3),
    ]);
    let solver = SpringSolver::new(engine.source(None).unwrap(), &options).unwrap();
    let outcome =
        narwhal::runner::run_to_convergence(Box::new(solver), engine.trigger().unwrap()).unwrap();

    assert_eq!(outcome.iterations, 200);
    let p = outcome.state.positions();
    let d = |i: usize, j: usize| p[i].distance(p[j]);
    let sides = [d(0, 1), d(1, 2), d(2, 3), d(3, 0)];
    let diagonals = [d(0, 2), d(1, 3)];
    for side in sides {
        for diagonal in diagonals {
            assert!(side < diagonal, "side {side} vs diagonal {diagonal}");
        }
    }
}

#[test]
fn default_trigger_is_one_iteration_per_record() {
    let engine = Engine::new(mixed());
    assert_eq!(engine.trigger().unwrap(), Trigger::Iterations(6));
    let outcome = engine.run(SolverKind::Spring, None).unwrap();
    assert_eq!(outcome.iterations, 6);
    assert_eq!(outcome.reason, StopReason::Converged);
}

#[test]
fn source_respects_active_columns() {
    let model = Arc::new(mixed());
    let source = ModelSource::new(Arc::clone(&model), Some(&[2, 0])).unwrap();
    assert_eq!(source.len(), 6);
    for i in 0..6 {
        for j in 0..6 {
            let want = model.distance_on(i, j, &[0, 2]).unwrap();
            assert_eq!(source.dissimilarity(i, j).unwrap(), want);
        }
    }
}

#[test]
fn invalid_columns_fail_before_layout() {
    let engine = Engine::new(mixed());
    let err = engine.spring(Some(&[7])).unwrap_err();
    assert!(matches!(err, Error::Model(shoal_core::Error::ColumnOutOfRange { .. })));
    let err = engine.shepard(Some(&[])).unwrap_err();
    assert!(matches!(err, Error::Model(shoal_core::Error::EmptySelection)));
}

#[test]
fn sequence_errors_surface_as_source_errors() {
    let model = DissimilarityModel::from_sequences(["ACGT", "ACG", "ACGA"]);
    let err = Engine::new(model).spring(None).unwrap_err();
    match err {
        Error::Layout(narwhal::Error::Source { i, j, .. }) => assert_eq!((i, j), (0, 1)),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn shepard_runs_on_a_lower_triangle() {
    let model = DissimilarityModel::from_fn(8, |i, j| (i as f64 - j as f64).abs()).unwrap();
    let engine = Engine::new(model).with_config(EngineConfig::from_value(json!({
        "trigger": { "kind": "iterations", "threshold": 30 }
    })));
    let outcome = engine.run(SolverKind::Shepard, Some(&[3])).unwrap();
    assert_eq!(outcome.iterations, 30);
    assert!(outcome.quantity.unwrap().is_finite());
    assert!(outcome.state.positions().iter().all(|p| p.is_finite()));
}

#[test]
fn background_run_can_be_cancelled() {
    let engine = Engine::new(mixed()).with_config(EngineConfig::from_value(json!({
        "trigger": { "kind": "disabled" }
    })));
    let run = engine.start(SolverKind::Spring, None, None).unwrap();
    while run.progress().iteration < 2 {
        std::thread::yield_now();
    }
    run.cancel();
    let outcome = run.join().unwrap();
    assert_eq!(outcome.reason, StopReason::Cancelled);
    assert!(outcome.iterations >= 2);
}

#[test]
fn synchronous_run_with_disabled_trigger_is_rejected() {
    let engine = Engine::new(mixed()).with_config(EngineConfig::from_value(json!({
        "trigger": { "kind": "disabled" }
    })));
    let err = engine.run(SolverKind::Spring, None).unwrap_err();
    assert!(matches!(err, Error::Layout(narwhal::Error::UnboundedRun)));
}

#[test]
fn channel_restores_configured_values() {
    let engine = Engine::new(mixed()).with_config(spring_config());
    let channel = engine.channel().unwrap();
    channel.set_spring_force(0.1).unwrap();
    channel.set_trigger(Trigger::Quantity(0.5)).unwrap();
    channel.restore_defaults();
    let params = channel.snapshot();
    assert_eq!(params.spring.spring_force, 0.5);
    assert_eq!(params.trigger, Trigger::Iterations(200));
}

#[test]
fn config_reads_every_section() {
    let mut config = EngineConfig::default();
    config.deep_merge(&json!({
        "spring": { "deltaTime": 0.2, "neighbourSize": 4, "sampleSize": 2, "exhaustiveLimit": 10 },
        "shepard": { "alpha": 0.1, "beta": 0.3, "localStage": false },
        "layout": { "seed": 42, "init": "classical" },
    }));
    config.set_value("trigger.kind", json!("quantity"));
    config.set_value("trigger.threshold", json!(0.005));

    let spring = config.spring_options().unwrap();
    assert_eq!(spring.delta_time, 0.2);
    assert_eq!(spring.neighbour_size, 4);
    assert_eq!(spring.sample_size, 2);
    assert_eq!(spring.exhaustive_limit, 10);
    assert_eq!(spring.seed, 42);
    assert_eq!(spring.initial, InitialLayout::Classical { seed: 42 });

    let shepard = config.shepard_options().unwrap();
    assert_eq!(shepard.params.alpha, 0.1);
    assert_eq!(shepard.params.beta, 0.3);
    assert!(!shepard.local_stage);

    assert_eq!(
        config.trigger(Trigger::Disabled).unwrap(),
        Trigger::Quantity(0.005)
    );
    assert_eq!(config.get_f64("spring.deltaTime"), Some(0.2));
    assert_eq!(config.get_u64("layout.seed"), Some(42));
    assert_eq!(config.get_str("layout.init"), Some("classical"));
    assert_eq!(config.get_bool("shepard.localStage"), Some(false));
}

#[test]
fn config_defaults_apply_when_keys_are_missing() {
    let config = EngineConfig::default();
    assert_eq!(config.spring_options().unwrap(), shoal::SpringOptions::default());
    assert_eq!(
        config.shepard_options().unwrap(),
        shoal::ShepardOptions::default()
    );
    assert_eq!(
        config.trigger(Trigger::Iterations(9)).unwrap(),
        Trigger::Iterations(9)
    );
}

#[test]
fn config_errors_name_the_key() {
    let bad = EngineConfig::from_value(json!({ "spring": { "freeness": 1.2 } }));
    match bad.spring_options().unwrap_err() {
        Error::Config { key, .. } => assert_eq!(key, "spring.freeness"),
        other => panic!("unexpected error: {other}"),
    }

    let bad = EngineConfig::from_value(json!({ "shepard": { "beta": "high" } }));
    match bad.shepard_params().unwrap_err() {
        Error::Config { key, .. } => assert_eq!(key, "shepard.beta"),
        other => panic!("unexpected error: {other}"),
    }

    let bad = EngineConfig::from_value(json!({ "trigger": { "kind": "quantity" } }));
    assert!(bad.trigger(Trigger::Disabled).is_err());

    let bad = EngineConfig::from_value(json!({ "trigger": { "kind": "sometimes" } }));
    assert!(bad.trigger(Trigger::Disabled).is_err());

    let bad = EngineConfig::from_value(json!({ "layout": { "init": "spiral" } }));
    assert!(bad.spring_options().is_err());

    assert!(EngineConfig::from_json_str("[1, 2]").is_err());
    assert!(EngineConfig::from_json_str("{").is_err());
}
