use std::sync::Arc;

use narwhal::{
    DistanceMatrix, Error, InitialLayout, LOCAL_STAGE_MIN_ITEMS, Point, ShepardOptions,
    ShepardParams, ShepardSolver, Solver, StopReason, Trigger, runner,
};

fn cloud(n: usize, seed: u64) -> Vec<Point> {
    let mut state = seed.max(1);
    let mut next = move || {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (state >> 11) as f64 / (1u64 << 53) as f64
    };
    (0..n).map(|_| Point::new(next() * 3.0, next())).collect()
}

fn global_only(initial: InitialLayout) -> ShepardOptions {
    ShepardOptions {
        initial,
        local_stage: false,
        ..Default::default()
    }
}

#[test]
fn rank_preserving_transform_is_recovered() {
    let points = cloud(20, 5);
    let source = Arc::new(DistanceMatrix::from_fn(points.len(), |i, j| {
        (1.4 * points[i].distance(points[j])).exp()
    }));
    let solver =
        ShepardSolver::new(source, &global_only(InitialLayout::Classical { seed: 1 })).unwrap();
    let outcome = runner::run_to_convergence(Box::new(solver), Trigger::Quantity(1e-3)).unwrap();

    assert_eq!(outcome.reason, StopReason::Converged);
    assert!(outcome.iterations <= 50, "took {} iterations", outcome.iterations);
    assert!(outcome.quantity.unwrap() <= 1e-3);
    assert!(outcome.stress.is_finite() && outcome.stress >= 0.0);
}

#[test]
fn random_start_reduces_rank_departure() {
    let points = cloud(20, 8);
    let source = Arc::new(DistanceMatrix::from_points(&points));
    let mut solver =
        ShepardSolver::new(source, &global_only(InitialLayout::Random { seed: 3 })).unwrap();
    let initial = solver.departure();
    let mut last = initial;
    for _ in 0..200 {
        last = solver.step().unwrap().quantity;
    }
    assert!(last < initial * 0.5, "departure went from {initial} to {last}");
    assert_eq!(solver.departure(), last);
}

#[test]
fn layout_stays_centred_at_unit_mean_distance() {
    let points = cloud(15, 2);
    let source = Arc::new(DistanceMatrix::from_points(&points));
    let mut solver = ShepardSolver::new(source, &ShepardOptions::default()).unwrap();
    for _ in 0..10 {
        solver.step().unwrap();
    }
    let p = solver.state().positions();
    let n = p.len() as f64;
    let cx = p.iter().map(|q| q.x).sum::<f64>() / n;
    let cy = p.iter().map(|q| q.y).sum::<f64>() / n;
    assert!(cx.abs() < 1e-9 && cy.abs() < 1e-9);

    let mut total = 0.0;
    let mut pairs = 0.0;
    for i in 0..p.len() {
        for j in (i + 1)..p.len() {
            total += p[i].distance(p[j]);
            pairs += 1.0;
        }
    }
    assert!((total / pairs - 1.0).abs() < 1e-9);
}

#[test]
fn zero_step_size_freezes_the_layout() {
    let points = cloud(10, 4);
    let source = Arc::new(DistanceMatrix::from_points(&points));
    let mut solver =
        ShepardSolver::new(source, &global_only(InitialLayout::Random { seed: 6 })).unwrap();
    solver.set_params(ShepardParams {
        alpha: 0.0,
        beta: 0.0,
    });
    let before = solver.state().positions().to_vec();
    solver.step().unwrap();
    for (a, b) in before.iter().zip(solver.state().positions()) {
        assert!(a.distance(*b) < 1e-9);
    }
}

#[test]
fn momentum_is_kept_as_velocity() {
    let points = cloud(10, 7);
    let source = Arc::new(DistanceMatrix::from_points(&points));
    let options = ShepardOptions {
        params: ShepardParams {
            alpha: 0.2,
            beta: 0.5,
        },
        ..global_only(InitialLayout::Random { seed: 2 })
    };
    let mut solver = ShepardSolver::new(source, &options).unwrap();
    solver.step().unwrap();
    assert!(solver.state().velocities().iter().any(|v| v.norm() > 0.0));
}

#[test]
fn large_inputs_start_with_a_local_stage() {
    let n = LOCAL_STAGE_MIN_ITEMS + 16;
    let points = cloud(n, 3);
    let source = Arc::new(DistanceMatrix::from_points(&points));
    let mut solver = ShepardSolver::new(
        source,
        &ShepardOptions {
            initial: InitialLayout::Random { seed: 1 },
            ..Default::default()
        },
    )
    .unwrap();
    assert!(solver.in_local_stage());

    let mut steps = 0;
    while solver.in_local_stage() {
        let report = solver.step().unwrap();
        assert!(report.quantity.is_finite());
        steps += 1;
        assert!(steps <= n, "local stage did not hand over");
    }
    solver.step().unwrap();
    assert!(solver.state().positions().iter().all(|p| p.is_finite()));
}

#[test]
fn local_stage_stress_tracks_the_moved_layout() {
    let points = cloud(LOCAL_STAGE_MIN_ITEMS + 16, 4);
    let source = Arc::new(DistanceMatrix::from_points(&points));
    let mut solver = ShepardSolver::new(
        source.clone(),
        &ShepardOptions {
            initial: InitialLayout::Random { seed: 2 },
            ..Default::default()
        },
    )
    .unwrap();
    let initial = solver.kruskal_stress();
    for _ in 0..3 {
        solver.step().unwrap();
    }
    assert!(solver.in_local_stage());

    let replay = ShepardSolver::new(
        source,
        &global_only(InitialLayout::Explicit(solver.state().positions().to_vec())),
    )
    .unwrap();
    let stress = solver.stress().unwrap();
    assert_ne!(stress, initial);
    assert!((stress - replay.kruskal_stress()).abs() < 1e-9);
}

#[test]
fn local_stage_can_be_switched_off() {
    let points = cloud(LOCAL_STAGE_MIN_ITEMS + 1, 9);
    let source = Arc::new(DistanceMatrix::from_points(&points));
    let solver =
        ShepardSolver::new(source, &global_only(InitialLayout::Random { seed: 1 })).unwrap();
    assert!(!solver.in_local_stage());
}

#[test]
fn constant_dissimilarities_do_not_break_the_solver() {
    let source = Arc::new(DistanceMatrix::from_fn(6, |_, _| 2.0));
    let mut solver = ShepardSolver::new(source, &ShepardOptions::default()).unwrap();
    for _ in 0..20 {
        assert!(solver.step().unwrap().quantity.is_finite());
    }
    assert!(solver.kruskal_stress().is_finite());
}

#[test]
fn explicit_layout_size_is_checked() {
    let source = Arc::new(DistanceMatrix::from_fn(4, |_, _| 1.0));
    let err = ShepardSolver::new(
        source,
        &global_only(InitialLayout::Explicit(vec![Point::ORIGIN; 3])),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        Error::InitialLayoutSize {
            expected: 4,
            found: 3
        }
    ));
}
