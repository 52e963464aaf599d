use narwhal::{DistanceMatrix, Point, stress};

fn triangle() -> Vec<Point> {
    vec![Point::new(0.0, 0.0), Point::new(3.0, 0.0), Point::new(0.0, 4.0)]
}

#[test]
fn exact_layout_has_no_stress() {
    let points = triangle();
    let source = DistanceMatrix::from_points(&points);
    assert_eq!(stress::normalized_stress(&source, &points).unwrap(), 0.0);
    assert_eq!(stress::average_error(&source, &points).unwrap(), 0.0);
    assert_eq!(stress::sampled_stress(&source, &points, 1).unwrap(), 0.0);
}

#[test]
fn doubled_layout_stress() {
    let points = triangle();
    let source = DistanceMatrix::from_points(&points);
    let doubled: Vec<Point> = points.iter().map(|&p| p * 2.0).collect();
    // Every low distance is twice the high one: (2d - d)^2 / (2d)^2 = 1/4.
    let s = stress::normalized_stress(&source, &doubled).unwrap();
    assert!((s - 0.25).abs() < 1e-12);
    let e = stress::average_error(&source, &doubled).unwrap();
    assert!((e - 4.0).abs() < 1e-12);
}

#[test]
fn collapsed_layout_reports_the_raw_error() {
    let source = DistanceMatrix::from_fn(3, |_, _| 1.0);
    let collapsed = vec![Point::ORIGIN; 3];
    assert_eq!(stress::normalized_stress(&source, &collapsed).unwrap(), 3.0);
}

#[test]
fn shepard_points_pair_dissimilarity_with_distance() {
    let points = triangle();
    let source = DistanceMatrix::from_fn(3, |i, j| (i + j) as f64);
    let out = stress::shepard_points(&source, &points).unwrap();
    assert_eq!(out, vec![(1.0, 3.0), (2.0, 4.0), (3.0, 5.0)]);
}

#[test]
fn mean_speed_averages_magnitudes() {
    let v = [Point::new(3.0, 4.0), Point::ORIGIN];
    assert_eq!(stress::mean_speed(&v), 2.5);
    assert_eq!(stress::mean_speed(&[]), 0.0);
}
