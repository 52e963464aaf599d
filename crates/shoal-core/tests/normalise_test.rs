use shoal_core::{ColumnType, DissimilarityModel, Error, TableBuilder, Value};

fn numeric_model() -> DissimilarityModel {
    let mut b = TableBuilder::new([
        ("count", ColumnType::Integer),
        ("weight", ColumnType::Double),
    ])
    .unwrap();
    b.push_record([Value::Integer(2), Value::Double(-1.5)]).unwrap();
    b.push_record([Value::Integer(4), Value::Missing]).unwrap();
    b.push_record([Value::Integer(6), Value::Double(0.5)]).unwrap();
    b.push_record([Value::Integer(3), Value::Double(2.5)]).unwrap();
    b.build()
}

fn snapshot(m: &DissimilarityModel) -> (Vec<ColumnType>, Vec<Value>, Vec<Vec<Value>>) {
    let bounds = (0..m.column_count())
        .flat_map(|c| [m.min(c).unwrap().clone(), m.max(c).unwrap().clone()])
        .collect();
    let values = (0..m.len())
        .map(|r| (0..m.column_count()).map(|c| m.value(r, c).unwrap()).collect())
        .collect();
    (m.column_types(), bounds, values)
}

#[test]
fn normalising_maps_columns_into_unit_range() {
    let mut m = numeric_model();
    m.set_normalised(true).unwrap();

    assert!(m.flags().normalised);
    assert_eq!(m.column_types(), vec![ColumnType::Double; 2]);
    for c in 0..2 {
        assert_eq!(m.min(c).unwrap(), &Value::Double(0.0));
        assert_eq!(m.max(c).unwrap(), &Value::Double(1.0));
    }
    assert_eq!(m.value(0, 0).unwrap(), Value::Double(0.0));
    assert_eq!(m.value(1, 0).unwrap(), Value::Double(0.5));
    assert_eq!(m.value(2, 0).unwrap(), Value::Double(1.0));
    assert_eq!(m.value(3, 1).unwrap(), Value::Double(1.0));
    assert_eq!(m.value(1, 1).unwrap(), Value::Missing);

    let avg = m.average()[0];
    assert!((avg - (0.0 + 0.5 + 1.0 + 0.25) / 4.0).abs() < 1e-12);
}

#[test]
fn normalising_round_trips_exactly() {
    let mut m = numeric_model();
    let before = snapshot(&m);
    let distances: Vec<f64> = (0..4).map(|j| m.distance(0, j).unwrap()).collect();

    m.set_normalised(true).unwrap();
    assert_ne!(snapshot(&m), before);
    m.set_normalised(false).unwrap();

    assert!(!m.is_normalised());
    assert_eq!(snapshot(&m), before);
    let after: Vec<f64> = (0..4).map(|j| m.distance(0, j).unwrap()).collect();
    assert_eq!(after, distances);
}

#[test]
fn repeated_requests_are_no_ops() {
    let mut m = numeric_model();
    m.set_normalised(false).unwrap();
    assert!(!m.is_normalised());

    m.set_normalised(true).unwrap();
    let once = snapshot(&m);
    m.set_normalised(true).unwrap();
    assert_eq!(snapshot(&m), once);
}

#[test]
fn normalised_distances_are_scale_invariant() {
    let build = |scale: f64| {
        let mut b = TableBuilder::new([("x", ColumnType::Double), ("y", ColumnType::Double)]).unwrap();
        for (x, y) in [(0.0, 3.0), (1.0, 7.0), (4.0, 1.0)] {
            b.push_record([Value::Double(x * scale + 10.0), Value::Double(y * scale)])
                .unwrap();
        }
        let mut m = b.build();
        m.set_normalised(true).unwrap();
        m
    };
    let a = build(1.0);
    let b = build(250.0);
    for (i, j) in [(0, 1), (0, 2), (1, 2)] {
        assert!((a.distance(i, j).unwrap() - b.distance(i, j).unwrap()).abs() < 1e-9);
    }
}

#[test]
fn unsupported_collections_are_rejected_unchanged() {
    let mut b = TableBuilder::new([("x", ColumnType::Double), ("tag", ColumnType::String)]).unwrap();
    b.push_record([Value::Double(1.0), Value::from("a")]).unwrap();
    b.push_record([Value::Double(3.0), Value::from("b")]).unwrap();
    let mut m = b.build();
    let before = snapshot(&m);
    assert!(matches!(
        m.set_normalised(true),
        Err(Error::NotNormalisable { column: 1, kind: ColumnType::String, .. })
    ));
    assert!(!m.is_normalised());
    assert_eq!(snapshot(&m), before);

    let mut corpus = DissimilarityModel::from_vectors(vec![vec![1.0, 2.0], vec![3.0, 0.0]]).unwrap();
    assert!(matches!(
        corpus.set_normalised(true),
        Err(Error::NormalisationUnsupported { .. })
    ));
}
