use shoal_core::load::{self, Format, table::TableOptions, triangle::TriangleOptions};
use shoal_core::{ColumnType, DissimilarityModel, Error, Metric, Value};

#[test]
fn lower_triangle_lookup_is_commutative() {
    // d(0,1)=1, d(0,2)=2, d(1,2)=3
    let m = DissimilarityModel::from_lower_triangle(3, vec![0.0, 1.0, 0.0, 2.0, 3.0, 0.0]).unwrap();
    assert!(m.flags().lower_triangular);
    assert_eq!(m.distance(0, 1).unwrap(), 1.0);
    assert_eq!(m.distance(1, 2).unwrap(), 3.0);
    assert_eq!(m.distance(2, 1).unwrap(), 3.0);
    assert_eq!(m.distance(2, 0).unwrap(), 2.0);
    assert_eq!(m.distance(1, 1).unwrap(), 0.0);
}

#[test]
fn lower_triangle_length_and_values_are_checked() {
    assert!(matches!(
        DissimilarityModel::from_lower_triangle(3, vec![0.0; 5]),
        Err(Error::TriangleLength { expected: 6, found: 5, .. })
    ));
    assert!(matches!(
        DissimilarityModel::from_lower_triangle(2, vec![0.0, f64::NAN, 0.0]),
        Err(Error::NonFiniteDissimilarity { left: 0, right: 1, .. })
    ));
}

#[test]
fn triangle_text_with_labels() {
    let text = "# three items\na 0\nb 1 0\nc 2 3 0\n";
    let m = load::triangle::parse_str(
        text,
        &TriangleOptions {
            labels: true,
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(m.len(), 3);
    assert_eq!(m.label(2), Some("c"));
    assert_eq!(m.distance(2, 1).unwrap(), 3.0);

    let err = load::triangle::parse_str("0\n1 0\n2 0\n", &TriangleOptions::default()).unwrap_err();
    assert!(matches!(err, Error::Parse { line: 3, .. }), "{err}");
}

#[test]
fn table_text_infers_types_and_missing_values() {
    let text = "\
name,age,height,born,colour
ann,31,1.62,1993-04-01,red
bob,?,1.80,1990-12-24,blue
cy,45,,1979-07-30,red
";
    let m = load::table::parse_str(
        text,
        &TableOptions {
            row_labels: true,
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(m.len(), 3);
    assert_eq!(
        m.column_types(),
        vec![
            ColumnType::Integer,
            ColumnType::Double,
            ColumnType::Date,
            ColumnType::String
        ]
    );
    assert_eq!(m.fields()[0], "age");
    assert_eq!(m.label(1), Some("bob"));
    assert_eq!(m.value(1, 0).unwrap(), Value::Missing);
    assert_eq!(m.value(2, 1).unwrap(), Value::Missing);
    assert_eq!(m.metric(), Metric::Euclidean);
    assert!(m.distance(0, 2).unwrap() > 0.0);
}

#[test]
fn integer_flags_load_as_binary() {
    let m = load::parse_str("a,b,c\n1,0,1\n0,0,1\n1,1,1\n", Format::Table).unwrap();
    assert!(m.flags().binary);
    assert!((m.distance(0, 1).unwrap() - 0.5).abs() < 1e-12);
}

#[test]
fn table_rows_must_match_the_header() {
    let err = load::parse_str("a,b\n1,2\n3\n", Format::Table).unwrap_err();
    assert!(matches!(err, Error::Parse { line: 3, .. }), "{err}");
}

#[test]
fn vectors_and_sequences() {
    let m = load::parse_str("1 0 0\n0 1 0\n1 1 0\n", Format::Vectors).unwrap();
    assert_eq!(m.metric(), Metric::Cosine);
    assert_eq!(m.vector(2), Some(&[1.0, 1.0, 0.0][..]));
    assert!(load::parse_str("1 0\n1 2 3\n", Format::Vectors).is_err());

    let fasta = ">s1\nACGT\nAC\n>s2\nACGTTT\n";
    let m = load::parse_str(fasta, Format::Sequences).unwrap();
    assert_eq!(m.labels().unwrap(), &["s1".to_string(), "s2".to_string()]);
    assert!((m.distance(0, 1).unwrap() - 2.0 / 6.0).abs() < 1e-12);

    let plain = load::parse_str("AAAA\nAAAT\n", Format::Sequences).unwrap();
    assert_eq!(plain.distance(0, 1).unwrap(), 0.25);
    assert!(plain.labels().is_none());
}

#[test]
fn formats_parse_by_name() {
    assert_eq!("CSV".parse::<Format>().unwrap(), Format::Table);
    assert_eq!("fasta".parse::<Format>().unwrap(), Format::Sequences);
    assert!(matches!("xml".parse::<Format>(), Err(Error::UnknownFormat(_))));
}
