//! Schema casts and column selection across the variant conversions.

use flux::core::types::record;
use flux::prelude::*;

fn people_schema() -> Schema {
    Schema::new(vec![
        FieldDescriptor::new("name", FieldType::Str),
        FieldDescriptor::new("age", FieldType::Int),
        FieldDescriptor::new("score", FieldType::Float),
        FieldDescriptor::new("active", FieldType::Bool),
    ])
}

fn csv_lines() -> LinesFlux {
    LinesFlux::from_strings(vec![
        "ann,40,1.5,true".to_string(),
        "bo,,2,false".to_string(),
        "cy,old,3.25,1".to_string(),
    ])
}

#[test]
fn csv_to_typed_records() {
    let records = csv_lines()
        .to_rows(b',')
        .schematize(people_schema(), CastMode::SkipBadValues)
        .to_records()
        .collect_vec()
        .expect("records");

    assert_eq!(records.len(), 3);
    assert_eq!(records[0].field("age"), Value::Int(40));
    assert_eq!(records[0].field("score"), Value::Float(1.5));
    assert_eq!(records[1].field("age"), Value::Int(0));
    assert_eq!(records[1].field("active"), Value::Bool(false));
    assert_eq!(records[2].field("age"), Value::Null);
    assert_eq!(records[2].field("active"), Value::Bool(true));
}

#[test]
fn strict_cast_names_the_field() {
    let err = csv_lines()
        .to_rows(b',')
        .schematize(people_schema(), CastMode::Strict)
        .collect_vec()
        .expect_err("cast should fail");
    match err {
        Error::Cast(msg) => assert!(msg.contains("age"), "{msg}"),
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn dropped_rows_reset_count() {
    let flux = csv_lines()
        .to_rows(b',')
        .schematize(people_schema(), CastMode::SkipBadRows);
    assert_eq!(flux.expected_count(), None);
    assert_eq!(flux.final_count().expect("count"), 2);
}

#[test]
fn records_schematize_in_schema_order() {
    let schema = Schema::new(vec![
        FieldDescriptor::new("b", FieldType::Int),
        FieldDescriptor::new("a", FieldType::Str),
    ]);
    let rows = RecordsFlux::from_records(vec![record([("a", Value::from(1)), ("b", Value::from("2"))])])
        .schematize(schema, CastMode::Strict)
        .collect_vec()
        .expect("rows");
    assert_eq!(rows, vec![Value::List(vec![Value::Int(2), Value::from("1")])]);
}

#[test]
fn row_select_then_records() {
    let records = RowsFlux::from_rows(vec![vec![1.into(), 2.into(), 3.into()]])
        .select(vec![
            Selector::Index(2),
            Selector::derived(
                |cells| match (&cells[0], &cells[1]) {
                    (Value::Int(a), Value::Int(b)) => Value::Int(a * b),
                    _ => Value::Null,
                },
                vec![0, 1],
            ),
        ])
        .to_records(&["last", "product"])
        .collect_vec()
        .expect("records");
    assert_eq!(records[0].field("last"), Value::Int(3));
    assert_eq!(records[0].field("product"), Value::Int(2));
}

#[test]
fn computed_fields_and_tsv_output() {
    let select = RecordSelect::new()
        .field("name")
        .compute("label", &["name", "age"], |args| {
            Value::from(format!("{}:{}", args[0], args[1]))
        });
    let lines = RecordsFlux::from_records(vec![
        record([("name", Value::from("ann")), ("age", Value::from(40))]),
        record([("name", Value::from("bo")), ("age", Value::from(7))]),
    ])
    .select(select)
    .expect("select")
    .to_delimited_lines(&["name", "label"], true, "\t")
    .into_strings()
    .collect_vec()
    .expect("lines");
    assert_eq!(lines, vec!["name\tlabel", "ann\tann:40", "bo\tbo:7"]);
}

#[test]
fn schema_serializes_as_json() {
    let json = serde_json::to_string(&people_schema()).expect("serialize");
    assert!(json.contains("\"field_type\":\"int\""));
    let back: Schema = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(back, people_schema());
}
