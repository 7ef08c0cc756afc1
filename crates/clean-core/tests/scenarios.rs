//! End-to-end pipeline scenarios for the built-in entities.

use std::sync::Arc;

use clean_core::entities::{companies, transport};
use clean_core::{
    CancellationFlag, Frame, IssueCategory, IssueSeverity, Pipeline, PipelineError,
    PipelineOptions, Value, row,
};
use clean_model::{FrameError, RuleSpecError};
use clean_transform::{AddMissingFields, FillNulls, PreTransform, TransformOutput, from_fn};
use polars::prelude::*;

fn transport_row(id: impl Into<Value>, name: impl Into<Value>) -> clean_core::Row {
    row([
        ("tra_id", id.into()),
        ("tra_denomination", name.into()),
        ("contacts", Value::from(Vec::<i64>::new())),
        ("deliveries", Value::from(Vec::<i64>::new())),
        ("stock_import", Value::from(Vec::<i64>::new())),
    ])
}

fn run_transport(frame: &Frame) -> clean_core::PipelineOutput {
    Pipeline::default()
        .run_entity(&transport::descriptor(), frame)
        .unwrap()
}

#[test]
fn s1_transport_happy_path() {
    let input = Frame::from_records(vec![row([
        ("tra_id", Value::from(1)),
        ("tra_denomination", Value::from("ACME")),
        ("contacts", Value::from(vec![10])),
        ("deliveries", Value::from(vec![20])),
        ("stock_import", Value::from(vec![30])),
    ])]);

    let output = run_transport(&input);

    assert_eq!(output.frame.rows(), input.rows());
    assert_eq!(
        output.frame.columns(),
        ["tra_id", "tra_denomination", "contacts", "deliveries", "stock_import"].map(String::from)
    );
    assert_eq!(output.report.total(), 0);
    // Every skeleton category is present, even when empty.
    let rules = transport::field_rules().unwrap();
    for category in rules.output_categories() {
        assert!(output.report.contains(&category), "missing {category}");
    }
}

#[test]
fn s2_missing_required_value() {
    let input = Frame::from_records(vec![transport_row(1, Value::Null)]);

    let output = run_transport(&input);

    let nulls = output.report.get("tra_null_issues").unwrap();
    assert_eq!(nulls.len(), 1);
    assert_eq!(nulls[0].column, "tra_denomination");
    assert_eq!(nulls[0].row_index, Some(0));
    assert_eq!(nulls[0].severity, IssueSeverity::Error);
    assert_eq!(output.frame.get(0, "tra_denomination"), Some(&Value::from("")));
    assert_eq!(output.report.total(), 1);
}

#[test]
fn s3_length_overflow() {
    let input = Frame::from_records(vec![transport_row(1, "A".repeat(120))]);

    let output = run_transport(&input);

    let lengths = output.report.get("tra_length_issues").unwrap();
    assert_eq!(lengths.len(), 1);
    assert_eq!(lengths[0].expected, "at most 100 characters");
    assert_eq!(output.frame.get(0, "tra_denomination"), Some(&Value::from("")));
}

#[test]
fn s4_duplicate_denomination_keeps_both_rows() {
    let input = Frame::from_records(vec![transport_row(1, "ACME"), transport_row(2, "ACME")]);

    let output = run_transport(&input);

    let violations = output.report.get("tra_uniqueness_violations").unwrap();
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].row_index, Some(1));
    assert_eq!(violations[0].related_rows, vec![0]);
    assert_eq!(violations[0].column, "tra_denomination");
    assert_eq!(output.frame.height(), 2);
    assert_eq!(output.kept_rows, vec![0, 1]);
    assert_eq!(output.frame.get(0, "tra_denomination"), Some(&Value::from("ACME")));
    assert_eq!(output.frame.get(1, "tra_denomination"), Some(&Value::from("")));
    assert!(output.report.get("tra_duplicates").unwrap().is_empty());
}

#[test]
fn s5_duplicate_primary_key_keeps_first() {
    let input = Frame::from_records(vec![transport_row(1, "ACME"), transport_row(1, "Blue")]);

    let output = run_transport(&input);

    let duplicates = output.report.get("tra_duplicates").unwrap();
    assert_eq!(duplicates.len(), 1);
    assert_eq!(duplicates[0].row_index, Some(1));
    assert_eq!(duplicates[0].related_rows, vec![0]);
    assert_eq!(output.frame.height(), 1);
    assert_eq!(output.frame.get(0, "tra_denomination"), Some(&Value::from("ACME")));
    assert_eq!(output.dropped_rows, vec![1]);
}

#[test]
fn s6_missing_column_is_added_with_default() {
    let input = Frame::from_records(vec![row([
        ("tra_id", Value::from(1)),
        ("tra_denomination", Value::from("ACME")),
        ("deliveries", Value::from(vec![20])),
        ("stock_import", Value::from(vec![30])),
    ])]);

    let output = run_transport(&input);

    assert_eq!(output.frame.get(0, "contacts"), Some(&Value::Array(Vec::new())));
    let missing = output.report.get("tra_missing_columns").unwrap();
    assert_eq!(missing.len(), 1);
    assert_eq!(missing[0].column, "contacts");
    assert_eq!(missing[0].row_index, None);
    assert_eq!(missing[0].reported_row(), -1);
    assert!(!input.has_column("contacts"));
}

#[test]
fn s7_companies_pre_transform_adds_country() {
    let input = Frame::from_records(vec![row([
        ("co_id", Value::from(1)),
        ("co_denomination", Value::from("ACME")),
        ("co_head_office_address", Value::from("1 rue de la Paix")),
        ("co_head_office_city", Value::from("Paris")),
        ("co_siren", Value::from("552100554")),
        ("co_active", Value::from(true)),
        ("co_created_on", Value::from("2020-01-31")),
        ("transports", Value::from(vec![1, 2])),
    ])]);

    let output = Pipeline::default()
        .run_entity(&companies::descriptor(), &input)
        .unwrap();

    assert!(output.frame.has_column("co_head_office_country"));
    assert_eq!(
        output.frame.get(0, "co_head_office_country"),
        Some(&Value::from("FRANCE"))
    );
    let added = output.report.get("co_field_added").unwrap();
    assert_eq!(added.len(), 1);
    assert_eq!(added[0].severity, IssueSeverity::Info);
    assert!(output.report.get("co_missing_columns").unwrap().is_empty());
    // The ISO date text is coerced and noted.
    assert_eq!(output.report.get("co_cleaned_cases").unwrap().len(), 1);
    assert!(!output.report.has_errors());
}

#[test]
fn unknown_columns_are_recorded_then_dropped() {
    let mut record = transport_row(1, "ACME");
    record.insert("legacy_code".to_string(), Value::from("X1"));
    let input = Frame::from_records(vec![record]);

    let output = run_transport(&input);

    assert!(!output.frame.has_column("legacy_code"));
    let unknown = output.report.issues(&IssueCategory::UnknownColumns);
    assert_eq!(unknown.len(), 1);
    assert_eq!(unknown[0].column, "legacy_code");

    let quiet = Pipeline::new(PipelineOptions::new().with_unknown_columns_recorded(false))
        .run_entity(&transport::descriptor(), &input)
        .unwrap();
    assert!(quiet.report.issues(&IssueCategory::UnknownColumns).is_empty());
    assert!(!quiet.frame.has_column("legacy_code"));
}

#[test]
fn unparseable_primary_key_drops_row() {
    let input = Frame::from_records(vec![
        transport_row("abc", "ACME"),
        transport_row(0, "Blue"),
        transport_row("7", "Green"),
    ]);

    let output = run_transport(&input);

    assert_eq!(output.kept_rows, vec![2]);
    assert_eq!(output.dropped_rows, vec![0, 1]);
    assert_eq!(output.frame.get(0, "tra_id"), Some(&Value::Integer(7)));
    let missing = output.report.get("tra_missing_primary_key").unwrap();
    assert_eq!(missing.len(), 2);
    assert_eq!(output.report.get("tra_integer_issues").unwrap().len(), 2);
}

#[test]
fn transform_issues_use_configured_bucket() {
    let options = PipelineOptions::new()
        .with_transform_category("defaults_applied")
        .with_transform_severity(IssueSeverity::Warning);
    let input = Frame::from_records(vec![row([
        ("tra_id", Value::from(1)),
        ("tra_denomination", Value::from("ACME")),
    ])]);

    let output = Pipeline::new(options)
        .with_transform(AddMissingFields::new().with_field("contacts", Vec::<i64>::new()))
        .run_entity(&transport::descriptor(), &input)
        .unwrap();

    let applied = output.report.get("tra_defaults_applied").unwrap();
    assert_eq!(applied.len(), 1);
    assert_eq!(applied[0].severity, IssueSeverity::Warning);
    assert_eq!(
        applied[0].category,
        IssueCategory::Transform("defaults_applied".to_string())
    );
    assert_eq!(output.report.get("tra_missing_columns").unwrap().len(), 2);
}

#[test]
fn shared_transform_serves_several_pipelines() {
    let fill: Arc<dyn PreTransform> =
        Arc::new(AddMissingFields::new().with_field("contacts", Vec::<i64>::new()));
    let first = Pipeline::default().with_shared_transform(Arc::clone(&fill));
    let second = Pipeline::default()
        .with_shared_transform(fill)
        .with_transform(FillNulls::new("tra_denomination", "UNKNOWN"));

    assert_eq!(first.transform_names(), vec!["add_missing_fields"]);
    assert_eq!(second.transform_names(), vec!["add_missing_fields", "fill_nulls"]);

    let input = Frame::from_records(vec![row([
        ("tra_id", Value::from(1)),
        ("tra_denomination", Value::Null),
    ])]);
    let output = second.run_entity(&transport::descriptor(), &input).unwrap();
    assert_eq!(
        output.frame.get(0, "tra_denomination"),
        Some(&Value::from("UNKNOWN"))
    );
    assert!(output.report.get("tra_null_issues").unwrap().is_empty());
    assert_eq!(output.report.get("tra_field_added").unwrap().len(), 2);
}

#[test]
fn transform_dropping_rows_is_rejected() {
    let input = Frame::from_records(vec![transport_row(1, "ACME"), transport_row(2, "Blue")]);
    let truncate = from_fn("truncate", |frame: &Frame| {
        let mut frame = frame.clone();
        frame.retain_rows(|index, _| index == 0);
        Ok(TransformOutput::new(frame))
    });

    let err = Pipeline::default()
        .with_transform(truncate)
        .run_entity(&transport::descriptor(), &input)
        .unwrap_err();

    assert_eq!(err.code(), "invalid-transform-output");
    assert!(err.to_string().contains("truncate"));
}

#[test]
fn transform_errors_are_reported_as_invalid_output() {
    let input = Frame::from_records(vec![transport_row(1, "ACME")]);
    let clash = from_fn("clash", |frame: &Frame| {
        let mut frame = frame.clone();
        frame.add_column("tra_id", Value::Null)?;
        Ok(TransformOutput::new(frame))
    });

    let err = Pipeline::default()
        .with_transform(clash)
        .run_entity(&transport::descriptor(), &input)
        .unwrap_err();

    assert!(matches!(
        err,
        PipelineError::InvalidTransformOutput { ref transform, .. } if transform == "clash"
    ));
}

#[test]
fn cancelled_run_returns_no_output() {
    let input = Frame::from_records(vec![transport_row(1, "ACME")]);
    let flag = CancellationFlag::new();
    flag.cancel();

    let err = Pipeline::default()
        .with_cancellation(flag.clone())
        .run_entity(&transport::descriptor(), &input)
        .unwrap_err();

    assert!(matches!(err, PipelineError::Cancelled));
    assert!(flag.is_cancelled());
}

#[test]
fn malformed_rule_set_fails_fast() {
    let mut entity = transport::descriptor();
    entity.field_rules = || {
        clean_core::RuleSet::builder("broken", "br")
            .field("id", clean_model::FieldRule::integer())
            .build()
    };

    let err = Pipeline::default()
        .run_entity(&entity, &Frame::default())
        .unwrap_err();

    assert_eq!(err.code(), "invalid-rule-spec");
    assert!(matches!(
        err,
        PipelineError::InvalidRuleSpec(RuleSpecError::NoPrimaryKey)
    ));
}

#[test]
fn dataframe_input_is_converted() {
    let df = DataFrame::new(vec![
        Series::new("tra_id".into(), vec![1i64, 2]).into(),
        Series::new("tra_denomination".into(), vec![" ACME ", "Blue"]).into(),
    ])
    .unwrap();
    let rules = transport::field_rules().unwrap();

    let output = Pipeline::default().run_dataframe(&df, &rules).unwrap();

    assert_eq!(output.frame.height(), 2);
    assert_eq!(output.frame.get(0, "tra_denomination"), Some(&Value::from("ACME")));
    assert_eq!(output.report.get("tra_cleaned_cases").unwrap().len(), 1);
    assert_eq!(output.report.get("tra_missing_columns").unwrap().len(), 3);
}

#[test]
fn datetime_columns_feed_date_fields() {
    let created_on = Series::new("co_created_on".into(), vec![1_710_498_600_000i64])
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
        .unwrap();
    let df = DataFrame::new(vec![
        Series::new("co_id".into(), vec![1i64]).into(),
        Series::new("co_denomination".into(), vec!["ACME"]).into(),
        created_on.into(),
    ])
    .unwrap();
    let rules = companies::field_rules().unwrap();

    let output = Pipeline::default().run_dataframe(&df, &rules).unwrap();

    let expected = chrono::NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
    assert_eq!(output.frame.get(0, "co_created_on"), Some(&Value::Date(expected)));
    assert!(output.report.get("co_date_issues").unwrap().is_empty());
}

#[test]
fn frame_shape_errors_map_to_invalid_input_shape() {
    let err = PipelineError::from(FrameError::DuplicateColumn {
        column: "tra_id".to_string(),
    });
    assert_eq!(err.code(), "invalid-input-shape");
}
