//! The validation-and-metrics engine.
//!
//! `process` is the single entry point: validate -> overall metrics ->
//! per-facility aggregation -> report. The engine holds no state between
//! calls; every call builds and returns its own `Report`.

use tracing::{debug, info};

use crate::domain::{Report, Schema, SchemaKind, ValidatedDataset};
use crate::error::MalformedInputError;
use crate::io::table::RawTable;

pub mod aggregate;
pub mod metrics;
pub mod validate;

pub use aggregate::aggregate_by_facility;
pub use metrics::{compute_metrics, percent_change};
pub use validate::validate;

/// Run the full engine over one table.
///
/// Row-level problems end up in `Report::issues`; only a table that cannot be
/// read at all is an error.
pub fn process(table: &RawTable, schema: &Schema) -> Result<Report, MalformedInputError> {
    let dataset = validate(table, schema)?;
    Ok(build_report(&dataset, schema))
}

/// Same as [`process`], but also hands back the validated dataset so callers
/// can recompute metrics over a subset later.
pub fn process_with_dataset(
    table: &RawTable,
    schema: &Schema,
) -> Result<(Report, ValidatedDataset), MalformedInputError> {
    let dataset = validate(table, schema)?;
    let report = build_report(&dataset, schema);
    Ok((report, dataset))
}

/// Parse CSV bytes, resolve the schema against the headers, and process.
pub fn process_csv(bytes: &[u8], kind: SchemaKind) -> Result<Report, MalformedInputError> {
    let table = RawTable::from_csv_bytes(bytes)?;
    let schema = kind.resolve(table.columns());
    process(&table, &schema)
}

fn build_report(dataset: &ValidatedDataset, schema: &Schema) -> Report {
    if dataset.is_empty() {
        debug!("no rows survived validation; reporting issues only");
    }

    let overall = compute_metrics(dataset.records(), dataset.intensity_scale());
    let facilities = aggregate_by_facility(dataset);

    let rows_accepted = dataset.records().len();
    let report = Report {
        overall,
        intensity_unit: schema.intensity_unit.clone(),
        rows_read: dataset.rows_read(),
        rows_accepted,
        rows_rejected: dataset.rows_read() - rows_accepted,
        facilities,
        issues: dataset.issues().to_vec(),
    };

    info!(
        rows_read = report.rows_read,
        rows_accepted = report.rows_accepted,
        facilities = report.facilities.len(),
        errors = report.error_count(),
        warnings = report.warning_count(),
        "processed emissions table"
    );

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Severity;
    use serde_json::json;

    fn basic(rows: serde_json::Value) -> Report {
        let table = RawTable::from_json(&rows).unwrap();
        process(&table, &Schema::basic()).unwrap()
    }

    #[test]
    fn single_facility_two_years() {
        let report = basic(json!([
            {"facility": "A", "period": 2020, "amount": 100, "output": 50},
            {"facility": "A", "period": 2021, "amount": 150, "output": 50}
        ]));
        assert_eq!(report.overall.total_emissions, 250.0);
        assert_eq!(report.overall.carbon_intensity, Some(2.5));
        assert_eq!(report.overall.trend, Some(50.0));
        assert_eq!(report.facilities.len(), 1);
        assert_eq!(report.facilities[0].id, "A");
        assert_eq!(report.facilities[0].metrics.total_emissions, 250.0);
        assert!(report.issues.is_empty());
    }

    #[test]
    fn all_rows_rejected_still_reports() {
        let report = basic(json!([{"facility": "A", "period": 2020, "output": 50}]));
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].message(), "missing field amount");
        assert_eq!(report.issues[0].severity(), Severity::Error);
        assert_eq!(report.rows_accepted, 0);
        assert_eq!(report.rows_rejected, 1);
        assert_eq!(report.overall.total_emissions, 0.0);
        assert_eq!(report.overall.carbon_intensity, None);
        assert_eq!(report.overall.trend, None);
        assert!(report.facilities.is_empty());
    }

    #[test]
    fn processing_is_idempotent() {
        let rows = json!([
            {"facility": "A", "period": "2024-01", "amount": 1.1, "output": 3},
            {"facility": "B", "period": "2024-02", "amount": -1},
            {"facility": "A", "period": "2024-02", "amount": 2.2, "output": 0}
        ]);
        assert_eq!(basic(rows.clone()), basic(rows));
    }

    #[test]
    fn malformed_upload_is_an_error_not_a_report() {
        let err = process_csv(&[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 0x00], SchemaKind::Auto);
        assert!(err.is_err());
    }

    #[test]
    fn report_json_shape() {
        let report = basic(json!([
            {"facility": "A", "period": 2020, "amount": 10}
        ]));
        let v = serde_json::to_value(&report).unwrap();
        assert_eq!(v["total_emissions"], 10.0);
        assert!(v["carbon_intensity"].is_null());
        assert!(v["trend"].is_null());
        assert_eq!(v["facilities"][0]["id"], "A");
        assert_eq!(v["facilities"][0]["record_count"], 1);
        assert!(v["facilities"][0]["carbon_intensity"].is_null());
        assert_eq!(v["facilities"][0]["amounts_by_column"]["amount"], 10.0);
        assert!(v["total_output"].is_null());
        assert!(v["issues"].as_array().unwrap().is_empty());
    }
}
