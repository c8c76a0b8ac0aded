//! Export a report to disk.
//!
//! - facility CSV: one row per facility, easy to open in a spreadsheet
//! - report JSON: the same document the upload endpoint returns

use std::collections::BTreeSet;
use std::fs::File;
use std::path::Path;

use crate::domain::{Period, Report};
use crate::error::AppError;

const LEADING_COLUMNS: [&str; 4] = ["facility_id", "facility_name", "record_count", "total_emissions"];
const TRAILING_COLUMNS: [&str; 6] = [
    "total_output",
    "carbon_intensity",
    "trend_pct",
    "latest_change_pct",
    "first_period",
    "latest_period",
];

/// Write per-facility metrics to a CSV file.
///
/// Every amount column seen in any facility gets its own column between
/// `total_emissions` and `total_output`; facilities without it show `0`.
pub fn write_facilities_csv(path: &Path, report: &Report) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;
    let mut writer = csv::Writer::from_writer(file);
    let write_err = |e: csv::Error| AppError::new(2, format!("Failed to write export CSV row: {e}"));

    let amount_columns: BTreeSet<&str> = report
        .facilities
        .iter()
        .flat_map(|f| f.metrics.amounts_by_column.keys().map(String::as_str))
        .collect();

    let header = LEADING_COLUMNS
        .into_iter()
        .chain(amount_columns.iter().copied())
        .chain(TRAILING_COLUMNS);
    writer.write_record(header).map_err(write_err)?;

    for f in &report.facilities {
        let m = &f.metrics;
        let mut record = vec![
            f.id.clone(),
            f.name.clone().unwrap_or_default(),
            m.record_count.to_string(),
            m.total_emissions.to_string(),
        ];
        record.extend(
            amount_columns
                .iter()
                .map(|c| m.amounts_by_column.get(*c).copied().unwrap_or(0.0).to_string()),
        );
        record.extend([
            opt_cell(m.total_output),
            opt_cell(m.carbon_intensity),
            opt_cell(m.trend),
            opt_cell(m.latest_change),
            period_cell(m.first_period),
            period_cell(m.latest_period),
        ]);
        writer.write_record(&record).map_err(write_err)?;
    }

    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush export CSV: {e}")))?;
    Ok(())
}

fn opt_cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn period_cell(period: Option<Period>) -> String {
    period.map(|p| p.to_string()).unwrap_or_default()
}

/// Write the full report as pretty JSON.
pub fn write_report_json(path: &Path, report: &Report) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create report JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, report)
        .map_err(|e| AppError::new(2, format!("Failed to write report JSON: {e}")))?;
    Ok(())
}
