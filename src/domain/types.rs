//! Shared domain types.
//!
//! These types are created fresh for each engine call and never mutated after
//! the step that produced them. Outputs are serializable so the CLI and the
//! REST boundary can emit them as JSON.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::domain::Period;

/// One accepted input row, typed.
#[derive(Debug, Clone, PartialEq)]
pub struct EmissionRecord {
    /// 0-based index of the source row in the raw table.
    pub row: usize,
    pub facility_id: String,
    pub facility_name: Option<String>,
    pub period: Period,
    /// Sum of the schema's amount columns. Always `>= 0`.
    pub amount: f64,
    /// Each amount column present on the row, in schema order.
    pub amounts: Vec<(String, f64)>,
    /// Output/production quantity. Only values `> 0` count toward intensity.
    pub output: Option<f64>,
    /// Unit columns as `(column, value)` pairs.
    pub units: Vec<(String, String)>,
}

impl EmissionRecord {
    /// Output usable as an intensity denominator.
    pub fn intensity_output(&self) -> Option<f64> {
        self.output.filter(|o| *o > 0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Row excluded from calculations.
    Error,
    /// Row kept; caller should look at it.
    Warning,
}

/// What went wrong. The severity and message follow from the kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueKind {
    MissingField { column: String },
    InvalidNumeric { column: String },
    InvalidPeriod { column: String },
    NegativeAmount { column: String },
    NonPositiveOutput { column: String },
    UnrecognizedColumn { column: String },
}

impl IssueKind {
    pub fn severity(&self) -> Severity {
        match self {
            IssueKind::MissingField { .. }
            | IssueKind::InvalidNumeric { .. }
            | IssueKind::InvalidPeriod { .. }
            | IssueKind::NegativeAmount { .. } => Severity::Error,
            IssueKind::NonPositiveOutput { .. } | IssueKind::UnrecognizedColumn { .. } => {
                Severity::Warning
            }
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            IssueKind::MissingField { .. } => "missing_field",
            IssueKind::InvalidNumeric { .. } => "invalid_numeric",
            IssueKind::InvalidPeriod { .. } => "invalid_period",
            IssueKind::NegativeAmount { .. } => "negative_amount",
            IssueKind::NonPositiveOutput { .. } => "non_positive_output",
            IssueKind::UnrecognizedColumn { .. } => "unrecognized_column",
        }
    }

    pub fn column(&self) -> &str {
        match self {
            IssueKind::MissingField { column }
            | IssueKind::InvalidNumeric { column }
            | IssueKind::InvalidPeriod { column }
            | IssueKind::NegativeAmount { column }
            | IssueKind::NonPositiveOutput { column }
            | IssueKind::UnrecognizedColumn { column } => column,
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueKind::MissingField { column } => write!(f, "missing field {column}"),
            IssueKind::InvalidNumeric { column } => write!(f, "invalid numeric value in {column}"),
            IssueKind::InvalidPeriod { column } => write!(f, "invalid period value in {column}"),
            IssueKind::NegativeAmount { .. } => f.write_str("negative amount"),
            IssueKind::NonPositiveOutput { .. } => {
                f.write_str("non-positive output; intensity skipped")
            }
            IssueKind::UnrecognizedColumn { .. } => f.write_str("unrecognized column"),
        }
    }
}

/// A flagged problem, tied to a row (or to the whole table when `row` is `None`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "IssueWire")]
pub struct ValidationIssue {
    pub kind: IssueKind,
    pub row: Option<usize>,
}

impl ValidationIssue {
    pub fn row(row: usize, kind: IssueKind) -> Self {
        Self {
            kind,
            row: Some(row),
        }
    }

    pub fn table(kind: IssueKind) -> Self {
        Self { kind, row: None }
    }

    pub fn severity(&self) -> Severity {
        self.kind.severity()
    }

    pub fn message(&self) -> String {
        self.kind.to_string()
    }

    pub fn is_error(&self) -> bool {
        self.severity() == Severity::Error
    }
}

#[derive(Serialize)]
struct IssueWire {
    severity: Severity,
    code: &'static str,
    message: String,
    row: Option<usize>,
    column: String,
}

impl From<ValidationIssue> for IssueWire {
    fn from(issue: ValidationIssue) -> Self {
        IssueWire {
            severity: issue.severity(),
            code: issue.kind.code(),
            message: issue.message(),
            row: issue.row,
            column: issue.kind.column().to_string(),
        }
    }
}

/// Validator output: accepted records plus everything that was flagged.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedDataset {
    records: Vec<EmissionRecord>,
    issues: Vec<ValidationIssue>,
    rows_read: usize,
    intensity_scale: f64,
}

impl ValidatedDataset {
    pub fn new(
        records: Vec<EmissionRecord>,
        issues: Vec<ValidationIssue>,
        rows_read: usize,
        intensity_scale: f64,
    ) -> Self {
        Self {
            records,
            issues,
            rows_read,
            intensity_scale,
        }
    }

    pub fn records(&self) -> &[EmissionRecord] {
        &self.records
    }

    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    pub fn rows_read(&self) -> usize {
        self.rows_read
    }

    pub fn intensity_scale(&self) -> f64 {
        self.intensity_scale
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Emissions summed over one reporting period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodTotal {
    pub period: Period,
    pub total_emissions: f64,
    pub record_count: usize,
}

/// Derived metrics over a set of records.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Metrics {
    pub total_emissions: f64,
    /// Emissions split by source column (e.g. per scope).
    pub amounts_by_column: BTreeMap<String, f64>,
    /// Sum of every reported output, positive or not. `None` when no record
    /// carries one.
    pub total_output: Option<f64>,
    /// `None` when no record has a positive output.
    pub carbon_intensity: Option<f64>,
    /// Percent change from the earliest to the latest period.
    pub trend: Option<f64>,
    /// Percent change between the two most recent periods.
    pub latest_change: Option<f64>,
    pub record_count: usize,
    pub first_period: Option<Period>,
    pub latest_period: Option<Period>,
    pub periods: Vec<PeriodTotal>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FacilityMetrics {
    pub id: String,
    pub name: Option<String>,
    #[serde(flatten)]
    pub metrics: Metrics,
}

/// Result of one engine call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    #[serde(flatten)]
    pub overall: Metrics,
    pub intensity_unit: String,
    pub rows_read: usize,
    pub rows_accepted: usize,
    pub rows_rejected: usize,
    pub facilities: Vec<FacilityMetrics>,
    pub issues: Vec<ValidationIssue>,
}

impl Report {
    pub fn facility(&self, id: &str) -> Option<&FacilityMetrics> {
        self.facilities.iter().find(|f| f.id == id)
    }

    pub fn error_count(&self) -> usize {
        self.issues.iter().filter(|i| i.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.issues.len() - self.error_count()
    }

    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(ValidationIssue::is_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_messages_and_severity() {
        let missing = IssueKind::MissingField {
            column: "amount".to_string(),
        };
        assert_eq!(missing.to_string(), "missing field amount");
        assert_eq!(missing.severity(), Severity::Error);

        let output = IssueKind::NonPositiveOutput {
            column: "output".to_string(),
        };
        assert_eq!(output.to_string(), "non-positive output; intensity skipped");
        assert_eq!(output.severity(), Severity::Warning);
    }

    #[test]
    fn issue_serializes_flat() {
        let issue = ValidationIssue::row(
            3,
            IssueKind::InvalidNumeric {
                column: "revenue".to_string(),
            },
        );
        let v = serde_json::to_value(&issue).unwrap();
        assert_eq!(v["severity"], "error");
        assert_eq!(v["code"], "invalid_numeric");
        assert_eq!(v["message"], "invalid numeric value in revenue");
        assert_eq!(v["row"], 3);
        assert_eq!(v["column"], "revenue");

        let table = ValidationIssue::table(IssueKind::UnrecognizedColumn {
            column: "notes".to_string(),
        });
        let v = serde_json::to_value(&table).unwrap();
        assert!(v["row"].is_null());
        assert_eq!(v["severity"], "warning");
    }

    #[test]
    fn intensity_output_ignores_non_positive() {
        let mut record = EmissionRecord {
            row: 0,
            facility_id: "A".to_string(),
            facility_name: None,
            period: Period::year(2020),
            amount: 1.0,
            amounts: vec![("amount".to_string(), 1.0)],
            output: Some(0.0),
            units: Vec::new(),
        };
        assert_eq!(record.intensity_output(), None);
        record.output = Some(2.0);
        assert_eq!(record.intensity_output(), Some(2.0));
    }
}
