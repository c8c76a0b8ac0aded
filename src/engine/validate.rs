//! Schema/row validation.
//!
//! Turns a `RawTable` into a `ValidatedDataset`:
//! - **Column lookups by name happen only here**; accepted rows leave as typed
//!   `EmissionRecord`s
//! - **Row-level problems never fail the call**; they become issues and the
//!   row is either dropped (error) or kept (warning)
//! - **Deterministic**: rows keep their input order, issues follow row order

use serde_json::Value;
use tracing::{debug, trace};

use crate::domain::{
    EmissionRecord, IssueKind, Period, PeriodColumns, Schema, ValidatedDataset, ValidationIssue,
};
use crate::domain::period::{valid_year, whole_number};
use crate::error::MalformedInputError;
use crate::io::table::{RawRow, RawTable};

/// Validate every row of `table` against `schema`.
///
/// Fails only when the table has rows but no columns at all.
pub fn validate(table: &RawTable, schema: &Schema) -> Result<ValidatedDataset, MalformedInputError> {
    if table.columns().is_empty() && !table.is_empty() {
        return Err(MalformedInputError::new("table has rows but no columns"));
    }

    let mut issues: Vec<ValidationIssue> = table
        .columns()
        .iter()
        .filter(|c| !schema.is_known(c))
        .map(|c| ValidationIssue::table(IssueKind::UnrecognizedColumn { column: c.clone() }))
        .collect();

    let mut records = Vec::with_capacity(table.len());
    for (idx, row) in table.rows().iter().enumerate() {
        let checked = check_row(idx, row, schema);
        match checked.record {
            Some(record) => {
                trace!(row = idx, facility = %record.facility_id, "row accepted");
                records.push(record);
            }
            None => debug!(row = idx, issues = checked.issues.len(), "row rejected"),
        }
        issues.extend(checked.issues);
    }

    debug!(
        rows_read = table.len(),
        rows_accepted = records.len(),
        issues = issues.len(),
        "validation finished"
    );

    Ok(ValidatedDataset::new(
        records,
        issues,
        table.len(),
        schema.intensity_scale,
    ))
}

struct CheckedRow {
    record: Option<EmissionRecord>,
    issues: Vec<ValidationIssue>,
}

fn check_row(idx: usize, row: &RawRow, schema: &Schema) -> CheckedRow {
    // A negative amount rejects the row with that single error, whatever
    // else is wrong with it.
    let negative = schema
        .amounts
        .iter()
        .find(|c| cell(row, c.as_str()).and_then(parse_number).is_some_and(|v| v < 0.0));
    if let Some(column) = negative {
        return CheckedRow {
            record: None,
            issues: vec![ValidationIssue::row(
                idx,
                IssueKind::NegativeAmount {
                    column: column.clone(),
                },
            )],
        };
    }

    let mut issues = Vec::new();
    let report = |kind: IssueKind, issues: &mut Vec<ValidationIssue>| {
        issues.push(ValidationIssue::row(idx, kind));
    };

    // 1) Required columns, plus the columns a record cannot exist without.
    let mut missing: Vec<&str> = schema
        .required
        .iter()
        .map(String::as_str)
        .filter(|c| cell(row, c).is_none())
        .collect();
    let essential = std::iter::once(schema.facility.as_str()).chain(schema.period.names());
    for column in essential {
        if cell(row, column).is_none() && !missing.contains(&column) {
            missing.push(column);
        }
    }
    let any_amount = schema.amounts.iter().any(|c| cell(row, c).is_some());
    if !any_amount {
        if let Some(first) = schema.amounts.first() {
            if !missing.contains(&first.as_str()) {
                missing.push(first);
            }
        }
    }
    for column in missing {
        report(
            IssueKind::MissingField {
                column: column.to_string(),
            },
            &mut issues,
        );
    }

    // 2) Numeric columns.
    let mut numbers: Vec<(&str, f64)> = Vec::new();
    for column in &schema.numeric {
        let Some(value) = cell(row, column) else { continue };
        match parse_number(value) {
            Some(v) => numbers.push((column.as_str(), v)),
            None => report(
                IssueKind::InvalidNumeric {
                    column: column.clone(),
                },
                &mut issues,
            ),
        }
    }
    let number = |column: &str| numbers.iter().find(|(c, _)| *c == column).map(|(_, v)| *v);

    // 3) Period.
    let period = match parse_period(row, &schema.period) {
        Ok(period) => period,
        Err(column) => {
            report(IssueKind::InvalidPeriod { column }, &mut issues);
            None
        }
    };

    let amounts: Vec<(String, f64)> = schema
        .amounts
        .iter()
        .filter_map(|c| number(c.as_str()).map(|v| (c.clone(), v)))
        .collect();
    let amount: f64 = amounts.iter().map(|(_, v)| v).sum();
    let output = schema.output.as_deref().and_then(number);
    let facility_id = cell(row, &schema.facility).map(cell_text);

    let (Some(facility_id), Some(period)) = (facility_id, period) else {
        return CheckedRow {
            record: None,
            issues,
        };
    };
    if issues.iter().any(ValidationIssue::is_error) {
        return CheckedRow {
            record: None,
            issues,
        };
    }

    if let (Some(column), Some(o)) = (schema.output.as_ref(), output) {
        if o <= 0.0 {
            report(
                IssueKind::NonPositiveOutput {
                    column: column.clone(),
                },
                &mut issues,
            );
        }
    }

    let facility_name = schema
        .facility_name
        .as_deref()
        .and_then(|c| cell(row, c))
        .map(cell_text);
    let units = schema
        .units
        .iter()
        .filter_map(|c| cell(row, c).map(|v| (c.clone(), cell_text(v))))
        .collect();

    CheckedRow {
        record: Some(EmissionRecord {
            row: idx,
            facility_id,
            facility_name,
            period,
            amount,
            amounts,
            output,
            units,
        }),
        issues,
    }
}

/// A present, non-blank cell.
fn cell<'a>(row: &'a RawRow, column: &str) -> Option<&'a Value> {
    match row.get(column)? {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        v => Some(v),
    }
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

fn parse_number(value: &Value) -> Option<f64> {
    let v = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    v.is_finite().then_some(v)
}

/// `Ok(None)` when the period cells are missing (already reported),
/// `Err(column)` when a present cell does not parse.
fn parse_period(row: &RawRow, columns: &PeriodColumns) -> Result<Option<Period>, String> {
    match columns {
        PeriodColumns::Single(column) => {
            let Some(value) = cell(row, column) else { return Ok(None) };
            let parsed = match value {
                Value::Number(n) => n
                    .as_f64()
                    .and_then(whole_number)
                    .and_then(valid_year)
                    .map(Period::year),
                Value::String(s) => s.parse::<Period>().ok(),
                _ => None,
            };
            parsed.map(Some).ok_or_else(|| column.clone())
        }
        PeriodColumns::YearMonth { year, month } => {
            let (Some(y), Some(m)) = (cell(row, year), cell(row, month)) else {
                return Ok(None);
            };
            let y = parse_number(y)
                .and_then(whole_number)
                .and_then(valid_year)
                .ok_or_else(|| year.clone())?;
            let m = parse_number(m)
                .and_then(whole_number)
                .and_then(|m| u32::try_from(m).ok())
                .ok_or_else(|| month.clone())?;
            Period::year_month(y, m)
                .map(Some)
                .ok_or_else(|| month.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Severity;
    use serde_json::json;

    fn table(rows: Value) -> RawTable {
        RawTable::from_json(&rows).unwrap()
    }

    fn messages(ds: &ValidatedDataset) -> Vec<String> {
        ds.issues().iter().map(ValidationIssue::message).collect()
    }

    #[test]
    fn valid_rows_pass_untouched() {
        let t = table(json!([
            {"facility": "A", "period": 2020, "amount": 100, "output": 50},
            {"facility": "B", "period": "2021-02", "amount": "0", "unit": "tCO2e"}
        ]));
        let ds = validate(&t, &Schema::basic()).unwrap();
        assert!(ds.issues().is_empty(), "{:?}", ds.issues());
        assert_eq!(ds.records().len(), 2);

        let a = &ds.records()[0];
        assert_eq!(a.facility_id, "A");
        assert_eq!(a.period, Period::year(2020));
        assert_eq!(a.amount, 100.0);
        assert_eq!(a.output, Some(50.0));

        let b = &ds.records()[1];
        assert_eq!(b.period, Period::year_month(2021, 2).unwrap());
        assert_eq!(b.output, None);
        assert_eq!(b.units, vec![("unit".to_string(), "tCO2e".to_string())]);
    }

    #[test]
    fn negative_amount_yields_exactly_one_error() {
        let t = table(json!([
            {"facility": "A", "period": 2020, "amount": -5, "output": 10},
            {"facility": "A", "period": 2021, "amount": 5, "output": 10}
        ]));
        let ds = validate(&t, &Schema::basic()).unwrap();
        assert_eq!(ds.records().len(), 1);
        assert_eq!(ds.issues().len(), 1);
        let issue = &ds.issues()[0];
        assert_eq!(issue.row, Some(0));
        assert_eq!(issue.severity(), Severity::Error);
        assert_eq!(issue.message(), "negative amount");
    }

    #[test]
    fn negative_amount_hides_other_problems_on_the_row() {
        let t = table(json!([
            {"facility": "A", "period": 2020, "amount": -1, "output": "x"},
            {"period": "someday", "amount": "-2"}
        ]));
        let ds = validate(&t, &Schema::basic()).unwrap();
        assert!(ds.is_empty());
        assert_eq!(messages(&ds), ["negative amount", "negative amount"]);
        let rows: Vec<_> = ds.issues().iter().map(|i| i.row).collect();
        assert_eq!(rows, [Some(0), Some(1)]);
    }

    #[test]
    fn unknown_column_warnings_follow_header_order() {
        let t = table(json!([
            {"zeta": 1, "facility": "A", "period": 2020, "amount": 1, "alpha": 2}
        ]));
        let ds = validate(&t, &Schema::basic()).unwrap();
        let columns: Vec<&str> = ds.issues().iter().map(|i| i.kind.column()).collect();
        assert_eq!(columns, ["zeta", "alpha"]);
    }

    #[test]
    fn missing_amount_is_reported_by_name() {
        let t = table(json!([{"facility": "A", "period": 2020, "output": 10}]));
        let ds = validate(&t, &Schema::basic()).unwrap();
        assert!(ds.is_empty());
        assert_eq!(messages(&ds), ["missing field amount"]);
    }

    #[test]
    fn non_numeric_value_rejects_row() {
        let t = table(json!([{"facility": "A", "period": 2020, "amount": "lots"}]));
        let ds = validate(&t, &Schema::basic()).unwrap();
        assert!(ds.is_empty());
        assert_eq!(messages(&ds), ["invalid numeric value in amount"]);
    }

    #[test]
    fn non_positive_output_is_a_warning() {
        let t = table(json!([{"facility": "A", "period": 2020, "amount": 3, "output": 0}]));
        let ds = validate(&t, &Schema::basic()).unwrap();
        assert_eq!(ds.records().len(), 1);
        assert_eq!(ds.records()[0].output, Some(0.0));
        assert_eq!(messages(&ds), ["non-positive output; intensity skipped"]);
        assert_eq!(ds.issues()[0].severity(), Severity::Warning);
    }

    #[test]
    fn unknown_columns_warn_once_per_column() {
        let t = table(json!([
            {"facility": "A", "period": 2020, "amount": 1, "notes": "x"},
            {"facility": "A", "period": 2021, "amount": 2, "notes": "y"}
        ]));
        let ds = validate(&t, &Schema::basic()).unwrap();
        assert_eq!(ds.records().len(), 2);
        assert_eq!(ds.issues().len(), 1);
        assert_eq!(ds.issues()[0].row, None);
        assert_eq!(ds.issues()[0].kind.column(), "notes");
    }

    #[test]
    fn reports_every_problem_on_a_row() {
        let t = table(json!([{"period": "someday", "amount": "-"}]));
        let ds = validate(&t, &Schema::basic()).unwrap();
        assert_eq!(
            messages(&ds),
            [
                "missing field facility",
                "invalid numeric value in amount",
                "invalid period value in period"
            ]
        );
    }

    #[test]
    fn scoped_rows_sum_scopes_and_check_month() {
        let t = RawTable::from_csv_str(
            "facility_id,facility_name,month,year,scope1_emissions,scope2_emissions,revenue\n\
             F001,HQ,1,2024,150.5,80.2,500000\n\
             F002,Office,13,2024,45,120,300000\n",
        )
        .unwrap();
        let ds = validate(&t, &Schema::scoped()).unwrap();
        assert_eq!(ds.records().len(), 1);
        let r = &ds.records()[0];
        assert!((r.amount - 230.7).abs() < 1e-9);
        assert_eq!(
            r.amounts,
            vec![
                ("scope1_emissions".to_string(), 150.5),
                ("scope2_emissions".to_string(), 80.2)
            ]
        );
        assert_eq!(r.facility_name.as_deref(), Some("HQ"));
        assert_eq!(r.period, Period::year_month(2024, 1).unwrap());
        assert_eq!(messages(&ds), ["invalid period value in month"]);
        assert_eq!(ds.issues()[0].row, Some(1));
    }

    #[test]
    fn custom_required_set_is_honoured() {
        let schema = Schema::basic().with_required(["facility", "period", "amount", "output"]);
        let t = table(json!([{"facility": "A", "period": 2020, "amount": 1}]));
        let ds = validate(&t, &schema).unwrap();
        assert!(ds.is_empty());
        assert_eq!(messages(&ds), ["missing field output"]);
    }

    #[test]
    fn rows_without_columns_are_malformed() {
        let t = table(json!([{}, {}]));
        assert!(validate(&t, &Schema::basic()).is_err());
        assert!(validate(&RawTable::default(), &Schema::basic()).is_ok());
    }
}
