//! `emx selftest`: run the engine on fixed inputs and check the answers.

use serde_json::json;

use crate::data::SAMPLE_CSV;
use crate::domain::{Schema, SchemaKind};
use crate::engine::{process, process_csv};
use crate::error::AppError;
use crate::io::RawTable;

type Check = (&'static str, fn() -> Result<(), String>);

const CHECKS: [Check; 4] = [
    ("two-period facility", two_period_facility),
    ("missing amount", missing_amount),
    ("malformed upload", malformed_upload),
    ("bundled sample", bundled_sample),
];

pub fn run() -> Result<(), AppError> {
    let mut failed = 0;
    for (name, check) in CHECKS {
        match check() {
            Ok(()) => println!("✓ {name}"),
            Err(reason) => {
                failed += 1;
                println!("✗ {name}: {reason}");
            }
        }
    }

    if failed > 0 {
        return Err(AppError::new(4, format!("{failed} self-test check(s) failed")));
    }
    println!("all {} checks passed", CHECKS.len());
    Ok(())
}

fn ensure(cond: bool, what: impl FnOnce() -> String) -> Result<(), String> {
    if cond { Ok(()) } else { Err(what()) }
}

fn basic(rows: serde_json::Value) -> Result<crate::domain::Report, String> {
    let table = RawTable::from_json(&rows).map_err(|e| e.to_string())?;
    process(&table, &Schema::basic()).map_err(|e| e.to_string())
}

fn two_period_facility() -> Result<(), String> {
    let report = basic(json!([
        {"facility": "A", "period": 2020, "amount": 100, "output": 50},
        {"facility": "A", "period": 2021, "amount": 150, "output": 50}
    ]))?;
    ensure(report.overall.total_emissions == 250.0, || {
        format!("total {} != 250", report.overall.total_emissions)
    })?;
    ensure(report.overall.carbon_intensity == Some(2.5), || {
        format!("intensity {:?} != 2.5", report.overall.carbon_intensity)
    })?;
    ensure(report.overall.trend == Some(50.0), || {
        format!("trend {:?} != +50%", report.overall.trend)
    })?;
    ensure(report.facilities.len() == 1, || {
        format!("{} facilities, expected 1", report.facilities.len())
    })
}

fn missing_amount() -> Result<(), String> {
    let report = basic(json!([{"facility": "A", "period": 2020, "output": 50}]))?;
    let messages: Vec<String> = report.issues.iter().map(|i| i.message()).collect();
    ensure(messages == ["missing field amount"], || format!("issues {messages:?}"))?;
    ensure(report.rows_accepted == 0 && report.facilities.is_empty(), || {
        "rows were retained".to_string()
    })
}

fn malformed_upload() -> Result<(), String> {
    ensure(process_csv(&[0x00, 0xff, 0x13, 0x37], SchemaKind::Auto).is_err(), || {
        "binary upload produced a report".to_string()
    })
}

fn bundled_sample() -> Result<(), String> {
    let report = process_csv(SAMPLE_CSV.as_bytes(), SchemaKind::Auto).map_err(|e| e.to_string())?;
    ensure(report.rows_accepted == 4 && report.error_count() == 1, || {
        format!(
            "accepted {} rows with {} errors",
            report.rows_accepted,
            report.error_count()
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_checks_pass() {
        for (name, check) in CHECKS {
            assert_eq!(check(), Ok(()), "{name}");
        }
    }
}
