//! Metrics over validated records: totals, carbon intensity, trends.

use std::collections::BTreeMap;

use crate::domain::{EmissionRecord, Metrics, Period, PeriodTotal};

/// Compute metrics over `records` in a single pass.
///
/// - intensity only looks at records with output > 0 and is `None` when there
///   are none
/// - records sharing a period are summed before trends are taken
/// - `intensity_scale` converts output units (1e6 gives "per $1M revenue")
pub fn compute_metrics<'a, I>(records: I, intensity_scale: f64) -> Metrics
where
    I: IntoIterator<Item = &'a EmissionRecord>,
{
    let mut total = 0.0;
    let mut count = 0usize;
    let mut covered_emissions = 0.0;
    let mut covered_output = 0.0;
    let mut total_output: Option<f64> = None;
    let mut amounts_by_column: BTreeMap<String, f64> = BTreeMap::new();
    let mut by_period: BTreeMap<Period, (f64, usize)> = BTreeMap::new();

    for r in records {
        total += r.amount;
        count += 1;
        if let Some(output) = r.intensity_output() {
            covered_emissions += r.amount;
            covered_output += output;
        }
        if let Some(output) = r.output {
            *total_output.get_or_insert(0.0) += output;
        }
        for (column, value) in &r.amounts {
            *amounts_by_column.entry(column.clone()).or_insert(0.0) += value;
        }
        let slot = by_period.entry(r.period).or_insert((0.0, 0));
        slot.0 += r.amount;
        slot.1 += 1;
    }

    let carbon_intensity = if covered_output > 0.0 {
        Some(covered_emissions / (covered_output / intensity_scale)).filter(|v| v.is_finite())
    } else {
        None
    };

    let periods: Vec<PeriodTotal> = by_period
        .into_iter()
        .map(|(period, (total_emissions, record_count))| PeriodTotal {
            period,
            total_emissions,
            record_count,
        })
        .collect();

    let (trend, latest_change) = match periods.as_slice() {
        [first, .., prev, last] => (
            percent_change(first.total_emissions, last.total_emissions),
            percent_change(prev.total_emissions, last.total_emissions),
        ),
        [first, last] => {
            let change = percent_change(first.total_emissions, last.total_emissions);
            (change, change)
        }
        _ => (None, None),
    };

    Metrics {
        total_emissions: total,
        amounts_by_column,
        total_output,
        carbon_intensity,
        trend,
        latest_change,
        record_count: count,
        first_period: periods.first().map(|p| p.period),
        latest_period: periods.last().map(|p| p.period),
        periods,
    }
}

/// Percent change from `from` to `to`; undefined when `from` is zero.
pub fn percent_change(from: f64, to: f64) -> Option<f64> {
    if from == 0.0 {
        return None;
    }
    let pct = (to - from) / from * 100.0;
    pct.is_finite().then_some(pct)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(facility: &str, period: Period, amount: f64, output: Option<f64>) -> EmissionRecord {
        EmissionRecord {
            row: 0,
            facility_id: facility.to_string(),
            facility_name: None,
            period,
            amount,
            amounts: vec![("amount".to_string(), amount)],
            output,
            units: Vec::new(),
        }
    }

    #[test]
    fn two_year_scenario() {
        let records = vec![
            record("A", Period::year(2020), 100.0, Some(50.0)),
            record("A", Period::year(2021), 150.0, Some(50.0)),
        ];
        let m = compute_metrics(&records, 1.0);
        assert_eq!(m.total_emissions, 250.0);
        assert_eq!(m.carbon_intensity, Some(2.5));
        assert_eq!(m.trend, Some(50.0));
        assert_eq!(m.latest_change, Some(50.0));
        assert_eq!(m.record_count, 2);
        assert_eq!(m.first_period, Some(Period::year(2020)));
        assert_eq!(m.latest_period, Some(Period::year(2021)));
    }

    #[test]
    fn intensity_undefined_without_positive_output() {
        let records = vec![
            record("A", Period::year(2020), 10.0, None),
            record("A", Period::year(2020), 10.0, Some(0.0)),
            record("A", Period::year(2020), 10.0, Some(-3.0)),
        ];
        let m = compute_metrics(&records, 1.0);
        assert_eq!(m.total_emissions, 30.0);
        assert_eq!(m.carbon_intensity, None);
    }

    #[test]
    fn intensity_ignores_rows_without_output() {
        let records = vec![
            record("A", Period::year(2020), 10.0, Some(5.0)),
            record("A", Period::year(2020), 90.0, None),
        ];
        let m = compute_metrics(&records, 1.0);
        assert_eq!(m.carbon_intensity, Some(2.0));
    }

    #[test]
    fn intensity_scale_reports_per_million() {
        let records = vec![record("F", Period::year(2024), 230.7, Some(500_000.0))];
        let m = compute_metrics(&records, 1_000_000.0);
        assert!((m.carbon_intensity.unwrap() - 461.4).abs() < 1e-9);
    }

    #[test]
    fn ties_within_period_are_summed_before_trend() {
        let records = vec![
            record("A", Period::year(2021), 60.0, None),
            record("B", Period::year(2020), 50.0, None),
            record("A", Period::year(2020), 50.0, None),
            record("B", Period::year(2021), 90.0, None),
        ];
        let m = compute_metrics(&records, 1.0);
        assert_eq!(m.periods.len(), 2);
        assert_eq!(m.periods[0].total_emissions, 100.0);
        assert_eq!(m.periods[0].record_count, 2);
        assert_eq!(m.trend, Some(50.0));
    }

    #[test]
    fn trend_needs_two_periods_and_nonzero_base() {
        let single = vec![record("A", Period::year(2020), 10.0, None)];
        assert_eq!(compute_metrics(&single, 1.0).trend, None);

        let zero_base = vec![
            record("A", Period::year(2020), 0.0, None),
            record("A", Period::year(2021), 10.0, None),
        ];
        assert_eq!(compute_metrics(&zero_base, 1.0).trend, None);
    }

    #[test]
    fn latest_change_uses_last_two_periods() {
        let records = vec![
            record("A", Period::year_month(2024, 1).unwrap(), 100.0, None),
            record("A", Period::year_month(2024, 2).unwrap(), 200.0, None),
            record("A", Period::year_month(2024, 3).unwrap(), 150.0, None),
        ];
        let m = compute_metrics(&records, 1.0);
        assert_eq!(m.trend, Some(50.0));
        assert_eq!(m.latest_change, Some(-25.0));
    }

    #[test]
    fn sums_output_and_amount_columns() {
        let mut scoped = record("A", Period::year(2020), 30.0, Some(100.0));
        scoped.amounts = vec![
            ("scope1_emissions".to_string(), 10.0),
            ("scope2_emissions".to_string(), 20.0),
        ];
        let records = vec![
            scoped,
            record("A", Period::year(2021), 5.0, Some(-4.0)),
            record("A", Period::year(2021), 5.0, None),
        ];
        let m = compute_metrics(&records, 1.0);
        assert_eq!(m.total_output, Some(96.0));
        assert_eq!(m.amounts_by_column["scope1_emissions"], 10.0);
        assert_eq!(m.amounts_by_column["scope2_emissions"], 20.0);
        assert_eq!(m.amounts_by_column["amount"], 10.0);

        let none = vec![record("A", Period::year(2020), 1.0, None)];
        assert_eq!(compute_metrics(&none, 1.0).total_output, None);
    }

    #[test]
    fn empty_input_has_zero_total_and_undefined_ratios() {
        let m = compute_metrics(&Vec::<EmissionRecord>::new(), 1.0);
        assert_eq!(m, Metrics::default());
    }
}
