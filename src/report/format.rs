//! Formatted terminal output.
//!
//! We keep formatting code in one place so the engine stays free of
//! presentation concerns and output changes are localized.

use crate::domain::{FacilityMetrics, Report, Severity, ValidationIssue};

/// Full summary: validation, overall metrics, facilities, trends.
pub fn format_report(report: &Report) -> String {
    let mut out = String::new();

    out.push_str("=== emx - Emissions Report ===\n");
    out.push_str(&format!(
        "Rows: read={} accepted={} rejected={}\n",
        report.rows_read, report.rows_accepted, report.rows_rejected
    ));

    out.push_str("\n1. Validation\n");
    out.push_str(&format_issues(&report.issues));

    out.push_str("\n2. Overall metrics\n");
    out.push_str(&format!(
        "   Total emissions : {:.2} tCO2e\n",
        report.overall.total_emissions
    ));
    out.push_str(&format!(
        "   Carbon intensity: {} ({})\n",
        fmt_opt(report.overall.carbon_intensity),
        report.intensity_unit
    ));
    out.push_str(&format!(
        "   Trend           : {}{}\n",
        fmt_pct(report.overall.trend),
        fmt_span(report)
    ));

    out.push_str("\n3. Facilities\n");
    if report.facilities.is_empty() {
        out.push_str("   (none)\n");
    } else {
        out.push_str(&format_facility_table(&report.facilities));
    }

    out.push_str("\n4. Period-over-period change\n");
    for f in &report.facilities {
        let latest = f
            .metrics
            .latest_period
            .map(|p| p.to_string())
            .unwrap_or_else(|| "-".to_string());
        out.push_str(&format!(
            "   {} (latest {latest}): {}\n",
            display_name(f),
            fmt_pct(f.metrics.latest_change)
        ));
    }

    out
}

/// Issue list, errors first.
pub fn format_issues(issues: &[ValidationIssue]) -> String {
    let errors: Vec<&ValidationIssue> = issues.iter().filter(|i| i.is_error()).collect();
    let warnings: Vec<&ValidationIssue> = issues.iter().filter(|i| !i.is_error()).collect();

    let mut out = String::new();
    out.push_str(&format!("   Errors: {}\n", errors.len()));
    for issue in errors {
        out.push_str(&format!("   {}\n", format_issue(issue)));
    }
    out.push_str(&format!("   Warnings: {}\n", warnings.len()));
    for issue in warnings {
        out.push_str(&format!("   {}\n", format_issue(issue)));
    }
    out
}

pub fn format_issue(issue: &ValidationIssue) -> String {
    let tag = match issue.severity() {
        Severity::Error => "[error]",
        Severity::Warning => "[warn] ",
    };
    let at = match issue.row {
        Some(row) => format!("row {row}"),
        None => "table".to_string(),
    };
    format!("{tag} {at}: {} ({})", issue.message(), issue.kind.column())
}

/// One facility as a small block (`emx facility --text`).
pub fn format_facility(f: &FacilityMetrics) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", display_name(f)));
    out.push_str(&format!("- Records         : {}\n", f.metrics.record_count));
    out.push_str(&format!(
        "- Total emissions : {:.2} tCO2e\n",
        f.metrics.total_emissions
    ));
    for (column, total) in &f.metrics.amounts_by_column {
        out.push_str(&format!("    {column:<18}: {total:.2}\n"));
    }
    out.push_str(&format!("- Total output    : {}\n", fmt_opt(f.metrics.total_output)));
    out.push_str(&format!(
        "- Carbon intensity: {}\n",
        fmt_opt(f.metrics.carbon_intensity)
    ));
    out.push_str(&format!("- Trend           : {}\n", fmt_pct(f.metrics.trend)));
    for p in &f.metrics.periods {
        out.push_str(&format!(
            "  {:<8} {:>12.2} ({} rows)\n",
            p.period.to_string(),
            p.total_emissions,
            p.record_count
        ));
    }
    out
}

fn format_facility_table(facilities: &[FacilityMetrics]) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "   {:<12} {:<24} {:>6} {:>14} {:>12} {:>9}\n",
            "id", "name", "rows", "emissions", "intensity", "trend"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(
        format!(
            "   {:-<12} {:-<24} {:-<6} {:-<14} {:-<12} {:-<9}\n",
            "", "", "", "", "", ""
        )
        .trim_end(),
    );
    out.push('\n');

    for f in facilities {
        out.push_str(
            format!(
                "   {:<12} {:<24} {:>6} {:>14.2} {:>12} {:>9}\n",
                truncate(&f.id, 12),
                truncate(f.name.as_deref().unwrap_or(""), 24),
                f.metrics.record_count,
                f.metrics.total_emissions,
                fmt_opt(f.metrics.carbon_intensity),
                fmt_pct(f.metrics.trend),
            )
            .trim_end(),
        );
        out.push('\n');
    }
    out
}

fn display_name(f: &FacilityMetrics) -> String {
    match &f.name {
        Some(name) => format!("{name} ({})", f.id),
        None => f.id.clone(),
    }
}

fn fmt_span(report: &Report) -> String {
    match (report.overall.first_period, report.overall.latest_period) {
        (Some(a), Some(b)) if a != b => format!(" ({a} -> {b})"),
        _ => String::new(),
    }
}

fn fmt_opt(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{v:.2}"),
        _ => "N/A".to_string(),
    }
}

fn fmt_pct(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{v:+.1}%"),
        _ => "N/A".to_string(),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::SAMPLE_CSV;
    use crate::domain::{IssueKind, SchemaKind};
    use crate::engine::process_csv;

    #[test]
    fn sample_report_mentions_facilities_and_issue() {
        let report = process_csv(SAMPLE_CSV.as_bytes(), SchemaKind::Auto).unwrap();
        let text = format_report(&report);
        assert!(text.contains("Rows: read=5 accepted=4 rejected=1"));
        assert!(text.contains("Malaysia HQ"));
        assert!(text.contains("Singapore Office (F002)"));
        assert!(text.contains("[error] row 4: invalid numeric value in scope1_emissions"));
        assert!(!text.contains("Jakarta"));
    }

    #[test]
    fn facility_block_lists_scopes_and_periods() {
        let report = process_csv(SAMPLE_CSV.as_bytes(), SchemaKind::Auto).unwrap();
        let text = format_facility(report.facility("F001").unwrap());
        assert!(text.starts_with("Malaysia HQ (F001)\n"));
        assert!(text.contains("- Records         : 2"));
        assert!(text.contains("    scope1_emissions  : 295.50"));
        assert!(text.contains("- Total output    : 1020000.00"));
        assert!(text.contains("2024-02"));
    }

    #[test]
    fn percent_formatting() {
        assert_eq!(fmt_pct(Some(50.0)), "+50.0%");
        assert_eq!(fmt_pct(Some(-3.125)), "-3.1%");
        assert_eq!(fmt_pct(None), "N/A");
        assert_eq!(fmt_opt(None), "N/A");
    }

    #[test]
    fn table_level_issue_has_no_row() {
        let issue = ValidationIssue::table(IssueKind::UnrecognizedColumn {
            column: "notes".to_string(),
        });
        assert_eq!(format_issue(&issue), "[warn]  table: unrecognized column (notes)");
    }

    #[test]
    fn truncate_long_names() {
        assert_eq!(truncate("abcdef", 4), "abc…");
        assert_eq!(truncate("abc", 4), "abc");
    }
}
