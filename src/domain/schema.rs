//! Column configuration for an upload.
//!
//! The validator is the only place that looks columns up by name; everything
//! downstream works on typed records. A `Schema` tells it which names to use.

use clap::ValueEnum;

/// Which column preset to validate against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SchemaKind {
    /// `scoped` when the headers carry scope emission columns, else `basic`.
    Auto,
    /// `facility, period, amount, output`.
    Basic,
    /// `facility_id, facility_name, month, year, scope1_emissions,
    /// scope2_emissions, revenue` (scope3 optional).
    Scoped,
}

impl SchemaKind {
    /// Resolve to a concrete schema, looking at the table headers for `Auto`.
    pub fn resolve(self, headers: &[String]) -> Schema {
        match self {
            SchemaKind::Basic => Schema::basic(),
            SchemaKind::Scoped => Schema::scoped(),
            SchemaKind::Auto => {
                let scoped = headers
                    .iter()
                    .any(|h| h == "scope1_emissions" || h == "scope2_emissions");
                if scoped {
                    Schema::scoped()
                } else {
                    Schema::basic()
                }
            }
        }
    }
}

/// Where the reporting period lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeriodColumns {
    /// One column holding `YYYY`, `YYYY-MM` or a date.
    Single(String),
    /// Separate integer year and month columns.
    YearMonth { year: String, month: String },
}

impl PeriodColumns {
    pub fn names(&self) -> Vec<&str> {
        match self {
            PeriodColumns::Single(c) => vec![c.as_str()],
            PeriodColumns::YearMonth { year, month } => vec![year.as_str(), month.as_str()],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub facility: String,
    pub facility_name: Option<String>,
    pub period: PeriodColumns,
    /// Emission columns; a record's amount is their sum.
    pub amounts: Vec<String>,
    /// Production/revenue column used as the intensity denominator.
    pub output: Option<String>,
    /// Free-text unit columns carried onto the record untouched.
    pub units: Vec<String>,
    /// Columns that must be present and non-empty on every row.
    pub required: Vec<String>,
    /// Columns whose values must parse as numbers when present.
    pub numeric: Vec<String>,
    /// Intensity is reported per `1 / intensity_scale` units of output.
    pub intensity_scale: f64,
    pub intensity_unit: String,
}

impl Schema {
    pub fn basic() -> Self {
        Self {
            facility: "facility".to_string(),
            facility_name: Some("facility_name".to_string()),
            period: PeriodColumns::Single("period".to_string()),
            amounts: vec!["amount".to_string()],
            output: Some("output".to_string()),
            units: vec!["unit".to_string(), "output_unit".to_string()],
            required: vec![
                "facility".to_string(),
                "period".to_string(),
                "amount".to_string(),
            ],
            numeric: vec!["amount".to_string(), "output".to_string()],
            intensity_scale: 1.0,
            intensity_unit: "per unit output".to_string(),
        }
    }

    pub fn scoped() -> Self {
        let required = [
            "facility_id",
            "facility_name",
            "month",
            "year",
            "scope1_emissions",
            "scope2_emissions",
            "revenue",
        ];
        Self {
            facility: "facility_id".to_string(),
            facility_name: Some("facility_name".to_string()),
            period: PeriodColumns::YearMonth {
                year: "year".to_string(),
                month: "month".to_string(),
            },
            amounts: vec![
                "scope1_emissions".to_string(),
                "scope2_emissions".to_string(),
                "scope3_emissions".to_string(),
            ],
            output: Some("revenue".to_string()),
            units: Vec::new(),
            required: required.iter().map(|c| c.to_string()).collect(),
            numeric: vec![
                "scope1_emissions".to_string(),
                "scope2_emissions".to_string(),
                "scope3_emissions".to_string(),
                "revenue".to_string(),
            ],
            intensity_scale: 1_000_000.0,
            intensity_unit: "tCO2e/$1M revenue".to_string(),
        }
    }

    /// Replace the required column set (caller-supplied configuration).
    pub fn with_required<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Every column name this schema understands, in declaration order.
    pub fn known_columns(&self) -> Vec<&str> {
        let mut out: Vec<&str> = vec![self.facility.as_str()];
        out.extend(self.facility_name.as_deref());
        out.extend(self.period.names());
        out.extend(self.amounts.iter().map(String::as_str));
        out.extend(self.output.as_deref());
        out.extend(self.units.iter().map(String::as_str));
        out.extend(self.required.iter().map(String::as_str));
        out.extend(self.numeric.iter().map(String::as_str));

        let mut seen = std::collections::HashSet::new();
        out.retain(|c| seen.insert(*c));
        out
    }

    pub fn is_known(&self, column: &str) -> bool {
        self.known_columns().contains(&column)
    }
}
