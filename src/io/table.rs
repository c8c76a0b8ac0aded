//! Raw tabular input.
//!
//! A `RawTable` is the untyped shape the validator consumes: an ordered column
//! list plus rows mapping column name to raw value. It is built from CSV bytes
//! (uploads, files) or from a JSON array of objects (in-memory callers).
//!
//! Anything that is not table-shaped fails here with `MalformedInputError`;
//! the validator never sees it.

use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::error::MalformedInputError;

/// One raw row: column name -> raw value.
pub type RawRow = Map<String, Value>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    columns: Vec<String>,
    rows: Vec<RawRow>,
}

impl RawTable {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[RawRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Parse an upload body. Must be UTF-8 CSV with a header row.
    pub fn from_csv_bytes(bytes: &[u8]) -> Result<Self, MalformedInputError> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| MalformedInputError::new(format!("upload is not valid UTF-8: {e}")))?;
        Self::from_csv_str(text)
    }

    pub fn from_csv_str(text: &str) -> Result<Self, MalformedInputError> {
        // Excel writes a BOM; pasted samples often start with a blank line.
        let text = text.trim_start_matches('\u{feff}').trim();
        if text.is_empty() {
            return Err(MalformedInputError::new("input is empty"));
        }
        if text.contains('\0') {
            return Err(MalformedInputError::new("input contains binary data"));
        }

        let mut reader = csv::ReaderBuilder::new()
            .flexible(false)
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());

        let headers = reader
            .headers()
            .map_err(|e| MalformedInputError::new(format!("failed to read CSV headers: {e}")))?
            .clone();

        let columns: Vec<String> = headers.iter().map(normalize_header_name).collect();
        check_columns(&columns)?;

        let mut rows = Vec::new();
        for (idx, result) in reader.records().enumerate() {
            // +2: 1-based lines, header on line 1.
            let line = idx + 2;
            let record = result
                .map_err(|e| MalformedInputError::new(format!("CSV parse error on line {line}: {e}")))?;

            let row: RawRow = columns
                .iter()
                .zip(record.iter())
                .filter(|(_, cell)| !cell.is_empty())
                .map(|(name, cell)| (name.clone(), Value::String(cell.to_string())))
                .collect();
            rows.push(row);
        }

        Ok(Self { columns, rows })
    }

    /// Build from a JSON array of objects. Columns are the union of keys in
    /// order of first appearance.
    pub fn from_json(value: &Value) -> Result<Self, MalformedInputError> {
        let items = value
            .as_array()
            .ok_or_else(|| MalformedInputError::new("expected a JSON array of row objects"))?;

        let mut columns = Vec::new();
        let mut seen = HashSet::new();
        let mut rows = Vec::with_capacity(items.len());

        for (idx, item) in items.iter().enumerate() {
            let object = item.as_object().ok_or_else(|| {
                MalformedInputError::new(format!("row {idx} is not a JSON object"))
            })?;

            let mut row = RawRow::new();
            for (key, cell) in object {
                let name = normalize_header_name(key);
                if name.is_empty() {
                    return Err(MalformedInputError::new(format!("row {idx} has an empty column name")));
                }
                if matches!(cell, Value::Array(_) | Value::Object(_)) {
                    return Err(MalformedInputError::new(format!(
                        "row {idx} column `{name}` holds a nested value"
                    )));
                }
                if seen.insert(name.clone()) {
                    columns.push(name.clone());
                }
                row.insert(name, cell.clone());
            }
            rows.push(row);
        }

        Ok(Self { columns, rows })
    }
}

fn normalize_header_name(name: &str) -> String {
    name.trim().trim_start_matches('\u{feff}').to_ascii_lowercase()
}

fn check_columns(columns: &[String]) -> Result<(), MalformedInputError> {
    let mut seen = HashSet::new();
    for (idx, name) in columns.iter().enumerate() {
        if name.is_empty() {
            return Err(MalformedInputError::new(format!("header column {} is empty", idx + 1)));
        }
        if !seen.insert(name.as_str()) {
            return Err(MalformedInputError::new(format!("duplicate header column `{name}`")));
        }
    }
    Ok(())
}
