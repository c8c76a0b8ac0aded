//! Shared "load -> process" logic used by the demo and process commands.

use std::path::Path;

use tracing::debug;

use crate::data::SAMPLE_CSV;
use crate::domain::{Report, SchemaKind};
use crate::error::AppError;
use crate::engine::process_csv;

/// All outputs of a single run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    /// Where the table came from (file path or "bundled sample").
    pub source: String,
    pub report: Report,
}

/// Process the bundled sample upload.
pub fn run_sample(kind: SchemaKind) -> Result<RunOutput, AppError> {
    run_bytes("bundled sample", SAMPLE_CSV.as_bytes(), kind)
}

/// Process a CSV file from disk.
pub fn run_file(path: &Path, kind: SchemaKind) -> Result<RunOutput, AppError> {
    let bytes = std::fs::read(path)
        .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))?;
    run_bytes(&path.display().to_string(), &bytes, kind)
}

fn run_bytes(source: &str, bytes: &[u8], kind: SchemaKind) -> Result<RunOutput, AppError> {
    debug!(source, bytes = bytes.len(), schema = ?kind, "processing table");
    let report = process_csv(bytes, kind)?;
    Ok(RunOutput {
        source: source.to_string(),
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_exit_code_2() {
        let err = run_file(Path::new("/definitely/not/here.csv"), SchemaKind::Auto).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn malformed_file_is_exit_code_3() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        std::fs::write(&path, [0xffu8, 0xfe, 0x00]).unwrap();
        let err = run_file(&path, SchemaKind::Auto).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn sample_runs() {
        let run = run_sample(SchemaKind::Auto).unwrap();
        assert_eq!(run.source, "bundled sample");
        assert_eq!(run.report.rows_accepted, 4);
    }
}
