//! REST boundary.
//!
//! Handlers are transport-agnostic: they take the request pieces and return
//! an `ApiResponse` (status code + JSON body). Whatever HTTP server hosts them
//! only has to route:
//!
//! - `POST /api/v1/emissions/upload` -> [`upload`]
//! - `GET /api/v1/facilities/{facility_id}/emissions` -> [`facility_emissions`]

use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::{FacilityMetrics, Period, SchemaKind};
use crate::engine::{compute_metrics, process_with_dataset};
use crate::io::RawTable;

pub mod store;

pub use store::{MemoryStore, ReportStore, StoredUpload, UploadId};

pub const UPLOAD_ROUTE: &str = "/api/v1/emissions/upload";
pub const FACILITY_ROUTE: &str = "/api/v1/facilities/{facility_id}/emissions";

#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    fn ok<T: Serialize>(body: &T) -> Self {
        match serde_json::to_value(body) {
            Ok(body) => Self { status: 200, body },
            Err(e) => Self::error(500, "internal_error", format!("failed to serialize response: {e}")),
        }
    }

    fn error(status: u16, code: &str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: json!({ "error": code, "message": message.into() }),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Request size bound applied before the engine runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadLimits {
    pub max_bytes: usize,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_bytes: 10 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Serialize)]
struct UploadBody<'a> {
    upload_id: UploadId,
    status: &'static str,
    message: String,
    records_processed: usize,
    report: &'a crate::domain::Report,
}

/// `POST /api/v1/emissions/upload`.
///
/// 200 with the report whenever the body parses as a table, even if every row
/// was rejected; 400 for unparseable bodies; 413 above the size limit.
pub fn upload<S: ReportStore>(
    store: &mut S,
    body: &[u8],
    schema: SchemaKind,
    limits: &UploadLimits,
) -> ApiResponse {
    if body.len() > limits.max_bytes {
        warn!(bytes = body.len(), limit = limits.max_bytes, "upload rejected: too large");
        return ApiResponse::error(
            413,
            "payload_too_large",
            format!("upload is {} bytes; limit is {}", body.len(), limits.max_bytes),
        );
    }

    let table = match RawTable::from_csv_bytes(body) {
        Ok(table) => table,
        Err(e) => {
            warn!(error = %e, "upload rejected: malformed");
            return ApiResponse::error(400, "malformed_input", e.message());
        }
    };

    let schema = schema.resolve(table.columns());
    let (report, dataset) = match process_with_dataset(&table, &schema) {
        Ok(out) => out,
        Err(e) => {
            warn!(error = %e, "upload rejected: malformed");
            return ApiResponse::error(400, "malformed_input", e.message());
        }
    };

    let status = if report.has_errors() {
        "partial_success"
    } else {
        "success"
    };
    let records_processed = report.rows_accepted;
    let response_report = report.clone();
    let upload_id = store.insert(report, dataset);
    info!(%upload_id, records_processed, status, "upload processed");

    ApiResponse::ok(&UploadBody {
        upload_id,
        status,
        message: format!("Processed {records_processed} records successfully"),
        records_processed,
        report: &response_report,
    })
}

/// Query parameters for the facility endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FacilityQuery {
    /// Defaults to the most recent upload.
    pub upload_id: Option<UploadId>,
    /// Inclusive period window.
    pub start: Option<Period>,
    pub end: Option<Period>,
}

impl FacilityQuery {
    fn is_windowed(&self) -> bool {
        self.start.is_some() || self.end.is_some()
    }

    fn contains(&self, period: Period) -> bool {
        self.start.is_none_or(|s| period >= s) && self.end.is_none_or(|e| period <= e)
    }
}

/// Why a facility query produced no metrics.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("start {start} is after end {end}")]
    InvertedWindow { start: Period, end: Period },
    #[error("no processed upload available")]
    NoUpload,
    #[error("facility {facility_id} not found in upload {upload_id}")]
    UnknownFacility {
        facility_id: String,
        upload_id: UploadId,
    },
    #[error("facility {facility_id} has no records in the requested window")]
    EmptyWindow { facility_id: String },
}

impl QueryError {
    pub fn status(&self) -> u16 {
        match self {
            QueryError::InvertedWindow { .. } => 400,
            QueryError::NoUpload
            | QueryError::UnknownFacility { .. }
            | QueryError::EmptyWindow { .. } => 404,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            QueryError::InvertedWindow { .. } => "invalid_query",
            _ => "not_found",
        }
    }
}

impl From<QueryError> for ApiResponse {
    fn from(err: QueryError) -> Self {
        ApiResponse::error(err.status(), err.code(), err.to_string())
    }
}

/// Look up one facility in a stored upload, recomputing its metrics when the
/// query carries a period window.
pub fn query_facility<S: ReportStore>(
    store: &S,
    facility_id: &str,
    query: &FacilityQuery,
) -> Result<FacilityMetrics, QueryError> {
    if let (Some(start), Some(end)) = (query.start, query.end) {
        if start > end {
            return Err(QueryError::InvertedWindow { start, end });
        }
    }

    let upload = match &query.upload_id {
        Some(id) => store.get(id),
        None => store.latest(),
    };
    let upload = upload.ok_or(QueryError::NoUpload)?;

    let facility = upload
        .report
        .facility(facility_id)
        .ok_or_else(|| QueryError::UnknownFacility {
            facility_id: facility_id.to_string(),
            upload_id: upload.id,
        })?;

    if !query.is_windowed() {
        return Ok(facility.clone());
    }

    let records: Vec<_> = upload
        .dataset
        .records()
        .iter()
        .filter(|r| r.facility_id == facility_id && query.contains(r.period))
        .collect();
    if records.is_empty() {
        return Err(QueryError::EmptyWindow {
            facility_id: facility_id.to_string(),
        });
    }

    Ok(FacilityMetrics {
        id: facility.id.clone(),
        name: facility.name.clone(),
        metrics: compute_metrics(records.iter().copied(), upload.dataset.intensity_scale()),
    })
}

/// `GET /api/v1/facilities/{facility_id}/emissions`.
pub fn facility_emissions<S: ReportStore>(
    store: &S,
    facility_id: &str,
    query: &FacilityQuery,
) -> ApiResponse {
    match query_facility(store, facility_id, query) {
        Ok(facility) => ApiResponse::ok(&facility),
        Err(err) => {
            info!(facility_id, status = err.status(), error = %err, "facility query failed");
            err.into()
        }
    }
}
