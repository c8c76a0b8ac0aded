//! Runtime settings.
//!
//! Read from the environment (a `.env` file is loaded first when present);
//! command-line flags override individual values.

use clap::ValueEnum;

use crate::api::UploadLimits;
use crate::domain::SchemaKind;
use crate::error::AppError;

pub const ENV_SCHEMA: &str = "EMX_SCHEMA";
pub const ENV_MAX_UPLOAD_BYTES: &str = "EMX_MAX_UPLOAD_BYTES";
pub const ENV_LOG: &str = "EMX_LOG";

const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub schema: SchemaKind,
    pub limits: UploadLimits,
    /// `tracing` filter directive, e.g. `emissions_engine=debug`.
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema: SchemaKind::Auto,
            limits: UploadLimits::default(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup (tests pass a map).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Settings::default();

        if let Some(raw) = lookup(ENV_SCHEMA) {
            settings.schema = SchemaKind::from_str(raw.trim(), true).map_err(|_| {
                AppError::new(2, format!("Invalid {ENV_SCHEMA}='{raw}'. Expected auto, basic or scoped."))
            })?;
        }

        if let Some(raw) = lookup(ENV_MAX_UPLOAD_BYTES) {
            let max_bytes = raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| {
                    AppError::new(2, format!("Invalid {ENV_MAX_UPLOAD_BYTES}='{raw}'. Expected a positive integer."))
                })?;
            settings.limits = UploadLimits { max_bytes };
        }

        if let Some(filter) = lookup(ENV_LOG).or_else(|| lookup("RUST_LOG")) {
            if !filter.trim().is_empty() {
                settings.log_filter = filter.trim().to_string();
            }
        }

        Ok(settings)
    }
}
