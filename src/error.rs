//! Error types.
//!
//! Two tiers:
//! - [`MalformedInputError`]: the input is not a table at all. Fatal to one
//!   engine call; the REST boundary maps it to a 4xx.
//! - [`AppError`]: anything the `emx` binary reports before exiting, carrying
//!   the process exit code.
//!
//! Row-level data problems are never errors; they become
//! [`crate::domain::ValidationIssue`]s.

use thiserror::Error;

/// The payload could not be read as a table (bad encoding, broken CSV,
/// non-tabular JSON).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed input: {message}")]
pub struct MalformedInputError {
    message: String,
}

impl MalformedInputError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[derive(Clone, Error)]
#[error("{message}")]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl From<MalformedInputError> for AppError {
    fn from(err: MalformedInputError) -> Self {
        AppError::new(3, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_input_maps_to_exit_code_3() {
        let err: AppError = MalformedInputError::new("not utf-8").into();
        assert_eq!(err.exit_code(), 3);
        assert_eq!(err.to_string(), "malformed input: not utf-8");
    }
}
