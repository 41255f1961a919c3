//! Error types for the reverse geocoder.
//!
//! Client input problems ([`ValidationError`]) map to `400` responses and are
//! never logged as failures. Engine problems ([`StoreError`]) map to `500`.
//! [`RefreshError`] belongs to the dataset refresher binary.

use std::path::PathBuf;
use thiserror::Error;

/// Rejected `/reverse` parameters.
///
/// The `Display` text is the human-readable `message` of the error body and
/// [`ValidationError::kind`] is the stable `error` string.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{param} query parameter is required")]
    MissingParameter { param: &'static str },

    #[error("{param} must be a valid number")]
    InvalidParameter { param: &'static str },

    #[error("{param} must be between {min} and {max}")]
    InvalidCoordinate {
        param: &'static str,
        min: i16,
        max: i16,
    },

    #[error("Field '{field}' does not exist in the data source.")]
    InvalidField { field: String },
}

impl ValidationError {
    /// Machine-readable error kind sent as the `error` field
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::MissingParameter { .. } => "Missing required parameter",
            Self::InvalidParameter { .. } => "Invalid parameter",
            Self::InvalidCoordinate { .. } => "Invalid coordinate",
            Self::InvalidField { .. } => "Invalid field name",
        }
    }
}

/// Failures while talking to the query engine.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Engine(#[from] duckdb::Error),

    /// A row came back that is not a JSON object
    #[error("Failed to decode boundary row: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Database connection lock was poisoned")]
    Poisoned,

    /// The blocking lookup task panicked or was cancelled
    #[error("Lookup task failed: {0}")]
    Task(String),
}

/// Failures of the dataset refresher.
#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Download failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected response status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },
}

impl RefreshError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_kinds_and_messages() {
        let err = ValidationError::MissingParameter { param: "lat" };
        assert_eq!(err.kind(), "Missing required parameter");
        assert_eq!(err.to_string(), "lat query parameter is required");

        let err = ValidationError::InvalidCoordinate {
            param: "lon",
            min: -180,
            max: 180,
        };
        assert_eq!(err.kind(), "Invalid coordinate");
        assert_eq!(err.to_string(), "lon must be between -180 and 180");

        let err = ValidationError::InvalidField {
            field: "nope".to_string(),
        };
        assert_eq!(err.kind(), "Invalid field name");
        assert_eq!(
            err.to_string(),
            "Field 'nope' does not exist in the data source."
        );
    }
}
