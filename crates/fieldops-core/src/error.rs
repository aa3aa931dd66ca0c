//! Error types for the FieldOps core.

use serde::Serialize;
use thiserror::Error;

/// A shared error type for the FieldOps core and its storage backends.
///
/// This provides typed, structured error variants with automatic conversion
/// from common error types via the `From` trait.
#[derive(Error, Debug, Clone, Serialize)]
pub enum FieldOpsError {
    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Data access error (record store layer)
    #[error("Data access error: {0}")]
    DataAccess(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A module id was referenced that is not present in the registry
    #[error("Unknown dashboard module: '{0}'")]
    UnknownModule(String),

    /// A visit session is already active for this technician
    #[error("A visit session is already active: '{0}'")]
    SessionActive(String),

    /// A step or photo operation was attempted with no active session
    #[error("No active visit session")]
    NoActiveSession,

    /// A step was referenced that is not part of the session kind's catalog
    #[error("Step '{step}' is not part of the '{kind}' step catalog")]
    StepNotInCatalog { step: String, kind: String },

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl FieldOpsError {
    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates a DataAccess error
    pub fn data_access(message: impl Into<String>) -> Self {
        Self::DataAccess(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is an invariant-violation error, i.e. an expected
    /// user-flow race (double start, step operation while idle) rather
    /// than a fault.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, Self::SessionActive(_) | Self::NoActiveSession)
    }

    /// Check if this is a configuration error (unknown module, step
    /// outside the catalog, malformed config).
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Self::Config(_) | Self::UnknownModule(_) | Self::StepNotInCatalog { .. }
        )
    }
}

impl From<std::io::Error> for FieldOpsError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for FieldOpsError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

/// Conversion from anyhow::Error (transitional, should be removed eventually)
impl From<anyhow::Error> for FieldOpsError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Conversion from String (for error messages)
impl From<String> for FieldOpsError {
    fn from(err: String) -> Self {
        Self::Internal(err)
    }
}

/// A type alias for `Result<T, FieldOpsError>`.
pub type Result<T> = std::result::Result<T, FieldOpsError>;
