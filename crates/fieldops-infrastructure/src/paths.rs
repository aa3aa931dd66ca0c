//! Unified path management for FieldOps data files.
//!
//! All locally persisted record collections live under one data
//! directory, resolved per platform via the `dirs` crate.

use std::path::PathBuf;

use fieldops_core::{FieldOpsError, Result};

/// Path resolution for FieldOps.
///
/// # Directory Structure
///
/// ```text
/// <data_dir>/fieldops/             # e.g. ~/.local/share/fieldops
/// └── records/                     # JsonDirRecordStore root
///     ├── visit_sessions/
///     │   └── <record-id>.json
///     ├── relationships/
///     └── ...
/// ```
pub struct FieldOpsPaths;

impl FieldOpsPaths {
    /// Returns the FieldOps data directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform data directory cannot be
    /// determined.
    pub fn data_dir() -> Result<PathBuf> {
        dirs::data_dir()
            .map(|dir| dir.join("fieldops"))
            .ok_or_else(|| FieldOpsError::config("Cannot determine platform data directory"))
    }

    /// Returns the root directory for the JSON directory record store.
    pub fn records_dir() -> Result<PathBuf> {
        Ok(Self::data_dir()?.join("records"))
    }
}
