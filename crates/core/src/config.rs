//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into the core. Nothing in
//! the core reads process-wide environment variables while handling a request.

use crate::constants::DEFAULT_CLINIC_DATA_DIR;
use crate::error::{ClinicError, ClinicResult};
use crate::store::{FileStore, MemoryStore};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Which entity store implementation to use.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum StoreBackend {
    /// Records are kept in memory and lost on exit.
    Memory,
    /// Records are persisted as YAML files under the data directory.
    #[default]
    File,
}

impl FromStr for StoreBackend {
    type Err = ClinicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "mem" => Ok(StoreBackend::Memory),
            "file" | "files" | "yaml" => Ok(StoreBackend::File),
            other => Err(ClinicError::InvalidInput(format!(
                "unknown store backend '{}' (expected 'memory' or 'file')",
                other
            ))),
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreBackend::Memory => f.write_str("memory"),
            StoreBackend::File => f.write_str("file"),
        }
    }
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    data_dir: PathBuf,
    backend: StoreBackend,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns [`ClinicError::InvalidInput`] if a file backend is requested with an empty data
    /// directory.
    pub fn new(data_dir: PathBuf, backend: StoreBackend) -> ClinicResult<Self> {
        if backend == StoreBackend::File && data_dir.as_os_str().is_empty() {
            return Err(ClinicError::InvalidInput(
                "data directory cannot be empty for the file store".into(),
            ));
        }

        Ok(Self { data_dir, backend })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn backend(&self) -> StoreBackend {
        self.backend
    }

    /// Opens the configured file store.
    ///
    /// Only meaningful for [`StoreBackend::File`]; callers select the backend first.
    pub fn open_file_store(&self) -> ClinicResult<FileStore> {
        FileStore::open(&self.data_dir)
    }

    pub fn open_memory_store(&self) -> MemoryStore {
        MemoryStore::new()
    }
}

/// Resolve the data directory from an optional override value.
///
/// `None` or blank values fall back to [`DEFAULT_CLINIC_DATA_DIR`].
pub fn data_dir_from_env_value(value: Option<String>) -> PathBuf {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CLINIC_DATA_DIR))
}

/// Parse the store backend from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns the default ([`StoreBackend::File`]).
pub fn store_backend_from_env_value(value: Option<String>) -> ClinicResult<StoreBackend> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    let parsed = value.map(|v| v.parse::<StoreBackend>()).transpose()?;

    Ok(parsed.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_defaults_to_file() {
        assert_eq!(
            store_backend_from_env_value(None).unwrap(),
            StoreBackend::File
        );
        assert_eq!(
            store_backend_from_env_value(Some("  ".into())).unwrap(),
            StoreBackend::File
        );
    }

    #[test]
    fn test_backend_parses_memory_case_insensitively() {
        assert_eq!(
            store_backend_from_env_value(Some(" Memory ".into())).unwrap(),
            StoreBackend::Memory
        );
    }

    #[test]
    fn test_backend_rejects_unknown_value() {
        let err = store_backend_from_env_value(Some("postgres".into()))
            .expect_err("unknown backend should be rejected");
        assert!(matches!(err, ClinicError::InvalidInput(_)));
    }

    #[test]
    fn test_data_dir_falls_back_to_default() {
        assert_eq!(
            data_dir_from_env_value(None),
            PathBuf::from(DEFAULT_CLINIC_DATA_DIR)
        );
        assert_eq!(
            data_dir_from_env_value(Some("/srv/clinic".into())),
            PathBuf::from("/srv/clinic")
        );
    }

    #[test]
    fn test_file_backend_requires_data_dir() {
        let err = CoreConfig::new(PathBuf::new(), StoreBackend::File)
            .expect_err("empty data dir should be rejected");
        assert!(matches!(err, ClinicError::InvalidInput(_)));

        assert!(CoreConfig::new(PathBuf::new(), StoreBackend::Memory).is_ok());
    }
}
