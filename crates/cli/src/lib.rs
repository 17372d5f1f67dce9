//! # Clinic CLI
//!
//! Shared pieces of the clinic binaries: the interactive text [`menu`] and process-level
//! configuration loading.

pub mod menu;

use clinic_core::config::{data_dir_from_env_value, store_backend_from_env_value};
use clinic_core::{ClinicResult, CoreConfig};

/// Environment variable naming the data directory for the file store.
pub const CLINIC_DATA_DIR_ENV: &str = "CLINIC_DATA_DIR";

/// Environment variable selecting the store backend (`memory` or `file`).
pub const CLINIC_STORE_ENV: &str = "CLINIC_STORE";

/// Resolves [`CoreConfig`] from the process environment.
///
/// Call once at startup, after `dotenvy::dotenv()`.
pub fn config_from_env() -> ClinicResult<CoreConfig> {
    let data_dir = data_dir_from_env_value(std::env::var(CLINIC_DATA_DIR_ENV).ok());
    let backend = store_backend_from_env_value(std::env::var(CLINIC_STORE_ENV).ok())?;
    CoreConfig::new(data_dir, backend)
}
