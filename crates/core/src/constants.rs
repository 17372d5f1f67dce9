//! Constants used throughout the clinic core crate.
//!
//! Path and filename constants live here so the file store and its tests agree on the
//! on-disk layout.

/// Default directory for clinic data when no explicit directory is configured.
pub const DEFAULT_CLINIC_DATA_DIR: &str = "clinic_data";

/// Directory name for patient records.
pub const PATIENTS_DIR_NAME: &str = "patients";

/// Directory name for doctor records.
pub const DOCTORS_DIR_NAME: &str = "doctors";

/// Directory name for office records.
pub const OFFICES_DIR_NAME: &str = "offices";

/// Directory name for appointment records.
pub const APPOINTMENTS_DIR_NAME: &str = "appointments";

/// Suffix for record files while they are being written.
pub const TEMP_FILE_SUFFIX: &str = "tmp";

/// Number of attempts made to allocate an unused record id.
pub const ID_ALLOCATION_ATTEMPTS: usize = 5;
