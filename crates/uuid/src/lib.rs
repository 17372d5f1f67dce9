//! Record identifiers and sharded-path utilities.
//!
//! Every clinic record (patient, doctor, office, appointment) is identified by a UUID held in a
//! *canonical* representation: **32 lowercase hexadecimal characters** (no hyphens).
//!
//! This crate provides:
//! - A small wrapper type ([`RecordId`]) that *guarantees* the canonical format once
//!   constructed.
//! - Shared sharding logic to derive on-disk record locations from an identifier.
//!
//! ## Canonical form
//! - Length: 32
//! - Characters: `0-9` and `a-f` only
//! - Example: `550e8400e29b41d4a716446655440000`
//!
//! Canonical form is *required* for externally supplied identifiers (menu input, CLI arguments,
//! file names). Use [`RecordId::parse`] to validate an input string. Uppercase, hyphenated,
//! wrong-length or non-hex values are rejected.
//!
//! ## Sharded directory layout
//! For a canonical id `u`, record files live under:
//! `parent_dir/<u[0..2]>/<u[2..4]>/<u>/`
//!
//! Example:
//! `clinic_data/appointments/55/0e/550e8400e29b41d4a716446655440000/`

mod service;

pub use service::{RecordId, Uuid};

/// Error type for identifier operations.
#[derive(Debug, thiserror::Error)]
pub enum UuidError {
    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for identifier operations.
pub type UuidResult<T> = Result<T, UuidError>;
