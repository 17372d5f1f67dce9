//! # Clinic Core
//!
//! Core business logic for the clinic scheduling system.
//!
//! This crate owns the record types and the rules that tie them together:
//! - patients, doctors, offices and appointments, with typed identifiers
//! - the appointment lifecycle, which keeps doctor↔patient associations in line with the
//!   appointments that justify them
//! - storage behind [`store::EntityStore`], in memory or as sharded YAML files under the
//!   configured data directory
//!
//! **No UI concerns**: menus and command-line parsing belong in the binaries.

pub mod clinic;
pub mod config;
pub mod constants;
pub mod error;
pub mod model;
pub mod repositories;
pub mod store;

pub use clinic::Clinic;
pub use config::{CoreConfig, StoreBackend};
pub use error::{ClinicError, ClinicResult};
pub use model::{
    parse_date, Appointment, AppointmentDetails, AppointmentId, AppointmentRecord, Doctor,
    DoctorDetails, DoctorId, DoctorRecord, EntityKind, Office, OfficeDetails, OfficeId,
    OfficeRecord, Patient, PatientDetails, PatientId, PatientRecord,
};
pub use repositories::{
    AppointmentService, AssociationIssue, DoctorService, OfficeService, PatientService,
};
pub use store::{EntityStore, FileStore, MemoryStore, UnitOfWork};

pub use clinic_types::{EmailAddress, NonEmptyText, TextError};
pub use clinic_uuid::RecordId;
