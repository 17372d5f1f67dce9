//! Clinic record types.
//!
//! Four entity kinds are stored: [`Patient`], [`Doctor`], [`Office`] and [`Appointment`].
//! Each is identified by a typed id wrapping a canonical [`RecordId`], assigned by the store
//! when the record is created.
//!
//! Create and update requests carry a `*Details` bundle (the descriptive fields without an id).
//! The doctor↔patient association sets (`Patient::doctors`, `Doctor::patients`) and the
//! doctor↔office back-references are *not* part of any details bundle: they are maintained by
//! the repositories and are never written directly by callers.

use crate::error::{ClinicError, ClinicResult};
use chrono::NaiveDate;
use clinic_types::{EmailAddress, NonEmptyText};
use clinic_uuid::RecordId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(RecordId);

        impl $name {
            /// Parses a canonical 32-hex-character identifier.
            pub fn parse(input: &str) -> ClinicResult<Self> {
                Ok(Self(RecordId::parse(input.trim())?))
            }

            /// Returns the untyped identifier.
            pub fn record_id(&self) -> RecordId {
                self.0
            }
        }

        impl From<RecordId> for $name {
            fn from(id: RecordId) -> Self {
                Self(id)
            }
        }

        impl From<$name> for RecordId {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl FromStr for $name {
            type Err = ClinicError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }
    };
}

record_id!(
    /// Identifier of a [`Patient`].
    PatientId
);
record_id!(
    /// Identifier of a [`Doctor`].
    DoctorId
);
record_id!(
    /// Identifier of an [`Office`].
    OfficeId
);
record_id!(
    /// Identifier of an [`Appointment`].
    AppointmentId
);

/// The four kinds of record held by an entity store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EntityKind {
    Patient,
    Doctor,
    Office,
    Appointment,
}

impl EntityKind {
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Patient,
        EntityKind::Doctor,
        EntityKind::Office,
        EntityKind::Appointment,
    ];

    /// Lowercase singular name, also used as the record file stem.
    pub fn name(self) -> &'static str {
        match self {
            EntityKind::Patient => "patient",
            EntityKind::Doctor => "doctor",
            EntityKind::Office => "office",
            EntityKind::Appointment => "appointment",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// PATIENT
// ============================================================================

/// Descriptive fields of a patient.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientDetails {
    pub first_name: NonEmptyText,
    pub last_name: NonEmptyText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<EmailAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl PatientDetails {
    /// Creates details with only the required name fields set.
    ///
    /// # Errors
    ///
    /// Returns [`ClinicError::Text`] if either name is blank.
    pub fn new(first_name: impl AsRef<str>, last_name: impl AsRef<str>) -> ClinicResult<Self> {
        Ok(Self {
            first_name: NonEmptyText::new(first_name)?,
            last_name: NonEmptyText::new(last_name)?,
            date_of_birth: None,
            email: None,
            phone: None,
        })
    }

    pub fn with_date_of_birth(mut self, date_of_birth: NaiveDate) -> Self {
        self.date_of_birth = Some(date_of_birth);
        self
    }

    pub fn with_email(mut self, email: EmailAddress) -> Self {
        self.email = Some(email);
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }
}

/// A stored patient and the set of doctors who have seen them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    pub id: PatientId,
    pub details: PatientDetails,
    #[serde(default)]
    pub doctors: BTreeSet<DoctorId>,
}

impl fmt::Display for Patient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Patient {} {} {}",
            self.id, self.details.first_name, self.details.last_name
        )?;
        if let Some(dob) = self.details.date_of_birth {
            write!(f, ", born {dob}")?;
        }
        write!(f, ", {} doctor(s)", self.doctors.len())
    }
}

// ============================================================================
// DOCTOR
// ============================================================================

/// Descriptive fields of a doctor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoctorDetails {
    pub first_name: NonEmptyText,
    pub last_name: NonEmptyText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specialty: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<EmailAddress>,
}

impl DoctorDetails {
    /// Creates details with only the required name fields set.
    ///
    /// # Errors
    ///
    /// Returns [`ClinicError::Text`] if either name is blank.
    pub fn new(first_name: impl AsRef<str>, last_name: impl AsRef<str>) -> ClinicResult<Self> {
        Ok(Self {
            first_name: NonEmptyText::new(first_name)?,
            last_name: NonEmptyText::new(last_name)?,
            specialty: None,
            email: None,
        })
    }

    pub fn with_specialty(mut self, specialty: impl Into<String>) -> Self {
        self.specialty = Some(specialty.into());
        self
    }

    pub fn with_email(mut self, email: EmailAddress) -> Self {
        self.email = Some(email);
        self
    }
}

/// A stored doctor, the patients they have seen, and their office (if any).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Doctor {
    pub id: DoctorId,
    pub details: DoctorDetails,
    #[serde(default)]
    pub patients: BTreeSet<PatientId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub office: Option<OfficeId>,
}

impl fmt::Display for Doctor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Doctor {} {} {}",
            self.id, self.details.first_name, self.details.last_name
        )?;
        if let Some(specialty) = &self.details.specialty {
            write!(f, " ({specialty})")?;
        }
        write!(f, ", {} patient(s)", self.patients.len())
    }
}

// ============================================================================
// OFFICE
// ============================================================================

/// Fields of an office create or update request. An office always starts out owned.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OfficeDetails {
    pub location: NonEmptyText,
    pub phone: Option<String>,
    pub doctor: DoctorId,
}

impl OfficeDetails {
    /// # Errors
    ///
    /// Returns [`ClinicError::Text`] if `location` is blank.
    pub fn new(location: impl AsRef<str>, doctor: DoctorId) -> ClinicResult<Self> {
        Ok(Self {
            location: NonEmptyText::new(location)?,
            phone: None,
            doctor,
        })
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }
}

/// A stored office. `doctor` becomes `None` when the owning doctor is deleted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Office {
    pub id: OfficeId,
    pub location: NonEmptyText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default)]
    pub doctor: Option<DoctorId>,
}

impl fmt::Display for Office {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Office {} at {}", self.id, self.location)?;
        match self.doctor {
            Some(doctor) => write!(f, ", doctor {doctor}"),
            None => write!(f, ", unassigned"),
        }
    }
}

// ============================================================================
// APPOINTMENT
// ============================================================================

/// Fields of an appointment: who, when, and free-text notes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentDetails {
    pub doctor: DoctorId,
    pub patient: PatientId,
    pub date: NaiveDate,
    #[serde(default)]
    pub notes: String,
}

impl AppointmentDetails {
    pub fn new(
        doctor: DoctorId,
        patient: PatientId,
        date: NaiveDate,
        notes: impl Into<String>,
    ) -> Self {
        Self {
            doctor,
            patient,
            date,
            notes: notes.into(),
        }
    }
}

/// A stored appointment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: AppointmentId,
    pub details: AppointmentDetails,
}

impl Appointment {
    pub fn doctor(&self) -> DoctorId {
        self.details.doctor
    }

    pub fn patient(&self) -> PatientId {
        self.details.patient
    }

    /// True if this appointment connects `doctor` and `patient`.
    pub fn links(&self, doctor: DoctorId, patient: PatientId) -> bool {
        self.details.doctor == doctor && self.details.patient == patient
    }
}

impl fmt::Display for Appointment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Appointment {} on {}: doctor {}, patient {}",
            self.id, self.details.date, self.details.doctor, self.details.patient
        )?;
        if !self.details.notes.is_empty() {
            write!(f, " - {}", self.details.notes)?;
        }
        Ok(())
    }
}

// ============================================================================
// RESOLVED READ MODELS
// ============================================================================

/// A patient with their associated doctors resolved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatientRecord {
    pub patient: Patient,
    pub doctors: Vec<Doctor>,
}

/// A doctor with their associated patients and office resolved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DoctorRecord {
    pub doctor: Doctor,
    pub patients: Vec<Patient>,
    pub office: Option<Office>,
}

/// An office with its doctor resolved (if it still has one).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OfficeRecord {
    pub office: Office,
    pub doctor: Option<Doctor>,
}

/// An appointment with its doctor and patient resolved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppointmentRecord {
    pub appointment: Appointment,
    pub doctor: Doctor,
    pub patient: Patient,
}

/// Parses an ISO `YYYY-MM-DD` calendar date.
///
/// # Errors
///
/// Returns [`ClinicError::InvalidInput`] if the input is not a valid date.
pub fn parse_date(input: &str) -> ClinicResult<NaiveDate> {
    let input = input.trim();
    NaiveDate::parse_from_str(input, "%Y-%m-%d").map_err(|e| {
        ClinicError::InvalidInput(format!(
            "invalid date '{}': {} (expected YYYY-MM-DD)",
            input, e
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_id_parses_canonical() {
        let id = DoctorId::parse(" 550e8400e29b41d4a716446655440000 ")
            .expect("canonical id should parse");
        assert_eq!(id.to_string(), "550e8400e29b41d4a716446655440000");
    }

    #[test]
    fn test_typed_id_rejects_garbage() {
        let err = PatientId::parse("42").expect_err("short id should be rejected");
        assert!(matches!(err, ClinicError::Uuid(_)));
    }

    #[test]
    fn test_patient_details_reject_blank_names() {
        let err = PatientDetails::new("", "Doe").expect_err("blank first name should fail");
        assert!(matches!(err, ClinicError::Text(_)));
    }

    #[test]
    fn test_parse_date_accepts_iso() {
        let date = parse_date("2024-09-01").expect("ISO date should parse");
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 9, 1).unwrap());
    }

    #[test]
    fn test_parse_date_rejects_other_formats() {
        assert!(parse_date("01/09/2024").is_err());
        assert!(parse_date("2024-02-30").is_err());
    }

    #[test]
    fn test_appointment_links() {
        let doctor = DoctorId::from(RecordId::new());
        let patient = PatientId::from(RecordId::new());
        let appointment = Appointment {
            id: AppointmentId::from(RecordId::new()),
            details: AppointmentDetails::new(
                doctor,
                patient,
                NaiveDate::from_ymd_opt(2024, 9, 1).unwrap(),
                "Annual checkup",
            ),
        };

        assert!(appointment.links(doctor, patient));
        assert!(!appointment.links(doctor, PatientId::from(RecordId::new())));
    }

    #[test]
    fn test_patient_yaml_roundtrip_keeps_association_set() {
        let mut patient = Patient {
            id: PatientId::from(RecordId::new()),
            details: PatientDetails::new("John", "Doe").unwrap(),
            doctors: BTreeSet::new(),
        };
        patient.doctors.insert(DoctorId::from(RecordId::new()));

        let yaml = serde_yaml::to_string(&patient).expect("serialize should succeed");
        let back: Patient = serde_yaml::from_str(&yaml).expect("deserialize should succeed");

        assert_eq!(back, patient);
    }
}
