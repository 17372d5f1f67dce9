//! Doctor↔patient associations.
//!
//! An association (edge) between a doctor and a patient is recorded twice: the patient's id in
//! `Doctor::patients` and the doctor's id in `Patient::doctors`. This module is the only place
//! that changes both sides, and it maintains two rules:
//!
//! - the two sides mirror each other;
//! - an edge exists exactly when at least one appointment connects the pair.
//!
//! The functions here operate on an open [`UnitOfWork`]; callers decide the transaction scope.

use super::{doctors, patients};
use crate::error::ClinicResult;
use crate::model::{Appointment, AppointmentId, Doctor, DoctorId, Patient, PatientId};
use crate::store::UnitOfWork;
use std::collections::BTreeSet;
use std::fmt;

/// Ensures the edge between `doctor` and `patient` is present on both sides.
///
/// Returns `true` if either side changed. Both records must exist.
pub(crate) fn link(
    uow: &mut UnitOfWork<'_>,
    doctor: DoctorId,
    patient: PatientId,
) -> ClinicResult<bool> {
    let on_doctor = doctors::add_patient(uow, doctor, patient)?;
    let on_patient = patients::add_doctor(uow, patient, doctor)?;
    let changed = on_doctor || on_patient;

    if changed {
        tracing::debug!("linked doctor {} and patient {}", doctor, patient);
    }
    Ok(changed)
}

/// Removes the edge between `doctor` and `patient` from whichever sides still exist.
///
/// Returns `true` if either side changed.
pub(crate) fn unlink(
    uow: &mut UnitOfWork<'_>,
    doctor: DoctorId,
    patient: PatientId,
) -> ClinicResult<bool> {
    let mut changed = false;
    if uow.contains::<Doctor>(doctor) {
        changed |= doctors::remove_patient(uow, doctor, patient)?;
    }
    if uow.contains::<Patient>(patient) {
        changed |= patients::remove_doctor(uow, patient, doctor)?;
    }

    if changed {
        tracing::debug!("unlinked doctor {} and patient {}", doctor, patient);
    }
    Ok(changed)
}

/// Drops the edge if no appointment other than `excluding` still connects the pair.
///
/// Returns `true` if the edge was removed.
pub(crate) fn release(
    uow: &mut UnitOfWork<'_>,
    doctor: DoctorId,
    patient: PatientId,
    excluding: Option<AppointmentId>,
) -> ClinicResult<bool> {
    if uow.count_appointments(doctor, patient, excluding) > 0 {
        return Ok(false);
    }
    unlink(uow, doctor, patient)
}

/// A departure from the association rules found by [`check`].
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum AssociationIssue {
    /// The doctor lists the patient, but the patient does not list the doctor.
    MissingOnPatient { doctor: DoctorId, patient: PatientId },
    /// The patient lists the doctor, but the doctor does not list the patient.
    MissingOnDoctor { doctor: DoctorId, patient: PatientId },
    /// An edge is recorded but no appointment connects the pair.
    Unjustified { doctor: DoctorId, patient: PatientId },
    /// Appointments connect the pair but no edge is recorded.
    Unrecorded { doctor: DoctorId, patient: PatientId },
}

impl fmt::Display for AssociationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssociationIssue::MissingOnPatient { doctor, patient } => write!(
                f,
                "doctor {doctor} lists patient {patient}, but the patient does not list the doctor"
            ),
            AssociationIssue::MissingOnDoctor { doctor, patient } => write!(
                f,
                "patient {patient} lists doctor {doctor}, but the doctor does not list the patient"
            ),
            AssociationIssue::Unjustified { doctor, patient } => write!(
                f,
                "doctor {doctor} and patient {patient} are associated without any appointment"
            ),
            AssociationIssue::Unrecorded { doctor, patient } => write!(
                f,
                "doctor {doctor} and patient {patient} have appointments but no association"
            ),
        }
    }
}

/// Scans the whole store for association issues. An empty result means the store is consistent.
pub(crate) fn check(uow: &UnitOfWork<'_>) -> Vec<AssociationIssue> {
    let on_doctors: BTreeSet<(DoctorId, PatientId)> = uow
        .list_all::<Doctor>()
        .into_iter()
        .flat_map(|d| d.patients.into_iter().map(move |p| (d.id, p)))
        .collect();

    let on_patients: BTreeSet<(DoctorId, PatientId)> = uow
        .list_all::<Patient>()
        .into_iter()
        .flat_map(|p| p.doctors.into_iter().map(move |d| (d, p.id)))
        .collect();

    let justified: BTreeSet<(DoctorId, PatientId)> = uow
        .list_all::<Appointment>()
        .iter()
        .map(|a| (a.doctor(), a.patient()))
        .collect();

    let mut issues = Vec::new();

    for &(doctor, patient) in on_doctors.difference(&on_patients) {
        issues.push(AssociationIssue::MissingOnPatient { doctor, patient });
    }
    for &(doctor, patient) in on_patients.difference(&on_doctors) {
        issues.push(AssociationIssue::MissingOnDoctor { doctor, patient });
    }

    let recorded: BTreeSet<(DoctorId, PatientId)> =
        on_doctors.union(&on_patients).copied().collect();

    for &(doctor, patient) in recorded.difference(&justified) {
        issues.push(AssociationIssue::Unjustified { doctor, patient });
    }
    for &(doctor, patient) in justified.difference(&recorded) {
        issues.push(AssociationIssue::Unrecorded { doctor, patient });
    }

    issues.sort();
    issues
}
