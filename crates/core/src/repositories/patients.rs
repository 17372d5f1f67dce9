//! Patient directory.
//!
//! Field-level CRUD for patients plus single-sided edits of a patient's doctor set. Deleting a
//! patient also deletes their appointments and removes them from every associated doctor.

use super::{associations, require_doctor, require_patient};
use crate::error::{ClinicError, ClinicResult};
use crate::model::{
    Appointment, Doctor, DoctorId, Patient, PatientDetails, PatientId, PatientRecord,
};
use crate::store::{EntityStore, UnitOfWork};
use std::sync::Arc;

/// Service for patient records.
#[derive(Debug)]
pub struct PatientService<S> {
    store: Arc<S>,
}

impl<S> Clone for PatientService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: EntityStore> PatientService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Creates a patient with an empty doctor set.
    pub fn create(&self, details: PatientDetails) -> ClinicResult<Patient> {
        let patient = self.store.transaction(|uow| {
            uow.insert(|id| Patient {
                id,
                details,
                doctors: Default::default(),
            })
        })?;

        tracing::info!("created patient {}", patient.id);
        Ok(patient)
    }

    pub fn get(&self, id: PatientId) -> ClinicResult<Option<Patient>> {
        self.store.transaction(|uow| Ok(uow.get::<Patient>(id)))
    }

    /// Reads a patient together with the doctors they are associated with.
    pub fn read(&self, id: PatientId) -> ClinicResult<Option<PatientRecord>> {
        self.store.transaction(|uow| {
            Ok(uow.get::<Patient>(id).map(|patient| {
                let doctors = patient
                    .doctors
                    .iter()
                    .filter_map(|d| uow.get::<Doctor>(*d))
                    .collect();
                PatientRecord { patient, doctors }
            }))
        })
    }

    /// Replaces the descriptive fields of a patient. The doctor set is preserved.
    ///
    /// Returns `None` if the patient does not exist.
    pub fn update(&self, id: PatientId, details: PatientDetails) -> ClinicResult<Option<Patient>> {
        self.store.transaction(|uow| {
            let Some(mut patient) = uow.get::<Patient>(id) else {
                return Ok(None);
            };
            patient.details = details;
            uow.replace(patient.clone())?;
            Ok(Some(patient))
        })
    }

    /// Deletes a patient, their appointments, and their associations.
    ///
    /// Returns the deleted patient, or `None` if it did not exist.
    pub fn delete(&self, id: PatientId) -> ClinicResult<Option<Patient>> {
        let deleted = self.store.transaction(|uow| delete_cascading(uow, id))?;
        if deleted.is_some() {
            tracing::info!("deleted patient {}", id);
        }
        Ok(deleted)
    }

    pub fn list_all(&self) -> ClinicResult<Vec<Patient>> {
        self.store.transaction(|uow| Ok(uow.list_all::<Patient>()))
    }

    /// Adds `doctor` to the patient's doctor set. Returns `false` if it was already present.
    ///
    /// This edits the patient side only.
    ///
    /// # Errors
    ///
    /// [`ClinicError::MissingPatient`] or [`ClinicError::MissingDoctor`] if either record is
    /// absent.
    pub fn add_doctor(&self, patient: PatientId, doctor: DoctorId) -> ClinicResult<bool> {
        self.store.transaction(|uow| add_doctor(uow, patient, doctor))
    }

    /// Removes `doctor` from the patient's doctor set. Returns `false` if it was not present.
    ///
    /// This edits the patient side only.
    pub fn remove_doctor(&self, patient: PatientId, doctor: DoctorId) -> ClinicResult<bool> {
        self.store.transaction(|uow| remove_doctor(uow, patient, doctor))
    }
}

pub(crate) fn add_doctor(
    uow: &mut UnitOfWork<'_>,
    patient: PatientId,
    doctor: DoctorId,
) -> ClinicResult<bool> {
    let mut owner = require_patient(uow, patient)?;
    if owner.doctors.contains(&doctor) {
        return Ok(false);
    }
    require_doctor(uow, doctor)?;

    owner.doctors.insert(doctor);
    uow.replace(owner)?;
    Ok(true)
}

pub(crate) fn remove_doctor(
    uow: &mut UnitOfWork<'_>,
    patient: PatientId,
    doctor: DoctorId,
) -> ClinicResult<bool> {
    let mut owner = uow
        .get::<Patient>(patient)
        .ok_or(ClinicError::MissingPatient(patient))?;
    if !owner.doctors.remove(&doctor) {
        return Ok(false);
    }

    uow.replace(owner)?;
    Ok(true)
}

fn delete_cascading(uow: &mut UnitOfWork<'_>, id: PatientId) -> ClinicResult<Option<Patient>> {
    let Some(patient) = uow.get::<Patient>(id) else {
        return Ok(None);
    };

    for appointment in uow.query::<Appointment, _>(|a| a.patient() == id) {
        uow.delete::<Appointment>(appointment.id);
        tracing::debug!("deleted appointment {} with patient {}", appointment.id, id);
    }

    for doctor in &patient.doctors {
        associations::unlink(uow, *doctor, id)?;
    }

    uow.delete::<Patient>(id);
    Ok(Some(patient))
}
