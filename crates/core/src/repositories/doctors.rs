//! Doctor directory.
//!
//! Deleting a doctor leaves their office in place with no doctor, deletes the doctor's
//! appointments, and removes the doctor from every associated patient.

use super::{associations, require_doctor, require_patient};
use crate::error::{ClinicError, ClinicResult};
use crate::model::{
    Appointment, Doctor, DoctorDetails, DoctorId, DoctorRecord, Office, Patient, PatientId,
};
use crate::store::{EntityStore, UnitOfWork};
use std::sync::Arc;

/// Service for doctor records.
#[derive(Debug)]
pub struct DoctorService<S> {
    store: Arc<S>,
}

impl<S> Clone for DoctorService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: EntityStore> DoctorService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Creates a doctor with no patients and no office.
    pub fn create(&self, details: DoctorDetails) -> ClinicResult<Doctor> {
        let doctor = self.store.transaction(|uow| {
            uow.insert(|id| Doctor {
                id,
                details,
                patients: Default::default(),
                office: None,
            })
        })?;

        tracing::info!("created doctor {}", doctor.id);
        Ok(doctor)
    }

    pub fn get(&self, id: DoctorId) -> ClinicResult<Option<Doctor>> {
        self.store.transaction(|uow| Ok(uow.get::<Doctor>(id)))
    }

    /// Reads a doctor together with their patients and office.
    pub fn read(&self, id: DoctorId) -> ClinicResult<Option<DoctorRecord>> {
        self.store.transaction(|uow| {
            let Some(doctor) = uow.get::<Doctor>(id) else {
                return Ok(None);
            };
            let patients = doctor
                .patients
                .iter()
                .filter_map(|p| uow.get::<Patient>(*p))
                .collect();
            let office = doctor.office.and_then(|o| uow.get::<Office>(o));

            Ok(Some(DoctorRecord {
                doctor,
                patients,
                office,
            }))
        })
    }

    /// Replaces the descriptive fields of a doctor. Patients and office are preserved.
    pub fn update(&self, id: DoctorId, details: DoctorDetails) -> ClinicResult<Option<Doctor>> {
        self.store.transaction(|uow| {
            let Some(mut doctor) = uow.get::<Doctor>(id) else {
                return Ok(None);
            };
            doctor.details = details;
            uow.replace(doctor.clone())?;
            Ok(Some(doctor))
        })
    }

    /// Deletes a doctor and everything that only makes sense with them present.
    ///
    /// Returns the deleted doctor, or `None` if it did not exist.
    pub fn delete(&self, id: DoctorId) -> ClinicResult<Option<Doctor>> {
        let deleted = self.store.transaction(|uow| delete_cascading(uow, id))?;
        if deleted.is_some() {
            tracing::info!("deleted doctor {}", id);
        }
        Ok(deleted)
    }

    pub fn list_all(&self) -> ClinicResult<Vec<Doctor>> {
        self.store.transaction(|uow| Ok(uow.list_all::<Doctor>()))
    }

    /// Adds `patient` to the doctor's patient set. Returns `false` if it was already present.
    ///
    /// This edits the doctor side only.
    ///
    /// # Errors
    ///
    /// [`ClinicError::MissingDoctor`] or [`ClinicError::MissingPatient`] if either record is
    /// absent.
    pub fn add_patient(&self, doctor: DoctorId, patient: PatientId) -> ClinicResult<bool> {
        self.store.transaction(|uow| add_patient(uow, doctor, patient))
    }

    /// Removes `patient` from the doctor's patient set. Returns `false` if it was not present.
    pub fn remove_patient(&self, doctor: DoctorId, patient: PatientId) -> ClinicResult<bool> {
        self.store.transaction(|uow| remove_patient(uow, doctor, patient))
    }
}

pub(crate) fn add_patient(
    uow: &mut UnitOfWork<'_>,
    doctor: DoctorId,
    patient: PatientId,
) -> ClinicResult<bool> {
    let mut owner = require_doctor(uow, doctor)?;
    if owner.patients.contains(&patient) {
        return Ok(false);
    }
    require_patient(uow, patient)?;

    owner.patients.insert(patient);
    uow.replace(owner)?;
    Ok(true)
}

pub(crate) fn remove_patient(
    uow: &mut UnitOfWork<'_>,
    doctor: DoctorId,
    patient: PatientId,
) -> ClinicResult<bool> {
    let mut owner = uow
        .get::<Doctor>(doctor)
        .ok_or(ClinicError::MissingDoctor(doctor))?;
    if !owner.patients.remove(&patient) {
        return Ok(false);
    }

    uow.replace(owner)?;
    Ok(true)
}

fn delete_cascading(uow: &mut UnitOfWork<'_>, id: DoctorId) -> ClinicResult<Option<Doctor>> {
    let Some(doctor) = uow.get::<Doctor>(id) else {
        return Ok(None);
    };

    if let Some(office_id) = doctor.office {
        if let Some(mut office) = uow.get::<Office>(office_id) {
            office.doctor = None;
            uow.replace(office)?;
            tracing::debug!("office {} no longer has a doctor", office_id);
        }
    }

    for appointment in uow.query::<Appointment, _>(|a| a.doctor() == id) {
        uow.delete::<Appointment>(appointment.id);
        tracing::debug!("deleted appointment {} with doctor {}", appointment.id, id);
    }

    for patient in &doctor.patients {
        associations::unlink(uow, id, *patient)?;
    }

    uow.delete::<Doctor>(id);
    Ok(Some(doctor))
}
