//! Appointment lifecycle.
//!
//! Creating, updating and deleting appointments is where doctor↔patient associations come and
//! go. Every operation here runs as one unit of work, so the association sets are never observed
//! half-updated and two concurrent operations cannot both decide that an association is (or is
//! not) still needed.
//!
//! Association rules applied by each operation:
//!
//! - **create**: the pair is linked before the appointment is stored.
//! - **update**: if the doctor or patient changed, the new pair is linked and the old pair is
//!   released unless another appointment (not counting the one being updated) still connects it.
//! - **delete**: the row is removed first, then the pair is released if nothing else connects it.

use super::associations::{self, AssociationIssue};
use super::{require_doctor, require_patient};
use crate::error::ClinicResult;
use crate::model::{
    Appointment, AppointmentDetails, AppointmentId, AppointmentRecord, Doctor, DoctorId, Patient,
    PatientId,
};
use crate::store::EntityStore;
use std::sync::Arc;

/// Service for appointments and the associations they justify.
#[derive(Debug)]
pub struct AppointmentService<S> {
    store: Arc<S>,
}

impl<S> Clone for AppointmentService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: EntityStore> AppointmentService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Books an appointment and links its doctor and patient.
    ///
    /// # Errors
    ///
    /// [`ClinicError::MissingDoctor`] or [`ClinicError::MissingPatient`] if either record does
    /// not exist. Nothing is stored in that case.
    ///
    /// [`ClinicError::MissingDoctor`]: crate::error::ClinicError::MissingDoctor
    /// [`ClinicError::MissingPatient`]: crate::error::ClinicError::MissingPatient
    pub fn create(&self, details: AppointmentDetails) -> ClinicResult<Appointment> {
        let appointment = self.store.transaction(|uow| {
            require_doctor(uow, details.doctor)?;
            require_patient(uow, details.patient)?;

            associations::link(uow, details.doctor, details.patient)?;
            uow.insert(|id| Appointment { id, details })
        })?;

        tracing::info!(
            "created appointment {} for doctor {} and patient {}",
            appointment.id,
            appointment.doctor(),
            appointment.patient()
        );
        Ok(appointment)
    }

    /// Reads an appointment together with its doctor and patient.
    ///
    /// Returns `None` if the appointment does not exist, or if either party has gone missing.
    pub fn read(&self, id: AppointmentId) -> ClinicResult<Option<AppointmentRecord>> {
        self.store.transaction(|uow| {
            let Some(appointment) = uow.get::<Appointment>(id) else {
                return Ok(None);
            };
            let doctor = uow.get::<Doctor>(appointment.doctor());
            let patient = uow.get::<Patient>(appointment.patient());

            Ok(doctor.zip(patient).map(|(doctor, patient)| AppointmentRecord {
                appointment,
                doctor,
                patient,
            }))
        })
    }

    pub fn get(&self, id: AppointmentId) -> ClinicResult<Option<Appointment>> {
        self.store.transaction(|uow| Ok(uow.get::<Appointment>(id)))
    }

    /// Replaces an appointment's doctor, patient, date and notes.
    ///
    /// Returns `None` if no appointment with `appointment.id` exists.
    ///
    /// # Errors
    ///
    /// [`ClinicError::MissingDoctor`] or [`ClinicError::MissingPatient`] if the new doctor or
    /// patient does not exist. The stored appointment and associations are left unchanged.
    ///
    /// [`ClinicError::MissingDoctor`]: crate::error::ClinicError::MissingDoctor
    /// [`ClinicError::MissingPatient`]: crate::error::ClinicError::MissingPatient
    pub fn update(&self, appointment: Appointment) -> ClinicResult<Option<Appointment>> {
        let id = appointment.id;
        let updated = self.store.transaction(|uow| {
            let Some(current) = uow.get::<Appointment>(id) else {
                return Ok(None);
            };
            let (old_doctor, old_patient) = (current.doctor(), current.patient());
            let (new_doctor, new_patient) = (appointment.doctor(), appointment.patient());

            require_doctor(uow, new_doctor)?;
            require_patient(uow, new_patient)?;

            if (new_doctor, new_patient) != (old_doctor, old_patient) {
                associations::link(uow, new_doctor, new_patient)?;
                associations::release(uow, old_doctor, old_patient, Some(id))?;
            }

            uow.replace(appointment.clone())?;
            Ok(Some(appointment))
        })?;

        if updated.is_some() {
            tracing::info!("updated appointment {}", id);
        }
        Ok(updated)
    }

    /// Cancels an appointment, dropping the association if it was the pair's last one.
    ///
    /// Returns the removed appointment, or `None` if it did not exist.
    pub fn delete(&self, id: AppointmentId) -> ClinicResult<Option<Appointment>> {
        let deleted = self.store.transaction(|uow| {
            let Some(removed) = uow.delete::<Appointment>(id) else {
                return Ok(None);
            };
            associations::release(uow, removed.doctor(), removed.patient(), None)?;
            Ok(Some(removed))
        })?;

        if deleted.is_some() {
            tracing::info!("deleted appointment {}", id);
        }
        Ok(deleted)
    }

    /// True if some appointment other than `appointment` connects `doctor` and `patient`.
    pub fn has_other_appointments_between(
        &self,
        doctor: DoctorId,
        patient: PatientId,
        appointment: AppointmentId,
    ) -> ClinicResult<bool> {
        self.store
            .transaction(|uow| Ok(uow.count_appointments(doctor, patient, Some(appointment)) > 0))
    }

    pub fn count_appointments_between(
        &self,
        doctor: DoctorId,
        patient: PatientId,
    ) -> ClinicResult<usize> {
        self.store
            .transaction(|uow| Ok(uow.count_appointments(doctor, patient, None)))
    }

    pub fn list_all(&self) -> ClinicResult<Vec<Appointment>> {
        self.store.transaction(|uow| Ok(uow.list_all::<Appointment>()))
    }

    /// Reports every association that disagrees with the stored appointments.
    pub fn check_associations(&self) -> ClinicResult<Vec<AssociationIssue>> {
        self.store.transaction(|uow| Ok(associations::check(uow)))
    }
}
