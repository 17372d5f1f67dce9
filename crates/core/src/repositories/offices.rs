//! Office directory.
//!
//! An office belongs to at most one doctor and a doctor owns at most one office. The link is
//! recorded on both records (`Office::doctor`, `Doctor::office`) and this service keeps the two
//! in step.

use super::require_doctor;
use crate::error::{ClinicError, ClinicResult};
use crate::model::{Doctor, DoctorId, Office, OfficeDetails, OfficeId, OfficeRecord};
use crate::store::{EntityStore, UnitOfWork};
use std::sync::Arc;

/// Service for office records.
#[derive(Debug)]
pub struct OfficeService<S> {
    store: Arc<S>,
}

impl<S> Clone for OfficeService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: EntityStore> OfficeService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Creates an office for an existing doctor that has no office yet.
    ///
    /// # Errors
    ///
    /// - [`ClinicError::MissingDoctor`] if the doctor does not exist.
    /// - [`ClinicError::DoctorAlreadyHasOffice`] if the doctor already owns an office.
    pub fn create(&self, details: OfficeDetails) -> ClinicResult<Office> {
        let doctor_id = details.doctor;
        let office = self.store.transaction(|uow| {
            let doctor = claimable_doctor(uow, doctor_id, None)?;

            let office = uow.insert(|id| Office {
                id,
                location: details.location,
                phone: details.phone,
                doctor: Some(doctor.id),
            })?;
            assign(uow, doctor, Some(office.id))?;
            Ok(office)
        })?;

        tracing::info!("created office {} for doctor {}", office.id, doctor_id);
        Ok(office)
    }

    pub fn get(&self, id: OfficeId) -> ClinicResult<Option<Office>> {
        self.store.transaction(|uow| Ok(uow.get::<Office>(id)))
    }

    /// Reads an office together with its doctor, if it still has one.
    pub fn read(&self, id: OfficeId) -> ClinicResult<Option<OfficeRecord>> {
        self.store.transaction(|uow| {
            Ok(uow.get::<Office>(id).map(|office| {
                let doctor = office.doctor.and_then(|d| uow.get::<Doctor>(d));
                OfficeRecord { office, doctor }
            }))
        })
    }

    /// Replaces location and phone, moving the office to another doctor if it changed.
    ///
    /// Returns `None` if the office does not exist.
    pub fn update(&self, id: OfficeId, details: OfficeDetails) -> ClinicResult<Option<Office>> {
        self.store.transaction(|uow| {
            let Some(mut office) = uow.get::<Office>(id) else {
                return Ok(None);
            };

            if office.doctor != Some(details.doctor) {
                let incoming = claimable_doctor(uow, details.doctor, Some(id))?;
                if let Some(previous) = office.doctor {
                    release_office(uow, previous, id)?;
                }
                assign(uow, incoming, Some(id))?;
                office.doctor = Some(details.doctor);
                tracing::debug!("office {} moved to doctor {}", id, details.doctor);
            }

            office.location = details.location;
            office.phone = details.phone;
            uow.replace(office.clone())?;
            Ok(Some(office))
        })
    }

    /// Deletes an office and clears its doctor's back-reference.
    pub fn delete(&self, id: OfficeId) -> ClinicResult<Option<Office>> {
        let deleted = self.store.transaction(|uow| {
            let Some(office) = uow.delete::<Office>(id) else {
                return Ok(None);
            };
            if let Some(doctor) = office.doctor {
                release_office(uow, doctor, id)?;
            }
            Ok(Some(office))
        })?;

        if deleted.is_some() {
            tracing::info!("deleted office {}", id);
        }
        Ok(deleted)
    }

    pub fn list_all(&self) -> ClinicResult<Vec<Office>> {
        self.store.transaction(|uow| Ok(uow.list_all::<Office>()))
    }
}

/// Loads `doctor` and checks it can take an office. An office it already owns only counts when
/// it is not `claimant`.
fn claimable_doctor(
    uow: &UnitOfWork<'_>,
    doctor: DoctorId,
    claimant: Option<OfficeId>,
) -> ClinicResult<Doctor> {
    let found = require_doctor(uow, doctor)?;
    match found.office {
        Some(office) if Some(office) != claimant && uow.contains::<Office>(office) => {
            Err(ClinicError::DoctorAlreadyHasOffice { doctor, office })
        }
        _ => Ok(found),
    }
}

fn assign(
    uow: &mut UnitOfWork<'_>,
    mut doctor: Doctor,
    office: Option<OfficeId>,
) -> ClinicResult<()> {
    doctor.office = office;
    uow.replace(doctor)
}

/// Clears `doctor`'s back-reference if it still points at `office`.
fn release_office(
    uow: &mut UnitOfWork<'_>,
    doctor: DoctorId,
    office: OfficeId,
) -> ClinicResult<()> {
    match uow.get::<Doctor>(doctor) {
        Some(found) if found.office == Some(office) => assign(uow, found, None),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::test_support::{clinic, doctor};
    use clinic_uuid::RecordId;

    #[test]
    fn test_create_sets_both_references() {
        let clinic = clinic();
        let d = doctor(&clinic, "Jane", "Smith");

        let office = clinic
            .offices()
            .create(
                OfficeDetails::new("Building A, Room 12", d.id)
                    .unwrap()
                    .with_phone("555-0199"),
            )
            .expect("create should succeed");

        assert_eq!(office.doctor, Some(d.id));
        assert_eq!(office.phone.as_deref(), Some("555-0199"));
        assert_eq!(
            clinic.doctors().get(d.id).unwrap().unwrap().office,
            Some(office.id)
        );

        let record = clinic.offices().read(office.id).unwrap().unwrap();
        assert_eq!(record.doctor.map(|d| d.id), Some(d.id));
    }

    #[test]
    fn test_create_requires_existing_doctor() {
        let clinic = clinic();
        let ghost = DoctorId::from(RecordId::new());

        let err = clinic
            .offices()
            .create(OfficeDetails::new("Room 1", ghost).unwrap())
            .expect_err("unknown doctor should be rejected");
        assert!(matches!(err, ClinicError::MissingDoctor(id) if id == ghost));
        assert!(clinic.offices().list_all().unwrap().is_empty());
    }

    #[test]
    fn test_create_rejects_second_office() {
        let clinic = clinic();
        let d = doctor(&clinic, "Jane", "Smith");
        let first = clinic
            .offices()
            .create(OfficeDetails::new("Room 1", d.id).unwrap())
            .unwrap();

        let err = clinic
            .offices()
            .create(OfficeDetails::new("Room 2", d.id).unwrap())
            .expect_err("second office should be rejected");
        assert!(matches!(
            err,
            ClinicError::DoctorAlreadyHasOffice { office, .. } if office == first.id
        ));
        assert_eq!(clinic.offices().list_all().unwrap().len(), 1);
    }

    #[test]
    fn test_update_moves_office_between_doctors() {
        let clinic = clinic();
        let old = doctor(&clinic, "Jane", "Smith");
        let new = doctor(&clinic, "Bob", "Brown");
        let office = clinic
            .offices()
            .create(OfficeDetails::new("Room 1", old.id).unwrap())
            .unwrap();

        let updated = clinic
            .offices()
            .update(office.id, OfficeDetails::new("Room 7", new.id).unwrap())
            .unwrap()
            .expect("office should exist");

        assert_eq!(updated.location.as_str(), "Room 7");
        assert_eq!(updated.doctor, Some(new.id));
        assert_eq!(clinic.doctors().get(old.id).unwrap().unwrap().office, None);
        assert_eq!(
            clinic.doctors().get(new.id).unwrap().unwrap().office,
            Some(office.id)
        );
    }

    #[test]
    fn test_update_same_doctor_keeps_reference() {
        let clinic = clinic();
        let d = doctor(&clinic, "Jane", "Smith");
        let office = clinic
            .offices()
            .create(OfficeDetails::new("Room 1", d.id).unwrap())
            .unwrap();

        clinic
            .offices()
            .update(office.id, OfficeDetails::new("Room 2", d.id).unwrap())
            .unwrap();

        assert_eq!(
            clinic.doctors().get(d.id).unwrap().unwrap().office,
            Some(office.id)
        );
    }

    #[test]
    fn test_update_rejects_busy_doctor_and_rolls_back() {
        let clinic = clinic();
        let a = doctor(&clinic, "Jane", "Smith");
        let b = doctor(&clinic, "Bob", "Brown");
        let office_a = clinic
            .offices()
            .create(OfficeDetails::new("Room 1", a.id).unwrap())
            .unwrap();
        clinic
            .offices()
            .create(OfficeDetails::new("Room 2", b.id).unwrap())
            .unwrap();

        let err = clinic
            .offices()
            .update(office_a.id, OfficeDetails::new("Room 9", b.id).unwrap())
            .expect_err("busy doctor should be rejected");
        assert!(matches!(err, ClinicError::DoctorAlreadyHasOffice { .. }));

        assert_eq!(clinic.offices().get(office_a.id).unwrap(), Some(office_a.clone()));
        assert_eq!(
            clinic.doctors().get(a.id).unwrap().unwrap().office,
            Some(office_a.id)
        );
    }

    #[test]
    fn test_update_reassigns_orphaned_office() {
        let clinic = clinic();
        let old = doctor(&clinic, "Jane", "Smith");
        let new = doctor(&clinic, "Bob", "Brown");
        let office = clinic
            .offices()
            .create(OfficeDetails::new("Room 1", old.id).unwrap())
            .unwrap();
        clinic.doctors().delete(old.id).unwrap();

        let updated = clinic
            .offices()
            .update(office.id, OfficeDetails::new("Room 1", new.id).unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(updated.doctor, Some(new.id));
    }

    #[test]
    fn test_delete_clears_doctor_reference() {
        let clinic = clinic();
        let d = doctor(&clinic, "Jane", "Smith");
        let office = clinic
            .offices()
            .create(OfficeDetails::new("Room 1", d.id).unwrap())
            .unwrap();

        let deleted = clinic.offices().delete(office.id).unwrap();
        assert_eq!(deleted, Some(office.clone()));
        assert_eq!(clinic.offices().get(office.id).unwrap(), None);
        assert_eq!(clinic.doctors().get(d.id).unwrap().unwrap().office, None);

        // The doctor is free to take a new office.
        assert!(clinic
            .offices()
            .create(OfficeDetails::new("Room 2", d.id).unwrap())
            .is_ok());
    }

    #[test]
    fn test_delete_missing_office_returns_none() {
        let clinic = clinic();
        assert_eq!(
            clinic
                .offices()
                .delete(OfficeId::from(RecordId::new()))
                .unwrap(),
            None
        );
    }
}
