//! Service bundle over one store.

use crate::repositories::{AppointmentService, DoctorService, OfficeService, PatientService};
use crate::store::EntityStore;
use std::sync::Arc;

/// All record services, sharing a single store handle.
///
/// Cheap to clone; clones share the store.
#[derive(Debug)]
pub struct Clinic<S> {
    patients: PatientService<S>,
    doctors: DoctorService<S>,
    offices: OfficeService<S>,
    appointments: AppointmentService<S>,
}

impl<S> Clone for Clinic<S> {
    fn clone(&self) -> Self {
        Self {
            patients: self.patients.clone(),
            doctors: self.doctors.clone(),
            offices: self.offices.clone(),
            appointments: self.appointments.clone(),
        }
    }
}

impl<S: EntityStore> Clinic<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            patients: PatientService::new(Arc::clone(&store)),
            doctors: DoctorService::new(Arc::clone(&store)),
            offices: OfficeService::new(Arc::clone(&store)),
            appointments: AppointmentService::new(store),
        }
    }

    pub fn patients(&self) -> &PatientService<S> {
        &self.patients
    }

    pub fn doctors(&self) -> &DoctorService<S> {
        &self.doctors
    }

    pub fn offices(&self) -> &OfficeService<S> {
        &self.offices
    }

    pub fn appointments(&self) -> &AppointmentService<S> {
        &self.appointments
    }
}
