//! Record services.
//!
//! One service per entity kind, each a thin facade over an [`EntityStore`]. Every public
//! service method runs as a single unit of work.
//!
//! The doctor↔patient association sets are owned by [`associations`]: the directory services
//! expose single-sided add/remove operations, and the appointment lifecycle and the cascading
//! deletes go through `associations` so both sides always change together.
//!
//! [`EntityStore`]: crate::store::EntityStore

pub mod appointments;
pub mod associations;
pub mod doctors;
pub mod offices;
pub mod patients;

pub use appointments::AppointmentService;
pub use associations::AssociationIssue;
pub use doctors::DoctorService;
pub use offices::OfficeService;
pub use patients::PatientService;

use crate::error::{ClinicError, ClinicResult};
use crate::model::{Doctor, DoctorId, Patient, PatientId};
use crate::store::UnitOfWork;

pub(crate) fn require_patient(uow: &UnitOfWork<'_>, id: PatientId) -> ClinicResult<Patient> {
    uow.get::<Patient>(id).ok_or(ClinicError::MissingPatient(id))
}

pub(crate) fn require_doctor(uow: &UnitOfWork<'_>, id: DoctorId) -> ClinicResult<Doctor> {
    uow.get::<Doctor>(id).ok_or(ClinicError::MissingDoctor(id))
}
