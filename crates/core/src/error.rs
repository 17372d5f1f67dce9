use crate::model::{DoctorId, EntityKind, OfficeId, PatientId};

#[derive(Debug, thiserror::Error)]
pub enum ClinicError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid text: {0}")]
    Text(#[from] clinic_types::TextError),
    #[error("invalid record id: {0}")]
    Uuid(#[from] clinic_uuid::UuidError),

    #[error("patient {0} does not exist")]
    MissingPatient(PatientId),
    #[error("doctor {0} does not exist")]
    MissingDoctor(DoctorId),
    #[error("doctor {doctor} already has office {office}")]
    DoctorAlreadyHasOffice { doctor: DoctorId, office: OfficeId },
    #[error("{kind} {id} does not exist in the store")]
    MissingRecord {
        kind: EntityKind,
        id: clinic_uuid::RecordId,
    },

    #[error("failed to create store directory: {0}")]
    StoreDirCreation(std::io::Error),
    #[error("failed to write record file: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to remove record file: {0}")]
    FileRemove(std::io::Error),
    #[error("failed to serialize YAML: {0}")]
    YamlSerialization(serde_yaml::Error),
    #[error("failed to allocate a unique {0} id after 5 attempts")]
    IdAllocation(EntityKind),
}

pub type ClinicResult<T> = std::result::Result<T, ClinicError>;
