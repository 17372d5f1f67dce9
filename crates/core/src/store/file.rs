//! File-backed entity store.
//!
//! ## Storage Layout
//!
//! ```text
//! <data_dir>/
//!   patients/<s1>/<s2>/<id>/patient.yaml
//!   doctors/<s1>/<s2>/<id>/doctor.yaml
//!   offices/<s1>/<s2>/<id>/office.yaml
//!   appointments/<s1>/<s2>/<id>/appointment.yaml
//! ```
//!
//! where `s1` and `s2` are the first four hex characters of the record id.
//!
//! The whole tree is read once when the store is opened and then cached. A committed unit of
//! work writes only the records it touched: each file is written to a temporary sibling and
//! renamed into place, and deleted records have their directory removed. The cache is replaced
//! only after every file operation succeeded. A crash part-way through a commit can still leave
//! some of that commit's files on disk.

use super::{lock_tables, Entity, EntityStore, Tables, Touched, UnitOfWork};
use crate::constants::{
    APPOINTMENTS_DIR_NAME, DOCTORS_DIR_NAME, OFFICES_DIR_NAME, PATIENTS_DIR_NAME,
    TEMP_FILE_SUFFIX,
};
use crate::error::{ClinicError, ClinicResult};
use crate::model::{Appointment, Doctor, EntityKind, Office, Patient};
use clinic_uuid::RecordId;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// A store persisting each record as a YAML file under a data directory.
#[derive(Debug)]
pub struct FileStore {
    root: PathBuf,
    tables: Mutex<Tables>,
}

impl FileStore {
    /// Opens (creating if needed) a store rooted at `root` and loads every readable record.
    ///
    /// Record files that cannot be read or parsed are logged and skipped; they are left on disk
    /// untouched.
    ///
    /// # Errors
    ///
    /// Returns [`ClinicError::StoreDirCreation`] if the kind directories cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> ClinicResult<Self> {
        let root = root.into();
        for kind in EntityKind::ALL {
            fs::create_dir_all(kind_dir(&root, kind)).map_err(ClinicError::StoreDirCreation)?;
        }

        let mut tables = Tables::default();
        load_kind::<Patient>(&root, &mut tables);
        load_kind::<Doctor>(&root, &mut tables);
        load_kind::<Office>(&root, &mut tables);
        load_kind::<Appointment>(&root, &mut tables);

        tracing::info!("opened clinic store at {}", root.display());

        Ok(Self {
            root,
            tables: Mutex::new(tables),
        })
    }

    fn flush(&self, tables: &Tables, touched: &Touched) -> ClinicResult<()> {
        for (kind, id) in touched {
            match kind {
                EntityKind::Patient => flush_record::<Patient>(&self.root, tables, *id)?,
                EntityKind::Doctor => flush_record::<Doctor>(&self.root, tables, *id)?,
                EntityKind::Office => flush_record::<Office>(&self.root, tables, *id)?,
                EntityKind::Appointment => flush_record::<Appointment>(&self.root, tables, *id)?,
            }
        }
        Ok(())
    }
}

impl EntityStore for FileStore {
    fn transaction<T, F>(&self, work: F) -> ClinicResult<T>
    where
        F: FnOnce(&mut UnitOfWork<'_>) -> ClinicResult<T>,
    {
        let mut live = lock_tables(&self.tables);

        let mut uow = UnitOfWork::begin(&live);
        let out = work(&mut uow)?;

        if let Some((tables, touched)) = uow.finish() {
            self.flush(&tables, &touched)?;
            *live = tables;
        }
        Ok(out)
    }
}

fn kind_dir(root: &Path, kind: EntityKind) -> PathBuf {
    let name = match kind {
        EntityKind::Patient => PATIENTS_DIR_NAME,
        EntityKind::Doctor => DOCTORS_DIR_NAME,
        EntityKind::Office => OFFICES_DIR_NAME,
        EntityKind::Appointment => APPOINTMENTS_DIR_NAME,
    };
    root.join(name)
}

fn record_file_name(kind: EntityKind) -> String {
    format!("{}.yaml", kind.name())
}

fn record_dir(root: &Path, kind: EntityKind, id: RecordId) -> PathBuf {
    id.sharded_dir(&kind_dir(root, kind))
}

fn flush_record<E: Entity>(root: &Path, tables: &Tables, id: RecordId) -> ClinicResult<()> {
    let dir = record_dir(root, E::KIND, id);

    match E::table(tables).get(&E::Id::from(id)) {
        Some(entity) => {
            let yaml = serde_yaml::to_string(entity).map_err(ClinicError::YamlSerialization)?;
            fs::create_dir_all(&dir).map_err(ClinicError::StoreDirCreation)?;

            let file = dir.join(record_file_name(E::KIND));
            let tmp = file.with_extension(format!("yaml.{TEMP_FILE_SUFFIX}"));
            fs::write(&tmp, yaml).map_err(ClinicError::FileWrite)?;
            fs::rename(&tmp, &file).map_err(ClinicError::FileWrite)?;
        }
        None => match fs::remove_dir_all(&dir) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(ClinicError::FileRemove(e)),
        },
    }

    Ok(())
}

/// Reads every `<kind>.yaml` under the sharded tree for `E` into `tables`.
fn load_kind<E: Entity>(root: &Path, tables: &mut Tables) {
    let base = kind_dir(root, E::KIND);
    let file_name = record_file_name(E::KIND);

    let s1_iter = match fs::read_dir(&base) {
        Ok(it) => it,
        Err(_) => return,
    };

    for s1 in s1_iter.flatten() {
        let s1_path = s1.path();
        if !s1_path.is_dir() {
            continue;
        }

        let s2_iter = match fs::read_dir(&s1_path) {
            Ok(it) => it,
            Err(_) => continue,
        };

        for s2 in s2_iter.flatten() {
            let s2_path = s2.path();
            if !s2_path.is_dir() {
                continue;
            }

            let id_iter = match fs::read_dir(&s2_path) {
                Ok(it) => it,
                Err(_) => continue,
            };

            for id_ent in id_iter.flatten() {
                let id_path = id_ent.path();
                let record_path = id_path.join(&file_name);
                if !record_path.is_file() {
                    continue;
                }

                let contents = match fs::read_to_string(&record_path) {
                    Ok(contents) => contents,
                    Err(e) => {
                        tracing::warn!("failed to read {}: {}", record_path.display(), e);
                        continue;
                    }
                };

                let entity = match serde_yaml::from_str::<E>(&contents) {
                    Ok(entity) => entity,
                    Err(e) => {
                        tracing::warn!("failed to parse {}: {}", record_path.display(), e);
                        continue;
                    }
                };

                let dir_name = id_path.file_name().and_then(|os| os.to_str());
                let id: RecordId = entity.id().into();
                if dir_name != Some(id.to_string().as_str()) {
                    tracing::warn!(
                        "skipping {}: record id {} does not match its directory",
                        record_path.display(),
                        id
                    );
                    continue;
                }

                tables.put(entity);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AppointmentDetails, DoctorDetails, PatientDetails};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn insert_patient(uow: &mut UnitOfWork<'_>) -> ClinicResult<Patient> {
        uow.insert(|id| Patient {
            id,
            details: PatientDetails::new("John", "Doe").unwrap(),
            doctors: Default::default(),
        })
    }

    #[test]
    fn test_open_creates_kind_directories() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let _store = FileStore::open(temp_dir.path()).expect("open should succeed");

        for dir in [
            PATIENTS_DIR_NAME,
            DOCTORS_DIR_NAME,
            OFFICES_DIR_NAME,
            APPOINTMENTS_DIR_NAME,
        ] {
            assert!(temp_dir.path().join(dir).is_dir(), "{dir} should exist");
        }
    }

    #[test]
    fn test_commit_writes_sharded_record_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = FileStore::open(temp_dir.path()).expect("open should succeed");

        let patient = store
            .transaction(insert_patient)
            .expect("transaction should succeed");

        let file = patient
            .id
            .record_id()
            .sharded_dir(&temp_dir.path().join(PATIENTS_DIR_NAME))
            .join("patient.yaml");
        assert!(file.is_file(), "patient.yaml should exist");

        let yaml = fs::read_to_string(&file).expect("should read patient.yaml");
        let parsed: Patient = serde_yaml::from_str(&yaml).expect("should parse patient.yaml");
        assert_eq!(parsed, patient);
    }

    #[test]
    fn test_records_survive_reopen() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let (doctor, patient, appointment) = {
            let store = FileStore::open(temp_dir.path()).expect("open should succeed");
            store
                .transaction(|uow| {
                    let patient = insert_patient(uow)?;
                    let doctor = uow.insert(|id| Doctor {
                        id,
                        details: DoctorDetails::new("Jane", "Smith").unwrap(),
                        patients: [patient.id].into_iter().collect(),
                        office: None,
                    })?;
                    let appointment = uow.insert(|id| Appointment {
                        id,
                        details: AppointmentDetails::new(
                            doctor.id,
                            patient.id,
                            NaiveDate::from_ymd_opt(2024, 9, 1).unwrap(),
                            "Annual checkup",
                        ),
                    })?;
                    Ok((doctor, patient, appointment))
                })
                .expect("transaction should succeed")
        };

        let reopened = FileStore::open(temp_dir.path()).expect("reopen should succeed");
        reopened
            .transaction(|uow| {
                assert_eq!(uow.get::<Doctor>(doctor.id), Some(doctor.clone()));
                assert_eq!(uow.get::<Patient>(patient.id), Some(patient.clone()));
                assert_eq!(
                    uow.get::<Appointment>(appointment.id),
                    Some(appointment.clone())
                );
                Ok(())
            })
            .expect("read should succeed");
    }

    #[test]
    fn test_delete_removes_record_directory() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = FileStore::open(temp_dir.path()).expect("open should succeed");

        let patient = store
            .transaction(insert_patient)
            .expect("transaction should succeed");
        let dir = patient
            .id
            .record_id()
            .sharded_dir(&temp_dir.path().join(PATIENTS_DIR_NAME));
        assert!(dir.is_dir());

        store
            .transaction(|uow| Ok(uow.delete::<Patient>(patient.id)))
            .expect("delete should succeed");
        assert!(!dir.exists(), "record directory should be removed");
    }

    #[test]
    fn test_failed_unit_of_work_writes_nothing() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = FileStore::open(temp_dir.path()).expect("open should succeed");

        let result: ClinicResult<()> = store.transaction(|uow| {
            insert_patient(uow)?;
            Err(ClinicError::InvalidInput("abort".into()))
        });
        assert!(result.is_err());

        let entries = fs::read_dir(temp_dir.path().join(PATIENTS_DIR_NAME))
            .expect("patients dir should exist")
            .count();
        assert_eq!(entries, 0, "no shard directories should be created");
    }

    #[test]
    fn test_open_skips_invalid_yaml() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        {
            let store = FileStore::open(temp_dir.path()).expect("open should succeed");
            store
                .transaction(insert_patient)
                .expect("transaction should succeed");
        }

        let bogus = RecordId::new();
        let bogus_dir = bogus.sharded_dir(&temp_dir.path().join(PATIENTS_DIR_NAME));
        fs::create_dir_all(&bogus_dir).expect("should create directory");
        fs::write(bogus_dir.join("patient.yaml"), "invalid: yaml: content: [[[")
            .expect("should write invalid yaml");

        let store = FileStore::open(temp_dir.path()).expect("reopen should succeed");
        let patients = store
            .transaction(|uow| Ok(uow.list_all::<Patient>()))
            .expect("read should succeed");

        assert_eq!(patients.len(), 1, "only the valid patient should load");
        assert!(bogus_dir.join("patient.yaml").is_file(), "invalid file is left alone");
    }

    #[test]
    fn test_open_skips_record_in_wrong_directory() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let patient = {
            let store = FileStore::open(temp_dir.path()).expect("open should succeed");
            store
                .transaction(insert_patient)
                .expect("transaction should succeed")
        };

        let source = patient
            .id
            .record_id()
            .sharded_dir(&temp_dir.path().join(PATIENTS_DIR_NAME))
            .join("patient.yaml");
        let elsewhere = RecordId::new().sharded_dir(&temp_dir.path().join(PATIENTS_DIR_NAME));
        fs::create_dir_all(&elsewhere).expect("should create directory");
        fs::copy(&source, elsewhere.join("patient.yaml")).expect("should copy file");

        let store = FileStore::open(temp_dir.path()).expect("reopen should succeed");
        let patients = store
            .transaction(|uow| Ok(uow.list_all::<Patient>()))
            .expect("read should succeed");
        assert_eq!(patients, vec![patient]);
    }
}
