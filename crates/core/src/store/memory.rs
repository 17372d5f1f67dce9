use super::{lock_tables, EntityStore, Tables, UnitOfWork};
use crate::error::ClinicResult;
use std::sync::Mutex;

/// A store that keeps every table in memory. Contents are lost when it is dropped.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EntityStore for MemoryStore {
    fn transaction<T, F>(&self, work: F) -> ClinicResult<T>
    where
        F: FnOnce(&mut UnitOfWork<'_>) -> ClinicResult<T>,
    {
        let mut live = lock_tables(&self.tables);

        let mut uow = UnitOfWork::begin(&live);
        let out = work(&mut uow)?;

        if let Some((tables, _)) = uow.finish() {
            *live = tables;
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClinicError;
    use crate::model::{Patient, PatientDetails};
    use std::panic::{self, AssertUnwindSafe};

    fn insert_patient(uow: &mut UnitOfWork<'_>) -> ClinicResult<Patient> {
        uow.insert(|id| Patient {
            id,
            details: PatientDetails::new("John", "Doe").unwrap(),
            doctors: Default::default(),
        })
    }

    #[test]
    fn test_committed_changes_are_visible() {
        let store = MemoryStore::new();
        let patient = store
            .transaction(insert_patient)
            .expect("transaction should succeed");

        let found = store
            .transaction(|uow| Ok(uow.get::<Patient>(patient.id)))
            .expect("read should succeed");
        assert_eq!(found, Some(patient));
    }

    #[test]
    fn test_failed_unit_of_work_rolls_back() {
        let store = MemoryStore::new();

        let result: ClinicResult<()> = store.transaction(|uow| {
            insert_patient(uow)?;
            Err(ClinicError::InvalidInput("abort".into()))
        });
        assert!(result.is_err());

        let count = store
            .transaction(|uow| Ok(uow.list_all::<Patient>().len()))
            .expect("read should succeed");
        assert_eq!(count, 0, "aborted insert must not be visible");
    }

    #[test]
    fn test_store_recovers_after_panicking_unit_of_work() {
        let store = MemoryStore::new();
        let kept = store
            .transaction(insert_patient)
            .expect("transaction should succeed");

        let panicked = panic::catch_unwind(AssertUnwindSafe(|| {
            let _: ClinicResult<()> = store.transaction(|uow| {
                insert_patient(uow)?;
                panic!("unit of work panicked");
            });
        }));
        assert!(panicked.is_err());

        let added = store
            .transaction(insert_patient)
            .expect("store should stay usable after a panic");
        let ids: Vec<_> = store
            .transaction(|uow| Ok(uow.list_all::<Patient>()))
            .expect("read should succeed")
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids.len(), 2, "the panicked insert must not be visible");
        assert!(ids.contains(&kept.id));
        assert!(ids.contains(&added.id));
    }
}
