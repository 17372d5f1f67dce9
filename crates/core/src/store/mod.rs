//! Entity storage.
//!
//! Every service talks to storage through [`EntityStore::transaction`], which hands the caller a
//! [`UnitOfWork`] over all four tables; the first write switches it to a private copy. Changes
//! made through the unit of work become visible to other callers only if the closure returns
//! `Ok`; an `Err` discards them.
//! Units of work are serialized, so a read-decide-write sequence (for example "count the
//! appointments between a doctor and a patient, then drop their association") cannot interleave
//! with another one.
//!
//! Two implementations are provided:
//! - [`MemoryStore`]: tables live only in memory.
//! - [`FileStore`]: tables are cached in memory and each record is persisted as a YAML file in
//!   a sharded directory tree.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::constants::ID_ALLOCATION_ATTEMPTS;
use crate::error::{ClinicError, ClinicResult};
use crate::model::{
    Appointment, AppointmentId, Doctor, DoctorId, EntityKind, Office, OfficeId, Patient,
    PatientId,
};
use clinic_uuid::RecordId;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::{Mutex, MutexGuard};

/// Storage backend contract.
pub trait EntityStore: Send + Sync {
    /// Runs `work` as a single, serialized unit of work.
    ///
    /// # Errors
    ///
    /// Returns whatever `work` returns, or a store failure raised while committing. In both
    /// cases none of the changes made by `work` are visible afterwards.
    fn transaction<T, F>(&self, work: F) -> ClinicResult<T>
    where
        F: FnOnce(&mut UnitOfWork<'_>) -> ClinicResult<T>;
}

/// A record type that can be held in an entity store.
pub trait Entity: Clone + Serialize + DeserializeOwned + Send + 'static {
    type Id: Copy + Ord + fmt::Display + From<RecordId> + Into<RecordId>;

    const KIND: EntityKind;

    fn id(&self) -> Self::Id;

    #[doc(hidden)]
    fn table(tables: &Tables) -> &BTreeMap<Self::Id, Self>;

    #[doc(hidden)]
    fn table_mut(tables: &mut Tables) -> &mut BTreeMap<Self::Id, Self>;
}

/// The complete contents of a store.
#[derive(Clone, Debug, Default)]
pub struct Tables {
    patients: BTreeMap<PatientId, Patient>,
    doctors: BTreeMap<DoctorId, Doctor>,
    offices: BTreeMap<OfficeId, Office>,
    appointments: BTreeMap<AppointmentId, Appointment>,
}

impl Tables {
    pub(crate) fn put<E: Entity>(&mut self, entity: E) {
        E::table_mut(self).insert(entity.id(), entity);
    }
}

macro_rules! impl_entity {
    ($entity:ty, $id:ty, $kind:expr, $field:ident) => {
        impl Entity for $entity {
            type Id = $id;

            const KIND: EntityKind = $kind;

            fn id(&self) -> Self::Id {
                self.id
            }

            fn table(tables: &Tables) -> &BTreeMap<Self::Id, Self> {
                &tables.$field
            }

            fn table_mut(tables: &mut Tables) -> &mut BTreeMap<Self::Id, Self> {
                &mut tables.$field
            }
        }
    };
}

impl_entity!(Patient, PatientId, EntityKind::Patient, patients);
impl_entity!(Doctor, DoctorId, EntityKind::Doctor, doctors);
impl_entity!(Office, OfficeId, EntityKind::Office, offices);
impl_entity!(Appointment, AppointmentId, EntityKind::Appointment, appointments);

/// A record touched by a unit of work: written if it still exists at commit, removed otherwise.
pub(crate) type Touched = BTreeSet<(EntityKind, RecordId)>;

/// Locks the live tables of a store.
///
/// A unit of work never mutates the live tables in place, so a lock poisoned by a panicking
/// closure still guards consistent data and is recovered.
pub(crate) fn lock_tables(tables: &Mutex<Tables>) -> MutexGuard<'_, Tables> {
    tables.lock().unwrap_or_else(|poisoned| {
        tracing::warn!("recovering store lock poisoned by a panicked unit of work");
        poisoned.into_inner()
    })
}

/// Working view of the store handed to a transaction closure.
///
/// Reads go straight to the live tables; the first write takes a private copy, which replaces
/// the live tables at commit. All reads return owned copies; mutate the copy and write it back
/// with [`UnitOfWork::replace`].
#[derive(Debug)]
pub struct UnitOfWork<'a> {
    tables: Cow<'a, Tables>,
    touched: Touched,
}

impl<'a> UnitOfWork<'a> {
    pub(crate) fn begin(live: &'a Tables) -> Self {
        Self {
            tables: Cow::Borrowed(live),
            touched: Touched::new(),
        }
    }

    /// Returns the changed tables and the touched records, or `None` if nothing was written.
    pub(crate) fn finish(self) -> Option<(Tables, Touched)> {
        match self.tables {
            Cow::Owned(tables) if !self.touched.is_empty() => Some((tables, self.touched)),
            _ => None,
        }
    }

    fn table_mut<E: Entity>(&mut self) -> &mut BTreeMap<E::Id, E> {
        E::table_mut(self.tables.to_mut())
    }

    fn touch<E: Entity>(&mut self, id: E::Id) {
        self.touched.insert((E::KIND, id.into()));
    }

    /// Looks up a record by id.
    pub fn get<E: Entity>(&self, id: E::Id) -> Option<E> {
        E::table(&self.tables).get(&id).cloned()
    }

    pub fn contains<E: Entity>(&self, id: E::Id) -> bool {
        E::table(&self.tables).contains_key(&id)
    }

    /// Creates a record under a freshly allocated id.
    ///
    /// `build` receives the id and must return a record carrying it.
    ///
    /// # Errors
    ///
    /// Returns [`ClinicError::IdAllocation`] if no unused id was found after
    /// [`ID_ALLOCATION_ATTEMPTS`] tries.
    pub fn insert<E, F>(&mut self, build: F) -> ClinicResult<E>
    where
        E: Entity,
        F: FnOnce(E::Id) -> E,
    {
        for _attempt in 0..ID_ALLOCATION_ATTEMPTS {
            let id = E::Id::from(RecordId::new());
            if self.contains::<E>(id) {
                continue;
            }

            let entity = build(id);
            debug_assert!(entity.id() == id, "built record must carry the allocated id");
            self.table_mut::<E>().insert(id, entity.clone());
            self.touch::<E>(id);
            return Ok(entity);
        }

        Err(ClinicError::IdAllocation(E::KIND))
    }

    /// Overwrites an existing record.
    ///
    /// # Errors
    ///
    /// Returns [`ClinicError::MissingRecord`] if no record with that id exists.
    pub fn replace<E: Entity>(&mut self, entity: E) -> ClinicResult<()> {
        let id = entity.id();
        if !self.contains::<E>(id) {
            return Err(ClinicError::MissingRecord {
                kind: E::KIND,
                id: id.into(),
            });
        }

        self.table_mut::<E>().insert(id, entity);
        self.touch::<E>(id);
        Ok(())
    }

    /// Removes a record, returning it if it existed.
    pub fn delete<E: Entity>(&mut self, id: E::Id) -> Option<E> {
        if !self.contains::<E>(id) {
            return None;
        }

        let removed = self.table_mut::<E>().remove(&id);
        self.touch::<E>(id);
        removed
    }

    /// Returns every record matching `predicate`, ordered by id.
    pub fn query<E, P>(&self, predicate: P) -> Vec<E>
    where
        E: Entity,
        P: Fn(&E) -> bool,
    {
        E::table(&self.tables)
            .values()
            .filter(|entity| predicate(entity))
            .cloned()
            .collect()
    }

    /// Returns every record of one kind, ordered by id.
    pub fn list_all<E: Entity>(&self) -> Vec<E> {
        E::table(&self.tables).values().cloned().collect()
    }

    /// Counts appointments that reference both `doctor` and `patient`, ignoring `excluding`.
    pub fn count_appointments(
        &self,
        doctor: DoctorId,
        patient: PatientId,
        excluding: Option<AppointmentId>,
    ) -> usize {
        self.tables
            .appointments
            .values()
            .filter(|a| a.links(doctor, patient) && Some(a.id) != excluding)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AppointmentDetails, DoctorDetails, PatientDetails};
    use chrono::NaiveDate;

    fn patient(uow: &mut UnitOfWork<'_>) -> Patient {
        uow.insert(|id| Patient {
            id,
            details: PatientDetails::new("John", "Doe").unwrap(),
            doctors: Default::default(),
        })
        .expect("insert should succeed")
    }

    fn doctor(uow: &mut UnitOfWork<'_>) -> Doctor {
        uow.insert(|id| Doctor {
            id,
            details: DoctorDetails::new("Jane", "Smith").unwrap(),
            patients: Default::default(),
            office: None,
        })
        .expect("insert should succeed")
    }

    fn appointment(uow: &mut UnitOfWork<'_>, doctor: DoctorId, patient: PatientId) -> Appointment {
        uow.insert(|id| Appointment {
            id,
            details: AppointmentDetails::new(
                doctor,
                patient,
                NaiveDate::from_ymd_opt(2024, 9, 1).unwrap(),
                "",
            ),
        })
        .expect("insert should succeed")
    }

    #[test]
    fn test_insert_assigns_id_and_touches_record() {
        let tables = Tables::default();
        let mut uow = UnitOfWork::begin(&tables);
        let p = patient(&mut uow);

        assert_eq!(uow.get::<Patient>(p.id), Some(p.clone()));
        let (tables, touched) = uow.finish().expect("insert should leave changes to commit");
        assert!(touched.contains(&(EntityKind::Patient, p.id.record_id())));
        assert!(tables.patients.contains_key(&p.id));
    }

    #[test]
    fn test_read_only_unit_of_work_leaves_nothing_to_commit() {
        let mut tables = Tables::default();
        let existing = {
            let mut uow = UnitOfWork::begin(&tables);
            let p = patient(&mut uow);
            let (changed, _) = uow.finish().expect("insert should leave changes to commit");
            tables = changed;
            p
        };

        let mut uow = UnitOfWork::begin(&tables);
        assert_eq!(uow.get::<Patient>(existing.id), Some(existing.clone()));
        assert_eq!(uow.list_all::<Patient>().len(), 1);
        assert_eq!(uow.delete::<Doctor>(DoctorId::from(RecordId::new())), None);
        assert!(matches!(uow.tables, Cow::Borrowed(_)));
        assert!(uow.finish().is_none());
    }

    #[test]
    fn test_replace_missing_record_fails() {
        let tables = Tables::default();
        let mut uow = UnitOfWork::begin(&tables);
        let orphan = Patient {
            id: PatientId::from(RecordId::new()),
            details: PatientDetails::new("No", "Body").unwrap(),
            doctors: Default::default(),
        };

        let err = uow.replace(orphan).expect_err("replace of absent record should fail");
        assert!(matches!(
            err,
            ClinicError::MissingRecord {
                kind: EntityKind::Patient,
                ..
            }
        ));
    }

    #[test]
    fn test_delete_returns_removed_record() {
        let tables = Tables::default();
        let mut uow = UnitOfWork::begin(&tables);
        let d = doctor(&mut uow);

        assert_eq!(uow.delete::<Doctor>(d.id), Some(d.clone()));
        assert_eq!(uow.delete::<Doctor>(d.id), None);
        assert!(!uow.contains::<Doctor>(d.id));
    }

    #[test]
    fn test_count_appointments_honours_exclusion() {
        let tables = Tables::default();
        let mut uow = UnitOfWork::begin(&tables);
        let p = patient(&mut uow);
        let d = doctor(&mut uow);
        let other = doctor(&mut uow);
        let a1 = appointment(&mut uow, d.id, p.id);
        appointment(&mut uow, d.id, p.id);
        appointment(&mut uow, other.id, p.id);

        assert_eq!(uow.count_appointments(d.id, p.id, None), 2);
        assert_eq!(uow.count_appointments(d.id, p.id, Some(a1.id)), 1);
        assert_eq!(uow.count_appointments(other.id, p.id, None), 1);
    }

    #[test]
    fn test_query_filters_records() {
        let tables = Tables::default();
        let mut uow = UnitOfWork::begin(&tables);
        let p = patient(&mut uow);
        let d = doctor(&mut uow);
        let other = doctor(&mut uow);
        appointment(&mut uow, d.id, p.id);
        appointment(&mut uow, other.id, p.id);

        let for_doctor = uow.query::<Appointment, _>(|a| a.doctor() == d.id);
        assert_eq!(for_doctor.len(), 1);
        assert_eq!(uow.list_all::<Appointment>().len(), 2);
    }
}
