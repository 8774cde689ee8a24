//! Record store seam and the sync gateway that writes through it.
//!
//! The odontogram never talks to storage directly. Every read and write goes
//! through a [`RecordStore`], wrapped by a [`RecordSyncGateway`] that decides
//! between insert and update for a (patient, tooth) key.

mod gateway;

pub use gateway::*;

use thiserror::Error;

use crate::db::{Database, DbError};
use crate::models::{NewToothRecord, ToothNumber, ToothRecord, ToothRecordPatch};

/// Errors reported by a record store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Database(#[from] DbError),

    #[error("record store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Whether the store refused the write because the (patient, tooth) key is taken.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, StoreError::Database(DbError::Constraint(_)))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// The external store of dental records.
pub trait RecordStore {
    /// All records for a patient.
    fn fetch_for_patient(&self, patient_id: &str) -> StoreResult<Vec<ToothRecord>>;

    /// The record for one (patient, tooth) pair, if any.
    fn find_record(
        &self,
        patient_id: &str,
        tooth_number: ToothNumber,
    ) -> StoreResult<Option<ToothRecord>>;

    /// Create a record. Must reject a second record for the same (patient, tooth).
    fn insert_record(&self, record: &NewToothRecord) -> StoreResult<ToothRecord>;

    /// Update the given fields if the record is still at `expected_version`.
    ///
    /// `Ok(None)` means the version check failed.
    fn update_record(
        &self,
        id: &str,
        expected_version: i64,
        patch: &ToothRecordPatch,
    ) -> StoreResult<Option<ToothRecord>>;
}

impl RecordStore for Database {
    fn fetch_for_patient(&self, patient_id: &str) -> StoreResult<Vec<ToothRecord>> {
        Ok(self.list_tooth_records(patient_id)?)
    }

    fn find_record(
        &self,
        patient_id: &str,
        tooth_number: ToothNumber,
    ) -> StoreResult<Option<ToothRecord>> {
        Ok(self.find_tooth_record(patient_id, tooth_number)?)
    }

    fn insert_record(&self, record: &NewToothRecord) -> StoreResult<ToothRecord> {
        Ok(self.insert_tooth_record(record)?)
    }

    fn update_record(
        &self,
        id: &str,
        expected_version: i64,
        patch: &ToothRecordPatch,
    ) -> StoreResult<Option<ToothRecord>> {
        Ok(self.update_tooth_record(id, expected_version, patch)?)
    }
}
