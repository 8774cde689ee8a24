//! Create-or-update translation for odontogram writes.

use crate::models::{NewToothRecord, Sections, ToothNumber, ToothRecord, ToothRecordPatch};
use crate::odontogram::{OdontogramError, OdontogramResult};

use super::{RecordStore, StoreError};

/// Writes odontogram changes to a [`RecordStore`], keyed by (patient, tooth).
///
/// Before every write the gateway re-reads the current record for the key. The
/// caller passes the version it last saw (`None` if it has never seen a record
/// for the tooth); any disagreement with the store is a conflict and the
/// caller must reload before retrying. Nothing is retried here.
pub struct RecordSyncGateway<'a> {
    store: &'a dyn RecordStore,
}

impl<'a> RecordSyncGateway<'a> {
    pub fn new(store: &'a dyn RecordStore) -> Self {
        Self { store }
    }

    /// Fetch every record for a patient.
    pub fn fetch(&self, patient_id: &str) -> OdontogramResult<Vec<ToothRecord>> {
        tracing::debug!(patient_id, "fetching dental records");
        self.store.fetch_for_patient(patient_id).map_err(|e| {
            tracing::error!(patient_id, error = %e, "failed to fetch dental records");
            OdontogramError::Fetch(e.to_string())
        })
    }

    /// Write a tooth's sections, inserting with an empty condition if no record exists.
    pub fn upsert_sections(
        &self,
        patient_id: &str,
        tooth_number: ToothNumber,
        sections: &Sections,
        expected_version: Option<i64>,
    ) -> OdontogramResult<ToothRecord> {
        self.upsert(
            patient_id,
            tooth_number,
            expected_version,
            ToothRecordPatch::sections(sections.clone()),
            || NewToothRecord::with_sections(patient_id, tooth_number, sections.clone()),
        )
    }

    /// Write a tooth's condition, inserting with empty sections if no record exists.
    pub fn upsert_condition(
        &self,
        patient_id: &str,
        tooth_number: ToothNumber,
        condition: &str,
        expected_version: Option<i64>,
    ) -> OdontogramResult<ToothRecord> {
        self.upsert(
            patient_id,
            tooth_number,
            expected_version,
            ToothRecordPatch::condition(condition.to_string()),
            || NewToothRecord::with_condition(patient_id, tooth_number, condition.to_string()),
        )
    }

    fn upsert(
        &self,
        patient_id: &str,
        tooth_number: ToothNumber,
        expected_version: Option<i64>,
        patch: ToothRecordPatch,
        new_record: impl FnOnce() -> NewToothRecord,
    ) -> OdontogramResult<ToothRecord> {
        let existing = self
            .store
            .find_record(patient_id, tooth_number)
            .map_err(persistence)?;

        match (existing, expected_version) {
            (None, None) => {
                tracing::debug!(patient_id, tooth = %tooth_number, "inserting dental record");
                self.store.insert_record(&new_record()).map_err(|e| {
                    if e.is_duplicate() {
                        conflict(patient_id, tooth_number, "created by another session")
                    } else {
                        persistence(e)
                    }
                })
            }
            (Some(current), Some(expected)) if current.version == expected => {
                tracing::debug!(
                    patient_id,
                    tooth = %tooth_number,
                    version = expected,
                    "updating dental record"
                );
                self.store
                    .update_record(&current.id, expected, &patch)
                    .map_err(persistence)?
                    .ok_or_else(|| {
                        conflict(patient_id, tooth_number, "changed during update")
                    })
            }
            (Some(current), Some(expected)) => Err(conflict(
                patient_id,
                tooth_number,
                &format!("expected version {}, found {}", expected, current.version),
            )),
            (Some(_), None) => Err(conflict(
                patient_id,
                tooth_number,
                "created by another session",
            )),
            (None, Some(_)) => Err(conflict(patient_id, tooth_number, "no longer exists")),
        }
    }
}

fn persistence(e: StoreError) -> OdontogramError {
    OdontogramError::Persistence(e.to_string())
}

fn conflict(patient_id: &str, tooth_number: ToothNumber, detail: &str) -> OdontogramError {
    tracing::warn!(patient_id, tooth = %tooth_number, detail, "dental record conflict");
    OdontogramError::Conflict(format!("tooth {}: {}", tooth_number, detail))
}
