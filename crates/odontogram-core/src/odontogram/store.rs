//! The odontogram state store for the patient currently open.
//!
//! Surface paints are applied locally first and written through immediately;
//! the write status of each painted surface is tracked so a failed write stays
//! visible and can be retried. Conditions are staged and only written by
//! [`OdontogramStore::save_condition`].
//!
//! Loads are split into [`OdontogramStore::begin_load`] and
//! [`OdontogramStore::complete_load`] so that a host fetching off the UI thread
//! can hand results back later. Only the most recently issued ticket is applied.

use std::collections::{BTreeMap, BTreeSet};

use crate::models::{Color, Surface, ToothNumber, ToothRecord};
use crate::sync::RecordSyncGateway;

use super::{Notice, OdontogramError, OdontogramResult, OdontogramState, ToothData};

const SELECT_TOOTH_AND_CONDITION: &str = "select tooth and condition";
const NOT_LOADED: &str = "odontogram is not loaded";

/// Handle for one issued load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    seq: u64,
    patient_id: String,
}

impl LoadTicket {
    pub fn patient_id(&self) -> &str {
        &self.patient_id
    }
}

/// Result of handing a fetch back to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// State was rebuilt from this many records
    Applied { records: usize },
    /// A newer load was issued; the result was dropped
    Stale,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LoadPhase {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed(String),
}

impl LoadPhase {
    /// Nothing usable is loaded: never loaded, or the last load failed.
    pub fn needs_load(&self) -> bool {
        matches!(self, LoadPhase::Idle | LoadPhase::Failed(_))
    }
}

/// Persistence status of a painted surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteStatus {
    Pending,
    Confirmed,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceWrite {
    pub color: Color,
    pub status: WriteStatus,
}

/// Counts of surfaces re-sent by [`OdontogramStore::retry_failed_writes`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetrySummary {
    pub confirmed: usize,
    pub failed: usize,
}

#[derive(Debug, Default)]
pub struct OdontogramStore {
    phase: LoadPhase,
    state: Option<OdontogramState>,
    issued: u64,
    awaited: Option<u64>,
    selected: Option<ToothNumber>,
    condition_draft: String,
    writes: BTreeMap<(ToothNumber, Surface), SurfaceWrite>,
    notices: Vec<Notice>,
    reload_required: bool,
}

impl OdontogramStore {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Fetch and apply all records for a patient.
    pub fn load(
        &mut self,
        gateway: &RecordSyncGateway<'_>,
        patient_id: &str,
    ) -> OdontogramResult<LoadOutcome> {
        let ticket = self.begin_load(patient_id);
        let fetched = gateway.fetch(patient_id);
        self.complete_load(ticket, fetched)
    }

    /// Start a load, superseding any load still in flight.
    ///
    /// The previous patient's state is dropped immediately.
    pub fn begin_load(&mut self, patient_id: &str) -> LoadTicket {
        self.issued += 1;
        self.awaited = Some(self.issued);
        self.phase = LoadPhase::Loading;
        self.state = None;
        self.selected = None;
        self.condition_draft.clear();
        self.writes.clear();
        self.reload_required = false;

        tracing::debug!(patient_id, seq = self.issued, "odontogram load issued");
        LoadTicket {
            seq: self.issued,
            patient_id: patient_id.to_string(),
        }
    }

    /// Apply a fetch result if its ticket is the one being awaited.
    pub fn complete_load(
        &mut self,
        ticket: LoadTicket,
        fetched: OdontogramResult<Vec<ToothRecord>>,
    ) -> OdontogramResult<LoadOutcome> {
        if self.awaited != Some(ticket.seq) {
            tracing::debug!(
                patient_id = %ticket.patient_id,
                seq = ticket.seq,
                "discarding superseded odontogram load"
            );
            return Ok(LoadOutcome::Stale);
        }
        self.awaited = None;

        match fetched {
            Ok(records) => {
                let count = records.len();
                self.state = Some(OdontogramState::from_records(&ticket.patient_id, records));
                self.phase = LoadPhase::Ready;
                tracing::info!(patient_id = %ticket.patient_id, records = count, "odontogram loaded");
                Ok(LoadOutcome::Applied { records: count })
            }
            Err(e) => {
                self.phase = LoadPhase::Failed(e.to_string());
                self.report(&e);
                Err(e)
            }
        }
    }

    /// Drop all state for the open patient.
    pub fn close(&mut self) {
        let issued = self.issued;
        *self = Self {
            issued,
            ..Self::default()
        };
    }

    // =========================================================================
    // Editing
    // =========================================================================

    /// Make a tooth active and stage its current condition for editing.
    pub fn select_tooth(&mut self, tooth: ToothNumber) -> OdontogramResult<()> {
        let state = self.loaded_state()?;
        self.condition_draft = state.tooth(tooth).condition.clone();
        self.selected = Some(tooth);
        Ok(())
    }

    /// Paint one surface and write the tooth's sections through.
    ///
    /// The new color stays on screen even if the write fails; the surface is
    /// then marked [`WriteStatus::Failed`].
    pub fn paint_surface(
        &mut self,
        gateway: &RecordSyncGateway<'_>,
        tooth: ToothNumber,
        surface: Surface,
        color: Color,
    ) -> OdontogramResult<()> {
        if self.selected != Some(tooth) {
            self.select_tooth(tooth)?;
        }

        self.loaded_state_mut()?
            .tooth_mut(tooth)
            .sections
            .set(surface, color.clone());
        self.writes.insert(
            (tooth, surface),
            SurfaceWrite {
                color,
                status: WriteStatus::Pending,
            },
        );

        self.push_sections(gateway, tooth)
    }

    /// Stage condition text for the selected tooth. Nothing is written.
    pub fn set_condition(&mut self, condition: &str) {
        self.condition_draft = condition.to_string();
    }

    /// Write the staged condition for the selected tooth, keeping its sections.
    pub fn save_condition(&mut self, gateway: &RecordSyncGateway<'_>) -> OdontogramResult<()> {
        let condition = self.condition_draft.trim().to_string();
        let selected = self.selected;
        let tooth = match selected {
            Some(tooth) if !condition.is_empty() => tooth,
            _ => {
                let e = OdontogramError::Validation(SELECT_TOOTH_AND_CONDITION.into());
                self.report(&e);
                return Err(e);
            }
        };

        let state = self.loaded_state()?;
        let patient_id = state.patient_id().to_string();
        let expected = state.known_version(tooth);

        match gateway.upsert_condition(&patient_id, tooth, &condition, expected) {
            Ok(record) => {
                let state = self.loaded_state_mut()?;
                state.tooth_mut(tooth).condition = record.condition.clone();
                state.remember(&record);
                tracing::info!(patient_id = %patient_id, tooth = %tooth, "dental condition saved");
                self.notices
                    .push(Notice::success("Dental record saved successfully"));
                self.selected = None;
                self.condition_draft.clear();
                Ok(())
            }
            Err(e) => {
                self.report(&e);
                Err(e)
            }
        }
    }

    /// Re-send every tooth that has a failed surface write.
    pub fn retry_failed_writes(
        &mut self,
        gateway: &RecordSyncGateway<'_>,
    ) -> OdontogramResult<RetrySummary> {
        if self.reload_required {
            return Err(OdontogramError::Validation(
                "reload the odontogram before retrying".into(),
            ));
        }

        let teeth: BTreeSet<ToothNumber> = self
            .failed_writes()
            .into_iter()
            .map(|(tooth, _)| tooth)
            .collect();
        let mut summary = RetrySummary::default();

        for tooth in teeth {
            let surfaces = self.mark_pending(tooth);
            match self.push_sections(gateway, tooth) {
                Ok(()) => summary.confirmed += surfaces,
                Err(_) => summary.failed += surfaces,
            }
        }

        Ok(summary)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn phase(&self) -> &LoadPhase {
        &self.phase
    }

    pub fn state(&self) -> Option<&OdontogramState> {
        self.state.as_ref()
    }

    pub fn patient_id(&self) -> Option<&str> {
        self.state.as_ref().map(OdontogramState::patient_id)
    }

    pub fn tooth(&self, tooth: ToothNumber) -> Option<&ToothData> {
        self.state.as_ref().map(|state| state.tooth(tooth))
    }

    pub fn selected_tooth(&self) -> Option<ToothNumber> {
        self.selected
    }

    pub fn condition_draft(&self) -> &str {
        &self.condition_draft
    }

    pub fn surface_write(&self, tooth: ToothNumber, surface: Surface) -> Option<&SurfaceWrite> {
        self.writes.get(&(tooth, surface))
    }

    /// Surfaces whose last write failed, in chart order.
    pub fn failed_writes(&self) -> Vec<(ToothNumber, Surface)> {
        self.writes
            .iter()
            .filter(|(_, write)| matches!(write.status, WriteStatus::Failed(_)))
            .map(|(key, _)| *key)
            .collect()
    }

    /// Set after a conflict; cleared by the next load.
    pub fn reload_required(&self) -> bool {
        self.reload_required
    }

    /// Drain pending notices.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn loaded_state(&self) -> OdontogramResult<&OdontogramState> {
        self.state
            .as_ref()
            .ok_or_else(|| OdontogramError::Validation(NOT_LOADED.into()))
    }

    fn loaded_state_mut(&mut self) -> OdontogramResult<&mut OdontogramState> {
        self.state
            .as_mut()
            .ok_or_else(|| OdontogramError::Validation(NOT_LOADED.into()))
    }

    fn push_sections(
        &mut self,
        gateway: &RecordSyncGateway<'_>,
        tooth: ToothNumber,
    ) -> OdontogramResult<()> {
        let state = self.loaded_state()?;
        let patient_id = state.patient_id().to_string();
        let sections = state.tooth(tooth).sections.clone();
        let expected = state.known_version(tooth);

        match gateway.upsert_sections(&patient_id, tooth, &sections, expected) {
            Ok(record) => {
                self.loaded_state_mut()?.remember(&record);
                self.settle(tooth, WriteStatus::Confirmed);
                Ok(())
            }
            Err(e) => {
                self.settle(tooth, WriteStatus::Failed(e.to_string()));
                self.report(&e);
                Err(e)
            }
        }
    }

    /// Give every unconfirmed surface write on a tooth the same outcome.
    fn settle(&mut self, tooth: ToothNumber, status: WriteStatus) {
        for ((t, _), write) in self.writes.iter_mut() {
            if *t == tooth && write.status != WriteStatus::Confirmed {
                write.status = status.clone();
            }
        }
    }

    fn mark_pending(&mut self, tooth: ToothNumber) -> usize {
        let mut count = 0;
        for ((t, _), write) in self.writes.iter_mut() {
            if *t == tooth && matches!(write.status, WriteStatus::Failed(_)) {
                write.status = WriteStatus::Pending;
                count += 1;
            }
        }
        count
    }

    fn report(&mut self, e: &OdontogramError) {
        match e {
            OdontogramError::Validation(_) => tracing::debug!(error = %e, "odontogram input rejected"),
            OdontogramError::Conflict(_) => {
                self.reload_required = true;
                tracing::warn!(error = %e, "odontogram write conflict");
            }
            OdontogramError::Fetch(_) | OdontogramError::Persistence(_) => {
                tracing::error!(error = %e, "odontogram remote call failed");
            }
        }
        self.notices.push(Notice::error(e.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::Sections;

    fn tooth(n: u8) -> ToothNumber {
        ToothNumber::new(n).unwrap()
    }

    fn color(c: &str) -> Color {
        Color::new(c).unwrap()
    }

    #[test]
    fn test_edits_require_load() {
        let db = Database::open_in_memory().unwrap();
        let gateway = RecordSyncGateway::new(&db);
        let mut store = OdontogramStore::new();

        assert!(matches!(
            store.select_tooth(tooth(1)),
            Err(OdontogramError::Validation(_))
        ));
        assert!(store
            .paint_surface(&gateway, tooth(1), Surface::Mesial, color("#FEF7CD"))
            .is_err());
        assert!(db.list_tooth_records("p1").unwrap().is_empty());
    }

    #[test]
    fn test_select_tooth_stages_condition() {
        let db = Database::open_in_memory().unwrap();
        let gateway = RecordSyncGateway::new(&db);
        gateway.upsert_condition("p1", tooth(4), "Obturado", None).unwrap();

        let mut store = OdontogramStore::new();
        store.load(&gateway, "p1").unwrap();

        store.select_tooth(tooth(4)).unwrap();
        assert_eq!(store.condition_draft(), "Obturado");

        store.select_tooth(tooth(5)).unwrap();
        assert_eq!(store.condition_draft(), "");
        assert_eq!(store.selected_tooth(), Some(tooth(5)));
    }

    #[test]
    fn test_paint_merges_and_confirms() {
        let db = Database::open_in_memory().unwrap();
        let gateway = RecordSyncGateway::new(&db);
        let mut store = OdontogramStore::new();
        store.load(&gateway, "p1").unwrap();

        store
            .paint_surface(&gateway, tooth(14), Surface::Distal, color("#F2FCE2"))
            .unwrap();
        store
            .paint_surface(&gateway, tooth(14), Surface::Mesial, color("#FEC6A1"))
            .unwrap();

        let expected: Sections = [
            (Surface::Distal, color("#F2FCE2")),
            (Surface::Mesial, color("#FEC6A1")),
        ]
        .into_iter()
        .collect();
        assert_eq!(store.tooth(tooth(14)).unwrap().sections, expected);
        assert_eq!(
            store.surface_write(tooth(14), Surface::Distal).unwrap().status,
            WriteStatus::Confirmed
        );

        let stored = db.find_tooth_record("p1", tooth(14)).unwrap().unwrap();
        assert_eq!(stored.sections, expected);
        assert_eq!(stored.version, 2);
    }

    #[test]
    fn test_save_condition_clears_selection() {
        let db = Database::open_in_memory().unwrap();
        let gateway = RecordSyncGateway::new(&db);
        let mut store = OdontogramStore::new();
        store.load(&gateway, "p1").unwrap();

        store.select_tooth(tooth(2)).unwrap();
        store.set_condition("  Corona ");
        store.save_condition(&gateway).unwrap();

        assert_eq!(store.selected_tooth(), None);
        assert_eq!(store.condition_draft(), "");
        assert_eq!(store.tooth(tooth(2)).unwrap().condition, "Corona");

        let notices = store.take_notices();
        assert_eq!(notices, vec![Notice::success("Dental record saved successfully")]);
        assert!(store.take_notices().is_empty());
    }

    #[test]
    fn test_save_condition_requires_text() {
        let db = Database::open_in_memory().unwrap();
        let gateway = RecordSyncGateway::new(&db);
        let mut store = OdontogramStore::new();
        store.load(&gateway, "p1").unwrap();

        store.select_tooth(tooth(2)).unwrap();
        store.set_condition("   ");
        let err = store.save_condition(&gateway).unwrap_err();

        assert_eq!(err, OdontogramError::Validation("select tooth and condition".into()));
        assert!(db.list_tooth_records("p1").unwrap().is_empty());
    }

    #[test]
    fn test_stale_ticket_is_discarded() {
        let mut store = OdontogramStore::new();

        let first = store.begin_load("p1");
        let second = store.begin_load("p2");

        let late = vec![crate::models::NewToothRecord::with_condition(
            "p1",
            tooth(1),
            "Caries".into(),
        )
        .into_record()];
        assert_eq!(store.complete_load(first, Ok(late)).unwrap(), LoadOutcome::Stale);
        assert_eq!(store.phase(), &LoadPhase::Loading);
        assert!(store.state().is_none());

        assert_eq!(
            store.complete_load(second, Ok(Vec::new())).unwrap(),
            LoadOutcome::Applied { records: 0 }
        );
        assert_eq!(store.patient_id(), Some("p2"));
    }

    #[test]
    fn test_failed_load_reports() {
        let mut store = OdontogramStore::new();
        let ticket = store.begin_load("p1");

        let err = store
            .complete_load(ticket, Err(OdontogramError::Fetch("offline".into())))
            .unwrap_err();

        assert!(matches!(err, OdontogramError::Fetch(_)));
        assert!(matches!(store.phase(), LoadPhase::Failed(_)));
        assert_eq!(store.take_notices().len(), 1);
    }

    #[test]
    fn test_close_invalidates_in_flight_load() {
        let mut store = OdontogramStore::new();
        let ticket = store.begin_load("p1");
        store.close();

        assert_eq!(store.complete_load(ticket, Ok(Vec::new())).unwrap(), LoadOutcome::Stale);
        assert_eq!(store.phase(), &LoadPhase::Idle);
    }
}
