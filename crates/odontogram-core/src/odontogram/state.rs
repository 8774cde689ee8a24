//! Per-patient odontogram state rebuilt from dental records.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::{Sections, ToothNumber, ToothRecord};

/// What the chart shows for one tooth.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToothData {
    pub sections: Sections,
    pub condition: String,
}

/// Tooth-by-tooth data for one patient.
///
/// Always holds all 32 teeth; teeth without a record are empty.
#[derive(Debug, Clone, PartialEq)]
pub struct OdontogramState {
    patient_id: String,
    teeth: BTreeMap<ToothNumber, ToothData>,
    /// Record version last seen per tooth.
    versions: BTreeMap<ToothNumber, i64>,
}

impl OdontogramState {
    /// State for a patient with no records.
    pub fn empty(patient_id: &str) -> Self {
        Self {
            patient_id: patient_id.to_string(),
            teeth: ToothNumber::all()
                .map(|tooth| (tooth, ToothData::default()))
                .collect(),
            versions: BTreeMap::new(),
        }
    }

    /// Rebuild the whole map from a patient's records.
    pub fn from_records(patient_id: &str, records: Vec<ToothRecord>) -> Self {
        let mut state = Self::empty(patient_id);
        for record in records {
            if record.patient_id != patient_id {
                tracing::warn!(
                    expected = patient_id,
                    found = %record.patient_id,
                    "skipping dental record for another patient"
                );
                continue;
            }
            state.apply_record(&record);
        }
        state
    }

    pub fn patient_id(&self) -> &str {
        &self.patient_id
    }

    pub fn tooth(&self, tooth: ToothNumber) -> &ToothData {
        // Every tooth is populated at construction
        &self.teeth[&tooth]
    }

    pub(crate) fn tooth_mut(&mut self, tooth: ToothNumber) -> &mut ToothData {
        self.teeth.entry(tooth).or_default()
    }

    pub fn teeth(&self) -> impl Iterator<Item = (ToothNumber, &ToothData)> {
        self.teeth.iter().map(|(tooth, data)| (*tooth, data))
    }

    pub fn known_version(&self, tooth: ToothNumber) -> Option<i64> {
        self.versions.get(&tooth).copied()
    }

    /// Take a record as the new truth for its tooth.
    pub fn apply_record(&mut self, record: &ToothRecord) {
        self.teeth.insert(
            record.tooth_number,
            ToothData {
                sections: record.sections.clone(),
                condition: record.condition.clone(),
            },
        );
        self.remember(record);
    }

    /// Note a record's version without touching displayed data.
    pub fn remember(&mut self, record: &ToothRecord) {
        self.versions.insert(record.tooth_number, record.version);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Color, NewToothRecord, Surface};

    fn tooth(n: u8) -> ToothNumber {
        ToothNumber::new(n).unwrap()
    }

    #[test]
    fn test_empty_state_has_every_tooth() {
        let state = OdontogramState::empty("p1");
        assert_eq!(state.teeth().count(), 32);
        assert!(state
            .teeth()
            .all(|(_, data)| data.sections.is_empty() && data.condition.is_empty()));
        assert_eq!(state.known_version(tooth(1)), None);
    }

    #[test]
    fn test_from_records() {
        let mut sections = Sections::new();
        sections.set(Surface::Oclusal, Color::new("#FFDEE2").unwrap());
        let records = vec![
            NewToothRecord::with_sections("p1", tooth(6), sections.clone()).into_record(),
            NewToothRecord::with_condition("p1", tooth(19), "Corona".into()).into_record(),
            NewToothRecord::with_condition("p2", tooth(7), "Ausente".into()).into_record(),
        ];

        let state = OdontogramState::from_records("p1", records);

        assert_eq!(state.tooth(tooth(6)).sections, sections);
        assert_eq!(state.tooth(tooth(19)).condition, "Corona");
        assert_eq!(state.tooth(tooth(7)), &ToothData::default());
        assert_eq!(state.known_version(tooth(6)), Some(1));
        assert_eq!(state.known_version(tooth(7)), None);
    }
}
