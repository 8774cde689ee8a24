//! Persisted per-(patient, tooth) dental records.

use serde::{Deserialize, Serialize};

use super::{Sections, ToothNumber};

/// The durable unit of odontogram data: one row per (patient, tooth).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToothRecord {
    /// Record UUID, generated on insert
    pub id: String,
    /// Owning patient ID
    pub patient_id: String,
    /// Tooth this record describes
    pub tooth_number: ToothNumber,
    /// Clinical condition text (e.g. "Caries")
    pub condition: String,
    /// Surface colors
    pub sections: Sections,
    /// Free-form clinician notes
    pub notes: Option<String>,
    /// Date treatment was performed
    pub treatment_date: Option<String>,
    /// Optimistic concurrency version, 1 on insert, bumped by every update
    pub version: i64,
    /// Creation timestamp
    pub created_at: String,
    /// Last update timestamp
    pub updated_at: String,
}

/// Fields needed to create a record.
#[derive(Debug, Clone, PartialEq)]
pub struct NewToothRecord {
    pub patient_id: String,
    pub tooth_number: ToothNumber,
    pub condition: String,
    pub sections: Sections,
}

impl NewToothRecord {
    /// A record carrying only surface colors.
    pub fn with_sections(patient_id: &str, tooth_number: ToothNumber, sections: Sections) -> Self {
        Self {
            patient_id: patient_id.to_string(),
            tooth_number,
            condition: String::new(),
            sections,
        }
    }

    /// A record carrying only a condition.
    pub fn with_condition(patient_id: &str, tooth_number: ToothNumber, condition: String) -> Self {
        Self {
            patient_id: patient_id.to_string(),
            tooth_number,
            condition,
            sections: Sections::new(),
        }
    }

    /// Materialise the record with a fresh ID and timestamps.
    pub fn into_record(self) -> ToothRecord {
        let now = chrono::Utc::now().to_rfc3339();
        ToothRecord {
            id: uuid::Uuid::new_v4().to_string(),
            patient_id: self.patient_id,
            tooth_number: self.tooth_number,
            condition: self.condition,
            sections: self.sections,
            notes: None,
            treatment_date: None,
            version: 1,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

/// Partial update: only `Some` fields are written.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToothRecordPatch {
    pub condition: Option<String>,
    pub sections: Option<Sections>,
}

impl ToothRecordPatch {
    pub fn sections(sections: Sections) -> Self {
        Self {
            condition: None,
            sections: Some(sections),
        }
    }

    pub fn condition(condition: String) -> Self {
        Self {
            condition: Some(condition),
            sections: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Color, Surface};

    fn tooth(n: u8) -> ToothNumber {
        ToothNumber::new(n).unwrap()
    }

    #[test]
    fn test_new_record() {
        let record = NewToothRecord::with_condition("patient-1", tooth(14), "Caries".into())
            .into_record();
        assert_eq!(record.id.len(), 36); // UUID format
        assert_eq!(record.version, 1);
        assert_eq!(record.condition, "Caries");
        assert!(record.sections.is_empty());
    }

    #[test]
    fn test_patch_constructors_touch_one_field() {
        let mut sections = Sections::new();
        sections.set(Surface::Distal, Color::new("#F2FCE2").unwrap());

        let patch = ToothRecordPatch::sections(sections.clone());
        assert_eq!(patch.sections, Some(sections));
        assert_eq!(patch.condition, None);

        let patch = ToothRecordPatch::condition("Caries".into());
        assert_eq!(patch.condition.as_deref(), Some("Caries"));
        assert_eq!(patch.sections, None);
    }
}
