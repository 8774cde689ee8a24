//! Dental record database operations.

use rusqlite::{params, ErrorCode, OptionalExtension};

use super::{Database, DbError, DbResult};
use crate::models::{NewToothRecord, Sections, ToothNumber, ToothRecord, ToothRecordPatch};

const RECORD_COLUMNS: &str = r#"
    id, patient_id, tooth_number, condition, sections,
    notes, treatment_date, version, created_at, updated_at
"#;

impl Database {
    /// Insert a new dental record.
    ///
    /// Fails with [`DbError::Constraint`] if the patient already has a record for the tooth.
    pub fn insert_tooth_record(&self, new_record: &NewToothRecord) -> DbResult<ToothRecord> {
        let record = new_record.clone().into_record();
        let sections_json = record.sections.to_json()?;

        let result = self.conn.execute(
            r#"
            INSERT INTO dental_records (
                id, patient_id, tooth_number, condition, sections,
                notes, treatment_date, version, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                record.id,
                record.patient_id,
                record.tooth_number.get(),
                record.condition,
                sections_json,
                record.notes,
                record.treatment_date,
                record.version,
                record.created_at,
                record.updated_at,
            ],
        );

        match result {
            Ok(_) => Ok(record),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                Err(DbError::Constraint(format!(
                    "patient {} already has a record for tooth {}",
                    record.patient_id, record.tooth_number
                )))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Update a record only if it is still at `expected_version`.
    ///
    /// Returns `None` when the record is missing or has moved on to another version.
    pub fn update_tooth_record(
        &self,
        id: &str,
        expected_version: i64,
        patch: &ToothRecordPatch,
    ) -> DbResult<Option<ToothRecord>> {
        let sections_json = patch
            .sections
            .as_ref()
            .map(Sections::to_json)
            .transpose()?;

        let rows_affected = self.conn.execute(
            r#"
            UPDATE dental_records SET
                condition = COALESCE(?3, condition),
                sections = COALESCE(?4, sections),
                version = version + 1,
                updated_at = ?5
            WHERE id = ?1 AND version = ?2
            "#,
            params![
                id,
                expected_version,
                patch.condition,
                sections_json,
                chrono::Utc::now().to_rfc3339(),
            ],
        )?;

        if rows_affected == 0 {
            return Ok(None);
        }
        self.get_tooth_record(id)?
            .map(Some)
            .ok_or_else(|| DbError::NotFound(id.to_string()))
    }

    /// Get a record by ID.
    pub fn get_tooth_record(&self, id: &str) -> DbResult<Option<ToothRecord>> {
        let sql = format!("SELECT {} FROM dental_records WHERE id = ?", RECORD_COLUMNS);
        let row = self
            .conn
            .query_row(&sql, [id], ToothRecordRow::from_row)
            .optional()?;
        row.map(ToothRecordRow::into_record).transpose()
    }

    /// Get the record for one patient's tooth.
    pub fn find_tooth_record(
        &self,
        patient_id: &str,
        tooth_number: ToothNumber,
    ) -> DbResult<Option<ToothRecord>> {
        let sql = format!(
            "SELECT {} FROM dental_records WHERE patient_id = ? AND tooth_number = ?",
            RECORD_COLUMNS
        );
        let row = self
            .conn
            .query_row(
                &sql,
                params![patient_id, tooth_number.get()],
                ToothRecordRow::from_row,
            )
            .optional()?;
        row.map(ToothRecordRow::into_record).transpose()
    }

    /// List all records for a patient, ordered by tooth.
    pub fn list_tooth_records(&self, patient_id: &str) -> DbResult<Vec<ToothRecord>> {
        let sql = format!(
            "SELECT {} FROM dental_records WHERE patient_id = ? ORDER BY tooth_number",
            RECORD_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([patient_id], ToothRecordRow::from_row)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?.into_record()?);
        }
        Ok(records)
    }

    /// Set clinician notes and treatment date on a record. Does not bump the version.
    pub fn annotate_tooth_record(
        &self,
        id: &str,
        notes: Option<&str>,
        treatment_date: Option<&str>,
    ) -> DbResult<ToothRecord> {
        let rows_affected = self.conn.execute(
            "UPDATE dental_records SET notes = ?2, treatment_date = ?3 WHERE id = ?1",
            params![id, notes, treatment_date],
        )?;
        if rows_affected == 0 {
            return Err(DbError::NotFound(id.to_string()));
        }
        self.get_tooth_record(id)?
            .ok_or_else(|| DbError::NotFound(id.to_string()))
    }
}

/// Internal row type for dental records.
struct ToothRecordRow {
    id: String,
    patient_id: String,
    tooth_number: i64,
    condition: String,
    sections: Option<String>,
    notes: Option<String>,
    treatment_date: Option<String>,
    version: i64,
    created_at: String,
    updated_at: String,
}

impl ToothRecordRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            patient_id: row.get(1)?,
            tooth_number: row.get(2)?,
            condition: row.get(3)?,
            sections: row.get(4)?,
            notes: row.get(5)?,
            treatment_date: row.get(6)?,
            version: row.get(7)?,
            created_at: row.get(8)?,
            updated_at: row.get(9)?,
        })
    }

    fn into_record(self) -> DbResult<ToothRecord> {
        let tooth_number = ToothNumber::from_i64(self.tooth_number)
            .map_err(|e| DbError::InvalidRow(format!("{}: {}", self.id, e)))?;
        let sections = match self.sections.as_deref() {
            Some(json) => Sections::from_json(json)?,
            None => Sections::new(),
        };

        Ok(ToothRecord {
            id: self.id,
            patient_id: self.patient_id,
            tooth_number,
            condition: self.condition,
            sections,
            notes: self.notes,
            treatment_date: self.treatment_date,
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
