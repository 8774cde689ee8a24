//! SQLite schema definition.

/// Complete database schema for the odontogram record store.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Dental Records (one row per patient and tooth)
-- ============================================================================

CREATE TABLE IF NOT EXISTS dental_records (
    id TEXT PRIMARY KEY,
    patient_id TEXT NOT NULL,
    tooth_number INTEGER NOT NULL CHECK (tooth_number BETWEEN 1 AND 32),
    condition TEXT NOT NULL DEFAULT '',
    sections TEXT,                               -- JSON object {surface: color}
    notes TEXT,
    treatment_date TEXT,
    version INTEGER NOT NULL DEFAULT 1,          -- optimistic concurrency token
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    UNIQUE (patient_id, tooth_number)
);

CREATE INDEX IF NOT EXISTS idx_dental_records_patient ON dental_records(patient_id);
"#;
