//! Odontogram Core Library
//!
//! Tooth-by-tooth dental charting for a clinic: five colored surfaces and a
//! condition per tooth, kept in sync with a record store keyed by
//! (patient, tooth).
//!
//! # Architecture
//!
//! ```text
//!   Host UI (dialog: patient_id, open, on_open_change)
//!            │
//!            ▼
//!   ┌──────────────────────┐     ┌──────────────────┐
//!   │  OdontogramDialog    │────▶│  SurfacePalette  │
//!   │  render / click      │     └──────────────────┘
//!   └──────────┬───────────┘     ┌──────────────────┐
//!              │           ────▶ │  Tooth renderer  │
//!              ▼                 └──────────────────┘
//!   ┌──────────────────────┐
//!   │   OdontogramStore    │  tooth → {sections, condition}
//!   │  load tickets,       │  per-surface write status
//!   │  optimistic paints   │
//!   └──────────┬───────────┘
//!              ▼
//!   ┌──────────────────────┐
//!   │  RecordSyncGateway   │  re-read, then insert or
//!   │                      │  version-checked update
//!   └──────────┬───────────┘
//!              ▼
//!        dyn RecordStore  (SQLite `Database`, or a remote service)
//! ```
//!
//! # Core Principle
//!
//! **At most one record per (patient, tooth).** Writes never create a second
//! record, and a write based on an out-of-date version is refused with a
//! conflict instead of silently overwriting another session's change.
//!
//! # Modules
//!
//! - [`models`]: Domain types (ToothNumber, Surface, Sections, Color, ToothRecord)
//! - [`db`]: SQLite record store
//! - [`sync`]: RecordStore trait and the sync gateway
//! - [`odontogram`]: Palette, renderer, state store and dialog
//! - [`config`]: Runtime configuration

pub mod config;
pub mod db;
pub mod models;
pub mod odontogram;
pub mod sync;

// Re-export commonly used types
pub use config::OdontogramConfig;
pub use db::Database;
pub use models::{Color, Sections, Surface, ToothNumber, ToothRecord};
pub use odontogram::{
    OdontogramDialog, OdontogramError, OdontogramResult, OdontogramStore, SurfacePalette,
};
pub use sync::{RecordStore, RecordSyncGateway};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use odontogram::{NoticeLevel, WriteStatus};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum OdontogramFfiError {
    #[error("Fetch error: {0}")]
    FetchError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Persistence error: {0}")]
    PersistenceError(String),

    #[error("Conflict: {0}")]
    ConflictError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<OdontogramError> for OdontogramFfiError {
    fn from(e: OdontogramError) -> Self {
        match e {
            OdontogramError::Fetch(msg) => OdontogramFfiError::FetchError(msg),
            OdontogramError::Validation(msg) => OdontogramFfiError::ValidationError(msg),
            OdontogramError::Persistence(msg) => OdontogramFfiError::PersistenceError(msg),
            OdontogramError::Conflict(msg) => OdontogramFfiError::ConflictError(msg),
        }
    }
}

impl From<models::ModelError> for OdontogramFfiError {
    fn from(e: models::ModelError) -> Self {
        OdontogramFfiError::ValidationError(e.to_string())
    }
}

impl From<db::DbError> for OdontogramFfiError {
    fn from(e: db::DbError) -> Self {
        OdontogramFfiError::DatabaseError(e.to_string())
    }
}

impl From<config::ConfigError> for OdontogramFfiError {
    fn from(e: config::ConfigError) -> Self {
        OdontogramFfiError::ConfigError(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for OdontogramFfiError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        OdontogramFfiError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a record database at the given path.
#[uniffi::export]
pub fn open_odontogram(path: String) -> Result<Arc<OdontogramCore>, OdontogramFfiError> {
    let config = OdontogramConfig::new(path)?;
    let db = Database::from_config(&config)?;
    Ok(OdontogramCore::build(db, &config))
}

/// Open using `ODONTOGRAM_*` environment variables.
#[uniffi::export]
pub fn open_odontogram_from_env() -> Result<Arc<OdontogramCore>, OdontogramFfiError> {
    let config = OdontogramConfig::from_env()?;
    let db = Database::from_config(&config)?;
    Ok(OdontogramCore::build(db, &config))
}

/// Create an in-memory record database (for testing).
#[uniffi::export]
pub fn open_odontogram_in_memory() -> Result<Arc<OdontogramCore>, OdontogramFfiError> {
    let config = OdontogramConfig::new(":memory:")?;
    let db = Database::open_in_memory()?;
    Ok(OdontogramCore::build(db, &config))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe odontogram editor for FFI.
///
/// Holds one dialog; opening another patient replaces the previous one.
#[derive(uniffi::Object)]
pub struct OdontogramCore {
    db: Arc<Mutex<Database>>,
    dialog: Mutex<OdontogramDialog>,
}

impl OdontogramCore {
    fn build(db: Database, config: &OdontogramConfig) -> Arc<Self> {
        let palette = SurfacePalette::with_colors(
            config.default_color().clone(),
            config.custom_color().clone(),
        );
        Arc::new(Self {
            db: Arc::new(Mutex::new(db)),
            dialog: Mutex::new(OdontogramDialog::new("", false, None).with_palette(palette)),
        })
    }

    /// Run an editor operation with the gateway over the database.
    ///
    /// Locks are always taken database first, then dialog.
    fn with_editor<T>(
        &self,
        f: impl FnOnce(&mut OdontogramDialog, &RecordSyncGateway<'_>) -> OdontogramResult<T>,
    ) -> Result<T, OdontogramFfiError> {
        let db = self.db.lock()?;
        let mut dialog = self.dialog.lock()?;
        let gateway = RecordSyncGateway::new(&*db);
        Ok(f(&mut dialog, &gateway)?)
    }
}

#[uniffi::export]
impl OdontogramCore {
    // =========================================================================
    // Dialog
    // =========================================================================

    /// Show the odontogram for a patient, loading their records.
    pub fn open_patient(&self, patient_id: String) -> Result<(), OdontogramFfiError> {
        self.with_editor(|dialog, gateway| {
            dialog.set_patient(gateway, patient_id)?;
            dialog.set_open(gateway, true)
        })
    }

    /// Close the odontogram, discarding editor state.
    pub fn close(&self) -> Result<(), OdontogramFfiError> {
        self.with_editor(|dialog, gateway| dialog.set_open(gateway, false))
    }

    /// Reload the open patient's records (required after a conflict).
    pub fn refresh(&self) -> Result<(), OdontogramFfiError> {
        self.with_editor(|dialog, gateway| dialog.refresh(gateway).map(|_| ()))
    }

    /// Whether a conflict requires a reload before further writes.
    pub fn is_reload_required(&self) -> Result<bool, OdontogramFfiError> {
        let dialog = self.dialog.lock()?;
        Ok(dialog.store().reload_required())
    }

    // =========================================================================
    // Palette
    // =========================================================================

    /// Preset palette colors.
    pub fn palette_colors(&self) -> Result<Vec<String>, OdontogramFfiError> {
        let dialog = self.dialog.lock()?;
        Ok(dialog
            .palette()
            .presets()
            .iter()
            .map(|c| c.to_string())
            .collect())
    }

    /// Color used by the next paint.
    pub fn active_color(&self) -> Result<String, OdontogramFfiError> {
        let dialog = self.dialog.lock()?;
        Ok(dialog.palette().active().to_string())
    }

    pub fn select_color(&self, color: String) -> Result<(), OdontogramFfiError> {
        let mut dialog = self.dialog.lock()?;
        dialog.palette_mut().select_color(&color)?;
        Ok(())
    }

    pub fn set_custom_color(&self, color: String) -> Result<(), OdontogramFfiError> {
        let mut dialog = self.dialog.lock()?;
        dialog.palette_mut().set_custom_color(&color)?;
        Ok(())
    }

    /// Whether the custom swatch (rather than a preset) is active.
    pub fn is_custom_color_active(&self) -> Result<bool, OdontogramFfiError> {
        let dialog = self.dialog.lock()?;
        Ok(!dialog.palette().is_preset_active())
    }

    // =========================================================================
    // Editing
    // =========================================================================

    pub fn select_tooth(&self, tooth_number: u32) -> Result<(), OdontogramFfiError> {
        let tooth = parse_tooth(tooth_number)?;
        let mut dialog = self.dialog.lock()?;
        Ok(dialog.store_mut().select_tooth(tooth)?)
    }

    /// Paint a surface with the active palette color.
    pub fn paint_surface(
        &self,
        tooth_number: u32,
        surface: String,
    ) -> Result<(), OdontogramFfiError> {
        let tooth = parse_tooth(tooth_number)?;
        let surface: Surface = surface.parse()?;
        self.with_editor(|dialog, gateway| dialog.paint_with_palette(gateway, tooth, surface))
    }

    /// Paint a surface with an explicit color.
    pub fn paint_surface_with_color(
        &self,
        tooth_number: u32,
        surface: String,
        color: String,
    ) -> Result<(), OdontogramFfiError> {
        let tooth = parse_tooth(tooth_number)?;
        let surface: Surface = surface.parse()?;
        let color = Color::new(color)?;
        self.with_editor(|dialog, gateway| {
            dialog
                .store_mut()
                .paint_surface(gateway, tooth, surface, color)
        })
    }

    /// Stage condition text for the selected tooth.
    pub fn set_condition(&self, condition: String) -> Result<(), OdontogramFfiError> {
        let mut dialog = self.dialog.lock()?;
        dialog.store_mut().set_condition(&condition);
        Ok(())
    }

    /// Save the staged condition for the selected tooth.
    pub fn save_condition(&self) -> Result<(), OdontogramFfiError> {
        self.with_editor(|dialog, gateway| dialog.store_mut().save_condition(gateway))
    }

    /// Re-send surface writes that failed.
    pub fn retry_failed_writes(&self) -> Result<FfiRetrySummary, OdontogramFfiError> {
        self.with_editor(|dialog, gateway| dialog.store_mut().retry_failed_writes(gateway))
            .map(|summary| FfiRetrySummary {
                confirmed: summary.confirmed as u32,
                failed: summary.failed as u32,
            })
    }

    /// Set clinician notes and treatment date on the open patient's tooth.
    ///
    /// The tooth must already have a record.
    pub fn annotate_tooth(
        &self,
        tooth_number: u32,
        notes: Option<String>,
        treatment_date: Option<String>,
    ) -> Result<(), OdontogramFfiError> {
        let tooth = parse_tooth(tooth_number)?;
        let db = self.db.lock()?;
        let dialog = self.dialog.lock()?;
        let patient_id = dialog.patient_id();

        let record = db.find_tooth_record(patient_id, tooth)?.ok_or_else(|| {
            db::DbError::NotFound(format!("patient {} tooth {}", patient_id, tooth))
        })?;
        db.annotate_tooth_record(&record.id, notes.as_deref(), treatment_date.as_deref())?;
        tracing::info!(patient_id, tooth = %tooth, "dental record annotated");
        Ok(())
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Current data for one tooth, if a patient is loaded.
    pub fn get_tooth(&self, tooth_number: u32) -> Result<Option<FfiTooth>, OdontogramFfiError> {
        let tooth = parse_tooth(tooth_number)?;
        let dialog = self.dialog.lock()?;
        Ok(ffi_tooth(dialog.store(), tooth))
    }

    /// All 32 teeth in chart order; empty when nothing is shown.
    pub fn get_chart(&self) -> Result<Vec<FfiTooth>, OdontogramFfiError> {
        let dialog = self.dialog.lock()?;
        if !dialog.is_visible() {
            return Ok(Vec::new());
        }
        Ok(ToothNumber::all()
            .filter_map(|tooth| ffi_tooth(dialog.store(), tooth))
            .collect())
    }

    /// Condition presets for the condition picker.
    pub fn condition_presets(&self) -> Vec<String> {
        models::CONDITION_PRESETS
            .iter()
            .map(|c| c.to_string())
            .collect()
    }

    /// Drain notifications to show to the user.
    pub fn take_notices(&self) -> Result<Vec<FfiNotice>, OdontogramFfiError> {
        let mut dialog = self.dialog.lock()?;
        Ok(dialog
            .store_mut()
            .take_notices()
            .into_iter()
            .map(|notice| FfiNotice {
                level: match notice.level {
                    NoticeLevel::Success => "success".to_string(),
                    NoticeLevel::Error => "error".to_string(),
                },
                message: notice.message,
            })
            .collect())
    }
}

fn parse_tooth(tooth_number: u32) -> Result<ToothNumber, OdontogramFfiError> {
    Ok(ToothNumber::from_i64(tooth_number as i64)?)
}

fn ffi_tooth(store: &OdontogramStore, tooth: ToothNumber) -> Option<FfiTooth> {
    let data = store.tooth(tooth)?;
    let unsaved_surfaces = Surface::ALL
        .into_iter()
        .filter(|surface| {
            matches!(
                store.surface_write(tooth, *surface).map(|w| &w.status),
                Some(WriteStatus::Failed(_))
            )
        })
        .map(|surface| surface.to_string())
        .collect();

    Some(FfiTooth {
        tooth_number: tooth.get() as u32,
        condition: data.condition.clone(),
        sections: data
            .sections
            .iter()
            .map(|(surface, color)| (surface.to_string(), color.to_string()))
            .collect(),
        unsaved_surfaces,
        selected: store.selected_tooth() == Some(tooth),
    })
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe tooth.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiTooth {
    pub tooth_number: u32,
    pub condition: String,
    /// Painted surfaces only; missing surfaces are white
    pub sections: HashMap<String, String>,
    /// Surfaces whose last write failed
    pub unsaved_surfaces: Vec<String>,
    pub selected: bool,
}

/// FFI-safe notification.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiNotice {
    pub level: String,
    pub message: String,
}

/// FFI-safe retry result.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiRetrySummary {
    pub confirmed: u32,
    pub failed: u32,
}
