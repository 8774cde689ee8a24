//! The odontogram editor: palette, tooth rendering, per-patient state and the
//! host-facing dialog.

mod dialog;
mod notice;
mod palette;
mod renderer;
mod state;
mod store;

pub use dialog::*;
pub use notice::*;
pub use palette::*;
pub use renderer::*;
pub use state::*;
pub use store::*;

use thiserror::Error;

use crate::models::ModelError;

/// Errors surfaced by odontogram operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OdontogramError {
    #[error("failed to load dental records: {0}")]
    Fetch(String),

    #[error("{0}")]
    Validation(String),

    #[error("failed to save dental record: {0}")]
    Persistence(String),

    #[error("dental record was changed elsewhere, reload required ({0})")]
    Conflict(String),
}

impl From<ModelError> for OdontogramError {
    fn from(e: ModelError) -> Self {
        OdontogramError::Validation(e.to_string())
    }
}

pub type OdontogramResult<T> = Result<T, OdontogramError>;
