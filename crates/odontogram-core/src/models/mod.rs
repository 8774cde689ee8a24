//! Domain models for the odontogram.

mod color;
mod record;
mod tooth;

pub use color::*;
pub use record::*;
pub use tooth::*;

use thiserror::Error;

/// Errors raised when constructing domain values from raw input.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("tooth number {0} is outside 1..=32")]
    ToothOutOfRange(i64),

    #[error("unknown surface: {0}")]
    UnknownSurface(String),

    #[error("color must not be empty")]
    EmptyColor,
}

pub type ModelResult<T> = Result<T, ModelError>;
