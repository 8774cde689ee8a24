//! Paint colors.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{ModelError, ModelResult};

/// Color meaning "no condition".
pub const WHITE: &str = "#FFFFFF";

/// Preset palette offered next to the custom color input.
pub const PRESET_COLORS: [&str; 9] = [
    "#F2FCE2", // Soft Green
    "#FEF7CD", // Soft Yellow
    "#FEC6A1", // Soft Orange
    "#E5DEFF", // Soft Purple
    "#FFDEE2", // Soft Pink
    "#FDE1D3", // Soft Peach
    "#D3E4FD", // Soft Blue
    "#F1F0FB", // Soft Gray
    WHITE,
];

/// Initial value of the custom color input.
pub const DEFAULT_CUSTOM_COLOR: &str = "#000000";

/// Condition presets offered when editing a tooth. Free text is also accepted.
pub const CONDITION_PRESETS: [&str; 5] = ["Caries", "Obturado", "Ausente", "Corona", "Puente"];

/// A surface color: hex (`#F2FCE2`) or a named color. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color(String);

impl Color {
    pub fn new(value: impl Into<String>) -> ModelResult<Self> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ModelError::EmptyColor);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn white() -> Self {
        Self(WHITE.to_string())
    }

    /// Starting value of the custom color input.
    pub fn default_custom() -> Self {
        Self(DEFAULT_CUSTOM_COLOR.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_white(&self) -> bool {
        self.0.eq_ignore_ascii_case(WHITE) || self.0.eq_ignore_ascii_case("white")
    }

    /// The preset palette as colors.
    pub fn presets() -> Vec<Color> {
        PRESET_COLORS
            .iter()
            .map(|hex| Color(hex.to_string()))
            .collect()
    }
}

impl TryFrom<String> for Color {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.0
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
