//! Tooth numbering, surfaces and per-tooth surface colors.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{Color, ModelError, ModelResult};

/// Number of teeth in the adult chart.
pub const TOTAL_TEETH: u8 = 32;

/// Anatomical tooth number, always within `1..=32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct ToothNumber(u8);

impl ToothNumber {
    /// Validate a raw tooth number.
    pub fn new(number: u8) -> ModelResult<Self> {
        if (1..=TOTAL_TEETH).contains(&number) {
            Ok(Self(number))
        } else {
            Err(ModelError::ToothOutOfRange(number as i64))
        }
    }

    /// Validate a tooth number coming from a wider integer (database rows, FFI).
    pub fn from_i64(number: i64) -> ModelResult<Self> {
        u8::try_from(number)
            .map_err(|_| ModelError::ToothOutOfRange(number))
            .and_then(Self::new)
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Every tooth in chart order.
    pub fn all() -> impl Iterator<Item = ToothNumber> {
        (1..=TOTAL_TEETH).map(ToothNumber)
    }
}

impl TryFrom<u8> for ToothNumber {
    type Error = ModelError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ToothNumber> for u8 {
    fn from(tooth: ToothNumber) -> Self {
        tooth.0
    }
}

impl fmt::Display for ToothNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One of the five clinical surfaces of a tooth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Surface {
    Oclusal,
    Mesial,
    Distal,
    Palatino,
    Vestibular,
}

impl Surface {
    pub const ALL: [Surface; 5] = [
        Surface::Oclusal,
        Surface::Mesial,
        Surface::Distal,
        Surface::Palatino,
        Surface::Vestibular,
    ];

    /// Name used in persisted section maps.
    pub fn as_str(self) -> &'static str {
        match self {
            Surface::Oclusal => "oclusal",
            Surface::Mesial => "mesial",
            Surface::Distal => "distal",
            Surface::Palatino => "palatino",
            Surface::Vestibular => "vestibular",
        }
    }
}

impl FromStr for Surface {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Surface::ALL
            .into_iter()
            .find(|surface| surface.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ModelError::UnknownSurface(s.to_string()))
    }
}

impl fmt::Display for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Colors painted on a tooth's surfaces.
///
/// Only painted surfaces are stored; a missing surface reads as white.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sections(BTreeMap<Surface, Color>);

impl Sections {
    pub fn new() -> Self {
        Self::default()
    }

    /// Color of a surface, if it has been painted.
    pub fn get(&self, surface: Surface) -> Option<&Color> {
        self.0.get(&surface)
    }

    /// Color of a surface, falling back to white.
    pub fn color_of(&self, surface: Surface) -> Color {
        self.get(surface).cloned().unwrap_or_else(Color::white)
    }

    /// Paint one surface, leaving the others untouched.
    pub fn set(&mut self, surface: Surface, color: Color) -> Option<Color> {
        self.0.insert(surface, color)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Surface, &Color)> {
        self.0.iter().map(|(surface, color)| (*surface, color))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Parse a persisted sections object.
    ///
    /// Keys that are not one of the five surfaces, non-string values and empty
    /// colors are skipped. `null` or any non-object value yields empty sections.
    /// Only malformed JSON text is an error.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let raw: serde_json::Value = serde_json::from_str(json)?;
        let entries = match raw {
            serde_json::Value::Object(entries) => entries,
            serde_json::Value::Null => return Ok(Sections::new()),
            other => {
                tracing::warn!(value = %other, "ignoring non-object sections value");
                return Ok(Sections::new());
            }
        };

        let mut sections = Sections::new();
        for (key, value) in entries {
            let color = match value {
                serde_json::Value::String(color) => Color::new(color).ok(),
                _ => None,
            };
            match (key.parse::<Surface>(), color) {
                (Ok(surface), Some(color)) => {
                    sections.set(surface, color);
                }
                _ => tracing::warn!(key = %key, "ignoring unrecognised section entry"),
            }
        }
        Ok(sections)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl FromIterator<(Surface, Color)> for Sections {
    fn from_iter<I: IntoIterator<Item = (Surface, Color)>>(iter: I) -> Self {
        Sections(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tooth_number_bounds() {
        assert!(ToothNumber::new(0).is_err());
        assert!(ToothNumber::new(1).is_ok());
        assert!(ToothNumber::new(32).is_ok());
        assert_eq!(ToothNumber::new(33), Err(ModelError::ToothOutOfRange(33)));
        assert_eq!(ToothNumber::from_i64(-4), Err(ModelError::ToothOutOfRange(-4)));
        assert_eq!(ToothNumber::from_i64(300), Err(ModelError::ToothOutOfRange(300)));
    }

    #[test]
    fn test_all_teeth() {
        let teeth: Vec<u8> = ToothNumber::all().map(ToothNumber::get).collect();
        assert_eq!(teeth.len(), 32);
        assert_eq!(teeth.first(), Some(&1));
        assert_eq!(teeth.last(), Some(&32));
    }

    #[test]
    fn test_surface_parse() {
        assert_eq!("distal".parse::<Surface>().unwrap(), Surface::Distal);
        assert_eq!("Vestibular".parse::<Surface>().unwrap(), Surface::Vestibular);
        assert!("lingual".parse::<Surface>().is_err());
    }

    #[test]
    fn test_sections_set_keeps_other_surfaces() {
        let mut sections = Sections::new();
        sections.set(Surface::Mesial, Color::new("#FEF7CD").unwrap());
        sections.set(Surface::Distal, Color::new("#F2FCE2").unwrap());

        assert_eq!(sections.len(), 2);
        assert_eq!(sections.color_of(Surface::Mesial).as_str(), "#FEF7CD");
        assert_eq!(sections.color_of(Surface::Distal).as_str(), "#F2FCE2");
        assert_eq!(sections.color_of(Surface::Oclusal), Color::white());
    }

    #[test]
    fn test_sections_json() {
        let mut sections = Sections::new();
        sections.set(Surface::Distal, Color::new("#F2FCE2").unwrap());

        let json = sections.to_json().unwrap();
        assert_eq!(json, r##"{"distal":"#F2FCE2"}"##);
        assert_eq!(Sections::from_json(&json).unwrap(), sections);
    }

    #[test]
    fn test_sections_json_lenient() {
        let sections =
            Sections::from_json(r##"{"distal":"#F2FCE2","lingual":"#000000","mesial":""}"##)
                .unwrap();
        assert_eq!(sections.len(), 1);
        assert!(Sections::from_json("null").unwrap().is_empty());
    }

    #[test]
    fn test_sections_json_skips_non_string_values() {
        let sections = Sections::from_json(
            r##"{"distal":null,"mesial":4,"oclusal":{"c":"#fff"},"palatino":"#FEC6A1"}"##,
        )
        .unwrap();
        assert_eq!(sections.len(), 1);
        assert_eq!(sections.color_of(Surface::Palatino).as_str(), "#FEC6A1");

        assert!(Sections::from_json("42").unwrap().is_empty());
        assert!(Sections::from_json(r#"["distal"]"#).unwrap().is_empty());
        assert!(Sections::from_json("{not json").is_err());
    }
}
