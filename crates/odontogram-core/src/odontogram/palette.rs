//! Paint color selection.

use crate::models::{Color, ModelResult};

/// Preset colors plus one custom swatch, with the color currently in use.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfacePalette {
    presets: Vec<Color>,
    custom: Color,
    active: Color,
}

impl Default for SurfacePalette {
    fn default() -> Self {
        let presets = Color::presets();
        let active = presets[0].clone();
        Self {
            presets,
            custom: Color::default_custom(),
            active,
        }
    }
}

impl SurfacePalette {
    pub fn new() -> Self {
        Self::default()
    }

    /// Palette starting on the given color and custom swatch.
    pub fn with_colors(active: Color, custom: Color) -> Self {
        Self {
            presets: Color::presets(),
            custom,
            active,
        }
    }

    pub fn presets(&self) -> &[Color] {
        &self.presets
    }

    pub fn custom(&self) -> &Color {
        &self.custom
    }

    /// Color used by the next paint.
    pub fn active(&self) -> &Color {
        &self.active
    }

    /// Select any color, preset or not.
    pub fn select_color(&mut self, color: &str) -> ModelResult<()> {
        self.active = Color::new(color)?;
        Ok(())
    }

    /// Change the custom swatch and make it the active color.
    pub fn set_custom_color(&mut self, color: &str) -> ModelResult<()> {
        let color = Color::new(color)?;
        self.custom = color.clone();
        self.active = color;
        Ok(())
    }

    pub fn is_preset_active(&self) -> bool {
        self.presets.contains(&self.active)
    }
}
