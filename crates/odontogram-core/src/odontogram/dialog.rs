//! Host-facing odontogram dialog.
//!
//! The host supplies a patient ID, an open flag and an open-change callback.
//! Nothing is rendered while the dialog is closed or has no patient.

use crate::models::{Color, Surface, ToothNumber, CONDITION_PRESETS};
use crate::sync::RecordSyncGateway;

use super::{
    chart_layout, render_tooth, ChartSlot, LoadOutcome, LoadPhase, OdontogramError,
    OdontogramResult, OdontogramStore, SurfaceClicked, SurfacePalette, ToothView,
};

/// Called with the new open state whenever it changes.
pub type OpenChangeHandler = Box<dyn FnMut(bool) + Send>;

pub struct OdontogramDialog {
    patient_id: String,
    open: bool,
    on_open_change: Option<OpenChangeHandler>,
    store: OdontogramStore,
    palette: SurfacePalette,
}

/// One tooth as placed in the chart.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartTooth {
    pub slot: ChartSlot,
    pub view: ToothView,
    pub selected: bool,
    /// Surfaces whose color is shown but was not saved
    pub unsaved: Vec<Surface>,
}

/// A rendered dialog.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartView {
    pub patient_id: String,
    pub phase: LoadPhase,
    /// Empty until the patient's records have loaded
    pub teeth: Vec<ChartTooth>,
    pub selected: Option<ToothNumber>,
    pub condition_draft: String,
    pub condition_presets: Vec<String>,
    pub active_color: Color,
    pub preset_colors: Vec<Color>,
    pub custom_color: Color,
    pub reload_required: bool,
}

impl OdontogramDialog {
    pub fn new(
        patient_id: impl Into<String>,
        is_open: bool,
        on_open_change: Option<OpenChangeHandler>,
    ) -> Self {
        Self {
            patient_id: patient_id.into(),
            open: is_open,
            on_open_change,
            store: OdontogramStore::new(),
            palette: SurfacePalette::new(),
        }
    }

    pub fn with_palette(mut self, palette: SurfacePalette) -> Self {
        self.palette = palette;
        self
    }

    pub fn patient_id(&self) -> &str {
        &self.patient_id
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Open with a non-empty patient.
    pub fn is_visible(&self) -> bool {
        self.open && !self.patient_id.trim().is_empty()
    }

    pub fn store(&self) -> &OdontogramStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut OdontogramStore {
        &mut self.store
    }

    pub fn palette(&self) -> &SurfacePalette {
        &self.palette
    }

    pub fn palette_mut(&mut self) -> &mut SurfacePalette {
        &mut self.palette
    }

    /// Open or close the dialog.
    ///
    /// Opening loads the patient if nothing is loaded yet or the last load
    /// failed; closing discards all editor state.
    pub fn set_open(&mut self, gateway: &RecordSyncGateway<'_>, open: bool) -> OdontogramResult<()> {
        if open != self.open {
            self.open = open;
            if let Some(handler) = self.on_open_change.as_mut() {
                handler(open);
            }
        }

        if !open {
            self.store.close();
            return Ok(());
        }
        if self.is_visible() && self.store.phase().needs_load() {
            self.refresh(gateway)?;
        }
        Ok(())
    }

    /// Switch to another patient, reloading if visible.
    pub fn set_patient(
        &mut self,
        gateway: &RecordSyncGateway<'_>,
        patient_id: impl Into<String>,
    ) -> OdontogramResult<()> {
        let patient_id = patient_id.into();
        if patient_id == self.patient_id && !self.store.phase().needs_load() {
            return Ok(());
        }
        self.patient_id = patient_id;
        self.store.close();
        if self.is_visible() {
            self.refresh(gateway)?;
        }
        Ok(())
    }

    /// Reload the current patient's records.
    pub fn refresh(&mut self, gateway: &RecordSyncGateway<'_>) -> OdontogramResult<LoadOutcome> {
        if !self.is_visible() {
            return Err(OdontogramError::Validation(
                "odontogram dialog is closed".into(),
            ));
        }
        let patient_id = self.patient_id.clone();
        self.store.load(gateway, &patient_id)
    }

    /// Paint a surface with the palette's active color.
    pub fn paint_with_palette(
        &mut self,
        gateway: &RecordSyncGateway<'_>,
        tooth: ToothNumber,
        surface: Surface,
    ) -> OdontogramResult<()> {
        let color = self.palette.active().clone();
        self.store.paint_surface(gateway, tooth, surface, color)
    }

    /// Handle a click at tooth-local coordinates.
    ///
    /// Returns the painted surface, or `None` if the click hit no surface.
    pub fn click_surface(
        &mut self,
        gateway: &RecordSyncGateway<'_>,
        tooth: ToothNumber,
        x: f32,
        y: f32,
    ) -> OdontogramResult<Option<Surface>> {
        let data = self
            .store
            .tooth(tooth)
            .cloned()
            .ok_or_else(|| OdontogramError::Validation("odontogram is not loaded".into()))?;

        match render_tooth(tooth, &data).click(x, y) {
            Some(SurfaceClicked(surface)) => {
                self.paint_with_palette(gateway, tooth, surface)?;
                Ok(Some(surface))
            }
            None => Ok(None),
        }
    }

    /// Everything the host needs to draw, or `None` when nothing should be shown.
    pub fn render(&self) -> Option<ChartView> {
        if !self.is_visible() {
            return None;
        }

        let selected = self.store.selected_tooth();
        let failed = self.store.failed_writes();
        let teeth = match self.store.state() {
            Some(state) => chart_layout()
                .into_iter()
                .map(|slot| ChartTooth {
                    slot,
                    view: render_tooth(slot.tooth, state.tooth(slot.tooth)),
                    selected: selected == Some(slot.tooth),
                    unsaved: failed
                        .iter()
                        .filter(|(tooth, _)| *tooth == slot.tooth)
                        .map(|(_, surface)| *surface)
                        .collect(),
                })
                .collect(),
            None => Vec::new(),
        };

        Some(ChartView {
            patient_id: self.patient_id.clone(),
            phase: self.store.phase().clone(),
            teeth,
            selected,
            condition_draft: self.store.condition_draft().to_string(),
            condition_presets: CONDITION_PRESETS.iter().map(|c| c.to_string()).collect(),
            active_color: self.palette.active().clone(),
            preset_colors: self.palette.presets().to_vec(),
            custom_color: self.palette.custom().clone(),
            reload_required: self.store.reload_required(),
        })
    }
}

impl std::fmt::Debug for OdontogramDialog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OdontogramDialog")
            .field("patient_id", &self.patient_id)
            .field("open", &self.open)
            .field("store", &self.store)
            .field("palette", &self.palette)
            .finish_non_exhaustive()
    }
}
