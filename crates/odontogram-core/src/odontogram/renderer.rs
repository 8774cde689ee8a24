//! Layout and hit-testing for a single tooth and for the full chart.
//!
//! A tooth is drawn in a 56x56 box split into five surfaces:
//!
//! ```text
//!        +--------+
//!        | mesial |
//! +------+--------+------+
//! |palat.|oclusal |vesti.|
//! +------+--------+------+
//!        | distal |
//!        +--------+
//! ```
//!
//! The four corner squares belong to no surface.

use serde::{Deserialize, Serialize};

use crate::models::{Color, Surface, ToothNumber};

use super::ToothData;

/// Edge length of the square a tooth is drawn in.
pub const TOOTH_BOX_SIZE: f32 = 56.0;

/// Teeth per row in the chart grid.
pub const CHART_COLUMNS: u8 = 8;

/// Axis-aligned rectangle in tooth-local coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Half-open containment: the left and top edges are inside, right and bottom are not.
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }
}

/// Where a surface sits inside the tooth box.
pub fn surface_rect(surface: Surface) -> Rect {
    const Q: f32 = TOOTH_BOX_SIZE / 4.0;
    const H: f32 = TOOTH_BOX_SIZE / 2.0;
    match surface {
        Surface::Oclusal => Rect::new(Q, Q, H, H),
        Surface::Mesial => Rect::new(Q, 0.0, H, Q),
        Surface::Distal => Rect::new(Q, TOOTH_BOX_SIZE - Q, H, Q),
        Surface::Palatino => Rect::new(0.0, Q, Q, H),
        Surface::Vestibular => Rect::new(TOOTH_BOX_SIZE - Q, Q, Q, H),
    }
}

/// One drawable surface of a tooth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceCell {
    pub surface: Surface,
    pub rect: Rect,
    pub fill: Color,
}

/// Emitted when a click lands on a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceClicked(pub Surface);

/// Everything needed to draw one tooth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToothView {
    pub number: ToothNumber,
    pub cells: Vec<SurfaceCell>,
    pub condition: String,
}

impl ToothView {
    /// Surface under a point in tooth-local coordinates.
    pub fn hit_test(&self, x: f32, y: f32) -> Option<Surface> {
        self.cells
            .iter()
            .find(|cell| cell.rect.contains(x, y))
            .map(|cell| cell.surface)
    }

    pub fn click(&self, x: f32, y: f32) -> Option<SurfaceClicked> {
        self.hit_test(x, y).map(SurfaceClicked)
    }

    pub fn fill(&self, surface: Surface) -> Option<&Color> {
        self.cells
            .iter()
            .find(|cell| cell.surface == surface)
            .map(|cell| &cell.fill)
    }
}

/// Render one tooth from its data. Unpainted surfaces are white.
pub fn render_tooth(number: ToothNumber, data: &ToothData) -> ToothView {
    let cells = Surface::ALL
        .into_iter()
        .map(|surface| SurfaceCell {
            surface,
            rect: surface_rect(surface),
            fill: data.sections.color_of(surface),
        })
        .collect();

    ToothView {
        number,
        cells,
        condition: data.condition.clone(),
    }
}

/// Grid position of a tooth in the chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartSlot {
    pub tooth: ToothNumber,
    pub row: u8,
    pub column: u8,
}

/// All 32 teeth laid out row by row, [`CHART_COLUMNS`] per row.
pub fn chart_layout() -> Vec<ChartSlot> {
    ToothNumber::all()
        .map(|tooth| {
            let index = tooth.get() - 1;
            ChartSlot {
                tooth,
                row: index / CHART_COLUMNS,
                column: index % CHART_COLUMNS,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Sections;

    fn tooth(n: u8) -> ToothNumber {
        ToothNumber::new(n).unwrap()
    }

    fn painted_distal() -> ToothData {
        let mut sections = Sections::new();
        sections.set(Surface::Distal, Color::new("#F2FCE2").unwrap());
        ToothData {
            sections,
            condition: "Caries".into(),
        }
    }

    #[test]
    fn test_render_fills() {
        let view = render_tooth(tooth(14), &painted_distal());
        assert_eq!(view.cells.len(), 5);
        assert_eq!(view.fill(Surface::Distal).unwrap().as_str(), "#F2FCE2");
        assert!(view.fill(Surface::Oclusal).unwrap().is_white());
        assert_eq!(view.condition, "Caries");
    }

    #[test]
    fn test_hit_test_each_surface() {
        let view = render_tooth(tooth(1), &ToothData::default());
        assert_eq!(view.hit_test(28.0, 28.0), Some(Surface::Oclusal));
        assert_eq!(view.hit_test(28.0, 2.0), Some(Surface::Mesial));
        assert_eq!(view.hit_test(28.0, 54.0), Some(Surface::Distal));
        assert_eq!(view.hit_test(2.0, 28.0), Some(Surface::Palatino));
        assert_eq!(view.hit_test(54.0, 28.0), Some(Surface::Vestibular));
    }

    #[test]
    fn test_corners_and_outside_miss() {
        let view = render_tooth(tooth(1), &ToothData::default());
        assert_eq!(view.hit_test(2.0, 2.0), None);
        assert_eq!(view.hit_test(54.0, 54.0), None);
        assert_eq!(view.hit_test(-1.0, 28.0), None);
        assert_eq!(view.hit_test(56.0, 28.0), None);
    }

    #[test]
    fn test_surfaces_do_not_overlap() {
        let view = render_tooth(tooth(1), &ToothData::default());
        for y in 0..56 {
            for x in 0..56 {
                let hits = view
                    .cells
                    .iter()
                    .filter(|c| c.rect.contains(x as f32 + 0.5, y as f32 + 0.5))
                    .count();
                assert!(hits <= 1, "overlap at ({}, {})", x, y);
            }
        }
    }

    #[test]
    fn test_click_emits_surface() {
        let view = render_tooth(tooth(3), &ToothData::default());
        assert_eq!(view.click(20.0, 20.0), Some(SurfaceClicked(Surface::Oclusal)));
        assert_eq!(view.click(0.0, 0.0), None);
    }

    #[test]
    fn test_chart_layout() {
        let layout = chart_layout();
        assert_eq!(layout.len(), 32);
        assert_eq!(layout[0].row, 0);
        assert_eq!(layout[0].column, 0);
        assert_eq!(layout[8].tooth.get(), 9);
        assert_eq!(layout[8].row, 1);
        assert_eq!(layout[8].column, 0);
        assert_eq!(layout[31].row, 3);
        assert_eq!(layout[31].column, 7);
    }
}
