//! # Grid Layout
//!
//! Turns a declarative 12x12 grid description into concrete view rectangles
//! for the current terminal size.
//!
//! One grid unit is a twelfth of the terminal width (or height). Unit sizes
//! are real-valued; each rectangle corner is truncated to an integer cell
//! independently, so adjacent cells share exactly one boundary and never
//! overlap.
//!
//! Rectangles use inclusive corners: a view at `x0..=x1` is `x1 - x0 + 1`
//! cells wide, border included.

use ratatui::layout::Rect;

/// Number of grid units along each axis.
pub const GRID_UNITS: u16 = 12;

/// Smallest terminal size for which every cell of [`DEFAULT_GRID`] gets a
/// non-degenerate, non-overlapping rectangle.
pub const MIN_WIDTH: u16 = 12;
pub const MIN_HEIGHT: u16 = 12;

/// Placement of one named view on the grid, in grid units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridCell {
    pub name: &'static str,
    pub width: u16,
    pub height: u16,
    pub x: u16,
    pub y: u16,
}

impl GridCell {
    pub const fn new(name: &'static str, width: u16, height: u16, x: u16, y: u16) -> Self {
        Self {
            name,
            width,
            height,
            x,
            y,
        }
    }
}

/// View names used by the dashboard.
pub const TARGETS_VIEW: &str = "targets";
pub const OUTPUT_VIEW: &str = "output";
pub const HELP_VIEW: &str = "help";

/// Target list on the left, documentation below it, output on the right.
///
/// ```text
/// ┌─────┬──────────────────┐
/// │     │                  │
/// │ tgt │      output      │
/// │     │                  │
/// ├─────┤                  │
/// │help │                  │
/// └─────┴──────────────────┘
/// ```
pub const DEFAULT_GRID: [GridCell; 3] = [
    GridCell::new(TARGETS_VIEW, 3, 10, 0, 0),
    GridCell::new(OUTPUT_VIEW, 9, 12, 3, 0),
    GridCell::new(HELP_VIEW, 3, 2, 0, 10),
];

/// Inclusive-corner rectangle in terminal cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewRect {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

impl ViewRect {
    pub fn width(&self) -> i32 {
        self.x1 - self.x0 + 1
    }

    pub fn height(&self) -> i32 {
        self.y1 - self.y0 + 1
    }

    pub fn intersects(&self, other: &ViewRect) -> bool {
        self.x0 <= other.x1 && other.x0 <= self.x1 && self.y0 <= other.y1 && other.y0 <= self.y1
    }

    /// Whether the rectangle fits in a `width` x `height` terminal.
    pub fn within(&self, width: u16, height: u16) -> bool {
        self.x0 >= 0 && self.y0 >= 0 && self.x1 < i32::from(width) && self.y1 < i32::from(height)
    }

    /// Convert to a ratatui area. Negative origins are clamped to zero.
    pub fn to_area(&self) -> Rect {
        let to_u16 = |v: i32| u16::try_from(v.max(0)).unwrap_or(u16::MAX);
        let x = to_u16(self.x0);
        let y = to_u16(self.y0);
        let width = to_u16(self.x1 + 1).saturating_sub(x);
        let height = to_u16(self.y1 + 1).saturating_sub(y);
        Rect::new(x, y, width, height)
    }
}

/// Compute the rectangle of every cell for a `width` x `height` terminal.
///
/// Pure and deterministic; results keep the order of `cells`. Degenerate
/// axes are widened so every rectangle spans at least two cells each way.
pub fn compute_layout(cells: &[GridCell], width: u16, height: u16) -> Vec<(&'static str, ViewRect)> {
    let unit_x = f64::from(width) / f64::from(GRID_UNITS);
    let unit_y = f64::from(height) / f64::from(GRID_UNITS);

    cells
        .iter()
        .map(|cell| {
            let x_pos = f64::from(cell.x) * unit_x;
            let y_pos = f64::from(cell.y) * unit_y;
            let w = f64::from(cell.width) * unit_x;
            let h = f64::from(cell.height) * unit_y;

            let x0 = x_pos as i32;
            let y0 = y_pos as i32;
            let mut x1 = (x_pos + w) as i32 - 1;
            let mut y1 = (y_pos + h) as i32 - 1;

            if x1 <= x0 {
                x1 = x0 + 1;
            }
            if y1 <= y0 {
                y1 = y0 + 1;
            }

            (cell.name, ViewRect { x0, y0, x1, y1 })
        })
        .collect()
}
