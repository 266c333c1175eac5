//! Board layout and pointer hit testing
//!
//! Screen space is CSS pixels with the origin at the top-left of the board
//! element, y pointing down.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::CellCoord;
use crate::consts::{GRID_COLS, GRID_ROWS};
use crate::sim::Worm;

/// Where the grid sits on screen
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoardLayout {
    /// Top-left corner of cell (0, 0)
    pub origin: Vec2,
    /// Side length of one (square) cell
    pub cell_size: f32,
    /// Spacing between cells
    pub gap: f32,
}

impl BoardLayout {
    /// Largest square grid that fits in `size`, centered
    pub fn fit(size: Vec2, gap: f32) -> Self {
        let cols = GRID_COLS as f32;
        let rows = GRID_ROWS as f32;
        let cell_w = (size.x - gap * (cols - 1.0)) / cols;
        let cell_h = (size.y - gap * (rows - 1.0)) / rows;
        let cell_size = cell_w.min(cell_h).max(0.0);

        let extent = Vec2::new(
            cell_size * cols + gap * (cols - 1.0),
            cell_size * rows + gap * (rows - 1.0),
        );
        Self {
            origin: ((size - extent) * 0.5).max(Vec2::ZERO),
            cell_size,
            gap,
        }
    }

    fn pitch(&self) -> f32 {
        self.cell_size + self.gap
    }

    /// Top-left and bottom-right of a cell
    pub fn cell_rect(&self, cell: CellCoord) -> (Vec2, Vec2) {
        let min = self.origin + Vec2::new(cell.col as f32, cell.row as f32) * self.pitch();
        (min, min + Vec2::splat(self.cell_size))
    }

    pub fn cell_center(&self, cell: CellCoord) -> Vec2 {
        let (min, max) = self.cell_rect(cell);
        (min + max) * 0.5
    }

    /// Cell under a pointer position (gaps hit nothing)
    pub fn cell_at(&self, pos: Vec2) -> Option<CellCoord> {
        if self.cell_size <= 0.0 {
            return None;
        }
        let local = pos - self.origin;
        if local.x < 0.0 || local.y < 0.0 {
            return None;
        }
        let col = (local.x / self.pitch()).floor() as usize;
        let row = (local.y / self.pitch()).floor() as usize;
        let cell = CellCoord::new(row, col);
        if !cell.in_bounds() {
            return None;
        }

        let (min, max) = self.cell_rect(cell);
        let inside = pos.cmpge(min).all() && pos.cmplt(max).all();
        inside.then_some(cell)
    }

    /// Worm a tap lands on: the oldest active worm in the tapped cell
    pub fn worm_at<'a>(
        &self,
        pos: Vec2,
        worms: impl IntoIterator<Item = &'a Worm>,
    ) -> Option<u32> {
        let cell = self.cell_at(pos)?;
        worms
            .into_iter()
            .filter(|w| w.is_active() && w.cell == cell)
            .min_by_key(|w| (w.spawned_at_ms, w.id))
            .map(|w| w.id)
    }
}
