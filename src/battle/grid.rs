//! Spatial occupancy index
//!
//! Dense cell buckets answering proximity and emptiness queries in
//! O(1) amortised per update. Multiple occupants may share a cell;
//! movement rules, not the index, keep living units apart.

use ahash::AHashMap;

use crate::core::types::{Cell, UnitId};

#[derive(Debug, Clone)]
pub struct SpatialIndex {
    width: u32,
    height: u32,
    cells: Vec<Vec<UnitId>>,
    positions: AHashMap<UnitId, Cell>,
}

impl SpatialIndex {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            cells: vec![Vec::new(); (width * height) as usize],
            positions: AHashMap::new(),
        }
    }

    pub fn in_bounds(&self, cell: Cell) -> bool {
        cell.x >= 0 && cell.y >= 0 && cell.x < self.width as i32 && cell.y < self.height as i32
    }

    fn bucket_index(&self, cell: Cell) -> usize {
        (cell.y as u32 * self.width + cell.x as u32) as usize
    }

    /// Where is this occupant, if tracked?
    pub fn position_of(&self, id: UnitId) -> Option<Cell> {
        self.positions.get(&id).copied()
    }

    /// Place an occupant. Out-of-bounds insertions are ignored.
    pub fn insert(&mut self, id: UnitId, cell: Cell) {
        if !self.in_bounds(cell) {
            return;
        }
        if self.positions.contains_key(&id) {
            self.remove(id);
        }
        let idx = self.bucket_index(cell);
        self.cells[idx].push(id);
        self.positions.insert(id, cell);
    }

    pub fn remove(&mut self, id: UnitId) {
        if let Some(cell) = self.positions.remove(&id) {
            let idx = self.bucket_index(cell);
            self.cells[idx].retain(|&o| o != id);
        }
    }

    /// Reassign occupancy. Returns false (and leaves the occupant in
    /// place) when the destination is out of bounds - callers treat
    /// that as a blocked move, not an error.
    pub fn move_unit(&mut self, id: UnitId, to: Cell) -> bool {
        if !self.in_bounds(to) {
            return false;
        }
        let Some(from) = self.positions.get(&id).copied() else {
            return false;
        };
        if from == to {
            return true;
        }
        let from_idx = self.bucket_index(from);
        self.cells[from_idx].retain(|&o| o != id);
        let to_idx = self.bucket_index(to);
        self.cells[to_idx].push(id);
        self.positions.insert(id, to);
        true
    }

    pub fn is_empty(&self, cell: Cell) -> bool {
        if !self.in_bounds(cell) {
            return true;
        }
        self.cells[self.bucket_index(cell)].is_empty()
    }

    pub fn occupants(&self, cell: Cell) -> &[UnitId] {
        if !self.in_bounds(cell) {
            return &[];
        }
        &self.cells[self.bucket_index(cell)]
    }

    /// All occupants within a Chebyshev radius of `center`, the center
    /// cell included. Unordered; callers filter with their own
    /// predicates.
    pub fn neighbors(&self, center: Cell, radius: u32) -> Vec<UnitId> {
        let r = radius as i32;
        let mut found = Vec::new();
        let x_lo = (center.x - r).max(0);
        let x_hi = (center.x + r).min(self.width as i32 - 1);
        let y_lo = (center.y - r).max(0);
        let y_hi = (center.y + r).min(self.height as i32 - 1);
        for y in y_lo..=y_hi {
            for x in x_lo..=x_hi {
                found.extend_from_slice(self.occupants(Cell::new(x, y)));
            }
        }
        found
    }
}
