//! Terrain cost field
//!
//! Immutable after load; the single source of truth for pathfinding
//! weights and ranged cover.

use serde::{Deserialize, Serialize};

use crate::battle::weather::Weather;
use crate::core::error::{BattleError, Result};
use crate::core::types::Cell;

/// Cells at or above this cost cannot be entered
pub const IMPASSABLE_COST: f32 = 5.0;

/// Per-cell movement cost grid, row-major
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerrainField {
    width: u32,
    height: u32,
    costs: Vec<f32>,
}

impl TerrainField {
    /// All-plain field (cost 1.0 everywhere)
    pub fn open(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(BattleError::InvalidMapSize { width, height });
        }
        Ok(Self {
            width,
            height,
            costs: vec![1.0; (width * height) as usize],
        })
    }

    /// Build from raw per-cell costs. Malformed entries (non-finite or
    /// below 1.0) default to plain rather than failing construction;
    /// a short grid is padded with plain.
    pub fn from_costs(width: u32, height: u32, raw: &[f32]) -> Result<Self> {
        let mut field = Self::open(width, height)?;
        for (i, slot) in field.costs.iter_mut().enumerate() {
            if let Some(&cost) = raw.get(i) {
                if cost.is_finite() && cost >= 1.0 {
                    *slot = cost;
                }
            }
        }
        Ok(field)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn in_bounds(&self, cell: Cell) -> bool {
        cell.x >= 0 && cell.y >= 0 && cell.x < self.width as i32 && cell.y < self.height as i32
    }

    /// Movement cost of a cell; out-of-bounds reads as impassable
    pub fn cost_at(&self, cell: Cell) -> f32 {
        if !self.in_bounds(cell) {
            return IMPASSABLE_COST;
        }
        self.costs[(cell.y as u32 * self.width + cell.x as u32) as usize]
    }

    pub fn is_passable(&self, cell: Cell) -> bool {
        self.cost_at(cell) < IMPASSABLE_COST
    }

    /// Does this cell grant cover against ranged fire?
    pub fn provides_cover(&self, cell: Cell, cover_cost_threshold: f32) -> bool {
        self.in_bounds(cell) && self.cost_at(cell) > cover_cost_threshold
    }

    /// One-shot weather transform, called exactly once at scenario
    /// construction. Rain turns the rough-going band (cost 1.5) into mud.
    pub(crate) fn apply_weather(&mut self, weather: Weather) {
        if weather == Weather::Rain {
            for cost in &mut self.costs {
                if (*cost - 1.5).abs() < f32::EPSILON {
                    *cost *= 2.5;
                }
            }
        }
    }
}
