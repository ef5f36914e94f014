//! Healing zones (fortified camps)
//!
//! Fixed cell blocks that passively restore friendly units standing on
//! them each tick, and serve as rally points for fleeing troops.

use ahash::AHashSet;
use serde::{Deserialize, Serialize};

use crate::battle::units::{Faction, Unit, UnitState};
use crate::core::config::BattleConfig;
use crate::core::types::Cell;

/// A fixed set of healing cells belonging to one faction's camp
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealingZone {
    pub faction: Faction,
    pub cells: AHashSet<Cell>,
    /// Cell fleeing units route toward (just south of the camp center)
    pub entrance: Cell,
}

impl HealingZone {
    /// 3x3 block around a camp center, clipped to the map
    pub fn around_center(center: Cell, faction: Faction, width: u32, height: u32) -> Self {
        let mut cells = AHashSet::new();
        for dy in -1..=1 {
            for dx in -1..=1 {
                let cell = Cell::new(center.x + dx, center.y + dy);
                if cell.x >= 0
                    && cell.y >= 0
                    && cell.x < width as i32
                    && cell.y < height as i32
                {
                    cells.insert(cell);
                }
            }
        }
        Self {
            faction,
            cells,
            entrance: Cell::new(center.x, center.y + 1),
        }
    }

    pub fn contains(&self, cell: Cell) -> bool {
        self.cells.contains(&cell)
    }

    /// Heal a friendly living unit standing on this zone. Fleeing
    /// units recover to IDLE once both hp and morale climb back above
    /// the recovery fraction.
    pub fn apply(&self, unit: &mut Unit, config: &BattleConfig) {
        if unit.faction != self.faction || !unit.is_alive() || !self.contains(unit.pos) {
            return;
        }

        unit.hp = (unit.hp + config.heal_hp_per_tick).min(unit.template.max_hp);
        unit.morale = (unit.morale + config.heal_morale_per_tick).min(unit.template.max_morale);

        if unit.state == UnitState::Fleeing
            && unit.hp > unit.template.max_hp * config.recovery_fraction
            && unit.morale > unit.template.max_morale * config.recovery_fraction
        {
            unit.state = UnitState::Idle;
            unit.drop_path();
        }
    }
}

/// The entrance of the given faction's zone nearest to `from`
pub fn nearest_entrance(zones: &[HealingZone], faction: Faction, from: Cell) -> Option<Cell> {
    zones
        .iter()
        .filter(|z| z.faction == faction)
        .map(|z| z.entrance)
        .min_by_key(|e| from.chebyshev_distance(e))
}
