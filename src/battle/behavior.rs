//! Per-unit decision logic
//!
//! One activation per living unit per tick, with a fixed priority
//! ladder: panic check, flight, engagement against the nearest visible
//! enemy, pursuit of the nearest enemy anywhere, and finally strategic
//! wandering. Each rung returns; a unit does one thing per tick.
//!
//! Movement is probabilistic rather than budgeted: a unit attempts the
//! next path cell with probability speed / (speed_reference * cost),
//! so slow units in heavy going simply skip more ticks.

use ahash::AHashSet;
use rand::Rng;

use crate::battle::combat;
use crate::battle::healing;
use crate::battle::pathfinding;
use crate::battle::simulation::BattleSim;
use crate::battle::units::{Faction, UnitState};
use crate::core::types::{Cell, UnitId};

impl BattleSim {
    pub(crate) fn step_unit(&mut self, id: UnitId) {
        let Some(&idx) = self.index.get(&id) else {
            // Activation snapshot and roster disagree; skip the unit
            // for this tick rather than fault the whole simulation
            tracing::warn!(unit = id.0, "activated unit missing from roster index");
            return;
        };
        if !self.units[idx].is_alive() {
            return;
        }

        {
            let unit = &mut self.units[idx];
            if unit.cooldown > 0.0 {
                unit.cooldown = (unit.cooldown - 1.0).max(0.0);
            }
            unit.repath_ticks = unit.repath_ticks.saturating_add(1);
        }

        self.check_panic(idx);

        if self.units[idx].state == UnitState::Fleeing {
            self.step_fleeing(idx);
            return;
        }

        if let Some(enemy_idx) = self.nearest_visible_enemy(idx) {
            self.engage(idx, enemy_idx);
            return;
        }

        if let Some(enemy_idx) = self.nearest_enemy_anywhere(idx) {
            let target = self.units[enemy_idx].pos;
            self.units[idx].state = UnitState::Moving;
            self.pursue(idx, target);
            return;
        }

        self.step_strategic(idx);
    }

    /// Below its morale threshold a unit rolls against its discipline:
    /// chance = (100 - discipline) / 100, so an undisciplined mob
    /// breaks immediately while veterans usually hold.
    fn check_panic(&mut self, idx: usize) {
        let unit = &self.units[idx];
        if unit.state == UnitState::Fleeing {
            return;
        }
        if unit.morale >= unit.panic_threshold(self.config.base_panic_threshold) {
            return;
        }
        let chance = ((100.0 - unit.template.discipline) / 100.0).clamp(0.0, 1.0);
        if self.rng.gen::<f32>() < chance {
            let unit = &mut self.units[idx];
            unit.state = UnitState::Fleeing;
            unit.drop_path();
            tracing::debug!(unit = unit.id.0, morale = unit.morale, "breaks and flees");
        }
    }

    fn step_fleeing(&mut self, idx: usize) {
        let goal = self.flight_target(idx);
        if self.units[idx].pos == goal {
            return;
        }
        self.pursue(idx, goal);
        self.units[idx].state = UnitState::Fleeing;
    }

    /// Crown troops run for the nearest camp; Cossacks break for their
    /// own table edge.
    fn flight_target(&self, idx: usize) -> Cell {
        let unit = &self.units[idx];
        match unit.faction {
            Faction::Crown => {
                healing::nearest_entrance(&self.healing_zones, Faction::Crown, unit.pos)
                    .unwrap_or_else(|| Cell::new(unit.pos.x, self.terrain.height() as i32 - 1))
            }
            Faction::Cossack => Cell::new(unit.pos.x, 0),
        }
    }

    fn engage(&mut self, idx: usize, enemy_idx: usize) {
        let distance = self.units[idx]
            .pos
            .chebyshev_distance(&self.units[enemy_idx].pos);

        if distance <= self.config.melee_range {
            self.units[idx].state = UnitState::Attacking;
            self.units[idx].drop_path();
            let outcome = combat::resolve_melee(&self.units[idx], &self.config, &mut self.rng);
            if outcome.hit {
                let dealt = combat::apply_damage(
                    &mut self.units[enemy_idx],
                    outcome.raw_damage,
                    &self.config,
                    &mut self.rng,
                );
                tracing::debug!(
                    attacker = self.units[idx].id.0,
                    defender = self.units[enemy_idx].id.0,
                    dealt,
                    "melee strike"
                );
            }
            return;
        }

        let me = &self.units[idx];
        if me.has_ranged() && me.ammo > 0 && distance <= me.template.range {
            // In range with powder left: stand and shoot, or wait out
            // the reload when resolve declines the shot.
            let outcome = combat::resolve_ranged(
                &self.units[idx],
                &self.units[enemy_idx],
                &self.terrain,
                self.weather,
                &self.config,
                &mut self.rng,
            );
            {
                let unit = &mut self.units[idx];
                unit.state = UnitState::Attacking;
                unit.drop_path();
            }
            if let Some(outcome) = outcome {
                {
                    let unit = &mut self.units[idx];
                    unit.ammo = unit.ammo.saturating_sub(outcome.ammo_spent);
                    unit.cooldown = outcome.cooldown;
                }
                if outcome.hit {
                    let dealt = combat::apply_damage(
                        &mut self.units[enemy_idx],
                        outcome.raw_damage,
                        &self.config,
                        &mut self.rng,
                    );
                    tracing::debug!(
                        attacker = self.units[idx].id.0,
                        defender = self.units[enemy_idx].id.0,
                        dealt,
                        "ranged hit"
                    );
                }
            }
            return;
        }

        // Out of reach (or dry): close the distance
        let target = self.units[enemy_idx].pos;
        self.units[idx].state = UnitState::Moving;
        self.pursue(idx, target);
    }

    fn step_strategic(&mut self, idx: usize) {
        let arrived = {
            let unit = &self.units[idx];
            unit.pos.chebyshev_distance(&unit.strategic_target)
                <= self.config.strategic_arrival_radius
        };
        if arrived {
            let target = self.roll_strategic_target();
            let unit = &mut self.units[idx];
            unit.strategic_target = target;
            unit.drop_path();
        }
        let goal = self.units[idx].strategic_target;
        self.units[idx].state = UnitState::MovingToStrategic;
        self.pursue(idx, goal);
    }

    /// Head toward `goal`, replanning when the path is gone, stale,
    /// or the goal has drifted away from what the path was planned to
    fn pursue(&mut self, idx: usize, goal: Cell) {
        let needs_replan = {
            let unit = &self.units[idx];
            unit.path.is_empty()
                || unit.repath_ticks >= self.config.repath_interval
                || unit.path_goal.map_or(true, |planned| {
                    planned.chebyshev_distance(&goal) > self.config.target_drift_threshold
                })
        };
        if needs_replan {
            self.replan(idx, goal);
        }
        self.advance_along_path(idx);
    }

    fn replan(&mut self, idx: usize, goal: Cell) {
        let blocked = self.blocked_cells(self.units[idx].id);
        let result = pathfinding::find_path(&self.terrain, self.units[idx].pos, goal, &blocked);
        let unit = &mut self.units[idx];
        unit.repath_ticks = 0;
        if result.steps.is_empty() {
            unit.drop_path();
            return;
        }
        unit.path = result.steps.into_iter().collect();
        unit.path_goal = Some(goal);
    }

    /// Cells under living units other than the mover
    fn blocked_cells(&self, mover: UnitId) -> AHashSet<Cell> {
        self.units
            .iter()
            .filter(|u| u.is_alive() && u.id != mover)
            .map(|u| u.pos)
            .collect()
    }

    fn advance_along_path(&mut self, idx: usize) {
        let Some(&next) = self.units[idx].path.front() else {
            return;
        };
        if !self.terrain.is_passable(next) || self.cell_blocked(next, self.units[idx].id) {
            self.units[idx].drop_path();
            return;
        }

        let speed = self.units[idx].template.speed;
        let step_chance = (speed / (self.config.speed_reference * self.terrain.cost_at(next)))
            .clamp(0.05, 1.0);
        if self.rng.gen::<f32>() >= step_chance {
            return; // Bogged down this tick
        }

        let id = self.units[idx].id;
        if self.spatial.move_unit(id, next) {
            self.units[idx].pos = next;
            self.units[idx].path.pop_front();
        } else {
            self.units[idx].drop_path();
        }
    }

    /// Any living unit (other than the mover) on the cell blocks it.
    /// Corpses awaiting the sweep do not.
    fn cell_blocked(&self, cell: Cell, mover: UnitId) -> bool {
        self.spatial.occupants(cell).iter().any(|&occ| {
            occ != mover
                && self
                    .index
                    .get(&occ)
                    .map_or(false, |&i| self.units[i].is_alive())
        })
    }

    fn nearest_visible_enemy(&self, idx: usize) -> Option<usize> {
        let me = &self.units[idx];
        let vision = self.weather.vision_radius(&self.config);
        self.spatial
            .neighbors(me.pos, vision)
            .into_iter()
            .filter_map(|id| self.index.get(&id).copied())
            .filter(|&i| {
                i != idx && self.units[i].is_alive() && self.units[i].faction != me.faction
            })
            .min_by_key(|&i| me.pos.chebyshev_distance(&self.units[i].pos))
    }

    fn nearest_enemy_anywhere(&self, idx: usize) -> Option<usize> {
        let me = &self.units[idx];
        self.units
            .iter()
            .enumerate()
            .filter(|(i, u)| *i != idx && u.is_alive() && u.faction != me.faction)
            .min_by_key(|(_, u)| me.pos.chebyshev_distance(&u.pos))
            .map(|(i, _)| i)
    }
}
