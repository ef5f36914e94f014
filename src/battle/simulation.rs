//! The battle kernel
//!
//! `BattleSim` owns every piece of battle state and exposes exactly
//! three things to a driver: `advance_tick`, `state` and `status`.
//! Nothing here renders, sleeps or talks to the outside world; the
//! caller decides the tick cadence.
//!
//! A tick runs in fixed phases: activation over a freshly shuffled
//! snapshot of living unit ids, heatmap accumulation, the cleanup
//! sweep (the only place dead units leave the roster), healing, then
//! status recomputation. Units killed mid-tick stay in place as
//! corpses until the sweep so activation order never invalidates the
//! snapshot.

use ahash::AHashMap;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::battle::combat;
use crate::battle::grid::SpatialIndex;
use crate::battle::healing::HealingZone;
use crate::battle::terrain::TerrainField;
use crate::battle::units::{Faction, Unit, UnitTemplate};
use crate::battle::weather::Weather;
use crate::core::config::BattleConfig;
use crate::core::types::{Cell, Tick, UnitId};

/// Battle progress as seen from outside
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BattleStatus {
    Ongoing { crown: u32, cossack: u32 },
    /// `winner` is None on mutual annihilation
    Finished { winner: Option<Faction>, survivors: u32 },
}

impl BattleStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, BattleStatus::Finished { .. })
    }
}

/// Read-only snapshot of one living unit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitReport {
    pub id: UnitId,
    pub faction: Faction,
    pub unit_type: String,
    pub pos: Cell,
    pub hp: f32,
    pub max_hp: f32,
    pub morale: f32,
    pub max_morale: f32,
    pub state: &'static str,
}

#[derive(Debug)]
pub struct BattleSim {
    pub(crate) terrain: TerrainField,
    pub(crate) spatial: SpatialIndex,
    pub(crate) units: Vec<Unit>,
    pub(crate) index: AHashMap<UnitId, usize>,
    pub(crate) healing_zones: Vec<HealingZone>,
    pub(crate) weather: Weather,
    pub(crate) config: BattleConfig,
    pub(crate) rng: ChaCha8Rng,
    pub(crate) tick: Tick,
    pub(crate) next_id: u32,
    pub(crate) status: BattleStatus,
    heatmap_crown: Vec<u32>,
    heatmap_cossack: Vec<u32>,
}

impl BattleSim {
    pub(crate) fn assemble(
        terrain: TerrainField,
        weather: Weather,
        healing_zones: Vec<HealingZone>,
        config: BattleConfig,
        seed: u64,
    ) -> Self {
        let cells = (terrain.width() * terrain.height()) as usize;
        let spatial = SpatialIndex::new(terrain.width(), terrain.height());
        Self {
            spatial,
            terrain,
            units: Vec::new(),
            index: AHashMap::new(),
            healing_zones,
            weather,
            config,
            rng: ChaCha8Rng::seed_from_u64(seed),
            tick: 0,
            next_id: 0,
            status: BattleStatus::Finished {
                winner: None,
                survivors: 0,
            },
            heatmap_crown: vec![0; cells],
            heatmap_cossack: vec![0; cells],
        }
    }

    /// Enroll a unit at full strength. Ids are sequential in spawn
    /// order, which keeps state reports stable across runs with the
    /// same seed.
    pub(crate) fn add_unit(&mut self, template: UnitTemplate, pos: Cell) -> UnitId {
        let id = UnitId(self.next_id);
        self.next_id += 1;
        let strategic_target = self.roll_strategic_target();
        let unit = Unit::new(id, template, pos, strategic_target);
        self.spatial.insert(id, pos);
        self.index.insert(id, self.units.len());
        self.units.push(unit);
        id
    }

    /// Recompute the initial status once all units are enrolled
    pub(crate) fn seal(&mut self) {
        self.status = self.compute_status();
    }

    /// A random passable rally cell, center of the map as a last resort
    pub(crate) fn roll_strategic_target(&mut self) -> Cell {
        let w = self.terrain.width() as i32;
        let h = self.terrain.height() as i32;
        for _ in 0..self.config.spawn_attempts {
            let cell = Cell::new(self.rng.gen_range(0..w), self.rng.gen_range(0..h));
            if self.terrain.is_passable(cell) {
                return cell;
            }
        }
        Cell::new(w / 2, h / 2)
    }

    /// Run one tick. A no-op once the battle is decided.
    pub fn advance_tick(&mut self) -> BattleStatus {
        if self.status.is_finished() {
            return self.status.clone();
        }
        self.tick += 1;

        let mut order: Vec<UnitId> = self
            .units
            .iter()
            .filter(|u| u.is_alive())
            .map(|u| u.id)
            .collect();
        order.shuffle(&mut self.rng);
        for id in order {
            self.step_unit(id);
        }

        self.accumulate_heatmaps();
        self.sweep_dead();
        self.apply_healing();

        self.status = self.compute_status();
        if let BattleStatus::Finished { winner, survivors } = &self.status {
            tracing::info!(
                tick = self.tick,
                winner = winner.map(|f| f.label()),
                survivors = *survivors,
                "battle decided"
            );
        }
        self.status.clone()
    }

    /// Remove the fallen and shake the morale of nearby allies.
    /// The shock fires exactly once per death, here, never during
    /// activation.
    fn sweep_dead(&mut self) {
        let dead: Vec<(UnitId, Cell, Faction)> = self
            .units
            .iter()
            .filter(|u| !u.is_alive())
            .map(|u| (u.id, u.pos, u.faction))
            .collect();
        if dead.is_empty() {
            return;
        }

        for (id, pos, faction) in &dead {
            let witnesses: Vec<usize> = self
                .spatial
                .neighbors(*pos, self.config.ally_shock_radius)
                .into_iter()
                .filter(|w| *w != *id)
                .filter_map(|w| self.index.get(&w).copied())
                .filter(|&i| self.units[i].is_alive() && self.units[i].faction == *faction)
                .collect();
            for i in witnesses {
                combat::apply_ally_death_shock(&mut self.units[i], &self.config);
            }
            self.spatial.remove(*id);
            tracing::debug!(unit = id.0, faction = faction.label(), "unit destroyed");
        }

        self.units.retain(|u| u.is_alive());
        self.index = self
            .units
            .iter()
            .enumerate()
            .map(|(i, u)| (u.id, i))
            .collect();
    }

    fn apply_healing(&mut self) {
        for zone in &self.healing_zones {
            for unit in &mut self.units {
                zone.apply(unit, &self.config);
            }
        }
    }

    fn accumulate_heatmaps(&mut self) {
        let width = self.terrain.width();
        for unit in &self.units {
            if !unit.is_alive() {
                continue;
            }
            let idx = (unit.pos.y as u32 * width + unit.pos.x as u32) as usize;
            match unit.faction {
                Faction::Crown => self.heatmap_crown[idx] += 1,
                Faction::Cossack => self.heatmap_cossack[idx] += 1,
            }
        }
    }

    fn compute_status(&self) -> BattleStatus {
        let crown = self.living_count(Faction::Crown);
        let cossack = self.living_count(Faction::Cossack);
        if crown > 0 && cossack > 0 {
            BattleStatus::Ongoing { crown, cossack }
        } else {
            let winner = if crown > 0 {
                Some(Faction::Crown)
            } else if cossack > 0 {
                Some(Faction::Cossack)
            } else {
                None
            };
            BattleStatus::Finished {
                winner,
                survivors: crown + cossack,
            }
        }
    }

    pub fn living_count(&self, faction: Faction) -> u32 {
        self.units
            .iter()
            .filter(|u| u.is_alive() && u.faction == faction)
            .count() as u32
    }

    /// Snapshot of every living unit, sorted by id. Reading never
    /// mutates; calling twice between ticks yields identical reports.
    pub fn state(&self) -> Vec<UnitReport> {
        let mut reports: Vec<UnitReport> = self
            .units
            .iter()
            .filter(|u| u.is_alive())
            .map(|u| UnitReport {
                id: u.id,
                faction: u.faction,
                unit_type: u.template.name.clone(),
                pos: u.pos,
                hp: u.hp,
                max_hp: u.template.max_hp,
                morale: u.morale,
                max_morale: u.template.max_morale,
                state: u.state.label(),
            })
            .collect();
        reports.sort_by_key(|r| r.id);
        reports
    }

    pub fn status(&self) -> &BattleStatus {
        &self.status
    }

    pub fn tick(&self) -> Tick {
        self.tick
    }

    pub fn weather(&self) -> Weather {
        self.weather
    }

    pub fn config(&self) -> &BattleConfig {
        &self.config
    }

    pub fn terrain(&self) -> &TerrainField {
        &self.terrain
    }

    /// Row-major visit counts for one faction, accumulated every tick
    pub fn heatmap(&self, faction: Faction) -> &[u32] {
        match faction {
            Faction::Crown => &self.heatmap_crown,
            Faction::Cossack => &self.heatmap_cossack,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_sim(width: u32, height: u32) -> BattleSim {
        BattleSim::assemble(
            TerrainField::open(width, height).unwrap(),
            Weather::Clear,
            Vec::new(),
            BattleConfig::default(),
            7,
        )
    }

    fn spawn(sim: &mut BattleSim, name: &str, pos: Cell) -> UnitId {
        let template = UnitTemplate::by_name(name).unwrap();
        sim.add_unit(template, pos)
    }

    #[test]
    fn test_no_units_is_a_draw() {
        let mut sim = empty_sim(10, 10);
        sim.seal();
        assert_eq!(
            sim.status(),
            &BattleStatus::Finished {
                winner: None,
                survivors: 0
            }
        );
    }

    #[test]
    fn test_one_sided_battle_finished_immediately() {
        let mut sim = empty_sim(10, 10);
        spawn(&mut sim, "Hussars", Cell::new(0, 0));
        spawn(&mut sim, "Pancerni", Cell::new(5, 5));
        sim.seal();
        assert_eq!(
            sim.status(),
            &BattleStatus::Finished {
                winner: Some(Faction::Crown),
                survivors: 2
            }
        );
        // Ticking a decided battle changes nothing
        let status = sim.advance_tick();
        assert_eq!(&status, sim.status());
        assert_eq!(sim.tick(), 0);
    }

    #[test]
    fn test_ongoing_counts_both_sides() {
        let mut sim = empty_sim(20, 20);
        spawn(&mut sim, "Hussars", Cell::new(0, 0));
        spawn(&mut sim, "Cossack Horse", Cell::new(19, 19));
        spawn(&mut sim, "Cossack Infantry", Cell::new(18, 19));
        sim.seal();
        assert_eq!(sim.status(), &BattleStatus::Ongoing { crown: 1, cossack: 2 });
    }

    #[test]
    fn test_mutual_kill_removes_both() {
        let mut sim = empty_sim(10, 10);
        let a = spawn(&mut sim, "Hussars", Cell::new(1, 1));
        let b = spawn(&mut sim, "Cossack Horse", Cell::new(2, 1));
        sim.seal();
        // Both fall in the same tick
        for unit in &mut sim.units {
            unit.hp = 0.0;
        }
        let status = sim.advance_tick();
        assert_eq!(
            status,
            BattleStatus::Finished {
                winner: None,
                survivors: 0
            }
        );
        assert!(sim.state().is_empty());
        assert_eq!(sim.spatial.position_of(a), None);
        assert_eq!(sim.spatial.position_of(b), None);
    }

    #[test]
    fn test_sweep_shocks_nearby_allies_once() {
        let mut sim = empty_sim(10, 10);
        let victim = spawn(&mut sim, "Cossack Infantry", Cell::new(5, 5));
        let near = spawn(&mut sim, "Cossack Horse", Cell::new(6, 5));
        let far = spawn(&mut sim, "Chern Militia", Cell::new(0, 9));
        let enemy = spawn(&mut sim, "German Infantry", Cell::new(5, 6));
        sim.seal();

        let vi = sim.index[&victim];
        sim.units[vi].hp = 0.0;
        let near_before = sim.units[sim.index[&near]].morale;
        let far_before = sim.units[sim.index[&far]].morale;
        let enemy_before = sim.units[sim.index[&enemy]].morale;
        let penalty = sim.config.ally_shock_penalty;

        sim.sweep_dead();

        let near_after = sim.units[sim.index[&near]].morale;
        let far_after = sim.units[sim.index[&far]].morale;
        let enemy_after = sim.units[sim.index[&enemy]].morale;
        assert_eq!(near_after, near_before - penalty);
        assert_eq!(far_after, far_before);
        assert_eq!(enemy_after, enemy_before);
        assert!(sim.index.get(&victim).is_none());
    }

    #[test]
    fn test_state_sorted_and_idempotent() {
        let mut sim = empty_sim(20, 20);
        spawn(&mut sim, "Cossack Horse", Cell::new(15, 15));
        spawn(&mut sim, "Hussars", Cell::new(0, 0));
        sim.seal();
        sim.advance_tick();

        let first = sim.state();
        let second = sim.state();
        assert_eq!(first, second);
        for pair in first.windows(2) {
            assert!(pair[0].id < pair[1].id);
        }
    }

    #[test]
    fn test_heatmap_accumulates_living_positions() {
        // Melee-only units five cells apart cannot hurt each other in
        // a single tick, so both survive to the accumulation phase
        let mut sim = empty_sim(10, 10);
        spawn(&mut sim, "Camp Servants", Cell::new(3, 3));
        spawn(&mut sim, "Chern Militia", Cell::new(8, 8));
        sim.seal();
        sim.advance_tick();

        let crown: u32 = sim.heatmap(Faction::Crown).iter().sum();
        let cossack: u32 = sim.heatmap(Faction::Cossack).iter().sum();
        assert_eq!(crown, 1);
        assert_eq!(cossack, 1);
    }

    #[test]
    fn test_same_seed_same_outcome() {
        let build = || {
            let mut sim = empty_sim(20, 20);
            spawn(&mut sim, "Hussars", Cell::new(0, 0));
            spawn(&mut sim, "German Infantry", Cell::new(1, 0));
            spawn(&mut sim, "Cossack Horse", Cell::new(19, 19));
            spawn(&mut sim, "Cossack Infantry", Cell::new(18, 19));
            sim.seal();
            sim
        };
        let mut a = build();
        let mut b = build();
        for _ in 0..40 {
            a.advance_tick();
            b.advance_tick();
        }
        assert_eq!(a.state(), b.state());
        assert_eq!(a.status(), b.status());
    }
}
