//! Scenario assembly
//!
//! A `Scenario` is a plain value describing the battlefield and the
//! order of battle; `BattleSim::from_scenario` turns it into a running
//! kernel. All one-shot transforms live here: terrain sanitising,
//! weather baked into terrain and stat templates, deployment.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::battle::healing::HealingZone;
use crate::battle::simulation::BattleSim;
use crate::battle::terrain::TerrainField;
use crate::battle::units::{Faction, UnitTemplate};
use crate::battle::weather::Weather;
use crate::core::config::BattleConfig;
use crate::core::error::Result;
use crate::core::types::Cell;

/// Axis-aligned deployment area
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl DeployRect {
    /// Default band for a faction: Cossacks along the north edge,
    /// Crown along the south, each a quarter of the map deep
    pub fn band_for(faction: Faction, map_width: u32, map_height: u32) -> Self {
        let depth = (map_height / 4).max(1);
        match faction {
            Faction::Cossack => Self {
                x: 0,
                y: 0,
                width: map_width,
                height: depth,
            },
            Faction::Crown => Self {
                x: 0,
                y: (map_height - depth) as i32,
                width: map_width,
                height: depth,
            },
        }
    }

    fn sample(&self, rng: &mut impl Rng) -> Cell {
        Cell::new(
            self.x + rng.gen_range(0..self.width.max(1) as i32),
            self.y + rng.gen_range(0..self.height.max(1) as i32),
        )
    }
}

/// One roster line: a template name and how many to field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterEntry {
    pub unit_type: String,
    pub count: u32,
    /// Deployment area; the faction's default band when absent
    pub deploy: Option<DeployRect>,
}

impl RosterEntry {
    pub fn new(unit_type: &str, count: u32) -> Self {
        Self {
            unit_type: unit_type.to_string(),
            count,
            deploy: None,
        }
    }

    pub fn at(unit_type: &str, count: u32, deploy: DeployRect) -> Self {
        Self {
            unit_type: unit_type.to_string(),
            count,
            deploy: Some(deploy),
        }
    }
}

/// Complete battle description
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub width: u32,
    pub height: u32,
    /// Row-major per-cell movement costs; short arrays pad with plain
    pub terrain_costs: Vec<f32>,
    pub weather: Weather,
    pub roster: Vec<RosterEntry>,
    /// Crown camp centers; each becomes a 3x3 healing zone
    pub camps: Vec<Cell>,
    pub seed: u64,
}

impl Scenario {
    /// The default engagement: both armies at historical proportions,
    /// a rough river valley across the middle of the field, two Crown
    /// camps behind the southern line.
    pub fn historical(width: u32, height: u32, weather: Weather, seed: u64) -> Self {
        let mut terrain_costs = vec![1.0; (width * height) as usize];
        // Marshy valley band through the center, with a harder channel
        let mid = height as usize / 2;
        for y in mid.saturating_sub(2)..=(mid + 2).min(height as usize - 1) {
            for x in 0..width as usize {
                terrain_costs[y * width as usize + x] = 1.5;
            }
        }
        for x in 0..width as usize {
            terrain_costs[mid * width as usize + x] = 2.0;
        }

        let w = width as i32;
        let h = height as i32;
        let camps = vec![Cell::new(w / 4, h - 3), Cell::new(3 * w / 4, h - 3)];

        let roster = vec![
            RosterEntry::new("Hussars", 4),
            RosterEntry::new("Pancerni", 6),
            RosterEntry::new("Reiters", 4),
            RosterEntry::new("Dragoons", 4),
            RosterEntry::new("German Infantry", 8),
            RosterEntry::new("Noble Levy", 6),
            RosterEntry::new("Camp Servants", 4),
            RosterEntry::new("Crown Artillery", 2),
            RosterEntry::new("Tatar Horse", 8),
            RosterEntry::new("Cossack Infantry", 10),
            RosterEntry::new("Chern Militia", 8),
            RosterEntry::new("Cossack Horse", 6),
            RosterEntry::new("Cossack Artillery", 2),
        ];

        Self {
            width,
            height,
            terrain_costs,
            weather,
            roster,
            camps,
            seed,
        }
    }
}

/// Weather baked into a stat template once, at enrollment
fn weather_adjusted(mut template: UnitTemplate, weather: Weather, config: &BattleConfig) -> UnitTemplate {
    template.ranged_damage *= weather.ranged_damage_factor(config);
    template.rate_of_fire *= weather.rate_of_fire_factor(config);
    template.speed = weather.adjusted_speed(template.class, template.speed);
    template
}

impl BattleSim {
    pub fn from_scenario(scenario: &Scenario, config: BattleConfig) -> Result<BattleSim> {
        config.validate()?;
        let mut terrain =
            TerrainField::from_costs(scenario.width, scenario.height, &scenario.terrain_costs)?;
        terrain.apply_weather(scenario.weather);

        let zones = scenario
            .camps
            .iter()
            .map(|&center| {
                HealingZone::around_center(center, Faction::Crown, scenario.width, scenario.height)
            })
            .collect();

        let mut sim = BattleSim::assemble(terrain, scenario.weather, zones, config, scenario.seed);

        for entry in &scenario.roster {
            let base = UnitTemplate::by_name(&entry.unit_type)?;
            let template = weather_adjusted(base, scenario.weather, &sim.config);
            let rect = entry
                .deploy
                .clone()
                .unwrap_or_else(|| DeployRect::band_for(template.faction, scenario.width, scenario.height));
            for _ in 0..entry.count {
                let cell = sim.find_spawn_cell(&rect);
                sim.add_unit(template.clone(), cell);
            }
        }

        sim.seal();
        tracing::info!(
            crown = sim.living_count(Faction::Crown),
            cossack = sim.living_count(Faction::Cossack),
            weather = ?scenario.weather,
            "battle assembled"
        );
        Ok(sim)
    }

    /// Bounded search for an empty passable cell in the deployment
    /// area, then for any passable cell on the map (shared footing
    /// allowed). Placement is advisory, never fatal: on exhaustion the
    /// unit lands on a random in-bounds cell regardless of terrain.
    fn find_spawn_cell(&mut self, rect: &DeployRect) -> Cell {
        for _ in 0..self.config.spawn_attempts {
            let cell = rect.sample(&mut self.rng);
            if self.spatial.in_bounds(cell)
                && self.terrain.is_passable(cell)
                && self.spatial.is_empty(cell)
            {
                return cell;
            }
        }

        let w = self.terrain.width() as i32;
        let h = self.terrain.height() as i32;
        for _ in 0..self.config.spawn_attempts {
            let cell = Cell::new(self.rng.gen_range(0..w), self.rng.gen_range(0..h));
            if self.terrain.is_passable(cell) {
                tracing::warn!(?cell, "deployment area saturated, spawning best-effort");
                return cell;
            }
        }

        let cell = Cell::new(self.rng.gen_range(0..w), self.rng.gen_range(0..h));
        tracing::warn!(?cell, "no passable cell found, spawning on raw ground");
        cell
    }
}
