//! Unit templates and runtime state
//!
//! One unit record plus a static stat template per historical unit
//! type; class-specific behavior hangs off `UnitClass` tags.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::core::error::{BattleError, Result};
use crate::core::types::{Cell, UnitId};

/// The two sides of the battle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Faction {
    Crown,
    Cossack,
}

impl Faction {
    pub fn opponent(&self) -> Faction {
        match self {
            Faction::Crown => Faction::Cossack,
            Faction::Cossack => Faction::Crown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Faction::Crown => "Crown",
            Faction::Cossack => "Cossack",
        }
    }
}

/// Broad capability class; selects charge bonuses and weather penalties
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitClass {
    Infantry,
    Cavalry,
    Artillery,
}

/// Static stat profile for one unit type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitTemplate {
    pub name: String,
    pub faction: Faction,
    pub class: UnitClass,
    pub max_hp: f32,
    pub max_morale: f32,
    pub discipline: f32,
    pub melee_damage: f32,
    pub ranged_damage: f32,
    pub range: u32,
    pub ammo: u32,
    pub defense: f32,
    pub speed: f32,
    pub rate_of_fire: f32,
}

impl UnitTemplate {
    /// Look up a template from the standard roster
    pub fn by_name(name: &str) -> Result<UnitTemplate> {
        roster()
            .into_iter()
            .find(|t| t.name == name)
            .ok_or_else(|| BattleError::UnknownUnitType(name.to_string()))
    }
}

/// The historical order of battle: a table, not a class hierarchy
pub fn roster() -> Vec<UnitTemplate> {
    use Faction::*;
    use UnitClass::*;

    let t = |name: &str, faction, class, hp, morale, discipline, melee, ranged, range, ammo,
             defense, speed, rate_of_fire| UnitTemplate {
        name: name.to_string(),
        faction,
        class,
        max_hp: hp,
        max_morale: morale,
        discipline,
        melee_damage: melee,
        ranged_damage: ranged,
        range,
        ammo,
        defense,
        speed,
        rate_of_fire,
    };

    vec![
        t("Hussars", Crown, Cavalry, 150.0, 140.0, 95.0, 100.0, 0.0, 1, 0, 8.0, 6.0, 1.0),
        t("Pancerni", Crown, Cavalry, 120.0, 110.0, 85.0, 70.0, 0.0, 1, 0, 5.0, 7.0, 1.0),
        t("Reiters", Crown, Cavalry, 110.0, 100.0, 90.0, 40.0, 30.0, 3, 12, 6.0, 6.0, 0.8),
        t("Dragoons", Crown, Cavalry, 100.0, 95.0, 85.0, 30.0, 25.0, 4, 15, 4.0, 5.0, 1.2),
        t("German Infantry", Crown, Infantry, 110.0, 100.0, 95.0, 25.0, 35.0, 5, 20, 6.0, 3.0, 1.3),
        t("Noble Levy", Crown, Cavalry, 90.0, 50.0, 20.0, 20.0, 10.0, 2, 5, 2.0, 6.0, 0.8),
        t("Camp Servants", Crown, Infantry, 60.0, 90.0, 40.0, 25.0, 0.0, 1, 0, 0.0, 5.0, 1.0),
        t("Crown Artillery", Crown, Artillery, 50.0, 90.0, 90.0, 5.0, 150.0, 15, 30, 0.0, 1.0, 0.25),
        t("Tatar Horse", Cossack, Cavalry, 85.0, 80.0, 70.0, 30.0, 15.0, 6, 40, 1.0, 9.0, 1.8),
        t("Cossack Infantry", Cossack, Infantry, 115.0, 110.0, 90.0, 35.0, 35.0, 5, 25, 3.0, 4.0, 1.4),
        t("Chern Militia", Cossack, Infantry, 70.0, 60.0, 40.0, 20.0, 0.0, 1, 0, 0.0, 5.0, 1.0),
        t("Cossack Horse", Cossack, Cavalry, 100.0, 90.0, 75.0, 50.0, 0.0, 2, 0, 3.0, 7.0, 1.0),
        t("Cossack Artillery", Cossack, Artillery, 40.0, 80.0, 80.0, 5.0, 130.0, 14, 25, 0.0, 1.0, 0.25),
    ]
}

/// Per-tick behavior state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UnitState {
    #[default]
    Idle,
    Moving,
    Attacking,
    Fleeing,
    MovingToStrategic,
}

impl UnitState {
    pub fn label(&self) -> &'static str {
        match self {
            UnitState::Idle => "IDLE",
            UnitState::Moving => "MOVING",
            UnitState::Attacking => "ATTACKING",
            UnitState::Fleeing => "FLEEING",
            UnitState::MovingToStrategic => "MOVING_TO_STRATEGIC",
        }
    }
}

/// A single combat unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    pub faction: Faction,
    pub template: UnitTemplate,

    // Position
    pub pos: Cell,

    // Runtime stats
    pub hp: f32,
    pub morale: f32,
    pub ammo: u32,
    pub cooldown: f32,

    // Behavior
    pub state: UnitState,
    pub path: VecDeque<Cell>,
    /// Where the current path was planned to (for drift detection)
    pub path_goal: Option<Cell>,
    pub strategic_target: Cell,
    pub repath_ticks: u32,
}

impl Unit {
    pub fn new(id: UnitId, template: UnitTemplate, pos: Cell, strategic_target: Cell) -> Self {
        Self {
            id,
            faction: template.faction,
            hp: template.max_hp,
            morale: template.max_morale,
            ammo: template.ammo,
            cooldown: 0.0,
            state: UnitState::Idle,
            path: VecDeque::new(),
            path_goal: None,
            strategic_target,
            repath_ticks: 0,
            pos,
            template,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0.0
    }

    pub fn is_cavalry(&self) -> bool {
        self.template.class == UnitClass::Cavalry
    }

    /// Can this unit shoot at all (stats-wise)?
    pub fn has_ranged(&self) -> bool {
        self.template.ranged_damage > 0.0 && self.template.range > 1
    }

    /// Cooldown ticks imposed after one shot
    pub fn cooldown_ticks(&self) -> f32 {
        1.0 / self.template.rate_of_fire.max(0.1)
    }

    /// Morale level below which this unit risks panic
    pub fn panic_threshold(&self, base: f32) -> f32 {
        base - self.template.discipline / 5.0
    }

    pub fn drop_path(&mut self) {
        self.path.clear();
        self.path_goal = None;
    }

    /// Clamp hp and morale to their valid ranges
    pub fn clamp_stats(&mut self) {
        self.hp = self.hp.clamp(0.0, self.template.max_hp);
        self.morale = self.morale.clamp(0.0, self.template.max_morale);
    }
}
