//! Weather and its battlefield effects
//!
//! Weather is fixed at scenario construction and never changes mid-run.

use serde::{Deserialize, Serialize};

use crate::battle::units::UnitClass;
use crate::core::config::BattleConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Weather {
    #[default]
    Clear,
    Rain, // Mud, wet powder, misfires
    Fog,  // Heavily reduced vision
}

impl Weather {
    /// Enemy search radius under this weather
    pub fn vision_radius(&self, config: &BattleConfig) -> u32 {
        match self {
            Weather::Clear => config.vision_radius_clear,
            Weather::Rain => config.vision_radius_rain,
            Weather::Fog => config.vision_radius_fog,
        }
    }

    /// Multiplier on a template's ranged damage
    pub fn ranged_damage_factor(&self, config: &BattleConfig) -> f32 {
        match self {
            Weather::Rain => config.rain_ranged_damage_factor,
            _ => 1.0,
        }
    }

    /// Chance that a ranged shot fizzles outright
    pub fn misfire_chance(&self, config: &BattleConfig) -> f32 {
        match self {
            Weather::Rain => config.rain_misfire_chance,
            _ => 0.0,
        }
    }

    /// Multiplier on a template's rate of fire
    pub fn rate_of_fire_factor(&self, config: &BattleConfig) -> f32 {
        match self {
            Weather::Rain => config.rain_rate_of_fire_factor,
            _ => 1.0,
        }
    }

    /// Speed after weather penalties for a unit class
    pub fn adjusted_speed(&self, class: UnitClass, speed: f32) -> f32 {
        match (self, class) {
            // Mud punishes horses and bogs guns down completely
            (Weather::Rain, UnitClass::Cavalry) => (speed - 3.0).max(2.0),
            (Weather::Rain, UnitClass::Artillery) => 1.0,
            _ => speed,
        }
    }
}
