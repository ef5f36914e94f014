//! Simulation configuration with documented constants
//!
//! Every combat coefficient is a config field rather than a hard-coded
//! contract, so variants can be explored without touching the kernel.

use serde::{Deserialize, Serialize};

use crate::core::error::{BattleError, Result};

/// Tunables for combat, morale, movement and healing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BattleConfig {
    // === COMBAT ===
    /// Probability that a ranged shot connects before weather effects
    pub ranged_hit_chance: f32,

    /// Probability that a melee swing connects
    pub melee_hit_chance: f32,

    /// Damage multiplier for cavalry in melee (charge bonus)
    pub charge_bonus: f32,

    /// Terrain cost above which the occupant counts as "in cover"
    ///
    /// Cover only matters against ranged fire; melee ignores it.
    pub cover_cost_threshold: f32,

    /// Ranged damage multiplier applied to a target in cover
    pub cover_damage_factor: f32,

    /// Floor for damage after defense reduction
    ///
    /// A connecting hit always costs the defender at least this much,
    /// so stacked defense can't make a unit invulnerable.
    pub min_damage: f32,

    // === WEATHER ===
    /// Chance that a ranged shot fizzles outright under rain
    pub rain_misfire_chance: f32,

    /// Multiplier on ranged damage under rain (wet powder)
    pub rain_ranged_damage_factor: f32,

    /// Multiplier on rate of fire under rain
    pub rain_rate_of_fire_factor: f32,

    // === MORALE ===
    /// Morale lost per point of hp damage taken
    pub morale_loss_factor: f32,

    /// Discipline attenuation of morale loss
    ///
    /// Effective loss = damage * morale_loss_factor
    ///                  * (1 - discipline * discipline_attenuation).
    /// At the default (1/200), a discipline-100 unit takes half the
    /// morale loss of a discipline-0 unit.
    pub discipline_attenuation: f32,

    /// Morale level below which a discipline-0 unit risks panic
    ///
    /// The per-unit threshold is `base_panic_threshold - discipline / 5`,
    /// so disciplined troops hold on at lower morale.
    pub base_panic_threshold: f32,

    /// Flat morale penalty to allies near a death
    pub ally_shock_penalty: f32,

    /// Chebyshev radius of the ally-death morale shock
    pub ally_shock_radius: u32,

    /// Fraction of max hp AND max morale a fleeing unit must recover
    /// (while on a healing cell) to return to IDLE
    pub recovery_fraction: f32,

    // === MOVEMENT ===
    /// Chebyshev distance at which melee is possible
    pub melee_range: u32,

    /// Speed at which a unit crosses plain terrain (cost 1.0) every tick
    ///
    /// Step probability = speed / (speed_reference * terrain_cost),
    /// clamped to [0.05, 1.0]. Slow units in costly terrain skip more
    /// ticks; this is a probabilistic speed model, not a move budget.
    pub speed_reference: f32,

    /// Ticks between forced path recomputations while pursuing
    pub repath_interval: u32,

    /// How far a pursuit target may drift from the planned goal
    /// before the path is recomputed early
    pub target_drift_threshold: u32,

    /// Distance at which a strategic rally point counts as reached
    /// (a new one is rolled)
    pub strategic_arrival_radius: u32,

    // === VISION ===
    /// Enemy search radius in clear weather
    pub vision_radius_clear: u32,

    /// Enemy search radius under rain
    pub vision_radius_rain: u32,

    /// Enemy search radius under fog
    pub vision_radius_fog: u32,

    // === HEALING ===
    /// Hp restored per tick on a healing cell
    pub heal_hp_per_tick: f32,

    /// Morale restored per tick on a healing cell
    pub heal_morale_per_tick: f32,

    // === SETUP ===
    /// Attempts at finding an empty passable spawn cell before
    /// falling back to best-effort placement
    pub spawn_attempts: u32,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            ranged_hit_chance: 0.6,
            melee_hit_chance: 0.6,
            charge_bonus: 1.5,
            cover_cost_threshold: 1.5,
            cover_damage_factor: 0.6,
            min_damage: 1.0,

            rain_misfire_chance: 0.25,
            rain_ranged_damage_factor: 0.3,
            rain_rate_of_fire_factor: 0.8,

            morale_loss_factor: 1.5,
            discipline_attenuation: 1.0 / 200.0,
            base_panic_threshold: 25.0,
            ally_shock_penalty: 10.0,
            ally_shock_radius: 3,
            recovery_fraction: 0.6,

            melee_range: 1,
            speed_reference: 5.0,
            repath_interval: 8,
            target_drift_threshold: 3,
            strategic_arrival_radius: 5,

            vision_radius_clear: 15,
            vision_radius_rain: 10,
            vision_radius_fog: 6,

            heal_hp_per_tick: 5.0,
            heal_morale_per_tick: 3.0,

            spawn_attempts: 75,
        }
    }
}

impl BattleConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        for (name, chance) in [
            ("ranged_hit_chance", self.ranged_hit_chance),
            ("melee_hit_chance", self.melee_hit_chance),
            ("cover_damage_factor", self.cover_damage_factor),
            ("rain_misfire_chance", self.rain_misfire_chance),
            ("rain_ranged_damage_factor", self.rain_ranged_damage_factor),
            ("rain_rate_of_fire_factor", self.rain_rate_of_fire_factor),
        ] {
            if !(0.0..=1.0).contains(&chance) {
                return Err(BattleError::InvalidConfig(format!(
                    "{name} ({chance}) must be within [0, 1]"
                )));
            }
        }

        if self.speed_reference <= 0.0 {
            return Err(BattleError::InvalidConfig(
                "speed_reference must be positive".into(),
            ));
        }

        if !(0.0..=1.0).contains(&self.recovery_fraction) || self.recovery_fraction == 0.0 {
            return Err(BattleError::InvalidConfig(format!(
                "recovery_fraction ({}) must be within (0, 1]",
                self.recovery_fraction
            )));
        }

        // Weather should only ever shrink vision
        if self.vision_radius_fog > self.vision_radius_rain
            || self.vision_radius_rain > self.vision_radius_clear
        {
            return Err(BattleError::InvalidConfig(format!(
                "vision radii must satisfy fog ({}) <= rain ({}) <= clear ({})",
                self.vision_radius_fog, self.vision_radius_rain, self.vision_radius_clear
            )));
        }

        if self.melee_range == 0 {
            return Err(BattleError::InvalidConfig(
                "melee_range must be at least 1".into(),
            ));
        }

        Ok(())
    }
}
