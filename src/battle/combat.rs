//! Combat resolution
//!
//! Resolution functions compute outcomes without mutating the units
//! involved; the caller applies results. Only `apply_damage` and the
//! morale shocks write to a unit, and they clamp on every exit.

use rand::Rng;

use crate::battle::terrain::TerrainField;
use crate::battle::units::Unit;
use crate::battle::weather::Weather;
use crate::core::config::BattleConfig;

/// Result of one attack attempt
#[derive(Debug, Clone, Default)]
pub struct AttackOutcome {
    /// Did the attack connect?
    pub hit: bool,
    /// Raw damage before the defender's defense roll
    pub raw_damage: f32,
    /// Ammo the attacker expends
    pub ammo_spent: u32,
    /// Cooldown ticks imposed on the attacker
    pub cooldown: f32,
}

/// Attempt a ranged attack. Returns None when the attacker cannot fire
/// at all this tick (no ranged weapon, dry, or still reloading) - the
/// caller falls back to closing the distance instead.
pub fn resolve_ranged(
    attacker: &Unit,
    defender: &Unit,
    terrain: &TerrainField,
    weather: Weather,
    config: &BattleConfig,
    rng: &mut impl Rng,
) -> Option<AttackOutcome> {
    if !attacker.has_ranged() || attacker.ammo == 0 || attacker.cooldown > 0.0 {
        return None;
    }

    let mut outcome = AttackOutcome {
        ammo_spent: 1,
        cooldown: attacker.cooldown_ticks(),
        ..Default::default()
    };

    // Misfire check comes before the aim roll
    let misfire = weather.misfire_chance(config);
    if misfire > 0.0 && rng.gen::<f32>() < misfire {
        return Some(outcome);
    }

    if rng.gen::<f32>() < config.ranged_hit_chance {
        outcome.hit = true;
        let mut damage = attacker.template.ranged_damage;
        if terrain.provides_cover(defender.pos, config.cover_cost_threshold) {
            damage *= config.cover_damage_factor;
        }
        outcome.raw_damage = damage;
    }

    Some(outcome)
}

/// Resolve a melee swing. Cavalry get the charge multiplier.
pub fn resolve_melee(attacker: &Unit, config: &BattleConfig, rng: &mut impl Rng) -> AttackOutcome {
    let mut outcome = AttackOutcome::default();

    if rng.gen::<f32>() < config.melee_hit_chance {
        outcome.hit = true;
        let mut damage = attacker.template.melee_damage;
        if attacker.is_cavalry() {
            damage *= config.charge_bonus;
        }
        outcome.raw_damage = damage;
    }

    outcome
}

/// Apply raw damage to a defender: a random reduction bounded by half
/// its defense stat, never below the damage floor, plus the coupled
/// morale penalty (attenuated by discipline). Returns the hp actually
/// lost.
pub fn apply_damage(
    defender: &mut Unit,
    raw_damage: f32,
    config: &BattleConfig,
    rng: &mut impl Rng,
) -> f32 {
    let max_reduction = defender.template.defense / 2.0;
    let reduction = if max_reduction > 0.0 {
        rng.gen_range(0.0..=max_reduction)
    } else {
        0.0
    };
    let damage = (raw_damage - reduction).max(config.min_damage);

    defender.hp -= damage;

    let attenuation =
        (1.0 - defender.template.discipline * config.discipline_attenuation).max(0.0);
    defender.morale -= damage * config.morale_loss_factor * attenuation;

    defender.clamp_stats();
    damage
}

/// Flat morale penalty from watching a nearby ally die. Applied once
/// per death during the cleanup sweep, never per observer tick.
pub fn apply_ally_death_shock(observer: &mut Unit, config: &BattleConfig) {
    observer.morale -= config.ally_shock_penalty;
    observer.clamp_stats();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::units::UnitTemplate;
    use crate::core::types::{Cell, UnitId};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn unit(name: &str, pos: Cell) -> Unit {
        let template = UnitTemplate::by_name(name).unwrap();
        Unit::new(UnitId(0), template, pos, Cell::new(0, 0))
    }

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(42)
    }

    #[test]
    fn test_melee_only_unit_never_shoots() {
        let hussar = unit("Hussars", Cell::new(0, 0));
        let target = unit("Cossack Infantry", Cell::new(3, 0));
        let terrain = TerrainField::open(10, 10).unwrap();
        let cfg = BattleConfig::default();
        let result = resolve_ranged(&hussar, &target, &terrain, Weather::Clear, &cfg, &mut rng());
        assert!(result.is_none());
    }

    #[test]
    fn test_dry_unit_cannot_fire() {
        let mut reiter = unit("Reiters", Cell::new(0, 0));
        reiter.ammo = 0;
        let target = unit("Cossack Infantry", Cell::new(3, 0));
        let terrain = TerrainField::open(10, 10).unwrap();
        let cfg = BattleConfig::default();
        let result = resolve_ranged(&reiter, &target, &terrain, Weather::Clear, &cfg, &mut rng());
        assert!(result.is_none());
    }

    #[test]
    fn test_cooldown_gates_fire() {
        let mut reiter = unit("Reiters", Cell::new(0, 0));
        reiter.cooldown = 2.0;
        let target = unit("Cossack Infantry", Cell::new(3, 0));
        let terrain = TerrainField::open(10, 10).unwrap();
        let cfg = BattleConfig::default();
        let result = resolve_ranged(&reiter, &target, &terrain, Weather::Clear, &cfg, &mut rng());
        assert!(result.is_none());
    }

    #[test]
    fn test_ranged_spends_ammo_and_resets_cooldown() {
        let reiter = unit("Reiters", Cell::new(0, 0));
        let target = unit("Cossack Infantry", Cell::new(3, 0));
        let terrain = TerrainField::open(10, 10).unwrap();
        let cfg = BattleConfig::default();
        let outcome = resolve_ranged(&reiter, &target, &terrain, Weather::Clear, &cfg, &mut rng())
            .expect("reiter can fire");
        assert_eq!(outcome.ammo_spent, 1);
        assert_eq!(outcome.cooldown, reiter.cooldown_ticks());
    }

    #[test]
    fn test_cover_scales_ranged_damage() {
        let reiter = unit("Reiters", Cell::new(0, 0));
        // Target stands on rough ground (cost 2.0 > threshold 1.5)
        let target = unit("Cossack Infantry", Cell::new(1, 0));
        let costs = vec![1.0, 2.0];
        let terrain = TerrainField::from_costs(2, 1, &costs).unwrap();
        let mut cfg = BattleConfig::default();
        cfg.ranged_hit_chance = 1.0; // Force hits

        let mut r = rng();
        let outcome = resolve_ranged(&reiter, &target, &terrain, Weather::Clear, &cfg, &mut r)
            .expect("can fire");
        assert!(outcome.hit);
        assert_eq!(
            outcome.raw_damage,
            reiter.template.ranged_damage * cfg.cover_damage_factor
        );
    }

    #[test]
    fn test_rain_misfires_some_shots() {
        let reiter = unit("Reiters", Cell::new(0, 0));
        let target = unit("Cossack Infantry", Cell::new(3, 0));
        let terrain = TerrainField::open(10, 10).unwrap();
        let mut cfg = BattleConfig::default();
        cfg.ranged_hit_chance = 1.0;

        let mut r = rng();
        let mut misses = 0;
        for _ in 0..200 {
            let outcome =
                resolve_ranged(&reiter, &target, &terrain, Weather::Rain, &cfg, &mut r).unwrap();
            if !outcome.hit {
                misses += 1;
            }
        }
        // Misfire chance is 0.25; with hit chance forced to 1.0 every
        // miss is a misfire
        assert!(misses > 20 && misses < 100);
    }

    #[test]
    fn test_cavalry_charge_bonus() {
        let hussar = unit("Hussars", Cell::new(0, 0));
        let foot = unit("German Infantry", Cell::new(0, 0));
        let mut cfg = BattleConfig::default();
        cfg.melee_hit_chance = 1.0;

        let mut r = rng();
        let cavalry_hit = resolve_melee(&hussar, &cfg, &mut r);
        let infantry_hit = resolve_melee(&foot, &cfg, &mut r);
        assert_eq!(
            cavalry_hit.raw_damage,
            hussar.template.melee_damage * cfg.charge_bonus
        );
        assert_eq!(infantry_hit.raw_damage, foot.template.melee_damage);
    }

    #[test]
    fn test_damage_floor() {
        let mut defender = unit("Hussars", Cell::new(0, 0)); // Defense 8
        let cfg = BattleConfig::default();
        let mut r = rng();
        // Raw damage below any possible reduction still costs min_damage
        let dealt = apply_damage(&mut defender, 0.5, &cfg, &mut r);
        assert_eq!(dealt, cfg.min_damage);
    }

    #[test]
    fn test_damage_reduced_by_defense_roll() {
        let cfg = BattleConfig::default();
        let mut r = rng();
        let mut defender = unit("Hussars", Cell::new(0, 0)); // Defense 8
        let dealt = apply_damage(&mut defender, 50.0, &cfg, &mut r);
        assert!(dealt <= 50.0);
        assert!(dealt >= 50.0 - defender.template.defense / 2.0);
        assert_eq!(defender.hp, defender.template.max_hp - dealt);
    }

    #[test]
    fn test_morale_loss_attenuated_by_discipline() {
        let cfg = BattleConfig::default();
        // Same damage, zero defense on both
        let mut veteran = unit("German Infantry", Cell::new(0, 0)); // Discipline 95
        veteran.template.defense = 0.0;
        let mut rabble = unit("Chern Militia", Cell::new(0, 0)); // Discipline 40
        rabble.template.defense = 0.0;

        let mut r = rng();
        apply_damage(&mut veteran, 20.0, &cfg, &mut r);
        apply_damage(&mut rabble, 20.0, &cfg, &mut r);

        let veteran_loss = veteran.template.max_morale - veteran.morale;
        let rabble_loss = rabble.template.max_morale - rabble.morale;
        assert!(veteran_loss < rabble_loss);
    }

    #[test]
    fn test_hp_morale_never_negative() {
        let cfg = BattleConfig::default();
        let mut r = rng();
        let mut defender = unit("Chern Militia", Cell::new(0, 0));
        apply_damage(&mut defender, 10_000.0, &cfg, &mut r);
        assert_eq!(defender.hp, 0.0);
        assert_eq!(defender.morale, 0.0);
    }

    #[test]
    fn test_ally_death_shock_clamped() {
        let cfg = BattleConfig::default();
        let mut observer = unit("Noble Levy", Cell::new(0, 0));
        observer.morale = 4.0;
        apply_ally_death_shock(&mut observer, &cfg);
        assert_eq!(observer.morale, 0.0);
    }
}
