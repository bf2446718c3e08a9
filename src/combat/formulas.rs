//! Pure combat formulas
//!
//! Nothing here mutates state or draws randomness. The session rolls and
//! feeds the results through these functions.

use crate::combat::cards::GeneratedCard;
use crate::combat::combatant::{Combatant, ExhaustionLevel, Posture};
use crate::combat::constants::*;
use crate::combat::effects::{EffectKind, Stat};
use crate::combat::weapons::WeaponTemplate;
use crate::combat::zone::ZoneModifier;

/// Jam probability in percent, always within 0-100.
///
/// `P = (100 - condition) * 0.2 + heat * 0.1 - analysis * 0.5`
pub fn jam_probability(condition: f32, heat: f32, analysis: u32) -> f32 {
    let condition = if condition.is_nan() {
        MAX_CONDITION
    } else {
        condition.clamp(0.0, MAX_CONDITION)
    };
    let heat = if heat.is_nan() { 0.0 } else { heat.max(0.0) };
    let raw = (MAX_CONDITION - condition) * JAM_CONDITION_FACTOR + heat * JAM_HEAT_FACTOR
        - analysis as f32 * JAM_ANALYSIS_FACTOR;
    raw.clamp(0.0, 100.0)
}

pub fn exhaustion_accuracy_penalty(level: ExhaustionLevel) -> i32 {
    match level {
        ExhaustionLevel::None => 0,
        ExhaustionLevel::Winded => WINDED_ACCURACY_PENALTY,
        ExhaustionLevel::Exhausted | ExhaustionLevel::Collapsed => EXHAUSTED_ACCURACY_PENALTY,
    }
}

pub fn exhaustion_damage_factor(level: ExhaustionLevel) -> f32 {
    match level {
        ExhaustionLevel::Exhausted | ExhaustionLevel::Collapsed => EXHAUSTED_DAMAGE_FACTOR,
        _ => 1.0,
    }
}

pub fn zone_delta(zone: Option<&ZoneModifier>, stat: Stat) -> i32 {
    zone.map(|z| z.stat_delta(stat)).unwrap_or(0)
}

/// Initiative used for turn order
pub fn effective_initiative(combatant: &Combatant, zone: Option<&ZoneModifier>) -> i32 {
    combatant.initiative
        + combatant.stat_delta(Stat::Initiative)
        + zone_delta(zone, Stat::Initiative)
}

/// Everything an attack roll looks at
#[derive(Debug, Clone, Copy)]
pub struct AttackContext<'a> {
    pub card: &'a GeneratedCard,
    pub weapon: Option<&'a WeaponTemplate>,
    pub attacker: &'a Combatant,
    pub target: &'a Combatant,
    pub zone: Option<&'a ZoneModifier>,
}

impl<'a> AttackContext<'a> {
    /// Hit chance in percent, clamped to 0-100
    pub fn hit_chance(&self) -> f32 {
        let (accuracy, penalty) = match self.weapon {
            Some(weapon) => (weapon.accuracy, weapon.rank_penalty(self.target.rank)),
            None => (UNARMED_ACCURACY, 0),
        };
        let evasion = if self.target.posture == Posture::Evasive {
            EVASIVE_ACCURACY_PENALTY
        } else {
            0
        };
        let chance = accuracy - penalty
            + self.attacker.stat_delta(Stat::Accuracy)
            + zone_delta(self.zone, Stat::Accuracy)
            - exhaustion_accuracy_penalty(self.attacker.exhaustion())
            - evasion;
        chance.clamp(0, 100) as f32
    }

    /// Damage before the target's armor
    pub fn damage(&self, critical: bool, crit_multiplier: f32) -> u32 {
        let flat = self.card.damage as i32
            + self.attacker.stat_delta(Stat::Damage)
            + zone_delta(self.zone, Stat::Damage);
        let mut damage = flat.max(0) as f32;
        if self.attacker.posture == Posture::Aggressive {
            damage *= AGGRESSIVE_DAMAGE_FACTOR;
        }
        damage *= exhaustion_damage_factor(self.attacker.exhaustion());
        if let Some(zone) = self.zone {
            damage *= zone.damage_multiplier(self.card.damage_type);
        }
        if critical {
            damage *= crit_multiplier;
        }
        damage.floor().max(0.0) as u32
    }
}

/// Critical chance in percent for the attacker's current posture
pub fn crit_chance(attacker: &Combatant, base: f32) -> f32 {
    let bonus = if attacker.posture == Posture::Aggressive {
        AGGRESSIVE_CRIT_BONUS
    } else {
        0.0
    };
    (base + bonus).clamp(0.0, 100.0)
}

fn effect_value(kind: &EffectKind, duration: u32) -> f32 {
    let per_turn = match *kind {
        EffectKind::Bleed { per_turn } | EffectKind::Regen { per_turn } => per_turn as f32,
        EffectKind::Stagger { ap_loss } => ap_loss as f32 * 3.0,
        EffectKind::Buff { amount, .. } | EffectKind::Debuff { amount, .. } => amount as f32 / 5.0,
    };
    per_turn * duration as f32
}

/// Rough worth of a card, used by the AI to rank options
pub fn power_score(card: &GeneratedCard) -> f32 {
    let effects: f32 = card
        .effects
        .iter()
        .map(|e| effect_value(&e.kind, e.duration))
        .sum();
    card.damage as f32 + effects * POWER_EFFECT_WEIGHT
        - (card.ap_cost + card.stamina_cost) as f32 * POWER_COST_WEIGHT
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::cards::CardType;
    use crate::combat::combatant::Pool;
    use crate::combat::effects::StatusEffect;
    use crate::combat::weapons::DamageType;
    use crate::core::types::{ranks, CombatantId, Controller, Rank, Side};

    fn card(damage: u32) -> GeneratedCard {
        GeneratedCard {
            id: "c".into(),
            weapon_id: "service_pistol".into(),
            template_id: "snap_shot".into(),
            name: "Snap Shot".into(),
            card_type: CardType::Attack,
            ap_cost: 1,
            stamina_cost: 0,
            ammo_cost: 1,
            damage,
            damage_type: DamageType::Ballistic,
            optimal_ranks: ranks(&[1, 2, 3, 4]),
            jam_modifier: 0.0,
            effects: Vec::new(),
            posture: None,
            is_ranged: true,
            exhausts: false,
            mastery_gated: false,
        }
    }

    fn fighter(id: u32, side: Side, rank: Rank) -> Combatant {
        Combatant::new(CombatantId(id), "x", side, Controller::Ai, rank)
    }

    #[test]
    fn test_jam_probability_scenario() {
        assert_eq!(jam_probability(40.0, 50.0, 0), 17.0);
    }

    #[test]
    fn test_jam_probability_clamped() {
        assert_eq!(jam_probability(100.0, 0.0, 100), 0.0);
        assert_eq!(jam_probability(0.0, 10_000.0, 0), 100.0);
        assert_eq!(jam_probability(f32::NAN, f32::NAN, 0), 0.0);
        assert_eq!(jam_probability(50.0, f32::INFINITY, 0), 100.0);
    }

    #[test]
    fn test_hit_chance_includes_rank_penalty_and_evasion() {
        let weapon = WeaponTemplate::service_pistol();
        let attack = card(8);
        let attacker = fighter(0, Side::Player, Rank::FRONT);
        let mut target = fighter(1, Side::Enemy, Rank::REAR);
        let ctx = AttackContext {
            card: &attack,
            weapon: Some(&weapon),
            attacker: &attacker,
            target: &target,
            zone: None,
        };
        assert_eq!(ctx.hit_chance(), 65.0);

        target.posture = Posture::Evasive;
        let ctx = AttackContext {
            card: &attack,
            weapon: Some(&weapon),
            attacker: &attacker,
            target: &target,
            zone: None,
        };
        assert_eq!(ctx.hit_chance(), 50.0);
    }

    #[test]
    fn test_hit_chance_zone_and_exhaustion() {
        let weapon = WeaponTemplate::service_pistol();
        let attack = card(8);
        let mut attacker = fighter(0, Side::Player, Rank::FRONT);
        attacker.stamina = Pool::with_current(4, 10);
        let target = fighter(1, Side::Enemy, Rank::FRONT);
        let zone = ZoneModifier::dust_storm();
        let ctx = AttackContext {
            card: &attack,
            weapon: Some(&weapon),
            attacker: &attacker,
            target: &target,
            zone: Some(&zone),
        };
        // 80 - 15 (dust) - 10 (winded)
        assert_eq!(ctx.hit_chance(), 55.0);
    }

    #[test]
    fn test_damage_modifiers_stack() {
        let attack = card(10);
        let mut attacker = fighter(0, Side::Player, Rank::FRONT);
        let target = fighter(1, Side::Enemy, Rank::FRONT);
        attacker.posture = Posture::Aggressive;
        let ctx = AttackContext {
            card: &attack,
            weapon: None,
            attacker: &attacker,
            target: &target,
            zone: None,
        };
        assert_eq!(ctx.damage(false, 1.5), 12);
        assert_eq!(ctx.damage(true, 1.5), 18);

        attacker.posture = Posture::Neutral;
        attacker.stamina = Pool::with_current(1, 10);
        let ctx = AttackContext {
            card: &attack,
            weapon: None,
            attacker: &attacker,
            target: &target,
            zone: None,
        };
        assert_eq!(ctx.damage(false, 1.5), 7);
    }

    #[test]
    fn test_zone_damage_multiplier() {
        let mut attack = card(10);
        attack.damage_type = DamageType::Electric;
        let attacker = fighter(0, Side::Player, Rank::FRONT);
        let target = fighter(1, Side::Enemy, Rank::FRONT);
        let zone = ZoneModifier::flooded_tunnels();
        let ctx = AttackContext {
            card: &attack,
            weapon: None,
            attacker: &attacker,
            target: &target,
            zone: Some(&zone),
        };
        assert_eq!(ctx.damage(false, 1.5), 15);
    }

    #[test]
    fn test_crit_chance_aggressive() {
        let mut attacker = fighter(0, Side::Player, Rank::FRONT);
        assert_eq!(crit_chance(&attacker, 5.0), 5.0);
        attacker.posture = Posture::Aggressive;
        assert_eq!(crit_chance(&attacker, 5.0), 15.0);
    }

    #[test]
    fn test_power_score_rewards_effects() {
        let plain = card(8);
        let mut bleeding = card(8);
        bleeding
            .effects
            .push(StatusEffect::new(EffectKind::Bleed { per_turn: 2 }, 2));
        assert!(power_score(&bleeding) > power_score(&plain));
    }

    #[test]
    fn test_effective_initiative_with_zone() {
        let c = fighter(0, Side::Player, Rank::FRONT);
        let zone = ZoneModifier::flooded_tunnels();
        assert_eq!(effective_initiative(&c, Some(&zone)), 8);
        assert_eq!(effective_initiative(&c, None), 10);
    }
}
