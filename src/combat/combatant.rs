//! Runtime state of one battle participant
//!
//! Every mutator clamps: HP never exceeds max, no pool goes negative.

use serde::{Deserialize, Serialize};

use crate::combat::constants::{
    DEFENSIVE_ARMOR_BONUS, EXHAUSTED_RATIO, MAX_CONDITION, WINDED_RATIO,
};
use crate::combat::effects::{total_stat_delta, ActiveEffect, EffectKind, Stat, StatusEffect};
use crate::combat::formulas::jam_probability;
use crate::combat::weapons::WeaponTemplate;
use crate::core::error::ActionRejection;
use crate::core::types::{CombatantId, Controller, Rank, Side};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Posture {
    #[default]
    Neutral,
    Aggressive,
    Defensive,
    Evasive,
}

/// Derived from stamina, never stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExhaustionLevel {
    None,
    Winded,
    Exhausted,
    Collapsed,
}

impl ExhaustionLevel {
    /// Exhaustion tier for a stamina pool
    pub fn from_stamina(current: u32, max: u32) -> Self {
        if current == 0 {
            return ExhaustionLevel::Collapsed;
        }
        if max == 0 {
            return ExhaustionLevel::None;
        }
        let ratio = current as f32 / max as f32;
        if ratio < EXHAUSTED_RATIO {
            ExhaustionLevel::Exhausted
        } else if ratio < WINDED_RATIO {
            ExhaustionLevel::Winded
        } else {
            ExhaustionLevel::None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreatTier {
    T1,
    T2,
    T3,
    T4,
}

/// Enemy behaviour archetype
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AiType {
    Scavenger,
    Enforcer,
    FeralDrone,
    Boss,
}

impl AiType {
    pub fn all() -> &'static [AiType] {
        &[
            AiType::Scavenger,
            AiType::Enforcer,
            AiType::FeralDrone,
            AiType::Boss,
        ]
    }
}

/// Enemy-only data carried by a combatant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnemyProfile {
    pub template_id: String,
    pub threat_tier: ThreatTier,
    pub ai_type: AiType,
}

/// A bounded resource (HP, AP, stamina, morale)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    pub current: u32,
    pub max: u32,
}

impl Pool {
    pub fn full(max: u32) -> Self {
        Self { current: max, max }
    }

    pub fn with_current(current: u32, max: u32) -> Self {
        Self {
            current: current.min(max),
            max,
        }
    }

    pub fn has(&self, amount: u32) -> bool {
        self.current >= amount
    }

    /// Remove up to `amount`, returning what was actually removed
    pub fn drain(&mut self, amount: u32) -> u32 {
        let removed = amount.min(self.current);
        self.current -= removed;
        removed
    }

    /// Add up to `amount`, returning what was actually added
    pub fn restore(&mut self, amount: u32) -> u32 {
        let added = amount.min(self.max - self.current);
        self.current += added;
        added
    }

    pub fn refill(&mut self) {
        self.current = self.max;
    }

    pub fn is_empty(&self) -> bool {
        self.current == 0
    }

    pub fn fraction(&self) -> f32 {
        if self.max == 0 {
            0.0
        } else {
            self.current as f32 / self.max as f32
        }
    }
}

/// Mutable part of an equipped weapon; the template is looked up by id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponState {
    pub weapon_id: String,
    pub ammo: u32,
    /// 0-100
    pub condition: f32,
    pub heat: f32,
    pub is_jammed: bool,
    /// Last computed jam probability, 0-100
    pub jam_chance: f32,
}

impl WeaponState {
    pub fn from_template(template: &WeaponTemplate) -> Self {
        let condition = template.max_condition.min(MAX_CONDITION);
        Self {
            weapon_id: template.id.clone(),
            ammo: template.magazine_size,
            condition,
            heat: 0.0,
            is_jammed: false,
            jam_chance: jam_probability(condition, 0.0, 0),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ammo == 0
    }

    /// Spend ammo for one firing action and take the heat and wear
    pub fn fire(&mut self, ammo_cost: u32, heat_per_shot: f32, wear_per_shot: f32) -> u32 {
        let spent = ammo_cost.min(self.ammo);
        self.ammo -= spent;
        self.heat += heat_per_shot * spent as f32;
        self.degrade(wear_per_shot * spent as f32);
        spent
    }

    /// Refill the magazine; returns rounds loaded
    pub fn reload(&mut self, magazine_size: u32) -> u32 {
        let loaded = magazine_size.saturating_sub(self.ammo);
        self.ammo = magazine_size.max(self.ammo);
        loaded
    }

    pub fn degrade(&mut self, amount: f32) {
        if amount.is_finite() {
            self.condition = (self.condition - amount).clamp(0.0, MAX_CONDITION);
        }
    }

    pub fn cool(&mut self, amount: f32) {
        if amount.is_finite() {
            self.heat = (self.heat - amount).max(0.0);
        }
    }

    /// Recompute `jam_chance` from the current condition and heat
    pub fn refresh_jam_chance(&mut self, analysis: u32) -> f32 {
        self.jam_chance = jam_probability(self.condition, self.heat, analysis);
        self.jam_chance
    }

    /// Roll against the jam probability; `roll` is in `0.0..100.0`.
    ///
    /// `modifier` is the firing card's flat jam modifier. Returns whether
    /// this roll jammed, not whether the weapon was already jammed.
    pub fn jam_check(&mut self, roll: f32, analysis: u32, modifier: f32) -> bool {
        let base = self.refresh_jam_chance(analysis);
        let modifier = if modifier.is_finite() { modifier } else { 0.0 };
        let chance = (base + modifier).clamp(0.0, 100.0);
        let jammed = roll < chance;
        if jammed {
            self.is_jammed = true;
        }
        jammed
    }

    /// Clear a jam without touching the magazine
    pub fn clear_jam(&mut self) {
        self.is_jammed = false;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombatantStatus {
    #[default]
    Active,
    Defeated,
    Fled,
}

/// Running totals reported when the battle ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CombatStats {
    pub damage_dealt: u32,
    pub damage_taken: u32,
    pub kills: u32,
    pub ammo_spent: u32,
    pub cards_played: u32,
}

/// Result of a damage application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageOutcome {
    pub incoming: u32,
    pub effective: u32,
    pub hp_after: u32,
    pub defeated: bool,
}

/// What the per-action effect tick did to one combatant
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EffectTick {
    pub bleed_damage: u32,
    pub healed: u32,
    pub expired: Vec<EffectKind>,
    pub defeated: bool,
}

/// What happened when a combatant became the active actor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TurnStart {
    pub ap: u32,
    pub ap_lost_to_stagger: u32,
    pub stamina_regained: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Combatant {
    pub id: CombatantId,
    pub name: String,
    pub side: Side,
    pub controller: Controller,
    /// Progression owner, for players
    #[serde(default)]
    pub player_id: Option<String>,
    #[serde(default)]
    pub class: Option<String>,
    pub rank: Rank,
    pub hp: Pool,
    pub ap: Pool,
    pub stamina: Pool,
    pub morale: Pool,
    pub armor: u32,
    pub initiative: i32,
    pub analysis_skill: u32,
    pub weapon: Option<WeaponState>,
    pub effects: Vec<ActiveEffect>,
    pub posture: Posture,
    pub enemy: Option<EnemyProfile>,
    pub status: CombatantStatus,
    pub stats: CombatStats,
}

impl Combatant {
    pub fn new(id: CombatantId, name: &str, side: Side, controller: Controller, rank: Rank) -> Self {
        Self {
            id,
            name: name.into(),
            side,
            controller,
            player_id: None,
            class: None,
            rank,
            hp: Pool::full(30),
            ap: Pool::full(3),
            stamina: Pool::full(10),
            morale: Pool::full(20),
            armor: 0,
            initiative: 10,
            analysis_skill: 0,
            weapon: None,
            effects: Vec::new(),
            posture: Posture::Neutral,
            enemy: None,
            status: CombatantStatus::Active,
            stats: CombatStats::default(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == CombatantStatus::Active
    }

    pub fn is_defeated(&self) -> bool {
        self.status == CombatantStatus::Defeated
    }

    pub fn exhaustion(&self) -> ExhaustionLevel {
        ExhaustionLevel::from_stamina(self.stamina.current, self.stamina.max)
    }

    pub fn stat_delta(&self, stat: Stat) -> i32 {
        total_stat_delta(&self.effects, stat)
    }

    /// Analysis skill including temporary buffs
    pub fn effective_analysis(&self) -> u32 {
        (self.analysis_skill as i32 + self.stat_delta(Stat::Analysis)).max(0) as u32
    }

    /// Armor including effects, posture and an external (zone) modifier
    pub fn effective_armor(&self, modifier: i32) -> u32 {
        let posture = if self.posture == Posture::Defensive {
            DEFENSIVE_ARMOR_BONUS as i32
        } else {
            0
        };
        (self.armor as i32 + self.stat_delta(Stat::Armor) + posture + modifier).max(0) as u32
    }

    /// Apply incoming damage after armor; 0 HP marks the combatant defeated
    pub fn apply_damage(&mut self, incoming: u32, armor_modifier: i32) -> DamageOutcome {
        let effective = incoming.saturating_sub(self.effective_armor(armor_modifier));
        self.lose_hp(incoming, effective)
    }

    /// Damage that ignores armor (bleeding, self-inflicted costs)
    pub fn apply_true_damage(&mut self, amount: u32) -> DamageOutcome {
        self.lose_hp(amount, amount)
    }

    fn lose_hp(&mut self, incoming: u32, effective: u32) -> DamageOutcome {
        let lost = self.hp.drain(effective);
        self.stats.damage_taken += lost;
        let defeated = self.hp.is_empty() && self.status == CombatantStatus::Active;
        if defeated {
            self.status = CombatantStatus::Defeated;
        }
        DamageOutcome {
            incoming,
            effective,
            hp_after: self.hp.current,
            defeated,
        }
    }

    pub fn heal(&mut self, amount: u32) -> u32 {
        if self.is_defeated() {
            return 0;
        }
        self.hp.restore(amount)
    }

    pub fn spend_ap(&mut self, amount: u32) -> Result<(), ActionRejection> {
        if !self.ap.has(amount) {
            return Err(ActionRejection::InsufficientAp {
                need: amount,
                have: self.ap.current,
            });
        }
        self.ap.drain(amount);
        Ok(())
    }

    pub fn spend_stamina(&mut self, amount: u32) -> Result<(), ActionRejection> {
        if !self.stamina.has(amount) {
            return Err(ActionRejection::InsufficientStamina {
                need: amount,
                have: self.stamina.current,
            });
        }
        self.stamina.drain(amount);
        Ok(())
    }

    pub fn restore_stamina(&mut self, amount: u32) -> u32 {
        self.stamina.restore(amount)
    }

    /// Morale damage; returns true when morale is broken
    pub fn damage_morale(&mut self, amount: u32) -> bool {
        self.morale.drain(amount);
        self.morale.is_empty()
    }

    pub fn move_to(&mut self, rank: Rank) {
        self.rank = rank;
    }

    /// Add an effect; an identical effect from the same source is refreshed
    pub fn add_effect(&mut self, effect: &StatusEffect, source: CombatantId) {
        if let Some(existing) = self
            .effects
            .iter_mut()
            .find(|e| e.kind == effect.kind && e.source == source)
        {
            if effect.duration >= existing.remaining_turns {
                existing.remaining_turns = effect.duration;
                existing.fresh = true;
            }
            return;
        }
        self.effects.push(effect.activate(source));
    }

    /// Apply per-tick effects, decrement counters and drop expired effects.
    ///
    /// An effect added since the previous tick only loses its fresh mark, so
    /// a one-turn effect survives the action that applied it. Stagger never
    /// counts down here; `begin_turn` consumes it.
    pub fn tick_effects(&mut self) -> EffectTick {
        let mut tick = EffectTick::default();
        if !self.is_active() {
            return tick;
        }

        let settled = || self.effects.iter().filter(|e| !e.fresh);
        let bleed: u32 = settled()
            .map(|e| match e.kind {
                EffectKind::Bleed { per_turn } => per_turn,
                _ => 0,
            })
            .sum();
        let regen: u32 = settled()
            .map(|e| match e.kind {
                EffectKind::Regen { per_turn } => per_turn,
                _ => 0,
            })
            .sum();

        if bleed > 0 {
            let outcome = self.apply_true_damage(bleed);
            tick.bleed_damage = outcome.effective;
            tick.defeated = outcome.defeated;
        }
        if regen > 0 && !tick.defeated {
            tick.healed = self.heal(regen);
        }

        for effect in &mut self.effects {
            if effect.fresh {
                effect.fresh = false;
            } else if !matches!(effect.kind, EffectKind::Stagger { .. }) {
                effect.remaining_turns = effect.remaining_turns.saturating_sub(1);
            }
        }
        tick.expired = self
            .effects
            .iter()
            .filter(|e| e.remaining_turns == 0)
            .map(|e| e.kind)
            .collect();
        self.effects.retain(|e| e.remaining_turns > 0);
        tick
    }

    /// Refresh resources as this combatant becomes the active actor.
    ///
    /// Stagger effects are consumed here.
    pub fn begin_turn(&mut self, stamina_regen: i32, heat_decay: f32) -> TurnStart {
        let stagger: u32 = self
            .effects
            .iter()
            .map(|e| match e.kind {
                EffectKind::Stagger { ap_loss } => ap_loss,
                _ => 0,
            })
            .sum();
        self.effects
            .retain(|e| !matches!(e.kind, EffectKind::Stagger { .. }));

        self.ap.refill();
        let ap_lost = self.ap.drain(stagger);

        let regen = (stamina_regen + self.stat_delta(Stat::StaminaRegen)).max(0) as u32;
        let stamina_regained = self.stamina.restore(regen);

        let analysis = self.effective_analysis();
        if let Some(weapon) = self.weapon.as_mut() {
            weapon.cool(heat_decay);
            weapon.refresh_jam_chance(analysis);
        }

        TurnStart {
            ap: self.ap.current,
            ap_lost_to_stagger: ap_lost,
            stamina_regained,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fighter() -> Combatant {
        Combatant::new(
            CombatantId(0),
            "Vera",
            Side::Player,
            Controller::Human,
            Rank::FRONT,
        )
    }

    #[test]
    fn test_lethal_damage_clamps_to_zero() {
        let mut c = fighter();
        c.hp = Pool::full(30);
        let outcome = c.apply_damage(40, 0);
        assert_eq!(outcome.hp_after, 0);
        assert_eq!(outcome.effective, 40);
        assert!(outcome.defeated);
        assert!(c.is_defeated());
    }

    #[test]
    fn test_armor_absorbs_damage() {
        let mut c = fighter();
        c.armor = 3;
        let outcome = c.apply_damage(2, 0);
        assert_eq!(outcome.effective, 0);
        assert_eq!(c.hp.current, 30);

        let outcome = c.apply_damage(10, 0);
        assert_eq!(outcome.effective, 7);
        assert_eq!(c.hp.current, 23);
    }

    #[test]
    fn test_defensive_posture_adds_armor() {
        let mut c = fighter();
        c.posture = Posture::Defensive;
        assert_eq!(c.effective_armor(0), DEFENSIVE_ARMOR_BONUS);
        assert_eq!(c.effective_armor(-10), 0);
    }

    #[test]
    fn test_heal_clamps_to_max() {
        let mut c = fighter();
        c.apply_damage(5, 0);
        assert_eq!(c.heal(100), 5);
        assert_eq!(c.hp.current, c.hp.max);
    }

    #[test]
    fn test_spend_rejects_without_mutation() {
        let mut c = fighter();
        c.ap = Pool::with_current(1, 3);
        let err = c.spend_ap(2).unwrap_err();
        assert_eq!(err, ActionRejection::InsufficientAp { need: 2, have: 1 });
        assert_eq!(c.ap.current, 1);
    }

    #[test]
    fn test_exhaustion_tracks_stamina() {
        let mut c = fighter();
        c.stamina = Pool::full(20);
        assert_eq!(c.exhaustion(), ExhaustionLevel::None);
        c.stamina.current = 9;
        assert_eq!(c.exhaustion(), ExhaustionLevel::Winded);
        c.stamina.current = 4;
        assert_eq!(c.exhaustion(), ExhaustionLevel::Exhausted);
        c.stamina.current = 0;
        assert_eq!(c.exhaustion(), ExhaustionLevel::Collapsed);
        c.restore_stamina(20);
        assert_eq!(c.exhaustion(), ExhaustionLevel::None);
    }

    #[test]
    fn test_effects_tick_and_expire() {
        let mut c = fighter();
        c.add_effect(
            &StatusEffect::new(EffectKind::Bleed { per_turn: 2 }, 2),
            CombatantId(1),
        );
        let landing = c.tick_effects();
        assert_eq!(landing.bleed_damage, 0);
        assert_eq!(c.effects[0].remaining_turns, 2);
        let first = c.tick_effects();
        assert_eq!(first.bleed_damage, 2);
        assert!(first.expired.is_empty());
        let second = c.tick_effects();
        assert_eq!(second.bleed_damage, 2);
        assert_eq!(second.expired, vec![EffectKind::Bleed { per_turn: 2 }]);
        assert!(c.effects.is_empty());
        assert_eq!(c.hp.current, 26);
    }

    #[test]
    fn test_same_effect_refreshes_instead_of_stacking() {
        let mut c = fighter();
        let effect = StatusEffect::new(EffectKind::Bleed { per_turn: 1 }, 2);
        c.add_effect(&effect, CombatantId(1));
        c.add_effect(&StatusEffect { duration: 3, ..effect }, CombatantId(1));
        assert_eq!(c.effects.len(), 1);
        assert_eq!(c.effects[0].remaining_turns, 3);
    }

    #[test]
    fn test_begin_turn_consumes_stagger() {
        let mut c = fighter();
        c.ap.current = 0;
        c.add_effect(
            &StatusEffect::new(EffectKind::Stagger { ap_loss: 1 }, 1),
            CombatantId(1),
        );
        let start = c.begin_turn(3, 10.0);
        assert_eq!(start.ap, 2);
        assert_eq!(start.ap_lost_to_stagger, 1);
        assert!(c.effects.is_empty());
    }

    #[test]
    fn test_stagger_waits_for_the_victims_turn() {
        let mut c = fighter();
        c.add_effect(
            &StatusEffect::new(EffectKind::Stagger { ap_loss: 1 }, 1),
            CombatantId(1),
        );
        for _ in 0..3 {
            assert!(c.tick_effects().expired.is_empty());
        }
        assert_eq!(c.begin_turn(3, 10.0).ap_lost_to_stagger, 1);
    }

    #[test]
    fn test_jam_then_clear_keeps_ammo() {
        let mut weapon = WeaponState::from_template(&WeaponTemplate::service_pistol());
        weapon.condition = 40.0;
        weapon.heat = 50.0;
        assert!(weapon.jam_check(10.0, 0, 0.0));
        assert_eq!(weapon.jam_chance, 17.0);
        let ammo = weapon.ammo;
        weapon.clear_jam();
        assert!(!weapon.is_jammed);
        assert_eq!(weapon.ammo, ammo);
    }

    #[test]
    fn test_jam_roll_above_chance_does_not_jam() {
        let mut weapon = WeaponState::from_template(&WeaponTemplate::service_pistol());
        weapon.condition = 40.0;
        weapon.heat = 50.0;
        assert!(!weapon.jam_check(17.0, 0, 0.0));
    }

    #[test]
    fn test_jam_check_reports_this_roll_only() {
        let mut weapon = WeaponState::from_template(&WeaponTemplate::service_pistol());
        weapon.condition = 40.0;
        weapon.heat = 50.0;
        weapon.is_jammed = true;
        assert!(!weapon.jam_check(90.0, 0, 0.0));
        assert!(weapon.is_jammed);
    }

    #[test]
    fn test_one_turn_effect_outlives_the_tick_it_lands_on() {
        let mut c = fighter();
        c.add_effect(
            &StatusEffect::on_self(
                EffectKind::Buff {
                    stat: Stat::Armor,
                    amount: 2,
                },
                1,
            ),
            CombatantId(0),
        );
        let base = c.armor;
        assert!(c.tick_effects().expired.is_empty());
        assert_eq!(c.effective_armor(0), base + 2);
        let next = c.tick_effects();
        assert_eq!(next.expired.len(), 1);
        assert_eq!(c.effective_armor(0), base);
    }

    #[test]
    fn test_fire_consumes_ammo_and_wears() {
        let mut weapon = WeaponState::from_template(&WeaponTemplate::service_pistol());
        let spent = weapon.fire(2, 15.0, 2.0);
        assert_eq!(spent, 2);
        assert_eq!(weapon.ammo, 6);
        assert_eq!(weapon.heat, 30.0);
        assert_eq!(weapon.condition, 96.0);
        assert_eq!(weapon.reload(8), 2);
        assert_eq!(weapon.ammo, 8);
    }
}
