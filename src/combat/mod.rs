//! Combat rules: catalog data, combatant state and pure formulas
//!
//! Everything here is session-agnostic. The turn engine in `battle` drives
//! these types; nothing in this module knows about turn order or phases.

pub mod cards;
pub mod catalog;
pub mod combatant;
pub mod constants;
pub mod effects;
pub mod formulas;
pub mod generation;
pub mod weapons;
pub mod zone;

pub use cards::{CardTemplate, CardType, GeneratedCard, CLEAR_JAM_ID};
pub use catalog::{CombatCatalog, EnemyTemplate};
pub use combatant::{
    AiType, CombatStats, Combatant, CombatantStatus, DamageOutcome, EffectTick, EnemyProfile,
    ExhaustionLevel, Pool, Posture, ThreatTier, TurnStart, WeaponState,
};
pub use effects::{ActiveEffect, EffectKind, EffectTarget, Stat, StatusEffect};
pub use formulas::{
    crit_chance, effective_initiative, jam_probability, power_score, AttackContext,
};
pub use generation::{generate_cards, generate_standard_cards, options_for_weapon, GenerationOptions};
pub use weapons::{ColdSteelAction, DamageDice, DamageType, WeaponCategory, WeaponTemplate};
pub use zone::{StatModifier, ZoneModifier};
