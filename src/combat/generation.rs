//! Card generation
//!
//! Turns a weapon's templates into concrete cards. Output depends only on
//! the catalog and the options, so cards can always be rebuilt instead of
//! being stored as the source of truth.

use serde::{Deserialize, Serialize};

use crate::combat::cards::{CardTemplate, GeneratedCard};
use crate::combat::catalog::CombatCatalog;
use crate::combat::constants::{DEFAULT_BASE_DAMAGE, DEFAULT_JAM_CHANCE};
use crate::combat::weapons::{DamageType, WeaponTemplate};
use crate::core::types::Timestamp;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationOptions {
    pub base_damage: f32,
    pub base_damage_type: DamageType,
    pub base_jam_chance: f32,
    pub id_prefix: String,
    pub timestamp: Timestamp,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            base_damage: DEFAULT_BASE_DAMAGE,
            base_damage_type: DamageType::Physical,
            base_jam_chance: DEFAULT_JAM_CHANCE,
            id_prefix: String::new(),
            timestamp: 0,
        }
    }
}

impl GenerationOptions {
    /// Replace non-finite numbers with their documented fallbacks
    fn sanitized(&self) -> (f32, f32) {
        let damage = if self.base_damage.is_finite() {
            self.base_damage
        } else {
            DEFAULT_BASE_DAMAGE
        };
        let jam = if self.base_jam_chance.is_finite() {
            self.base_jam_chance
        } else {
            DEFAULT_JAM_CHANCE
        };
        (damage, jam)
    }
}

/// Standard options for a weapon: dice average, its damage type and jam chance
pub fn options_for_weapon(weapon: &WeaponTemplate) -> GenerationOptions {
    GenerationOptions {
        base_damage: weapon.damage.average(),
        base_damage_type: weapon.damage_type,
        base_jam_chance: weapon.base_jam_chance,
        ..Default::default()
    }
}

fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

fn build_card(
    weapon: &WeaponTemplate,
    template: &CardTemplate,
    options: &GenerationOptions,
    index: usize,
) -> GeneratedCard {
    let (base_damage, base_jam) = options.sanitized();
    let multiplier = finite_or(template.damage_multiplier, 1.0);
    let bonus = finite_or(template.damage_bonus, 0.0);
    let jam_modifier = finite_or(template.jam_modifier, 0.0);

    let damage = (base_damage * multiplier + bonus).floor().max(0.0) as u32;

    GeneratedCard {
        id: format!(
            "{}{}-{}-{}-{}",
            options.id_prefix, weapon.id, template.id, options.timestamp, index
        ),
        weapon_id: weapon.id.clone(),
        template_id: template.id.clone(),
        name: template.name.clone(),
        card_type: template.card_type,
        ap_cost: template.ap_cost,
        stamina_cost: template.stamina_cost,
        ammo_cost: template.ammo_cost,
        damage,
        damage_type: template.damage_type.unwrap_or(options.base_damage_type),
        optimal_ranks: template.optimal_ranks.clone(),
        jam_modifier: (base_jam + jam_modifier).clamp(0.0, 100.0),
        effects: template.effects.clone(),
        posture: template.posture,
        is_ranged: weapon.is_ranged && template.ammo_cost > 0,
        exhausts: template.exhausts,
        mastery_gated: template.mastery,
    }
}

/// Generate every card a weapon offers; unknown weapons yield nothing
pub fn generate_cards(
    catalog: &CombatCatalog,
    weapon_id: &str,
    options: &GenerationOptions,
) -> Vec<GeneratedCard> {
    let Some(weapon) = catalog.weapon(weapon_id) else {
        return Vec::new();
    };
    catalog
        .templates_for(weapon)
        .enumerate()
        .map(|(index, template)| build_card(weapon, template, options, index))
        .collect()
}

/// `generate_cards` with the weapon's own standard options
pub fn generate_standard_cards(
    catalog: &CombatCatalog,
    weapon_id: &str,
    id_prefix: &str,
    timestamp: Timestamp,
) -> Vec<GeneratedCard> {
    let Some(weapon) = catalog.weapon(weapon_id) else {
        return Vec::new();
    };
    let options = GenerationOptions {
        id_prefix: id_prefix.into(),
        timestamp,
        ..options_for_weapon(weapon)
    };
    generate_cards(catalog, weapon_id, &options)
}
