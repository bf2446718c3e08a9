//! Zone modifiers - environment effects applied for a whole battle

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::combat::cards::CardType;
use crate::combat::effects::Stat;
use crate::combat::weapons::DamageType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatModifier {
    pub stat: Stat,
    pub amount: i32,
}

/// Buffs, debuffs and cost/damage adjustments sourced from the location
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ZoneModifier {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub stat_modifiers: Vec<StatModifier>,
    /// AP delta per card type; resulting costs never drop below zero
    #[serde(default)]
    pub card_cost_modifiers: BTreeMap<CardType, i32>,
    /// Multiplier per damage type; unlisted types deal normal damage
    #[serde(default)]
    pub damage_type_multipliers: BTreeMap<DamageType, f32>,
}

impl ZoneModifier {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn stat_delta(&self, stat: Stat) -> i32 {
        self.stat_modifiers
            .iter()
            .filter(|m| m.stat == stat)
            .map(|m| m.amount)
            .sum()
    }

    pub fn adjusted_ap_cost(&self, card_type: CardType, base: u32) -> u32 {
        let delta = self.card_cost_modifiers.get(&card_type).copied().unwrap_or(0);
        (base as i64 + delta as i64).max(0) as u32
    }

    pub fn damage_multiplier(&self, damage_type: DamageType) -> f32 {
        self.damage_type_multipliers
            .get(&damage_type)
            .copied()
            .unwrap_or(1.0)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.id.is_empty() {
            return Err("zone id must not be empty".into());
        }
        for (damage_type, multiplier) in &self.damage_type_multipliers {
            if !multiplier.is_finite() || *multiplier < 0.0 {
                return Err(format!(
                    "{}: multiplier for {:?} must be a non-negative number",
                    self.id, damage_type
                ));
            }
        }
        Ok(())
    }

    /// Flooded tunnels: electrics surge, footing is poor
    pub fn flooded_tunnels() -> Self {
        let mut zone = Self::new("flooded_tunnels", "Flooded Tunnels");
        zone.stat_modifiers.push(StatModifier {
            stat: Stat::Initiative,
            amount: -2,
        });
        zone.card_cost_modifiers.insert(CardType::Movement, 1);
        zone.damage_type_multipliers.insert(DamageType::Electric, 1.5);
        zone.damage_type_multipliers.insert(DamageType::Fire, 0.5);
        zone
    }

    /// Dust storm: visibility drops, everyone shoots worse
    pub fn dust_storm() -> Self {
        let mut zone = Self::new("dust_storm", "Dust Storm");
        zone.stat_modifiers.push(StatModifier {
            stat: Stat::Accuracy,
            amount: -15,
        });
        zone.card_cost_modifiers.insert(CardType::Voice, 1);
        zone
    }

    /// Irradiated ruins: toxins linger
    pub fn irradiated_ruins() -> Self {
        let mut zone = Self::new("irradiated_ruins", "Irradiated Ruins");
        zone.stat_modifiers.push(StatModifier {
            stat: Stat::StaminaRegen,
            amount: -1,
        });
        zone.damage_type_multipliers.insert(DamageType::Toxic, 1.25);
        zone
    }

    pub fn builtin() -> Vec<ZoneModifier> {
        vec![
            Self::flooded_tunnels(),
            Self::dust_storm(),
            Self::irradiated_ruins(),
        ]
    }
}
