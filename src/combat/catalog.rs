//! Read-only combat catalog
//!
//! Weapons, card templates, enemy templates and zones. Loaded once and
//! shared between sessions behind an `Arc`; nothing mutates it after load.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use crate::combat::cards::CardTemplate;
use crate::combat::combatant::{AiType, ThreatTier};
use crate::combat::weapons::{WeaponCategory, WeaponTemplate};
use crate::combat::zone::ZoneModifier;
use crate::core::error::{CombatError, Result};

/// Enemy stat block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyTemplate {
    pub id: String,
    pub name: String,
    pub max_hp: u32,
    pub max_ap: u32,
    pub max_stamina: u32,
    pub max_morale: u32,
    #[serde(default)]
    pub armor: u32,
    pub initiative: i32,
    #[serde(default)]
    pub analysis_skill: u32,
    pub weapon_id: String,
    pub threat_tier: ThreatTier,
    pub ai_type: AiType,
}

impl EnemyTemplate {
    #[allow(clippy::too_many_arguments)]
    fn new(
        id: &str,
        name: &str,
        (max_hp, max_ap, max_stamina, max_morale): (u32, u32, u32, u32),
        armor: u32,
        initiative: i32,
        analysis_skill: u32,
        weapon_id: &str,
        threat_tier: ThreatTier,
        ai_type: AiType,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            max_hp,
            max_ap,
            max_stamina,
            max_morale,
            armor,
            initiative,
            analysis_skill,
            weapon_id: weapon_id.into(),
            threat_tier,
            ai_type,
        }
    }

    pub fn builtin() -> Vec<EnemyTemplate> {
        vec![
            Self::new(
                "scavenger",
                "Scavenger",
                (20, 3, 8, 10),
                0,
                12,
                0,
                "combat_knife",
                ThreatTier::T1,
                AiType::Scavenger,
            ),
            Self::new(
                "raider_gunner",
                "Raider Gunner",
                (24, 3, 8, 12),
                1,
                9,
                0,
                "service_pistol",
                ThreatTier::T1,
                AiType::Scavenger,
            ),
            Self::new(
                "enforcer",
                "Enforcer",
                (35, 3, 12, 20),
                3,
                8,
                10,
                "assault_rifle",
                ThreatTier::T2,
                AiType::Enforcer,
            ),
            Self::new(
                "feral_drone",
                "Feral Drone",
                (18, 4, 10, 40),
                2,
                14,
                0,
                "fists",
                ThreatTier::T2,
                AiType::FeralDrone,
            ),
            Self::new(
                "warlord",
                "Scrap Warlord",
                (60, 4, 16, 40),
                4,
                10,
                20,
                "sawn_off",
                ThreatTier::T4,
                AiType::Boss,
            ),
        ]
    }
}

/// On-disk catalog layout
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CatalogFile {
    weapons: Vec<WeaponTemplate>,
    weapon_cards: BTreeMap<WeaponCategory, Vec<CardTemplate>>,
    common_cards: Vec<CardTemplate>,
    firearm_cards: Vec<CardTemplate>,
    enemies: Vec<EnemyTemplate>,
    zones: Vec<ZoneModifier>,
}

#[derive(Debug, Clone, Default)]
pub struct CombatCatalog {
    weapons: AHashMap<String, Arc<WeaponTemplate>>,
    weapon_cards: AHashMap<WeaponCategory, Vec<CardTemplate>>,
    common_cards: Vec<CardTemplate>,
    firearm_cards: Vec<CardTemplate>,
    enemies: AHashMap<String, EnemyTemplate>,
    zones: AHashMap<String, ZoneModifier>,
}

impl CombatCatalog {
    /// Catalog with the standard weapons, cards, enemies and zones
    pub fn builtin() -> Self {
        let mut catalog = Self::default();
        for weapon in WeaponTemplate::builtin() {
            catalog.weapons.insert(weapon.id.clone(), Arc::new(weapon));
        }
        for category in WeaponCategory::all() {
            catalog
                .weapon_cards
                .insert(*category, CardTemplate::builtin_for(*category));
        }
        catalog.common_cards = CardTemplate::builtin_common();
        catalog.firearm_cards = CardTemplate::builtin_firearm();
        for enemy in EnemyTemplate::builtin() {
            catalog.enemies.insert(enemy.id.clone(), enemy);
        }
        for zone in ZoneModifier::builtin() {
            catalog.zones.insert(zone.id.clone(), zone);
        }
        catalog
    }

    /// Parse an authored catalog; everything is validated before use
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: CatalogFile = toml::from_str(content)?;
        let mut catalog = Self::default();
        catalog.absorb(file);
        catalog.validate().map_err(CombatError::Catalog)?;
        Ok(catalog)
    }

    pub fn load_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Layer an authored catalog over this one; entries with the same id win
    pub fn extend_from_toml_str(&mut self, content: &str) -> Result<()> {
        let file: CatalogFile = toml::from_str(content)?;
        let mut merged = self.clone();
        merged.absorb(file);
        merged.validate().map_err(CombatError::Catalog)?;
        *self = merged;
        Ok(())
    }

    fn absorb(&mut self, file: CatalogFile) {
        for weapon in file.weapons {
            self.weapons.insert(weapon.id.clone(), Arc::new(weapon));
        }
        for (category, cards) in file.weapon_cards {
            let existing = self.weapon_cards.entry(category).or_default();
            for card in cards {
                upsert(existing, card);
            }
        }
        for card in file.common_cards {
            upsert(&mut self.common_cards, card);
        }
        for card in file.firearm_cards {
            upsert(&mut self.firearm_cards, card);
        }
        for enemy in file.enemies {
            self.enemies.insert(enemy.id.clone(), enemy);
        }
        for zone in file.zones {
            self.zones.insert(zone.id.clone(), zone);
        }
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        for weapon in self.weapons.values() {
            weapon.validate()?;
        }
        let cards = self
            .weapon_cards
            .values()
            .flatten()
            .chain(&self.common_cards)
            .chain(&self.firearm_cards);
        for card in cards {
            card.validate()?;
        }
        for enemy in self.enemies.values() {
            if !self.weapons.contains_key(&enemy.weapon_id) {
                return Err(format!(
                    "enemy {} uses unknown weapon {}",
                    enemy.id, enemy.weapon_id
                ));
            }
            if enemy.max_hp == 0 {
                return Err(format!("enemy {} must have HP", enemy.id));
            }
        }
        for zone in self.zones.values() {
            zone.validate()?;
        }
        Ok(())
    }

    pub fn weapon(&self, id: &str) -> Option<&Arc<WeaponTemplate>> {
        self.weapons.get(id)
    }

    pub fn enemy(&self, id: &str) -> Option<&EnemyTemplate> {
        self.enemies.get(id)
    }

    pub fn zone(&self, id: &str) -> Option<&ZoneModifier> {
        self.zones.get(id)
    }

    pub fn weapon_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.weapons.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn enemy_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.enemies.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Templates a weapon contributes, in generation order:
    /// category cards, then common cards, then firearm cards for ranged weapons
    pub fn templates_for<'a>(
        &'a self,
        weapon: &WeaponTemplate,
    ) -> impl Iterator<Item = &'a CardTemplate> + 'a {
        let category = self
            .weapon_cards
            .get(&weapon.category)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        let firearm: &[CardTemplate] = if weapon.is_ranged {
            &self.firearm_cards
        } else {
            &[]
        };
        category
            .iter()
            .chain(self.common_cards.iter())
            .chain(firearm.iter())
    }
}

fn upsert(cards: &mut Vec<CardTemplate>, card: CardTemplate) {
    match cards.iter_mut().find(|c| c.id == card.id) {
        Some(existing) => *existing = card,
        None => cards.push(card),
    }
}
