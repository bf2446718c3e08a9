//! Session creation input

use serde::{Deserialize, Serialize};

use crate::combat::cards::GeneratedCard;
use crate::core::config::CombatConfig;
use crate::core::types::{Controller, Rank, Timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BattleMode {
    #[default]
    Standard,
    Arena,
}

fn human() -> Controller {
    Controller::Human
}

/// A player character or squad ally
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSetup {
    pub name: String,
    #[serde(default)]
    pub player_id: Option<String>,
    /// Squad allies are AI-controlled
    #[serde(default = "human")]
    pub controller: Controller,
    pub rank: Rank,
    #[serde(default)]
    pub class: Option<String>,
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
    /// Deck, already filtered by mastery; empty means level-1 cards for the weapon
    #[serde(default)]
    pub cards: Vec<GeneratedCard>,
}

impl PlayerSetup {
    pub fn new(name: &str, weapon_id: &str, rank: Rank) -> Self {
        Self {
            name: name.into(),
            player_id: None,
            controller: Controller::Human,
            rank,
            class: None,
            max_hp: 30,
            max_ap: 3,
            max_stamina: 12,
            max_morale: 20,
            armor: 0,
            initiative: 10,
            analysis_skill: 0,
            weapon_id: weapon_id.into(),
            cards: Vec::new(),
        }
    }

    pub fn ally(name: &str, weapon_id: &str, rank: Rank) -> Self {
        Self {
            controller: Controller::Ai,
            ..Self::new(name, weapon_id, rank)
        }
    }
}

/// Optional per-instance overrides of an enemy template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceOverrides {
    pub hp: Option<u32>,
    pub ap: Option<u32>,
    pub stamina: Option<u32>,
    pub morale: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnemySetup {
    pub template_id: String,
    pub rank: Rank,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub overrides: ResourceOverrides,
}

impl EnemySetup {
    pub fn new(template_id: &str, rank: Rank) -> Self {
        Self {
            template_id: template_id.into(),
            rank,
            name: None,
            overrides: ResourceOverrides::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleSetup {
    pub players: Vec<PlayerSetup>,
    pub enemies: Vec<EnemySetup>,
    #[serde(default)]
    pub zone_id: Option<String>,
    #[serde(default)]
    pub mode: BattleMode,
    /// Per-turn time budget in milliseconds
    #[serde(default)]
    pub turn_time_limit: Option<u64>,
    pub seed: u64,
    pub started_at: Timestamp,
    #[serde(default)]
    pub config: CombatConfig,
}

impl BattleSetup {
    pub fn new(players: Vec<PlayerSetup>, enemies: Vec<EnemySetup>, seed: u64) -> Self {
        Self {
            players,
            enemies,
            zone_id: None,
            mode: BattleMode::Standard,
            turn_time_limit: None,
            seed,
            started_at: 0,
            config: CombatConfig::default(),
        }
    }
}
