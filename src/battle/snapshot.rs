//! Read-only session view for clients

use serde::{Deserialize, Serialize};

use crate::battle::action::AvailableCard;
use crate::battle::deck::PileSizes;
use crate::battle::log::BattleEvent;
use crate::battle::outcome::BattleOutcome;
use crate::battle::phase::Phase;
use crate::battle::setup::BattleMode;
use crate::combat::cards::GeneratedCard;
use crate::combat::combatant::{Combatant, ExhaustionLevel};
use crate::core::types::{BattleId, CombatantId, Turn};

/// Pile contents are only filled in for the viewer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PileView {
    pub sizes: PileSizes,
    pub hand: Option<Vec<GeneratedCard>>,
    pub available: Option<Vec<AvailableCard>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatantView {
    #[serde(flatten)]
    pub combatant: Combatant,
    pub exhaustion: ExhaustionLevel,
    pub piles: PileView,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub battle_id: BattleId,
    pub mode: BattleMode,
    pub phase: Phase,
    pub turn: Turn,
    pub turn_order: Vec<CombatantId>,
    pub current_actor: Option<CombatantId>,
    pub zone_id: Option<String>,
    pub turn_time_remaining: Option<u64>,
    pub combatants: Vec<CombatantView>,
    pub log: Vec<BattleEvent>,
    pub outcome: Option<BattleOutcome>,
}

impl SessionSnapshot {
    pub fn combatant(&self, id: CombatantId) -> Option<&CombatantView> {
        self.combatants.iter().find(|c| c.combatant.id == id)
    }
}
