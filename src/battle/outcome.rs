//! Terminal outcome and the report handed to progression systems

use serde::{Deserialize, Serialize};

use crate::battle::phase::Phase;
use crate::combat::catalog::CombatCatalog;
use crate::combat::combatant::{Combatant, CombatantStatus};
use crate::combat::weapons::WeaponCategory;
use crate::core::types::{BattleId, CombatantId, Controller, Side, Timestamp, Turn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BattleOutcome {
    Victory,
    Defeat,
    Flee,
}

impl BattleOutcome {
    pub fn from_phase(phase: Phase) -> Option<Self> {
        match phase {
            Phase::Victory => Some(BattleOutcome::Victory),
            Phase::Defeat => Some(BattleOutcome::Defeat),
            Phase::Flee => Some(BattleOutcome::Flee),
            _ => None,
        }
    }
}

/// Final numbers for one participant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatantReport {
    pub id: CombatantId,
    pub name: String,
    pub side: Side,
    pub controller: Controller,
    pub player_id: Option<String>,
    pub weapon_category: Option<WeaponCategory>,
    pub status: CombatantStatus,
    pub start_hp: u32,
    pub end_hp: u32,
    pub max_hp: u32,
    pub damage_dealt: u32,
    pub damage_taken: u32,
    pub kills: u32,
    pub ammo_spent: u32,
}

impl CombatantReport {
    pub fn hp_delta(&self) -> i64 {
        i64::from(self.end_hp) - i64::from(self.start_hp)
    }
}

/// Emitted once when a battle reaches a terminal phase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleReport {
    pub battle_id: BattleId,
    pub outcome: BattleOutcome,
    pub turns: Turn,
    pub ended_at: Timestamp,
    pub combatants: Vec<CombatantReport>,
}

impl BattleReport {
    pub fn build(
        battle_id: BattleId,
        outcome: BattleOutcome,
        turns: Turn,
        ended_at: Timestamp,
        combatants: &[Combatant],
        start_hp: &[u32],
        catalog: &CombatCatalog,
    ) -> Self {
        let combatants = combatants
            .iter()
            .zip(start_hp)
            .map(|(c, start)| CombatantReport {
                id: c.id,
                name: c.name.clone(),
                side: c.side,
                controller: c.controller,
                player_id: c.player_id.clone(),
                weapon_category: c
                    .weapon
                    .as_ref()
                    .and_then(|w| catalog.weapon(&w.weapon_id))
                    .map(|t| t.category),
                status: c.status,
                start_hp: *start,
                end_hp: c.hp.current,
                max_hp: c.hp.max,
                damage_dealt: c.stats.damage_dealt,
                damage_taken: c.stats.damage_taken,
                kills: c.stats.kills,
                ammo_spent: c.stats.ammo_spent,
            })
            .collect();
        Self {
            battle_id,
            outcome,
            turns,
            ended_at,
            combatants,
        }
    }
}
