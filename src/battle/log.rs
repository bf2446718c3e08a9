//! Append-only battle log

use serde::{Deserialize, Serialize};

use crate::battle::outcome::BattleOutcome;
use crate::combat::combatant::Posture;
use crate::combat::effects::EffectKind;
use crate::core::types::{CombatantId, Rank, Timestamp, Turn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BattleEventType {
    BattleStarted,
    TurnStarted {
        actor: CombatantId,
        ap: u32,
    },
    CardDrawn {
        actor: CombatantId,
        card_id: String,
    },
    DeckReshuffled {
        actor: CombatantId,
    },
    CardPlayed {
        actor: CombatantId,
        card_id: String,
        target: Option<CombatantId>,
    },
    AttackHit {
        attacker: CombatantId,
        target: CombatantId,
        damage: u32,
        critical: bool,
    },
    AttackMissed {
        attacker: CombatantId,
        target: CombatantId,
    },
    MoraleDamaged {
        target: CombatantId,
        amount: u32,
        broken: bool,
    },
    EffectApplied {
        target: CombatantId,
        effect: EffectKind,
    },
    EffectTicked {
        target: CombatantId,
        bleed: u32,
        healed: u32,
    },
    EffectExpired {
        target: CombatantId,
        effect: EffectKind,
    },
    WeaponJammed {
        actor: CombatantId,
        chance: f32,
    },
    JamCleared {
        actor: CombatantId,
    },
    Reloaded {
        actor: CombatantId,
        rounds: u32,
    },
    Moved {
        actor: CombatantId,
        from: Rank,
        to: Rank,
    },
    PostureChanged {
        actor: CombatantId,
        posture: Posture,
    },
    TurnPassed {
        actor: CombatantId,
    },
    TimerExpired {
        actor: CombatantId,
    },
    CombatantDefeated {
        id: CombatantId,
    },
    CombatantFled {
        id: CombatantId,
    },
    CombatantJoined {
        id: CombatantId,
    },
    BattleEnded {
        outcome: BattleOutcome,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleEvent {
    pub turn: Turn,
    pub at: Timestamp,
    pub event_type: BattleEventType,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BattleLog {
    events: Vec<BattleEvent>,
}

impl BattleLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, turn: Turn, at: Timestamp, event_type: BattleEventType, description: String) {
        self.events.push(BattleEvent {
            turn,
            at,
            event_type,
            description,
        });
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[BattleEvent] {
        &self.events
    }

    /// Entries appended at or after `start`
    pub fn since(&self, start: usize) -> &[BattleEvent] {
        self.events.get(start..).unwrap_or(&[])
    }
}
