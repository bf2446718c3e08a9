//! Status effects
//!
//! Effects are a closed set of kinds with a fixed payload each. Cards carry
//! `StatusEffect` definitions; combatants carry `ActiveEffect` instances
//! counting down their remaining turns.

use serde::{Deserialize, Serialize};

use crate::core::types::CombatantId;

/// Stats that effects and zone modifiers can shift
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stat {
    Accuracy,
    Armor,
    Damage,
    Initiative,
    Analysis,
    StaminaRegen,
}

/// What an effect does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EffectKind {
    Buff { stat: Stat, amount: i32 },
    Debuff { stat: Stat, amount: i32 },
    Bleed { per_turn: u32 },
    Regen { per_turn: u32 },
    /// Removes AP at the start of the victim's next turn
    Stagger { ap_loss: u32 },
}

impl EffectKind {
    /// Signed contribution of this effect to `stat`
    pub fn stat_delta(&self, stat: Stat) -> i32 {
        match *self {
            EffectKind::Buff { stat: s, amount } if s == stat => amount,
            EffectKind::Debuff { stat: s, amount } if s == stat => -amount,
            _ => 0,
        }
    }

    pub fn is_harmful(&self) -> bool {
        matches!(
            self,
            EffectKind::Debuff { .. } | EffectKind::Bleed { .. } | EffectKind::Stagger { .. }
        )
    }
}

/// Who receives an effect when its card resolves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectTarget {
    #[default]
    Target,
    #[serde(rename = "self")]
    OnSelf,
}

/// Effect definition as authored on a card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEffect {
    #[serde(flatten)]
    pub kind: EffectKind,
    pub duration: u32,
    #[serde(default)]
    pub applies_to: EffectTarget,
}

impl StatusEffect {
    pub fn new(kind: EffectKind, duration: u32) -> Self {
        Self {
            kind,
            duration,
            applies_to: EffectTarget::Target,
        }
    }

    pub fn on_self(kind: EffectKind, duration: u32) -> Self {
        Self {
            kind,
            duration,
            applies_to: EffectTarget::OnSelf,
        }
    }

    /// Boundary check run whenever cards are authored or loaded
    pub fn validate(&self) -> Result<(), String> {
        if self.duration == 0 {
            return Err(format!("{:?}: duration must be at least 1 turn", self.kind));
        }
        let magnitude = match self.kind {
            EffectKind::Buff { amount, .. } | EffectKind::Debuff { amount, .. } => {
                if amount < 0 {
                    return Err(format!(
                        "{:?}: amount must be positive, use buff/debuff for direction",
                        self.kind
                    ));
                }
                amount as u32
            }
            EffectKind::Bleed { per_turn } | EffectKind::Regen { per_turn } => per_turn,
            EffectKind::Stagger { ap_loss } => ap_loss,
        };
        if magnitude == 0 {
            return Err(format!("{:?}: magnitude must be non-zero", self.kind));
        }
        Ok(())
    }

    pub fn activate(&self, source: CombatantId) -> ActiveEffect {
        ActiveEffect {
            kind: self.kind,
            remaining_turns: self.duration,
            source,
            fresh: true,
        }
    }
}

/// Effect currently applied to a combatant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveEffect {
    pub kind: EffectKind,
    pub remaining_turns: u32,
    pub source: CombatantId,
    /// Set until the first tick after the effect lands, which it skips
    #[serde(default)]
    pub fresh: bool,
}

/// Sum of every active effect's contribution to `stat`
pub fn total_stat_delta(effects: &[ActiveEffect], stat: Stat) -> i32 {
    effects.iter().map(|e| e.kind.stat_delta(stat)).sum()
}
