//! Decision making for AI-controlled combatants
//!
//! Trait + data hybrid:
//! - `EnemyPolicy` is the swappable decision seam
//! - `ArchetypeProfile` holds TOML-loaded preferences per archetype
//! - `BattleView` is the read-only state a policy decides from

pub mod archetype;
pub mod policy;

pub use archetype::{archetype_name, load_archetype, load_archetype_from, ArchetypeProfile};
pub use policy::ArchetypePolicy;

use rand::RngCore;

use crate::battle::action::{Action, AvailableCard};
use crate::combat::cards::CardType;
use crate::combat::catalog::CombatCatalog;
use crate::combat::combatant::Combatant;
use crate::combat::zone::ZoneModifier;
use crate::core::config::CombatConfig;
use crate::core::types::Rank;

/// What a policy wants to do, and a short reason for the log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub action: Action,
    pub rationale: &'static str,
}

impl Decision {
    pub fn new(action: Action, rationale: &'static str) -> Self {
        Self { action, rationale }
    }

    pub fn pass(rationale: &'static str) -> Self {
        Self::new(Action::EndTurn, rationale)
    }
}

/// Read-only battle state handed to a policy
pub struct BattleView<'a> {
    pub combatants: &'a [Combatant],
    /// The acting combatant's cards with availability already worked out
    pub available: &'a [AvailableCard],
    pub zone: Option<&'a ZoneModifier>,
    pub config: &'a CombatConfig,
    pub catalog: &'a CombatCatalog,
}

impl<'a> BattleView<'a> {
    /// AP a plain one-rank reposition costs here
    pub fn reposition_cost(&self) -> u32 {
        let base = self.config.reposition_ap_cost;
        self.zone
            .map_or(base, |z| z.adjusted_ap_cost(CardType::Movement, base))
    }

    /// Lowest-HP active opponent of `actor` standing in one of `ranks`.
    ///
    /// Ties keep roster order.
    pub fn weakest_opponent(&self, actor: &Combatant, ranks: &[Rank]) -> Option<&'a Combatant> {
        let side = actor.side.opponent();
        self.combatants
            .iter()
            .filter(|c| c.is_active() && c.side == side && ranks.contains(&c.rank))
            .min_by_key(|c| (c.hp.current, c.id))
    }
}

/// Chooses one action for the acting combatant.
///
/// Must be deterministic for a given RNG state.
pub trait EnemyPolicy: Send + Sync {
    fn choose_action(
        &self,
        actor: &Combatant,
        view: &BattleView<'_>,
        rng: &mut dyn RngCore,
    ) -> Decision;
}
