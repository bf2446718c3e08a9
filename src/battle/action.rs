//! Submissions, availability and per-action reports

use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::battle::deck::CardPiles;
use crate::battle::log::BattleEvent;
use crate::battle::outcome::BattleOutcome;
use crate::battle::phase::Phase;
use crate::combat::cards::{CardType, GeneratedCard};
use crate::combat::catalog::CombatCatalog;
use crate::combat::combatant::{Combatant, ExhaustionLevel};
use crate::combat::zone::ZoneModifier;
use crate::core::config::CombatConfig;
use crate::core::error::ActionRejection;
use crate::core::types::{BattleId, CombatantId, Rank, Turn};

/// Picks a card out of the actor's available list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardSelector {
    /// Position in `available_cards` (hand first, then synthetic cards)
    Index(usize),
    /// Generated card id or template id
    Id(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    PlayCard {
        card: CardSelector,
        #[serde(default)]
        target_rank: Option<Rank>,
        /// Specific target; defaults to the weakest opponent at `target_rank`
        #[serde(default)]
        target: Option<CombatantId>,
    },
    /// Move one rank without a card
    Reposition { to: Rank },
    EndTurn,
    Flee,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionSubmission {
    pub actor: CombatantId,
    pub action: Action,
}

impl ActionSubmission {
    pub fn new(actor: CombatantId, action: Action) -> Self {
        Self { actor, action }
    }

    pub fn end_turn(actor: CombatantId) -> Self {
        Self::new(actor, Action::EndTurn)
    }

    pub fn play(actor: CombatantId, index: usize, target_rank: Option<Rank>) -> Self {
        Self::new(
            actor,
            Action::PlayCard {
                card: CardSelector::Index(index),
                target_rank,
                target: None,
            },
        )
    }
}

/// Why a card cannot be played right now
#[derive(Debug, Display, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Unavailable {
    #[display(fmt = "weapon is jammed")]
    Jammed,
    #[display(fmt = "out of ammo")]
    OutOfAmmo,
    #[display(fmt = "too exhausted for stamina cards")]
    Collapsed,
    #[display(fmt = "cannot attack from {}", rank)]
    WrongRank { rank: Rank },
    #[display(fmt = "no target in range")]
    NoTargets,
    #[display(fmt = "nothing to reload")]
    NothingToReload,
    #[display(fmt = "need {} AP, have {}", need, have)]
    InsufficientAp { need: u32, have: u32 },
    #[display(fmt = "need {} stamina, have {}", need, have)]
    InsufficientStamina { need: u32, have: u32 },
    #[display(fmt = "need {} ammo, have {}", need, have)]
    InsufficientAmmo { need: u32, have: u32 },
}

impl Unavailable {
    /// The rejection a submission of this card produces
    pub fn rejection(&self, card_id: &str) -> ActionRejection {
        match *self {
            Unavailable::InsufficientAp { need, have } => {
                ActionRejection::InsufficientAp { need, have }
            }
            Unavailable::InsufficientStamina { need, have } => {
                ActionRejection::InsufficientStamina { need, have }
            }
            Unavailable::InsufficientAmmo { need, have } => {
                ActionRejection::InsufficientAmmo { need, have }
            }
            _ => ActionRejection::CardUnavailable {
                card: card_id.to_string(),
                reason: self.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardSource {
    Hand(usize),
    /// Surfaced by weapon state (clear jam, cold steel); never in a pile
    Synthetic,
}

/// A card as the actor currently sees it; `card.ap_cost` includes zone costs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailableCard {
    pub card: GeneratedCard,
    pub source: CardSource,
    pub unavailable: Option<Unavailable>,
}

impl AvailableCard {
    pub fn is_playable(&self) -> bool {
        self.unavailable.is_none()
    }
}

/// Everything availability depends on
pub struct AvailabilityContext<'a> {
    pub actor: &'a Combatant,
    pub combatants: &'a [Combatant],
    pub zone: Option<&'a ZoneModifier>,
    pub config: &'a CombatConfig,
    pub catalog: &'a CombatCatalog,
}

impl<'a> AvailabilityContext<'a> {
    /// Active opponents standing in one of `ranks`
    pub fn reachable_opponents<'b>(
        &'b self,
        ranks: &'b [Rank],
    ) -> impl Iterator<Item = &'a Combatant> + 'b {
        let side = self.actor.side.opponent();
        self.combatants
            .iter()
            .filter(move |c| c.is_active() && c.side == side && ranks.contains(&c.rank))
    }

    /// Hand cards followed by any synthetic cards the weapon state surfaces
    pub fn available_cards(&self, piles: &CardPiles) -> Vec<AvailableCard> {
        let mut cards: Vec<AvailableCard> = piles
            .hand
            .iter()
            .enumerate()
            .map(|(i, card)| self.assess(card.clone(), CardSource::Hand(i)))
            .collect();

        if let Some(weapon) = &self.actor.weapon {
            if weapon.is_jammed {
                let card = GeneratedCard::clear_jam(&weapon.weapon_id, self.config.clear_jam_ap_cost);
                cards.push(self.assess(card, CardSource::Synthetic));
            }
            let template = self.catalog.weapon(&weapon.weapon_id);
            if let Some(template) = template.filter(|t| t.is_ranged && weapon.is_empty()) {
                if let Some(action) = &template.cold_steel {
                    let card = GeneratedCard::cold_steel(&weapon.weapon_id, action);
                    cards.push(self.assess(card, CardSource::Synthetic));
                }
            }
        }
        cards
    }

    fn assess(&self, mut card: GeneratedCard, source: CardSource) -> AvailableCard {
        if let Some(zone) = self.zone {
            card.ap_cost = zone.adjusted_ap_cost(card.card_type, card.ap_cost);
        }
        let unavailable = self.check(&card);
        AvailableCard {
            card,
            source,
            unavailable,
        }
    }

    fn check(&self, card: &GeneratedCard) -> Option<Unavailable> {
        let actor = self.actor;
        let weapon = actor.weapon.as_ref();

        if card.is_ranged {
            match weapon {
                Some(w) if w.is_jammed => return Some(Unavailable::Jammed),
                Some(w) if w.is_empty() => return Some(Unavailable::OutOfAmmo),
                None => return Some(Unavailable::OutOfAmmo),
                _ => {}
            }
        }
        if card.stamina_cost > 0 && actor.exhaustion() == ExhaustionLevel::Collapsed {
            return Some(Unavailable::Collapsed);
        }

        match card.card_type {
            CardType::Attack => {
                let template = weapon.and_then(|w| self.catalog.weapon(&w.weapon_id));
                if let Some(template) = template {
                    if !template.can_attack_from(actor.rank) {
                        return Some(Unavailable::WrongRank { rank: actor.rank });
                    }
                }
            }
            CardType::Item => {
                let full = weapon
                    .and_then(|w| self.catalog.weapon(&w.weapon_id).map(|t| (w, t)))
                    .map_or(true, |(w, t)| !t.is_ranged || w.ammo >= t.magazine_size);
                if full {
                    return Some(Unavailable::NothingToReload);
                }
            }
            _ => {}
        }

        if card.card_type.targets_opponent()
            && self.reachable_opponents(&card.optimal_ranks).next().is_none()
        {
            return Some(Unavailable::NoTargets);
        }

        if !actor.ap.has(card.ap_cost) {
            return Some(Unavailable::InsufficientAp {
                need: card.ap_cost,
                have: actor.ap.current,
            });
        }
        if !actor.stamina.has(card.stamina_cost) {
            return Some(Unavailable::InsufficientStamina {
                need: card.stamina_cost,
                have: actor.stamina.current,
            });
        }
        if card.ammo_cost > 0 {
            let ammo = weapon.map_or(0, |w| w.ammo);
            if ammo < card.ammo_cost {
                return Some(Unavailable::InsufficientAmmo {
                    need: card.ammo_cost,
                    have: ammo,
                });
            }
        }
        None
    }
}

/// Result of one accepted submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionReport {
    pub battle_id: BattleId,
    pub actor: CombatantId,
    pub action: Action,
    /// Log entries this submission appended
    pub events: Vec<BattleEvent>,
    pub phase: Phase,
    pub turn: Turn,
    pub next_actor: Option<CombatantId>,
    pub drawn_card: Option<String>,
    pub outcome: Option<BattleOutcome>,
}
