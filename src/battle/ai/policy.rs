//! Archetype-driven enemy policy

use ahash::AHashMap;
use ordered_float::OrderedFloat;
use rand::seq::SliceRandom;
use rand::RngCore;
use std::path::Path;

use crate::battle::action::{Action, AvailableCard, CardSelector};
use crate::battle::ai::archetype::{archetype_name, load_archetype_from, ArchetypeProfile};
use crate::battle::ai::{BattleView, Decision, EnemyPolicy};
use crate::combat::cards::CardType;
use crate::combat::combatant::{AiType, Combatant};
use crate::combat::formulas::{power_score, AttackContext};
use crate::core::error::Result;

/// Hit chance an attack needs at zero aggression
const MIN_HIT_AT_ZERO_AGGRESSION: f32 = 40.0;

/// Fixed-priority policy tuned by one profile per archetype
#[derive(Debug, Clone)]
pub struct ArchetypePolicy {
    profiles: AHashMap<AiType, ArchetypeProfile>,
    /// Used for AI-controlled combatants without an enemy profile
    squad: ArchetypeProfile,
}

impl Default for ArchetypePolicy {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ArchetypePolicy {
    pub fn builtin() -> Self {
        let profiles = AiType::all()
            .iter()
            .map(|t| (*t, ArchetypeProfile::builtin(*t)))
            .collect();
        Self {
            profiles,
            squad: ArchetypeProfile::squad(),
        }
    }

    /// Built-in profiles overridden by whichever archetype files exist in `dir`
    pub fn load_from(dir: &Path) -> Result<Self> {
        let mut policy = Self::builtin();
        for ai_type in AiType::all() {
            let path = dir.join(format!("{}.toml", archetype_name(*ai_type)));
            if path.exists() {
                let profile = load_archetype_from(dir, archetype_name(*ai_type))?;
                policy.profiles.insert(*ai_type, profile);
            }
        }
        if dir.join("squad.toml").exists() {
            policy.squad = load_archetype_from(dir, "squad")?;
        }
        Ok(policy)
    }

    pub fn with_profile(mut self, ai_type: AiType, profile: ArchetypeProfile) -> Self {
        self.profiles.insert(ai_type, profile);
        self
    }

    pub fn profile_for(&self, actor: &Combatant) -> &ArchetypeProfile {
        actor
            .enemy
            .as_ref()
            .and_then(|e| self.profiles.get(&e.ai_type))
            .unwrap_or(&self.squad)
    }

    fn retreat(
        &self,
        profile: &ArchetypeProfile,
        actor: &Combatant,
        view: &BattleView<'_>,
    ) -> Option<Decision> {
        if actor.morale.is_empty() && profile.can_flee {
            return Some(Decision::new(Action::Flee, "morale broken"));
        }
        let wounded = actor.hp.fraction() < profile.retreat_hp_fraction;
        let shaken = actor.morale.fraction() < profile.retreat_morale_fraction;
        if !(wounded || shaken) {
            return None;
        }
        match actor.rank.back() {
            None if profile.can_flee => Some(Decision::new(Action::Flee, "cornered at the rear")),
            Some(to) if actor.ap.has(view.reposition_cost()) => {
                Some(Decision::new(Action::Reposition { to }, "falling back"))
            }
            _ => None,
        }
    }

    fn advance(
        &self,
        profile: &ArchetypeProfile,
        actor: &Combatant,
        view: &BattleView<'_>,
    ) -> Option<Decision> {
        if profile.preferred_ranks.contains(&actor.rank) {
            return None;
        }
        let goal = profile.nearest_preferred(actor.rank)?;
        let to = actor.rank.step_toward(goal)?;
        actor
            .ap
            .has(view.reposition_cost())
            .then(|| Decision::new(Action::Reposition { to }, "moving to preferred rank"))
    }

    fn best_attack(
        &self,
        profile: &ArchetypeProfile,
        actor: &Combatant,
        view: &BattleView<'_>,
        rng: &mut dyn RngCore,
    ) -> Option<Decision> {
        let min_hit = (1.0 - profile.aggression) * MIN_HIT_AT_ZERO_AGGRESSION;
        let weapon = actor
            .weapon
            .as_ref()
            .and_then(|w| view.catalog.weapon(&w.weapon_id))
            .map(|t| &**t);

        let scored: Vec<(OrderedFloat<f32>, &AvailableCard, &Combatant)> = view
            .available
            .iter()
            .filter(|a| a.is_playable() && a.card.card_type.deals_damage())
            .filter_map(|a| {
                let target = view.weakest_opponent(actor, &a.card.optimal_ranks)?;
                let ctx = AttackContext {
                    card: &a.card,
                    weapon,
                    attacker: actor,
                    target,
                    zone: view.zone,
                };
                (ctx.hit_chance() >= min_hit).then(|| (OrderedFloat(power_score(&a.card)), a, target))
            })
            .collect();

        let top = scored.iter().map(|(score, _, _)| *score).max()?;
        let best: Vec<_> = scored.iter().filter(|(score, _, _)| *score == top).collect();
        let (_, card, target) = best.choose(rng)?;
        Some(Decision::new(
            Action::PlayCard {
                card: CardSelector::Id(card.card.id.clone()),
                target_rank: Some(target.rank),
                target: Some(target.id),
            },
            "attacking weakest target",
        ))
    }
}

fn play_first(view: &BattleView<'_>, card_type: CardType, rationale: &'static str) -> Option<Decision> {
    view.available
        .iter()
        .find(|a| a.is_playable() && a.card.card_type == card_type)
        .map(|a| {
            Decision::new(
                Action::PlayCard {
                    card: CardSelector::Id(a.card.id.clone()),
                    target_rank: None,
                    target: None,
                },
                rationale,
            )
        })
}

impl EnemyPolicy for ArchetypePolicy {
    fn choose_action(
        &self,
        actor: &Combatant,
        view: &BattleView<'_>,
        rng: &mut dyn RngCore,
    ) -> Decision {
        let profile = self.profile_for(actor);

        if let Some(decision) = self.retreat(profile, actor, view) {
            return decision;
        }
        let retreating = actor.hp.fraction() < profile.retreat_hp_fraction;
        if !retreating {
            if let Some(decision) = self.advance(profile, actor, view) {
                return decision;
            }
        }
        if let Some(decision) = play_first(view, CardType::Jammed, "clearing jam") {
            return decision;
        }
        if let Some(decision) = self.best_attack(profile, actor, view, rng) {
            return decision;
        }
        if let Some(decision) = play_first(view, CardType::Item, "reloading") {
            return decision;
        }
        if profile.aggression < 0.5 {
            if let Some(decision) = play_first(view, CardType::Defense, "bracing") {
                return decision;
            }
        }
        Decision::pass("nothing worth doing")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::action::AvailabilityContext;
    use crate::battle::deck::CardPiles;
    use crate::combat::catalog::CombatCatalog;
    use crate::combat::combatant::{EnemyProfile, Pool, ThreatTier, WeaponState};
    use crate::combat::generation::generate_standard_cards;
    use crate::core::config::CombatConfig;
    use crate::core::types::{CombatantId, Controller, Rank, Side};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn enemy(ai_type: AiType, weapon_id: &str, rank: u8, catalog: &CombatCatalog) -> Combatant {
        let mut c = Combatant::new(
            CombatantId(1),
            "Raider",
            Side::Enemy,
            Controller::Ai,
            Rank::new(rank).unwrap(),
        );
        c.weapon = Some(WeaponState::from_template(catalog.weapon(weapon_id).unwrap()));
        c.enemy = Some(EnemyProfile {
            template_id: "test".into(),
            threat_tier: ThreatTier::T1,
            ai_type,
        });
        c
    }

    fn player(rank: u8, hp: u32) -> Combatant {
        let mut c = Combatant::new(
            CombatantId(0),
            "Vera",
            Side::Player,
            Controller::Human,
            Rank::new(rank).unwrap(),
        );
        c.hp = Pool::with_current(hp, 30);
        c
    }

    fn hand_for(weapon_id: &str, catalog: &CombatCatalog) -> CardPiles {
        let mut cards = generate_standard_cards(catalog, weapon_id, "", 0);
        cards.iter_mut().for_each(|c| c.mastery_gated = false);
        CardPiles {
            hand: cards,
            ..Default::default()
        }
    }

    fn decide(actor: &Combatant, others: &[Combatant], catalog: &CombatCatalog) -> Decision {
        let config = CombatConfig::default();
        let mut combatants = others.to_vec();
        combatants.push(actor.clone());
        let piles = hand_for(&actor.weapon.as_ref().unwrap().weapon_id, catalog);
        let available = AvailabilityContext {
            actor,
            combatants: &combatants,
            zone: None,
            config: &config,
            catalog,
        }
        .available_cards(&piles);
        let view = BattleView {
            combatants: &combatants,
            available: &available,
            zone: None,
            config: &config,
            catalog,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        ArchetypePolicy::builtin().choose_action(actor, &view, &mut rng)
    }

    #[test]
    fn test_broken_morale_flees() {
        let catalog = CombatCatalog::builtin();
        let mut actor = enemy(AiType::Scavenger, "combat_knife", 2, &catalog);
        actor.morale.current = 0;
        let decision = decide(&actor, &[player(1, 30)], &catalog);
        assert_eq!(decision.action, Action::Flee);
    }

    #[test]
    fn test_wounded_steps_back() {
        let catalog = CombatCatalog::builtin();
        let mut actor = enemy(AiType::Scavenger, "combat_knife", 2, &catalog);
        actor.hp.current = 2;
        let decision = decide(&actor, &[player(1, 30)], &catalog);
        assert_eq!(
            decision.action,
            Action::Reposition {
                to: Rank::new(3).unwrap()
            }
        );
    }

    #[test]
    fn test_boss_at_rear_keeps_fighting() {
        let catalog = CombatCatalog::builtin();
        let mut actor = enemy(AiType::Boss, "sawn_off", 4, &catalog);
        actor.hp.current = 1;
        let decision = decide(&actor, &[player(1, 30)], &catalog);
        assert_ne!(decision.action, Action::Flee);
    }

    #[test]
    fn test_drone_advances_to_front() {
        let catalog = CombatCatalog::builtin();
        let actor = enemy(AiType::FeralDrone, "fists", 3, &catalog);
        let decision = decide(&actor, &[player(1, 30)], &catalog);
        assert_eq!(
            decision.action,
            Action::Reposition {
                to: Rank::new(2).unwrap()
            }
        );
    }

    #[test]
    fn test_attacks_weakest_reachable_target() {
        let catalog = CombatCatalog::builtin();
        let actor = enemy(AiType::FeralDrone, "fists", 1, &catalog);
        let mut strong = player(1, 30);
        strong.id = CombatantId(2);
        let weak = player(1, 5);
        let decision = decide(&actor, &[strong, weak], &catalog);
        match decision.action {
            Action::PlayCard { target, .. } => assert_eq!(target, Some(CombatantId(0))),
            other => panic!("expected an attack, got {:?}", other),
        }
    }

    #[test]
    fn test_jammed_weapon_gets_cleared() {
        let catalog = CombatCatalog::builtin();
        let mut actor = enemy(AiType::Enforcer, "assault_rifle", 2, &catalog);
        actor.weapon.as_mut().unwrap().is_jammed = true;
        let decision = decide(&actor, &[player(1, 30)], &catalog);
        match decision.action {
            Action::PlayCard {
                card: CardSelector::Id(id),
                ..
            } => assert!(id.ends_with("clear_jam")),
            other => panic!("expected clear jam, got {:?}", other),
        }
    }

    #[test]
    fn test_no_ap_passes() {
        let catalog = CombatCatalog::builtin();
        let mut actor = enemy(AiType::FeralDrone, "fists", 1, &catalog);
        actor.ap.current = 0;
        let decision = decide(&actor, &[player(1, 30)], &catalog);
        assert_eq!(decision.action, Action::EndTurn);
    }

    #[test]
    fn test_same_seed_same_decision() {
        let catalog = CombatCatalog::builtin();
        let actor = enemy(AiType::Enforcer, "assault_rifle", 2, &catalog);
        let first = decide(&actor, &[player(1, 30), player(2, 30)], &catalog);
        let second = decide(&actor, &[player(1, 30), player(2, 30)], &catalog);
        assert_eq!(first, second);
    }
}
