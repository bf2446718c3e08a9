//! Battle session: the turn engine
//!
//! A session owns every combatant, their card piles, the phase machine and
//! the seeded RNG. Submissions are validated against `&self`, applied to a
//! clone and only then committed, so a rejected or failed action never
//! leaves a half-applied state behind.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::battle::action::{
    Action, ActionReport, ActionSubmission, AvailabilityContext, AvailableCard, CardSelector,
    CardSource,
};
use crate::battle::ai::{BattleView, EnemyPolicy};
use crate::battle::deck::CardPiles;
use crate::battle::log::{BattleEvent, BattleEventType, BattleLog};
use crate::battle::outcome::{BattleOutcome, BattleReport};
use crate::battle::phase::{transition, Phase, PhaseEvent};
use crate::battle::setup::{BattleMode, BattleSetup, EnemySetup, PlayerSetup};
use crate::battle::snapshot::{CombatantView, PileView, SessionSnapshot};
use crate::battle::turn_order::{compute_turn_order, first_active, next_actor};
use crate::combat::cards::{CardType, GeneratedCard};
use crate::combat::catalog::CombatCatalog;
use crate::combat::combatant::{
    Combatant, CombatantStatus, EnemyProfile, Pool, ThreatTier, WeaponState,
};
use crate::combat::effects::{EffectTarget, Stat};
use crate::combat::formulas::{crit_chance, zone_delta, AttackContext};
use crate::combat::generation::generate_standard_cards;
use crate::combat::zone::ZoneModifier;
use crate::core::config::CombatConfig;
use crate::core::error::{ActionRejection, CombatError, Result};
use crate::core::types::{BattleId, CombatantId, Controller, Rank, Side, Timestamp, Turn};
use crate::mastery::record::MasteryRecord;
use crate::mastery::table::unlock_level;
use crate::mastery::tracker::filter_unlocked;

/// Upper bound on consecutive AI actions in one `run_ai_turns` call
pub const MAX_AI_ACTIONS: usize = 500;

/// Mastery level an enemy's gated cards are unlocked to, by threat tier
fn tier_mastery_level(tier: ThreatTier) -> u8 {
    match tier {
        ThreatTier::T1 => 1,
        ThreatTier::T2 => 3,
        ThreatTier::T3 => 6,
        ThreatTier::T4 => 10,
    }
}

fn side_event(side: Side) -> PhaseEvent {
    match side {
        Side::Player => PhaseEvent::PlayerUp,
        Side::Enemy => PhaseEvent::EnemyUp,
    }
}

/// A validated submission, ready to apply
#[derive(Debug, Clone)]
enum Plan {
    Play {
        available: AvailableCard,
        target_rank: Option<Rank>,
        target: Option<CombatantId>,
    },
    Reposition {
        to: Rank,
        cost: u32,
    },
    Pass,
    Flee,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BattleSession {
    id: BattleId,
    mode: BattleMode,
    /// `CombatantId(i)` is always `combatants[i]`
    combatants: Vec<Combatant>,
    /// Parallel to `combatants`
    piles: Vec<CardPiles>,
    /// HP when each combatant entered the battle
    start_hp: Vec<u32>,
    zone: Option<ZoneModifier>,
    turn: Turn,
    phase: Phase,
    turn_order: Vec<CombatantId>,
    current_actor_index: usize,
    turn_time_limit: Option<u64>,
    turn_time_remaining: Option<u64>,
    log: BattleLog,
    created_at: Timestamp,
    updated_at: Timestamp,
    rng: ChaCha8Rng,
    config: CombatConfig,
    report_emitted: bool,
    outcome: Option<BattleOutcome>,
}

fn build_player(
    id: CombatantId,
    setup: &PlayerSetup,
    catalog: &CombatCatalog,
    now: Timestamp,
) -> Result<(Combatant, Vec<GeneratedCard>)> {
    let weapon = catalog
        .weapon(&setup.weapon_id)
        .ok_or_else(|| CombatError::Catalog(format!("unknown weapon {}", setup.weapon_id)))?;

    let mut c = Combatant::new(id, &setup.name, Side::Player, setup.controller, setup.rank);
    c.player_id = setup.player_id.clone();
    c.class = setup.class.clone();
    c.hp = Pool::full(setup.max_hp);
    c.ap = Pool::full(setup.max_ap);
    c.stamina = Pool::full(setup.max_stamina);
    c.morale = Pool::full(setup.max_morale);
    c.armor = setup.armor;
    c.initiative = setup.initiative;
    c.analysis_skill = setup.analysis_skill;
    c.weapon = Some(WeaponState::from_template(weapon));

    let cards = if setup.cards.is_empty() {
        let owner = setup.player_id.as_deref().unwrap_or(&setup.name);
        let record = MasteryRecord::new(owner, weapon.category, now);
        let prefix = format!("c{}-", id.0);
        filter_unlocked(
            &generate_standard_cards(catalog, &weapon.id, &prefix, now),
            Some(&record),
        )
    } else {
        setup.cards.clone()
    };
    Ok((c, cards))
}

fn build_enemy(
    id: CombatantId,
    setup: &EnemySetup,
    catalog: &CombatCatalog,
    now: Timestamp,
) -> Result<(Combatant, Vec<GeneratedCard>)> {
    let template = catalog
        .enemy(&setup.template_id)
        .ok_or_else(|| CombatError::Catalog(format!("unknown enemy {}", setup.template_id)))?;
    let weapon = catalog
        .weapon(&template.weapon_id)
        .ok_or_else(|| CombatError::Catalog(format!("unknown weapon {}", template.weapon_id)))?;

    let name = setup.name.as_deref().unwrap_or(&template.name);
    let mut c = Combatant::new(id, name, Side::Enemy, Controller::Ai, setup.rank);
    let o = setup.overrides;
    c.hp = Pool::full(o.hp.unwrap_or(template.max_hp));
    c.ap = Pool::full(o.ap.unwrap_or(template.max_ap));
    c.stamina = Pool::full(o.stamina.unwrap_or(template.max_stamina));
    c.morale = Pool::full(o.morale.unwrap_or(template.max_morale));
    c.armor = template.armor;
    c.initiative = template.initiative;
    c.analysis_skill = template.analysis_skill;
    c.weapon = Some(WeaponState::from_template(weapon));
    c.enemy = Some(EnemyProfile {
        template_id: template.id.clone(),
        threat_tier: template.threat_tier,
        ai_type: template.ai_type,
    });
    if c.hp.max == 0 {
        return Err(CombatError::Config(format!("{} must start with HP", c.name)));
    }

    let level = tier_mastery_level(template.threat_tier);
    let prefix = format!("c{}-", id.0);
    let cards = generate_standard_cards(catalog, &weapon.id, &prefix, now)
        .into_iter()
        .filter(|card| {
            !card.mastery_gated
                || unlock_level(weapon.category, &card.template_id).map_or(false, |l| l <= level)
        })
        .collect();
    Ok((c, cards))
}

impl BattleSession {
    /// Build a session and activate the first actor
    pub fn new(setup: &BattleSetup, catalog: &CombatCatalog) -> Result<Self> {
        setup.config.validate().map_err(CombatError::Config)?;
        if !setup.players.iter().any(|p| p.controller == Controller::Human) {
            return Err(CombatError::Config(
                "a battle needs at least one human-controlled player".into(),
            ));
        }
        if setup.enemies.is_empty() {
            return Err(CombatError::Config("a battle needs at least one enemy".into()));
        }
        let zone = match &setup.zone_id {
            Some(id) => Some(
                catalog
                    .zone(id)
                    .cloned()
                    .ok_or_else(|| CombatError::Catalog(format!("unknown zone {}", id)))?,
            ),
            None => None,
        };

        let now = setup.started_at;
        let mut built = Vec::with_capacity(setup.players.len() + setup.enemies.len());
        for player in &setup.players {
            let id = CombatantId(built.len() as u32);
            built.push(build_player(id, player, catalog, now)?);
        }
        for enemy in &setup.enemies {
            let id = CombatantId(built.len() as u32);
            built.push(build_enemy(id, enemy, catalog, now)?);
        }

        let mut rng = ChaCha8Rng::seed_from_u64(setup.seed);
        let mut combatants = Vec::with_capacity(built.len());
        let mut piles = Vec::with_capacity(built.len());
        for (combatant, cards) in built {
            let mut pile = CardPiles::new(cards, &mut rng);
            for _ in 0..setup.config.opening_hand_size {
                pile.draw(&mut rng);
            }
            combatants.push(combatant);
            piles.push(pile);
        }
        let start_hp = combatants.iter().map(|c| c.hp.current).collect();
        let turn_order = compute_turn_order(&combatants, zone.as_ref());

        let mut session = Self {
            id: BattleId::new(),
            mode: setup.mode,
            combatants,
            piles,
            start_hp,
            zone,
            turn: 1,
            phase: Phase::Initiative,
            turn_order,
            current_actor_index: 0,
            turn_time_limit: setup.turn_time_limit,
            turn_time_remaining: None,
            log: BattleLog::new(),
            created_at: now,
            updated_at: now,
            rng,
            config: setup.config.clone(),
            report_emitted: false,
            outcome: None,
        };

        let names: Vec<&str> = session.combatants.iter().map(|c| c.name.as_str()).collect();
        let description = format!("Battle begins: {}", names.join(", "));
        session.record(BattleEventType::BattleStarted, description);
        info!(
            "Battle {} started with {} combatants",
            session.id,
            session.combatants.len()
        );

        let first = {
            let combatants = &session.combatants;
            first_active(&session.turn_order, 0, |id| {
                combatants.get(id.0 as usize).map_or(false, Combatant::is_active)
            })
        }
        .ok_or_else(|| CombatError::CorruptState("no combatant can act".into()))?;
        session.current_actor_index = first;
        let side = session.combatant_at(first)?.side;
        session.fire(side_event(side))?;
        session.begin_actor_turn();
        Ok(session)
    }

    // === ACCESSORS ===

    pub fn id(&self) -> BattleId {
        self.id
    }

    pub fn mode(&self) -> BattleMode {
        self.mode
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn turn(&self) -> Turn {
        self.turn
    }

    pub fn turn_order(&self) -> &[CombatantId] {
        &self.turn_order
    }

    pub fn combatants(&self) -> &[Combatant] {
        &self.combatants
    }

    pub fn combatant(&self, id: CombatantId) -> Option<&Combatant> {
        self.combatants.get(id.0 as usize)
    }

    /// Direct access for scenario setup and tooling; bypasses validation
    pub fn combatant_mut(&mut self, id: CombatantId) -> Option<&mut Combatant> {
        self.combatants.get_mut(id.0 as usize)
    }

    pub fn piles(&self, id: CombatantId) -> Option<&CardPiles> {
        self.piles.get(id.0 as usize)
    }

    /// Direct access for scenario setup and tooling; bypasses validation
    pub fn piles_mut(&mut self, id: CombatantId) -> Option<&mut CardPiles> {
        self.piles.get_mut(id.0 as usize)
    }

    pub fn zone(&self) -> Option<&ZoneModifier> {
        self.zone.as_ref()
    }

    pub fn config(&self) -> &CombatConfig {
        &self.config
    }

    pub fn log(&self) -> &[BattleEvent] {
        self.log.events()
    }

    pub fn outcome(&self) -> Option<BattleOutcome> {
        self.outcome
    }

    pub fn is_finished(&self) -> bool {
        self.phase.is_terminal()
    }

    pub fn turn_time_remaining(&self) -> Option<u64> {
        self.turn_time_remaining
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    /// The combatant whose turn it is, while the battle accepts actions
    pub fn current_actor(&self) -> Option<CombatantId> {
        if !self.phase.accepts_actions() {
            return None;
        }
        self.turn_order.get(self.current_actor_index).copied()
    }

    fn combatant_at(&self, order_index: usize) -> Result<&Combatant> {
        self.turn_order
            .get(order_index)
            .and_then(|id| self.combatant(*id))
            .ok_or_else(|| CombatError::CorruptState(format!("turn order slot {} is empty", order_index)))
    }

    fn name_of(&self, id: CombatantId) -> &str {
        self.combatant(id).map_or("?", |c| c.name.as_str())
    }

    fn availability<'a>(
        &'a self,
        actor: &'a Combatant,
        catalog: &'a CombatCatalog,
    ) -> AvailabilityContext<'a> {
        AvailabilityContext {
            actor,
            combatants: &self.combatants,
            zone: self.zone.as_ref(),
            config: &self.config,
            catalog,
        }
    }

    /// Hand cards plus synthetic cards, each with its availability
    pub fn available_cards(
        &self,
        id: CombatantId,
        catalog: &CombatCatalog,
    ) -> std::result::Result<Vec<AvailableCard>, ActionRejection> {
        let actor = self.combatant(id).ok_or(ActionRejection::UnknownActor(id))?;
        let piles = self
            .piles(id)
            .ok_or(ActionRejection::UnknownActor(id))?;
        Ok(self.availability(actor, catalog).available_cards(piles))
    }

    // === SUBMISSION ===

    /// Validate and apply on a copy; `self` is untouched either way
    pub fn preview(
        &self,
        submission: &ActionSubmission,
        catalog: &CombatCatalog,
        now: Timestamp,
    ) -> Result<(BattleSession, ActionReport)> {
        let plan = match self.validate(submission, catalog) {
            Ok(plan) => plan,
            Err(rejection) => {
                warn!(
                    "Battle {}: {} rejected: {}",
                    self.id, submission.actor, rejection
                );
                return Err(rejection.into());
            }
        };
        let mut next = self.clone();
        let log_start = next.log.len();
        let report = next.apply(submission, plan, catalog, now, log_start)?;
        Ok((next, report))
    }

    /// Validate, apply and commit one submission
    pub fn submit(
        &mut self,
        submission: &ActionSubmission,
        catalog: &CombatCatalog,
        now: Timestamp,
    ) -> Result<ActionReport> {
        let (next, report) = self.preview(submission, catalog, now)?;
        *self = next;
        Ok(report)
    }

    /// Pass the turn
    pub fn end_turn(
        &mut self,
        actor: CombatantId,
        catalog: &CombatCatalog,
        now: Timestamp,
    ) -> Result<ActionReport> {
        self.submit(&ActionSubmission::end_turn(actor), catalog, now)
    }

    fn validate(
        &self,
        submission: &ActionSubmission,
        catalog: &CombatCatalog,
    ) -> std::result::Result<Plan, ActionRejection> {
        if !self.phase.accepts_actions() {
            return Err(ActionRejection::BattleNotActive);
        }
        let actor = self
            .combatant(submission.actor)
            .ok_or(ActionRejection::UnknownActor(submission.actor))?;
        let expected = self.current_actor().ok_or(ActionRejection::BattleNotActive)?;
        if expected != submission.actor {
            return Err(ActionRejection::NotYourTurn {
                expected,
                actual: submission.actor,
            });
        }

        match &submission.action {
            Action::EndTurn => Ok(Plan::Pass),
            Action::Flee => Ok(Plan::Flee),
            Action::Reposition { to } => {
                if actor.rank.distance(*to) != 1 {
                    return Err(ActionRejection::InvalidReposition {
                        from: actor.rank,
                        to: *to,
                    });
                }
                let cost = self.reposition_cost();
                if !actor.ap.has(cost) {
                    return Err(ActionRejection::InsufficientAp {
                        need: cost,
                        have: actor.ap.current,
                    });
                }
                Ok(Plan::Reposition { to: *to, cost })
            }
            Action::PlayCard {
                card,
                target_rank,
                target,
            } => {
                let available = self.available_cards(actor.id, catalog)?;
                let chosen = match card {
                    CardSelector::Index(index) => available
                        .get(*index)
                        .ok_or(ActionRejection::InvalidCardIndex(*index))?,
                    CardSelector::Id(id) => available
                        .iter()
                        .find(|a| a.card.id == *id)
                        .or_else(|| available.iter().find(|a| a.card.template_id == *id))
                        .ok_or_else(|| ActionRejection::UnknownCard(id.clone()))?,
                };
                if let Some(reason) = &chosen.unavailable {
                    return Err(reason.rejection(&chosen.card.id));
                }
                let target = self.resolve_target(actor, &chosen.card, *target_rank, *target)?;
                Ok(Plan::Play {
                    available: chosen.clone(),
                    target_rank: *target_rank,
                    target,
                })
            }
        }
    }

    fn reposition_cost(&self) -> u32 {
        let base = self.config.reposition_ap_cost;
        self.zone
            .as_ref()
            .map_or(base, |z| z.adjusted_ap_cost(CardType::Movement, base))
    }

    /// Check the requested target and pick one when only a rank was given
    fn resolve_target(
        &self,
        actor: &Combatant,
        card: &GeneratedCard,
        target_rank: Option<Rank>,
        target: Option<CombatantId>,
    ) -> std::result::Result<Option<CombatantId>, ActionRejection> {
        if card.card_type == CardType::Movement {
            let to = target_rank.ok_or(ActionRejection::MissingTarget)?;
            if to == actor.rank {
                return Err(ActionRejection::InvalidReposition {
                    from: actor.rank,
                    to,
                });
            }
            if !card.optimal_ranks.contains(&to) {
                return Err(ActionRejection::InvalidTargetRank(to));
            }
            return Ok(None);
        }
        if !card.card_type.targets_opponent() {
            return Ok(None);
        }

        let opponent = actor.side.opponent();
        if let Some(id) = target {
            let chosen = self
                .combatant(id)
                .filter(|c| c.is_active() && c.side == opponent)
                .ok_or(ActionRejection::UnknownTarget(id))?;
            if let Some(rank) = target_rank.filter(|r| *r != chosen.rank) {
                return Err(ActionRejection::NoTargetAtRank(rank));
            }
            if !card.optimal_ranks.contains(&chosen.rank) {
                return Err(ActionRejection::InvalidTargetRank(chosen.rank));
            }
            return Ok(Some(id));
        }

        let rank = target_rank.ok_or(ActionRejection::MissingTarget)?;
        if !card.optimal_ranks.contains(&rank) {
            return Err(ActionRejection::InvalidTargetRank(rank));
        }
        self.combatants
            .iter()
            .filter(|c| c.is_active() && c.side == opponent && c.rank == rank)
            .min_by_key(|c| (c.hp.current, c.id))
            .map(|c| Some(c.id))
            .ok_or(ActionRejection::NoTargetAtRank(rank))
    }

    // === APPLICATION ===

    fn record(&mut self, event_type: BattleEventType, description: String) {
        self.log
            .push(self.turn, self.updated_at, event_type, description);
    }

    fn fire(&mut self, event: PhaseEvent) -> Result<()> {
        self.phase = transition(self.phase, event).ok_or_else(|| {
            CombatError::CorruptState(format!("no transition from {:?} on {:?}", self.phase, event))
        })?;
        Ok(())
    }

    fn apply(
        &mut self,
        submission: &ActionSubmission,
        plan: Plan,
        catalog: &CombatCatalog,
        now: Timestamp,
        log_start: usize,
    ) -> Result<ActionReport> {
        self.updated_at = now;
        let actor_id = submission.actor;
        let idx = actor_id.0 as usize;
        debug!("Battle {}: {} applies {:?}", self.id, actor_id, submission.action);

        match plan {
            Plan::Pass => {
                let description = format!("{} ends their turn", self.name_of(actor_id));
                self.record(BattleEventType::TurnPassed { actor: actor_id }, description);
            }
            Plan::Flee => {
                self.combatants[idx].status = CombatantStatus::Fled;
                let description = format!("{} flees the battle", self.name_of(actor_id));
                self.record(BattleEventType::CombatantFled { id: actor_id }, description);
            }
            Plan::Reposition { to, cost } => {
                let actor = &mut self.combatants[idx];
                actor.spend_ap(cost)?;
                let from = actor.rank;
                actor.move_to(to);
                let description = format!("{} moves from {} to {}", actor.name, from, to);
                self.record(
                    BattleEventType::Moved {
                        actor: actor_id,
                        from,
                        to,
                    },
                    description,
                );
            }
            Plan::Play {
                available,
                target_rank,
                target,
            } => self.play_card(actor_id, available, target_rank, target, catalog)?,
        }

        let drawn_card = self.finish_action()?;
        Ok(ActionReport {
            battle_id: self.id,
            actor: actor_id,
            action: submission.action.clone(),
            events: self.log.since(log_start).to_vec(),
            phase: self.phase,
            turn: self.turn,
            next_actor: self.current_actor(),
            drawn_card,
            outcome: self.outcome,
        })
    }

    fn play_card(
        &mut self,
        actor_id: CombatantId,
        available: AvailableCard,
        target_rank: Option<Rank>,
        target: Option<CombatantId>,
        catalog: &CombatCatalog,
    ) -> Result<()> {
        let idx = actor_id.0 as usize;
        let card = available.card;
        {
            let actor = &mut self.combatants[idx];
            actor.spend_ap(card.ap_cost)?;
            actor.spend_stamina(card.stamina_cost)?;
            actor.stats.cards_played += 1;
        }
        if let CardSource::Hand(index) = available.source {
            self.piles[idx]
                .play_from_hand(index, card.exhausts)
                .ok_or_else(|| CombatError::CorruptState(format!("hand slot {} vanished", index)))?;
        }
        let description = match target {
            Some(t) => format!("{} plays {} on {}", self.name_of(actor_id), card.name, self.name_of(t)),
            None => format!("{} plays {}", self.name_of(actor_id), card.name),
        };
        self.record(
            BattleEventType::CardPlayed {
                actor: actor_id,
                card_id: card.id.clone(),
                target,
            },
            description,
        );

        let landed = match card.card_type {
            CardType::Attack | CardType::ColdSteel | CardType::Debt => {
                let target = target.ok_or(ActionRejection::MissingTarget)?;
                self.resolve_attack(actor_id, &card, target, catalog)?
            }
            CardType::Voice => {
                let target = target.ok_or(ActionRejection::MissingTarget)?;
                let victim = &mut self.combatants[target.0 as usize];
                let broken = victim.damage_morale(card.damage);
                let description = if broken {
                    format!("{}'s morale breaks", victim.name)
                } else {
                    format!("{} loses {} morale", victim.name, card.damage)
                };
                self.record(
                    BattleEventType::MoraleDamaged {
                        target,
                        amount: card.damage,
                        broken,
                    },
                    description,
                );
                true
            }
            CardType::Movement => {
                let to = target_rank.ok_or(ActionRejection::MissingTarget)?;
                let actor = &mut self.combatants[idx];
                let from = actor.rank;
                actor.move_to(to);
                let description = format!("{} moves from {} to {}", actor.name, from, to);
                self.record(
                    BattleEventType::Moved {
                        actor: actor_id,
                        from,
                        to,
                    },
                    description,
                );
                true
            }
            CardType::Posture => {
                if let Some(posture) = card.posture {
                    let actor = &mut self.combatants[idx];
                    actor.posture = posture;
                    let description = format!("{} takes a {:?} posture", actor.name, posture);
                    self.record(
                        BattleEventType::PostureChanged {
                            actor: actor_id,
                            posture,
                        },
                        description,
                    );
                }
                true
            }
            CardType::Item => {
                let actor = &mut self.combatants[idx];
                let magazine = actor
                    .weapon
                    .as_ref()
                    .and_then(|w| catalog.weapon(&w.weapon_id))
                    .map_or(0, |t| t.magazine_size);
                if let Some(weapon) = actor.weapon.as_mut() {
                    let rounds = weapon.reload(magazine);
                    let description = format!("{} reloads {} rounds", actor.name, rounds);
                    self.record(
                        BattleEventType::Reloaded {
                            actor: actor_id,
                            rounds,
                        },
                        description,
                    );
                }
                true
            }
            CardType::Jammed => {
                let actor = &mut self.combatants[idx];
                if let Some(weapon) = actor.weapon.as_mut() {
                    weapon.clear_jam();
                }
                let description = format!("{} clears their weapon", actor.name);
                self.record(BattleEventType::JamCleared { actor: actor_id }, description);
                true
            }
            CardType::Defense | CardType::Reaction | CardType::Analysis => true,
        };

        for effect in &card.effects {
            let on_self = effect.applies_to == EffectTarget::OnSelf
                || !card.card_type.targets_opponent()
                || card.card_type == CardType::Debt;
            let recipient = if on_self {
                Some(actor_id)
            } else if landed {
                target
            } else {
                None
            };
            let Some(recipient) = recipient else {
                continue;
            };
            let holder = &mut self.combatants[recipient.0 as usize];
            if !holder.is_active() {
                continue;
            }
            holder.add_effect(effect, actor_id);
            let description = format!("{} gains {:?}", holder.name, effect.kind);
            self.record(
                BattleEventType::EffectApplied {
                    target: recipient,
                    effect: effect.kind,
                },
                description,
            );
        }
        Ok(())
    }

    /// Jam roll, shot, hit roll, crit roll, damage. Returns whether it hit.
    fn resolve_attack(
        &mut self,
        actor_id: CombatantId,
        card: &GeneratedCard,
        target_id: CombatantId,
        catalog: &CombatCatalog,
    ) -> Result<bool> {
        let a = actor_id.0 as usize;
        let t = target_id.0 as usize;
        let template = self.combatants[a]
            .weapon
            .as_ref()
            .and_then(|w| catalog.weapon(&w.weapon_id))
            .cloned();

        if card.is_ranged {
            let roll: f32 = self.rng.gen_range(0.0..100.0);
            let (heat, wear) = (self.config.heat_per_shot, self.config.wear_per_shot);
            let actor = &mut self.combatants[a];
            let analysis = actor.effective_analysis();
            let mut jammed = None;
            if let Some(weapon) = actor.weapon.as_mut() {
                if weapon.jam_check(roll, analysis, card.jam_modifier) {
                    jammed = Some(weapon.jam_chance);
                }
                actor.stats.ammo_spent += weapon.fire(card.ammo_cost, heat, wear);
            }
            if let Some(chance) = jammed {
                let description = format!("{}'s weapon jams", self.name_of(actor_id));
                self.record(
                    BattleEventType::WeaponJammed {
                        actor: actor_id,
                        chance,
                    },
                    description,
                );
            }
        }

        let (hit_chance, crit) = {
            let attacker = &self.combatants[a];
            let ctx = AttackContext {
                card,
                weapon: template.as_deref(),
                attacker,
                target: &self.combatants[t],
                zone: self.zone.as_ref(),
            };
            (ctx.hit_chance(), crit_chance(attacker, self.config.base_crit_chance))
        };
        let hit_roll: f32 = self.rng.gen_range(0.0..100.0);
        if hit_roll >= hit_chance {
            let description = format!(
                "{} misses {}",
                self.name_of(actor_id),
                self.name_of(target_id)
            );
            self.record(
                BattleEventType::AttackMissed {
                    attacker: actor_id,
                    target: target_id,
                },
                description,
            );
            return Ok(false);
        }

        let crit_roll: f32 = self.rng.gen_range(0.0..100.0);
        let critical = crit_roll < crit;
        let damage = AttackContext {
            card,
            weapon: template.as_deref(),
            attacker: &self.combatants[a],
            target: &self.combatants[t],
            zone: self.zone.as_ref(),
        }
        .damage(critical, self.config.crit_multiplier);

        let armor_modifier = zone_delta(self.zone.as_ref(), Stat::Armor);
        let victim = &mut self.combatants[t];
        let hp_before = victim.hp.current;
        let outcome = victim.apply_damage(damage, armor_modifier);
        let lost = hp_before - outcome.hp_after;

        let attacker = &mut self.combatants[a];
        attacker.stats.damage_dealt += lost;
        if outcome.defeated {
            attacker.stats.kills += 1;
        }

        let description = format!(
            "{} hits {} for {}{}",
            self.name_of(actor_id),
            self.name_of(target_id),
            outcome.effective,
            if critical { " (critical)" } else { "" }
        );
        self.record(
            BattleEventType::AttackHit {
                attacker: actor_id,
                target: target_id,
                damage: outcome.effective,
                critical,
            },
            description,
        );
        if outcome.defeated {
            let description = format!("{} is defeated", self.name_of(target_id));
            self.record(BattleEventType::CombatantDefeated { id: target_id }, description);
        }
        Ok(true)
    }

    /// Tick effects, check for the end, then hand the turn on.
    ///
    /// Returns the card the next actor drew, if any.
    fn finish_action(&mut self) -> Result<Option<String>> {
        self.fire(PhaseEvent::ActionResolved)?;

        for i in 0..self.combatants.len() {
            let tick = self.combatants[i].tick_effects();
            let id = self.combatants[i].id;
            if tick.bleed_damage > 0 || tick.healed > 0 {
                let description = format!(
                    "{} bleeds {} and recovers {}",
                    self.name_of(id),
                    tick.bleed_damage,
                    tick.healed
                );
                self.record(
                    BattleEventType::EffectTicked {
                        target: id,
                        bleed: tick.bleed_damage,
                        healed: tick.healed,
                    },
                    description,
                );
            }
            for effect in tick.expired {
                let description = format!("{}'s {:?} wears off", self.name_of(id), effect);
                self.record(BattleEventType::EffectExpired { target: id, effect }, description);
            }
            if tick.defeated {
                let description = format!("{} is defeated", self.name_of(id));
                self.record(BattleEventType::CombatantDefeated { id }, description);
            }
        }

        if let Some(event) = self.termination() {
            self.fire(event)?;
            let outcome = BattleOutcome::from_phase(self.phase).ok_or_else(|| {
                CombatError::CorruptState(format!("{:?} is not terminal", self.phase))
            })?;
            self.outcome = Some(outcome);
            self.turn_time_remaining = None;
            self.record(
                BattleEventType::BattleEnded { outcome },
                format!("Battle ends: {:?}", outcome),
            );
            info!(
                "Battle {} ended in {:?} after {} turns",
                self.id, outcome, self.turn
            );
            return Ok(None);
        }

        let next = {
            let combatants = &self.combatants;
            next_actor(&self.turn_order, self.current_actor_index, |id| {
                combatants.get(id.0 as usize).map_or(false, Combatant::is_active)
            })
        }
        .ok_or_else(|| CombatError::CorruptState("no combatant left to act".into()))?;
        if next.wrapped {
            self.turn += 1;
        }
        self.current_actor_index = next.index;
        let side = self.combatant_at(next.index)?.side;
        self.fire(side_event(side))?;
        Ok(self.begin_actor_turn())
    }

    fn termination(&self) -> Option<PhaseEvent> {
        let humans = || {
            self.combatants
                .iter()
                .filter(|c| c.controller == Controller::Human)
        };
        if humans().any(|c| c.status == CombatantStatus::Fled) {
            return Some(PhaseEvent::PlayerFled);
        }
        if self
            .combatants
            .iter()
            .filter(|c| c.side == Side::Enemy)
            .all(|c| !c.is_active())
        {
            return Some(PhaseEvent::EnemiesDefeated);
        }
        if humans().all(Combatant::is_defeated) {
            return Some(PhaseEvent::PlayerDefeated);
        }
        None
    }

    /// Refresh the current actor and draw. Returns the id of the last card drawn.
    fn begin_actor_turn(&mut self) -> Option<String> {
        let id = self.turn_order[self.current_actor_index];
        let idx = id.0 as usize;
        let regen = self.config.stamina_regen_per_turn as i32
            + zone_delta(self.zone.as_ref(), Stat::StaminaRegen);
        let start = self.combatants[idx].begin_turn(regen, self.config.heat_decay_per_turn);
        self.turn_time_remaining = self.turn_time_limit;

        let description = if start.ap_lost_to_stagger > 0 {
            format!(
                "{}'s turn ({} AP, {} lost to stagger)",
                self.name_of(id),
                start.ap,
                start.ap_lost_to_stagger
            )
        } else {
            format!("{}'s turn ({} AP)", self.name_of(id), start.ap)
        };
        self.record(BattleEventType::TurnStarted { actor: id, ap: start.ap }, description);

        let mut drawn = None;
        for _ in 0..self.config.draw_per_turn {
            if self.piles[idx].hand.len() >= self.config.max_hand_size {
                break;
            }
            let draw = self.piles[idx].draw(&mut self.rng);
            if draw.reshuffled {
                let description = format!("{} shuffles their discard into the deck", self.name_of(id));
                self.record(BattleEventType::DeckReshuffled { actor: id }, description);
            }
            if let Some(card) = draw.card {
                let description = format!("{} draws {}", self.name_of(id), card.name);
                self.record(
                    BattleEventType::CardDrawn {
                        actor: id,
                        card_id: card.id.clone(),
                    },
                    description,
                );
                drawn = Some(card.id);
            }
        }
        drawn
    }

    // === TIMER ===

    /// Count down the turn timer; expiry passes the current actor's turn
    pub fn tick_timer(
        &mut self,
        elapsed: u64,
        catalog: &CombatCatalog,
        now: Timestamp,
    ) -> Result<Option<ActionReport>> {
        let Some(actor) = self.current_actor() else {
            return Ok(None);
        };
        let Some(remaining) = self.turn_time_remaining else {
            return Ok(None);
        };
        let left = remaining.saturating_sub(elapsed);
        if left > 0 {
            self.turn_time_remaining = Some(left);
            return Ok(None);
        }

        let mut next = self.clone();
        next.updated_at = now;
        let log_start = next.log.len();
        let description = format!("{} ran out of time", next.name_of(actor));
        next.record(BattleEventType::TimerExpired { actor }, description);
        let report = next.apply(
            &ActionSubmission::end_turn(actor),
            Plan::Pass,
            catalog,
            now,
            log_start,
        )?;
        *self = next;
        Ok(Some(report))
    }

    // === AI ===

    /// Let the policy act if the current actor is AI-controlled
    pub fn act_for_current(
        &mut self,
        policy: &dyn EnemyPolicy,
        catalog: &CombatCatalog,
        now: Timestamp,
    ) -> Result<Option<ActionReport>> {
        let Some(actor_id) = self.current_actor() else {
            return Ok(None);
        };
        if self.combatants[actor_id.0 as usize].controller != Controller::Ai {
            return Ok(None);
        }
        self.autopilot(policy, catalog, now)
    }

    /// Let the policy act for the current actor whoever controls it.
    ///
    /// Used by headless runs and the terminal's auto command.
    pub fn autopilot(
        &mut self,
        policy: &dyn EnemyPolicy,
        catalog: &CombatCatalog,
        now: Timestamp,
    ) -> Result<Option<ActionReport>> {
        let Some(actor_id) = self.current_actor() else {
            return Ok(None);
        };
        let idx = actor_id.0 as usize;

        let mut staged = self.clone();
        let decision = {
            let actor = &staged.combatants[idx];
            let available = AvailabilityContext {
                actor,
                combatants: &staged.combatants,
                zone: staged.zone.as_ref(),
                config: &staged.config,
                catalog,
            }
            .available_cards(&staged.piles[idx]);
            let view = BattleView {
                combatants: &staged.combatants,
                available: &available,
                zone: staged.zone.as_ref(),
                config: &staged.config,
                catalog,
            };
            policy.choose_action(actor, &view, &mut staged.rng)
        };
        debug!(
            "Battle {}: {} decides {:?} ({})",
            self.id, actor_id, decision.action, decision.rationale
        );

        let submission = ActionSubmission::new(actor_id, decision.action);
        let report = match staged.submit(&submission, catalog, now) {
            Ok(report) => report,
            Err(CombatError::Rejected(reason)) => {
                warn!(
                    "Battle {}: policy chose an illegal action for {} ({}), passing",
                    self.id, actor_id, reason
                );
                staged.end_turn(actor_id, catalog, now)?
            }
            Err(e) => return Err(e),
        };
        *self = staged;
        Ok(Some(report))
    }

    /// Drive AI-controlled actors until a human is up or the battle ends
    pub fn run_ai_turns(
        &mut self,
        policy: &dyn EnemyPolicy,
        catalog: &CombatCatalog,
        now: Timestamp,
    ) -> Result<Vec<ActionReport>> {
        let mut reports = Vec::new();
        while reports.len() < MAX_AI_ACTIONS {
            match self.act_for_current(policy, catalog, now)? {
                Some(report) => reports.push(report),
                None => break,
            }
        }
        Ok(reports)
    }

    // === ROSTER ===

    /// Reinforcements join the enemy side
    pub fn add_enemy(
        &mut self,
        setup: &EnemySetup,
        catalog: &CombatCatalog,
        now: Timestamp,
    ) -> Result<CombatantId> {
        let id = CombatantId(self.combatants.len() as u32);
        let (combatant, cards) = build_enemy(id, setup, catalog, now)?;
        self.join(combatant, cards, now)
    }

    /// A squad member or second player deploys mid-battle
    pub fn add_player(
        &mut self,
        setup: &PlayerSetup,
        catalog: &CombatCatalog,
        now: Timestamp,
    ) -> Result<CombatantId> {
        let id = CombatantId(self.combatants.len() as u32);
        let (combatant, cards) = build_player(id, setup, catalog, now)?;
        self.join(combatant, cards, now)
    }

    /// Add a combatant, recompute the order and keep the current actor's turn
    fn join(
        &mut self,
        combatant: Combatant,
        cards: Vec<GeneratedCard>,
        now: Timestamp,
    ) -> Result<CombatantId> {
        let current = self.current_actor().ok_or(ActionRejection::BattleNotActive)?;
        let mut next = self.clone();
        next.updated_at = now;

        let id = combatant.id;
        let mut pile = CardPiles::new(cards, &mut next.rng);
        for _ in 0..next.config.opening_hand_size {
            pile.draw(&mut next.rng);
        }
        next.piles.push(pile);
        next.start_hp.push(combatant.hp.current);
        let description = format!("{} joins the battle", combatant.name);
        next.combatants.push(combatant);
        next.record(BattleEventType::CombatantJoined { id }, description);

        next.fire(PhaseEvent::RosterChanged)?;
        next.turn_order = compute_turn_order(&next.combatants, next.zone.as_ref());
        next.current_actor_index = next
            .turn_order
            .iter()
            .position(|c| *c == current)
            .ok_or_else(|| CombatError::CorruptState(format!("{} left the turn order", current)))?;
        let side = next.combatant_at(next.current_actor_index)?.side;
        next.fire(side_event(side))?;

        info!("Battle {}: {} joined", next.id, id);
        *self = next;
        Ok(id)
    }

    // === PERSISTENCE ===

    /// Check every structural invariant a loaded session must satisfy
    pub fn validate_integrity(&self, catalog: &CombatCatalog) -> Result<()> {
        let corrupt = |msg: String| Err(CombatError::CorruptState(msg));
        let n = self.combatants.len();
        if self.piles.len() != n || self.start_hp.len() != n {
            return corrupt("combatant, pile and start HP counts differ".into());
        }
        for (i, c) in self.combatants.iter().enumerate() {
            if c.id != CombatantId(i as u32) {
                return corrupt(format!("combatant at slot {} has id {}", i, c.id));
            }
            for (name, pool) in [("hp", c.hp), ("ap", c.ap), ("stamina", c.stamina), ("morale", c.morale)] {
                if pool.current > pool.max {
                    return corrupt(format!("{} {} {} exceeds max {}", c.id, name, pool.current, pool.max));
                }
            }
            if c.is_active() && c.hp.is_empty() {
                return corrupt(format!("{} is active with 0 HP", c.id));
            }
            if let Some(weapon) = &c.weapon {
                if catalog.weapon(&weapon.weapon_id).is_none() {
                    return corrupt(format!("{} wields unknown weapon {}", c.id, weapon.weapon_id));
                }
                let condition_ok = weapon.condition.is_finite() && (0.0..=100.0).contains(&weapon.condition);
                if !condition_ok || !weapon.heat.is_finite() || weapon.heat < 0.0 {
                    return corrupt(format!("{} weapon state out of range", c.id));
                }
            }
            if c.effects.iter().any(|e| e.source.0 as usize >= n) {
                return corrupt(format!("{} carries an effect from an unknown source", c.id));
            }
        }
        if let Some(id) = self.turn_order.iter().find(|id| id.0 as usize >= n) {
            return corrupt(format!("turn order references unknown combatant {}", id));
        }
        if self.phase == Phase::Resolution {
            return corrupt("saved mid-resolution".into());
        }
        if self.phase.is_terminal() != self.outcome.is_some() {
            return corrupt(format!("phase {:?} and outcome {:?} disagree", self.phase, self.outcome));
        }
        if self.phase.accepts_actions() {
            let active = self
                .turn_order
                .get(self.current_actor_index)
                .and_then(|id| self.combatant(*id))
                .map_or(false, Combatant::is_active);
            if !active {
                return corrupt(format!("current actor slot {} cannot act", self.current_actor_index));
            }
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Restore a saved session; malformed or inconsistent data is corrupt state
    pub fn from_json(json: &str, catalog: &CombatCatalog) -> Result<Self> {
        let session: BattleSession =
            serde_json::from_str(json).map_err(|e| CombatError::CorruptState(e.to_string()))?;
        session.validate_integrity(catalog)?;
        Ok(session)
    }

    // === VIEWS ===

    /// Read-only view; pile contents and card availability only for `viewer`
    pub fn snapshot(&self, viewer: Option<CombatantId>, catalog: &CombatCatalog) -> SessionSnapshot {
        let combatants = self
            .combatants
            .iter()
            .zip(&self.piles)
            .map(|(c, piles)| {
                let mine = viewer == Some(c.id);
                CombatantView {
                    combatant: c.clone(),
                    exhaustion: c.exhaustion(),
                    piles: PileView {
                        sizes: piles.sizes(),
                        hand: mine.then(|| piles.hand.clone()),
                        available: mine.then(|| self.availability(c, catalog).available_cards(piles)),
                    },
                }
            })
            .collect();
        SessionSnapshot {
            battle_id: self.id,
            mode: self.mode,
            phase: self.phase,
            turn: self.turn,
            turn_order: self.turn_order.clone(),
            current_actor: self.current_actor(),
            zone_id: self.zone.as_ref().map(|z| z.id.clone()),
            turn_time_remaining: self.turn_time_remaining,
            combatants,
            log: self.log.events().to_vec(),
            outcome: self.outcome,
        }
    }

    /// The end-of-battle report, handed out exactly once
    pub fn take_report(&mut self, catalog: &CombatCatalog) -> Option<BattleReport> {
        let outcome = self.outcome?;
        if self.report_emitted {
            return None;
        }
        self.report_emitted = true;
        Some(BattleReport::build(
            self.id,
            outcome,
            self.turn,
            self.updated_at,
            &self.combatants,
            &self.start_hp,
            catalog,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::effects::{EffectKind, StatusEffect};

    fn duel(seed: u64) -> (BattleSession, CombatCatalog) {
        let catalog = CombatCatalog::builtin();
        let mut player = PlayerSetup::new("Vera", "combat_knife", Rank::FRONT);
        player.initiative = 50;
        let setup = BattleSetup::new(
            vec![player],
            vec![EnemySetup::new("scavenger", Rank::FRONT)],
            seed,
        );
        let session = BattleSession::new(&setup, &catalog).unwrap();
        (session, catalog)
    }

    fn sure_hit(session: &mut BattleSession, id: CombatantId) {
        session.combatant_mut(id).unwrap().add_effect(
            &StatusEffect::new(
                EffectKind::Buff {
                    stat: Stat::Accuracy,
                    amount: 200,
                },
                5,
            ),
            id,
        );
    }

    fn give_card(session: &mut BattleSession, id: CombatantId, template_id: &str) {
        let piles = session.piles_mut(id).unwrap();
        if let Some(pos) = piles.deck.iter().position(|c| c.template_id == template_id) {
            let card = piles.deck.remove(pos);
            piles.hand.push(card);
        }
    }

    #[test]
    fn test_new_session_starts_with_fastest_actor() {
        let (session, _) = duel(1);
        assert_eq!(session.phase(), Phase::PlayerTurn);
        assert_eq!(session.current_actor(), Some(CombatantId(0)));
        assert_eq!(session.turn(), 1);
        let opening = session.config().opening_hand_size;
        assert_eq!(session.piles(CombatantId(0)).unwrap().hand.len(), opening + 1);
    }

    #[test]
    fn test_needs_human_and_enemy() {
        let catalog = CombatCatalog::builtin();
        let ally = PlayerSetup::ally("Bot", "fists", Rank::FRONT);
        let setup = BattleSetup::new(vec![ally], vec![EnemySetup::new("scavenger", Rank::FRONT)], 0);
        assert!(matches!(BattleSession::new(&setup, &catalog), Err(CombatError::Config(_))));

        let player = PlayerSetup::new("Vera", "fists", Rank::FRONT);
        let setup = BattleSetup::new(vec![player], vec![], 0);
        assert!(BattleSession::new(&setup, &catalog).is_err());
    }

    #[test]
    fn test_unknown_zone_rejected() {
        let catalog = CombatCatalog::builtin();
        let mut setup = BattleSetup::new(
            vec![PlayerSetup::new("Vera", "fists", Rank::FRONT)],
            vec![EnemySetup::new("scavenger", Rank::FRONT)],
            0,
        );
        setup.zone_id = Some("moon_base".into());
        assert!(matches!(BattleSession::new(&setup, &catalog), Err(CombatError::Catalog(_))));
    }

    #[test]
    fn test_wrong_actor_rejected_without_change() {
        let (mut session, catalog) = duel(2);
        let before = session.to_json().unwrap();
        let err = session
            .end_turn(CombatantId(1), &catalog, 10)
            .unwrap_err();
        assert_eq!(
            err.rejection(),
            Some(&ActionRejection::NotYourTurn {
                expected: CombatantId(0),
                actual: CombatantId(1),
            })
        );
        assert_eq!(session.to_json().unwrap(), before);
    }

    #[test]
    fn test_end_turn_hands_over() {
        let (mut session, catalog) = duel(3);
        let report = session.end_turn(CombatantId(0), &catalog, 10).unwrap();
        assert_eq!(report.next_actor, Some(CombatantId(1)));
        assert_eq!(session.phase(), Phase::EnemyTurn);
        assert!(report
            .events
            .iter()
            .any(|e| matches!(e.event_type, BattleEventType::TurnPassed { .. })));
    }

    #[test]
    fn test_reposition_must_be_one_rank() {
        let (mut session, catalog) = duel(4);
        let far = ActionSubmission::new(
            CombatantId(0),
            Action::Reposition {
                to: Rank::new(3).unwrap(),
            },
        );
        assert!(session.submit(&far, &catalog, 1).is_err());

        let near = ActionSubmission::new(
            CombatantId(0),
            Action::Reposition {
                to: Rank::new(2).unwrap(),
            },
        );
        session.submit(&near, &catalog, 1).unwrap();
        assert_eq!(session.combatant(CombatantId(0)).unwrap().rank.get(), 2);
    }

    #[test]
    fn test_lethal_strike_ends_battle() {
        let (mut session, catalog) = duel(5);
        sure_hit(&mut session, CombatantId(0));
        session.combatant_mut(CombatantId(1)).unwrap().hp = Pool::with_current(1, 20);
        give_card(&mut session, CombatantId(0), "reckless_lunge");

        let available = session.available_cards(CombatantId(0), &catalog).unwrap();
        let index = available
            .iter()
            .position(|a| a.is_playable() && a.card.template_id == "reckless_lunge")
            .unwrap();
        let report = session
            .submit(
                &ActionSubmission::play(CombatantId(0), index, Some(Rank::FRONT)),
                &catalog,
                20,
            )
            .unwrap();
        assert_eq!(report.outcome, Some(BattleOutcome::Victory));
        assert_eq!(session.phase(), Phase::Victory);
        assert!(session.current_actor().is_none());

        let report = session.take_report(&catalog).unwrap();
        assert_eq!(report.combatants[0].kills, 1);
        assert!(session.take_report(&catalog).is_none());
    }

    #[test]
    fn test_flee_ends_battle() {
        let (mut session, catalog) = duel(6);
        let report = session
            .submit(&ActionSubmission::new(CombatantId(0), Action::Flee), &catalog, 5)
            .unwrap();
        assert_eq!(report.outcome, Some(BattleOutcome::Flee));
        let err = session.end_turn(CombatantId(0), &catalog, 6).unwrap_err();
        assert_eq!(err.rejection(), Some(&ActionRejection::BattleNotActive));
    }

    #[test]
    fn test_timer_expiry_passes_turn() {
        let catalog = CombatCatalog::builtin();
        let mut player = PlayerSetup::new("Vera", "fists", Rank::FRONT);
        player.initiative = 50;
        let mut setup = BattleSetup::new(vec![player], vec![EnemySetup::new("scavenger", Rank::FRONT)], 9);
        setup.turn_time_limit = Some(1_000);
        let mut session = BattleSession::new(&setup, &catalog).unwrap();

        assert!(session.tick_timer(400, &catalog, 400).unwrap().is_none());
        assert_eq!(session.turn_time_remaining(), Some(600));
        let report = session.tick_timer(600, &catalog, 1_000).unwrap().unwrap();
        assert!(matches!(
            report.events[0].event_type,
            BattleEventType::TimerExpired { .. }
        ));
        assert_eq!(session.current_actor(), Some(CombatantId(1)));
        assert_eq!(session.turn_time_remaining(), Some(1_000));
    }

    #[test]
    fn test_json_round_trip_validates() {
        let (session, catalog) = duel(7);
        let json = session.to_json().unwrap();
        let restored = BattleSession::from_json(&json, &catalog).unwrap();
        assert_eq!(restored.current_actor(), session.current_actor());
        assert_eq!(restored.log().len(), session.log().len());
    }

    #[test]
    fn test_corrupt_hp_rejected_on_load() {
        let (mut session, catalog) = duel(8);
        session.combatant_mut(CombatantId(0)).unwrap().hp.current = 999;
        let json = session.to_json().unwrap();
        assert!(matches!(
            BattleSession::from_json(&json, &catalog),
            Err(CombatError::CorruptState(_))
        ));
    }

    #[test]
    fn test_reinforcement_keeps_current_actor() {
        let (mut session, catalog) = duel(10);
        let id = session
            .add_enemy(&EnemySetup::new("enforcer", Rank::new(2).unwrap()), &catalog, 3)
            .unwrap();
        assert_eq!(id, CombatantId(2));
        assert_eq!(session.current_actor(), Some(CombatantId(0)));
        assert_eq!(session.phase(), Phase::PlayerTurn);
        assert!(session.turn_order().contains(&id));
    }
}
