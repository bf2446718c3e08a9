//! Card templates and generated cards
//!
//! A `CardTemplate` is authored data attached to a weapon category (or to
//! the common pool). A `GeneratedCard` is the concrete, self-contained value
//! produced for one weapon and placed in a combatant's piles.

use serde::{Deserialize, Serialize};

use crate::combat::combatant::Posture;
use crate::combat::effects::{EffectKind, Stat, StatusEffect};
use crate::combat::weapons::{ColdSteelAction, DamageType, WeaponCategory};
use crate::core::types::{ranks, Rank};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardType {
    Attack,
    Defense,
    Movement,
    Voice,
    Item,
    Reaction,
    ColdSteel,
    Posture,
    Jammed,
    Debt,
    Analysis,
}

impl CardType {
    /// Cards aimed at an opposing combatant
    pub fn targets_opponent(&self) -> bool {
        matches!(
            self,
            CardType::Attack | CardType::ColdSteel | CardType::Voice | CardType::Debt
        )
    }

    /// Cards that roll to hit and deal HP damage
    pub fn deals_damage(&self) -> bool {
        matches!(self, CardType::Attack | CardType::ColdSteel | CardType::Debt)
    }
}

fn all_ranks() -> Vec<Rank> {
    Rank::ALL.to_vec()
}

fn default_ap() -> u32 {
    1
}

/// Authored card definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardTemplate {
    pub id: String,
    pub name: String,
    pub card_type: CardType,
    #[serde(default = "default_ap")]
    pub ap_cost: u32,
    #[serde(default)]
    pub stamina_cost: u32,
    #[serde(default)]
    pub ammo_cost: u32,
    #[serde(default)]
    pub damage_multiplier: f32,
    #[serde(default)]
    pub damage_bonus: f32,
    #[serde(default)]
    pub damage_type: Option<DamageType>,
    /// Target ranks for opponent cards, destination ranks for movement
    #[serde(default = "all_ranks")]
    pub optimal_ranks: Vec<Rank>,
    #[serde(default)]
    pub jam_modifier: f32,
    #[serde(default)]
    pub effects: Vec<StatusEffect>,
    #[serde(default)]
    pub posture: Option<Posture>,
    #[serde(default)]
    pub exhausts: bool,
    /// Only usable once unlocked through weapon mastery
    #[serde(default)]
    pub mastery: bool,
}

impl CardTemplate {
    pub fn new(id: &str, name: &str, card_type: CardType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            card_type,
            ap_cost: 1,
            stamina_cost: 0,
            ammo_cost: 0,
            damage_multiplier: 0.0,
            damage_bonus: 0.0,
            damage_type: None,
            optimal_ranks: all_ranks(),
            jam_modifier: 0.0,
            effects: Vec::new(),
            posture: None,
            exhausts: false,
            mastery: false,
        }
    }

    pub fn attack(id: &str, name: &str, multiplier: f32) -> Self {
        let mut card = Self::new(id, name, CardType::Attack);
        card.damage_multiplier = multiplier;
        card
    }

    pub fn ap(mut self, cost: u32) -> Self {
        self.ap_cost = cost;
        self
    }

    pub fn stamina(mut self, cost: u32) -> Self {
        self.stamina_cost = cost;
        self
    }

    pub fn ammo(mut self, cost: u32) -> Self {
        self.ammo_cost = cost;
        self
    }

    pub fn bonus(mut self, bonus: f32) -> Self {
        self.damage_bonus = bonus;
        self
    }

    pub fn damage_type(mut self, damage_type: DamageType) -> Self {
        self.damage_type = Some(damage_type);
        self
    }

    pub fn ranks(mut self, values: &[u8]) -> Self {
        self.optimal_ranks = ranks(values);
        self
    }

    pub fn jam(mut self, modifier: f32) -> Self {
        self.jam_modifier = modifier;
        self
    }

    pub fn effect(mut self, effect: StatusEffect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn posture(mut self, posture: Posture) -> Self {
        self.posture = Some(posture);
        self
    }

    pub fn exhausting(mut self) -> Self {
        self.exhausts = true;
        self
    }

    pub fn gated(mut self) -> Self {
        self.mastery = true;
        self
    }

    /// Boundary validation for authored cards
    pub fn validate(&self) -> Result<(), String> {
        if self.id.is_empty() {
            return Err("card id must not be empty".into());
        }
        if !self.damage_multiplier.is_finite() || self.damage_multiplier < 0.0 {
            return Err(format!("{}: damage_multiplier must be >= 0", self.id));
        }
        if !self.damage_bonus.is_finite() || !self.jam_modifier.is_finite() {
            return Err(format!("{}: numeric fields must be finite", self.id));
        }
        if self.optimal_ranks.is_empty() {
            return Err(format!("{}: optimal_ranks must not be empty", self.id));
        }
        if self.card_type == CardType::Posture && self.posture.is_none() {
            return Err(format!("{}: posture card without a posture", self.id));
        }
        for effect in &self.effects {
            effect
                .validate()
                .map_err(|e| format!("{}: {}", self.id, e))?;
        }
        Ok(())
    }

    /// Built-in templates for one weapon category
    pub fn builtin_for(category: WeaponCategory) -> Vec<CardTemplate> {
        match category {
            WeaponCategory::Pistol => vec![
                Self::attack("snap_shot", "Snap Shot", 1.0).ammo(1).gated(),
                Self::attack("double_tap", "Double Tap", 1.8)
                    .ap(2)
                    .ammo(2)
                    .jam(5.0)
                    .gated(),
                Self::attack("fan_the_hammer", "Fan the Hammer", 2.6)
                    .ap(3)
                    .ammo(4)
                    .ranks(&[1, 2])
                    .jam(10.0)
                    .gated(),
                Self::attack("deadeye", "Deadeye", 1.5)
                    .ap(2)
                    .ammo(1)
                    .bonus(4.0)
                    .ranks(&[2, 3, 4])
                    .gated(),
            ],
            WeaponCategory::Shotgun => vec![
                Self::attack("buckshot", "Buckshot", 1.0)
                    .ap(2)
                    .ammo(1)
                    .ranks(&[1, 2])
                    .gated(),
                Self::attack("double_barrel", "Double Barrel", 2.0)
                    .ap(3)
                    .ammo(2)
                    .ranks(&[1, 2])
                    .jam(5.0)
                    .effect(StatusEffect::new(EffectKind::Stagger { ap_loss: 1 }, 1))
                    .gated(),
                Self::attack("slug_round", "Slug Round", 1.3)
                    .ap(2)
                    .ammo(1)
                    .ranks(&[1, 2, 3])
                    .damage_type(DamageType::Piercing)
                    .gated(),
            ],
            WeaponCategory::Rifle => vec![
                Self::attack("burst_fire", "Burst Fire", 1.2)
                    .ap(2)
                    .ammo(3)
                    .gated(),
                Self::attack("suppressing_fire", "Suppressing Fire", 0.6)
                    .ap(2)
                    .ammo(5)
                    .jam(5.0)
                    .effect(StatusEffect::new(
                        EffectKind::Debuff {
                            stat: Stat::Accuracy,
                            amount: 15,
                        },
                        2,
                    ))
                    .gated(),
                Self::attack("full_auto", "Full Auto", 2.5)
                    .ap(3)
                    .ammo(10)
                    .jam(15.0)
                    .gated(),
            ],
            WeaponCategory::Sniper => vec![
                Self::attack("aimed_shot", "Aimed Shot", 1.2)
                    .ap(2)
                    .ammo(1)
                    .ranks(&[2, 3, 4])
                    .gated(),
                Self::attack("headshot", "Headshot", 2.0)
                    .ap(3)
                    .ammo(1)
                    .bonus(5.0)
                    .ranks(&[3, 4])
                    .exhausting()
                    .gated(),
            ],
            WeaponCategory::MeleeKnife => vec![
                Self::attack("slash", "Slash", 1.0)
                    .stamina(2)
                    .ranks(&[1, 2])
                    .gated(),
                Self::attack("bleed_out", "Bleed Out", 0.8)
                    .stamina(3)
                    .ranks(&[1, 2])
                    .effect(StatusEffect::new(EffectKind::Bleed { per_turn: 3 }, 3))
                    .gated(),
            ],
            WeaponCategory::MeleeBlunt => vec![
                Self::attack("smash", "Smash", 1.1)
                    .stamina(3)
                    .ranks(&[1])
                    .gated(),
                Self::attack("concuss", "Concuss", 0.9)
                    .ap(2)
                    .stamina(3)
                    .ranks(&[1])
                    .effect(StatusEffect::new(EffectKind::Stagger { ap_loss: 1 }, 1))
                    .gated(),
            ],
            WeaponCategory::MeleeSpear => vec![
                Self::attack("thrust", "Thrust", 1.0)
                    .stamina(2)
                    .ranks(&[1, 2])
                    .gated(),
                Self::attack("impale", "Impale", 1.6)
                    .ap(2)
                    .stamina(4)
                    .ranks(&[1, 2])
                    .effect(StatusEffect::new(EffectKind::Bleed { per_turn: 2 }, 2))
                    .gated(),
            ],
            WeaponCategory::Fist => vec![
                Self::attack("jab", "Jab", 1.0).stamina(1).ranks(&[1]).gated(),
                Self::attack("haymaker", "Haymaker", 1.8)
                    .ap(2)
                    .stamina(3)
                    .ranks(&[1])
                    .effect(StatusEffect::new(EffectKind::Stagger { ap_loss: 1 }, 1))
                    .gated(),
            ],
        }
    }

    /// Cards every weapon contributes
    pub fn builtin_common() -> Vec<CardTemplate> {
        vec![
            Self::new("brace", "Brace", CardType::Defense).effect(StatusEffect::on_self(
                EffectKind::Buff {
                    stat: Stat::Armor,
                    amount: 3,
                },
                2,
            )),
            Self::new("counter_guard", "Counter Guard", CardType::Reaction)
                .stamina(1)
                .effect(StatusEffect::on_self(
                    EffectKind::Buff {
                        stat: Stat::Armor,
                        amount: 2,
                    },
                    1,
                ))
                .effect(StatusEffect::on_self(
                    EffectKind::Buff {
                        stat: Stat::Damage,
                        amount: 2,
                    },
                    2,
                )),
            Self::new("shift_position", "Shift Position", CardType::Movement).stamina(1),
            Self::new("war_cry", "War Cry", CardType::Voice).bonus(8.0),
            Self::new("press_the_attack", "Press the Attack", CardType::Posture)
                .ap(0)
                .posture(Posture::Aggressive),
            Self::new("dig_in", "Dig In", CardType::Posture)
                .ap(0)
                .posture(Posture::Defensive),
            Self::new("duck_and_weave", "Duck and Weave", CardType::Posture)
                .ap(0)
                .stamina(1)
                .posture(Posture::Evasive),
            Self::new("reckless_lunge", "Reckless Lunge", CardType::Debt)
                .ranks(&[1, 2])
                .bonus(4.0)
                .effect(StatusEffect::on_self(EffectKind::Bleed { per_turn: 2 }, 2))
                .exhausting(),
        ]
    }

    /// Cards only firearms contribute
    pub fn builtin_firearm() -> Vec<CardTemplate> {
        vec![
            Self::new("reload", "Reload", CardType::Item),
            Self::new("steady_breath", "Steady Breath", CardType::Analysis).effect(
                StatusEffect::on_self(
                    EffectKind::Buff {
                        stat: Stat::Analysis,
                        amount: 10,
                    },
                    3,
                ),
            ),
        ]
    }
}

/// A playable card produced for one weapon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedCard {
    pub id: String,
    pub weapon_id: String,
    pub template_id: String,
    pub name: String,
    pub card_type: CardType,
    pub ap_cost: u32,
    pub stamina_cost: u32,
    pub ammo_cost: u32,
    pub damage: u32,
    pub damage_type: DamageType,
    pub optimal_ranks: Vec<Rank>,
    /// Flat jam chance added to the firing roll, 0-100
    pub jam_modifier: f32,
    pub effects: Vec<StatusEffect>,
    pub posture: Option<Posture>,
    pub is_ranged: bool,
    pub exhausts: bool,
    pub mastery_gated: bool,
}

/// Template id of the card surfaced while a weapon is jammed
pub const CLEAR_JAM_ID: &str = "clear_jam";

impl GeneratedCard {
    /// Synthetic card offered while the weapon is jammed
    pub fn clear_jam(weapon_id: &str, ap_cost: u32) -> Self {
        Self {
            id: format!("{}-{}", weapon_id, CLEAR_JAM_ID),
            weapon_id: weapon_id.into(),
            template_id: CLEAR_JAM_ID.into(),
            name: "Clear Jam".into(),
            card_type: CardType::Jammed,
            ap_cost,
            stamina_cost: 0,
            ammo_cost: 0,
            damage: 0,
            damage_type: DamageType::Physical,
            optimal_ranks: all_ranks(),
            jam_modifier: 0.0,
            effects: Vec::new(),
            posture: None,
            is_ranged: false,
            exhausts: false,
            mastery_gated: false,
        }
    }

    /// Synthetic melee card offered once the magazine is empty
    pub fn cold_steel(weapon_id: &str, action: &ColdSteelAction) -> Self {
        Self {
            id: format!("{}-{}", weapon_id, action.id),
            weapon_id: weapon_id.into(),
            template_id: action.id.clone(),
            name: action.name.clone(),
            card_type: CardType::ColdSteel,
            ap_cost: action.ap_cost,
            stamina_cost: action.stamina_cost,
            ammo_cost: 0,
            damage: action.damage,
            damage_type: action.damage_type,
            optimal_ranks: ranks(&[1, 2]),
            jam_modifier: 0.0,
            effects: Vec::new(),
            posture: None,
            is_ranged: false,
            exhausts: false,
            mastery_gated: false,
        }
    }
}
