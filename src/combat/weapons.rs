//! Weapon templates
//!
//! Templates are immutable once loaded and shared by id. Combatants carry
//! only the mutable part (ammo, condition, heat) in `WeaponState`.

use nom::{
    branch::alt,
    character::complete::{char, digit1, space0},
    combinator::{all_consuming, map_res, opt},
    sequence::{delimited, preceded},
    IResult, Parser,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::combat::constants::MAX_CONDITION;
use crate::core::types::{ranks, Rank};

/// Weapon family; drives card templates and mastery tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeaponCategory {
    Pistol,
    Shotgun,
    Rifle,
    Sniper,
    MeleeKnife,
    MeleeBlunt,
    MeleeSpear,
    Fist,
}

impl WeaponCategory {
    pub fn all() -> &'static [WeaponCategory] {
        &[
            WeaponCategory::Pistol,
            WeaponCategory::Shotgun,
            WeaponCategory::Rifle,
            WeaponCategory::Sniper,
            WeaponCategory::MeleeKnife,
            WeaponCategory::MeleeBlunt,
            WeaponCategory::MeleeSpear,
            WeaponCategory::Fist,
        ]
    }

    /// Firearms use ammo, heat up and can jam
    pub fn is_firearm(&self) -> bool {
        matches!(
            self,
            WeaponCategory::Pistol
                | WeaponCategory::Shotgun
                | WeaponCategory::Rifle
                | WeaponCategory::Sniper
        )
    }
}

impl fmt::Display for WeaponCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WeaponCategory::Pistol => "pistol",
            WeaponCategory::Shotgun => "shotgun",
            WeaponCategory::Rifle => "rifle",
            WeaponCategory::Sniper => "sniper",
            WeaponCategory::MeleeKnife => "melee_knife",
            WeaponCategory::MeleeBlunt => "melee_blunt",
            WeaponCategory::MeleeSpear => "melee_spear",
            WeaponCategory::Fist => "fist",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageType {
    #[default]
    Physical,
    Ballistic,
    Piercing,
    Slashing,
    Blunt,
    Fire,
    Electric,
    Toxic,
}

/// Damage expression in dice notation, e.g. `2d6+3` or a flat `8`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DamageDice {
    pub count: u32,
    pub sides: u32,
    pub bonus: i32,
}

impl DamageDice {
    pub fn new(count: u32, sides: u32, bonus: i32) -> Self {
        Self {
            count,
            sides,
            bonus,
        }
    }

    pub fn flat(value: i32) -> Self {
        Self::new(0, 0, value)
    }

    /// Expected value of one roll, used as the base damage for card generation
    pub fn average(&self) -> f32 {
        let dice = if self.sides == 0 {
            0.0
        } else {
            self.count as f32 * (self.sides as f32 + 1.0) / 2.0
        };
        (dice + self.bonus as f32).max(0.0)
    }

    pub fn min(&self) -> i32 {
        if self.sides == 0 {
            self.bonus
        } else {
            self.count as i32 + self.bonus
        }
    }

    pub fn max(&self) -> i32 {
        (self.count * self.sides) as i32 + self.bonus
    }
}

impl fmt::Display for DamageDice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.count == 0 || self.sides == 0 {
            return write!(f, "{}", self.bonus);
        }
        write!(f, "{}d{}", self.count, self.sides)?;
        match self.bonus {
            0 => Ok(()),
            b if b > 0 => write!(f, "+{}", b),
            b => write!(f, "{}", b),
        }
    }
}

fn number(input: &str) -> IResult<&str, u32> {
    map_res(digit1, |digits: &str| digits.parse::<u32>()).parse(input)
}

fn modifier(input: &str) -> IResult<&str, i32> {
    let (input, sign) = delimited(space0, alt((char('+'), char('-'))), space0).parse(input)?;
    let (input, value) = number(input)?;
    let value = value as i32;
    Ok((input, if sign == '-' { -value } else { value }))
}

fn dice_expression(input: &str) -> IResult<&str, DamageDice> {
    let (input, _) = space0(input)?;
    let (input, count) = number(input)?;
    let (input, sides) = opt(preceded(alt((char('d'), char('D'))), number)).parse(input)?;
    let (input, bonus) = opt(modifier).parse(input)?;
    let (input, _) = space0(input)?;

    let dice = match sides {
        Some(sides) => DamageDice::new(count, sides, bonus.unwrap_or(0)),
        None => DamageDice::flat(count as i32 + bonus.unwrap_or(0)),
    };
    Ok((input, dice))
}

impl FromStr for DamageDice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (_, dice) = all_consuming(dice_expression)
            .parse(s)
            .map_err(|e| format!("invalid damage expression '{}': {}", s, e))?;
        if dice.count > 0 && dice.sides == 0 {
            return Err(format!("invalid damage expression '{}': zero-sided dice", s));
        }
        Ok(dice)
    }
}

impl TryFrom<String> for DamageDice {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DamageDice> for String {
    fn from(dice: DamageDice) -> Self {
        dice.to_string()
    }
}

/// Melee fallback a firearm exposes once its magazine is empty
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColdSteelAction {
    pub id: String,
    pub name: String,
    pub damage: u32,
    #[serde(default)]
    pub damage_type: DamageType,
    #[serde(default = "default_one")]
    pub ap_cost: u32,
    #[serde(default)]
    pub stamina_cost: u32,
}

fn default_one() -> u32 {
    1
}

fn default_condition() -> f32 {
    MAX_CONDITION
}

/// Static weapon definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponTemplate {
    pub id: String,
    pub name: String,
    pub category: WeaponCategory,
    pub is_ranged: bool,
    #[serde(default)]
    pub magazine_size: u32,
    pub damage: DamageDice,
    #[serde(default)]
    pub damage_type: DamageType,
    /// Base hit chance, 0-100
    pub accuracy: i32,
    /// Ranks the wielder may attack from
    pub valid_ranks: Vec<Rank>,
    #[serde(default)]
    pub cold_steel: Option<ColdSteelAction>,
    #[serde(default = "default_condition")]
    pub max_condition: f32,
    #[serde(default)]
    pub base_jam_chance: f32,
    /// Accuracy penalty indexed by target rank (rank 1 first)
    #[serde(default)]
    pub rank_penalties: [i32; 4],
}

impl WeaponTemplate {
    /// Accuracy penalty for shooting at a target in `rank`
    pub fn rank_penalty(&self, rank: Rank) -> i32 {
        self.rank_penalties[rank.index()]
    }

    pub fn can_attack_from(&self, rank: Rank) -> bool {
        self.valid_ranks.contains(&rank)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.id.is_empty() {
            return Err("weapon id must not be empty".into());
        }
        if self.valid_ranks.is_empty() {
            return Err(format!("{}: valid_ranks must not be empty", self.id));
        }
        if self.is_ranged && self.magazine_size == 0 {
            return Err(format!("{}: ranged weapon needs a magazine", self.id));
        }
        if !self.max_condition.is_finite() || self.max_condition <= 0.0 {
            return Err(format!("{}: max_condition must be positive", self.id));
        }
        if !self.base_jam_chance.is_finite() {
            return Err(format!("{}: base_jam_chance must be finite", self.id));
        }
        Ok(())
    }

    /// Common weapon: service pistol
    pub fn service_pistol() -> Self {
        Self {
            id: "service_pistol".into(),
            name: "Service Pistol".into(),
            category: WeaponCategory::Pistol,
            is_ranged: true,
            magazine_size: 8,
            damage: DamageDice::new(2, 4, 2),
            damage_type: DamageType::Ballistic,
            accuracy: 80,
            valid_ranks: ranks(&[1, 2, 3]),
            cold_steel: Some(ColdSteelAction {
                id: "pistol_whip".into(),
                name: "Pistol Whip".into(),
                damage: 6,
                damage_type: DamageType::Blunt,
                ap_cost: 1,
                stamina_cost: 2,
            }),
            max_condition: MAX_CONDITION,
            base_jam_chance: 2.0,
            rank_penalties: [0, 0, 5, 15],
        }
    }

    /// Common weapon: sawn-off shotgun
    pub fn sawn_off() -> Self {
        Self {
            id: "sawn_off".into(),
            name: "Sawn-off Shotgun".into(),
            category: WeaponCategory::Shotgun,
            is_ranged: true,
            magazine_size: 2,
            damage: DamageDice::new(3, 6, 0),
            damage_type: DamageType::Ballistic,
            accuracy: 75,
            valid_ranks: ranks(&[1, 2]),
            cold_steel: Some(ColdSteelAction {
                id: "stock_bash".into(),
                name: "Stock Bash".into(),
                damage: 8,
                damage_type: DamageType::Blunt,
                ap_cost: 1,
                stamina_cost: 3,
            }),
            max_condition: MAX_CONDITION,
            base_jam_chance: 4.0,
            rank_penalties: [0, 10, 30, 60],
        }
    }

    /// Common weapon: assault rifle
    pub fn assault_rifle() -> Self {
        Self {
            id: "assault_rifle".into(),
            name: "Assault Rifle".into(),
            category: WeaponCategory::Rifle,
            is_ranged: true,
            magazine_size: 30,
            damage: DamageDice::new(2, 8, 2),
            damage_type: DamageType::Ballistic,
            accuracy: 75,
            valid_ranks: ranks(&[1, 2, 3, 4]),
            cold_steel: Some(ColdSteelAction {
                id: "bayonet_thrust".into(),
                name: "Bayonet Thrust".into(),
                damage: 9,
                damage_type: DamageType::Piercing,
                ap_cost: 1,
                stamina_cost: 3,
            }),
            max_condition: MAX_CONDITION,
            base_jam_chance: 3.0,
            rank_penalties: [10, 0, 0, 10],
        }
    }

    /// Common weapon: marksman rifle
    pub fn marksman_rifle() -> Self {
        Self {
            id: "marksman_rifle".into(),
            name: "Marksman Rifle".into(),
            category: WeaponCategory::Sniper,
            is_ranged: true,
            magazine_size: 5,
            damage: DamageDice::new(4, 6, 4),
            damage_type: DamageType::Ballistic,
            accuracy: 85,
            valid_ranks: ranks(&[3, 4]),
            cold_steel: Some(ColdSteelAction {
                id: "rifle_butt".into(),
                name: "Rifle Butt".into(),
                damage: 7,
                damage_type: DamageType::Blunt,
                ap_cost: 1,
                stamina_cost: 3,
            }),
            max_condition: MAX_CONDITION,
            base_jam_chance: 1.0,
            rank_penalties: [40, 20, 0, 0],
        }
    }

    /// Common weapon: combat knife
    pub fn combat_knife() -> Self {
        Self::melee(
            "combat_knife",
            "Combat Knife",
            WeaponCategory::MeleeKnife,
            DamageDice::new(1, 6, 3),
            DamageType::Slashing,
            85,
            &[1, 2],
        )
    }

    /// Common weapon: lead pipe
    pub fn lead_pipe() -> Self {
        Self::melee(
            "lead_pipe",
            "Lead Pipe",
            WeaponCategory::MeleeBlunt,
            DamageDice::new(2, 6, 0),
            DamageType::Blunt,
            75,
            &[1],
        )
    }

    /// Common weapon: rebar spear
    pub fn rebar_spear() -> Self {
        Self::melee(
            "rebar_spear",
            "Rebar Spear",
            WeaponCategory::MeleeSpear,
            DamageDice::new(2, 6, 1),
            DamageType::Piercing,
            75,
            &[1, 2],
        )
    }

    /// Common weapon: bare fists
    pub fn fists() -> Self {
        Self::melee(
            "fists",
            "Fists",
            WeaponCategory::Fist,
            DamageDice::new(1, 4, 1),
            DamageType::Blunt,
            90,
            &[1],
        )
    }

    fn melee(
        id: &str,
        name: &str,
        category: WeaponCategory,
        damage: DamageDice,
        damage_type: DamageType,
        accuracy: i32,
        from_ranks: &[u8],
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category,
            is_ranged: false,
            magazine_size: 0,
            damage,
            damage_type,
            accuracy,
            valid_ranks: ranks(from_ranks),
            cold_steel: None,
            max_condition: MAX_CONDITION,
            base_jam_chance: 0.0,
            rank_penalties: [0, 10, 25, 40],
        }
    }

    /// Every built-in weapon
    pub fn builtin() -> Vec<WeaponTemplate> {
        vec![
            Self::service_pistol(),
            Self::sawn_off(),
            Self::assault_rifle(),
            Self::marksman_rifle(),
            Self::combat_knife(),
            Self::lead_pipe(),
            Self::rebar_spear(),
            Self::fists(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dice_with_bonus() {
        let dice: DamageDice = "2d6+3".parse().unwrap();
        assert_eq!(dice, DamageDice::new(2, 6, 3));
        assert_eq!(dice.average(), 10.0);
        assert_eq!(dice.min(), 5);
        assert_eq!(dice.max(), 15);
    }

    #[test]
    fn test_parse_dice_variants() {
        assert_eq!("1D8".parse::<DamageDice>().unwrap(), DamageDice::new(1, 8, 0));
        assert_eq!("3d4 - 2".parse::<DamageDice>().unwrap(), DamageDice::new(3, 4, -2));
        assert_eq!("12".parse::<DamageDice>().unwrap(), DamageDice::flat(12));
    }

    #[test]
    fn test_parse_dice_rejects_garbage() {
        assert!("d6".parse::<DamageDice>().is_err());
        assert!("2d6+".parse::<DamageDice>().is_err());
        assert!("2d0".parse::<DamageDice>().is_err());
        assert!("two".parse::<DamageDice>().is_err());
    }

    #[test]
    fn test_dice_display_matches_parse() {
        for text in ["2d6+3", "1d4", "3d8-1", "7"] {
            let dice: DamageDice = text.parse().unwrap();
            assert_eq!(dice.to_string(), text);
        }
    }

    #[test]
    fn test_average_never_negative() {
        assert_eq!(DamageDice::new(1, 4, -10).average(), 0.0);
    }

    #[test]
    fn test_builtin_weapons_valid() {
        for weapon in WeaponTemplate::builtin() {
            assert!(weapon.validate().is_ok(), "{} should be valid", weapon.id);
            assert_eq!(weapon.is_ranged, weapon.category.is_firearm());
        }
    }

    #[test]
    fn test_firearms_have_cold_steel() {
        for weapon in WeaponTemplate::builtin().into_iter().filter(|w| w.is_ranged) {
            assert!(weapon.cold_steel.is_some(), "{} lacks a fallback", weapon.id);
        }
    }

    #[test]
    fn test_rank_penalty_lookup() {
        let shotgun = WeaponTemplate::sawn_off();
        assert_eq!(shotgun.rank_penalty(Rank::FRONT), 0);
        assert_eq!(shotgun.rank_penalty(Rank::REAR), 60);
    }
}
