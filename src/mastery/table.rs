//! Mastery thresholds and unlock schedule

use crate::combat::weapons::WeaponCategory;

/// Highest attainable mastery level
pub const MAX_LEVEL: u8 = 10;

/// XP needed to advance from level N to N+1, indexed by N - 1
const XP_THRESHOLDS: [u32; 9] = [100, 250, 450, 700, 1000, 1400, 1900, 2500, 3200];

/// XP per point of damage dealt with a weapon type
pub const XP_PER_DAMAGE: u32 = 1;

/// XP per kill scored with a weapon type
pub const XP_PER_KILL: u32 = 25;

/// Flat XP for finishing a battle on the winning side
pub const VICTORY_XP: u32 = 50;

/// XP required to leave `level`; `None` at the cap
pub fn xp_for_level(level: u8) -> Option<u32> {
    if level >= MAX_LEVEL {
        return None;
    }
    let index = usize::from(level.max(1) - 1);
    XP_THRESHOLDS.get(index).copied()
}

/// Unlock level per card id, in unlock order
fn schedule(weapon_type: WeaponCategory) -> &'static [(u8, &'static str)] {
    match weapon_type {
        WeaponCategory::Pistol => &[
            (1, "snap_shot"),
            (3, "double_tap"),
            (5, "fan_the_hammer"),
            (8, "deadeye"),
        ],
        WeaponCategory::Shotgun => &[(1, "buckshot"), (3, "double_barrel"), (5, "slug_round")],
        WeaponCategory::Rifle => &[(1, "burst_fire"), (3, "suppressing_fire"), (6, "full_auto")],
        WeaponCategory::Sniper => &[(1, "aimed_shot"), (4, "headshot")],
        WeaponCategory::MeleeKnife => &[(1, "slash"), (3, "bleed_out")],
        WeaponCategory::MeleeBlunt => &[(1, "smash"), (3, "concuss")],
        WeaponCategory::MeleeSpear => &[(1, "thrust"), (4, "impale")],
        WeaponCategory::Fist => &[(1, "jab"), (3, "haymaker")],
    }
}

/// Level at which a gated card unlocks, if it is on the schedule
pub fn unlock_level(weapon_type: WeaponCategory, card_id: &str) -> Option<u8> {
    schedule(weapon_type)
        .iter()
        .find(|(_, id)| *id == card_id)
        .map(|(level, _)| *level)
}

/// Every card unlocked at or below `level`
pub fn unlocked_cards_for_level(weapon_type: WeaponCategory, level: u8) -> Vec<&'static str> {
    schedule(weapon_type)
        .iter()
        .filter(|(unlock, _)| *unlock <= level)
        .map(|(_, id)| *id)
        .collect()
}
