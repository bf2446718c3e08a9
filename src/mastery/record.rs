//! Per-player, per-weapon-type mastery record

use serde::{Deserialize, Serialize};

use crate::combat::weapons::WeaponCategory;
use crate::core::types::Timestamp;
use crate::mastery::table::{unlock_level, unlocked_cards_for_level, xp_for_level, MAX_LEVEL};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockedCard {
    pub card_id: String,
    pub unlock_level: u8,
    pub unlocked_at: Timestamp,
}

/// What one XP award changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XpAward {
    pub levels_gained: u8,
    pub new_unlocks: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasteryRecord {
    pub player_id: String,
    pub weapon_type: WeaponCategory,
    pub level: u8,
    pub current_xp: u32,
    /// `None` once the level cap is reached
    pub xp_to_next: Option<u32>,
    pub unlocked: Vec<UnlockedCard>,
    pub lifetime_xp: u64,
    pub kills: u32,
}

impl MasteryRecord {
    /// Fresh level-1 record with the level-1 cards unlocked
    pub fn new(player_id: &str, weapon_type: WeaponCategory, now: Timestamp) -> Self {
        let mut record = Self {
            player_id: player_id.into(),
            weapon_type,
            level: 1,
            current_xp: 0,
            xp_to_next: xp_for_level(1),
            unlocked: Vec::new(),
            lifetime_xp: 0,
            kills: 0,
        };
        record.sync_unlocks(now);
        record
    }

    pub fn is_max_level(&self) -> bool {
        self.level >= MAX_LEVEL
    }

    pub fn is_unlocked(&self, card_id: &str) -> bool {
        self.unlocked.iter().any(|u| u.card_id == card_id)
    }

    /// Add XP, levelling up as many times as it covers
    pub fn award_xp(&mut self, amount: u32, now: Timestamp) -> XpAward {
        let mut award = XpAward::default();
        self.lifetime_xp += u64::from(amount);
        if self.is_max_level() {
            return award;
        }

        self.current_xp = self.current_xp.saturating_add(amount);
        while let Some(threshold) = xp_for_level(self.level) {
            if self.current_xp < threshold {
                break;
            }
            self.current_xp -= threshold;
            self.level += 1;
            award.levels_gained += 1;
        }
        if self.is_max_level() {
            self.current_xp = 0;
        }
        self.xp_to_next = xp_for_level(self.level);
        award.new_unlocks = self.sync_unlocks(now);
        award
    }

    pub fn record_kills(&mut self, kills: u32) {
        self.kills += kills;
    }

    /// Merge every card due at the current level; returns newly added ids.
    ///
    /// Each card is stamped with its scheduled level, not the level reached.
    pub fn sync_unlocks(&mut self, now: Timestamp) -> Vec<String> {
        let mut added = Vec::new();
        for card_id in unlocked_cards_for_level(self.weapon_type, self.level) {
            if self.is_unlocked(card_id) {
                continue;
            }
            self.unlocked.push(UnlockedCard {
                card_id: card_id.into(),
                unlock_level: unlock_level(self.weapon_type, card_id).unwrap_or(self.level),
                unlocked_at: now,
            });
            added.push(card_id.to_string());
        }
        added
    }

    /// Check a record loaded from outside the tracker
    pub fn validate(&self) -> Result<(), String> {
        if !(1..=MAX_LEVEL).contains(&self.level) {
            return Err(format!("level {} out of range", self.level));
        }
        if self.xp_to_next != xp_for_level(self.level) {
            return Err(format!("xp_to_next does not match level {}", self.level));
        }
        let expected = unlocked_cards_for_level(self.weapon_type, self.level);
        if self.unlocked.len() != expected.len()
            || expected.iter().any(|id| !self.is_unlocked(id))
        {
            return Err(format!(
                "unlocked cards do not match level {} for {}",
                self.level, self.weapon_type
            ));
        }
        if let Some(card) = self
            .unlocked
            .iter()
            .find(|u| unlock_level(self.weapon_type, &u.card_id) != Some(u.unlock_level))
        {
            return Err(format!(
                "{} recorded at level {} off the schedule",
                card.card_id, card.unlock_level
            ));
        }
        Ok(())
    }
}
