//! Mastery bookkeeping across battles
//!
//! The combat core only reports outcomes. Progression applies those
//! reports here, outside any live session.

use std::collections::BTreeMap;

use tracing::info;

use crate::battle::outcome::{BattleOutcome, BattleReport};
use crate::combat::cards::GeneratedCard;
use crate::combat::weapons::WeaponCategory;
use crate::core::types::{Side, Timestamp};
use crate::mastery::record::{MasteryRecord, XpAward};
use crate::mastery::table::{VICTORY_XP, XP_PER_DAMAGE, XP_PER_KILL};

/// Keep every non-gated card plus the gated cards the record has unlocked
pub fn filter_unlocked(cards: &[GeneratedCard], record: Option<&MasteryRecord>) -> Vec<GeneratedCard> {
    cards
        .iter()
        .filter(|card| {
            !card.mastery_gated || record.map_or(false, |r| r.is_unlocked(&card.template_id))
        })
        .cloned()
        .collect()
}

/// XP granted for one award
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasteryGain {
    pub player_id: String,
    pub weapon_type: WeaponCategory,
    pub xp: u32,
    pub award: XpAward,
}

#[derive(Debug, Clone, Default)]
pub struct MasteryTracker {
    records: BTreeMap<(String, WeaponCategory), MasteryRecord>,
}

impl MasteryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from stored records, rejecting any that fail validation
    pub fn from_records(records: Vec<MasteryRecord>) -> Result<Self, String> {
        let mut tracker = Self::new();
        for record in records {
            record.validate()?;
            tracker
                .records
                .insert((record.player_id.clone(), record.weapon_type), record);
        }
        Ok(tracker)
    }

    pub fn records(&self) -> impl Iterator<Item = &MasteryRecord> {
        self.records.values()
    }

    pub fn record(&self, player_id: &str, weapon_type: WeaponCategory) -> Option<&MasteryRecord> {
        self.records.get(&(player_id.to_string(), weapon_type))
    }

    /// Existing record, or a fresh level-1 one
    pub fn record_mut(
        &mut self,
        player_id: &str,
        weapon_type: WeaponCategory,
        now: Timestamp,
    ) -> &mut MasteryRecord {
        self.records
            .entry((player_id.to_string(), weapon_type))
            .or_insert_with(|| MasteryRecord::new(player_id, weapon_type, now))
    }

    pub fn award_xp(
        &mut self,
        player_id: &str,
        weapon_type: WeaponCategory,
        amount: u32,
        now: Timestamp,
    ) -> XpAward {
        self.record_mut(player_id, weapon_type, now)
            .award_xp(amount, now)
    }

    /// Turn a finished battle into XP for every player-bound participant
    pub fn apply_report(&mut self, report: &BattleReport) -> Vec<MasteryGain> {
        let mut gains = Vec::new();
        for entry in &report.combatants {
            let (Some(player_id), Some(weapon_type)) = (&entry.player_id, entry.weapon_category)
            else {
                continue;
            };
            let mut xp = entry.damage_dealt * XP_PER_DAMAGE + entry.kills * XP_PER_KILL;
            if report.outcome == BattleOutcome::Victory && entry.side == Side::Player {
                xp += VICTORY_XP;
            }

            let record = self.record_mut(player_id, weapon_type, report.ended_at);
            record.record_kills(entry.kills);
            let award = record.award_xp(xp, report.ended_at);
            if award.levels_gained > 0 {
                info!(
                    "{} reached {} mastery level {}",
                    player_id, weapon_type, record.level
                );
            }
            gains.push(MasteryGain {
                player_id: player_id.clone(),
                weapon_type,
                xp,
                award,
            });
        }
        gains
    }
}
