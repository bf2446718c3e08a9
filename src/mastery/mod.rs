//! Weapon mastery: per-player progression that gates generated cards

pub mod record;
pub mod table;
pub mod tracker;

pub use record::{MasteryRecord, UnlockedCard, XpAward};
pub use table::{unlock_level, unlocked_cards_for_level, xp_for_level, MAX_LEVEL};
pub use tracker::{filter_unlocked, MasteryGain, MasteryTracker};
