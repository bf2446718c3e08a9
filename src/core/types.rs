//! Core type definitions used throughout the codebase

use derive_more::Display;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a battle session
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[display(fmt = "{}", _0)]
pub struct BattleId(pub Uuid);

impl BattleId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BattleId {
    fn default() -> Self {
        Self::new()
    }
}

/// Identifier of a participant within one battle.
///
/// Assigned in submission order, so it doubles as the stable tie-break key
/// for initiative.
#[derive(
    Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[display(fmt = "#{}", _0)]
pub struct CombatantId(pub u32);

/// Unix time in milliseconds, always supplied by the caller
pub type Timestamp = u64;

/// Turn counter (increments when the turn order wraps)
pub type Turn = u32;

/// Which side of the battlefield a combatant fights for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Player,
    Enemy,
}

impl Side {
    pub fn opponent(self) -> Self {
        match self {
            Side::Player => Side::Enemy,
            Side::Enemy => Side::Player,
        }
    }
}

/// Who supplies the actions for a combatant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Controller {
    Human,
    Ai,
}

/// A battlefield lane. Rank 1 is the front line, rank 4 the rear.
#[derive(
    Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
#[display(fmt = "R{}", _0)]
pub struct Rank(u8);

impl Rank {
    pub const FRONT: Rank = Rank(1);
    pub const REAR: Rank = Rank(4);
    pub const ALL: [Rank; 4] = [Rank(1), Rank(2), Rank(3), Rank(4)];

    /// Create a rank, rejecting anything outside 1..=4
    pub fn new(value: u8) -> Option<Self> {
        (1..=4).contains(&value).then_some(Self(value))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Zero-based position, for indexing per-rank tables
    pub fn index(self) -> usize {
        usize::from(self.0 - 1)
    }

    /// Number of lanes between two ranks
    pub fn distance(self, other: Rank) -> u8 {
        self.0.abs_diff(other.0)
    }

    /// One step toward the rear, if not already there
    pub fn back(self) -> Option<Rank> {
        Rank::new(self.0 + 1)
    }

    /// One step toward the front, if not already there
    pub fn forward(self) -> Option<Rank> {
        Rank::new(self.0.wrapping_sub(1))
    }

    /// One step toward `goal`, or `None` when already there
    pub fn step_toward(self, goal: Rank) -> Option<Rank> {
        match self.0.cmp(&goal.0) {
            std::cmp::Ordering::Less => self.back(),
            std::cmp::Ordering::Greater => self.forward(),
            std::cmp::Ordering::Equal => None,
        }
    }
}

impl TryFrom<u8> for Rank {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Rank::new(value).ok_or_else(|| format!("rank must be between 1 and 4, got {}", value))
    }
}

impl From<Rank> for u8 {
    fn from(rank: Rank) -> Self {
        rank.0
    }
}

/// Shorthand for building rank lists in catalogs and tests.
///
/// Values outside 1..=4 are dropped.
pub fn ranks(values: &[u8]) -> Vec<Rank> {
    values.iter().filter_map(|v| Rank::new(*v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_bounds() {
        assert!(Rank::new(0).is_none());
        assert!(Rank::new(5).is_none());
        assert_eq!(Rank::new(3).map(Rank::get), Some(3));
    }

    #[test]
    fn test_rank_steps() {
        assert_eq!(Rank::FRONT.forward(), None);
        assert_eq!(Rank::REAR.back(), None);
        assert_eq!(Rank::FRONT.step_toward(Rank::REAR), Rank::new(2));
        assert_eq!(Rank::REAR.step_toward(Rank::FRONT), Rank::new(3));
        assert_eq!(Rank::FRONT.step_toward(Rank::FRONT), None);
    }

    #[test]
    fn test_rank_rejects_bad_json() {
        let bad: Result<Rank, _> = serde_json::from_str("7");
        assert!(bad.is_err());
        let good: Rank = serde_json::from_str("2").unwrap();
        assert_eq!(good.get(), 2);
    }

    #[test]
    fn test_ranks_helper_filters() {
        assert_eq!(ranks(&[0, 1, 4, 9]), vec![Rank::FRONT, Rank::REAR]);
    }

    #[test]
    fn test_side_opponent() {
        assert_eq!(Side::Player.opponent(), Side::Enemy);
        assert_eq!(Side::Enemy.opponent(), Side::Player);
    }
}
