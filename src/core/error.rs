use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::types::{BattleId, CombatantId, Rank};

/// Why a submitted action was refused.
///
/// A rejection never changes session state.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionRejection {
    #[error("Battle is not active")]
    BattleNotActive,

    #[error("Not your turn: expected {expected}, got {actual}")]
    NotYourTurn {
        expected: CombatantId,
        actual: CombatantId,
    },

    #[error("Unknown actor: {0}")]
    UnknownActor(CombatantId),

    #[error("Unknown target: {0}")]
    UnknownTarget(CombatantId),

    #[error("Invalid card index: {0}")]
    InvalidCardIndex(usize),

    #[error("Unknown card: {0}")]
    UnknownCard(String),

    #[error("Card {card} is unavailable: {reason}")]
    CardUnavailable { card: String, reason: String },

    #[error("Insufficient AP: need {need}, have {have}")]
    InsufficientAp { need: u32, have: u32 },

    #[error("Insufficient stamina: need {need}, have {have}")]
    InsufficientStamina { need: u32, have: u32 },

    #[error("Insufficient ammo: need {need}, have {have}")]
    InsufficientAmmo { need: u32, have: u32 },

    #[error("Target rank {0} is not allowed for this card")]
    InvalidTargetRank(Rank),

    #[error("No target at rank {0}")]
    NoTargetAtRank(Rank),

    #[error("Card requires a target rank")]
    MissingTarget,

    #[error("Cannot reposition from {from} to {to}")]
    InvalidReposition { from: Rank, to: Rank },
}

#[derive(Error, Debug)]
pub enum CombatError {
    #[error("Action rejected: {0}")]
    Rejected(#[from] ActionRejection),

    #[error("Battle not found: {0}")]
    BattleNotFound(BattleId),

    #[error("Corrupted battle state: {0}")]
    CorruptState(String),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Session store error: {0}")]
    Store(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

impl CombatError {
    /// The validation failure behind this error, if it is one
    pub fn rejection(&self) -> Option<&ActionRejection> {
        match self {
            CombatError::Rejected(r) => Some(r),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, CombatError>;
