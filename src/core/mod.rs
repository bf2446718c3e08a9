pub mod config;
pub mod error;
pub mod types;

pub use config::CombatConfig;
pub use error::{ActionRejection, CombatError, Result};
pub use types::{ranks, BattleId, CombatantId, Controller, Rank, Side, Timestamp, Turn};
