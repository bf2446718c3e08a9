//! Battle sessions - turn engine, AI and persistence
//!
//! A battle is a rank line-up of players and enemies taking turns in
//! initiative order, one submission per turn:
//! - play a card, step one rank, pass or flee
//! - effects tick after every action
//! - AI-controlled actors (enemies and squad allies) act through `EnemyPolicy`

pub mod action;
pub mod ai;
pub mod deck;
pub mod log;
pub mod outcome;
pub mod phase;
pub mod service;
pub mod session;
pub mod setup;
pub mod snapshot;
pub mod store;
pub mod turn_order;

// Re-exports for convenient access
pub use action::{
    Action, ActionReport, ActionSubmission, AvailableCard, CardSelector, CardSource, Unavailable,
};
pub use ai::{ArchetypePolicy, ArchetypeProfile, BattleView, Decision, EnemyPolicy};
pub use deck::{CardPiles, PileSizes};
pub use log::{BattleEvent, BattleEventType, BattleLog};
pub use outcome::{BattleOutcome, BattleReport, CombatantReport};
pub use phase::{transition, Phase, PhaseEvent};
pub use service::BattleService;
pub use session::BattleSession;
pub use setup::{BattleMode, BattleSetup, EnemySetup, PlayerSetup, ResourceOverrides};
pub use snapshot::{CombatantView, PileView, SessionSnapshot};
pub use store::{JsonDirStore, MemoryStore, SessionStore};
pub use turn_order::compute_turn_order;
