//! Cold Steel - rank-based tactical card combat
//!
//! Weapons generate cards, cards drive a turn engine, and finished battles
//! feed weapon mastery. Worn, hot firearms jam, and when the
//! magazine runs dry the fight turns to cold steel.

pub mod battle;
pub mod combat;
pub mod core;
pub mod mastery;
