//! Battle configuration with documented constants
//!
//! Session-level tunables live here. Pure formula coefficients (jam
//! factors, exhaustion ratios, posture modifiers) are in
//! `combat::constants` because they are part of the rules, not a setting.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::error::{CombatError, Result};

/// Configuration for the turn engine
///
/// A copy travels with every session so a persisted battle resumes with
/// the rules it started under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    // === CARDS ===
    /// Cards drawn into each combatant's hand when the battle starts
    pub opening_hand_size: usize,

    /// Cards drawn when a combatant becomes the active actor
    pub draw_per_turn: usize,

    /// Hand size above which turn-start draws are skipped
    pub max_hand_size: usize,

    // === RESOURCES ===
    /// Stamina restored when a combatant becomes active
    ///
    /// At 3 per turn a fighter spending a 2-stamina card every turn slowly
    /// recovers; spamming 4-stamina melee cards drives them to winded.
    pub stamina_regen_per_turn: u32,

    /// AP cost of the built-in one-rank reposition action
    pub reposition_ap_cost: u32,

    /// AP cost of clearing a jammed weapon
    pub clear_jam_ap_cost: u32,

    // === WEAPONS ===
    /// Heat added per ranged shot
    pub heat_per_shot: f32,

    /// Heat shed when the wielder's turn starts
    pub heat_decay_per_turn: f32,

    /// Condition lost per ranged shot (condition is 0-100)
    pub wear_per_shot: f32,

    // === CRITICALS ===
    /// Base chance (0-100) of a critical hit
    pub base_crit_chance: f32,

    /// Damage multiplier applied on a critical hit
    pub crit_multiplier: f32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            opening_hand_size: 4,
            draw_per_turn: 1,
            max_hand_size: 8,

            stamina_regen_per_turn: 3,
            reposition_ap_cost: 1,
            clear_jam_ap_cost: 1,

            heat_per_shot: 15.0,
            heat_decay_per_turn: 10.0,
            wear_per_shot: 2.0,

            base_crit_chance: 5.0,
            crit_multiplier: 1.5,
        }
    }
}

impl CombatConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config from TOML; missing keys take their defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: CombatConfig = toml::from_str(content)?;
        config.validate().map_err(CombatError::Config)?;
        Ok(config)
    }

    /// Load and validate a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.opening_hand_size > self.max_hand_size {
            return Err(format!(
                "opening_hand_size ({}) should be <= max_hand_size ({})",
                self.opening_hand_size, self.max_hand_size
            ));
        }

        let weapon_values = [
            ("heat_per_shot", self.heat_per_shot),
            ("heat_decay_per_turn", self.heat_decay_per_turn),
            ("wear_per_shot", self.wear_per_shot),
        ];
        for (name, value) in weapon_values {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("{} must be a non-negative number", name));
            }
        }

        if !(0.0..=100.0).contains(&self.base_crit_chance) {
            return Err(format!(
                "base_crit_chance ({}) must be within 0-100",
                self.base_crit_chance
            ));
        }

        if !self.crit_multiplier.is_finite() || self.crit_multiplier < 1.0 {
            return Err("crit_multiplier must be >= 1.0".into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = CombatConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = CombatConfig::from_toml_str("opening_hand_size = 2\nheat_per_shot = 20.0")
            .expect("partial config should parse");
        assert_eq!(config.opening_hand_size, 2);
        assert_eq!(config.heat_per_shot, 20.0);
        assert_eq!(config.draw_per_turn, 1);
    }

    #[test]
    fn test_invalid_crit_multiplier_rejected() {
        let result = CombatConfig::from_toml_str("crit_multiplier = 0.5");
        assert!(matches!(result, Err(CombatError::Config(_))));
    }

    #[test]
    fn test_hand_sizes_ordered() {
        let config = CombatConfig {
            opening_hand_size: 10,
            max_hand_size: 5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
