//! Combat rule constants - formula coefficients in one place

// Jam probability: (100 - condition) * CONDITION + heat * HEAT - analysis * ANALYSIS
pub const JAM_CONDITION_FACTOR: f32 = 0.2;
pub const JAM_HEAT_FACTOR: f32 = 0.1;
pub const JAM_ANALYSIS_FACTOR: f32 = 0.5;

// Weapon condition scale
pub const MAX_CONDITION: f32 = 100.0;

// Exhaustion thresholds as a fraction of max stamina
pub const WINDED_RATIO: f32 = 0.5;
pub const EXHAUSTED_RATIO: f32 = 0.25;

// Exhaustion penalties
pub const WINDED_ACCURACY_PENALTY: i32 = 10;
pub const EXHAUSTED_ACCURACY_PENALTY: i32 = 10;
pub const EXHAUSTED_DAMAGE_FACTOR: f32 = 0.75;

// Posture modifiers
pub const AGGRESSIVE_DAMAGE_FACTOR: f32 = 1.25;
pub const AGGRESSIVE_CRIT_BONUS: f32 = 10.0;
pub const DEFENSIVE_ARMOR_BONUS: u32 = 2;
pub const EVASIVE_ACCURACY_PENALTY: i32 = 15;

// Generation defaults
pub const DEFAULT_BASE_DAMAGE: f32 = 10.0;
pub const DEFAULT_JAM_CHANCE: f32 = 0.0;

// Accuracy used when an attacker has no weapon template
pub const UNARMED_ACCURACY: i32 = 70;

// Power score weights used to rank cards
pub const POWER_EFFECT_WEIGHT: f32 = 2.0;
pub const POWER_COST_WEIGHT: f32 = 0.5;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exhaustion_ratios_ordered() {
        assert!(EXHAUSTED_RATIO > 0.0 && EXHAUSTED_RATIO < WINDED_RATIO);
        assert!(WINDED_RATIO < 1.0);
    }

    #[test]
    fn test_damage_factors_reasonable() {
        assert!(EXHAUSTED_DAMAGE_FACTOR > 0.0 && EXHAUSTED_DAMAGE_FACTOR < 1.0);
        assert!(AGGRESSIVE_DAMAGE_FACTOR > 1.0);
    }
}
