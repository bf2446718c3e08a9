//! Archetype profiles loaded from TOML
//!
//! A profile says where an archetype wants to stand, when it gives up and
//! how readily it takes poor shots.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::combat::combatant::AiType;
use crate::core::error::{CombatError, Result};
use crate::core::types::{ranks, Rank};

/// Default directory for archetype files
pub const ARCHETYPE_DIR: &str = "data/archetypes";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchetypeProfile {
    /// Set from the filename when loaded
    #[serde(default)]
    pub name: String,
    /// Ranks this archetype tries to fight from, most preferred first
    pub preferred_ranks: Vec<Rank>,
    /// HP fraction (0.0 - 1.0) below which it retreats
    pub retreat_hp_fraction: f32,
    /// Morale fraction (0.0 - 1.0) below which it retreats
    pub retreat_morale_fraction: f32,
    /// 0.0 = only takes sure shots, 1.0 = fires at anything
    pub aggression: f32,
    #[serde(default = "default_true")]
    pub can_flee: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ArchetypeProfile {
    fn default() -> Self {
        Self::squad()
    }
}

impl ArchetypeProfile {
    /// Cowardly looters that hang back and run early
    pub fn scavenger() -> Self {
        Self {
            name: "scavenger".into(),
            preferred_ranks: ranks(&[2, 3]),
            retreat_hp_fraction: 0.4,
            retreat_morale_fraction: 0.5,
            aggression: 0.4,
            can_flee: true,
        }
    }

    /// Disciplined troops holding the middle
    pub fn enforcer() -> Self {
        Self {
            name: "enforcer".into(),
            preferred_ranks: ranks(&[2, 3]),
            retreat_hp_fraction: 0.2,
            retreat_morale_fraction: 0.25,
            aggression: 0.6,
            can_flee: true,
        }
    }

    /// Mindless machines rushing the front line
    pub fn feral_drone() -> Self {
        Self {
            name: "feral_drone".into(),
            preferred_ranks: ranks(&[1]),
            retreat_hp_fraction: 0.0,
            retreat_morale_fraction: 0.0,
            aggression: 1.0,
            can_flee: false,
        }
    }

    /// Never flees; falls back to heal up at most
    pub fn boss() -> Self {
        Self {
            name: "boss".into(),
            preferred_ranks: ranks(&[1, 2]),
            retreat_hp_fraction: 0.25,
            retreat_morale_fraction: 0.0,
            aggression: 0.8,
            can_flee: false,
        }
    }

    /// AI-controlled squad allies
    pub fn squad() -> Self {
        Self {
            name: "squad".into(),
            preferred_ranks: ranks(&[1, 2, 3]),
            retreat_hp_fraction: 0.15,
            retreat_morale_fraction: 0.0,
            aggression: 0.5,
            can_flee: false,
        }
    }

    pub fn builtin(ai_type: AiType) -> Self {
        match ai_type {
            AiType::Scavenger => Self::scavenger(),
            AiType::Enforcer => Self::enforcer(),
            AiType::FeralDrone => Self::feral_drone(),
            AiType::Boss => Self::boss(),
        }
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.preferred_ranks.is_empty() {
            return Err(format!("{}: preferred_ranks must not be empty", self.name));
        }
        let fractions = [
            ("retreat_hp_fraction", self.retreat_hp_fraction),
            ("retreat_morale_fraction", self.retreat_morale_fraction),
            ("aggression", self.aggression),
        ];
        for (field, value) in fractions {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("{}: {} must be within 0.0-1.0", self.name, field));
            }
        }
        Ok(())
    }

    /// Closest preferred rank to `from`
    pub fn nearest_preferred(&self, from: Rank) -> Option<Rank> {
        self.preferred_ranks
            .iter()
            .copied()
            .min_by_key(|r| (r.distance(from), r.get()))
    }
}

/// File name used for an archetype
pub fn archetype_name(ai_type: AiType) -> &'static str {
    match ai_type {
        AiType::Scavenger => "scavenger",
        AiType::Enforcer => "enforcer",
        AiType::FeralDrone => "feral_drone",
        AiType::Boss => "boss",
    }
}

/// Load `{dir}/{name}.toml`
pub fn load_archetype_from(dir: &Path, name: &str) -> Result<ArchetypeProfile> {
    let path = dir.join(format!("{}.toml", name));
    let contents = fs::read_to_string(&path)?;
    let mut profile: ArchetypeProfile = toml::from_str(&contents)?;
    profile.name = name.to_string();
    profile.validate().map_err(CombatError::Config)?;
    Ok(profile)
}

/// Load from `data/archetypes/{name}.toml`
pub fn load_archetype(name: &str) -> Result<ArchetypeProfile> {
    load_archetype_from(&PathBuf::from(ARCHETYPE_DIR), name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_profiles_valid() {
        for ai_type in AiType::all() {
            assert!(ArchetypeProfile::builtin(*ai_type).validate().is_ok());
        }
        assert!(ArchetypeProfile::squad().validate().is_ok());
    }

    #[test]
    fn test_boss_never_flees() {
        assert!(!ArchetypeProfile::boss().can_flee);
    }

    #[test]
    fn test_nearest_preferred() {
        let profile = ArchetypeProfile::scavenger();
        assert_eq!(profile.nearest_preferred(Rank::FRONT), Rank::new(2));
        assert_eq!(profile.nearest_preferred(Rank::REAR), Rank::new(3));
    }

    #[test]
    fn test_load_data_files() {
        for ai_type in AiType::all() {
            let name = archetype_name(*ai_type);
            let profile = load_archetype(name).expect("archetype file should load");
            assert_eq!(profile.name, name);
        }
    }

    #[test]
    fn test_data_files_match_builtin_flee_rules() {
        let boss = load_archetype("boss").unwrap();
        assert!(!boss.can_flee);
        let scavenger = load_archetype("scavenger").unwrap();
        assert!(scavenger.can_flee);
    }

    #[test]
    fn test_out_of_range_fraction_rejected() {
        let mut profile = ArchetypeProfile::enforcer();
        profile.aggression = 1.5;
        assert!(profile.validate().is_err());
    }
}
