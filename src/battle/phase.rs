//! Battle phase state machine
//!
//! Every legal phase change is one row of `Phase::TRANSITIONS`. The session
//! never assigns a phase directly; it fires an event and takes what the
//! table returns.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Initiative,
    PlayerTurn,
    EnemyTurn,
    /// Transient: always left within the same call that entered it
    Resolution,
    Victory,
    Defeat,
    Flee,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseEvent {
    /// The next actor fights for the player side
    PlayerUp,
    /// The next actor fights for the enemy side
    EnemyUp,
    /// An action (or pass) finished applying
    ActionResolved,
    EnemiesDefeated,
    PlayerDefeated,
    PlayerFled,
    /// Combatants joined or left; order must be recomputed
    RosterChanged,
}

use Phase::*;
use PhaseEvent::*;

impl Phase {
    /// (from, event, to) for every legal edge
    pub const TRANSITIONS: &'static [(Phase, PhaseEvent, Phase)] = &[
        (Initiative, PlayerUp, PlayerTurn),
        (Initiative, EnemyUp, EnemyTurn),
        (Initiative, RosterChanged, Initiative),
        (PlayerTurn, ActionResolved, Resolution),
        (PlayerTurn, RosterChanged, Initiative),
        (EnemyTurn, ActionResolved, Resolution),
        (EnemyTurn, RosterChanged, Initiative),
        (Resolution, PlayerUp, PlayerTurn),
        (Resolution, EnemyUp, EnemyTurn),
        (Resolution, EnemiesDefeated, Victory),
        (Resolution, PlayerDefeated, Defeat),
        (Resolution, PlayerFled, Flee),
    ];

    pub fn is_terminal(self) -> bool {
        matches!(self, Victory | Defeat | Flee)
    }

    /// Phases in which an actor may submit
    pub fn accepts_actions(self) -> bool {
        matches!(self, PlayerTurn | EnemyTurn)
    }
}

/// Next phase, or `None` when the edge does not exist
pub fn transition(phase: Phase, event: PhaseEvent) -> Option<Phase> {
    Phase::TRANSITIONS
        .iter()
        .find(|(from, on, _)| *from == phase && *on == event)
        .map(|(_, _, to)| *to)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_PHASES: [Phase; 7] = [
        Initiative, PlayerTurn, EnemyTurn, Resolution, Victory, Defeat, Flee,
    ];
    const ALL_EVENTS: [PhaseEvent; 7] = [
        PlayerUp,
        EnemyUp,
        ActionResolved,
        EnemiesDefeated,
        PlayerDefeated,
        PlayerFled,
        RosterChanged,
    ];

    #[test]
    fn test_terminal_phases_have_no_exits() {
        for phase in ALL_PHASES.iter().filter(|p| p.is_terminal()) {
            for event in ALL_EVENTS {
                assert_eq!(transition(*phase, event), None);
            }
        }
    }

    #[test]
    fn test_table_has_no_duplicate_edges() {
        for (i, (from, on, _)) in Phase::TRANSITIONS.iter().enumerate() {
            for (other_from, other_on, _) in &Phase::TRANSITIONS[i + 1..] {
                assert!(!(from == other_from && on == other_on));
            }
        }
    }

    #[test]
    fn test_turn_cycle() {
        let phase = transition(Initiative, PlayerUp).unwrap();
        let phase = transition(phase, ActionResolved).unwrap();
        assert_eq!(phase, Resolution);
        let phase = transition(phase, EnemyUp).unwrap();
        assert_eq!(phase, EnemyTurn);
        let phase = transition(phase, ActionResolved).unwrap();
        assert_eq!(transition(phase, PlayerDefeated), Some(Defeat));
    }

    #[test]
    fn test_resolution_is_only_entered_by_actions() {
        for (from, on, to) in Phase::TRANSITIONS {
            if *to == Resolution {
                assert_eq!(*on, ActionResolved);
                assert!(from.accepts_actions());
            }
        }
    }

    #[test]
    fn test_cannot_skip_resolution() {
        assert_eq!(transition(PlayerTurn, EnemiesDefeated), None);
        assert_eq!(transition(EnemyTurn, PlayerUp), None);
    }

    #[test]
    fn test_roster_change_restarts_initiative() {
        assert_eq!(transition(EnemyTurn, RosterChanged), Some(Initiative));
    }
}
