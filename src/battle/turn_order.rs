//! Initiative ordering and actor rotation

use crate::combat::combatant::Combatant;
use crate::combat::formulas::effective_initiative;
use crate::combat::zone::ZoneModifier;
use crate::core::types::CombatantId;

/// Active combatants by effective initiative, highest first.
///
/// The sort is stable, so ties keep roster order.
pub fn compute_turn_order(combatants: &[Combatant], zone: Option<&ZoneModifier>) -> Vec<CombatantId> {
    let mut ranked: Vec<(i32, CombatantId)> = combatants
        .iter()
        .filter(|c| c.is_active())
        .map(|c| (effective_initiative(c, zone), c.id))
        .collect();
    ranked.sort_by(|a, b| b.0.cmp(&a.0));
    ranked.into_iter().map(|(_, id)| id).collect()
}

/// Where the rotation lands after the current actor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NextActor {
    pub index: usize,
    /// The rotation passed the end of the order
    pub wrapped: bool,
}

/// Next index in `order` whose combatant is still in the fight.
///
/// Out-of-battle entries are skipped, not removed, so indices stay stable.
pub fn next_actor<F>(order: &[CombatantId], current: usize, is_active: F) -> Option<NextActor>
where
    F: Fn(CombatantId) -> bool,
{
    let len = order.len();
    (1..=len).find_map(|step| {
        let index = (current + step) % len;
        is_active(order[index]).then_some(NextActor {
            index,
            wrapped: current + step >= len,
        })
    })
}

/// First active entry at or after `start`, used when a rotation begins
pub fn first_active<F>(order: &[CombatantId], start: usize, is_active: F) -> Option<usize>
where
    F: Fn(CombatantId) -> bool,
{
    let len = order.len();
    (0..len)
        .map(|step| (start + step) % len)
        .find(|index| is_active(order[*index]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Controller, Rank, Side};

    fn combatant(id: u32, initiative: i32) -> Combatant {
        let mut c = Combatant::new(CombatantId(id), "c", Side::Enemy, Controller::Ai, Rank::FRONT);
        c.initiative = initiative;
        c
    }

    #[test]
    fn test_sorted_by_initiative_with_stable_ties() {
        let roster = vec![combatant(0, 10), combatant(1, 14), combatant(2, 10), combatant(3, 3)];
        let order = compute_turn_order(&roster, None);
        assert_eq!(
            order,
            vec![CombatantId(1), CombatantId(0), CombatantId(2), CombatantId(3)]
        );
    }

    #[test]
    fn test_defeated_excluded() {
        let mut roster = vec![combatant(0, 10), combatant(1, 14)];
        roster[1].apply_damage(1000, 0);
        assert_eq!(compute_turn_order(&roster, None), vec![CombatantId(0)]);
    }

    #[test]
    fn test_next_actor_skips_gaps_and_wraps() {
        let order = vec![CombatantId(0), CombatantId(1), CombatantId(2)];
        let active = |id: CombatantId| id != CombatantId(1);
        assert_eq!(
            next_actor(&order, 0, active),
            Some(NextActor {
                index: 2,
                wrapped: false
            })
        );
        assert_eq!(
            next_actor(&order, 2, active),
            Some(NextActor {
                index: 0,
                wrapped: true
            })
        );
    }

    #[test]
    fn test_next_actor_none_when_nobody_left() {
        let order = vec![CombatantId(0), CombatantId(1)];
        assert_eq!(next_actor(&order, 0, |_| false), None);
        assert_eq!(next_actor(&[], 0, |_| true), None);
    }

    #[test]
    fn test_single_actor_wraps_to_self() {
        let order = vec![CombatantId(4)];
        assert_eq!(
            next_actor(&order, 0, |_| true),
            Some(NextActor {
                index: 0,
                wrapped: true
            })
        );
    }

    #[test]
    fn test_first_active() {
        let order = vec![CombatantId(0), CombatantId(1)];
        assert_eq!(first_active(&order, 0, |id| id == CombatantId(1)), Some(1));
    }
}
