//! Property-based tests for combat math, mastery and turn order

use proptest::prelude::*;

use cold_steel::battle::turn_order::compute_turn_order;
use cold_steel::combat::combatant::{Combatant, CombatantStatus, Pool, WeaponState};
use cold_steel::combat::formulas::jam_probability;
use cold_steel::combat::weapons::{WeaponCategory, WeaponTemplate};
use cold_steel::core::types::{CombatantId, Controller, Rank, Side};
use cold_steel::mastery::record::MasteryRecord;
use cold_steel::mastery::table::MAX_LEVEL;

fn combatant(id: u32, initiative: i32) -> Combatant {
    let mut c = Combatant::new(CombatantId(id), "Grunt", Side::Enemy, Controller::Ai, Rank::FRONT);
    c.initiative = initiative;
    c
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(2000))]

    /// Jam probability stays a percentage for any weapon state
    #[test]
    fn prop_jam_probability_bounded(
        condition in -50.0f32..200.0,
        heat in -100.0f32..5_000.0,
        analysis in 0u32..500
    ) {
        let p = jam_probability(condition, heat, analysis);
        prop_assert!((0.0..=100.0).contains(&p));
    }

    /// Worse condition or more heat never makes a jam less likely
    #[test]
    fn prop_jam_probability_monotone(
        condition in 0.0f32..100.0,
        wear in 0.0f32..100.0,
        heat in 0.0f32..500.0,
        extra_heat in 0.0f32..500.0
    ) {
        let base = jam_probability(condition, heat, 0);
        prop_assert!(jam_probability((condition - wear).max(0.0), heat, 0) >= base);
        prop_assert!(jam_probability(condition, heat + extra_heat, 0) >= base);
    }

    /// A jam roll jams exactly when it lands under the clamped chance
    #[test]
    fn prop_jam_check_matches_roll(
        condition in 0.0f32..100.0,
        heat in 0.0f32..2_000.0,
        modifier in -20.0f32..40.0,
        roll in 0.0f32..100.0
    ) {
        let mut weapon = WeaponState::from_template(&WeaponTemplate::service_pistol());
        weapon.condition = condition;
        weapon.heat = heat;
        let chance = (jam_probability(condition, heat, 0) + modifier).clamp(0.0, 100.0);
        let jammed = weapon.jam_check(roll, 0, modifier);
        prop_assert_eq!(jammed, roll < chance);
        prop_assert_eq!(weapon.is_jammed, jammed);
    }

    /// Damage never drives HP below zero and 0 HP always means defeat
    #[test]
    fn prop_damage_clamps_at_zero(
        max_hp in 1u32..500,
        current in 0u32..500,
        armor in 0u32..30,
        hits in proptest::collection::vec(0u32..200, 1..10)
    ) {
        let mut target = combatant(0, 10);
        target.hp = Pool::with_current(current.min(max_hp).max(1), max_hp);
        target.armor = armor;
        for incoming in hits {
            let before = target.hp.current;
            let outcome = target.apply_damage(incoming, 0);
            prop_assert_eq!(outcome.effective, incoming.saturating_sub(armor));
            prop_assert_eq!(outcome.hp_after, before.saturating_sub(outcome.effective));
            prop_assert!(target.hp.current <= target.hp.max);
        }
        prop_assert_eq!(target.hp.current == 0, target.status == CombatantStatus::Defeated);
    }

    /// Levels and unlocks only ever grow, and stay under the cap
    #[test]
    fn prop_mastery_monotone(awards in proptest::collection::vec(0u32..3_000, 1..30)) {
        let mut record = MasteryRecord::new("p", WeaponCategory::Pistol, 0);
        let mut lifetime = 0u64;
        for (t, xp) in awards.into_iter().enumerate() {
            let level = record.level;
            let unlocked = record.unlocked.len();
            let award = record.award_xp(xp, t as u64);
            lifetime += u64::from(xp);
            prop_assert!(record.level >= level);
            prop_assert!(record.level <= MAX_LEVEL);
            prop_assert_eq!(record.level - level, award.levels_gained);
            prop_assert_eq!(record.unlocked.len(), unlocked + award.new_unlocks.len());
            prop_assert_eq!(record.lifetime_xp, lifetime);
            prop_assert!(record.validate().is_ok());
        }
    }

    /// Turn order is a deterministic permutation sorted by initiative, ties by id
    #[test]
    fn prop_turn_order_sorted_and_stable(initiatives in proptest::collection::vec(-5i32..30, 1..12)) {
        let combatants: Vec<Combatant> = initiatives
            .iter()
            .enumerate()
            .map(|(i, init)| combatant(i as u32, *init))
            .collect();

        let order = compute_turn_order(&combatants, None);
        prop_assert_eq!(order.len(), combatants.len());
        prop_assert_eq!(&order, &compute_turn_order(&combatants, None));

        for pair in order.windows(2) {
            let a = &combatants[pair[0].0 as usize];
            let b = &combatants[pair[1].0 as usize];
            prop_assert!(a.initiative > b.initiative || (a.initiative == b.initiative && a.id < b.id));
        }
    }
}
