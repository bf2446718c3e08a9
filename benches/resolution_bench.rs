//! Benchmarks for card resolution and whole policy-driven battles.

use std::hint::black_box;

use cold_steel::battle::action::ActionSubmission;
use cold_steel::battle::ai::ArchetypePolicy;
use cold_steel::battle::session::BattleSession;
use cold_steel::battle::setup::{BattleSetup, EnemySetup, PlayerSetup};
use cold_steel::combat::catalog::CombatCatalog;
use cold_steel::combat::generation::generate_standard_cards;
use cold_steel::core::types::{CombatantId, Rank};
use criterion::{criterion_group, criterion_main, Criterion};

fn skirmish(seed: u64) -> BattleSetup {
    let rank = |v| Rank::new(v).unwrap_or(Rank::FRONT);
    let mut player = PlayerSetup::new("Bench", "service_pistol", rank(2));
    player.initiative = 50;
    BattleSetup::new(
        vec![player, PlayerSetup::ally("Second", "sawn_off", Rank::FRONT)],
        vec![
            EnemySetup::new("scavenger", Rank::FRONT),
            EnemySetup::new("raider_gunner", rank(2)),
            EnemySetup::new("enforcer", rank(3)),
        ],
        seed,
    )
}

fn bench_single_action(c: &mut Criterion) {
    let catalog = CombatCatalog::builtin();
    let session = BattleSession::new(&skirmish(7), &catalog).unwrap();
    let submission = ActionSubmission::end_turn(CombatantId(0));

    c.bench_function("preview_end_turn", |b| {
        b.iter(|| {
            let result = session.preview(black_box(&submission), &catalog, 1);
            black_box(result)
        });
    });
}

fn bench_full_battle(c: &mut Criterion) {
    let catalog = CombatCatalog::builtin();
    let policy = ArchetypePolicy::builtin();

    c.bench_function("policy_battle_1v3", |b| {
        b.iter(|| {
            let mut session = BattleSession::new(&skirmish(black_box(42)), &catalog).unwrap();
            for step in 0..1_000u64 {
                match session.autopilot(&policy, &catalog, step) {
                    Ok(Some(_)) => {}
                    _ => break,
                }
            }
            black_box(session.outcome())
        });
    });
}

fn bench_card_generation(c: &mut Criterion) {
    let catalog = CombatCatalog::builtin();
    c.bench_function("generate_assault_rifle_deck", |b| {
        b.iter(|| black_box(generate_standard_cards(&catalog, black_box("assault_rifle"), "b-", 0)));
    });
}

criterion_group!(benches, bench_single_action, bench_full_battle, bench_card_generation);
criterion_main!(benches);
