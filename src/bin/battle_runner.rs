//! Headless Battle Runner
//!
//! Plays many seeded battles with the policy driving both sides and prints
//! per-battle results plus a summary, for balance passes.

use cold_steel::battle::ai::ArchetypePolicy;
use cold_steel::battle::outcome::BattleOutcome;
use cold_steel::battle::session::BattleSession;
use cold_steel::battle::setup::{BattleSetup, EnemySetup, PlayerSetup};
use cold_steel::combat::catalog::CombatCatalog;
use cold_steel::core::error::{CombatError, Result};
use cold_steel::core::types::{Rank, Side};
use clap::Parser;
use rayon::prelude::*;
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Headless Battle Runner - policy vs policy battles for balance testing
#[derive(Parser, Debug)]
#[command(name = "battle_runner")]
#[command(about = "Run seeded battles headlessly and output outcome statistics")]
struct Args {
    /// Player weapon id from the catalog
    #[arg(long, default_value = "service_pistol")]
    weapon: String,

    /// Comma-separated enemy template ids, front rank first
    #[arg(long, default_value = "scavenger,raider_gunner")]
    enemies: String,

    /// AI squad allies fighting beside the player
    #[arg(long, default_value_t = 0)]
    allies: u32,

    /// Arena zone id; none fights on open ground
    #[arg(long)]
    zone: Option<String>,

    /// Number of battles to play
    #[arg(long, default_value_t = 100)]
    count: u64,

    /// Seed of the first battle; later battles use seed + n
    #[arg(long)]
    seed: Option<u64>,

    /// Actions before a battle is called a timeout
    #[arg(long, default_value_t = 2000)]
    max_actions: usize,

    /// Directory of archetype TOML overrides
    #[arg(long)]
    archetypes: Option<PathBuf>,

    /// Output format: json or text
    #[arg(long, default_value = "json")]
    format: String,

    /// Log every battle event to stderr
    #[arg(long, short = 'v')]
    verbose: bool,
}

/// One battle's result
#[derive(Debug, Serialize)]
struct BattleResult {
    seed: u64,
    outcome: Option<BattleOutcome>,
    turns: u32,
    actions: usize,
    player_hp_remaining: u32,
    player_damage_dealt: u32,
    enemy_kills: u32,
}

/// JSON output structure
#[derive(Debug, Serialize)]
struct RunSummary {
    weapon: String,
    enemies: Vec<String>,
    battles: usize,
    victories: usize,
    defeats: usize,
    flees: usize,
    timeouts: usize,
    win_rate: f32,
    mean_turns: f32,
    results: Vec<BattleResult>,
}

fn rank_for(slot: usize) -> Rank {
    Rank::ALL[slot % Rank::ALL.len()]
}

fn build_setup(args: &Args, enemies: &[String], seed: u64) -> BattleSetup {
    let mut players = vec![PlayerSetup::new("Runner", &args.weapon, Rank::FRONT)];
    for i in 0..args.allies {
        let name = format!("Ally {}", i + 1);
        players.push(PlayerSetup::ally(&name, &args.weapon, rank_for(i as usize + 1)));
    }
    let enemies = enemies
        .iter()
        .enumerate()
        .map(|(i, id)| EnemySetup::new(id, rank_for(i)))
        .collect();
    let mut setup = BattleSetup::new(players, enemies, seed);
    setup.zone_id = args.zone.clone();
    setup
}

fn run_battle(
    args: &Args,
    enemies: &[String],
    seed: u64,
    catalog: &CombatCatalog,
    policy: &ArchetypePolicy,
) -> Result<BattleResult> {
    let setup = build_setup(args, enemies, seed);
    let mut session = BattleSession::new(&setup, catalog)?;

    let mut actions = 0;
    while !session.is_finished() && actions < args.max_actions {
        let now = actions as u64;
        match session.autopilot(policy, catalog, now)? {
            Some(report) => {
                if args.verbose {
                    for event in &report.events {
                        eprintln!("  [{}] T{} {:?}: {}", seed, event.turn, event.event_type, event.description);
                    }
                }
            }
            None => break,
        }
        actions += 1;
    }

    let players = session
        .combatants()
        .iter()
        .filter(|c| c.side == Side::Player);
    let (hp, dealt, kills) = players.fold((0, 0, 0), |(hp, dealt, kills), c| {
        (hp + c.hp.current, dealt + c.stats.damage_dealt, kills + c.stats.kills)
    });

    Ok(BattleResult {
        seed,
        outcome: session.outcome(),
        turns: session.turn(),
        actions,
        player_hp_remaining: hp,
        player_damage_dealt: dealt,
        enemy_kills: kills,
    })
}

fn summarize(args: &Args, enemies: Vec<String>, results: Vec<BattleResult>) -> RunSummary {
    let count = |outcome: Option<BattleOutcome>| results.iter().filter(|r| r.outcome == outcome).count();
    let victories = count(Some(BattleOutcome::Victory));
    let battles = results.len();
    let total_turns: u64 = results.iter().map(|r| u64::from(r.turns)).sum();
    RunSummary {
        weapon: args.weapon.clone(),
        enemies,
        battles,
        victories,
        defeats: count(Some(BattleOutcome::Defeat)),
        flees: count(Some(BattleOutcome::Flee)),
        timeouts: count(None),
        win_rate: if battles == 0 { 0.0 } else { victories as f32 / battles as f32 },
        mean_turns: if battles == 0 { 0.0 } else { total_turns as f32 / battles as f32 },
        results,
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("cold_steel=warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let catalog = CombatCatalog::builtin();
    if catalog.weapon(&args.weapon).is_none() {
        return Err(CombatError::Catalog(format!("unknown weapon '{}'", args.weapon)));
    }
    let enemies: Vec<String> = args
        .enemies
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect();

    let policy = match &args.archetypes {
        Some(dir) => ArchetypePolicy::load_from(dir)?,
        None => ArchetypePolicy::builtin(),
    };

    let first_seed = args.seed.unwrap_or_else(rand::random);
    let results = (0..args.count)
        .into_par_iter()
        .map(|n| run_battle(&args, &enemies, first_seed.wrapping_add(n), &catalog, &policy))
        .collect::<Result<Vec<_>>>()?;

    let summary = summarize(&args, enemies, results);

    match args.format.as_str() {
        "text" => {
            println!("=== Battle Runner ===");
            println!("Weapon: {}  Enemies: {}", summary.weapon, summary.enemies.join(", "));
            println!(
                "Battles: {}  Victories: {}  Defeats: {}  Flees: {}  Timeouts: {}",
                summary.battles, summary.victories, summary.defeats, summary.flees, summary.timeouts
            );
            println!("Win rate: {:.1}%", summary.win_rate * 100.0);
            println!("Mean turns: {:.1}", summary.mean_turns);
        }
        "json" => println!("{}", serde_json::to_string_pretty(&summary)?),
        other => {
            eprintln!("Unknown format '{}', defaulting to json", other);
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }
    Ok(())
}
