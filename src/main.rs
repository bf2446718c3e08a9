//! Cold Steel - Terminal Battle
//!
//! Plays one battle against the builtin catalog from stdin. Enemy turns are
//! taken by the archetype policy between commands.

use cold_steel::battle::action::{Action, ActionReport, ActionSubmission};
use cold_steel::battle::ai::ArchetypePolicy;
use cold_steel::battle::session::BattleSession;
use cold_steel::battle::setup::{BattleSetup, EnemySetup, PlayerSetup};
use cold_steel::combat::catalog::CombatCatalog;
use cold_steel::core::error::Result;
use cold_steel::core::types::{Rank, Timestamp};

use std::io::{self, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing_subscriber::EnvFilter;

fn now() -> Timestamp {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis() as Timestamp)
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("cold_steel=debug"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let catalog = CombatCatalog::builtin();
    let archetypes = Path::new(cold_steel::battle::ai::archetype::ARCHETYPE_DIR);
    let policy = if archetypes.is_dir() {
        ArchetypePolicy::load_from(archetypes)?
    } else {
        tracing::warn!("No archetype data found, using builtin profiles");
        ArchetypePolicy::builtin()
    };

    let front = Rank::FRONT;
    let second = Rank::new(2).unwrap_or(front);
    let third = Rank::new(3).unwrap_or(second);
    let mut setup = BattleSetup::new(
        vec![PlayerSetup::new("Wren", "service_pistol", second)],
        vec![
            EnemySetup::new("scavenger", front),
            EnemySetup::new("raider_gunner", third),
        ],
        rand::random(),
    );
    setup.started_at = now();

    let mut session = BattleSession::new(&setup, &catalog)?;

    println!("\n=== COLD STEEL ===");
    println!("Commands:");
    println!("  status / s          - Show the battlefield");
    println!("  cards / c           - List your cards");
    println!("  play <i> [rank]     - Play card i, aiming at rank");
    println!("  move <rank>         - Step one rank");
    println!("  auto / a            - Let the squad policy take your action");
    println!("  end / e             - End your turn");
    println!("  flee                - Run for it");
    println!("  quit / q            - Exit");
    println!();

    print_reports(&session.run_ai_turns(&policy, &catalog, now())?);

    while !session.is_finished() {
        display_status(&session);

        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let words: Vec<&str> = input.split_whitespace().collect();
        let Some(command) = words.first().copied() else {
            continue;
        };

        if command == "quit" || command == "q" {
            break;
        }
        if command == "status" || command == "s" {
            display_detailed_status(&session);
            continue;
        }
        if command == "cards" || command == "c" {
            display_cards(&session, &catalog);
            continue;
        }

        let Some(actor) = session.current_actor() else {
            break;
        };
        let outcome = match command {
            "auto" | "a" => session.autopilot(&policy, &catalog, now()).map(|r| r.into_iter().collect::<Vec<_>>()),
            "end" | "e" => session.end_turn(actor, &catalog, now()).map(|r| vec![r]),
            "flee" => {
                let submission = ActionSubmission::new(actor, Action::Flee);
                session.submit(&submission, &catalog, now()).map(|r| vec![r])
            }
            "move" => match words.get(1).and_then(|w| parse_rank(w)) {
                Some(to) => {
                    let submission = ActionSubmission::new(actor, Action::Reposition { to });
                    session.submit(&submission, &catalog, now()).map(|r| vec![r])
                }
                None => {
                    println!("Usage: move <1-4>");
                    continue;
                }
            },
            "play" => match words.get(1).and_then(|w| w.parse::<usize>().ok()) {
                Some(index) => {
                    let target_rank = words.get(2).and_then(|w| parse_rank(w));
                    let submission = ActionSubmission::play(actor, index, target_rank);
                    session.submit(&submission, &catalog, now()).map(|r| vec![r])
                }
                None => {
                    println!("Usage: play <index> [rank]");
                    continue;
                }
            },
            _ => {
                println!("Unknown command: {}", command);
                continue;
            }
        };

        match outcome {
            Ok(reports) => print_reports(&reports),
            Err(e) if e.rejection().is_some() => {
                println!("Rejected: {}", e);
                continue;
            }
            Err(e) => return Err(e),
        }

        print_reports(&session.run_ai_turns(&policy, &catalog, now())?);
    }

    if let Some(outcome) = session.outcome() {
        println!("\nBattle over: {:?} after {} turns", outcome, session.turn());
    }
    tracing::info!("Cold Steel shutting down");
    Ok(())
}

fn parse_rank(word: &str) -> Option<Rank> {
    word.parse::<u8>().ok().and_then(Rank::new)
}

fn print_reports(reports: &[ActionReport]) {
    for report in reports {
        for event in &report.events {
            println!("  [T{}] {}", event.turn, event.description);
        }
    }
}

fn display_status(session: &BattleSession) {
    let actor = session
        .current_actor()
        .and_then(|id| session.combatant(id))
        .map_or("-", |c| c.name.as_str());
    println!(
        "\n--- Turn {} | {:?} | acting: {} ---",
        session.turn(),
        session.phase(),
        actor
    );
}

fn display_detailed_status(session: &BattleSession) {
    for rank in Rank::ALL {
        let here: Vec<String> = session
            .combatants()
            .iter()
            .filter(|c| c.rank == rank && c.is_active())
            .map(|c| {
                format!(
                    "{} {:?} HP {}/{} AP {}/{} ST {}/{} MO {}/{}",
                    c.name,
                    c.side,
                    c.hp.current,
                    c.hp.max,
                    c.ap.current,
                    c.ap.max,
                    c.stamina.current,
                    c.stamina.max,
                    c.morale.current,
                    c.morale.max
                )
            })
            .collect();
        println!("{}: {}", rank, here.join(" | "));
    }
    for c in session.combatants().iter().filter(|c| !c.is_active()) {
        println!("  {} is {:?}", c.name, c.status);
    }
}

fn display_cards(session: &BattleSession, catalog: &CombatCatalog) {
    let Some(actor) = session.current_actor() else {
        return;
    };
    match session.available_cards(actor, catalog) {
        Ok(cards) => {
            for (i, available) in cards.iter().enumerate() {
                let card = &available.card;
                let note = available
                    .unavailable
                    .as_ref()
                    .map_or(String::new(), |u| format!(" ({})", u));
                let ranks: Vec<String> = card.optimal_ranks.iter().map(|r| r.to_string()).collect();
                println!(
                    "  {}: {} [{:?}] AP {} ST {} dmg {} ranks {}{}",
                    i,
                    card.name,
                    card.card_type,
                    card.ap_cost,
                    card.stamina_cost,
                    card.damage,
                    ranks.join(","),
                    note
                );
            }
        }
        Err(e) => println!("{}", e),
    }
}
