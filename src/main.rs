use clap::Parser;
use flexi_logger::Logger;
use rummikub_engine::{Game, GameConfig, INITIAL_MELD_POINTS};

/// Play a full game between automated players and print the result
#[derive(Parser, Debug)]
#[command(name = "rummikub-engine", version)]
struct Cli {
    /// Number of players (2-4)
    #[arg(short = 'p', long, default_value_t = 4)]
    players: usize,

    /// Tiles dealt to each player
    #[arg(long, default_value_t = 14)]
    hand_size: usize,

    /// Points needed for a first meld
    #[arg(long, default_value_t = INITIAL_MELD_POINTS)]
    meld_threshold: u32,

    /// Seed for a reproducible deal
    #[arg(short = 's', long)]
    seed: Option<u64>,

    /// Stop after this many turns
    #[arg(long, default_value_t = 1000)]
    max_turns: usize,

    /// Log every automated play
    #[arg(short = 'v', long, default_value_t = false)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    let _logger = Logger::try_with_env_or_str(level)
        .and_then(|logger| logger.start())
        .map_err(|e| eprintln!("Failed to start logger: {}", e))
        .ok();

    let config = GameConfig {
        players: cli.players,
        hand_size: cli.hand_size,
        meld_threshold: cli.meld_threshold,
        seed: cli.seed,
    };

    let mut game = match Game::new(config) {
        Ok(game) => game,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    };

    println!("Rummikub engine ({})", env!("BUILD_COMMIT"));

    // A full round in which nobody moves and nobody can draw ends the game
    let mut idle_turns = 0;
    let mut turns = 0;
    while turns < cli.max_turns && game.winner().is_none() && idle_turns < game.players() {
        let pending = game.plan_ai_turn();
        let made_move = pending.outcome.made_move;
        let pool_before = game.pool_len();

        if let Err(e) = game.commit_ai_turn(pending) {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }

        if made_move || game.pool_len() != pool_before {
            idle_turns = 0;
        } else {
            idle_turns += 1;
        }
        turns += 1;
    }

    println!(
        "\nAfter {} turns, {} sets on the board, {} tiles in pool",
        turns,
        game.board().len(),
        game.pool_len()
    );
    for (i, set) in game.board().sets().iter().enumerate() {
        let tiles: Vec<String> = set.tiles().iter().map(|t| t.id()).collect();
        println!("  Set {}: [{}] ({} points)", i + 1, tiles.join(", "), set.points());
    }

    println!("\nHands:");
    for player in 0..game.players() {
        if let Ok(hand) = game.hand(player) {
            println!(
                "  Player {}: {} tiles, {} points left",
                player,
                hand.len(),
                hand.points()
            );
        }
    }

    match game.winner() {
        Some(player) => println!("\nPlayer {} wins", player),
        None => println!("\nNo winner"),
    }
}
