use clap::Parser;
use glam::Vec3;
use log::{LevelFilter, error, info, warn};
use std::path::PathBuf;
use std::process;
use tankarena::config;
use tankarena::error::SimError;
use tankarena::game::Game;
use tankarena::logging;
use tankarena::nav::NavGraph;
use tankarena::nav::graph::parse_token;
use tankarena::player::Intents;
use tankarena::types::GameEvent;

// --- Command Line Arguments ---
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Navigation graph file, one "<token> <token>" edge per line
    nav_file: PathBuf,

    /// Number of simulation ticks to run.
    #[arg(long, default_value_t = config::DEFAULT_TICKS)]
    ticks: u32,

    /// Ticks per simulated second.
    #[arg(long, default_value_t = config::DEFAULT_TICK_RATE)]
    tick_rate: u32,

    /// Seed for the arena's random number generator.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Patrol endpoints of one AI tank as two node tokens (repeatable).
    /// Defaults to the node farthest from the player spawn and back to the spawn.
    #[arg(long, num_args = 2, value_names = ["BEGIN", "END"], action = clap::ArgAction::Append)]
    patrol: Vec<String>,

    /// Debug filter to specify log topics (e.g., "ai,collision")
    /// Available topics: physics, collision, ai, timer, nav
    #[arg(long)]
    debug_filter: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() {
    let args = Args::parse();

    let log_level = match args.log_level.to_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    };
    if let Err(e) = logging::init_logger(log_level, args.debug_filter.clone()) {
        eprintln!("Warning: Failed to initialize logger: {}", e);
    }
    if let Some(filter) = &args.debug_filter {
        for topic in logging::unknown_topics(filter) {
            warn!(
                "Unknown debug topic '{}', expected one of: {}",
                topic,
                logging::TOPICS.join(", ")
            );
        }
    }

    if let Err(e) = run(&args) {
        error!("{}", e);
        process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), SimError> {
    info!("Initializing tank arena...");
    let mut game = Game::load(&args.nav_file, args.seed)?;

    let patrols = patrol_routes(game.nav(), &args.patrol)?;
    game.spawn_player()?;
    for (begin, end) in patrols {
        game.spawn_ai_tank(begin, end)?;
    }
    game.flush();

    let dt = 1.0 / args.tick_rate.max(1) as f32;
    let intents = Intents::default();
    let (mut shots, mut explosions, mut kills) = (0, 0, 0);

    info!("Running {} ticks at {} Hz", args.ticks, args.tick_rate.max(1));
    for _ in 0..args.ticks {
        game.tick(dt, &intents);
        for event in game.drain_events() {
            match event {
                GameEvent::ProjectileFired { .. } => shots += 1,
                GameEvent::Explosion { .. } => explosions += 1,
                GameEvent::TankDestroyed { .. } => kills += 1,
                GameEvent::TankDamaged { .. } | GameEvent::PlayerRespawned { .. } => {}
            }
        }
    }

    info!(
        "Simulated {:.1}s: {} shots, {} explosions, {} tanks destroyed",
        game.tick_count() as f32 * dt,
        shots,
        explosions,
        kills
    );
    for actor in game.arena.actors() {
        if let Some(brain) = actor.brain() {
            info!(
                "AI tank {} at {} in {:?}",
                actor.id,
                actor.body.position(),
                brain.state()
            );
        } else if let Some(tank) = actor.tank() {
            info!(
                "Player tank {} at {} with {:.0} health",
                actor.id,
                actor.body.position(),
                tank.health
            );
        }
    }
    Ok(())
}

/// Resolves `--patrol` token pairs to graph nodes, or picks a default route
fn patrol_routes(nav: &NavGraph, tokens: &[String]) -> Result<Vec<(Vec3, Vec3)>, SimError> {
    if tokens.is_empty() {
        let nodes = nav.navigation_nodes();
        let Some(&spawn) = nodes.first() else {
            return Ok(Vec::new());
        };
        let farthest = nodes
            .iter()
            .copied()
            .max_by(|a, b| a.distance_squared(spawn).total_cmp(&b.distance_squared(spawn)));
        return Ok(farthest
            .filter(|&f| f != spawn)
            .map(|f| vec![(f, spawn)])
            .unwrap_or_default());
    }

    let resolve = |token: &String| -> Result<Vec3, SimError> {
        match nav.node_by_key(token) {
            Some(position) => Ok(position),
            None => {
                let position = parse_token(token).map_err(|message| SimError::InvalidToken {
                    token: token.clone(),
                    message,
                })?;
                Err(SimError::UnknownWaypoint(position))
            }
        }
    };
    tokens
        .chunks(2)
        .map(|pair| match pair {
            [begin, end] => Ok((resolve(begin)?, resolve(end)?)),
            _ => Err(SimError::InvalidToken {
                token: pair.concat(),
                message: "patrol needs a begin and an end token".to_string(),
            }),
        })
        .collect()
}
