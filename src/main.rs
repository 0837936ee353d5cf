//! Binary entrypoint for the landlord CLI.
//!
//! Commands:
//! - `agent [--address <a>] [--port <p>]` - connect to a game host and answer its
//!   decision requests with the built-in agent until the tournament ends
//! - `init` - write a starter `config.toml`
//! - `smoke-test [--port <p>] [--timeout <s>]` - wait for one agent, run a short
//!   exchange against a demo board and print a JSON summary
//!
//! See the library crate docs for module-level details: `landlord::`.
use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use log::{error, info, warn};
use tokio::net::TcpListener;
use tokio::time::{timeout, Duration};

use landlord::agent::{DecisionPoint, Dispatcher, SimpleAgent};
use landlord::config::{Config, RulesConfig};
use landlord::engine::{buy_property, Bank, GameBoard, Location, LocationClass, Player, PlayerId};
use landlord::protocol::{AgentClient, RemoteAgent};

#[derive(Parser)]
#[command(name = "landlord")]
#[command(about = "Rule engine and remote decision agents for property-trading games")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to a game host and play with the built-in agent
    Agent {
        /// Host address (overrides config)
        #[arg(short, long)]
        address: Option<String>,
        /// Host port (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Write a default configuration file
    Init,
    /// Listen for one agent and run a short exchange against a demo board
    SmokeTest {
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
        /// Seconds to wait for an agent to connect
        #[arg(short, long, default_value_t = 30)]
        timeout: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let pre_config = match cli.command {
        Commands::Init => None,
        _ => match Config::load(&cli.config).await {
            Ok(cfg) => Some(cfg),
            Err(e) => {
                eprintln!("{e}; using built-in defaults");
                None
            }
        },
    };
    init_logging(&pre_config, cli.verbose);
    let config = pre_config.unwrap_or_default();

    match cli.command {
        Commands::Agent { address, port } => {
            let mut agent_cfg = config.agent.clone();
            if let Some(a) = address {
                agent_cfg.address = a;
            }
            if let Some(p) = port {
                agent_cfg.port = p;
            }
            info!("Starting landlord agent v{}", env!("CARGO_PKG_VERSION"));
            let mut client = AgentClient::new(SimpleAgent::new(), config.protocol.clone());
            match client.play_remote_game(&agent_cfg).await {
                Ok(summary) => {
                    info!(
                        "session finished: {} requests, {} games, {} errors",
                        summary.requests, summary.games, summary.errors
                    );
                    println!("{}", serde_json::to_string(&summary)?);
                }
                Err(e) => {
                    error!("agent session failed: {}", e);
                    return Err(e.into());
                }
            }
        }
        Commands::Init => {
            info!("Initializing new landlord configuration");
            Config::create_default(&cli.config).await?;
            info!("Configuration file created at {}", cli.config);
        }
        Commands::SmokeTest { port, timeout: wait } => {
            let port = port.unwrap_or(config.agent.port);
            let listener = TcpListener::bind((config.agent.address.as_str(), port)).await?;
            info!("Waiting up to {}s for an agent on {}:{}", wait, config.agent.address, port);
            let accepted = timeout(
                Duration::from_secs(wait),
                RemoteAgent::accept(&listener, &config.protocol, &config.agent.authkey),
            )
            .await;
            let agent = match accepted {
                Ok(Ok(agent)) => agent,
                Ok(Err(e)) => {
                    error!("agent connection failed: {}", e);
                    println!("{}", serde_json::json!({ "status": "failed", "error": e.to_string() }));
                    std::process::exit(1);
                }
                Err(_) => {
                    warn!("No agent connected within {}s", wait);
                    println!("{}", serde_json::json!({ "status": "no_agent", "timeout_seconds": wait }));
                    std::process::exit(1);
                }
            };
            let payload = run_smoke_exchange(agent, &config.rules).await?;
            println!("{}", payload);
        }
    }

    Ok(())
}

/// A short board: two brown streets, a railroad, a utility and some fixed squares.
fn demo_board(rules: &RulesConfig) -> GameBoard {
    let players = vec![
        Player::new("player_1", 1500).at_position(1),
        Player::new("player_2", 1500),
    ];
    let locations = vec![
        Location::fixed("Go", LocationClass::DoNothing),
        Location::real_estate("Mediterranean Avenue", 60, "Brown", 50),
        Location::fixed("Community Chest", LocationClass::Action),
        Location::real_estate("Baltic Avenue", 60, "Brown", 50),
        Location::fixed("Income Tax", LocationClass::Tax),
        Location::railroad("Reading Railroad", 200),
        Location::utility("Electric Company", 150),
    ];
    GameBoard::new(players, locations, Bank::from_rules(rules))
        .with_build_prerequisites(rules.build_prerequisites.clone())
}

async fn run_smoke_exchange(agent: RemoteAgent, rules: &RulesConfig) -> Result<serde_json::Value> {
    let peer = agent.peer().to_string();
    let mut board = demo_board(rules);
    let buyer = PlayerId(0);
    let asset = board
        .asset_by_name("Mediterranean Avenue")
        .ok_or_else(|| anyhow!("demo board is missing its first street"))?;
    let mut dispatcher = Dispatcher::new().with_remote("player_1", agent);

    dispatcher.notify_all(DecisionPoint::StartTournament, None).await?;
    let snapshot = board.snapshot();
    dispatcher.notify_all(DecisionPoint::Startup, Some(&snapshot)).await?;

    let wants = dispatcher
        .decide(
            "player_1",
            DecisionPoint::BuyPropertyDecision {
                player: "player_1".to_string(),
                asset: "Mediterranean Avenue".to_string(),
            },
            &board,
        )
        .await?
        .into_flag()?;
    let outcome = if wants {
        let outcome = buy_property(&mut board, buyer, asset, &rules.purchase_variant(), &mut dispatcher).await?;
        board.advance_time_step();
        Some(outcome.is_success())
    } else {
        None
    };

    let snapshot = board.snapshot();
    let novelty = dispatcher.notify_all(DecisionPoint::Shutdown, Some(&snapshot)).await?;
    dispatcher.notify_all(DecisionPoint::EndTournament, None).await?;
    info!("smoke test against {} complete", peer);

    Ok(serde_json::json!({
        "status": "ok",
        "peer": peer,
        "game_id": board.game_id.to_string(),
        "buy_decision": wants,
        "purchase_succeeded": outcome,
        "player_cash": board.player(buyer)?.cash,
        "log_entries": board.history().len(),
        "novelty_reported": novelty.get("player_1").copied().unwrap_or(0) == 1,
    }))
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    // CLI verbosity overrides the configured level
    let configured = config
        .as_ref()
        .and_then(|c| c.logging.level.parse::<log::LevelFilter>().ok())
        .unwrap_or(log::LevelFilter::Info);
    let base_level = match verbosity {
        0 => configured,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);

    let log_file = config
        .as_ref()
        .and_then(|c| c.logging.file.as_ref())
        .and_then(|path| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .ok()
        });

    if let Some(f) = log_file {
        let write_mutex = std::sync::Arc::new(std::sync::Mutex::new(f));
        // Mirror to the console only when attached to a terminal
        let is_tty = atty::is(atty::Stream::Stdout);
        builder.format(move |fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            let line = format!("{} [{}] {}", ts, record.level(), record.args());
            if let Ok(mut guard) = write_mutex.lock() {
                let _ = writeln!(guard, "{}", line);
            }
            if is_tty {
                writeln!(fmt, "{}", line)
            } else {
                Ok(())
            }
        });
    } else {
        builder.format(|fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            writeln!(fmt, "{} [{}] {}", ts, record.level(), record.args())
        });
    }
    let _ = builder.try_init();
}
