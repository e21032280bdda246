//! Maintenance entry point for the club ladder
//!
//! Validates configuration, runs the expiry pass over a JSON snapshot of
//! clubs, players and users, and prints club standings.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use club_ladder::config::AppConfig;
use club_ladder::rating::standings;
use club_ladder::utils::SystemClock;
use club_ladder::{
    Club, InMemoryPlayerRepository, InMemoryUserDirectory, LadderError, MatchKind, MatchWorkflow,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Club Ladder maintenance tool
#[derive(Parser)]
#[command(
    name = "ladder-maint",
    version,
    about = "Maintenance tool for club ladder snapshots",
    long_about = "Runs the pending-match expiry pass over a JSON snapshot of clubs, players \
                 and users, and prints club standings from the same snapshot."
)]
struct Args {
    /// Configuration file path
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Log level override
    #[arg(
        short,
        long,
        value_name = "LEVEL",
        help = "Override log level (trace, debug, info, warn, error)"
    )]
    log_level: Option<String>,

    /// Enable debug mode
    #[arg(short, long, help = "Enable debug mode with verbose logging")]
    debug: bool,

    /// Dry run mode (validate config and exit)
    #[arg(long, help = "Validate configuration and exit")]
    dry_run: bool,

    /// Snapshot to maintain
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "JSON snapshot with clubs, players and users"
    )]
    snapshot: Option<PathBuf>,

    /// Leave the snapshot file untouched
    #[arg(long, help = "Run the expiry pass without writing the snapshot back")]
    no_write: bool,

    /// Print standings for a club
    #[arg(long, value_name = "CLUB_ID", help = "Print standings for the given club")]
    standings: Option<String>,

    /// Which rating the standings use
    #[arg(long, value_enum, default_value_t = KindArg::Singles)]
    kind: KindArg,

    /// Print workflow metrics after the run
    #[arg(long, help = "Print Prometheus metrics after the run")]
    metrics: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum KindArg {
    Singles,
    Doubles,
}

impl From<KindArg> for MatchKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Singles => MatchKind::Singles,
            KindArg::Doubles => MatchKind::Doubles,
        }
    }
}

/// On-disk snapshot of everything the workflow touches
#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    #[serde(default)]
    clubs: Vec<Club>,
    #[serde(default)]
    players: InMemoryPlayerRepository,
    #[serde(default)]
    users: InMemoryUserDirectory,
}

/// Initialize structured logging with the configured level
fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_target(false)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Load configuration, then apply CLI overrides
fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path)?
    } else {
        AppConfig::from_env()?
    };

    if let Some(log_level) = &args.log_level {
        config.service.log_level = log_level.clone();
    }

    if args.debug {
        config.service.log_level = "debug".to_string();
    }

    club_ladder::config::validate_config(&config)?;
    Ok(config)
}

fn display_banner(config: &AppConfig) {
    info!("Club Ladder maintenance v{}", club_ladder::VERSION);
    info!("   Service: {}", config.service.name);
    info!("   Log level: {}", config.service.log_level);
    info!("   Default rating: {}", config.rating.default_rating);
    info!(
        "   Expiry: resolved {}d, unconfirmed {}d, confirmed {}d",
        config.workflow.resolved_retention_days,
        config.workflow.unconfirmed_expiry_days,
        config.workflow.confirmed_expiry_days
    );
}

fn read_snapshot(path: &Path) -> Result<Snapshot> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse snapshot {}", path.display()))
}

fn write_snapshot(path: &Path, snapshot: &Snapshot) -> Result<()> {
    let raw = serde_json::to_string_pretty(snapshot).context("Failed to serialize snapshot")?;
    std::fs::write(path, raw)
        .with_context(|| format!("Failed to write snapshot {}", path.display()))
}

fn print_standings(snapshot: &Snapshot, club_id: &str, kind: MatchKind) -> Result<()> {
    let club = snapshot
        .clubs
        .iter()
        .find(|club| club.id == club_id)
        .ok_or_else(|| LadderError::ClubNotFound {
            club_id: club_id.to_string(),
        })?;
    let rows = standings(club, &snapshot.players, kind)?;

    println!("{} standings for {} ({})", kind, club.name, club.id);
    for row in rows {
        let rating = row
            .rating
            .map(|r| format!("{:.3}", r))
            .unwrap_or_else(|| "unrated".to_string());
        println!(
            "{:>3}. {:<24} {:>10}  {} matches",
            row.rank, row.name, rating, row.matches_played
        );
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(&args).unwrap_or_else(|e| {
        eprintln!("Configuration error: {:#}", e);
        std::process::exit(1);
    });

    if let Err(e) = init_logging(&config.service.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    display_banner(&config);

    if args.dry_run {
        info!("Configuration validation successful");
        return Ok(());
    }

    let Some(snapshot_path) = &args.snapshot else {
        warn!("No snapshot given, nothing to do");
        return Ok(());
    };

    let mut snapshot = read_snapshot(snapshot_path)?;
    info!(
        "Loaded {} clubs, {} players and {} users from {}",
        snapshot.clubs.len(),
        snapshot.players.players().count(),
        snapshot.users.users().count(),
        snapshot_path.display()
    );

    let workflow = MatchWorkflow::new(&config, Arc::new(SystemClock))?;
    let mut purged = 0;
    for club in snapshot.clubs.iter_mut() {
        let count = workflow.cleanup_expired(club);
        if count > 0 {
            info!("Club {}: purged {} expired pending matches", club.id, count);
        }
        purged += count;
    }
    info!("Expiry pass complete, {} entries purged", purged);

    if purged > 0 && !args.no_write {
        write_snapshot(snapshot_path, &snapshot)?;
        info!("Snapshot written to {}", snapshot_path.display());
    }

    if let Some(club_id) = &args.standings {
        print_standings(&snapshot, club_id, args.kind.into())?;
    }

    if args.metrics {
        print!("{}", workflow.metrics().gather_text()?);
    }

    Ok(())
}
