// ============================================
// File: crates/wormhole-relay/src/main.rs
// ============================================
//! # Wormhole Relay Entry Point
//!
//! ## Creation Reason
//! Binary for running a relay and for poking at the addressing, routing
//! and mesh logic from a shell.
//!
//! ## Main Functionality
//! - CLI argument parsing with clap
//! - Logging initialization with tracing
//! - Relay execution with a periodic stats line
//!
//! ## Usage
//! ```bash
//! wormhole-relay start -c /etc/wormhole/relay.toml
//! wormhole-relay validate -c /etc/wormhole/relay.toml
//! wormhole-relay encode --tier network --lat 48.8566 --lon 2.3522 --port 443
//! wormhole-relay route --from-lat 0 --from-lon 0 --to-lat 10 --to-lon 10
//! wormhole-relay mesh --lat 0 --lon 0 --nodes 12
//! wormhole-relay select example.com -c /etc/wormhole/relay.toml
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - `RUST_LOG` overrides the configured log level
//! - A missing config file means defaults, not an error
//!
//! ## Last Modified
//! v0.1.0 - Initial CLI implementation

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use wormhole_core::{generate, NetworkAddress, Router, Tier};
use wormhole_relay::{RelayConfig, RelayPhase, RelayServer};

/// Interval of the stats line while running.
const STATS_LOG_INTERVAL: Duration = Duration::from_secs(30);

// ============================================
// CLI Definition
// ============================================

/// Wormhole packet relay
#[derive(Parser, Debug)]
#[command(name = "wormhole-relay")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the relay until Ctrl+C
    Start {
        /// Path to configuration file
        #[arg(short, long, default_value = "/etc/wormhole/relay.toml")]
        config: PathBuf,
    },

    /// Validate configuration file
    Validate {
        /// Path to configuration file
        #[arg(short, long, default_value = "/etc/wormhole/relay.toml")]
        config: PathBuf,
    },

    /// Build an address and print every rendering
    Encode {
        /// Tier name or index (0-9)
        #[arg(long, default_value = "network")]
        tier: String,

        /// Latitude in degrees
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,

        /// Longitude in degrees
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,

        /// Service type
        #[arg(long, default_value_t = 1)]
        service: u32,

        /// Service port
        #[arg(long, default_value_t = 0)]
        port: u16,

        /// Privacy level (0-9)
        #[arg(long, default_value_t = 0)]
        privacy: u8,
    },

    /// Find a route between two coordinates
    Route {
        /// Source latitude
        #[arg(long, allow_negative_numbers = true)]
        from_lat: f64,

        /// Source longitude
        #[arg(long, allow_negative_numbers = true)]
        from_lon: f64,

        /// Destination latitude
        #[arg(long, allow_negative_numbers = true)]
        to_lat: f64,

        /// Destination longitude
        #[arg(long, allow_negative_numbers = true)]
        to_lon: f64,

        /// Tier of both endpoints
        #[arg(long, default_value = "network")]
        tier: String,

        /// Hop limit
        #[arg(long, default_value_t = 10)]
        max_hops: usize,
    },

    /// Generate a mesh around a coordinate and print it as JSON
    Mesh {
        /// Gateway latitude
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,

        /// Gateway longitude
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,

        /// Total node count, gateway included
        #[arg(long, default_value_t = 8)]
        nodes: usize,

        /// Gateway tier
        #[arg(long, default_value = "network")]
        tier: String,
    },

    /// Pick the relay for a target name or IP
    Select {
        /// Target hostname or IPv4 address
        target: String,

        /// Path to configuration file
        #[arg(short, long, default_value = "/etc/wormhole/relay.toml")]
        config: PathBuf,
    },
}

// ============================================
// Main
// ============================================

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Start { config } => cmd_start(config).await,
        Commands::Validate { config } => {
            init_logging("info");
            cmd_validate(config).await
        }
        Commands::Encode { tier, lat, lon, service, port, privacy } => {
            init_logging("info");
            cmd_encode(&tier, lat, lon, service, port, privacy)
        }
        Commands::Route { from_lat, from_lon, to_lat, to_lon, tier, max_hops } => {
            init_logging("info");
            cmd_route(&tier, (from_lat, from_lon), (to_lat, to_lon), max_hops)
        }
        Commands::Mesh { lat, lon, nodes, tier } => {
            init_logging("info");
            cmd_mesh(&tier, lat, lon, nodes)
        }
        Commands::Select { target, config } => {
            init_logging("info");
            cmd_select(&target, config).await
        }
    };

    if let Err(e) = result {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

// ============================================
// Commands
// ============================================

/// Runs the relay until Ctrl+C.
async fn cmd_start(config_path: PathBuf) -> anyhow::Result<()> {
    let config = load_or_default_config(&config_path).await?;
    init_logging(&config.logging.level);

    let server = Arc::new(RelayServer::new(config)?);
    let reporter = spawn_stats_reporter(Arc::clone(&server));

    let result = server.run().await;
    reporter.abort();

    result?;
    Ok(())
}

/// Logs a stats line every [`STATS_LOG_INTERVAL`] while the process runs.
fn spawn_stats_reporter(server: Arc<RelayServer>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(STATS_LOG_INTERVAL);
        ticker.tick().await;

        loop {
            ticker.tick().await;
            if server.phase() == RelayPhase::Listening {
                info!(phase = %server.phase(), "Stats: {}", server.stats());
            }
        }
    })
}

/// Validates and prints the configuration.
async fn cmd_validate(config_path: PathBuf) -> anyhow::Result<()> {
    if !config_path.exists() {
        println!("⚠️  Config file not found: {}", config_path.display());
        println!("   Relay will use default values.");
        return Ok(());
    }

    let config = RelayConfig::load(&config_path).await?;

    println!("✅ Configuration is valid");
    println!();
    println!("Network:");
    println!("   UDP:        {}", config.udp_addr());
    println!("   TCP:        {}", config.tcp_addr());
    println!();
    println!("Policy:");
    println!("   Allowed:    {}", join_or_any(&config.policy.allowed_cidrs));
    println!("   Blocked:    {}", join_or_none(&config.policy.blocked_cidrs));
    println!();
    println!("Limits:");
    println!("   Bandwidth:        {} kbps", config.limits.max_bandwidth_kbps);
    println!("   Forward Timeout:  {}s", config.limits.forward_timeout_secs);
    println!("   Peer Idle:        {}s", config.limits.peer_idle_timeout_secs);
    println!();
    println!("Target Encryption:  {}", if config.target_key.seed.is_some() { "on" } else { "off" });
    println!("Relays:             {}", config.relays.len());
    println!("Blocked Targets:    {}", config.blocked_targets.len());
    println!();

    Ok(())
}

/// Prints every rendering of one address.
fn cmd_encode(tier: &str, lat: f64, lon: f64, service: u32, port: u16, privacy: u8) -> anyhow::Result<()> {
    let tier: Tier = tier.parse()?;
    let address = NetworkAddress::new(tier, lat, lon, service, port, privacy)?;
    let (decoded_lat, decoded_lon) = address.coordinates();

    println!("Compact:      {}", address.to_compact());
    println!("IPv6-shaped:  {}", address.to_ipv6_shaped());
    println!("Short token:  {}", address.short_token());
    println!("Tier:         {} ({})", address.tier(), address.tier().code());
    println!("Check digit:  {}", address.check_digit());
    println!("Resonance:    {:.4}", address.resonance_score());
    println!("Coordinates:  {:.6}, {:.6}", decoded_lat, decoded_lon);

    Ok(())
}

/// Prints a route as JSON.
fn cmd_route(tier: &str, from: (f64, f64), to: (f64, f64), max_hops: usize) -> anyhow::Result<()> {
    let tier: Tier = tier.parse()?;
    let from = NetworkAddress::new(tier, from.0, from.1, 1, 0, 0)?;
    let to = NetworkAddress::new(tier, to.0, to.1, 1, 0, 0)?;

    let route = Router::new().find_route(&from, &to, max_hops)?;
    println!("{}", serde_json::to_string_pretty(&route)?);

    Ok(())
}

/// Prints a generated mesh as JSON.
fn cmd_mesh(tier: &str, lat: f64, lon: f64, nodes: usize) -> anyhow::Result<()> {
    let tier: Tier = tier.parse()?;
    let center = NetworkAddress::new(tier, lat, lon, 1, 0, 0)?;

    let mesh = generate(&center, nodes)?;
    println!("{}", serde_json::to_string_pretty(&mesh)?);

    Ok(())
}

/// Prints the relay chosen for a target.
async fn cmd_select(target: &str, config_path: PathBuf) -> anyhow::Result<()> {
    let config = load_or_default_config(&config_path).await?;
    let directory = config.directory();

    match directory.find_blocked(target) {
        Some(blocked) => println!("Target:  {} (blocked: {})", blocked.name, blocked.reason),
        None => println!("Target:  {} (not blocked)", target),
    }
    println!("Relay:   {}", directory.select_relay(target));

    Ok(())
}

// ============================================
// Helper Functions
// ============================================

/// Initializes the tracing subscriber.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .try_init()
        .ok();
}

/// Loads config, or defaults when the file does not exist.
async fn load_or_default_config(path: &Path) -> anyhow::Result<RelayConfig> {
    if path.exists() {
        Ok(RelayConfig::load(path).await?)
    } else {
        Ok(RelayConfig::default())
    }
}

fn join_or_any<T: ToString>(items: &[T]) -> String {
    if items.is_empty() {
        "any".to_string()
    } else {
        items.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
    }
}

fn join_or_none<T: ToString>(items: &[T]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
    }
}
