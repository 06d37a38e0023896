//! Command-line runner for the counter and shopping cart demos.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cellgraph_core::components::{Catalog, Counter, ShoppingCart, TracingObserver};
use cellgraph_core::reactive::{Effect, Runtime};
use cellgraph_core::DemoConfig;

#[derive(Parser)]
#[command(name = "cellgraph-demo", version, about = "Reactive cell graph demos")]
struct Cli {
    /// JSON file with demo settings (tick interval and catalog).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the timer-driven counter.
    Counter {
        /// Number of ticks to wait for.
        #[arg(long, default_value_t = 5)]
        ticks: u32,

        /// Tick period in milliseconds. Overrides the config file.
        #[arg(long)]
        interval_ms: Option<u64>,
    },

    /// Add random products to a cart.
    Cart {
        /// Number of products to add.
        #[arg(long, default_value_t = 3)]
        adds: u32,

        /// JSON catalog file. Overrides the config file.
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Seed for reproducible picks.
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<DemoConfig> {
    let Some(path) = path else {
        return Ok(DemoConfig::default());
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("Invalid config {}", path.display()))
}

async fn run_counter(config: &DemoConfig, ticks: u32, interval_ms: Option<u64>) -> Result<()> {
    let interval = interval_ms
        .map(Duration::from_millis)
        .unwrap_or(config.tick_interval);

    let counter = Counter::new();
    let _render = {
        let value = counter.value_signal().clone();
        let doubled = counter.doubled_cell().clone();
        Effect::new(move || {
            println!("value={} doubled={}", value.get(), doubled.get());
        })
    };

    counter.start(interval).context("Failed to start counter timer")?;
    info!(?interval, ticks, "counter started");

    tokio::time::sleep(interval * ticks + interval / 2).await;
    counter.stop();

    info!(value = counter.value(), "counter stopped");
    Ok(())
}

fn run_cart(config: DemoConfig, adds: u32, catalog: Option<PathBuf>, seed: Option<u64>) -> Result<()> {
    let catalog = match catalog {
        Some(path) => Catalog::load(&path)
            .with_context(|| format!("Failed to load catalog {}", path.display()))?,
        None => config.catalog,
    };

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let cart = ShoppingCart::new(catalog, Arc::new(TracingObserver));
    for _ in 0..adds {
        cart.add_to_cart_with(&mut rng);
    }

    for item in cart.items() {
        println!("{item}");
    }
    println!("Total: {}", cart.total());
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = load_config(cli.config.as_ref())?;
    Runtime::configure(config.runtime);

    match cli.command {
        Commands::Counter { ticks, interval_ms } => run_counter(&config, ticks, interval_ms).await,
        Commands::Cart {
            adds,
            catalog,
            seed,
        } => run_cart(config, adds, catalog, seed),
    }
}
