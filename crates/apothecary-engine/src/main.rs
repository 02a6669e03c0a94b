//! Driver binary for the Apothecary potion shop.
//!
//! Each invocation runs one command against the shop's `PostgreSQL`
//! ledgers and prints the outcome as JSON on stdout. Logs go to stderr.
//!
//! # Startup Sequence
//!
//! 1. Parse the command line
//! 2. Load configuration from `apothecary-config.yaml`
//! 3. Initialize structured logging (tracing)
//! 4. Connect to `PostgreSQL`
//! 5. Run the command and print its result

mod commands;
mod error;

use std::path::{Path, PathBuf};

use apothecary_core::config::{LoggingConfig, ShopConfig};
use apothecary_core::PlanningService;
use apothecary_db::{PostgresConfig, PostgresPool};
use apothecary_types::CapacityPlan;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;

#[derive(Parser, Debug)]
#[command(name = "apothecary-engine")]
#[command(about = "Plan barrel purchases and bottling, and record deliveries, for the potion shop")]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(
        long,
        env = "APOTHECARY_CONFIG",
        default_value = "apothecary-config.yaml"
    )]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply pending database migrations.
    Migrate,
    /// Seed an empty ledger with the opening balance.
    Seed,
    /// Print potions, ml, and gold on hand.
    Audit,
    /// Print the sellable catalog.
    Catalog,
    /// Plan barrel purchases against a wholesale catalog.
    PlanBarrels {
        /// JSON file holding the day's barrel offers.
        #[arg(long)]
        catalog: PathBuf,
    },
    /// Plan bottling.
    PlanBottles {
        /// Game tick, which selects the in-game day and hour.
        #[arg(long, default_value_t = 0)]
        tick: u64,
    },
    /// Plan capacity purchases.
    PlanCapacity,
    /// Record delivered barrels.
    DeliverBarrels {
        /// Order the delivery belongs to.
        #[arg(long)]
        order_id: String,
        /// JSON file holding the delivered barrels.
        #[arg(long)]
        file: PathBuf,
    },
    /// Record bottled potions.
    DeliverBottles {
        /// Order the delivery belongs to.
        #[arg(long)]
        order_id: String,
        /// JSON file holding the bottled lines.
        #[arg(long)]
        file: PathBuf,
    },
    /// Record purchased capacity units.
    DeliverCapacity {
        /// Order the grant belongs to.
        #[arg(long)]
        order_id: String,
        /// Potion capacity units bought.
        #[arg(long, default_value_t = 0)]
        potion_units: u32,
        /// ml capacity units bought.
        #[arg(long, default_value_t = 0)]
        ml_units: u32,
    },
    /// Sell a cart and record the sale.
    Checkout {
        /// JSON file holding the customer and requested items.
        #[arg(long)]
        file: PathBuf,
    },
}

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, the database, or the command fails.
#[tokio::main]
async fn main() -> Result<(), EngineError> {
    let cli = Cli::parse();

    let config = load_config(&cli.config)?;
    init_tracing(&config.logging)?;
    info!(
        shop = config.shop.name,
        recipes = config.recipes.len(),
        "Configuration loaded"
    );

    let pg_config = PostgresConfig::from_infrastructure(&config.infrastructure);
    let pool = PostgresPool::connect(&pg_config).await?;

    if matches!(cli.command, Command::Migrate) {
        pool.run_migrations().await?;
        pool.close().await;
        return emit(&"migrated");
    }

    let service = PlanningService::new(pool.ledger_store(), config);
    let result = run(&service, cli.command).await;
    pool.close().await;
    result
}

/// Dispatch one command and print its outcome.
async fn run(service: &commands::Service, command: Command) -> Result<(), EngineError> {
    match command {
        Command::Migrate => emit(&"migrated"),
        Command::Seed => emit(&commands::seed(service).await?),
        Command::Audit => emit(&commands::audit(service).await?),
        Command::Catalog => emit(&commands::catalog(service).await?),
        Command::PlanBarrels { catalog } => emit(&commands::plan_barrels(service, &catalog).await?),
        Command::PlanBottles { tick } => emit(&commands::plan_bottles(service, tick).await?),
        Command::PlanCapacity => emit(&commands::plan_capacity(service).await?),
        Command::DeliverBarrels { order_id, file } => {
            emit(&commands::deliver_barrels(service, &order_id, &file).await?)
        }
        Command::DeliverBottles { order_id, file } => {
            emit(&commands::deliver_bottles(service, &order_id, &file).await?)
        }
        Command::DeliverCapacity {
            order_id,
            potion_units,
            ml_units,
        } => {
            let plan = CapacityPlan {
                potion_capacity: potion_units,
                ml_capacity: ml_units,
            };
            emit(&commands::deliver_capacity(service, &order_id, plan).await?)
        }
        Command::Checkout { file } => emit(&commands::checkout(service, &file).await?),
    }
}

/// Print `value` as pretty JSON on stdout.
fn emit<T: Serialize>(value: &T) -> Result<(), EngineError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Load configuration from `path`, or defaults if it does not exist.
fn load_config(path: &Path) -> Result<ShopConfig, EngineError> {
    if path.exists() {
        Ok(ShopConfig::from_file(path)?)
    } else {
        // Env overrides still apply to the defaults.
        Ok(ShopConfig::parse("{}")?)
    }
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
fn init_tracing(logging: &LoggingConfig) -> Result<(), EngineError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .map_err(|e| EngineError::Logging {
            message: format!("invalid log filter: {e}"),
        })?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);

    let installed = if logging.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| EngineError::Logging {
        message: format!("{e}"),
    })
}
