use anyhow::Context;
use clap::{Parser, Subcommand};
use novasync_db::PoolConfig;

mod runs;
mod sync;

#[derive(Debug, Parser)]
#[command(name = "novasync")]
#[command(about = "Novasoft ERP to WooCommerce inventory reconciliation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run one reconciliation pass against the catalog store
    Sync,
    /// List recent reconciliation runs from the history ledger
    Runs {
        /// Maximum number of runs to show, newest first
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
    /// Apply the engine-owned migrations (the sync_runs ledger table)
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = novasync_core::load_app_config().context("configuration error")?;
    init_tracing(&config.log_level);

    let cli = Cli::parse();
    let pool = novasync_db::connect_pool(&config.database_url, PoolConfig::from_app_config(&config))
        .await
        .context("failed to connect to the catalog store")?;

    match cli.command {
        Commands::Sync => {
            novasync_db::run_migrations(&pool)
                .await
                .context("ledger migration failed")?;
            sync::run(&config, &pool).await?;
        }
        Commands::Runs { limit } => runs::list(&pool, limit).await?,
        Commands::Migrate => {
            novasync_db::run_migrations(&pool)
                .await
                .context("ledger migration failed")?;
            println!("migrations applied");
        }
    }

    Ok(())
}

fn init_tracing(level: &str) {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
