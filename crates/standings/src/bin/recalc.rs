use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use standings::{RecalcStage, Recalculation, ScoringPolicies};
use storage::Database;
use storage::repository::PgStore;
use storage::store::ClubPointsStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "recalc")]
#[command(about = "Series standings recalculation", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print collection counts without recomputing anything.
    Summary,
    /// Run the full pipeline, stage by stage.
    Run {
        /// Compute and report every stage, but write nothing.
        #[arg(long)]
        dry_run: bool,
    },
    /// Print the cached standings of one series.
    Standings {
        #[arg(long)]
        series: Uuid,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("recalc={log_level},standings={log_level}").into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let db = Database::new(&cli.database_url)
        .await
        .context("Failed to connect to database")?;
    db.run_migrations()
        .await
        .context("Failed to run migrations")?;

    let store = Arc::new(PgStore::new(db.pool().clone()));

    match cli.command {
        Commands::Summary => {
            let recalc = Recalculation::new(store, ScoringPolicies::default(), today());
            let summary = recalc.summary().await.context("Failed to load summary")?;
            tracing::info!("{summary}");
        }
        Commands::Run { dry_run } => {
            run_pipeline(store, dry_run).await?;
        }
        Commands::Standings { series } => {
            print_standings(&store, series).await?;
        }
    }

    Ok(())
}

async fn run_pipeline(store: Arc<PgStore>, dry_run: bool) -> anyhow::Result<()> {
    let mut recalc = Recalculation::new(store, ScoringPolicies::default(), today());

    let summary = recalc.summary().await.context("Failed to load summary")?;
    tracing::info!("{summary}");
    if dry_run {
        tracing::info!("dry run: nothing will be written");
    }

    while recalc.stage() != RecalcStage::Complete {
        let stage = recalc.stage();
        recalc
            .advance(dry_run)
            .await
            .with_context(|| format!("Stage after '{stage}' failed"))?;
    }

    tracing::info!("Recalculation complete");
    Ok(())
}

async fn print_standings(store: &PgStore, series_id: Uuid) -> anyhow::Result<()> {
    let standings = store
        .standings_for_series(series_id)
        .await
        .context("Failed to load standings")?;

    if standings.is_empty() {
        tracing::warn!("No cached standings for series {series_id}");
        return Ok(());
    }

    for standing in standings {
        tracing::info!(
            "#{:<3} {} {}",
            standing.rank,
            standing.club_id,
            standing.total_points
        );
    }

    Ok(())
}

fn today() -> chrono::NaiveDate {
    chrono::Utc::now().date_naive()
}
