use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};

use trivia_api::config;
use trivia_api::db;
use trivia_api::seed;
use trivia_api::store::{SqliteStore, TriviaStore};

#[derive(Debug, Parser)]
#[command(author, version, about = "Load categories and questions from a YAML fixture")]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// Fixture to load
    #[arg(long, default_value = "fixtures/trivia.yaml")]
    fixture: PathBuf,

    /// Seed even when the store already has categories
    #[arg(long)]
    force: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let cfg = config::load(Some(&args.config))?;
    cfg.ensure_dirs()?;

    let pool = db::init_pool(&cfg.database_url()).await?;
    db::run_migrations(&pool).await?;
    let store = SqliteStore::new(pool);

    let existing = store.list_categories().await?;
    if !existing.is_empty() && !args.force {
        warn!(
            categories = existing.len(),
            "store already has categories; pass --force to seed anyway"
        );
        return Ok(());
    }

    let fixture = seed::load(&args.fixture)?;
    let report = seed::apply(&store, &fixture).await?;
    info!(
        fixture = %args.fixture.display(),
        categories = report.categories,
        questions = report.questions,
        "seed complete"
    );
    Ok(())
}
