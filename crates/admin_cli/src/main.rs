use std::{error::Error, path::PathBuf};

use clap::{Parser, Subcommand};
use engine::Engine;
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};

#[derive(Parser, Debug)]
#[command(name = "maskmart_admin")]
#[command(about = "Admin utilities for Maskmart (schema, seed import)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./maskmart.db?mode=rwc"
    )]
    database_url: String,

    /// Log filter level.
    #[arg(long, default_value = "info")]
    level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply pending migrations.
    Migrate,
    /// Load pharmacies, masks, members and purchase histories from JSON.
    Import {
        #[arg(long)]
        pharmacies: PathBuf,
        #[arg(long)]
        users: PathBuf,
        /// Import even when the store already holds data.
        #[arg(long)]
        force: bool,
    },
}

async fn connect_db(database_url: &str) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "maskmart_admin={level},engine={level}",
            level = cli.level
        ))
        .init();

    let db = connect_db(&cli.database_url).await?;

    match cli.command {
        Command::Migrate => {
            println!("migrations applied");
        }
        Command::Import {
            pharmacies,
            users,
            force,
        } => {
            let engine = Engine::builder().database(db).build().await?;
            if !force && !engine.is_empty().await? {
                eprintln!("store already holds data, pass --force to import anyway");
                std::process::exit(1);
            }

            let summary = engine.import_files(&pharmacies, &users).await?;
            println!(
                "imported {} pharmacies, {} masks, {} members, {} purchase histories ({} skipped)",
                summary.pharmacies,
                summary.masks,
                summary.members,
                summary.histories,
                summary.skipped_histories
            );
        }
    }

    Ok(())
}
