use anyhow::Result;
use clap::{Parser, Subcommand};
use gazette_backend::api;
use gazette_backend::config::GazetteConfig;
use gazette_backend::database::Database;
use gazette_backend::telemetry;
use gazette_backend::utils;

#[derive(Parser)]
#[command(author, version, about = "Gazette publishing backend")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (Axum) for REST/API access
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init_tracing();

    let args = Args::parse();

    let config = GazetteConfig::from_env()?;
    let database = Database::connect(&config.paths)?;
    database.ensure_migrations()?;
    tracing::info!(
        app = utils::APP_NAME,
        db = %config.paths.db_path.display(),
        page_size = config.feed.page_size,
        "bootstrap complete"
    );

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => api::serve_http(config, database).await,
    }
}
