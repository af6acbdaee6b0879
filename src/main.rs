use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};

use card_scraper::AppConfig;
use card_scraper::browser::ChromeSession;
use card_scraper::core::ProductPipeline;
use card_scraper::logging;
use card_scraper::storage::{ProductSink, SqliteProductStore};

#[derive(Parser, Debug)]
#[command(author, version, about = "Scrape one product card from an online retailer")]
struct Cli {
    /// Configuration file (TOML); defaults to config/default.toml when present
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search the retailer, open the first in-stock result and store it
    Scrape {
        /// Entry page of the retailer
        #[arg(long)]
        url: Option<String>,

        /// Search term typed into the retailer's search box
        #[arg(long)]
        search: Option<String>,

        /// Also write every stored product to this CSV file
        #[arg(long)]
        export: Option<PathBuf>,
    },
    /// Write every stored product to CSV
    Export {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    let _guard = logging::init(&config.logging)?;

    let command = cli.command.unwrap_or(Command::Scrape {
        url: None,
        search: None,
        export: None,
    });

    match command {
        Command::Scrape {
            url,
            search,
            export,
        } => {
            if let Some(url) = url {
                config.target.entry_url = url;
            }
            if let Some(search) = search {
                config.target.search_term = search;
            }
            config.validate()?;
            scrape(&config, export).await
        }
        Command::Export { output } => {
            let path = output.unwrap_or_else(|| config.export.csv_path.clone());
            let store = SqliteProductStore::connect(&config.database).await?;
            let rows = store.export_csv(&path).await?;
            info!("Wrote {} products to {}", rows, path.display());
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn scrape(config: &AppConfig, export: Option<PathBuf>) -> Result<ExitCode> {
    info!("Starting card-scraper...");

    let store = SqliteProductStore::connect(&config.database)
        .await
        .context("Failed to open product database")?;
    let session = ChromeSession::launch(&config.browser).context("Failed to launch browser")?;

    let pipeline = ProductPipeline::new(session, config);
    let record = match pipeline
        .run(&config.target.entry_url, &config.target.search_term, &store)
        .await
    {
        Ok(record) => record,
        Err(e) if e.is_navigation_failure() => {
            error!("Could not reach the product page: {}", e);
            return Ok(ExitCode::from(2));
        }
        Err(e) => return Err(e.into()),
    };

    if let Some(path) = export {
        let rows = store.export_csv(&path).await?;
        info!("Wrote {} products to {}", rows, path.display());
    }

    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(ExitCode::SUCCESS)
}
