//! notion-sync - command-line driver for the Notion connector
//!
//! Loads credentials and settings from the environment (and `.env`), then:
//! - `validate` checks the API key against the public API
//! - `sync` lists users, groups, entitlements and grants and prints them as JSON
//! - `deprovision` removes a user through SCIM and confirms the removal

use clap::{Parser, Subcommand};
use tracing::info;
use xavyo_connector_notion::{NotionConfig, NotionConnector, NotionCredentials};

mod error;
mod logging;
mod sync;

use error::CliResult;

/// Notion workspace sync
#[derive(Parser)]
#[command(name = "notion-sync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the API key is accepted
    Validate,

    /// List every resource with its entitlements and grants
    Sync {
        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Remove a user from the workspace
    Deprovision {
        /// Notion user id
        user_id: String,
    },
}

#[tokio::main]
async fn main() {
    // Load .env if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    logging::init_logging(
        logging::DEFAULT_FILTER,
        logging::json_requested(|key| std::env::var(key)),
    );

    match run(cli).await {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            e.print();
            std::process::exit(e.exit_code());
        }
    }
}

fn connector_from_env() -> CliResult<NotionConnector> {
    let credentials = NotionCredentials::from_env()?;
    let config = NotionConfig::from_env()?;

    info!(
        api_base_url = %config.api_base_url,
        scim_base_url = %config.scim_base_url,
        group_listing = %config.group_listing,
        directory = credentials.has_scim_token(),
        "Notion connector configured"
    );

    Ok(NotionConnector::new(config, credentials)?)
}

async fn run(cli: Cli) -> CliResult<()> {
    let connector = connector_from_env()?;

    match cli.command {
        Commands::Validate => {
            connector.validate().await?;
            println!("ok");
        }
        Commands::Sync { pretty } => {
            let report = sync::run_sync(&connector.resource_syncers()).await?;
            info!(
                users = report.count_of(&connector.resource_types().user.id),
                groups = report.count_of(&connector.resource_types().group.id),
                grants = report.grants.len(),
                "Sync complete"
            );
            let out = if pretty {
                serde_json::to_string_pretty(&report)?
            } else {
                serde_json::to_string(&report)?
            };
            println!("{out}");
        }
        Commands::Deprovision { user_id } => {
            connector.deprovision_user(&user_id).await?;
            println!("deprovisioned {user_id}");
        }
    }

    Ok(())
}
