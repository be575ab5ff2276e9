//! Pantry command-line client
//!
//! Scans product labels, keeps the ingredient inventory in sync with the
//! remote service and reports what is about to expire.
//!
//! The session credential is read from `PANTRY_TOKEN`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use pantry_common::config::{ConfigOverrides, Settings, ENV_API_URL, ENV_CONFIG_PATH};
use pantry_core::builder::DraftEdits;
use pantry_core::model::CaptureSource;
use tracing::debug;

mod commands;
mod logging;

use commands::App;

/// Command-line arguments for pantry
#[derive(Parser, Debug)]
#[command(name = "pantry")]
#[command(about = "Ingredient inventory with label scanning and expiry tracking")]
#[command(version)]
struct Args {
    /// Remote API base URL
    #[arg(long, global = true, env = ENV_API_URL)]
    api_url: Option<String>,

    /// TOML config file
    #[arg(long, global = true, value_name = "PATH", env = ENV_CONFIG_PATH)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch and print the inventory with expiry status
    List,

    /// Ingredients ordered by expiry urgency
    Waste {
        /// Reference date (YYYY-MM-DD), defaults to today
        #[arg(long, value_name = "DATE")]
        as_of: Option<NaiveDate>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Analyze a label photo and turn it into an ingredient
    Scan {
        /// Image file to analyze
        #[arg(long, value_name = "PATH")]
        image: PathBuf,

        /// The photo was taken with the camera rather than picked from the gallery
        #[arg(long)]
        camera: bool,

        /// Override the detected name
        #[arg(long)]
        name: Option<String>,

        /// Quantity (defaults to the configured default quantity)
        #[arg(long)]
        quantity: Option<String>,

        /// Override the detected expiry date; an empty value clears it
        #[arg(long)]
        expiry: Option<String>,

        /// Save the draft (without this the draft is only shown)
        #[arg(short, long)]
        yes: bool,
    },

    /// Add an ingredient by hand
    Add {
        #[arg(long)]
        name: String,

        #[arg(long)]
        quantity: Option<String>,

        /// Expiry date as printed on the package
        #[arg(long)]
        expiry: Option<String>,
    },

    /// Delete an ingredient by id
    Delete { id: i64 },

    /// Print the ingredient list as a recipe search query
    RecipeQuery,

    /// Write a config file with the built-in defaults
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let overrides = ConfigOverrides {
        config_path: args.config.clone(),
        api_base_url: args.api_url.clone(),
    };

    match args.command {
        Command::InitConfig { force } => commands::init_config(&overrides, force),
        Command::List => connect(&overrides)?.list().await,
        Command::Waste { as_of, json } => connect(&overrides)?.waste(as_of, json).await,
        Command::Scan {
            image,
            camera,
            name,
            quantity,
            expiry,
            yes,
        } => {
            let source = if camera {
                CaptureSource::Camera
            } else {
                CaptureSource::Gallery
            };
            let edits = DraftEdits {
                name,
                quantity,
                expiry_date: expiry,
            };
            connect(&overrides)?.scan(image, source, edits, yes).await
        }
        Command::Add {
            name,
            quantity,
            expiry,
        } => {
            let edits = DraftEdits {
                name: Some(name),
                quantity,
                expiry_date: expiry,
            };
            connect(&overrides)?.add(edits).await
        }
        Command::Delete { id } => connect(&overrides)?.delete(id).await,
        Command::RecipeQuery => connect(&overrides)?.recipe_query().await,
    }
}

/// Resolve settings, start logging and build the remote clients
fn connect(overrides: &ConfigOverrides) -> Result<App> {
    let settings = Settings::resolve(overrides).context("Failed to load configuration")?;
    logging::init(&settings.logging)?;
    settings.source.log();
    debug!(
        api = %settings.api_base_url,
        timeout_secs = settings.request_timeout.as_secs(),
        "Configuration resolved"
    );

    App::new(&settings)
}
