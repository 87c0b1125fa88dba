#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI for the crime cluster map.
//!
//! Fetches the police.uk feed, prints the clustering for a view, simulates
//! cluster clicks, or starts the server. Without a subcommand it asks what
//! to do.
//!
//! Uses `indicatif-log-bridge` (via [`crime_cluster_cli_utils::init_logger`])
//! to route `log` output through `indicatif::MultiProgress` so that log
//! lines and the fetch spinner never fight for the terminal.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use crime_cluster_map::MapConfig;
use crime_cluster_spatial::BoundingBox;
use dialoguer::{Input, Select};

#[derive(Parser)]
#[command(name = "crime_cluster_cli", about = "Crime incident clustering toolchain")]
struct Cli {
    /// Config file (defaults to `$CRIME_CLUSTER_CONFIG` or `./crime_cluster.toml`)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Month to fetch (`YYYY-MM`), overriding the config
    #[arg(long, global = true)]
    date: Option<String>,
    /// Maximum number of incidents to cluster, overriding the config
    #[arg(long, global = true)]
    max_incidents: Option<usize>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch one month of incidents and print a per-category summary
    Fetch {
        /// Save the raw JSON payload here for later `--input` use
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print the markers for one view
    Clusters {
        /// Read incidents from a saved payload instead of the API
        #[arg(long)]
        input: Option<PathBuf>,
        /// Zoom level to cluster at
        #[arg(long, default_value = "6")]
        zoom: f64,
        /// Bounding box as `west,south,east,north` (default: whole world)
        #[arg(long)]
        bbox: Option<BoundingBox>,
        /// Print a `GeoJSON` `FeatureCollection` instead of a table
        #[arg(long)]
        geojson: bool,
    },
    /// Simulate a click on a cluster and print the camera move
    Expand {
        /// Cluster ID as printed by `clusters`
        cluster_id: usize,
        /// Read incidents from a saved payload instead of the API
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// Start the API server
    Serve {
        /// Address to bind to
        #[arg(long)]
        bind: Option<String>,
        /// Port to listen on
        #[arg(long)]
        port: Option<u16>,
    },
}

/// Top-level tool selection for the interactive menu.
enum Tool {
    Fetch,
    Clusters,
    Server,
}

impl Tool {
    const ALL: &[Self] = &[Self::Fetch, Self::Clusters, Self::Server];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Fetch => "Fetch incidents",
            Self::Clusters => "Show clusters",
            Self::Server => "Start server",
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = crime_cluster_cli_utils::init_logger();
    let cli = Cli::parse();

    let mut config = MapConfig::load(cli.config.as_deref())?;
    if let Some(date) = cli.date {
        config.date = Some(date);
    }
    if let Some(max) = cli.max_incidents {
        config.max_incidents = max;
    }

    let Some(command) = cli.command else {
        return interactive(config, &multi).await;
    };

    match command {
        Commands::Fetch { output } => {
            commands::fetch(&config, output.as_deref(), &multi).await?;
        }
        Commands::Clusters {
            input,
            zoom,
            bbox,
            geojson,
        } => commands::clusters(&config, input.as_deref(), zoom, bbox, geojson, &multi).await?,
        Commands::Expand { cluster_id, input } => {
            commands::expand(&config, input.as_deref(), cluster_id, &multi).await?;
        }
        Commands::Serve { bind, port } => {
            if let Some(bind) = bind {
                config.bind_addr = bind;
            }
            if let Some(port) = port {
                config.port = port;
            }
            serve(config, false).await?;
        }
    }

    Ok(())
}

async fn interactive(
    config: MapConfig,
    multi: &crime_cluster_cli_utils::MultiProgress,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("Crime Cluster Map");
    println!();

    let labels: Vec<&str> = Tool::ALL.iter().map(Tool::label).collect();

    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    match Tool::ALL[idx] {
        Tool::Fetch => commands::fetch(&config, None, multi).await?,
        Tool::Clusters => {
            let zoom: f64 = Input::new()
                .with_prompt("Zoom")
                .default(config.initial_view.zoom)
                .interact_text()?;
            commands::clusters(&config, None, zoom, None, false, multi).await?;
        }
        Tool::Server => serve(config, true).await?,
    }

    Ok(())
}

/// Runs the server on its own actix system.
async fn serve(config: MapConfig, prompt: bool) -> Result<(), Box<dyn std::error::Error>> {
    // The server uses actix-web's runtime, so we need to run it
    // in a blocking task to avoid nesting tokio runtimes.
    tokio::task::spawn_blocking(move || {
        actix_web::rt::System::new().block_on(async move {
            if prompt {
                crime_cluster_server::interactive::run(config).await
            } else {
                crime_cluster_server::run_server(config).await
            }
        })
    })
    .await??;
    Ok(())
}
