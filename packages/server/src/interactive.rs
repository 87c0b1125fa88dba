//! Interactive mode for the server.
//!
//! Prompts for bind address, port and the month to fetch before starting
//! the server.

use crime_cluster_map::MapConfig;
use dialoguer::{Confirm, Input};

/// Runs the server in interactive mode, prompting for configuration.
///
/// Starts from `config` (normally the loaded file plus environment
/// overrides) and lets the user adjust the bind address, port and month
/// before delegating to [`super::run_server`].
///
/// # Errors
///
/// Returns an `std::io::Result` error if the underlying server fails to
/// start.
#[allow(clippy::future_not_send)]
pub async fn run(mut config: MapConfig) -> std::io::Result<()> {
    println!("Crime Cluster Server");
    println!();

    config.bind_addr = Input::new()
        .with_prompt("Bind address")
        .default(config.bind_addr.clone())
        .interact_text()
        .unwrap_or_else(|_| config.bind_addr.clone());

    config.port = Input::new()
        .with_prompt("Port")
        .default(config.port)
        .interact_text()
        .unwrap_or(config.port);

    let date: String = Input::new()
        .with_prompt("Month to fetch (YYYY-MM, empty for latest)")
        .default(config.date.clone().unwrap_or_default())
        .allow_empty(true)
        .interact_text()
        .unwrap_or_default();
    config.date = (!date.trim().is_empty()).then(|| date.trim().to_string());

    if !Confirm::new()
        .with_prompt(format!(
            "Start server on {}:{}?",
            config.bind_addr, config.port
        ))
        .default(true)
        .interact()
        .unwrap_or(true)
    {
        println!("Cancelled.");
        return Ok(());
    }

    super::run_server(config).await
}
