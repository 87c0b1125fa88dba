#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Standalone entry point for the crime cluster API server.
//!
//! Reads [`MapConfig`] from `crime_cluster.toml` (or
//! `$CRIME_CLUSTER_CONFIG`) plus environment overrides, then serves until
//! shut down.

use crime_cluster_map::MapConfig;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let config = MapConfig::load(None)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

    crime_cluster_server::run_server(config).await
}
