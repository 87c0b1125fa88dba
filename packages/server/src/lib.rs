#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the crime cluster map.
//!
//! Holds one [`MapSession`] in memory. The police.uk fetch runs once in a
//! spawned task at startup; until it finishes every marker query answers
//! with an empty set. The browser map widget reports camera changes with
//! `PUT /api/viewport` and reads markers back from `GET /api/markers`.

mod handlers;
pub mod interactive;

use std::path::Path;
use std::sync::{Arc, RwLock};

use actix_cors::Cors;
use actix_files::Files;
use actix_web::{App, HttpServer, middleware, web};
use crime_cluster_map::{FetchState, MapConfig, MapSession};
use crime_cluster_source::IncidentSource;
use crime_cluster_source::police_uk::PoliceUkSource;
use crime_cluster_source::progress::LogProgress;
use crime_cluster_spatial::ClusterError;

/// Shared application state.
pub struct AppState {
    /// Configuration the server was started with.
    pub config: MapConfig,
    /// The map session. Written by the fetch task and viewport updates,
    /// read by every marker query.
    pub session: RwLock<MapSession>,
}

impl AppState {
    /// Creates state with a session in [`FetchState::Loading`].
    ///
    /// # Errors
    ///
    /// Returns [`ClusterError::InvalidOptions`] if the configured cluster
    /// options are unusable.
    pub fn new(config: MapConfig) -> Result<Self, ClusterError> {
        let session = MapSession::new(&config)?;
        Ok(Self {
            config,
            session: RwLock::new(session),
        })
    }
}

/// Fetches incidents from `source` and stores the outcome in the session.
///
/// Failures are logged and recorded as [`FetchState::Errored`]; they never
/// propagate.
pub async fn load_incidents(state: web::Data<AppState>, source: Arc<dyn IncidentSource>) {
    log::info!("Fetching incidents from {}...", source.name());
    let result = source
        .fetch(&state.config.fetch_options(), &LogProgress)
        .await;
    let fetch_state = FetchState::from(result);

    match state.session.write() {
        Ok(mut session) => {
            if let Err(e) = session.set_fetch_state(fetch_state) {
                log::error!("Failed to cluster incidents: {e}");
            }
        }
        Err(e) => log::error!("Session lock poisoned: {e}"),
    }
}

/// Registers the `/api` routes.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/config", web::get().to(handlers::config))
            .route("/status", web::get().to(handlers::status))
            .route("/viewport", web::get().to(handlers::get_viewport))
            .route("/viewport", web::put().to(handlers::put_viewport))
            .route("/markers", web::get().to(handlers::markers))
            .route("/clusters.geojson", web::get().to(handlers::clusters_geojson))
            .route(
                "/clusters/{id}/expand",
                web::post().to(handlers::expand_cluster),
            )
            .route(
                "/clusters/{id}/children",
                web::get().to(handlers::cluster_children),
            )
            .route(
                "/clusters/{id}/leaves",
                web::get().to(handlers::cluster_leaves),
            ),
    );
}

/// Starts the crime cluster API server.
///
/// Spawns the incident fetch against `config.api_url`, then serves the API
/// and the static frontend until shut down. This is a regular async
/// function; the caller provides the actix runtime (e.g. via
/// `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Error` if the cluster options are unusable, or the
/// HTTP server fails to bind or encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server(config: MapConfig) -> std::io::Result<()> {
    let bind_addr = config.bind_addr.clone();
    let port = config.port;
    let static_dir = config.static_dir.clone();
    let source: Arc<dyn IncidentSource> = Arc::new(PoliceUkSource::with_base_url(&config.api_url));

    let state = web::Data::new(
        AppState::new(config)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?,
    );

    actix_rt::spawn(load_incidents(state.clone(), source));
    check_static_dir(&static_dir);

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure_api)
            // Serve frontend static files (production)
            .service(Files::new("/", static_dir.clone()).index_file("index.html"))
    })
    .bind((bind_addr, port))?
    .run()
    .await
}

/// Whether `dir` holds a frontend build to serve. The map page is built
/// separately; without it only `/api` answers.
fn check_static_dir(dir: &Path) -> bool {
    let found = dir.join("index.html").is_file();
    if !found {
        log::warn!("No frontend build at {}; serving the API only", dir.display());
    }
    found
}

#[cfg(test)]
mod tests {
    use crime_cluster_map::FetchStatus;
    use crime_cluster_source::file::FileSource;

    use super::*;

    const PAYLOAD: &str = r#"[
        {"category":"burglary","location_type":"Force","location":{"latitude":"52.634887","street":{"id":883407,"name":"On or near Grange Lane"},"longitude":"-1.131224"},"context":"","outcome_status":null,"persistent_id":"","id":79459834,"location_subtype":"","month":"2019-10"},
        {"category":"drugs","location_type":"Force","location":{"latitude":"52.635812","street":{"id":883345,"name":"On or near Bonners Lane"},"longitude":"-1.134011"},"context":"","outcome_status":{"category":"Under investigation","date":"2019-10"},"persistent_id":"","id":79459835,"location_subtype":"","month":"2019-10"}
    ]"#;

    #[actix_web::test]
    async fn load_incidents_fills_session() {
        let path = std::env::temp_dir().join("crime_cluster_server_load_test.json");
        std::fs::write(&path, PAYLOAD).unwrap();

        let state = web::Data::new(AppState::new(MapConfig::default()).unwrap());
        load_incidents(state.clone(), Arc::new(FileSource::new(&path))).await;

        let status = state.session.read().unwrap().status();
        assert_eq!(status.status, FetchStatus::Loaded);
        assert_eq!(status.fetched, 2);
        assert_eq!(status.clustered, 2);

        std::fs::remove_file(&path).ok();
    }

    #[actix_web::test]
    async fn failed_fetch_is_recorded() {
        let state = web::Data::new(AppState::new(MapConfig::default()).unwrap());
        load_incidents(
            state.clone(),
            Arc::new(FileSource::new("/nonexistent/crimes.json")),
        )
        .await;

        let session = state.session.read().unwrap();
        assert_eq!(session.status().status, FetchStatus::Errored);
        assert!(session.markers().is_empty());
    }

    #[test]
    fn detects_missing_frontend_build() {
        let dir = std::env::temp_dir().join("crime_cluster_static_dir_test");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::remove_file(dir.join("index.html")).ok();
        assert!(!check_static_dir(&dir));

        std::fs::write(dir.join("index.html"), "<!doctype html>").unwrap();
        assert!(check_static_dir(&dir));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn rejects_unusable_cluster_options() {
        let config = MapConfig {
            radius: 0.0,
            ..MapConfig::default()
        };
        assert!(AppState::new(config).is_err());
    }
}
