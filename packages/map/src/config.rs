//! Runtime configuration.
//!
//! [`MapConfig`] is read from an optional TOML file and then overridden by
//! environment variables. Every field has a default, so an empty file (or
//! no file) yields the stock Leicester October 2019 view.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crime_cluster_source::{DEFAULT_API_URL, FetchOptions};
use crime_cluster_spatial::ClusterOptions;
use crime_cluster_viewport::{FlyToOptions, Viewport};
use serde::{Deserialize, Serialize};

/// File name looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "crime_cluster.toml";

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "CRIME_CLUSTER_CONFIG";

/// Errors produced while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The config file is not valid TOML for [`MapConfig`].
    #[error("Invalid config: {0}")]
    Toml(#[from] toml::de::Error),

    /// An environment override could not be parsed.
    #[error("Invalid value {value:?} for {key}")]
    InvalidValue {
        /// Variable name.
        key: String,
        /// Rejected value.
        value: String,
    },
}

/// Camera the map opens with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InitialView {
    pub latitude: f64,
    pub longitude: f64,
    pub zoom: f64,
    /// Pixel width assumed until the frontend reports its size.
    pub width: u32,
    /// Pixel height assumed until the frontend reports its size.
    pub height: u32,
}

impl Default for InitialView {
    fn default() -> Self {
        Self {
            latitude: 52.6376,
            longitude: -1.135_171,
            zoom: 6.0,
            width: 1280,
            height: 800,
        }
    }
}

/// All tunables for a map session, the server and the CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Address the HTTP server binds to.
    pub bind_addr: String,
    /// Port the HTTP server listens on.
    pub port: u16,
    /// Directory served as the frontend.
    pub static_dir: PathBuf,
    /// Map widget access token, passed through to the frontend untouched.
    pub access_token: Option<String>,

    /// police.uk API base URL.
    pub api_url: String,
    /// Category slug to fetch.
    pub category: String,
    /// Latitude of the feed query point.
    pub query_latitude: f64,
    /// Longitude of the feed query point.
    pub query_longitude: f64,
    /// Month to fetch (`YYYY-MM`). Unset lets the feed choose.
    pub date: Option<String>,
    /// Fetch timeout in seconds. Unset waits indefinitely.
    pub timeout_secs: Option<u64>,

    /// Incidents beyond this many are dropped before clustering.
    pub max_incidents: usize,
    /// Cluster radius in pixels.
    pub radius: f64,
    /// Zoom above which clustering stops; also the click-to-expand ceiling.
    pub max_zoom: u8,
    /// Fly-to speed for cluster clicks.
    pub fly_speed: f64,

    pub initial_view: InitialView,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1".to_string(),
            port: 8080,
            static_dir: PathBuf::from("app/dist"),
            access_token: None,
            api_url: DEFAULT_API_URL.to_string(),
            category: crime_cluster_crime_models::ALL_CRIME.to_string(),
            query_latitude: 52.629_729,
            query_longitude: -1.131_592,
            date: Some("2019-10".to_string()),
            timeout_secs: None,
            max_incidents: 2000,
            radius: 75.0,
            max_zoom: 20,
            fly_speed: 2.0,
            initial_view: InitialView::default(),
        }
    }
}

impl MapConfig {
    /// Loads configuration from `path`, else from `$CRIME_CLUSTER_CONFIG`,
    /// else from `./crime_cluster.toml` if it exists, then applies
    /// environment overrides.
    ///
    /// # Errors
    ///
    /// * [`ConfigError::Io`] if an explicitly named file cannot be read
    /// * [`ConfigError::Toml`] if the file does not parse
    /// * [`ConfigError::InvalidValue`] if an override does not parse
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let explicit = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from));

        let mut config = match explicit {
            Some(path) => Self::from_file(&path)?,
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.is_file() {
                    Self::from_file(fallback)?
                } else {
                    Self::default()
                }
            }
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Reads and parses a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] or [`ConfigError::Toml`].
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        log::debug!("Loading config from {}", path.display());
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Parses TOML, filling missing fields with defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Toml`] if the input does not parse.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Applies overrides from `lookup` (normally the process environment).
    ///
    /// Recognized keys: `BIND_ADDR`, `PORT`, `MAPBOX_ACCESS_TOKEN` (or
    /// `REACT_APP_MAPBOX_TOKEN`), `CRIME_API_URL`, `CRIME_DATE`,
    /// `CRIME_MAX_INCIDENTS`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if a numeric override does not
    /// parse.
    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(addr) = lookup("BIND_ADDR") {
            self.bind_addr = addr;
        }
        if let Some(port) = lookup("PORT") {
            self.port = parse_value("PORT", port)?;
        }
        if let Some(token) =
            lookup("MAPBOX_ACCESS_TOKEN").or_else(|| lookup("REACT_APP_MAPBOX_TOKEN"))
        {
            self.access_token = Some(token);
        }
        if let Some(url) = lookup("CRIME_API_URL") {
            self.api_url = url;
        }
        if let Some(date) = lookup("CRIME_DATE") {
            self.date = (!date.is_empty()).then_some(date);
        }
        if let Some(max) = lookup("CRIME_MAX_INCIDENTS") {
            self.max_incidents = parse_value("CRIME_MAX_INCIDENTS", max)?;
        }
        Ok(())
    }

    /// Feed query built from this configuration.
    #[must_use]
    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            category: self.category.clone(),
            latitude: self.query_latitude,
            longitude: self.query_longitude,
            date: self.date.clone(),
            timeout: self.timeout_secs.map(Duration::from_secs),
        }
    }

    /// Clusterer tuning built from this configuration.
    #[must_use]
    pub fn cluster_options(&self) -> ClusterOptions {
        ClusterOptions {
            radius: self.radius,
            max_zoom: self.max_zoom,
            ..ClusterOptions::default()
        }
    }

    /// Fly-to options used for cluster clicks.
    #[must_use]
    pub fn fly_to_options(&self) -> FlyToOptions {
        FlyToOptions {
            speed: self.fly_speed,
            ..FlyToOptions::default()
        }
    }

    /// The camera a new session starts with.
    #[must_use]
    pub fn initial_viewport(&self) -> Viewport {
        let view = &self.initial_view;
        Viewport::new(
            view.latitude,
            view.longitude,
            view.zoom,
            view.width,
            view.height,
        )
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: String) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: BTreeMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_toml_is_default() {
        assert_eq!(MapConfig::from_toml_str("").unwrap(), MapConfig::default());
    }

    #[test]
    fn toml_overrides_selected_fields() {
        let config = MapConfig::from_toml_str(
            r#"
port = 9090
max_incidents = 500
date = "2020-01"

[initial_view]
zoom = 10.0
"#,
        )
        .unwrap();
        assert_eq!(config.port, 9090);
        assert_eq!(config.max_incidents, 500);
        assert_eq!(config.date.as_deref(), Some("2020-01"));
        assert!((config.initial_view.zoom - 10.0).abs() < f64::EPSILON);
        assert!((config.initial_view.latitude - 52.6376).abs() < f64::EPSILON);
        assert_eq!(config.max_zoom, 20);
    }

    #[test]
    fn rejects_bad_toml() {
        assert!(matches!(
            MapConfig::from_toml_str("port = \"eighty\""),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = MapConfig::default();
        config
            .apply_env(env(&[
                ("PORT", "3000"),
                ("BIND_ADDR", "0.0.0.0"),
                ("REACT_APP_MAPBOX_TOKEN", "pk.legacy"),
                ("CRIME_MAX_INCIDENTS", "50"),
                ("CRIME_DATE", ""),
            ]))
            .unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.bind_addr, "0.0.0.0");
        assert_eq!(config.access_token.as_deref(), Some("pk.legacy"));
        assert_eq!(config.max_incidents, 50);
        assert_eq!(config.date, None);
    }

    #[test]
    fn primary_token_wins_over_legacy() {
        let mut config = MapConfig::default();
        config
            .apply_env(env(&[
                ("MAPBOX_ACCESS_TOKEN", "pk.new"),
                ("REACT_APP_MAPBOX_TOKEN", "pk.legacy"),
            ]))
            .unwrap();
        assert_eq!(config.access_token.as_deref(), Some("pk.new"));
    }

    #[test]
    fn invalid_env_value_errors() {
        let mut config = MapConfig::default();
        let err = config.apply_env(env(&[("PORT", "http")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "PORT"));
    }

    #[test]
    fn missing_explicit_file_errors() {
        let err = MapConfig::from_file(Path::new("/nonexistent/crime_cluster.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn derived_options_follow_config() {
        let config = MapConfig::default();
        let fetch = config.fetch_options();
        assert_eq!(fetch, FetchOptions::default());

        let cluster = config.cluster_options();
        assert!((cluster.radius - 75.0).abs() < f64::EPSILON);
        assert_eq!(cluster.max_zoom, 20);

        let viewport = config.initial_viewport();
        assert!((viewport.zoom - 6.0).abs() < f64::EPSILON);
        assert!(!viewport.is_transitioning());
    }
}
