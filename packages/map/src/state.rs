//! Lifecycle of the one-shot incident fetch.

use crime_cluster_source_models::Incident;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display};

/// Result of the incident fetch, as the map sees it.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FetchState {
    /// The request is still in flight.
    #[default]
    Loading,
    /// The feed answered; incidents in feed order.
    Loaded(Vec<Incident>),
    /// The request or the decode failed.
    Errored(String),
}

/// [`FetchState`] without its payload.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FetchStatus {
    Loading,
    Loaded,
    Errored,
}

impl FetchState {
    /// Fetched incidents, empty unless [`FetchState::Loaded`].
    #[must_use]
    pub fn incidents(&self) -> &[Incident] {
        match self {
            Self::Loaded(incidents) => incidents,
            Self::Loading | Self::Errored(_) => &[],
        }
    }

    #[must_use]
    pub const fn status(&self) -> FetchStatus {
        match self {
            Self::Loading => FetchStatus::Loading,
            Self::Loaded(_) => FetchStatus::Loaded,
            Self::Errored(_) => FetchStatus::Errored,
        }
    }

    /// Error message when the fetch failed.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Errored(message) => Some(message),
            Self::Loading | Self::Loaded(_) => None,
        }
    }
}

impl<E: std::fmt::Display> From<Result<Vec<Incident>, E>> for FetchState {
    fn from(result: Result<Vec<Incident>, E>) -> Self {
        match result {
            Ok(incidents) => Self::Loaded(incidents),
            Err(e) => Self::Errored(e.to_string()),
        }
    }
}
