//! police.uk street-level crime source.
//!
//! API: <https://data.police.uk/docs/method/crime-street/>. A single GET
//! returns every incident within one mile of the query point for one month.
//! The feed has no pagination; the response is the whole month.

use async_trait::async_trait;
use crime_cluster_source_models::Incident;

use crate::parsing::parse_month;
use crate::progress::ProgressCallback;
use crate::record::normalize_payload;
use crate::{DEFAULT_API_URL, FetchOptions, IncidentSource, SourceError};

/// police.uk street-crime data source.
pub struct PoliceUkSource {
    base_url: String,
    client: reqwest::Client,
}

impl PoliceUkSource {
    /// Creates a source against the public police.uk API.
    #[must_use]
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_API_URL)
    }

    /// Creates a source against a custom base URL (a mirror or a local
    /// stub), without a trailing `/crimes-street`.
    #[must_use]
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Builds the request URL for the given options.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::InvalidDate`] if `options.date` is not a valid
    /// `YYYY-MM` month.
    pub fn request_url(&self, options: &FetchOptions) -> Result<String, SourceError> {
        let mut url = format!(
            "{}/crimes-street/{}?lat={}&lng={}",
            self.base_url, options.category, options.latitude, options.longitude
        );
        if let Some(date) = &options.date {
            url.push_str("&date=");
            url.push_str(&parse_month(date)?);
        }
        Ok(url)
    }

    /// Performs the request and returns the undecoded JSON body, the shape
    /// [`crate::file::FileSource`] reads back.
    ///
    /// # Errors
    ///
    /// * [`SourceError::InvalidDate`] if `options.date` is malformed
    /// * [`SourceError::Http`] if the request fails
    /// * [`SourceError::Status`] if the feed answers with a non-success code
    pub async fn fetch_body(
        &self,
        options: &FetchOptions,
        progress: &dyn ProgressCallback,
    ) -> Result<String, SourceError> {
        let result = self.request_body(options, progress).await;
        if result.is_err() {
            progress.finish_and_clear();
        }
        result
    }

    async fn request_body(
        &self,
        options: &FetchOptions,
        progress: &dyn ProgressCallback,
    ) -> Result<String, SourceError> {
        let url = self.request_url(options)?;

        progress.set_message(format!("Fetching {url}"));
        log::info!("Fetching street crime: {url}");

        let mut request = self.client.get(&url);
        if let Some(timeout) = options.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status { status, url });
        }

        Ok(response.text().await?)
    }
}

impl Default for PoliceUkSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IncidentSource for PoliceUkSource {
    fn id(&self) -> &'static str {
        "police_uk"
    }

    fn name(&self) -> &'static str {
        "data.police.uk street-level crime"
    }

    async fn fetch(
        &self,
        options: &FetchOptions,
        progress: &dyn ProgressCallback,
    ) -> Result<Vec<Incident>, SourceError> {
        let body = self.fetch_body(options, progress).await?;
        progress.set_message(format!("Decoding {} bytes", body.len()));

        let incidents = normalize_payload(&body).inspect_err(|_| progress.finish_and_clear())?;
        log::info!("Fetched {} incidents from {}", incidents.len(), self.name());
        progress.finish(format!("{} incidents", incidents.len()));

        Ok(incidents)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    /// Records every progress call.
    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<String>>,
    }

    impl Recorder {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl ProgressCallback for Recorder {
        fn set_message(&self, msg: String) {
            self.calls.lock().unwrap().push(format!("message: {msg}"));
        }

        fn finish(&self, msg: String) {
            self.calls.lock().unwrap().push(format!("finish: {msg}"));
        }

        fn finish_and_clear(&self) {
            self.calls.lock().unwrap().push("clear".to_string());
        }
    }

    #[test]
    fn builds_default_request_url() {
        let source = PoliceUkSource::new();
        let url = source.request_url(&FetchOptions::default()).unwrap();
        assert_eq!(
            url,
            "https://data.police.uk/api/crimes-street/all-crime?lat=52.629729&lng=-1.131592&date=2019-10"
        );
    }

    #[test]
    fn omits_date_when_unset() {
        let source = PoliceUkSource::with_base_url("http://localhost:9000/api/");
        let options = FetchOptions {
            category: "burglary".to_string(),
            date: None,
            ..FetchOptions::default()
        };
        let url = source.request_url(&options).unwrap();
        assert_eq!(
            url,
            "http://localhost:9000/api/crimes-street/burglary?lat=52.629729&lng=-1.131592"
        );
    }

    #[test]
    fn rejects_invalid_month() {
        let source = PoliceUkSource::new();
        let options = FetchOptions {
            date: Some("2019-99".to_string()),
            ..FetchOptions::default()
        };
        assert!(matches!(
            source.request_url(&options),
            Err(SourceError::InvalidDate { .. })
        ));
    }

    #[tokio::test]
    async fn connection_failure_clears_progress() {
        // Nothing listens on port 1.
        let source = PoliceUkSource::with_base_url("http://127.0.0.1:1/api");
        let progress = Recorder::default();
        let result = source.fetch(&FetchOptions::default(), &progress).await;

        assert!(matches!(result, Err(SourceError::Http(_))));
        assert_eq!(progress.calls().last().map(String::as_str), Some("clear"));
    }

    #[tokio::test]
    async fn invalid_month_clears_progress() {
        let source = PoliceUkSource::new();
        let options = FetchOptions {
            date: Some("2019-99".to_string()),
            ..FetchOptions::default()
        };
        let progress = Recorder::default();
        let result = source.fetch_body(&options, &progress).await;

        assert!(matches!(result, Err(SourceError::InvalidDate { .. })));
        assert_eq!(progress.calls(), vec!["clear".to_string()]);
    }
}
