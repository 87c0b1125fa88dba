//! Subcommand implementations shared by the flag-driven and interactive
//! entry points.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Instant;

use crime_cluster_cli_utils::{FetchSpinner, MultiProgress};
use crime_cluster_crime_models::CrimeCategory;
use crime_cluster_map::{FetchState, MapConfig, MapSession, Marker};
use crime_cluster_source::file::FileSource;
use crime_cluster_source::police_uk::PoliceUkSource;
use crime_cluster_source::record::normalize_payload;
use crime_cluster_source::{IncidentSource, SourceError};
use crime_cluster_source_models::Incident;
use crime_cluster_spatial::BoundingBox;
use crime_cluster_spatial::export::to_feature_collection;

/// Fetches incidents from `input` when given, else from the configured
/// police.uk endpoint, behind a spinner.
///
/// # Errors
///
/// Returns [`SourceError`] if the read, request or decode fails.
pub async fn load(
    config: &MapConfig,
    input: Option<&Path>,
    multi: &MultiProgress,
) -> Result<Vec<Incident>, SourceError> {
    let source: Box<dyn IncidentSource> = match input {
        Some(path) => Box::new(FileSource::new(path)),
        None => Box::new(PoliceUkSource::with_base_url(&config.api_url)),
    };
    let progress = FetchSpinner::start(multi, source.name());
    source.fetch(&config.fetch_options(), progress.as_ref()).await
}

/// `fetch`: downloads one month of incidents, prints a per-category
/// summary and optionally saves the raw payload for later `--input` use.
///
/// # Errors
///
/// Returns an error if the request fails or the output cannot be written.
pub async fn fetch(
    config: &MapConfig,
    output: Option<&Path>,
    multi: &MultiProgress,
) -> Result<(), Box<dyn std::error::Error>> {
    let start = Instant::now();
    let source = PoliceUkSource::with_base_url(&config.api_url);
    let progress = FetchSpinner::start(multi, source.name());
    let body = source
        .fetch_body(&config.fetch_options(), progress.as_ref())
        .await?;
    let incidents = normalize_payload(&body)?;
    progress.finish(format!("{} incidents", incidents.len()));

    if let Some(path) = output {
        tokio::fs::write(path, &body).await?;
        log::info!("Saved {} bytes to {}", body.len(), path.display());
    }

    print_summary(&incidents, config.max_incidents);
    log::info!("Fetch complete in {:.1}s", start.elapsed().as_secs_f64());
    Ok(())
}

/// `clusters`: prints the markers (or `GeoJSON`) for one view.
///
/// # Errors
///
/// Returns an error if loading fails or the cluster options are unusable.
pub async fn clusters(
    config: &MapConfig,
    input: Option<&Path>,
    zoom: f64,
    bbox: Option<BoundingBox>,
    geojson: bool,
    multi: &MultiProgress,
) -> Result<(), Box<dyn std::error::Error>> {
    let session = session(config, input, multi).await?;

    if geojson {
        let collection = to_feature_collection(&session.features_for(bbox, zoom))?;
        println!("{}", serde_json::to_string_pretty(&collection)?);
        return Ok(());
    }

    let markers = session.markers_for(bbox, zoom);
    println!(
        "{} markers at zoom {zoom} over {} incidents",
        markers.len(),
        session.total_points()
    );
    for marker in &markers {
        println!("  {}", describe(marker));
    }
    Ok(())
}

/// `expand`: simulates a click on a cluster and prints the resulting
/// camera move.
///
/// # Errors
///
/// Returns an error if loading fails or `cluster_id` is not a cluster.
pub async fn expand(
    config: &MapConfig,
    input: Option<&Path>,
    cluster_id: usize,
    multi: &MultiProgress,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = session(config, input, multi).await?;
    let expansion_zoom = session.expansion_zoom(cluster_id)?;
    let before = *session.viewport();
    let after = session.click_cluster(cluster_id)?;

    println!("Cluster {cluster_id} splits at zoom {expansion_zoom}");
    println!(
        "  from {:.5}, {:.5} z{:.2}",
        before.latitude, before.longitude, before.zoom
    );
    println!(
        "  to   {:.5}, {:.5} z{:.2}",
        after.latitude, after.longitude, after.zoom
    );
    if let Some(transition) = after.transition {
        println!("  fly-to over {:.0} ms", transition.duration_ms);
    }
    Ok(())
}

async fn session(
    config: &MapConfig,
    input: Option<&Path>,
    multi: &MultiProgress,
) -> Result<MapSession, Box<dyn std::error::Error>> {
    let incidents = load(config, input, multi).await?;
    let mut session = MapSession::new(config)?;
    session.set_fetch_state(FetchState::Loaded(incidents))?;
    Ok(session)
}

fn print_summary(incidents: &[Incident], cap: usize) {
    let mut counts: BTreeMap<CrimeCategory, usize> = BTreeMap::new();
    for incident in incidents {
        *counts.entry(incident.crime_category()).or_default() += 1;
    }

    println!("{} incidents", incidents.len());
    for (category, count) in &counts {
        println!("  {:<32} {count:>6}", category.label());
    }
    if incidents.len() > cap {
        println!(
            "Only the first {cap} are clustered ({} dropped)",
            incidents.len() - cap
        );
    }
}

fn describe(marker: &Marker) -> String {
    match marker {
        Marker::Cluster {
            id,
            latitude,
            longitude,
            point_count,
            diameter_px,
            ..
        } => format!(
            "cluster  {id:>10}  {latitude:>10.5} {longitude:>10.5}  {point_count:>5} incidents  {diameter_px:.1}px"
        ),
        Marker::Incident {
            crime_id,
            latitude,
            longitude,
            label,
            ..
        } => format!("incident {crime_id:>10}  {latitude:>10.5} {longitude:>10.5}  {label}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describes_both_marker_kinds() {
        let cluster = describe(&Marker::Cluster {
            id: 77,
            latitude: 52.6,
            longitude: -1.1,
            point_count: 12,
            label: "12".to_string(),
            diameter_px: 14.5,
        });
        assert!(cluster.starts_with("cluster"));
        assert!(cluster.contains("12 incidents"));
        assert!(cluster.ends_with("14.5px"));

        let incident = describe(&Marker::Incident {
            crime_id: 79_459_834,
            latitude: 52.6,
            longitude: -1.1,
            category: "drugs".to_string(),
            label: "Drugs".to_string(),
        });
        assert!(incident.starts_with("incident"));
        assert!(incident.contains("79459834"));
        assert!(incident.ends_with("Drugs"));
    }
}
