//! HTTP handler functions for the crime cluster API.

use std::sync::{RwLockReadGuard, RwLockWriteGuard};

use actix_web::{HttpResponse, web};
use crime_cluster_crime_models::CrimeCategory;
use crime_cluster_map::MapSession;
use crime_cluster_server_models::{
    ApiCategory, ApiChildren, ApiConfig, ApiError, ApiExpansion, ApiHealth, ApiLeaves,
    ApiMarkers, ApiStatus, LeavesQueryParams, MarkerQueryParams, ViewportUpdate,
};
use crime_cluster_spatial::export::to_feature_collection;
use crime_cluster_spatial::{BoundingBox, ClusterError};
use crime_cluster_viewport::Viewport;

use crate::AppState;

/// Default page size for `GET /api/clusters/{id}/leaves`.
const DEFAULT_LEAVES_LIMIT: usize = 10;

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/config`
///
/// Map widget token, initial camera and clustering parameters.
pub async fn config(state: web::Data<AppState>) -> HttpResponse {
    let config = &state.config;
    HttpResponse::Ok().json(ApiConfig {
        access_token: config.access_token.clone(),
        initial_view: config.initial_viewport().target(),
        max_zoom: config.max_zoom,
        radius: config.radius,
        max_incidents: config.max_incidents,
        categories: CrimeCategory::all()
            .iter()
            .copied()
            .map(ApiCategory::from)
            .collect(),
    })
}

/// `GET /api/status`
///
/// Whether the incident fetch is pending, done or failed, with counts.
pub async fn status(state: web::Data<AppState>) -> HttpResponse {
    match read_session(&state) {
        Ok(session) => HttpResponse::Ok().json(ApiStatus::from(session.status())),
        Err(response) => response,
    }
}

/// `GET /api/viewport`
pub async fn get_viewport(state: web::Data<AppState>) -> HttpResponse {
    match read_session(&state) {
        Ok(session) => HttpResponse::Ok().json(session.viewport()),
        Err(response) => response,
    }
}

/// `PUT /api/viewport`
///
/// Replaces the session viewport with the camera the frontend reports and
/// returns the markers for it.
pub async fn put_viewport(
    state: web::Data<AppState>,
    body: web::Json<ViewportUpdate>,
) -> HttpResponse {
    let mut session = match write_session(&state) {
        Ok(session) => session,
        Err(response) => return response,
    };
    session.set_viewport(Viewport::from(body.into_inner()));
    HttpResponse::Ok().json(current_markers(&session))
}

/// `GET /api/markers`
///
/// Markers for the session viewport, or for `bbox`/`zoom` when given.
pub async fn markers(
    state: web::Data<AppState>,
    params: web::Query<MarkerQueryParams>,
) -> HttpResponse {
    let session = match read_session(&state) {
        Ok(session) => session,
        Err(response) => return response,
    };
    let (bounds, zoom) = match view_params(&session, &params) {
        Ok(view) => view,
        Err(response) => return response,
    };

    HttpResponse::Ok().json(ApiMarkers {
        zoom,
        bounds: bounds.map(BoundingBox::to_array),
        total_points: session.total_points(),
        markers: session.markers_for(bounds, zoom),
    })
}

/// `GET /api/clusters.geojson`
///
/// The same features as `/api/markers`, as a `GeoJSON` `FeatureCollection`.
pub async fn clusters_geojson(
    state: web::Data<AppState>,
    params: web::Query<MarkerQueryParams>,
) -> HttpResponse {
    let session = match read_session(&state) {
        Ok(session) => session,
        Err(response) => return response,
    };
    let (bounds, zoom) = match view_params(&session, &params) {
        Ok(view) => view,
        Err(response) => return response,
    };

    match to_feature_collection(&session.features_for(bounds, zoom)) {
        Ok(collection) => HttpResponse::Ok()
            .content_type("application/geo+json")
            .json(collection),
        Err(e) => {
            log::error!("Failed to encode GeoJSON: {e}");
            HttpResponse::InternalServerError().json(ApiError::new("Failed to encode GeoJSON"))
        }
    }
}

/// `POST /api/clusters/{id}/expand`
///
/// Cluster click: flies the session viewport to the cluster at its
/// expansion zoom and returns the new viewport.
pub async fn expand_cluster(state: web::Data<AppState>, path: web::Path<usize>) -> HttpResponse {
    let cluster_id = path.into_inner();
    let mut session = match write_session(&state) {
        Ok(session) => session,
        Err(response) => return response,
    };

    let expansion_zoom = match session.expansion_zoom(cluster_id) {
        Ok(zoom) => zoom,
        Err(e) => return cluster_error(&e),
    };
    match session.click_cluster(cluster_id) {
        Ok(viewport) => HttpResponse::Ok().json(ApiExpansion {
            cluster_id,
            expansion_zoom,
            viewport,
        }),
        Err(e) => cluster_error(&e),
    }
}

/// `GET /api/clusters/{id}/children`
pub async fn cluster_children(
    state: web::Data<AppState>,
    path: web::Path<usize>,
) -> HttpResponse {
    let cluster_id = path.into_inner();
    let session = match read_session(&state) {
        Ok(session) => session,
        Err(response) => return response,
    };
    match session.children(cluster_id) {
        Ok(children) => HttpResponse::Ok().json(ApiChildren {
            cluster_id,
            children,
        }),
        Err(e) => cluster_error(&e),
    }
}

/// `GET /api/clusters/{id}/leaves?limit=&offset=`
pub async fn cluster_leaves(
    state: web::Data<AppState>,
    path: web::Path<usize>,
    params: web::Query<LeavesQueryParams>,
) -> HttpResponse {
    let cluster_id = path.into_inner();
    let limit = params.limit.unwrap_or(DEFAULT_LEAVES_LIMIT);
    let offset = params.offset.unwrap_or(0);

    let session = match read_session(&state) {
        Ok(session) => session,
        Err(response) => return response,
    };
    match session.leaves(cluster_id, limit, offset) {
        Ok(leaves) => HttpResponse::Ok().json(ApiLeaves {
            cluster_id,
            limit,
            offset,
            leaves,
        }),
        Err(e) => cluster_error(&e),
    }
}

fn current_markers(session: &MapSession) -> ApiMarkers {
    let bounds = session.bounds();
    ApiMarkers {
        zoom: session.viewport().zoom,
        bounds: bounds.map(BoundingBox::to_array),
        total_points: session.total_points(),
        markers: session.markers(),
    }
}

/// Resolves the bounds and zoom a marker query asks for, falling back to
/// the session viewport.
fn view_params(
    session: &MapSession,
    params: &MarkerQueryParams,
) -> Result<(Option<BoundingBox>, f64), HttpResponse> {
    let bounds = match params.bbox.as_deref() {
        Some(bbox) => Some(
            bbox.parse::<BoundingBox>()
                .map_err(|e| HttpResponse::BadRequest().json(ApiError::new(e.to_string())))?,
        ),
        None => session.bounds(),
    };
    let zoom = params.zoom.unwrap_or(session.viewport().zoom);
    if !zoom.is_finite() {
        return Err(HttpResponse::BadRequest().json(ApiError::new("zoom must be finite")));
    }
    Ok((bounds, zoom))
}

fn cluster_error(error: &ClusterError) -> HttpResponse {
    match error {
        ClusterError::NotFound { .. } => {
            HttpResponse::NotFound().json(ApiError::new(error.to_string()))
        }
        ClusterError::InvalidOptions { .. } => {
            log::error!("{error}");
            HttpResponse::InternalServerError().json(ApiError::new(error.to_string()))
        }
    }
}

fn read_session(state: &AppState) -> Result<RwLockReadGuard<'_, MapSession>, HttpResponse> {
    state.session.read().map_err(|e| {
        log::error!("Session lock poisoned: {e}");
        HttpResponse::InternalServerError().json(ApiError::new("Session unavailable"))
    })
}

fn write_session(state: &AppState) -> Result<RwLockWriteGuard<'_, MapSession>, HttpResponse> {
    state.session.write().map_err(|e| {
        log::error!("Session lock poisoned: {e}");
        HttpResponse::InternalServerError().json(ApiError::new("Session unavailable"))
    })
}

#[cfg(test)]
mod tests {
    use actix_web::{App, http::StatusCode, test};
    use crime_cluster_map::{FetchState, MapConfig, Marker};
    use crime_cluster_source_models::Incident;

    use super::*;
    use crate::configure_api;

    fn incidents(n: usize) -> Vec<Incident> {
        (0..n)
            .map(|i| {
                #[allow(clippy::cast_precision_loss)]
                let offset = i as f64 * 0.0005;
                Incident {
                    id: i as u64,
                    category: "burglary".to_string(),
                    latitude: 52.63 + offset,
                    longitude: -1.13 + offset,
                    month: Some("2019-10".to_string()),
                    street_name: Some("On or near High Street".to_string()),
                    location_type: Some("Force".to_string()),
                    persistent_id: None,
                    outcome: None,
                    feed_index: i,
                }
            })
            .collect()
    }

    fn state_with(fetch_state: FetchState) -> web::Data<AppState> {
        let state = AppState::new(MapConfig::default()).unwrap();
        state
            .session
            .write()
            .unwrap()
            .set_fetch_state(fetch_state)
            .unwrap();
        web::Data::new(state)
    }

    macro_rules! app {
        ($state:expr) => {
            test::init_service(
                App::new()
                    .app_data($state.clone())
                    .configure(configure_api),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn health_reports_version() {
        let app = app!(state_with(FetchState::Loading));
        let resp: ApiHealth = test::call_and_read_body_json(
            &app,
            test::TestRequest::get().uri("/api/health").to_request(),
        )
        .await;
        assert!(resp.healthy);
        assert_eq!(resp.version, env!("CARGO_PKG_VERSION"));
    }

    #[actix_web::test]
    async fn loading_session_has_no_markers() {
        let app = app!(state_with(FetchState::Loading));
        let status: ApiStatus = test::call_and_read_body_json(
            &app,
            test::TestRequest::get().uri("/api/status").to_request(),
        )
        .await;
        assert_eq!(status.fetched, 0);

        let markers: ApiMarkers = test::call_and_read_body_json(
            &app,
            test::TestRequest::get().uri("/api/markers").to_request(),
        )
        .await;
        assert!(markers.markers.is_empty());
        assert_eq!(markers.bounds, None);
    }

    #[actix_web::test]
    async fn markers_cover_loaded_incidents() {
        let app = app!(state_with(FetchState::Loaded(incidents(40))));
        let markers: ApiMarkers = test::call_and_read_body_json(
            &app,
            test::TestRequest::get().uri("/api/markers?zoom=21").to_request(),
        )
        .await;
        assert_eq!(markers.total_points, 40);
        assert_eq!(markers.markers.len(), 40);
        assert!(markers.markers.iter().all(|m| !m.is_cluster()));
    }

    #[actix_web::test]
    async fn bad_bbox_is_rejected() {
        let app = app!(state_with(FetchState::Loaded(incidents(5))));
        let resp = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/markers?bbox=1,2,3")
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn put_viewport_sets_bounds() {
        let state = state_with(FetchState::Loaded(incidents(40)));
        let app = app!(state);
        let markers: ApiMarkers = test::call_and_read_body_json(
            &app,
            test::TestRequest::put()
                .uri("/api/viewport")
                .set_json(ViewportUpdate {
                    latitude: 52.64,
                    longitude: -1.12,
                    zoom: 13.0,
                    width: 1024,
                    height: 768,
                })
                .to_request(),
        )
        .await;
        assert!(markers.bounds.is_some());
        assert!((markers.zoom - 13.0).abs() < f64::EPSILON);

        let viewport: Viewport = test::call_and_read_body_json(
            &app,
            test::TestRequest::get().uri("/api/viewport").to_request(),
        )
        .await;
        assert_eq!(viewport.width, 1024);
    }

    #[actix_web::test]
    async fn expand_flies_to_cluster() {
        let state = state_with(FetchState::Loaded(incidents(40)));
        let app = app!(state);
        let markers: ApiMarkers = test::call_and_read_body_json(
            &app,
            test::TestRequest::get().uri("/api/markers?zoom=6").to_request(),
        )
        .await;
        let Some(Marker::Cluster {
            id,
            latitude,
            longitude,
            point_count,
            ..
        }) = markers.markers.into_iter().find(Marker::is_cluster)
        else {
            panic!("expected a cluster at zoom 6");
        };

        let expansion: ApiExpansion = test::call_and_read_body_json(
            &app,
            test::TestRequest::post()
                .uri(&format!("/api/clusters/{id}/expand"))
                .to_request(),
        )
        .await;
        assert_eq!(expansion.cluster_id, id);
        assert!(expansion.viewport.zoom >= 6.0);
        assert!(expansion.viewport.zoom <= 20.0);
        assert!((expansion.viewport.latitude - latitude).abs() < 1e-9);
        assert!((expansion.viewport.longitude - longitude).abs() < 1e-9);
        assert!(expansion.viewport.transition.is_some());

        let leaves: ApiLeaves = test::call_and_read_body_json(
            &app,
            test::TestRequest::get()
                .uri(&format!("/api/clusters/{id}/leaves?limit=100"))
                .to_request(),
        )
        .await;
        assert_eq!(leaves.leaves.len(), point_count);

        let children: ApiChildren = test::call_and_read_body_json(
            &app,
            test::TestRequest::get()
                .uri(&format!("/api/clusters/{id}/children"))
                .to_request(),
        )
        .await;
        assert!(!children.children.is_empty());
    }

    #[actix_web::test]
    async fn unknown_cluster_is_404() {
        let app = app!(state_with(FetchState::Loaded(incidents(5))));
        for req in [
            test::TestRequest::post().uri("/api/clusters/999999/expand"),
            test::TestRequest::get().uri("/api/clusters/999999/children"),
            test::TestRequest::get().uri("/api/clusters/999999/leaves"),
        ] {
            let resp = test::call_service(&app, req.to_request()).await;
            assert_eq!(resp.status(), StatusCode::NOT_FOUND);
            let body: ApiError = test::read_body_json(resp).await;
            assert!(body.error.contains("999999"));
        }
    }

    #[actix_web::test]
    async fn geojson_tags_clusters() {
        let app = app!(state_with(FetchState::Loaded(incidents(40))));
        let resp = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/clusters.geojson?zoom=6")
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["type"], "FeatureCollection");
        assert!(
            body["features"]
                .as_array()
                .unwrap()
                .iter()
                .any(|f| f["properties"]["cluster"] == true)
        );
    }

    #[actix_web::test]
    async fn config_exposes_token_and_categories() {
        let mut config = MapConfig::default();
        config.access_token = Some("pk.test".to_string());
        let state = web::Data::new(AppState::new(config).unwrap());
        let app = app!(state);
        let body: ApiConfig = test::call_and_read_body_json(
            &app,
            test::TestRequest::get().uri("/api/config").to_request(),
        )
        .await;
        assert_eq!(body.access_token.as_deref(), Some("pk.test"));
        assert_eq!(body.max_zoom, 20);
        assert_eq!(body.categories.len(), CrimeCategory::all().len());
    }
}
