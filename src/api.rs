//! HTTP API handlers for Trailcam.
//!
//! Each request logs in with a fresh [`SpypointClient`]; no session is shared
//! between requests. The camera list is shared through a single-slot
//! [`TimedCache`] so that `/api/cameras` and the enrichment step of
//! `/api/photos` see the same snapshot until it expires.
//!
//! Failures are reported to callers only as a generic message. Status codes
//! and vendor details go to the log.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use tower_http::trace::TraceLayer;
use tracing::{info, instrument, warn};

use crate::cache::TimedCache;
use crate::config::Config;
use crate::data_sources::SpypointClient;
use crate::error::SpypointError;
use crate::model::{Camera, ErrorResponse, Photo, PhotosQuery};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub cameras: TimedCache<Vec<Camera>>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            cameras: TimedCache::new(config.camera_cache_ttl),
            config: Arc::new(config),
        }
    }

    fn client(&self) -> SpypointClient {
        match &self.config.api_url {
            Some(url) => SpypointClient::with_base_url(url),
            None => SpypointClient::new(),
        }
    }

    /// A client with a live session.
    async fn login(&self) -> Result<SpypointClient, SpypointError> {
        let mut client = self.client();
        let credentials = &self.config.credentials;
        client
            .authenticate(&credentials.username, &credentials.password)
            .await?;
        Ok(client)
    }
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn failure(message: &str) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new(message)),
    )
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/cameras", get(get_cameras))
        .route("/api/photos", get(get_photos))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /api/cameras - List the account's cameras.
///
/// Served from the camera cache while it is fresh; otherwise logs in,
/// fetches and refills the cache.
///
/// # Response
///
/// ```json
/// [
///     {
///         "id": "5f1e...",
///         "name": "Back Forty",
///         "model": "FLEX-M",
///         "last_update": "2024-05-01T11:00:00Z",
///         "is_online": true,
///         "coordinates": { "latitude": 45.2, "longitude": -73.5 }
///     }
/// ]
/// ```
#[instrument(skip(state))]
pub async fn get_cameras(State(state): State<AppState>) -> Result<Json<Vec<Camera>>, ApiError> {
    let result = state
        .cameras
        .get_or_try_insert_with(|| async {
            let client = state.login().await?;
            client.get_cameras().await
        })
        .await;

    match result {
        Ok(cameras) => {
            info!(camera_count = cameras.len(), "Cameras served");
            Ok(Json(cameras))
        }
        Err(e) => {
            warn!(error = %e, status = ?e.status(), "Camera fetch error");
            Err(failure("Failed to fetch cameras"))
        }
    }
}

/// GET /api/photos - List recent photos, newest first.
///
/// # Query Parameters
///
/// - `limit` (optional): Maximum number of photos (default: 50)
/// - `tags` (optional): Comma-separated tag filter
///
/// Photos are enriched with the cached camera list, which is fetched and
/// cached first on a miss.
#[instrument(skip(state))]
pub async fn get_photos(
    State(state): State<AppState>,
    Query(query): Query<PhotosQuery>,
) -> Result<Json<Vec<Photo>>, ApiError> {
    let limit = query.limit();
    let tags = query.tags();

    let result = async {
        let client = state.login().await?;
        let cameras = state
            .cameras
            .get_or_try_insert_with(|| client.get_cameras())
            .await?;
        client.get_photos(&cameras, Some(limit), &tags).await
    }
    .await;

    match result {
        Ok(photos) => {
            info!(photo_count = photos.len(), limit, "Photos served");
            Ok(Json(photos))
        }
        Err(e) => {
            warn!(error = %e, status = ?e.status(), "Photo fetch error");
            Err(failure("Failed to fetch photos"))
        }
    }
}

/// GET /health - Simple health check endpoint.
pub async fn health_check() -> impl IntoResponse {
    StatusCode::OK
}
