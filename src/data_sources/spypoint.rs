//! SPYPOINT REST API client.
//!
//! SPYPOINT cellular trail cameras upload photos to the vendor cloud. This
//! client logs in with account credentials, lists the account's cameras and
//! fetches a single bounded page of photos.
//!
//! # Session
//!
//! Each client holds at most one bearer token, obtained by
//! [`SpypointClient::authenticate`]. There is no refresh and no expiry
//! tracking; create a new client to log in again.
//!
//! # Normalization
//!
//! Vendor payloads are loosely shaped. Every field of the raw types below is
//! optional and tolerant of the wrong JSON type, so a single odd record never
//! aborts a batch. [`crate::normalize`] maps them onto the domain model.

use std::fmt;

use chrono::Utc;
use reqwest::StatusCode;
use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::error::{Result, SpypointError};
use crate::model::{Camera, Photo};
use crate::normalize::{camera_lookup, normalize_camera, normalize_photo, sort_by_recency};

/// Base URL for the SPYPOINT API.
const SPYPOINT_API_BASE: &str = "https://restapi.spypoint.com/api/v3";

/// Default number of photos requested when the caller gives no limit.
pub const DEFAULT_PHOTO_LIMIT: u32 = 100;

/// End-date filter meaning "no upper bound".
const OPEN_DATE_END: &str = "2100-01-01T00:00:00.000Z";

/// Bearer-token state for one client.
#[derive(Clone, Default)]
pub struct Session {
    token: Option<String>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Session {
    /// Whether a login has succeeded.
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// The `Authorization` header value for authorized requests.
    pub fn authorization_header(&self) -> Result<String> {
        self.token
            .as_deref()
            .map(|token| format!("Bearer {}", token))
            .ok_or(SpypointError::NotAuthenticated)
    }
}

/// Client for the SPYPOINT camera and photo API.
#[derive(Clone)]
pub struct SpypointClient {
    client: reqwest::Client,
    base_url: String,
    session: Session,
}

impl Default for SpypointClient {
    fn default() -> Self {
        Self::new()
    }
}

impl SpypointClient {
    /// Create a new, unauthenticated client.
    pub fn new() -> Self {
        Self::with_base_url(SPYPOINT_API_BASE)
    }

    /// Create a client with a custom base URL (for testing).
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            session: Session::default(),
        }
    }

    /// Current session state.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// The `Authorization` header value, or [`SpypointError::NotAuthenticated`].
    pub fn authorization_header(&self) -> Result<String> {
        self.session.authorization_header()
    }

    /// Exchange credentials for a bearer token.
    ///
    /// A 401 maps to [`SpypointError::InvalidCredentials`]; any other
    /// non-success status to [`SpypointError::AuthenticationFailed`].
    #[instrument(skip_all)]
    pub async fn authenticate(&mut self, username: &str, password: &str) -> Result<()> {
        let url = format!("{}/user/login", self.base_url);
        let body = LoginRequest { username, password };

        let response = self.client.post(&url).json(&body).send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            warn!("SPYPOINT rejected credentials");
            return Err(SpypointError::InvalidCredentials);
        }
        if !status.is_success() {
            warn!(%status, "SPYPOINT login failed");
            return Err(SpypointError::AuthenticationFailed { status });
        }

        let login: LoginResponse = read_json(response).await?;
        let token = login.token.ok_or_else(|| {
            SpypointError::MalformedResponse("login response has no token".to_string())
        })?;

        self.session.token = Some(token);
        info!("Authenticated with SPYPOINT");
        Ok(())
    }

    /// Fetch and normalize every camera on the account.
    ///
    /// Online status is evaluated against the time the response arrives.
    #[instrument(skip(self))]
    pub async fn get_cameras(&self) -> Result<Vec<Camera>> {
        let auth = self.authorization_header()?;
        let url = format!("{}/camera/all", self.base_url);

        let response = self
            .client
            .get(&url)
            .header(reqwest::header::AUTHORIZATION, auth)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(%status, "Camera fetch failed");
            return Err(SpypointError::FetchFailed {
                resource: "cameras",
                status,
            });
        }

        let values: Vec<Value> = read_json(response).await?;
        let total = values.len();
        let raw: Vec<RawCamera> = skip_invalid(values);
        if raw.len() < total {
            warn!(skipped = total - raw.len(), "Skipped non-object camera records");
        }

        let observed_at = Utc::now();
        let cameras: Vec<Camera> = raw
            .iter()
            .map(|camera| normalize_camera(camera, observed_at))
            .collect();

        info!(
            camera_count = cameras.len(),
            online_count = cameras.iter().filter(|c| c.is_online).count(),
            "Cameras fetched"
        );
        Ok(cameras)
    }

    /// Fetch one page of photos for the given cameras, newest first.
    ///
    /// Photos are enriched from `cameras` as passed in; no camera fetch
    /// happens here. An empty `tags` slice means no tag filter.
    #[instrument(skip(self, cameras), fields(camera_count = cameras.len()))]
    pub async fn get_photos(
        &self,
        cameras: &[Camera],
        limit: Option<u32>,
        tags: &[String],
    ) -> Result<Vec<Photo>> {
        let auth = self.authorization_header()?;
        let url = format!("{}/photo/all", self.base_url);

        let body = PhotosRequest {
            camera: cameras.iter().map(|c| c.id.as_str()).collect(),
            date_end: OPEN_DATE_END,
            favorite: false,
            hd: false,
            limit: limit.unwrap_or(DEFAULT_PHOTO_LIMIT),
            tag: tags,
        };

        let response = self
            .client
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, auth)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(%status, "Photo fetch failed");
            return Err(SpypointError::FetchFailed {
                resource: "photos",
                status,
            });
        }

        let data: RawPhotosResponse = read_json(response).await?;
        let lookup = camera_lookup(cameras);
        let mut photos: Vec<Photo> = data
            .photos
            .unwrap_or_default()
            .iter()
            .map(|photo| normalize_photo(photo, &lookup))
            .collect();
        sort_by_recency(&mut photos);

        info!(photo_count = photos.len(), "Photos fetched");
        Ok(photos)
    }
}

/// Read a response body and parse it as JSON.
///
/// Transport errors while reading stay [`SpypointError::Transport`]; a body
/// that does not parse becomes [`SpypointError::MalformedResponse`].
async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| {
        debug!(body_len = bytes.len(), error = %e, "Unparseable SPYPOINT response");
        SpypointError::MalformedResponse(e.to_string())
    })
}

// ============================================================================
// Request types
// ============================================================================

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct PhotosRequest<'a> {
    camera: Vec<&'a str>,
    #[serde(rename = "dateEnd")]
    date_end: &'a str,
    favorite: bool,
    hd: bool,
    limit: u32,
    tag: &'a [String],
}

// ============================================================================
// Response types
// ============================================================================

/// Response from `POST /user/login`.
#[derive(Debug, Clone, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    token: Option<String>,
}

/// A camera record from `GET /camera/all`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawCamera {
    /// Vendor camera identifier.
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<String>,

    /// User-editable configuration.
    #[serde(default, deserialize_with = "lenient")]
    pub config: Option<RawCameraConfig>,

    /// Last reported device status.
    #[serde(default, deserialize_with = "lenient")]
    pub status: Option<RawCameraStatus>,
}

/// The `config` sub-object of a camera.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawCameraConfig {
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
}

/// The `status` sub-object of a camera.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawCameraStatus {
    #[serde(default, deserialize_with = "lenient")]
    pub model: Option<String>,

    /// ISO 8601 time of the last check-in.
    #[serde(default, rename = "lastUpdate", deserialize_with = "lenient")]
    pub last_update: Option<String>,

    /// Sequence of containers holding a GeoJSON `position`. Kept untyped
    /// because its shape varies.
    #[serde(default)]
    pub coordinates: Option<Value>,
}

/// Response from `POST /photo/all`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawPhotosResponse {
    /// Must be an array or absent; entries that are not photo objects are
    /// dropped.
    #[serde(default, deserialize_with = "lenient_elements")]
    pub photos: Option<Vec<RawPhoto>>,
}

/// A photo record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawPhoto {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<String>,

    /// Owning camera identifier.
    #[serde(default, deserialize_with = "lenient_id")]
    pub camera: Option<String>,

    /// Capture time (ISO 8601).
    #[serde(default, deserialize_with = "lenient")]
    pub date: Option<String>,

    /// Original upload filename.
    #[serde(default, rename = "originName", deserialize_with = "lenient")]
    pub origin_name: Option<String>,

    /// Non-string entries are dropped.
    #[serde(default, deserialize_with = "lenient_list")]
    pub tag: Option<Vec<String>>,

    #[serde(default, deserialize_with = "lenient")]
    pub small: Option<RawSizeVariant>,

    #[serde(default, deserialize_with = "lenient")]
    pub medium: Option<RawSizeVariant>,

    #[serde(default, deserialize_with = "lenient")]
    pub large: Option<RawSizeVariant>,
}

/// Location of one resolution of a photo.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawSizeVariant {
    #[serde(default, deserialize_with = "lenient")]
    pub host: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub path: Option<String>,
}

/// Deserialize a field, treating a value of the wrong type as absent.
fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Keep the elements that deserialize as `T`, dropping the rest.
pub fn skip_invalid<T: DeserializeOwned>(values: Vec<Value>) -> Vec<T> {
    values
        .into_iter()
        .filter_map(|value| serde_json::from_value(value).ok())
        .collect()
}

/// An array (or null) whose elements are parsed one by one. A non-array
/// value is still an error.
fn lenient_elements<'de, D, T>(deserializer: D) -> std::result::Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(Option::<Vec<Value>>::deserialize(deserializer)?.map(skip_invalid))
}

/// Like [`lenient_elements`], but anything other than an array is absent.
fn lenient_list<'de, D, T>(deserializer: D) -> std::result::Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(values) => Some(skip_invalid(values)),
        _ => None,
    })
}

/// Identifiers arrive as strings, occasionally as numbers.
fn lenient_id<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}
