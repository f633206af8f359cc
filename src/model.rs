//! Domain model for trail cameras and their photos.
//!
//! These are the stable shapes handed to callers. Vendor payloads are mapped
//! onto them by [`crate::normalize`]; nothing here knows about the vendor's
//! nesting conventions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A geographic position. Both components are always present together.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// A trail camera as reported by the vendor.
///
/// Built fresh on every normalization call and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    /// Vendor-assigned identifier.
    pub id: String,

    /// Display name, `"Unknown Camera"` when the vendor omits it.
    pub name: String,

    /// Hardware model, `"Unknown Model"` when the vendor omits it.
    pub model: String,

    /// Last time the camera reported in.
    pub last_update: DateTime<Utc>,

    /// Whether `last_update` was less than 24 hours old when the camera was
    /// normalized. A snapshot, not re-evaluated later.
    pub is_online: bool,

    /// Camera position, if the vendor reported a GeoJSON point.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
}

/// A photo taken by a trail camera.
///
/// `camera_name` and `camera_coordinates` are copies taken at enrichment time
/// from the camera list supplied to the fetch. They are absent when no camera
/// in that list matches `camera_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Photo {
    pub id: String,

    /// Identifier of the owning camera. Dangling references are tolerated.
    pub camera_id: String,

    /// Capture time exactly as the vendor sent it (ISO-8601).
    pub timestamp: String,

    pub tags: Vec<String>,

    pub filename: String,

    /// Size-variant URLs; empty when the vendor did not provide host and path.
    pub url_small: String,
    pub url_medium: String,
    pub url_large: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera_coordinates: Option<Coordinates>,
}

impl Photo {
    /// Parse the capture time, if it is a timestamp the vendor is known to send.
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        crate::normalize::parse_timestamp(&self.timestamp)
    }
}

/// Query parameters for `GET /api/photos`.
///
/// Kept as raw strings; the handler applies the defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PhotosQuery {
    /// Maximum number of photos (default: 50).
    pub limit: Option<String>,

    /// Comma-separated tag filter.
    pub tags: Option<String>,
}

/// Default photo limit for the HTTP layer.
pub const DEFAULT_HTTP_PHOTO_LIMIT: u32 = 50;

impl PhotosQuery {
    /// The requested limit, falling back to the default when absent or not a number.
    pub fn limit(&self) -> u32 {
        self.limit
            .as_deref()
            .and_then(|l| l.trim().parse().ok())
            .unwrap_or(DEFAULT_HTTP_PHOTO_LIMIT)
    }

    /// The requested tags, with empty entries dropped.
    pub fn tags(&self) -> Vec<String> {
        self.tags
            .as_deref()
            .map(|t| {
                t.split(',')
                    .filter(|tag| !tag.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Generic failure body returned to HTTP callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: &str) -> Self {
        Self {
            error: message.to_string(),
        }
    }
}
