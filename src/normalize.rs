//! Normalization of SPYPOINT payloads into the domain model.
//!
//! Every function here is pure and infallible. Missing or malformed vendor
//! fields fall back to documented defaults so partial data never aborts a
//! batch:
//!
//! | Field              | Source                         | Default                 |
//! |--------------------|--------------------------------|-------------------------|
//! | `Camera.name`      | `config.name`                  | `"Unknown Camera"`      |
//! | `Camera.model`     | `status.model`                 | `"Unknown Model"`       |
//! | `Camera.last_update` | `status.lastUpdate`          | observation time        |
//! | `Photo.filename`   | `originName`                   | `"photo_<id>.jpg"`      |
//! | `Photo.tags`       | `tag`                          | empty                   |
//! | `Photo.url_*`      | `small` / `medium` / `large`   | `""`                    |

use std::cmp::Reverse;
use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

use crate::data_sources::spypoint::{RawCamera, RawPhoto, RawSizeVariant};
use crate::model::{Camera, Coordinates, Photo};

/// Name used when the vendor sends none.
pub const UNKNOWN_CAMERA_NAME: &str = "Unknown Camera";

/// Model used when the vendor sends none.
pub const UNKNOWN_CAMERA_MODEL: &str = "Unknown Model";

/// A camera counts as online if it checked in more recently than this (24 hours).
pub const ONLINE_WINDOW_MS: i64 = 86_400_000;

/// Cameras keyed by id, borrowed from the list supplied to a photo fetch.
pub type CameraLookup<'a> = HashMap<&'a str, &'a Camera>;

/// Index a camera list by id. Later duplicates win.
pub fn camera_lookup(cameras: &[Camera]) -> CameraLookup<'_> {
    cameras.iter().map(|c| (c.id.as_str(), c)).collect()
}

/// Non-empty string or nothing.
fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|s| !s.is_empty())
}

/// Whether `last_update` lies strictly within [`ONLINE_WINDOW_MS`] of `observed_at`.
///
/// Exactly 24 hours elapsed is offline. A check-in in the future counts as online.
pub fn is_online(last_update: DateTime<Utc>, observed_at: DateTime<Utc>) -> bool {
    (observed_at - last_update).num_milliseconds() < ONLINE_WINDOW_MS
}

/// Parse a vendor timestamp.
///
/// Accepts RFC 3339, ISO 8601 with a `+hhmm` offset, and ISO 8601 without an
/// offset (read as UTC). A bare date is midnight UTC.
pub fn parse_timestamp(ts: &str) -> Option<DateTime<Utc>> {
    let ts = ts.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(ts) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(ts, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(ts, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(ts, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Convert a raw camera record into a [`Camera`].
///
/// `observed_at` is the instant online status is judged against. A missing
/// `lastUpdate` means the camera is taken to have reported at `observed_at`.
/// One that [`parse_timestamp`] cannot read is treated as the Unix epoch, so the camera reads as
/// offline rather than inventing a recent check-in.
pub fn normalize_camera(raw: &RawCamera, observed_at: DateTime<Utc>) -> Camera {
    let config = raw.config.as_ref();
    let status = raw.status.as_ref();

    let last_update = match non_empty(status.and_then(|s| s.last_update.as_ref())) {
        Some(ts) => parse_timestamp(ts).unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
        None => observed_at,
    };

    Camera {
        id: raw.id.clone().unwrap_or_default(),
        name: non_empty(config.and_then(|c| c.name.as_ref()))
            .unwrap_or(UNKNOWN_CAMERA_NAME)
            .to_string(),
        model: non_empty(status.and_then(|s| s.model.as_ref()))
            .unwrap_or(UNKNOWN_CAMERA_MODEL)
            .to_string(),
        last_update,
        is_online: is_online(last_update, observed_at),
        coordinates: parse_coordinates(status.and_then(|s| s.coordinates.as_ref())),
    }
}

/// Extract a position from the vendor's coordinate list.
///
/// Expects `[{ "position": { "type": "Point", "coordinates": [lon, lat] } }, ...]`
/// and reads only the first element. GeoJSON order is longitude first; the
/// result swaps it into `{latitude, longitude}`. Anything else, including a
/// component that is not a finite number, yields `None`.
pub fn parse_coordinates(raw: Option<&Value>) -> Option<Coordinates> {
    let first = raw?.as_array()?.first()?;
    let position = first.as_object()?.get("position")?;

    if position.get("type").and_then(Value::as_str) != Some("Point") {
        return None;
    }

    match position.get("coordinates")?.as_array()?.as_slice() {
        [longitude, latitude] => Some(Coordinates {
            latitude: parse_component(latitude)?,
            longitude: parse_component(longitude)?,
        }),
        _ => None,
    }
}

/// A coordinate component may be a JSON number or a numeric string.
fn parse_component(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    parsed.is_finite().then_some(parsed)
}

/// Build `https://<host>/<path>` for a size variant, or `""` if either part is
/// missing or empty. The path is not escaped.
pub fn build_url(variant: &RawSizeVariant) -> String {
    match (non_empty(variant.host.as_ref()), non_empty(variant.path.as_ref())) {
        (Some(host), Some(path)) => format!("https://{}/{}", host, path),
        _ => String::new(),
    }
}

fn build_optional_url(variant: Option<&RawSizeVariant>) -> String {
    variant.map(build_url).unwrap_or_default()
}

/// Convert a raw photo record into a [`Photo`], enriching it from `cameras`.
///
/// An unknown camera id leaves `camera_name` and `camera_coordinates` unset.
pub fn normalize_photo(raw: &RawPhoto, cameras: &CameraLookup<'_>) -> Photo {
    let id = raw.id.clone().unwrap_or_default();
    let camera_id = raw.camera.clone().unwrap_or_default();
    let camera = cameras.get(camera_id.as_str());

    Photo {
        filename: non_empty(raw.origin_name.as_ref())
            .map(str::to_string)
            .unwrap_or_else(|| format!("photo_{}.jpg", id)),
        timestamp: raw.date.clone().unwrap_or_default(),
        tags: raw.tag.clone().unwrap_or_default(),
        url_small: build_optional_url(raw.small.as_ref()),
        url_medium: build_optional_url(raw.medium.as_ref()),
        url_large: build_optional_url(raw.large.as_ref()),
        camera_name: camera.map(|c| c.name.clone()),
        camera_coordinates: camera.and_then(|c| c.coordinates),
        id,
        camera_id,
    }
}

/// Sort photos newest first.
///
/// Stable, so photos with equal timestamps keep the vendor's order. Photos
/// whose timestamp does not parse go last.
pub fn sort_by_recency(photos: &mut [Photo]) {
    photos.sort_by_cached_key(|photo| Reverse(photo.datetime()));
}
