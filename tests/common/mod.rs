//! A mock SPYPOINT API served by axum on an ephemeral port.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{Duration, Utc};
use serde_json::{Value, json};
use tokio::net::TcpListener;

pub const USERNAME: &str = "hunter@example.com";
pub const PASSWORD: &str = "secret";
pub const TOKEN: &str = "tok-123";

/// Username that makes the mock login answer 500.
pub const BROKEN_USERNAME: &str = "broken@example.com";

/// Username that makes the mock login answer 200 without a token.
pub const TOKENLESS_USERNAME: &str = "tokenless@example.com";

/// Shared state and knobs of the mock vendor.
#[derive(Clone)]
pub struct MockVendor {
    pub camera_hits: Arc<AtomicUsize>,
    pub photo_requests: Arc<Mutex<Vec<Value>>>,
    pub camera_status: Arc<Mutex<StatusCode>>,
    pub photos_status: Arc<Mutex<StatusCode>>,
    pub photos_body: Arc<Mutex<String>>,
    /// Raw camera body; `None` serves [`default_cameras`].
    pub cameras_body: Arc<Mutex<Option<String>>>,
}

impl Default for MockVendor {
    fn default() -> Self {
        Self {
            camera_hits: Arc::new(AtomicUsize::new(0)),
            photo_requests: Arc::new(Mutex::new(Vec::new())),
            camera_status: Arc::new(Mutex::new(StatusCode::OK)),
            photos_status: Arc::new(Mutex::new(StatusCode::OK)),
            photos_body: Arc::new(Mutex::new(default_photos().to_string())),
            cameras_body: Arc::new(Mutex::new(None)),
        }
    }
}

impl MockVendor {
    pub fn camera_hits(&self) -> usize {
        self.camera_hits.load(Ordering::SeqCst)
    }

    pub fn last_photo_request(&self) -> Option<Value> {
        self.photo_requests.lock().unwrap().last().cloned()
    }

    pub fn set_camera_status(&self, status: StatusCode) {
        *self.camera_status.lock().unwrap() = status;
    }

    pub fn set_photos_status(&self, status: StatusCode) {
        *self.photos_status.lock().unwrap() = status;
    }

    pub fn set_photos_body(&self, body: &str) {
        *self.photos_body.lock().unwrap() = body.to_string();
    }

    pub fn set_cameras_body(&self, body: &str) {
        *self.cameras_body.lock().unwrap() = Some(body.to_string());
    }
}

/// Two cameras: "cam-a" is online with a position, "cam-b" is a week stale
/// and has no config.
pub fn default_cameras() -> Value {
    json!([
        {
            "id": "cam-a",
            "config": { "name": "Back Forty" },
            "status": {
                "model": "FLEX-M",
                "lastUpdate": (Utc::now() - Duration::hours(1)).to_rfc3339(),
                "coordinates": [
                    { "position": { "type": "Point", "coordinates": [-73.5, 45.2] } }
                ]
            }
        },
        {
            "id": "cam-b",
            "status": {
                "lastUpdate": (Utc::now() - Duration::days(7)).to_rfc3339()
            }
        }
    ])
}

/// Three photos out of order; "p3" references a camera that does not exist.
pub fn default_photos() -> Value {
    json!({
        "photos": [
            {
                "id": "p1",
                "camera": "cam-a",
                "date": "2024-05-01T10:00:00.000Z",
                "originName": "PICT0001.JPG",
                "tag": ["deer"],
                "small": { "host": "cdn.example.com", "path": "s/p1.jpg" },
                "medium": { "host": "cdn.example.com", "path": "m/p1.jpg" },
                "large": { "host": "cdn.example.com", "path": "l/p1.jpg" }
            },
            {
                "id": "p2",
                "camera": "cam-b",
                "date": "2024-05-03T06:30:00.000Z"
            },
            {
                "id": "p3",
                "camera": "cam-zzz",
                "date": "2024-05-02T22:15:00.000Z",
                "tag": ["buck"]
            }
        ]
    })
}

fn authorized(headers: &HeaderMap) -> bool {
    let expected = format!("Bearer {}", TOKEN);
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        == Some(expected.as_str())
}

async fn login(Json(body): Json<Value>) -> Response {
    let username = body["username"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();

    if username == BROKEN_USERNAME {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    if username == TOKENLESS_USERNAME {
        return Json(json!({ "user": username })).into_response();
    }
    if username == USERNAME && password == PASSWORD {
        return Json(json!({ "token": TOKEN })).into_response();
    }
    StatusCode::UNAUTHORIZED.into_response()
}

async fn cameras(State(vendor): State<MockVendor>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    vendor.camera_hits.fetch_add(1, Ordering::SeqCst);

    let status = *vendor.camera_status.lock().unwrap();
    if !status.is_success() {
        return status.into_response();
    }
    let body = vendor.cameras_body.lock().unwrap().clone();
    match body {
        Some(body) => ([(header::CONTENT_TYPE, "application/json")], body).into_response(),
        None => Json(default_cameras()).into_response(),
    }
}

async fn photos(
    State(vendor): State<MockVendor>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    vendor.photo_requests.lock().unwrap().push(body);

    let status = *vendor.photos_status.lock().unwrap();
    if !status.is_success() {
        return status.into_response();
    }
    let body = vendor.photos_body.lock().unwrap().clone();
    ([(header::CONTENT_TYPE, "application/json")], body).into_response()
}

/// Start the mock vendor and return its base URL.
pub async fn spawn_vendor(vendor: MockVendor) -> String {
    let app = Router::new()
        .route("/user/login", post(login))
        .route("/camera/all", get(cameras))
        .route("/photo/all", post(photos))
        .with_state(vendor);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}
