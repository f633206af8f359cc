//! Runtime configuration loaded from the environment.
//!
//! | Variable                     | Required | Default                               |
//! |------------------------------|----------|---------------------------------------|
//! | `SPYPOINT_USERNAME`          | yes      |                                       |
//! | `SPYPOINT_PASSWORD`          | yes      |                                       |
//! | `SPYPOINT_API_URL`           | no       | `https://restapi.spypoint.com/api/v3` |
//! | `TRAILCAM_PORT`              | no       | `3000`                                |
//! | `TRAILCAM_CAMERA_CACHE_SECS` | no       | `300`                                 |

use std::env;
use std::fmt;
use std::time::Duration;

use anyhow::Context;

use crate::cache::DEFAULT_CAMERA_TTL;

/// Default port if not specified via environment variable.
pub const DEFAULT_PORT: u16 = 3000;

/// Account credentials for the vendor API.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &"<redacted>")
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: Credentials,

    /// Vendor API base URL override.
    pub api_url: Option<String>,

    pub port: u16,

    /// How long a fetched camera list is reused.
    pub camera_cache_ttl: Duration,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let username = lookup("SPYPOINT_USERNAME")
            .filter(|v| !v.is_empty())
            .context("SPYPOINT_USERNAME is not set")?;
        let password = lookup("SPYPOINT_PASSWORD")
            .filter(|v| !v.is_empty())
            .context("SPYPOINT_PASSWORD is not set")?;

        let port = lookup("TRAILCAM_PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let camera_cache_ttl = lookup("TRAILCAM_CAMERA_CACHE_SECS")
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_CAMERA_TTL);

        Ok(Self {
            credentials: Credentials { username, password },
            api_url: lookup("SPYPOINT_API_URL").filter(|v| !v.is_empty()),
            port,
            camera_cache_ttl,
        })
    }
}
