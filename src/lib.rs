//! Trailcam - a client adapter for SPYPOINT cellular trail cameras.
//!
//! # Overview
//!
//! Trailcam logs in to the SPYPOINT REST API, retrieves camera and photo
//! metadata, and normalizes the vendor's loosely shaped JSON into a stable
//! model. Photos are cross-referenced with the camera list they were fetched
//! for, so each photo carries its camera's name and position.
//!
//! # Flow
//!
//! 1. [`data_sources::SpypointClient::authenticate`] obtains a bearer token.
//! 2. [`data_sources::SpypointClient::get_cameras`] lists cameras.
//! 3. [`data_sources::SpypointClient::get_photos`] fetches photos for those
//!    cameras and enriches them from the same list.
//!
//! # Modules
//!
//! - [`model`]: Domain types for cameras and photos
//! - [`normalize`]: Pure mapping from vendor records to the domain types
//! - [`data_sources`]: SPYPOINT API client and session
//! - [`cache`]: Single-slot, time-boxed memoization
//! - [`config`]: Environment configuration
//! - [`api`]: HTTP API handlers
//! - [`error`]: Error taxonomy

pub mod api;
pub mod cache;
pub mod config;
pub mod data_sources;
pub mod error;
pub mod model;
pub mod normalize;
