//! External data sources.
//!
//! # Data Sources
//!
//! - [`spypoint`]: SPYPOINT trail camera cloud - cameras and photos

pub mod spypoint;

pub use spypoint::{Session, SpypointClient};
