pub mod adapters;
#[cfg(feature = "cli")]
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{CliConfig, Command};

pub use adapters::{FileStore, InMemoryStore};
pub use config::Settings;
pub use crate::core::{engine::PharmacyEngine, geo::calculate_distance};
pub use domain::model::{GeoPoint, GuardLookup, Pharmacy, PharmacyId, RankedResult, SearchHit, SearchParams};
pub use utils::error::{LocatorError, Result, StoreError};
