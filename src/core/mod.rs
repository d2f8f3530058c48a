pub mod engine;
pub mod geo;

pub use crate::domain::model::{GeoPoint, GuardLookup, Pharmacy, RankedResult, SearchHit};
pub use crate::domain::ports::PharmacyStore;
pub use crate::utils::error::Result;
