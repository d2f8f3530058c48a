use crate::domain::model::{Pharmacy, PharmacyId, SearchHit};
use crate::domain::query::{Filter, Stage};
use crate::utils::error::StoreResult;
use async_trait::async_trait;
use std::sync::Arc;

/// Storage collaborator for pharmacy records.
///
/// Implementations own persistence; the engine only reads records and writes
/// back the duty flag through [`PharmacyStore::save`].
#[async_trait]
pub trait PharmacyStore: Send + Sync {
    /// Records matching `filter`, in storage order.
    async fn find(&self, filter: &Filter) -> StoreResult<Vec<Pharmacy>>;

    async fn find_by_id(&self, id: &PharmacyId) -> StoreResult<Option<Pharmacy>>;

    /// Runs the stages in order. A geo-near stage sets `distance` (meters)
    /// on every hit it passes through.
    async fn aggregate(&self, pipeline: &[Stage]) -> StoreResult<Vec<SearchHit>>;

    /// Inserts or replaces the record with the same id and returns what was
    /// stored.
    async fn save(&self, pharmacy: &Pharmacy) -> StoreResult<Pharmacy>;
}

#[async_trait]
impl<T: PharmacyStore + ?Sized> PharmacyStore for Arc<T> {
    async fn find(&self, filter: &Filter) -> StoreResult<Vec<Pharmacy>> {
        (**self).find(filter).await
    }

    async fn find_by_id(&self, id: &PharmacyId) -> StoreResult<Option<Pharmacy>> {
        (**self).find_by_id(id).await
    }

    async fn aggregate(&self, pipeline: &[Stage]) -> StoreResult<Vec<SearchHit>> {
        (**self).aggregate(pipeline).await
    }

    async fn save(&self, pharmacy: &Pharmacy) -> StoreResult<Pharmacy> {
        (**self).save(pharmacy).await
    }
}

pub trait ConfigProvider: Send + Sync {
    fn dataset_path(&self) -> &str;
    /// Meters; applied when a search supplies coordinates but no cap.
    fn default_max_distance(&self) -> Option<f64>;
    fn json_logs(&self) -> bool;
}
