use crate::core::geo::calculate_distance;
use crate::domain::model::{
    GeoPoint, GuardLookup, Pharmacy, PharmacyId, RankedResult, SearchHit, SearchParams,
};
use crate::domain::ports::PharmacyStore;
use crate::domain::query::{Filter, GeoNear, Stage};
use crate::utils::error::{LocatorError, Result};

/// Proximity lookup, search and duty updates over a [`PharmacyStore`].
///
/// Every operation issues a single logical request to the store and wraps
/// store failures with an operation-specific message.
pub struct PharmacyEngine<S: PharmacyStore> {
    store: S,
}

impl<S: PharmacyStore> PharmacyEngine<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// On-guard pharmacies with their distance in kilometers from `location`,
    /// in the order the store returned them.
    pub async fn find_guard_pharmacies(&self, location: GeoPoint) -> Result<GuardLookup> {
        tracing::debug!(
            "Fetching guard pharmacies around ({}, {})",
            location.latitude,
            location.longitude
        );

        let pharmacies = self
            .store
            .find(&Filter::on_guard())
            .await
            .map_err(|e| LocatorError::storage("Failed to fetch guard pharmacies", e))?;

        let data: Vec<RankedResult> = pharmacies
            .into_iter()
            .map(|pharmacy| {
                let distance = calculate_distance(
                    location.latitude,
                    location.longitude,
                    pharmacy.latitude,
                    pharmacy.longitude,
                );
                RankedResult { pharmacy, distance }
            })
            .collect();

        tracing::info!("Found {} guard pharmacies", data.len());
        Ok(GuardLookup {
            success: true,
            data,
        })
    }

    /// With coordinates the search runs as a geo-near pipeline narrowed by an
    /// optional text match; without them it is a plain text or full fetch.
    pub async fn search_pharmacies(&self, params: &SearchParams) -> Result<Vec<SearchHit>> {
        let result = match (params.location(), params.text()) {
            (Some(location), query) => {
                let pipeline = Self::search_pipeline(location, query, params.max_distance);
                tracing::debug!("Running geo search pipeline with {} stages", pipeline.len());
                self.store.aggregate(&pipeline).await
            }
            (None, Some(query)) => {
                tracing::debug!("Running text search for '{}'", query);
                self.store
                    .find(&Filter::text(query))
                    .await
                    .map(|found| found.into_iter().map(SearchHit::from).collect())
            }
            (None, None) => {
                tracing::debug!("No search criteria, fetching all pharmacies");
                self.store
                    .find(&Filter::all())
                    .await
                    .map(|found| found.into_iter().map(SearchHit::from).collect())
            }
        };

        let hits = result.map_err(|e| LocatorError::storage("Failed to search pharmacies", e))?;
        tracing::info!("Search matched {} pharmacies", hits.len());
        Ok(hits)
    }

    /// Geo-near first, then the text match when a query is present.
    pub fn search_pipeline(
        location: GeoPoint,
        query: Option<&str>,
        max_distance: Option<f64>,
    ) -> Vec<Stage> {
        let mut pipeline = vec![Stage::GeoNear(GeoNear::new(location, max_distance))];
        if let Some(query) = query {
            pipeline.push(Stage::Match(Filter::text(query)));
        }
        pipeline
    }

    pub async fn get_pharmacies_on_guard(&self) -> Result<Vec<Pharmacy>> {
        self.store
            .find(&Filter::on_guard())
            .await
            .map_err(|e| LocatorError::storage("Failed to fetch pharmacies on guard", e))
    }

    /// `Ok(None)` when no pharmacy has this id.
    pub async fn get_pharmacy_details(&self, id: &PharmacyId) -> Result<Option<Pharmacy>> {
        self.store
            .find_by_id(id)
            .await
            .map_err(|e| LocatorError::storage("Failed to fetch pharmacy details", e))
    }

    pub async fn set_pharmacy_on_duty(&self, id: &PharmacyId) -> Result<Option<Pharmacy>> {
        self.set_on_duty(id, true).await
    }

    /// Writes the on-duty flag. Setting the current value again still saves
    /// and returns the record unchanged.
    pub async fn set_on_duty(&self, id: &PharmacyId, on_duty: bool) -> Result<Option<Pharmacy>> {
        const CONTEXT: &str = "Failed to update pharmacy duty status";

        let Some(mut pharmacy) = self
            .store
            .find_by_id(id)
            .await
            .map_err(|e| LocatorError::storage(CONTEXT, e))?
        else {
            tracing::warn!("Pharmacy {} not found, duty status unchanged", id);
            return Ok(None);
        };

        pharmacy.is_on_duty = on_duty;
        let saved = self
            .store
            .save(&pharmacy)
            .await
            .map_err(|e| LocatorError::storage(CONTEXT, e))?;

        tracing::info!("Pharmacy {} on duty: {}", id, saved.is_on_duty);
        Ok(Some(saved))
    }
}
