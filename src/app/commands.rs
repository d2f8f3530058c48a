use crate::config::Command;
use crate::core::engine::PharmacyEngine;
use crate::domain::model::{GeoPoint, PharmacyId, SearchParams};
use crate::domain::ports::{ConfigProvider, PharmacyStore};
use crate::utils::error::Result;
use serde_json::Value;

/// Runs one CLI command and returns its JSON output. Lookups by id yield
/// `null` when the pharmacy does not exist.
pub async fn execute<S, C>(engine: &PharmacyEngine<S>, command: &Command, config: &C) -> Result<Value>
where
    S: PharmacyStore,
    C: ConfigProvider,
{
    let output = match command {
        Command::Guard {
            latitude,
            longitude,
        } => {
            let lookup = engine
                .find_guard_pharmacies(GeoPoint::new(*latitude, *longitude))
                .await?;
            serde_json::to_value(lookup)?
        }
        Command::OnGuard => serde_json::to_value(engine.get_pharmacies_on_guard().await?)?,
        Command::Search {
            query,
            latitude,
            longitude,
            max_distance,
        } => {
            let params = SearchParams {
                query: query.clone(),
                latitude: *latitude,
                longitude: *longitude,
                max_distance: max_distance.or(config.default_max_distance()),
            };
            serde_json::to_value(engine.search_pharmacies(&params).await?)?
        }
        Command::Details { id } => {
            let id = PharmacyId::from(id.as_str());
            let found = engine.get_pharmacy_details(&id).await?;
            if found.is_none() {
                tracing::warn!("Pharmacy {} not found", id);
            }
            serde_json::to_value(found)?
        }
        Command::OnDuty { id } => {
            serde_json::to_value(engine.set_on_duty(&PharmacyId::from(id.as_str()), true).await?)?
        }
        Command::OffDuty { id } => {
            serde_json::to_value(engine.set_on_duty(&PharmacyId::from(id.as_str()), false).await?)?
        }
    };

    Ok(output)
}
