use crate::core::geo::distance_between;
use crate::domain::model::{Pharmacy, PharmacyId, SearchHit};
use crate::domain::ports::PharmacyStore;
use crate::domain::query::{Filter, GeoNear, Stage, TextField};
use crate::utils::error::{StoreError, StoreResult};
use async_trait::async_trait;
use chrono::Utc;
use regex::{Regex, RegexBuilder};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Insertion-ordered pharmacy store that evaluates filters and pipelines in
/// process.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    records: Arc<RwLock<Vec<Pharmacy>>>,
}

impl InMemoryStore {
    pub fn new(records: Vec<Pharmacy>) -> Self {
        Self {
            records: Arc::new(RwLock::new(records)),
        }
    }

    pub async fn snapshot(&self) -> Vec<Pharmacy> {
        self.records.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Swaps in a full record set, e.g. once it has been persisted elsewhere.
    pub(crate) async fn replace_all(&self, records: Vec<Pharmacy>) {
        *self.records.write().await = records;
    }
}

/// Inserts `stored` or replaces the record with the same id.
pub(crate) fn upsert(records: &mut Vec<Pharmacy>, stored: Pharmacy) {
    match records.iter_mut().find(|existing| existing.id == stored.id) {
        Some(existing) => *existing = stored,
        None => records.push(stored),
    }
}

/// A [`Filter`] with its patterns compiled once per request.
struct CompiledFilter {
    is_on_gard: Option<bool>,
    is_on_duty: Option<bool>,
    any_of: Vec<(TextField, Regex)>,
}

impl CompiledFilter {
    fn compile(filter: &Filter) -> StoreResult<Self> {
        let any_of = filter
            .any_of
            .iter()
            .map(|predicate| {
                RegexBuilder::new(&predicate.pattern.regex)
                    .case_insensitive(predicate.pattern.ignores_case())
                    .build()
                    .map(|regex| (predicate.field, regex))
                    .map_err(|e| StoreError::InvalidPattern {
                        pattern: predicate.pattern.regex.clone(),
                        reason: e.to_string(),
                    })
            })
            .collect::<StoreResult<Vec<_>>>()?;

        Ok(Self {
            is_on_gard: filter.is_on_gard,
            is_on_duty: filter.is_on_duty,
            any_of,
        })
    }

    fn matches(&self, pharmacy: &Pharmacy) -> bool {
        if self.is_on_gard.is_some_and(|expected| pharmacy.is_on_gard != expected) {
            return false;
        }
        if self.is_on_duty.is_some_and(|expected| pharmacy.is_on_duty != expected) {
            return false;
        }

        self.any_of.is_empty()
            || self.any_of.iter().any(|(field, regex)| {
                field
                    .values(pharmacy)
                    .into_iter()
                    .any(|value| regex.is_match(value))
            })
    }
}

/// Keeps hits within `max_distance` meters of the point, annotates their
/// distance and orders them nearest first.
fn apply_geo_near(stage: &GeoNear, hits: Vec<SearchHit>) -> Vec<SearchHit> {
    let center = stage.near.to_geo_point();

    let mut within: Vec<SearchHit> = hits
        .into_iter()
        .filter_map(|mut hit| {
            let meters = distance_between(center, hit.pharmacy.position()) * 1000.0;
            if stage.max_distance.is_some_and(|max| meters > max) {
                return None;
            }
            hit.distance = Some(meters);
            Some(hit)
        })
        .collect();

    within.sort_by(|a, b| {
        a.distance
            .unwrap_or(f64::INFINITY)
            .total_cmp(&b.distance.unwrap_or(f64::INFINITY))
    });
    within
}

#[async_trait]
impl PharmacyStore for InMemoryStore {
    async fn find(&self, filter: &Filter) -> StoreResult<Vec<Pharmacy>> {
        let compiled = CompiledFilter::compile(filter)?;
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|pharmacy| compiled.matches(pharmacy))
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: &PharmacyId) -> StoreResult<Option<Pharmacy>> {
        let records = self.records.read().await;
        Ok(records.iter().find(|pharmacy| &pharmacy.id == id).cloned())
    }

    async fn aggregate(&self, pipeline: &[Stage]) -> StoreResult<Vec<SearchHit>> {
        let mut hits: Vec<SearchHit> = self
            .records
            .read()
            .await
            .iter()
            .cloned()
            .map(SearchHit::from)
            .collect();

        for stage in pipeline {
            hits = match stage {
                Stage::GeoNear(geo_near) => apply_geo_near(geo_near, hits),
                Stage::Match(filter) => {
                    let compiled = CompiledFilter::compile(filter)?;
                    hits.into_iter()
                        .filter(|hit| compiled.matches(&hit.pharmacy))
                        .collect()
                }
            };
        }

        tracing::debug!("Aggregation produced {} hits", hits.len());
        Ok(hits)
    }

    async fn save(&self, pharmacy: &Pharmacy) -> StoreResult<Pharmacy> {
        let mut stored = pharmacy.clone();
        stored.updated_at = Some(Utc::now());

        let mut records = self.records.write().await;
        upsert(&mut records, stored.clone());
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Address, GeoPoint};
    use crate::domain::query::{FieldPattern, Pattern};

    fn pharmacy(id: &str, name: &str, lat: f64, lon: f64, on_guard: bool) -> Pharmacy {
        Pharmacy {
            id: PharmacyId::from(id),
            name: name.to_string(),
            latitude: lat,
            longitude: lon,
            is_on_gard: on_guard,
            is_on_duty: false,
            address: Address {
                street: "Rue Principale".to_string(),
                city: "Casablanca".to_string(),
            },
            services: vec!["Vaccination".to_string()],
            updated_at: None,
        }
    }

    fn fixture() -> InMemoryStore {
        InMemoryStore::new(vec![
            pharmacy("far", "Pharmacie Atlas", 33.6000, -7.6000, true),
            pharmacy("near", "Pharmacie Centrale", 33.5731, -7.5898, false),
            pharmacy("mid", "Night Care", 33.5800, -7.5900, true),
        ])
    }

    fn ids(hits: &[SearchHit]) -> Vec<&str> {
        hits.iter().map(|hit| hit.pharmacy.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_find_by_flag_keeps_insertion_order() {
        let store = fixture();
        let found = store.find(&Filter::on_guard()).await.unwrap();
        let ids: Vec<&str> = found.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["far", "mid"]);
    }

    #[tokio::test]
    async fn test_find_all() {
        assert_eq!(fixture().find(&Filter::all()).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_text_filter_is_case_insensitive_across_fields() {
        let store = fixture();

        let by_name = store.find(&Filter::text("centrale")).await.unwrap();
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].id.as_str(), "near");

        let by_city = store.find(&Filter::text("CASA")).await.unwrap();
        assert_eq!(by_city.len(), 3);

        let by_service = store.find(&Filter::text("vaccin")).await.unwrap();
        assert_eq!(by_service.len(), 3);

        let none = store.find(&Filter::text("dentist")).await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_pattern_is_a_store_error() {
        let filter = Filter {
            any_of: vec![FieldPattern {
                field: TextField::Name,
                pattern: Pattern::case_insensitive("(unclosed"),
            }],
            ..Filter::default()
        };

        let err = fixture().find(&filter).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidPattern { .. }));
    }

    #[tokio::test]
    async fn test_geo_near_sorts_caps_and_annotates() {
        let store = fixture();
        let origin = GeoPoint::new(33.5731, -7.5898);

        let hits = store
            .aggregate(&[Stage::GeoNear(GeoNear::new(origin, Some(2000.0)))])
            .await
            .unwrap();

        assert_eq!(ids(&hits), vec!["near", "mid"]);
        assert_eq!(hits[0].distance, Some(0.0));
        let mid = hits[1].distance.unwrap();
        assert!(mid > 0.0 && mid < 2000.0);
    }

    #[tokio::test]
    async fn test_geo_near_then_match() {
        let store = fixture();
        let origin = GeoPoint::new(33.5731, -7.5898);

        let hits = store
            .aggregate(&[
                Stage::GeoNear(GeoNear::new(origin, None)),
                Stage::Match(Filter::text("pharmacie")),
            ])
            .await
            .unwrap();

        assert_eq!(ids(&hits), vec!["near", "far"]);
        assert!(hits.iter().all(|hit| hit.distance.is_some()));
    }

    #[tokio::test]
    async fn test_save_replaces_and_stamps() {
        let store = fixture();
        let mut record = store
            .find_by_id(&PharmacyId::from("near"))
            .await
            .unwrap()
            .unwrap();
        record.is_on_duty = true;

        let saved = store.save(&record).await.unwrap();
        assert!(saved.updated_at.is_some());
        assert_eq!(store.len().await, 3);

        let reloaded = store
            .find_by_id(&PharmacyId::from("near"))
            .await
            .unwrap()
            .unwrap();
        assert!(reloaded.is_on_duty);
    }

    #[tokio::test]
    async fn test_save_inserts_unknown_id() {
        let store = InMemoryStore::default();
        assert!(store.is_empty().await);

        store
            .save(&pharmacy("new", "New", 0.0, 0.0, false))
            .await
            .unwrap();
        assert_eq!(store.len().await, 1);
    }
}
