use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PharmacyId(pub String);

impl PharmacyId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PharmacyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PharmacyId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for PharmacyId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub city: String,
}

/// A pharmacy record as persisted by the store. `isOnGard` is the stored
/// field name and must not be renamed without migrating existing data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pharmacy {
    #[serde(rename = "_id", alias = "id")]
    pub id: PharmacyId,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub is_on_gard: bool,
    #[serde(default)]
    pub is_on_duty: bool,
    #[serde(default)]
    pub address: Address,
    #[serde(default)]
    pub services: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Pharmacy {
    pub fn position(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

/// WGS84 decimal degrees. Range checks are left to whoever builds the point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// A pharmacy with its distance in kilometers from the lookup point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedResult {
    #[serde(flatten)]
    pub pharmacy: Pharmacy,
    pub distance: f64,
}

/// A search match. `distance` is in meters and only set by a geo-near stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    #[serde(flatten)]
    pub pharmacy: Pharmacy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
}

impl From<Pharmacy> for SearchHit {
    fn from(pharmacy: Pharmacy) -> Self {
        Self {
            pharmacy,
            distance: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GuardLookup {
    pub success: bool,
    pub data: Vec<RankedResult>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    pub query: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Meters.
    pub max_distance: Option<f64>,
}

impl SearchParams {
    /// Both coordinates are needed; a lone latitude or longitude is ignored.
    pub fn location(&self) -> Option<GeoPoint> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(GeoPoint::new(latitude, longitude)),
            _ => None,
        }
    }

    /// The query as given; whitespace-only counts as no query.
    pub fn text(&self) -> Option<&str> {
        self.query
            .as_deref()
            .filter(|query| !query.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pharmacy_uses_stored_field_names() {
        let json = serde_json::json!({
            "_id": "123",
            "name": "Test Pharmacy",
            "latitude": 34.0522,
            "longitude": -118.2437,
            "isOnGard": true,
            "isOnDuty": false,
            "address": {"street": "Test Street", "city": "Test City"},
            "services": ["Service 1"]
        });

        let pharmacy: Pharmacy = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(pharmacy.id.as_str(), "123");
        assert!(pharmacy.is_on_gard);
        assert!(!pharmacy.is_on_duty);

        assert_eq!(serde_json::to_value(&pharmacy).unwrap(), json);
    }

    #[test]
    fn test_ranked_result_flattens_pharmacy() {
        let pharmacy: Pharmacy = serde_json::from_value(serde_json::json!({
            "id": "p1",
            "name": "Central",
            "latitude": 1.0,
            "longitude": 2.0
        }))
        .unwrap();

        let value = serde_json::to_value(RankedResult {
            pharmacy,
            distance: 1.5,
        })
        .unwrap();
        assert_eq!(value["_id"], "p1");
        assert_eq!(value["distance"], 1.5);
    }

    #[test]
    fn test_search_params_location_requires_both_coordinates() {
        let params = SearchParams {
            latitude: Some(34.0),
            ..Default::default()
        };
        assert!(params.location().is_none());

        let params = SearchParams {
            latitude: Some(34.0),
            longitude: Some(-118.0),
            ..Default::default()
        };
        assert_eq!(params.location(), Some(GeoPoint::new(34.0, -118.0)));
    }

    #[test]
    fn test_blank_query_is_no_query() {
        let params = SearchParams {
            query: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(params.text().is_none());
    }

    #[test]
    fn test_query_is_not_trimmed() {
        let params = SearchParams {
            query: Some(" test".to_string()),
            ..Default::default()
        };
        assert_eq!(params.text(), Some(" test"));
    }
}
