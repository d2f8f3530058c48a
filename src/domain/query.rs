//! Query documents handed to a [`PharmacyStore`](crate::domain::ports::PharmacyStore).
//!
//! These serialize to the document-store shape (`{"isOnGard": true}`,
//! `{"$geoNear": {...}}`, `{"$match": {"$or": [...]}}`) so that a backend can
//! forward them verbatim, while in-process stores can evaluate them directly.

use crate::domain::model::{GeoPoint, Pharmacy};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Field written by the geo-near stage on each returned record.
pub const DISTANCE_FIELD: &str = "distance";

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Filter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_on_gard: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_on_duty: Option<bool>,
    #[serde(rename = "$or", skip_serializing_if = "Vec::is_empty")]
    pub any_of: Vec<FieldPattern>,
}

impl Filter {
    /// Matches every record.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn on_guard() -> Self {
        Self {
            is_on_gard: Some(true),
            ..Self::default()
        }
    }

    /// Case-insensitive substring match of `query` against name, street,
    /// city or any service tag.
    pub fn text(query: &str) -> Self {
        let pattern = Pattern::case_insensitive(&regex::escape(query));
        Self {
            any_of: TextField::ALL
                .iter()
                .map(|field| FieldPattern {
                    field: *field,
                    pattern: pattern.clone(),
                })
                .collect(),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.is_on_gard.is_none() && self.is_on_duty.is_none() && self.any_of.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    Name,
    Street,
    City,
    Services,
}

impl TextField {
    pub const ALL: [TextField; 4] = [
        TextField::Name,
        TextField::Street,
        TextField::City,
        TextField::Services,
    ];

    /// Dotted document path.
    pub fn path(&self) -> &'static str {
        match self {
            TextField::Name => "name",
            TextField::Street => "address.street",
            TextField::City => "address.city",
            TextField::Services => "services",
        }
    }

    /// Values a pattern is tested against. An array field matches when any
    /// element does.
    pub fn values<'a>(&self, pharmacy: &'a Pharmacy) -> Vec<&'a str> {
        match self {
            TextField::Name => vec![pharmacy.name.as_str()],
            TextField::Street => vec![pharmacy.address.street.as_str()],
            TextField::City => vec![pharmacy.address.city.as_str()],
            TextField::Services => pharmacy.services.iter().map(String::as_str).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pattern {
    #[serde(rename = "$regex")]
    pub regex: String,
    #[serde(rename = "$options")]
    pub options: String,
}

impl Pattern {
    pub fn case_insensitive(regex: &str) -> Self {
        Self {
            regex: regex.to_string(),
            options: "i".to_string(),
        }
    }

    pub fn ignores_case(&self) -> bool {
        self.options.contains('i')
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldPattern {
    pub field: TextField,
    pub pattern: Pattern,
}

impl Serialize for FieldPattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(self.field.path(), &self.pattern)?;
        map.end()
    }
}

/// GeoJSON point. Coordinates are `[longitude, latitude]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoJsonPoint {
    #[serde(rename = "type")]
    pub kind: String,
    pub coordinates: [f64; 2],
}

impl GeoJsonPoint {
    pub fn longitude(&self) -> f64 {
        self.coordinates[0]
    }

    pub fn latitude(&self) -> f64 {
        self.coordinates[1]
    }

    pub fn to_geo_point(&self) -> GeoPoint {
        GeoPoint::new(self.latitude(), self.longitude())
    }
}

impl From<GeoPoint> for GeoJsonPoint {
    fn from(point: GeoPoint) -> Self {
        Self {
            kind: "Point".to_string(),
            coordinates: [point.longitude, point.latitude],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoNear {
    pub near: GeoJsonPoint,
    pub distance_field: String,
    /// Meters. Unbounded when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_distance: Option<f64>,
    pub spherical: bool,
}

impl GeoNear {
    pub fn new(point: GeoPoint, max_distance: Option<f64>) -> Self {
        Self {
            near: point.into(),
            distance_field: DISTANCE_FIELD.to_string(),
            max_distance,
            spherical: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Stage {
    #[serde(rename = "$geoNear")]
    GeoNear(GeoNear),
    #[serde(rename = "$match")]
    Match(Filter),
}
