use crate::domain::model::GeoPoint;

/// Mean Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance in kilometers between two points given in decimal
/// degrees, using the Haversine formula.
///
/// Never fails: NaN inputs produce NaN, out-of-range degrees produce a
/// meaningless but finite distance.
pub fn calculate_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    // rounding can leave `a` just above 1 for near-antipodal points
    let a = ((d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2))
    .clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

pub fn distance_between(from: GeoPoint, to: GeoPoint) -> f64 {
    calculate_distance(from.latitude, from.longitude, to.latitude, to.longitude)
}
