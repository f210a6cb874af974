use crate::model::Coordinate;

pub const EARTH_RADIUS_KM: f64 = 6371.0;

fn to_radians(degrees: f64) -> f64 {
    degrees * std::f64::consts::PI / 180.0
}

/// Great-circle distance between two coordinates in kilometres.
pub fn haversine_km(from: Coordinate, to: Coordinate) -> f64 {
    let lat1_rad = to_radians(from.latitude);
    let lat2_rad = to_radians(to.latitude);

    let dlat = to_radians(to.latitude - from.latitude);
    let dlon = to_radians(to.longitude - from.longitude);

    let a = (dlat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

pub fn haversine_m(from: Coordinate, to: Coordinate) -> f64 {
    haversine_km(from, to) * 1000.0
}

/// Converts a distance travelled over an interval into km/h.
///
/// Returns `None` when the interval is not positive.
pub fn speed_kmh(distance_m: f64, elapsed_s: f64) -> Option<f64> {
    if elapsed_s <= 0.0 || !elapsed_s.is_finite() {
        return None;
    }
    Some(distance_m / elapsed_s * 3.6)
}

/// Evenly spaced points on the straight segment between two coordinates.
pub fn interpolate(from: Coordinate, to: Coordinate, segments: usize) -> Vec<Coordinate> {
    let segments = segments.max(1);
    (0..=segments)
        .map(|step| {
            let t = step as f64 / segments as f64;
            Coordinate::new(
                from.latitude + (to.latitude - from.latitude) * t,
                from.longitude + (to.longitude - from.longitude) * t,
            )
        })
        .collect()
}
