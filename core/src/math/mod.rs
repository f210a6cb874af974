pub mod geo;

pub use geo::{haversine_km, haversine_m, speed_kmh, EARTH_RADIUS_KM};
