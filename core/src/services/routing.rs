use async_trait::async_trait;
use serde::Deserialize;

use crate::math::geo;
use crate::model::Coordinate;
use crate::prelude::RoutingError;

#[async_trait]
pub trait RoutingService: Send + Sync {
    /// Computes the drivable path between two waypoints.
    async fn compute(&self, from: Coordinate, to: Coordinate) -> Result<Vec<Coordinate>, RoutingError>;
}

/// Client for an OSRM-compatible `/route/v1` endpoint.
pub struct OsrmRouter {
    client: reqwest::Client,
    base_url: String,
    profile: String,
}

impl OsrmRouter {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            profile: "driving".into(),
        }
    }

    fn route_url(&self, from: Coordinate, to: Coordinate) -> String {
        format!(
            "{}/route/v1/{}/{},{};{},{}?overview=full&geometries=geojson",
            self.base_url, self.profile, from.longitude, from.latitude, to.longitude, to.latitude
        )
    }
}

#[derive(Debug, Deserialize)]
struct OsrmResponse {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    geometry: OsrmGeometry,
}

#[derive(Debug, Deserialize)]
struct OsrmGeometry {
    coordinates: Vec<[f64; 2]>,
}

fn parse_osrm(body: OsrmResponse) -> Result<Vec<Coordinate>, RoutingError> {
    if body.code != "Ok" {
        return Err(RoutingError::Service(
            body.message.unwrap_or(body.code),
        ));
    }
    let route = body.routes.into_iter().next().ok_or(RoutingError::NoRoute)?;
    // OSRM orders GeoJSON positions as [lon, lat]
    Ok(route
        .geometry
        .coordinates
        .into_iter()
        .map(|[lon, lat]| Coordinate::new(lat, lon))
        .collect())
}

#[async_trait]
impl RoutingService for OsrmRouter {
    async fn compute(&self, from: Coordinate, to: Coordinate) -> Result<Vec<Coordinate>, RoutingError> {
        let response = self
            .client
            .get(self.route_url(from, to))
            .send()
            .await
            .map_err(|e| RoutingError::Transport(e.to_string()))?;
        let body = response
            .json::<OsrmResponse>()
            .await
            .map_err(|e| RoutingError::Transport(e.to_string()))?;
        parse_osrm(body)
    }
}

/// Offline router that joins the waypoints with a straight line.
pub struct StraightLineRouter {
    pub segments: usize,
}

impl Default for StraightLineRouter {
    fn default() -> Self {
        Self { segments: 8 }
    }
}

#[async_trait]
impl RoutingService for StraightLineRouter {
    async fn compute(&self, from: Coordinate, to: Coordinate) -> Result<Vec<Coordinate>, RoutingError> {
        Ok(geo::interpolate(from, to, self.segments))
    }
}
