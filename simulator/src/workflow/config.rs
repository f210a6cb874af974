use crate::backend::feed::CatalogueStation;
use crate::generator::track::TrackConfig;
use anyhow::Context;
use evroutecore::ClientConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::Path;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RoutingMode {
    /// Straight segment between the waypoints, no network.
    #[default]
    Straight,
    /// OSRM-compatible service at `client.routing_url`.
    Osrm,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    pub client: ClientConfig,
    pub track: TrackConfig,
    pub catalogue: Vec<CatalogueStation>,
    pub radius_km: f64,
    pub max_results: usize,
    pub routing: RoutingMode,
    pub bind: SocketAddr,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            client: ClientConfig::default(),
            track: TrackConfig::default(),
            catalogue: demo_catalogue(),
            radius_km: 5000.0,
            max_results: 10,
            routing: RoutingMode::default(),
            bind: SocketAddr::from(([127, 0, 0, 1], 9000)),
        }
    }
}

fn demo_catalogue() -> Vec<CatalogueStation> {
    [
        ("MG Road Fast Charge", 12.9756, 77.6066, Some("24x7, CCS2")),
        ("Cubbon Park EV Point", 12.9763, 77.5929, None),
        ("Indiranagar Supercharger", 12.9784, 77.6408, Some("Paid parking")),
        ("Koramangala Hub", 12.9352, 77.6245, Some("Battery swap available")),
        ("Malleshwaram Plug-in", 13.0035, 77.5710, None),
    ]
    .into_iter()
    .map(|(name, lat, lon, comment)| CatalogueStation {
        name: name.to_string(),
        lat,
        lon,
        comment: comment.map(str::to_string),
    })
    .collect()
}

impl ScenarioConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading scenario config {}", path_ref.display()))?;
        let config: ScenarioConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing scenario config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn from_args(fixes: usize, interval_ms: u64, seed: u64) -> Self {
        let defaults = Self::default();
        Self {
            track: TrackConfig {
                fixes,
                interval_ms,
                seed,
                ..defaults.track.clone()
            },
            ..defaults
        }
    }
}
