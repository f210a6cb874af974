use serde::{Deserialize, Serialize};

use crate::model::Coordinate;

pub const DEFAULT_COMMENT: &str = "No comment available";

/// Station entry exactly as the backend pushes it on `ev_stations`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StationRecord {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    /// Server-reported distance from the user in km.
    pub distance: f64,
    #[serde(default)]
    pub comment: Option<String>,
}

/// Body of an `ev_stations` push.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StationsPayload {
    #[serde(default)]
    pub stations: Vec<StationRecord>,
}

impl StationsPayload {
    /// Converts the wire list into stations, keeping delivery order as the ordinal index.
    pub fn to_stations(&self) -> Vec<Station> {
        self.stations
            .iter()
            .enumerate()
            .map(|(ordinal_index, record)| Station {
                name: record.name.clone(),
                coordinate: Coordinate::new(record.lat, record.lon),
                distance_km: record.distance,
                comment: record
                    .comment
                    .clone()
                    .unwrap_or_else(|| DEFAULT_COMMENT.to_string()),
                ordinal_index,
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub name: String,
    pub coordinate: Coordinate,
    pub distance_km: f64,
    pub comment: String,
    pub ordinal_index: usize,
}
