use crate::map::{MapSurface, MarkerHandle, MarkerKind, StationCard};
use crate::model::{Coordinate, Station};

/// Owns the station markers of the latest delivered list.
#[derive(Debug, Default)]
pub struct StationRegistry {
    markers: Vec<MarkerHandle>,
    stations: Vec<Station>,
    generation: u64,
}

impl StationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Releases every held marker, then builds one carded marker per station
    /// in list order. Returns the nearest station's coordinate, which by
    /// convention is the first delivered entry.
    pub fn replace_all<M: MapSurface>(
        &mut self,
        map: &mut M,
        stations: Vec<Station>,
    ) -> Option<Coordinate> {
        for marker in self.markers.drain(..) {
            map.remove_marker(marker);
        }

        self.markers = stations
            .iter()
            .map(|station| {
                let marker = map.add_marker(station.coordinate, MarkerKind::Station);
                map.bind_card(marker, StationCard::for_station(station));
                marker
            })
            .collect();
        self.stations = stations;
        self.generation += 1;

        self.stations.first().map(|nearest| nearest.coordinate)
    }

    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    pub fn handles(&self) -> &[MarkerHandle] {
        &self.markers
    }

    /// Bumped on every replacement; lets late responses detect a rebuilt list.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}
