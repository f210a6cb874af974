use crate::map::{MapSurface, MarkerHandle, MarkerKind};
use crate::model::{Coordinate, LocationUpdate};

/// Owns the single on-map user marker.
#[derive(Debug)]
pub struct UserMarkerState {
    marker: Option<MarkerHandle>,
    position: Option<Coordinate>,
    label: String,
    zoom: u8,
    follow: bool,
}

impl UserMarkerState {
    pub fn new(label: impl Into<String>, zoom: u8, follow: bool) -> Self {
        Self {
            marker: None,
            position: None,
            label: label.into(),
            zoom,
            follow,
        }
    }

    /// Creates the marker on first call, moves it afterwards. The returned
    /// update must be emitted on the connection channel.
    pub fn upsert<M: MapSurface>(&mut self, map: &mut M, coordinate: Coordinate) -> LocationUpdate {
        match self.marker {
            Some(marker) => {
                map.move_marker(marker, coordinate);
                if self.follow {
                    map.set_view(coordinate, self.zoom);
                }
            }
            None => {
                let marker = map.add_marker(coordinate, MarkerKind::User);
                map.bind_label(marker, &self.label);
                map.set_view(coordinate, self.zoom);
                self.marker = Some(marker);
            }
        }
        self.position = Some(coordinate);
        LocationUpdate::from(coordinate)
    }

    pub fn position(&self) -> Option<Coordinate> {
        self.position
    }

    pub fn handle(&self) -> Option<MarkerHandle> {
        self.marker
    }
}
