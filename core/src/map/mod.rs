//! Seam between the session and whatever draws the map.
//!
//! Every call is synchronous and non-failing; handles are opaque and owned by
//! the component that created them.

pub mod memory;

use serde::{Deserialize, Serialize};

use crate::model::{Coordinate, Station};
use crate::prelude::LineStyle;

pub use memory::MemoryMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MarkerHandle(u64);

impl MarkerHandle {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OverlayHandle(u64);

impl OverlayHandle {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarkerKind {
    User,
    Station,
}

/// Affordance rendered on a station card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CardAction {
    /// Re-enters the session as `select_station(lat, lon)`.
    RouteHere { lat: f64, lon: f64 },
    /// Re-enters the session as `optimize_station(name, lat, lon, index)`.
    Optimize {
        name: String,
        lat: f64,
        lon: f64,
        index: usize,
    },
}

/// Popup content bound to a station marker, addressed by ordinal index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationCard {
    pub index: usize,
    pub name: String,
    pub distance_label: String,
    pub comment: String,
    pub actions: Vec<CardAction>,
}

impl StationCard {
    pub fn for_station(station: &Station) -> Self {
        let lat = station.coordinate.latitude;
        let lon = station.coordinate.longitude;
        Self {
            index: station.ordinal_index,
            name: station.name.clone(),
            distance_label: format!("{:.2} km", station.distance_km),
            comment: station.comment.clone(),
            actions: vec![
                CardAction::RouteHere { lat, lon },
                CardAction::Optimize {
                    name: station.name.clone(),
                    lat,
                    lon,
                    index: station.ordinal_index,
                },
            ],
        }
    }
}

/// Interaction and styling flags for a route overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteOptions {
    pub route_while_dragging: bool,
    pub draggable_waypoints: bool,
    pub add_waypoints: bool,
    pub waypoint_markers: bool,
    pub style: LineStyle,
}

impl RouteOptions {
    /// Read-only overlay: no dragging, no added waypoints, no endpoint markers.
    pub fn locked(style: LineStyle) -> Self {
        Self {
            route_while_dragging: false,
            draggable_waypoints: false,
            add_waypoints: false,
            waypoint_markers: false,
            style,
        }
    }
}

pub trait MapSurface {
    fn add_marker(&mut self, at: Coordinate, kind: MarkerKind) -> MarkerHandle;
    fn move_marker(&mut self, marker: MarkerHandle, to: Coordinate);
    fn remove_marker(&mut self, marker: MarkerHandle);
    fn bind_label(&mut self, marker: MarkerHandle, label: &str);
    fn bind_card(&mut self, marker: MarkerHandle, card: StationCard);
    fn set_view(&mut self, center: Coordinate, zoom: u8);
    fn add_route_overlay(
        &mut self,
        from: Coordinate,
        to: Coordinate,
        options: &RouteOptions,
    ) -> OverlayHandle;
    fn set_route_path(&mut self, overlay: OverlayHandle, path: &[Coordinate]);
    fn remove_route_overlay(&mut self, overlay: OverlayHandle);
}
