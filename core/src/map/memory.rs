use std::collections::BTreeMap;

use log::debug;

use crate::map::{
    MapSurface, MarkerHandle, MarkerKind, OverlayHandle, RouteOptions, StationCard,
};
use crate::model::Coordinate;

#[derive(Debug, Clone, PartialEq)]
pub struct MarkerEntry {
    pub position: Coordinate,
    pub kind: MarkerKind,
    pub label: Option<String>,
    pub card: Option<StationCard>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OverlayEntry {
    pub from: Coordinate,
    pub to: Coordinate,
    pub options: RouteOptions,
    pub path: Vec<Coordinate>,
}

/// In-memory map surface. Holds exactly the objects currently on the map.
#[derive(Debug, Default)]
pub struct MemoryMap {
    next_id: u64,
    markers: BTreeMap<MarkerHandle, MarkerEntry>,
    overlays: BTreeMap<OverlayHandle, OverlayEntry>,
    view: Option<(Coordinate, u8)>,
    markers_created: usize,
    overlays_created: usize,
}

impl MemoryMap {
    pub fn new() -> Self {
        Self::default()
    }

    fn next(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn marker(&self, handle: MarkerHandle) -> Option<&MarkerEntry> {
        self.markers.get(&handle)
    }

    pub fn markers(&self) -> impl Iterator<Item = (&MarkerHandle, &MarkerEntry)> {
        self.markers.iter()
    }

    pub fn marker_count(&self, kind: MarkerKind) -> usize {
        self.markers.values().filter(|entry| entry.kind == kind).count()
    }

    pub fn overlay(&self, handle: OverlayHandle) -> Option<&OverlayEntry> {
        self.overlays.get(&handle)
    }

    pub fn overlay_count(&self) -> usize {
        self.overlays.len()
    }

    pub fn view(&self) -> Option<(Coordinate, u8)> {
        self.view
    }

    /// Total markers ever created, including released ones.
    pub fn markers_created(&self) -> usize {
        self.markers_created
    }

    pub fn overlays_created(&self) -> usize {
        self.overlays_created
    }
}

impl MapSurface for MemoryMap {
    fn add_marker(&mut self, at: Coordinate, kind: MarkerKind) -> MarkerHandle {
        let handle = MarkerHandle::new(self.next());
        self.markers.insert(
            handle,
            MarkerEntry {
                position: at,
                kind,
                label: None,
                card: None,
            },
        );
        self.markers_created += 1;
        handle
    }

    fn move_marker(&mut self, marker: MarkerHandle, to: Coordinate) {
        if let Some(entry) = self.markers.get_mut(&marker) {
            entry.position = to;
        } else {
            debug!("move of unknown marker {}", marker.raw());
        }
    }

    fn remove_marker(&mut self, marker: MarkerHandle) {
        self.markers.remove(&marker);
    }

    fn bind_label(&mut self, marker: MarkerHandle, label: &str) {
        if let Some(entry) = self.markers.get_mut(&marker) {
            entry.label = Some(label.to_string());
        }
    }

    fn bind_card(&mut self, marker: MarkerHandle, card: StationCard) {
        if let Some(entry) = self.markers.get_mut(&marker) {
            entry.card = Some(card);
        }
    }

    fn set_view(&mut self, center: Coordinate, zoom: u8) {
        self.view = Some((center, zoom));
    }

    fn add_route_overlay(
        &mut self,
        from: Coordinate,
        to: Coordinate,
        options: &RouteOptions,
    ) -> OverlayHandle {
        let handle = OverlayHandle::new(self.next());
        self.overlays.insert(
            handle,
            OverlayEntry {
                from,
                to,
                options: options.clone(),
                path: Vec::new(),
            },
        );
        self.overlays_created += 1;
        handle
    }

    fn set_route_path(&mut self, overlay: OverlayHandle, path: &[Coordinate]) {
        if let Some(entry) = self.overlays.get_mut(&overlay) {
            entry.path = path.to_vec();
        }
    }

    fn remove_route_overlay(&mut self, overlay: OverlayHandle) {
        self.overlays.remove(&overlay);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::LineStyle;

    #[test]
    fn handles_are_unique_across_object_kinds() {
        let mut map = MemoryMap::new();
        let origin = Coordinate::new(0.0, 0.0);
        let marker = map.add_marker(origin, MarkerKind::User);
        let overlay = map.add_route_overlay(origin, origin, &RouteOptions::locked(LineStyle::default()));
        assert_ne!(marker.raw(), overlay.raw());
    }

    #[test]
    fn removal_drops_the_object() {
        let mut map = MemoryMap::new();
        let marker = map.add_marker(Coordinate::new(1.0, 1.0), MarkerKind::Station);
        assert_eq!(map.marker_count(MarkerKind::Station), 1);
        map.remove_marker(marker);
        assert_eq!(map.marker_count(MarkerKind::Station), 0);
        assert_eq!(map.markers_created(), 1);
    }
}
