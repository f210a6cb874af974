use crate::map::{MapSurface, OverlayHandle, RouteOptions};
use crate::model::Coordinate;
use crate::prelude::RoutingError;
use crate::telemetry::LogManager;

#[derive(Debug, Clone, PartialEq)]
pub enum RouteStatus {
    Pending,
    Ready(Vec<Coordinate>),
    Failed(RoutingError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActiveRoute {
    pub from: Coordinate,
    pub to: Coordinate,
    pub overlay: OverlayHandle,
    pub status: RouteStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RouteState {
    Idle,
    Routed(ActiveRoute),
}

/// Work order for the routing service, tied to the overlay it will fill.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteRequest {
    pub overlay: OverlayHandle,
    pub from: Coordinate,
    pub to: Coordinate,
}

/// Owns at most one route overlay on the map.
pub struct RouteController {
    state: RouteState,
    options: RouteOptions,
    logger: LogManager,
}

impl RouteController {
    pub fn new(options: RouteOptions) -> Self {
        Self {
            state: RouteState::Idle,
            options,
            logger: LogManager::new("route_controller"),
        }
    }

    /// Tears down the current overlay, then places a fresh pending one.
    pub fn route<M: MapSurface>(&mut self, map: &mut M, from: Coordinate, to: Coordinate) -> RouteRequest {
        if let RouteState::Routed(previous) = &self.state {
            map.remove_route_overlay(previous.overlay);
        }

        let overlay = map.add_route_overlay(from, to, &self.options);
        self.state = RouteState::Routed(ActiveRoute {
            from,
            to,
            overlay,
            status: RouteStatus::Pending,
        });
        self.logger.trace(&format!(
            "routing ({:.5}, {:.5}) -> ({:.5}, {:.5})",
            from.latitude, from.longitude, to.latitude, to.longitude
        ));

        RouteRequest { overlay, from, to }
    }

    /// Applies a routing result. Results for an overlay that has since been
    /// replaced are dropped; returns whether the result was applied.
    pub fn resolve<M: MapSurface>(
        &mut self,
        map: &mut M,
        overlay: OverlayHandle,
        result: Result<Vec<Coordinate>, RoutingError>,
    ) -> bool {
        let RouteState::Routed(active) = &mut self.state else {
            return false;
        };
        if active.overlay != overlay {
            self.logger
                .trace(&format!("ignoring result for released overlay {}", overlay.raw()));
            return false;
        }

        match result {
            Ok(path) => {
                map.set_route_path(overlay, &path);
                active.status = RouteStatus::Ready(path);
            }
            Err(err) => {
                self.logger.error(&format!("Routing failed: {}", err));
                active.status = RouteStatus::Failed(err);
            }
        }
        true
    }

    pub fn state(&self) -> &RouteState {
        &self.state
    }

    pub fn active(&self) -> Option<&ActiveRoute> {
        match &self.state {
            RouteState::Routed(active) => Some(active),
            RouteState::Idle => None,
        }
    }
}
