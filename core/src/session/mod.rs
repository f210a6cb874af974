//! Session state and the event transitions that drive it.
//!
//! A `Session` is created when the client starts and lives until it is torn
//! down. Every input, whether a platform fix, a channel push, a user gesture or
//! a finished network call, arrives as an [`Event`]; handling one mutates the
//! owned components and returns the [`Effect`]s the event loop must carry out.

pub mod insight;
pub mod panel;
pub mod registry;
pub mod route;
pub mod snapshot;
pub mod user_marker;

use crate::channel::OutboundMessage;
use crate::location::{PositionSampler, SampleOutcome, SamplerOptions, SpeedEstimator, SpeedReading};
use crate::map::{MapSurface, OverlayHandle, RouteOptions};
use crate::model::{
    Coordinate, InsightRequest, PredictionResponse, RawFix, StationsPayload, VehicleType,
};
use crate::prelude::{ClientConfig, LocationError, OptimizationError, RoutingError};
use crate::telemetry::{Counter, LogManager, Metrics, MetricsRecorder};

pub use insight::InsightPanel;
pub use panel::{OptimizationPanels, PanelReport, PanelState, PredictionRequest};
pub use registry::StationRegistry;
pub use route::{ActiveRoute, RouteController, RouteRequest, RouteState, RouteStatus};
pub use snapshot::SessionSnapshot;
pub use user_marker::UserMarkerState;

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Fix(RawFix),
    LocationFailed(LocationError),
    Stations(StationsPayload),
    SelectStation {
        lat: f64,
        lon: f64,
    },
    OptimizeStation {
        name: String,
        lat: f64,
        lon: f64,
        index: usize,
    },
    VehicleSelected(VehicleType),
    RouteResolved {
        overlay: OverlayHandle,
        result: Result<Vec<Coordinate>, RoutingError>,
    },
    PredictionResolved {
        request: PredictionRequest,
        result: Result<PredictionResponse, OptimizationError>,
    },
    InsightResolved {
        generation: u64,
        result: Result<String, OptimizationError>,
    },
    Shutdown,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Emit(OutboundMessage),
    ComputeRoute(RouteRequest),
    Predict(PredictionRequest),
    FetchInsight {
        generation: u64,
        request: InsightRequest,
    },
    StopSampling,
}

pub struct Session<M: MapSurface> {
    config: ClientConfig,
    map: M,
    sampler: PositionSampler,
    speed: SpeedEstimator,
    user: UserMarkerState,
    registry: StationRegistry,
    routes: RouteController,
    panels: OptimizationPanels,
    insight: InsightPanel,
    vehicle: VehicleType,
    notices: Vec<String>,
    metrics: MetricsRecorder,
    logger: LogManager,
}

impl<M: MapSurface> Session<M> {
    pub fn new(config: ClientConfig, map: M) -> Self {
        Self {
            sampler: PositionSampler::new(SamplerOptions::from(&config)),
            speed: SpeedEstimator::new(),
            user: UserMarkerState::new(
                config.user_label.clone(),
                config.initial_zoom,
                config.follow_user,
            ),
            registry: StationRegistry::new(),
            routes: RouteController::new(RouteOptions::locked(config.route_style.clone())),
            panels: OptimizationPanels::new(config.contract),
            insight: InsightPanel::new(),
            vehicle: VehicleType::default(),
            notices: Vec::new(),
            metrics: MetricsRecorder::new(),
            logger: LogManager::new("session"),
            config,
            map,
        }
    }

    pub fn handle(&mut self, event: Event) -> Vec<Effect> {
        match event {
            Event::Fix(raw) => self.on_fix(raw),
            Event::LocationFailed(error) => self.on_location_failed(error),
            Event::Stations(payload) => self.on_stations(payload),
            Event::SelectStation { lat, lon } => self.select_station(lat, lon),
            Event::OptimizeStation {
                name,
                lat,
                lon,
                index,
            } => self.optimize_station(&name, lat, lon, index),
            Event::VehicleSelected(vehicle) => {
                self.vehicle = vehicle;
                Vec::new()
            }
            Event::RouteResolved { overlay, result } => {
                if result.is_err() && self.routes.active().map(|a| a.overlay) == Some(overlay) {
                    self.metrics.record(Counter::RoutingFailure);
                }
                self.routes.resolve(&mut self.map, overlay, result);
                Vec::new()
            }
            Event::PredictionResolved { request, result } => {
                if self.panels.resolve(&request, result).is_err() {
                    self.metrics.record(Counter::OptimizationFailure);
                }
                Vec::new()
            }
            Event::InsightResolved { generation, result } => {
                self.insight.resolve(generation, result);
                Vec::new()
            }
            Event::Shutdown => Vec::new(),
        }
    }

    fn on_fix(&mut self, raw: RawFix) -> Vec<Effect> {
        let fix = match self.sampler.accept(raw) {
            SampleOutcome::Accepted(fix) => fix,
            SampleOutcome::Stale { .. } => {
                self.metrics.record(Counter::FixRejected);
                return Vec::new();
            }
            SampleOutcome::Halted => return Vec::new(),
        };
        self.metrics.record(Counter::FixAccepted);

        self.speed.update(fix);
        let update = self.user.upsert(&mut self.map, fix.coordinate);
        vec![Effect::Emit(OutboundMessage::LocationUpdate(update))]
    }

    fn on_location_failed(&mut self, error: LocationError) -> Vec<Effect> {
        match self.sampler.fail(error) {
            Some(notice) => {
                self.notices.push(notice.to_string());
                vec![Effect::StopSampling]
            }
            None => Vec::new(),
        }
    }

    fn on_stations(&mut self, payload: StationsPayload) -> Vec<Effect> {
        self.metrics.record(Counter::StationUpdate);
        let nearest = self
            .registry
            .replace_all(&mut self.map, payload.to_stations());
        let generation = self.registry.generation();
        self.logger.record(&format!(
            "station list {} holds {} markers",
            generation,
            self.registry.handles().len()
        ));

        let mut effects = Vec::new();
        if let (Some(nearest), Some(user)) = (nearest, self.user.position()) {
            effects.push(self.route(user, nearest));
        }
        if let Some(request) = self.insight.request(generation, &payload.stations) {
            effects.push(Effect::FetchInsight {
                generation,
                request,
            });
        }
        effects
    }

    /// "Route to here" on a station card. Ignored until the user marker exists.
    pub fn select_station(&mut self, lat: f64, lon: f64) -> Vec<Effect> {
        match self.user.position() {
            Some(user) => vec![self.route(user, Coordinate::new(lat, lon))],
            None => {
                self.logger
                    .trace("station selected before first fix, nothing to route from");
                Vec::new()
            }
        }
    }

    /// "Smart Optimize" on a station card.
    pub fn optimize_station(&mut self, name: &str, lat: f64, lon: f64, index: usize) -> Vec<Effect> {
        let Some(user) = self.user.position() else {
            self.panels
                .reject(index, &OptimizationError::NoUserPosition);
            return Vec::new();
        };
        let request = self
            .panels
            .request(index, name, Coordinate::new(lat, lon), user, self.vehicle);
        vec![Effect::Predict(request)]
    }

    fn route(&mut self, from: Coordinate, to: Coordinate) -> Effect {
        self.metrics.record(Counter::Reroute);
        Effect::ComputeRoute(self.routes.route(&mut self.map, from, to))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn map(&self) -> &M {
        &self.map
    }

    pub fn speed(&self) -> SpeedReading {
        self.speed.current()
    }

    pub fn user_position(&self) -> Option<Coordinate> {
        self.user.position()
    }

    pub fn user_marker(&self) -> &UserMarkerState {
        &self.user
    }

    pub fn registry(&self) -> &StationRegistry {
        &self.registry
    }

    pub fn routes(&self) -> &RouteController {
        &self.routes
    }

    pub fn panels(&self) -> &OptimizationPanels {
        &self.panels
    }

    pub fn insight(&self) -> &InsightPanel {
        &self.insight
    }

    pub fn vehicle(&self) -> VehicleType {
        self.vehicle
    }

    pub fn notices(&self) -> &[String] {
        &self.notices
    }

    pub fn sampling_halted(&self) -> Option<LocationError> {
        self.sampler.halted()
    }

    pub fn metrics(&self) -> Metrics {
        self.metrics.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::{MarkerKind, MemoryMap};
    use crate::model::{LocationUpdate, StationRecord};

    fn session() -> Session<MemoryMap> {
        Session::new(ClientConfig::default(), MemoryMap::new())
    }

    fn fix(lat: f64, lon: f64, at_ms: i64) -> Event {
        Event::Fix(RawFix::fresh(Coordinate::new(lat, lon), at_ms))
    }

    fn payload(entries: &[(&str, f64, f64)]) -> StationsPayload {
        StationsPayload {
            stations: entries
                .iter()
                .enumerate()
                .map(|(i, (name, lat, lon))| StationRecord {
                    name: name.to_string(),
                    lat: *lat,
                    lon: *lon,
                    distance: 0.5 + i as f64,
                    comment: Some("ok".into()),
                })
                .collect(),
        }
    }

    fn routes_of(effects: &[Effect]) -> Vec<RouteRequest> {
        effects
            .iter()
            .filter_map(|effect| match effect {
                Effect::ComputeRoute(request) => Some(*request),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn every_fix_emits_a_location_update() {
        let mut session = session();
        let effects = session.handle(fix(0.0, 0.0, 0));
        assert_eq!(
            effects,
            vec![Effect::Emit(OutboundMessage::LocationUpdate(LocationUpdate {
                lat: 0.0,
                lon: 0.0
            }))]
        );
        assert_eq!(session.speed(), SpeedReading::NoData);

        let effects = session.handle(fix(0.001, 0.0, 10_000));
        assert_eq!(effects.len(), 1);
        assert_eq!(session.speed().render(), "Speed: 40.03 km/h");
        assert_eq!(session.map().marker_count(MarkerKind::User), 1);
    }

    #[test]
    fn station_list_with_user_routes_to_first_entry_once() {
        let mut session = session();
        session.handle(fix(0.0, 0.0, 0));

        let effects = session.handle(Event::Stations(payload(&[("A", 1.0, 1.0)])));

        let routes = routes_of(&effects);
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].from, Coordinate::new(0.0, 0.0));
        assert_eq!(routes[0].to, Coordinate::new(1.0, 1.0));
        assert_eq!(session.registry().handles().len(), 1);
        assert!(matches!(session.routes().state(), RouteState::Routed(route) if route.to == Coordinate::new(1.0, 1.0)));
        assert!(effects
            .iter()
            .any(|effect| matches!(effect, Effect::FetchInsight { .. })));
    }

    #[test]
    fn nearest_is_delivery_order_not_distance() {
        let mut session = session();
        session.handle(fix(0.0, 0.0, 0));
        let effects = session.handle(Event::Stations(payload(&[
            ("Far", 5.0, 5.0),
            ("Near", 0.001, 0.001),
        ])));
        assert_eq!(routes_of(&effects)[0].to, Coordinate::new(5.0, 5.0));
    }

    #[test]
    fn station_list_before_first_fix_does_not_route() {
        let mut session = session();
        let effects = session.handle(Event::Stations(payload(&[("A", 1.0, 1.0)])));
        assert!(routes_of(&effects).is_empty());
        assert_eq!(session.routes().state(), &RouteState::Idle);
        assert_eq!(session.map().marker_count(MarkerKind::Station), 1);
    }

    #[test]
    fn selection_replaces_the_auto_route() {
        let mut session = session();
        session.handle(fix(0.0, 0.0, 0));
        session.handle(Event::Stations(payload(&[("A", 1.0, 1.0), ("B", 2.0, 2.0)])));
        let effects = session.handle(Event::SelectStation { lat: 2.0, lon: 2.0 });

        assert_eq!(routes_of(&effects).len(), 1);
        assert_eq!(session.map().overlay_count(), 1);
        assert_eq!(session.routes().active().unwrap().to, Coordinate::new(2.0, 2.0));
        assert_eq!(session.metrics().reroutes, 2);
    }

    #[test]
    fn denied_permission_notifies_once_and_stops_sampling() {
        let mut session = session();
        session.handle(fix(0.0, 0.0, 0));
        let effects = session.handle(Event::LocationFailed(LocationError::PermissionDenied));
        assert_eq!(effects, vec![Effect::StopSampling]);
        assert!(session
            .handle(Event::LocationFailed(LocationError::PermissionDenied))
            .is_empty());
        assert_eq!(session.notices(), ["GPS access denied.".to_string()]);

        // later fixes are ignored, the map keeps working
        assert!(session.handle(fix(1.0, 1.0, 1_000)).is_empty());
        assert_eq!(session.user_position(), Some(Coordinate::new(0.0, 0.0)));
        let effects = session.handle(Event::SelectStation { lat: 1.0, lon: 1.0 });
        assert_eq!(routes_of(&effects).len(), 1);
    }

    #[test]
    fn optimization_uses_current_vehicle_selection() {
        let mut session = session();
        session.handle(fix(0.0, 0.0, 0));
        session.handle(Event::VehicleSelected(VehicleType::Truck));
        let effects = session.handle(Event::OptimizeStation {
            name: "A".into(),
            lat: 0.01,
            lon: 0.0,
            index: 0,
        });
        let Some(Effect::Predict(request)) = effects.first() else {
            panic!("expected a prediction request, got {effects:?}");
        };
        assert_eq!(request.vehicle, VehicleType::Truck);
        assert_eq!(session.panels().panel(0), Some(&PanelState::Loading));
    }

    #[test]
    fn optimization_failure_leaves_other_panels_alone() {
        let mut session = session();
        session.handle(fix(0.0, 0.0, 0));
        session.handle(Event::Stations(payload(&[("X", 1.0, 1.0), ("Y", 2.0, 2.0)])));

        let take = |effects: Vec<Effect>| match effects.into_iter().next() {
            Some(Effect::Predict(request)) => request,
            other => panic!("unexpected {other:?}"),
        };
        let x = take(session.handle(Event::OptimizeStation {
            name: "X".into(),
            lat: 1.0,
            lon: 1.0,
            index: 0,
        }));
        let _y = take(session.handle(Event::OptimizeStation {
            name: "Y".into(),
            lat: 2.0,
            lon: 2.0,
            index: 1,
        }));

        session.handle(Event::PredictionResolved {
            request: x,
            result: Err(OptimizationError::Network("connection refused".into())),
        });

        assert!(matches!(session.panels().panel(0), Some(PanelState::Failed(_))));
        assert_eq!(session.panels().panel(1), Some(&PanelState::Loading));
        assert_eq!(session.metrics().optimization_failures, 1);
    }

    #[test]
    fn prediction_survives_a_repushed_station_list() {
        let mut session = session();
        let list = payload(&[("X", 1.0, 1.0), ("Y", 2.0, 2.0)]);
        session.handle(fix(0.0, 0.0, 0));
        session.handle(Event::Stations(list.clone()));
        let effects = session.handle(Event::OptimizeStation {
            name: "X".into(),
            lat: 1.0,
            lon: 1.0,
            index: 0,
        });
        let Some(Effect::Predict(request)) = effects.into_iter().next() else {
            panic!("expected a prediction request");
        };

        session.handle(fix(0.0, 0.0001, 1000));
        session.handle(Event::Stations(list));
        assert_eq!(session.panels().panel(0), Some(&PanelState::Loading));

        session.handle(Event::PredictionResolved {
            request,
            result: Ok(PredictionResponse {
                predicted_time_min: Some(30.0),
                ..Default::default()
            }),
        });
        let lines = session.panels().panel(0).unwrap().lines();
        assert!(lines.contains(&"Predicted charging time: 30 min".to_string()));
    }

    #[test]
    fn routing_failure_is_contained() {
        let mut session = session();
        session.handle(fix(0.0, 0.0, 0));
        let effects = session.handle(Event::SelectStation { lat: 1.0, lon: 1.0 });
        let request = routes_of(&effects)[0];
        session.handle(Event::RouteResolved {
            overlay: request.overlay,
            result: Err(RoutingError::Transport("timeout".into())),
        });

        assert!(matches!(
            session.routes().active().map(|route| &route.status),
            Some(RouteStatus::Failed(_))
        ));
        assert_eq!(session.metrics().routing_failures, 1);
        // the session keeps processing fixes
        assert_eq!(session.handle(fix(0.0, 0.001, 1_000)).len(), 1);
    }
}
