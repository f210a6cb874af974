//! Single-threaded event loop that owns the session.
//!
//! Events are handled strictly one at a time. Network work requested by an
//! effect runs as a spawned task and comes back as a new event; nothing is
//! cancelled when a newer request supersedes it.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::channel::{ConnectionChannel, Frame, Transport, EV_STATIONS};
use crate::location::LocationCapability;
use crate::map::MapSurface;
use crate::model::StationsPayload;
use crate::prelude::{ChannelError, ClientResult};
use crate::services::{InsightService, RoutingService};
use crate::session::{Effect, Event, Session};
use crate::telemetry::LogManager;

pub type EventSender = mpsc::UnboundedSender<Event>;

/// Network collaborators shared by every spawned request.
#[derive(Clone)]
pub struct Services {
    pub routing: Arc<dyn RoutingService>,
    pub insight: Arc<dyn InsightService>,
}

pub struct EventLoop<M: MapSurface> {
    session: Session<M>,
    channel: ConnectionChannel,
    services: Services,
    events_tx: EventSender,
    events_rx: mpsc::UnboundedReceiver<Event>,
    inbound_rx: Option<mpsc::UnboundedReceiver<Frame>>,
    capability: Option<Box<dyn LocationCapability>>,
    logger: LogManager,
}

impl<M: MapSurface> EventLoop<M> {
    /// Wires the session to its channel. `inbound` yields frames pushed by the backend.
    pub fn new<T: Transport + 'static>(
        session: Session<M>,
        transport: T,
        inbound: mpsc::UnboundedReceiver<Frame>,
        services: Services,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let mut channel = ConnectionChannel::new(transport);

        let stations_tx = events_tx.clone();
        channel.on(EV_STATIONS, move |frame| {
            let payload: StationsPayload = frame.decode()?;
            stations_tx
                .send(Event::Stations(payload))
                .map_err(|_| ChannelError::LoopStopped)
        });

        Self {
            session,
            channel,
            services,
            events_tx,
            events_rx,
            inbound_rx: Some(inbound),
            capability: None,
            logger: LogManager::new("event_loop"),
        }
    }

    /// Handle for feeding user gestures and platform callbacks into the loop.
    pub fn sender(&self) -> EventSender {
        self.events_tx.clone()
    }

    pub fn session(&self) -> &Session<M> {
        &self.session
    }

    /// Starts continuous sampling. A capability that cannot start is a fatal
    /// location error for the session.
    pub fn start_sampling(&mut self, mut capability: Box<dyn LocationCapability>) {
        let options = self.session.config().into();
        match capability.watch(options, self.events_tx.clone()) {
            Ok(()) => self.capability = Some(capability),
            Err(error) => {
                let _ = self.events_tx.send(Event::LocationFailed(error));
            }
        }
    }

    /// Runs until an `Event::Shutdown` is handled, calling `observe` after
    /// every event. Returns the session for inspection.
    pub async fn run<F>(mut self, mut observe: F) -> Session<M>
    where
        F: FnMut(&Session<M>),
    {
        loop {
            let event = match self.inbound_rx.as_mut() {
                Some(inbound) => tokio::select! {
                    biased;
                    event = self.events_rx.recv() => event,
                    frame = inbound.recv() => {
                        match frame {
                            Some(frame) => self.deliver(&frame),
                            None => {
                                self.logger.warn("backend channel closed");
                                self.inbound_rx = None;
                            }
                        }
                        continue;
                    }
                },
                None => self.events_rx.recv().await,
            };

            let Some(event) = event else { break };
            let shutdown = matches!(event, Event::Shutdown);
            let effects = self.session.handle(event);
            for effect in effects {
                if let Err(err) = self.dispatch(effect) {
                    self.logger.error(&format!("effect failed: {}", err));
                }
            }
            observe(&self.session);
            if shutdown {
                break;
            }
        }

        if let Some(mut capability) = self.capability.take() {
            capability.clear_watch();
        }
        self.session
    }

    fn deliver(&mut self, frame: &Frame) {
        match self.channel.deliver(frame) {
            Ok(true) => {}
            Ok(false) => self
                .logger
                .trace(&format!("no handler for inbound `{}`", frame.event)),
            Err(err) => self.logger.error(&format!("inbound frame rejected: {}", err)),
        }
    }

    fn dispatch(&mut self, effect: Effect) -> ClientResult<()> {
        match effect {
            Effect::Emit(message) => self.channel.send(&message)?,
            Effect::ComputeRoute(request) => {
                let routing = self.services.routing.clone();
                let tx = self.events_tx.clone();
                tokio::spawn(async move {
                    let result = routing.compute(request.from, request.to).await;
                    let _ = tx.send(Event::RouteResolved {
                        overlay: request.overlay,
                        result,
                    });
                });
            }
            Effect::Predict(request) => {
                let insight = self.services.insight.clone();
                let tx = self.events_tx.clone();
                tokio::spawn(async move {
                    let result = insight.predict(&request).await;
                    let _ = tx.send(Event::PredictionResolved { request, result });
                });
            }
            Effect::FetchInsight {
                generation,
                request,
            } => {
                let insight = self.services.insight.clone();
                let tx = self.events_tx.clone();
                tokio::spawn(async move {
                    let result = insight.insight(&request).await;
                    let _ = tx.send(Event::InsightResolved { generation, result });
                });
            }
            Effect::StopSampling => {
                if let Some(mut capability) = self.capability.take() {
                    capability.clear_watch();
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{in_process, LOCATION_UPDATE};
    use crate::location::SamplerOptions;
    use crate::map::{MarkerKind, MemoryMap};
    use crate::model::{Coordinate, InsightRequest, PredictionResponse, RawFix};
    use crate::prelude::{ClientConfig, LocationError, OptimizationError, RoutingError};
    use crate::services::StraightLineRouter;
    use crate::session::{PanelState, PredictionRequest, RouteStatus};
    use async_trait::async_trait;
    use serde_json::json;

    struct FixedInsight;

    #[async_trait]
    impl InsightService for FixedInsight {
        async fn predict(
            &self,
            request: &PredictionRequest,
        ) -> Result<PredictionResponse, OptimizationError> {
            if request.index == 0 {
                Err(OptimizationError::Network("refused".into()))
            } else {
                Ok(PredictionResponse {
                    predicted_time_min: Some(30.0),
                    ..Default::default()
                })
            }
        }

        async fn insight(&self, request: &InsightRequest) -> Result<String, OptimizationError> {
            Ok(format!("{} stations nearby", request.stations.len()))
        }
    }

    struct FailingRouter;

    #[async_trait]
    impl RoutingService for FailingRouter {
        async fn compute(
            &self,
            _from: Coordinate,
            _to: Coordinate,
        ) -> Result<Vec<Coordinate>, RoutingError> {
            Err(RoutingError::Service("down".into()))
        }
    }

    struct AbsentCapability;

    impl LocationCapability for AbsentCapability {
        fn watch(&mut self, _options: SamplerOptions, _sink: EventSender) -> Result<(), LocationError> {
            Err(LocationError::CapabilityAbsent)
        }

        fn clear_watch(&mut self) {}
    }

    fn services(routing: Arc<dyn RoutingService>) -> Services {
        Services {
            routing,
            insight: Arc::new(FixedInsight),
        }
    }

    fn stations_frame() -> Frame {
        Frame {
            event: EV_STATIONS.into(),
            payload: json!({"stations": [
                {"name": "A", "lat": 0.01, "lon": 0.0, "distance": 1.1, "comment": "ok"},
                {"name": "B", "lat": 0.02, "lon": 0.0, "distance": 2.2, "comment": "ok"}
            ]}),
        }
    }

    #[tokio::test]
    async fn fix_station_push_and_route_reconcile() {
        let session = Session::new(ClientConfig::default(), MemoryMap::new());
        let (transport, mut backend_rx) = in_process();
        let (backend_tx, inbound) = mpsc::unbounded_channel();
        let event_loop = EventLoop::new(
            session,
            transport,
            inbound,
            services(Arc::new(StraightLineRouter::default())),
        );
        let tx = event_loop.sender();

        tx.send(Event::Fix(RawFix::fresh(Coordinate::new(0.0, 0.0), 0)))
            .unwrap();
        backend_tx.send(stations_frame()).unwrap();

        let gestures = tx.clone();
        let mut optimized = false;
        let handle = tokio::spawn(event_loop.run(move |session| {
            // cards only exist once the station push has been handled
            if !optimized && !session.registry().stations().is_empty() {
                optimized = true;
                for (index, (name, lat)) in [("A", 0.01), ("B", 0.02)].into_iter().enumerate() {
                    let _ = gestures.send(Event::OptimizeStation {
                        name: name.into(),
                        lat,
                        lon: 0.0,
                        index,
                    });
                }
            }
            let settled = session
                .routes()
                .active()
                .map(|route| matches!(route.status, RouteStatus::Ready(_)))
                .unwrap_or(false)
                && session.insight().text().is_some()
                && session
                    .panels()
                    .panels()
                    .values()
                    .all(|panel| !matches!(panel, PanelState::Loading))
                && session.panels().panels().len() == 2;
            if settled {
                let _ = gestures.send(Event::Shutdown);
            }
        }));

        let session = handle.await.unwrap();

        let frame = backend_rx.recv().await.unwrap();
        assert_eq!(frame.event, LOCATION_UPDATE);
        assert_eq!(session.map().marker_count(MarkerKind::Station), 2);
        assert_eq!(session.map().overlay_count(), 1);
        assert_eq!(
            session.routes().active().unwrap().to,
            Coordinate::new(0.01, 0.0)
        );
        assert!(matches!(session.panels().panel(0), Some(PanelState::Failed(_))));
        assert!(matches!(session.panels().panel(1), Some(PanelState::Ready(_))));
        assert_eq!(session.insight().text(), Some("2 stations nearby"));
    }

    #[tokio::test]
    async fn routing_failure_does_not_stop_the_loop() {
        let session = Session::new(ClientConfig::default(), MemoryMap::new());
        let (transport, _backend_rx) = in_process();
        let (_backend_tx, inbound) = mpsc::unbounded_channel();
        let event_loop = EventLoop::new(session, transport, inbound, services(Arc::new(FailingRouter)));
        let tx = event_loop.sender();

        tx.send(Event::Fix(RawFix::fresh(Coordinate::new(0.0, 0.0), 0)))
            .unwrap();
        tx.send(Event::SelectStation { lat: 1.0, lon: 1.0 }).unwrap();

        let shutdown = tx.clone();
        let session = event_loop
            .run(move |session| {
                if session.metrics().routing_failures > 0 {
                    let _ = shutdown.send(Event::Shutdown);
                }
            })
            .await;

        assert!(matches!(
            session.routes().active().unwrap().status,
            RouteStatus::Failed(_)
        ));
    }

    #[tokio::test]
    async fn absent_capability_halts_sampling_with_notice() {
        let session = Session::new(ClientConfig::default(), MemoryMap::new());
        let (transport, _backend_rx) = in_process();
        let (_backend_tx, inbound) = mpsc::unbounded_channel();
        let mut event_loop = EventLoop::new(
            session,
            transport,
            inbound,
            services(Arc::new(StraightLineRouter::default())),
        );
        event_loop.start_sampling(Box::new(AbsentCapability));
        let tx = event_loop.sender();
        tx.send(Event::Shutdown).unwrap();

        let session = event_loop.run(|_| {}).await;
        assert_eq!(session.notices(), ["Geolocation not supported.".to_string()]);
        assert_eq!(session.sampling_halted(), Some(LocationError::CapabilityAbsent));
    }
}
