use crate::backend::endpoints::LocalInsight;
use crate::backend::feed::StationFeed;
use crate::generator::track::{build_track, ReplayCapability};
use crate::gui_bridge::bridge::GuiBridge;
use crate::workflow::config::{RoutingMode, ScenarioConfig};
use evroutecore::channel::in_process;
use evroutecore::map::MemoryMap;
use evroutecore::model::Coordinate;
use evroutecore::services::{
    HttpInsightClient, InsightService, OsrmRouter, RoutingService, StraightLineRouter,
};
use evroutecore::{Event, EventLoop, Services, Session, SessionSnapshot};
use log::{info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunMode {
    /// Replays the whole track as fast as possible, then stops.
    Offline,
    /// Replays at the track's own pace until Ctrl+C.
    Serve,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub fixes_accepted: usize,
    pub station_updates: usize,
    pub reroutes: usize,
    pub final_speed: String,
    pub route_target: Option<Coordinate>,
    pub notices: Vec<String>,
}

#[derive(Clone)]
pub struct Runner {
    config: ScenarioConfig,
}

impl Runner {
    pub fn new(config: ScenarioConfig) -> Self {
        Self { config }
    }

    fn services(&self, mode: RunMode) -> Services {
        let routing: Arc<dyn RoutingService> = match self.config.routing {
            RoutingMode::Straight => Arc::new(StraightLineRouter::default()),
            RoutingMode::Osrm => Arc::new(OsrmRouter::new(self.config.client.routing_url.clone())),
        };
        let insight: Arc<dyn InsightService> = match mode {
            RunMode::Offline => Arc::new(LocalInsight),
            RunMode::Serve => Arc::new(HttpInsightClient::new(self.config.client.backend_url.clone())),
        };
        Services { routing, insight }
    }

    pub async fn execute(&self, mode: RunMode, bridge: Option<GuiBridge>) -> anyhow::Result<RunSummary> {
        let fixes = build_track(&self.config.track)?;
        info!("scenario ready: {} fixes, {} catalogue stations", fixes.len(), self.config.catalogue.len());

        let (transport, from_client) = in_process();
        let (to_client, inbound) = mpsc::unbounded_channel();
        let feed = StationFeed::new(
            self.config.catalogue.clone(),
            self.config.radius_km,
            self.config.max_results,
        );
        tokio::spawn(feed.serve(from_client, to_client));

        let session = Session::new(self.config.client.clone(), MemoryMap::new());
        let mut event_loop = EventLoop::new(session, transport, inbound, self.services(mode));
        let events = event_loop.sender();

        let capability = match mode {
            RunMode::Offline => ReplayCapability::new(fixes, None).finishing_after(Duration::from_millis(200)),
            RunMode::Serve => {
                let stop = events.clone();
                tokio::spawn(async move {
                    if tokio::signal::ctrl_c().await.is_err() {
                        warn!("cannot listen for Ctrl+C");
                        return;
                    }
                    let _ = stop.send(Event::Shutdown);
                });
                ReplayCapability::new(
                    fixes,
                    Some(Duration::from_millis(self.config.track.interval_ms)),
                )
            }
        };
        event_loop.start_sampling(Box::new(
            capability.denying(self.config.track.deny_permission),
        ));

        if let Some(bridge) = &bridge {
            if mode == RunMode::Serve {
                bridge.serve(events.clone(), self.config.bind);
                bridge.publish_status("HTTP bridge running (Ctrl+C to stop)...");
            }
        }

        let stop = events.clone();
        let session = event_loop
            .run(|session| {
                if let Some(bridge) = &bridge {
                    bridge.publish(SessionSnapshot::capture(session));
                }
                // a halted sampler never delivers the replay's closing shutdown
                if mode == RunMode::Offline && session.sampling_halted().is_some() {
                    let _ = stop.send(Event::Shutdown);
                }
            })
            .await;

        let metrics = session.metrics();
        Ok(RunSummary {
            fixes_accepted: metrics.fixes_accepted,
            station_updates: metrics.station_updates,
            reroutes: metrics.reroutes,
            final_speed: session.speed().render(),
            route_target: session.routes().active().map(|route| route.to),
            notices: session.notices().to_vec(),
        })
    }
}
