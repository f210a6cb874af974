use crate::backend::endpoints;
use crate::gui_bridge::model::{OptimizeGesture, SelectGesture, VehicleGesture};
use evroutecore::{Event, EventSender, SessionSnapshot};
use log::{error, info};
use serde_json::json;
use std::{
    net::SocketAddr,
    sync::{Arc, RwLock},
    thread,
};
use tokio::runtime::Builder;
use warp::{http::StatusCode, Filter, Rejection, Reply};

type SharedSnapshot = Arc<RwLock<SessionSnapshot>>;

fn forward(events: &EventSender, event: Result<Event, String>) -> warp::reply::WithStatus<warp::reply::Json> {
    match event {
        Ok(event) => match events.send(event) {
            Ok(()) => warp::reply::with_status(
                warp::reply::json(&json!({"status": "ok"})),
                StatusCode::OK,
            ),
            Err(_) => warp::reply::with_status(
                warp::reply::json(&json!({"status": "error", "reason": "session stopped"})),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        },
        Err(reason) => warp::reply::with_status(
            warp::reply::json(&json!({"status": "error", "reason": reason})),
            StatusCode::BAD_REQUEST,
        ),
    }
}

/// Snapshot and gesture endpoints, plus the stand-in backend endpoints.
pub fn routes(
    state: SharedSnapshot,
    events: EventSender,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let state_filter = warp::any().map(move || state.clone());
    let events_filter = warp::any().map(move || events.clone());

    let snapshot_route = warp::path("snapshot")
        .and(warp::get())
        .and(state_filter)
        .map(|state: SharedSnapshot| match state.read() {
            Ok(guard) => warp::reply::json(&*guard),
            Err(poisoned) => warp::reply::json(&*poisoned.into_inner()),
        });

    let select_route = warp::path("select")
        .and(warp::post())
        .and(warp::body::json())
        .and(events_filter.clone())
        .map(|gesture: SelectGesture, events: EventSender| {
            forward(&events, Ok(gesture.into()))
        });

    let optimize_route = warp::path("optimize-station")
        .and(warp::post())
        .and(warp::body::json())
        .and(events_filter.clone())
        .map(|gesture: OptimizeGesture, events: EventSender| {
            forward(&events, Ok(gesture.into()))
        });

    let vehicle_route = warp::path("vehicle")
        .and(warp::post())
        .and(warp::body::json())
        .and(events_filter)
        .map(|gesture: VehicleGesture, events: EventSender| {
            forward(&events, Event::try_from(gesture))
        });

    snapshot_route
        .or(select_route)
        .or(optimize_route)
        .or(vehicle_route)
        .or(endpoints::routes())
}

/// Bridge that hosts the HTTP endpoints the visualizer talks to.
#[derive(Clone, Default)]
pub struct GuiBridge {
    state: SharedSnapshot,
}

impl GuiBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves the endpoints on a dedicated thread.
    pub fn serve(&self, events: EventSender, bind: SocketAddr) {
        let routes = routes(self.state.clone(), events);
        thread::spawn(move || {
            let runtime = match Builder::new_current_thread().enable_all().build() {
                Ok(runtime) => runtime,
                Err(err) => {
                    error!("failed to build bridge runtime: {}", err);
                    return;
                }
            };
            runtime.block_on(async move {
                info!("bridge listening on http://{}", bind);
                warp::serve(routes).run(bind).await;
            });
        });
    }

    pub fn publish(&self, snapshot: SessionSnapshot) {
        let mut guard = match self.state.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = snapshot;
    }

    pub fn publish_status(&self, message: &str) {
        info!("[GUI] {}", message);
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        match self.state.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}
