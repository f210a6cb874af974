use serde::{Deserialize, Serialize};

use crate::map::{MarkerKind, MemoryMap, StationCard};
use crate::model::{Coordinate, VehicleType};
use crate::session::{RouteStatus, Session};
use crate::telemetry::Metrics;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StationSnapshot {
    pub position: Coordinate,
    pub card: StationCard,
    /// Rendered lines of the station's optimization panel, empty when untouched.
    #[serde(default)]
    pub panel: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RouteSnapshot {
    pub from: Coordinate,
    pub to: Coordinate,
    #[serde(default)]
    pub path: Vec<Coordinate>,
    pub status: String,
    pub color: String,
}

/// Serializable picture of what the user currently sees.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SessionSnapshot {
    #[serde(default)]
    pub user: Option<Coordinate>,
    #[serde(default)]
    pub user_label: Option<String>,
    #[serde(default)]
    pub view: Option<(Coordinate, u8)>,
    #[serde(default)]
    pub speed: String,
    #[serde(default)]
    pub stations: Vec<StationSnapshot>,
    #[serde(default)]
    pub route: Option<RouteSnapshot>,
    #[serde(default)]
    pub insight: Option<String>,
    #[serde(default)]
    pub vehicle: VehicleType,
    #[serde(default)]
    pub notices: Vec<String>,
    #[serde(default)]
    pub metrics: Metrics,
}

impl SessionSnapshot {
    pub fn capture(session: &Session<MemoryMap>) -> Self {
        let map = session.map();

        let user_label = session
            .user_marker()
            .handle()
            .and_then(|handle| map.marker(handle))
            .and_then(|entry| entry.label.clone());

        let mut stations: Vec<StationSnapshot> = map
            .markers()
            .filter(|(_, entry)| entry.kind == MarkerKind::Station)
            .filter_map(|(_, entry)| {
                entry.card.clone().map(|card| StationSnapshot {
                    position: entry.position,
                    panel: session
                        .panels()
                        .panel(card.index)
                        .map(|panel| panel.lines())
                        .unwrap_or_default(),
                    card,
                })
            })
            .collect();
        stations.sort_by_key(|station| station.card.index);

        let route = session.routes().active().map(|active| RouteSnapshot {
            from: active.from,
            to: active.to,
            path: map
                .overlay(active.overlay)
                .map(|overlay| overlay.path.clone())
                .unwrap_or_default(),
            status: match &active.status {
                RouteStatus::Pending => "pending".to_string(),
                RouteStatus::Ready(path) => format!("ready ({} points)", path.len()),
                RouteStatus::Failed(err) => format!("failed: {}", err),
            },
            color: session.config().route_style.color.clone(),
        });

        Self {
            user: session.user_position(),
            user_label,
            view: map.view(),
            speed: session.speed().render(),
            stations,
            route,
            insight: session.insight().text().map(str::to_string),
            vehicle: session.vehicle(),
            notices: session.notices().to_vec(),
            metrics: session.metrics(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{RawFix, StationRecord, StationsPayload};
    use crate::prelude::ClientConfig;
    use crate::session::Event;

    #[test]
    fn snapshot_reflects_markers_route_and_panels() {
        let mut session = Session::new(ClientConfig::default(), MemoryMap::new());
        session.handle(Event::Fix(RawFix::fresh(Coordinate::new(0.0, 0.0), 0)));
        session.handle(Event::Stations(StationsPayload {
            stations: vec![
                StationRecord {
                    name: "B".into(),
                    lat: 0.02,
                    lon: 0.0,
                    distance: 2.2,
                    comment: None,
                },
                StationRecord {
                    name: "A".into(),
                    lat: 0.01,
                    lon: 0.0,
                    distance: 1.1,
                    comment: Some("fast".into()),
                },
            ],
        }));
        session.handle(Event::OptimizeStation {
            name: "A".into(),
            lat: 0.01,
            lon: 0.0,
            index: 1,
        });

        let snapshot = SessionSnapshot::capture(&session);
        assert_eq!(snapshot.user, Some(Coordinate::new(0.0, 0.0)));
        assert_eq!(snapshot.user_label.as_deref(), Some("You are here"));
        assert_eq!(snapshot.speed, "Speed: no data");
        assert_eq!(snapshot.stations.len(), 2);
        assert_eq!(snapshot.stations[0].card.name, "B");
        assert!(snapshot.stations[0].panel.is_empty());
        assert_eq!(snapshot.stations[1].panel, vec!["Predicting charging time..."]);
        let route = snapshot.route.unwrap();
        assert_eq!(route.to, Coordinate::new(0.02, 0.0));
        assert_eq!(route.status, "pending");
    }

    #[test]
    fn snapshot_survives_json() {
        let json = serde_json::to_string(&SessionSnapshot::default()).unwrap();
        let back: SessionSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, SessionSnapshot::default());
    }
}
