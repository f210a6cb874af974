use evroutecore::channel::{Frame, EV_STATIONS, LOCATION_UPDATE};
use evroutecore::model::{Coordinate, LocationUpdate, StationRecord, StationsPayload};
use log::{error, info};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Fixed station entry the stand-in backend serves from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogueStation {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub comment: Option<String>,
}

/// Answers every `location_update` with the nearest catalogue entries.
#[derive(Debug, Clone)]
pub struct StationFeed {
    catalogue: Vec<CatalogueStation>,
    radius_km: f64,
    max_results: usize,
}

impl StationFeed {
    pub fn new(catalogue: Vec<CatalogueStation>, radius_km: f64, max_results: usize) -> Self {
        Self {
            catalogue,
            radius_km,
            max_results,
        }
    }

    pub fn nearby(&self, update: LocationUpdate) -> StationsPayload {
        let user = Coordinate::new(update.lat, update.lon);
        let mut stations: Vec<StationRecord> = self
            .catalogue
            .iter()
            .map(|entry| StationRecord {
                name: entry.name.clone(),
                lat: entry.lat,
                lon: entry.lon,
                distance: user.distance_km(&Coordinate::new(entry.lat, entry.lon)),
                comment: entry.comment.clone(),
            })
            .filter(|record| record.distance <= self.radius_km)
            .collect();
        stations.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        stations.truncate(self.max_results);
        StationsPayload { stations }
    }

    fn answer(&self, frame: &Frame) -> StationsPayload {
        match frame.decode::<LocationUpdate>() {
            Ok(update) => {
                info!("Location received: ({}, {})", update.lat, update.lon);
                self.nearby(update)
            }
            Err(err) => {
                error!("bad location update: {}", err);
                StationsPayload::default()
            }
        }
    }

    /// Consumes client frames until the client side closes.
    pub async fn serve(
        self,
        mut from_client: mpsc::UnboundedReceiver<Frame>,
        to_client: mpsc::UnboundedSender<Frame>,
    ) {
        while let Some(frame) = from_client.recv().await {
            if frame.event != LOCATION_UPDATE {
                continue;
            }
            let payload = self.answer(&frame);
            let reply = match Frame::encode(EV_STATIONS, &payload) {
                Ok(reply) => reply,
                Err(err) => {
                    error!("{}", err);
                    continue;
                }
            };
            if to_client.send(reply).is_err() {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalogue() -> Vec<CatalogueStation> {
        [("Far", 0.03), ("Near", 0.01), ("Mid", 0.02), ("Outside", 1.0)]
            .into_iter()
            .map(|(name, lat)| CatalogueStation {
                name: name.into(),
                lat,
                lon: 0.0,
                comment: None,
            })
            .collect()
    }

    #[test]
    fn nearby_sorts_ascending_and_limits() {
        let feed = StationFeed::new(catalogue(), 5.0, 2);
        let payload = feed.nearby(LocationUpdate { lat: 0.0, lon: 0.0 });
        let names: Vec<&str> = payload.stations.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Near", "Mid"]);
        assert!(payload.stations[0].distance < payload.stations[1].distance);
    }

    #[tokio::test]
    async fn serve_replies_to_location_updates() {
        let feed = StationFeed::new(catalogue(), 5.0, 10);
        let (client_tx, from_client) = mpsc::unbounded_channel();
        let (to_client, mut client_rx) = mpsc::unbounded_channel();
        let server = tokio::spawn(feed.serve(from_client, to_client));

        client_tx
            .send(Frame::encode(LOCATION_UPDATE, &LocationUpdate { lat: 0.0, lon: 0.0 }).unwrap())
            .unwrap();
        let reply = client_rx.recv().await.unwrap();
        assert_eq!(reply.event, EV_STATIONS);
        let payload: StationsPayload = reply.decode().unwrap();
        assert_eq!(payload.stations.len(), 3);

        client_tx
            .send(Frame {
                event: LOCATION_UPDATE.into(),
                payload: serde_json::json!({"lat": "north"}),
            })
            .unwrap();
        let reply: StationsPayload = client_rx.recv().await.unwrap().decode().unwrap();
        assert!(reply.stations.is_empty());

        drop(client_tx);
        server.await.unwrap();
    }
}
