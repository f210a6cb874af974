//! Deterministic stand-ins for the backend's insight and prediction endpoints.

use async_trait::async_trait;
use evroutecore::model::{
    InsightRequest, InsightResponse, OptimizeRequest, PredictTimeRequest, PredictionResponse,
    VehicleType,
};
use evroutecore::prelude::{OptimizationError, PredictionContract};
use evroutecore::services::InsightService;
use evroutecore::session::PredictionRequest;
use serde_json::json;
use warp::{Filter, Rejection, Reply};

/// Average approach speed and charge duration per vehicle class.
fn vehicle_profile(vehicle: VehicleType) -> (f64, f64) {
    match vehicle {
        VehicleType::Car => (30.0, 45.0),
        VehicleType::Bike => (35.0, 25.0),
        VehicleType::Scooter => (25.0, 30.0),
        VehicleType::Bus => (20.0, 90.0),
        VehicleType::Truck => (22.0, 75.0),
    }
}

pub fn predict_time(request: &PredictTimeRequest) -> PredictionResponse {
    let (speed_kmh, charge_min) = vehicle_profile(request.vehicle_type);
    let travel_min = request.distance.max(0.0) / speed_kmh * 60.0;
    PredictionResponse {
        predicted_time_min: Some(((travel_min + charge_min) * 10.0).round() / 10.0),
        ..Default::default()
    }
}

pub fn optimize(request: &OptimizeRequest) -> PredictionResponse {
    let spread = request.name.bytes().map(u64::from).sum::<u64>();
    let eta_min = 5 + spread % 25;
    PredictionResponse {
        slot: Some(json!(format!("+{} min", eta_min + 10))),
        eta: Some(json!(format!("{} min", eta_min))),
        swaps_available: Some(json!(spread % 6)),
        ..Default::default()
    }
}

pub fn insight(request: &InsightRequest) -> InsightResponse {
    let text = match request.stations.first() {
        None => "No charging stations nearby.".to_string(),
        Some(nearest) => {
            let farthest = request
                .stations
                .iter()
                .map(|station| station.distance)
                .fold(0.0, f64::max);
            format!(
                "{} stations within {:.1} km. Nearest is {} at {:.2} km.",
                request.stations.len(),
                farthest,
                nearest.name,
                nearest.distance
            )
        }
    };
    InsightResponse { insight: text }
}

pub fn routes() -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let predict_route = warp::path("predict_time")
        .and(warp::post())
        .and(warp::body::json())
        .map(|request: PredictTimeRequest| warp::reply::json(&predict_time(&request)));

    let optimize_route = warp::path("optimize")
        .and(warp::post())
        .and(warp::body::json())
        .map(|request: OptimizeRequest| warp::reply::json(&optimize(&request)));

    let insight_route = warp::path("ai_insight")
        .and(warp::post())
        .and(warp::body::json())
        .map(|request: InsightRequest| warp::reply::json(&insight(&request)));

    predict_route.or(optimize_route).or(insight_route)
}

/// In-process insight service answering with the same stand-in logic.
pub struct LocalInsight;

#[async_trait]
impl InsightService for LocalInsight {
    async fn predict(
        &self,
        request: &PredictionRequest,
    ) -> Result<PredictionResponse, OptimizationError> {
        Ok(match request.contract {
            PredictionContract::PredictTime => predict_time(&PredictTimeRequest {
                vehicle_type: request.vehicle,
                distance: request.distance_km,
            }),
            PredictionContract::Optimize => optimize(&OptimizeRequest {
                name: request.station_name.clone(),
                lat: request.station.latitude,
                lon: request.station.longitude,
            }),
        })
    }

    async fn insight(&self, request: &InsightRequest) -> Result<String, OptimizationError> {
        Ok(insight(request).insight)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evroutecore::model::StationRecord;

    #[test]
    fn predicted_time_grows_with_distance() {
        let near = predict_time(&PredictTimeRequest {
            vehicle_type: VehicleType::Car,
            distance: 1.0,
        });
        let far = predict_time(&PredictTimeRequest {
            vehicle_type: VehicleType::Car,
            distance: 10.0,
        });
        assert_eq!(near.predicted_time_min, Some(47.0));
        assert!(far.predicted_time_min > near.predicted_time_min);
    }

    #[test]
    fn insight_names_the_first_station() {
        let response = insight(&InsightRequest {
            stations: vec![StationRecord {
                name: "Hub".into(),
                lat: 0.0,
                lon: 0.0,
                distance: 0.6,
                comment: None,
            }],
        });
        assert_eq!(
            response.insight,
            "1 stations within 0.6 km. Nearest is Hub at 0.60 km."
        );
    }

    #[tokio::test]
    async fn predict_time_endpoint_answers_json() {
        let reply = warp::test::request()
            .method("POST")
            .path("/predict_time")
            .json(&json!({"vehicle_type": "Car", "distance": 1.0}))
            .reply(&routes())
            .await;
        assert_eq!(reply.status(), 200);
        let body: PredictionResponse = serde_json::from_slice(reply.body()).unwrap();
        assert_eq!(body.predicted_time_min, Some(47.0));
    }

    #[tokio::test]
    async fn optimize_endpoint_returns_slot_shape() {
        let reply = warp::test::request()
            .method("POST")
            .path("/optimize")
            .json(&json!({"name": "Hub", "lat": 0.0, "lon": 0.0}))
            .reply(&routes())
            .await;
        let body: PredictionResponse = serde_json::from_slice(reply.body()).unwrap();
        assert!(body.slot.is_some());
        assert!(body.eta.is_some());
        assert!(body.predicted_time_min.is_none());
    }
}
