use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::{Coordinate, StationRecord, VehicleType};

/// Body of the outbound `location_update` event.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct LocationUpdate {
    pub lat: f64,
    pub lon: f64,
}

impl From<Coordinate> for LocationUpdate {
    fn from(coordinate: Coordinate) -> Self {
        Self {
            lat: coordinate.latitude,
            lon: coordinate.longitude,
        }
    }
}

/// `POST /predict_time` request body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PredictTimeRequest {
    pub vehicle_type: VehicleType,
    /// Client-side haversine distance in km.
    pub distance: f64,
}

/// `POST /optimize` request body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OptimizeRequest {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

/// Union of both per-station response shapes; every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PredictionResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predicted_time_min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eta: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swaps_available: Option<Value>,
}

/// `POST /ai_insight` request body.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct InsightRequest {
    pub stations: Vec<StationRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InsightResponse {
    pub insight: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prediction_response_tolerates_either_shape() {
        let predict: PredictionResponse =
            serde_json::from_str(r#"{"predicted_time_min": 42.5}"#).unwrap();
        assert_eq!(predict.predicted_time_min, Some(42.5));
        assert!(predict.slot.is_none());

        let optimize: PredictionResponse =
            serde_json::from_str(r#"{"slot": "14:30", "eta": 12, "swaps_available": 3}"#)
                .unwrap();
        assert_eq!(optimize.slot, Some(Value::from("14:30")));
        assert_eq!(optimize.eta, Some(Value::from(12)));
        assert!(optimize.predicted_time_min.is_none());

        let empty: PredictionResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, PredictionResponse::default());
    }

    #[test]
    fn predict_request_uses_backend_field_names() {
        let body = serde_json::to_value(PredictTimeRequest {
            vehicle_type: VehicleType::Car,
            distance: 1.5,
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"vehicle_type": "Car", "distance": 1.5}));
    }
}
