use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::math::geo;
use crate::model::{Coordinate, PredictionResponse, VehicleType};
use crate::prelude::{OptimizationError, PredictionContract};
use crate::telemetry::LogManager;

pub const LOADING_TEXT: &str = "Predicting charging time...";
pub const PREDICTION_FAILED_TEXT: &str = "Prediction failed.";
pub const SERVER_ERROR_TEXT: &str = "Server error.";
pub const NO_POSITION_TEXT: &str = "Waiting for your location.";

/// Everything the backend needs for one station, plus where to put the answer.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionRequest {
    pub index: usize,
    pub station_name: String,
    pub station: Coordinate,
    pub vehicle: VehicleType,
    pub distance_km: f64,
    pub contract: PredictionContract,
}

/// Rendered result of a successful optimization call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelReport {
    pub vehicle: VehicleType,
    pub distance_km: f64,
    pub predicted_time_min: Option<f64>,
    pub slot: Option<String>,
    pub eta: Option<String>,
    pub swaps_available: Option<String>,
}

impl PanelReport {
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("Vehicle: {}", self.vehicle),
            format!("Distance: {:.2} km", self.distance_km),
        ];
        if let Some(minutes) = self.predicted_time_min {
            lines.push(format!("Predicted charging time: {:.0} min", minutes));
        }
        if let Some(slot) = &self.slot {
            lines.push(format!("Slot: {}", slot));
        }
        if let Some(eta) = &self.eta {
            lines.push(format!("ETA: {}", eta));
        }
        if let Some(swaps) = &self.swaps_available {
            lines.push(format!("Swaps available: {}", swaps));
        }
        lines
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PanelState {
    Loading,
    Ready(PanelReport),
    Failed(String),
}

impl PanelState {
    pub fn lines(&self) -> Vec<String> {
        match self {
            PanelState::Loading => vec![LOADING_TEXT.to_string()],
            PanelState::Ready(report) => report.lines(),
            PanelState::Failed(message) => vec![message.clone()],
        }
    }
}

fn display_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

/// Per-station result areas keyed by card index. Panels never share state
/// with one another and outlive station list replacements.
pub struct OptimizationPanels {
    panels: HashMap<usize, PanelState>,
    contract: PredictionContract,
    logger: LogManager,
}

impl OptimizationPanels {
    pub fn new(contract: PredictionContract) -> Self {
        Self {
            panels: HashMap::new(),
            contract,
            logger: LogManager::new("optimization_panel"),
        }
    }

    /// Puts the panel into its loading state and builds the backend request.
    pub fn request(
        &mut self,
        index: usize,
        station_name: &str,
        station: Coordinate,
        user: Coordinate,
        vehicle: VehicleType,
    ) -> PredictionRequest {
        self.panels.insert(index, PanelState::Loading);
        PredictionRequest {
            index,
            station_name: station_name.to_string(),
            station,
            vehicle,
            distance_km: geo::haversine_km(user, station),
            contract: self.contract,
        }
    }

    /// Marks a panel as failed without issuing a request.
    pub fn reject(&mut self, index: usize, error: &OptimizationError) {
        let message = match error {
            OptimizationError::NoUserPosition => NO_POSITION_TEXT,
            _ => PREDICTION_FAILED_TEXT,
        };
        self.panels
            .insert(index, PanelState::Failed(message.to_string()));
    }

    /// Renders a response into its panel. Late responses still overwrite
    /// whatever the panel shows now.
    pub fn resolve(
        &mut self,
        request: &PredictionRequest,
        result: Result<PredictionResponse, OptimizationError>,
    ) -> Result<(), OptimizationError> {
        match result.and_then(|response| self.check(response)) {
            Ok(response) => {
                let report = PanelReport {
                    vehicle: request.vehicle,
                    distance_km: request.distance_km,
                    predicted_time_min: response.predicted_time_min,
                    slot: response.slot.as_ref().and_then(display_value),
                    eta: response.eta.as_ref().and_then(display_value),
                    swaps_available: response.swaps_available.as_ref().and_then(display_value),
                };
                self.panels.insert(request.index, PanelState::Ready(report));
                Ok(())
            }
            Err(err) => {
                let message = match err {
                    OptimizationError::MissingField(_) => PREDICTION_FAILED_TEXT,
                    _ => SERVER_ERROR_TEXT,
                };
                self.logger.error(&format!(
                    "Prediction Error for station {}: {}",
                    request.index, err
                ));
                self.panels
                    .insert(request.index, PanelState::Failed(message.to_string()));
                Err(err)
            }
        }
    }

    fn check(&self, response: PredictionResponse) -> Result<PredictionResponse, OptimizationError> {
        let present = match self.contract {
            PredictionContract::PredictTime => response.predicted_time_min.is_some(),
            PredictionContract::Optimize => response
                .slot
                .as_ref()
                .map(|slot| !slot.is_null())
                .unwrap_or(false),
        };
        if present {
            Ok(response)
        } else {
            Err(OptimizationError::MissingField(self.success_field()))
        }
    }

    pub fn success_field(&self) -> &'static str {
        match self.contract {
            PredictionContract::PredictTime => "predicted_time_min",
            PredictionContract::Optimize => "slot",
        }
    }

    pub fn panel(&self, index: usize) -> Option<&PanelState> {
        self.panels.get(&index)
    }

    pub fn panels(&self) -> &HashMap<usize, PanelState> {
        &self.panels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn panels() -> OptimizationPanels {
        OptimizationPanels::new(PredictionContract::PredictTime)
    }

    fn request(panels: &mut OptimizationPanels, index: usize) -> PredictionRequest {
        panels.request(
            index,
            "A",
            Coordinate::new(0.01, 0.0),
            Coordinate::new(0.0, 0.0),
            VehicleType::Car,
        )
    }

    #[test]
    fn request_sets_loading_and_computes_distance_locally() {
        let mut panels = panels();
        let request = request(&mut panels, 0);
        assert_eq!(panels.panel(0), Some(&PanelState::Loading));
        assert!((request.distance_km - 1.112).abs() < 0.001);
        assert_eq!(panels.panel(0).unwrap().lines(), vec![LOADING_TEXT]);
    }

    #[test]
    fn empty_response_renders_fixed_failure_text() {
        let mut panels = panels();
        let request = request(&mut panels, 0);
        let result = panels.resolve(&request, Ok(PredictionResponse::default()));
        assert_eq!(
            result,
            Err(OptimizationError::MissingField("predicted_time_min"))
        );
        assert_eq!(
            panels.panel(0),
            Some(&PanelState::Failed(PREDICTION_FAILED_TEXT.into()))
        );
    }

    #[test]
    fn network_failure_is_scoped_to_its_panel() {
        let mut panels = panels();
        let failing = request(&mut panels, 0);
        let pending = request(&mut panels, 1);

        let _ = panels.resolve(&failing, Err(OptimizationError::Network("reset".into())));

        assert_eq!(
            panels.panel(0),
            Some(&PanelState::Failed(SERVER_ERROR_TEXT.into()))
        );
        assert_eq!(panels.panel(1), Some(&PanelState::Loading));

        let response = PredictionResponse {
            predicted_time_min: Some(35.0),
            ..Default::default()
        };
        assert_eq!(panels.resolve(&pending, Ok(response)), Ok(()));
        assert!(matches!(panels.panel(1), Some(PanelState::Ready(_))));
    }

    #[test]
    fn report_renders_only_present_fields() {
        let mut panels = OptimizationPanels::new(PredictionContract::Optimize);
        let request = request(&mut panels, 2);
        let response: PredictionResponse =
            serde_json::from_str(r#"{"slot": "14:30", "swaps_available": 3}"#).unwrap();
        panels.resolve(&request, Ok(response)).unwrap();

        let lines = panels.panel(2).unwrap().lines();
        assert_eq!(lines[0], "Vehicle: Car");
        assert!(lines.contains(&"Slot: 14:30".to_string()));
        assert!(lines.contains(&"Swaps available: 3".to_string()));
        assert!(!lines.iter().any(|line| line.starts_with("ETA")));
        assert!(!lines.iter().any(|line| line.starts_with("Predicted")));
    }

    #[test]
    fn late_response_overwrites_a_newer_state() {
        let mut panels = panels();
        let first = request(&mut panels, 0);
        let second = request(&mut panels, 0);
        let _ = panels.resolve(&second, Err(OptimizationError::Status(502)));

        let response = PredictionResponse {
            predicted_time_min: Some(10.0),
            ..Default::default()
        };
        assert_eq!(panels.resolve(&first, Ok(response)), Ok(()));
        assert!(matches!(panels.panel(0), Some(PanelState::Ready(_))));
    }
}
