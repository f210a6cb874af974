use async_trait::async_trait;

use crate::model::{
    InsightRequest, InsightResponse, OptimizeRequest, PredictTimeRequest, PredictionResponse,
};
use crate::prelude::{OptimizationError, PredictionContract};
use crate::session::PredictionRequest;

/// Backend endpoints that annotate stations with prediction and insight text.
#[async_trait]
pub trait InsightService: Send + Sync {
    async fn predict(&self, request: &PredictionRequest) -> Result<PredictionResponse, OptimizationError>;
    async fn insight(&self, request: &InsightRequest) -> Result<String, OptimizationError>;
}

pub struct HttpInsightClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpInsightClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R, OptimizationError>
    where
        B: serde::Serialize + Sync,
        R: serde::de::DeserializeOwned,
    {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await
            .map_err(|e| OptimizationError::Network(e.to_string()))?;
        if !response.status().is_success() {
            return Err(OptimizationError::Status(response.status().as_u16()));
        }
        response
            .json::<R>()
            .await
            .map_err(|e| OptimizationError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl InsightService for HttpInsightClient {
    async fn predict(&self, request: &PredictionRequest) -> Result<PredictionResponse, OptimizationError> {
        match request.contract {
            PredictionContract::PredictTime => {
                let body = PredictTimeRequest {
                    vehicle_type: request.vehicle,
                    distance: request.distance_km,
                };
                self.post("/predict_time", &body).await
            }
            PredictionContract::Optimize => {
                let body = OptimizeRequest {
                    name: request.station_name.clone(),
                    lat: request.station.latitude,
                    lon: request.station.longitude,
                };
                self.post("/optimize", &body).await
            }
        }
    }

    async fn insight(&self, request: &InsightRequest) -> Result<String, OptimizationError> {
        let response: InsightResponse = self.post("/ai_insight", request).await?;
        Ok(response.insight)
    }
}
