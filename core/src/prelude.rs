use serde::{Deserialize, Serialize};

/// Which per-station endpoint a deployment answers optimization requests on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PredictionContract {
    /// `POST /predict_time` with `{vehicle_type, distance}`.
    #[default]
    PredictTime,
    /// `POST /optimize` with `{name, lat, lon}`.
    Optimize,
}

/// Visual style of the route overlay line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineStyle {
    pub color: String,
    pub opacity: f32,
    pub weight: f32,
}

impl Default for LineStyle {
    fn default() -> Self {
        Self {
            color: "#00aaff".into(),
            opacity: 0.8,
            weight: 5.0,
        }
    }
}

/// Shared configuration for a client session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub high_accuracy: bool,
    /// Oldest cached fix the platform may hand back.
    pub maximum_age_ms: u64,
    pub initial_zoom: u8,
    /// Recenter the view on every fix, not only when the user marker is created.
    pub follow_user: bool,
    pub user_label: String,
    pub backend_url: String,
    pub routing_url: String,
    pub contract: PredictionContract,
    pub route_style: LineStyle,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            maximum_age_ms: 1000,
            initial_zoom: 14,
            follow_user: true,
            user_label: "You are here".into(),
            backend_url: "http://127.0.0.1:9000".into(),
            routing_url: "https://router.project-osrm.org".into(),
            contract: PredictionContract::default(),
            route_style: LineStyle::default(),
        }
    }
}

/// Fatal failures of the platform location capability.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocationError {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("location capability not available")]
    CapabilityAbsent,
}

impl LocationError {
    /// Text shown to the user when sampling stops.
    pub fn notice(&self) -> &'static str {
        match self {
            LocationError::PermissionDenied => "GPS access denied.",
            LocationError::CapabilityAbsent => "Geolocation not supported.",
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum RoutingError {
    #[error("routing transport failure: {0}")]
    Transport(String),
    #[error("routing service rejected request: {0}")]
    Service(String),
    #[error("no route between waypoints")]
    NoRoute,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum OptimizationError {
    #[error("network failure: {0}")]
    Network(String),
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("response missing `{0}`")]
    MissingField(&'static str),
    #[error("user position unknown")]
    NoUserPosition,
}

#[derive(thiserror::Error, Debug)]
pub enum ChannelError {
    #[error("channel closed")]
    Closed,
    #[error("encoding `{event}` payload: {reason}")]
    Encode { event: String, reason: String },
    #[error("decoding `{event}` payload: {reason}")]
    Decode { event: String, reason: String },
    #[error("event loop stopped")]
    LoopStopped,
}

/// Common error type for the client core.
#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    #[error(transparent)]
    Location(#[from] LocationError),
    #[error(transparent)]
    Routing(#[from] RoutingError),
    #[error(transparent)]
    Optimization(#[from] OptimizationError),
    #[error(transparent)]
    Channel(#[from] ChannelError),
}

pub type ClientResult<T> = Result<T, ClientError>;
