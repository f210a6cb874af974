pub mod coordinate;
pub mod station;
pub mod vehicle;
pub mod wire;

pub use coordinate::{Coordinate, RawFix, TimestampedFix};
pub use station::{Station, StationRecord, StationsPayload};
pub use vehicle::VehicleType;
pub use wire::{
    InsightRequest, InsightResponse, LocationUpdate, OptimizeRequest, PredictTimeRequest,
    PredictionResponse,
};
