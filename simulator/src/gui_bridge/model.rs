use evroutecore::model::VehicleType;
use evroutecore::Event;
use serde::{Deserialize, Serialize};

/// Body of `POST /select`, the "Route to here" card action.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SelectGesture {
    pub lat: f64,
    pub lon: f64,
}

/// Body of `POST /optimize-station`, the "Smart Optimize" card action.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OptimizeGesture {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub index: usize,
}

/// Body of `POST /vehicle`, the vehicle selector.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VehicleGesture {
    pub vehicle: String,
}

impl From<SelectGesture> for Event {
    fn from(gesture: SelectGesture) -> Self {
        Event::SelectStation {
            lat: gesture.lat,
            lon: gesture.lon,
        }
    }
}

impl From<OptimizeGesture> for Event {
    fn from(gesture: OptimizeGesture) -> Self {
        Event::OptimizeStation {
            name: gesture.name,
            lat: gesture.lat,
            lon: gesture.lon,
            index: gesture.index,
        }
    }
}

impl TryFrom<VehicleGesture> for Event {
    type Error = String;

    fn try_from(gesture: VehicleGesture) -> Result<Self, Self::Error> {
        gesture
            .vehicle
            .parse::<VehicleType>()
            .map(Event::VehicleSelected)
    }
}
