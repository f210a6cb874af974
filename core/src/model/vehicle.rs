use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Vehicle the user picked in the selector; read when an optimization is requested.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum VehicleType {
    #[default]
    Car,
    Bike,
    Scooter,
    Bus,
    Truck,
}

impl VehicleType {
    pub const ALL: [VehicleType; 5] = [
        VehicleType::Car,
        VehicleType::Bike,
        VehicleType::Scooter,
        VehicleType::Bus,
        VehicleType::Truck,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleType::Car => "Car",
            VehicleType::Bike => "Bike",
            VehicleType::Scooter => "Scooter",
            VehicleType::Bus => "Bus",
            VehicleType::Truck => "Truck",
        }
    }
}

impl fmt::Display for VehicleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VehicleType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        VehicleType::ALL
            .into_iter()
            .find(|vehicle| vehicle.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| format!("unknown vehicle type `{}`", value))
    }
}
