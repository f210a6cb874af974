use crate::math::geo;
use crate::model::TimestampedFix;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpeedReading {
    NoData,
    KilometresPerHour(f64),
}

impl SpeedReading {
    pub fn render(&self) -> String {
        match self {
            SpeedReading::NoData => "Speed: no data".to_string(),
            SpeedReading::KilometresPerHour(kmh) => format!("Speed: {:.2} km/h", kmh),
        }
    }

    /// Value rounded to two decimals, as displayed.
    pub fn rounded(&self) -> Option<f64> {
        match self {
            SpeedReading::NoData => None,
            SpeedReading::KilometresPerHour(kmh) => Some((kmh * 100.0).round() / 100.0),
        }
    }
}

/// Keeps the single previous fix and derives speed from each new one.
#[derive(Debug)]
pub struct SpeedEstimator {
    previous: Option<TimestampedFix>,
    current: SpeedReading,
}

impl SpeedEstimator {
    pub fn new() -> Self {
        Self {
            previous: None,
            current: SpeedReading::NoData,
        }
    }

    /// Folds a fix into the estimate.
    ///
    /// Returns `None` when the fix does not advance the clock; such a sample
    /// leaves both the previous fix and the reading untouched.
    pub fn update(&mut self, fix: TimestampedFix) -> Option<SpeedReading> {
        let Some(previous) = self.previous else {
            self.previous = Some(fix);
            return Some(self.current);
        };

        let elapsed_s = (fix.captured_at_ms - previous.captured_at_ms) as f64 / 1000.0;
        let distance_m = geo::haversine_m(previous.coordinate, fix.coordinate);
        let kmh = geo::speed_kmh(distance_m, elapsed_s)?;

        self.previous = Some(fix);
        self.current = SpeedReading::KilometresPerHour(kmh);
        Some(self.current)
    }

    pub fn current(&self) -> SpeedReading {
        self.current
    }

    pub fn previous(&self) -> Option<TimestampedFix> {
        self.previous
    }
}

impl Default for SpeedEstimator {
    fn default() -> Self {
        Self::new()
    }
}
