use serde::{Deserialize, Serialize};
use std::sync::Mutex;

pub struct MetricsRecorder {
    inner: Mutex<Metrics>,
}

/// Point-in-time copy of the session counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metrics {
    pub fixes_accepted: usize,
    pub fixes_rejected: usize,
    pub station_updates: usize,
    pub reroutes: usize,
    pub routing_failures: usize,
    pub optimization_failures: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
    FixAccepted,
    FixRejected,
    StationUpdate,
    Reroute,
    RoutingFailure,
    OptimizationFailure,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Metrics::default()),
        }
    }

    pub fn record(&self, counter: Counter) {
        if let Ok(mut metrics) = self.inner.lock() {
            let slot = match counter {
                Counter::FixAccepted => &mut metrics.fixes_accepted,
                Counter::FixRejected => &mut metrics.fixes_rejected,
                Counter::StationUpdate => &mut metrics.station_updates,
                Counter::Reroute => &mut metrics.reroutes,
                Counter::RoutingFailure => &mut metrics.routing_failures,
                Counter::OptimizationFailure => &mut metrics.optimization_failures,
            };
            *slot += 1;
        }
    }

    pub fn snapshot(&self) -> Metrics {
        if let Ok(metrics) = self.inner.lock() {
            *metrics
        } else {
            Metrics::default()
        }
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}
