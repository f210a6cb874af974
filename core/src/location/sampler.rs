use serde::{Deserialize, Serialize};

use crate::model::{RawFix, TimestampedFix};
use crate::prelude::{ClientConfig, LocationError};
use crate::runtime::EventSender;
use crate::telemetry::LogManager;

/// Options handed to the platform when sampling starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamplerOptions {
    pub high_accuracy: bool,
    pub maximum_age_ms: u64,
}

impl Default for SamplerOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            maximum_age_ms: 1000,
        }
    }
}

impl From<&ClientConfig> for SamplerOptions {
    fn from(config: &ClientConfig) -> Self {
        Self {
            high_accuracy: config.high_accuracy,
            maximum_age_ms: config.maximum_age_ms,
        }
    }
}

/// Platform capability that delivers continuous position fixes.
///
/// Implementations push `Event::Fix` / `Event::LocationFailed` into `sink` in
/// capture order. `watch` fails immediately when the platform has no location
/// support at all.
pub trait LocationCapability: Send {
    fn watch(&mut self, options: SamplerOptions, sink: EventSender) -> Result<(), LocationError>;
    fn clear_watch(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SampleOutcome {
    Accepted(TimestampedFix),
    /// Cached fix older than the freshness window.
    Stale { age_ms: u64 },
    /// Sampling stopped earlier this session.
    Halted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SamplerState {
    Sampling,
    Halted(LocationError),
}

/// Filters raw platform fixes and tracks the fatal-failure latch.
pub struct PositionSampler {
    options: SamplerOptions,
    state: SamplerState,
    logger: LogManager,
}

impl PositionSampler {
    pub fn new(options: SamplerOptions) -> Self {
        Self {
            options,
            state: SamplerState::Sampling,
            logger: LogManager::new("position_sampler"),
        }
    }

    pub fn accept(&mut self, raw: RawFix) -> SampleOutcome {
        if let SamplerState::Halted(_) = self.state {
            return SampleOutcome::Halted;
        }
        if raw.age_ms > self.options.maximum_age_ms {
            self.logger.trace(&format!(
                "dropping cached fix aged {} ms (limit {} ms)",
                raw.age_ms, self.options.maximum_age_ms
            ));
            return SampleOutcome::Stale { age_ms: raw.age_ms };
        }
        SampleOutcome::Accepted(TimestampedFix {
            coordinate: raw.coordinate,
            captured_at_ms: raw.captured_at_ms,
        })
    }

    /// Latches a fatal capability error. Returns the user notice only the first time.
    pub fn fail(&mut self, error: LocationError) -> Option<&'static str> {
        match self.state {
            SamplerState::Halted(_) => None,
            SamplerState::Sampling => {
                self.logger
                    .warn(&format!("position sampling halted: {}", error));
                self.state = SamplerState::Halted(error);
                Some(error.notice())
            }
        }
    }

    pub fn halted(&self) -> Option<LocationError> {
        match self.state {
            SamplerState::Halted(error) => Some(error),
            SamplerState::Sampling => None,
        }
    }
}
