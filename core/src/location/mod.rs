pub mod sampler;
pub mod speed;

pub use sampler::{LocationCapability, PositionSampler, SampleOutcome, SamplerOptions};
pub use speed::{SpeedEstimator, SpeedReading};
