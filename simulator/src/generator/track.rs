use anyhow::Context;
use evroutecore::location::{LocationCapability, SamplerOptions};
use evroutecore::model::{Coordinate, RawFix};
use evroutecore::prelude::LocationError;
use evroutecore::{Event, EventSender};
use log::{debug, info};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::task::JoinHandle;

const METRES_PER_DEGREE: f64 = 111_195.0;

/// Synthetic drive used in place of a real GPS receiver.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackConfig {
    pub origin: Coordinate,
    pub heading_deg: f64,
    pub speed_kmh: f64,
    pub interval_ms: u64,
    pub fixes: usize,
    pub jitter_m: f64,
    pub seed: u64,
    /// Deliver a permission refusal instead of fixes.
    pub deny_permission: bool,
    /// Mark every n-th fix as an over-aged cached position.
    pub stale_every: Option<usize>,
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self {
            origin: Coordinate::new(12.9716, 77.5946),
            heading_deg: 45.0,
            speed_kmh: 36.0,
            interval_ms: 1000,
            fixes: 30,
            jitter_m: 2.0,
            seed: 0,
            deny_permission: false,
            stale_every: None,
        }
    }
}

pub fn build_track(config: &TrackConfig) -> anyhow::Result<Vec<RawFix>> {
    let step_m = config.speed_kmh / 3.6 * (config.interval_ms as f64 / 1000.0);
    let heading = config.heading_deg.to_radians();
    let interval = i64::try_from(config.interval_ms).context("track interval out of range")?;
    let mut rng = StdRng::seed_from_u64(config.seed);

    let mut position = config.origin;
    let mut fixes = Vec::with_capacity(config.fixes);
    for index in 0..config.fixes {
        let (jitter_north, jitter_east) = if config.jitter_m > 0.0 {
            (
                rng.gen_range(-config.jitter_m..config.jitter_m),
                rng.gen_range(-config.jitter_m..config.jitter_m),
            )
        } else {
            (0.0, 0.0)
        };
        let lat_scale = METRES_PER_DEGREE;
        let lon_scale = METRES_PER_DEGREE * position.latitude.to_radians().cos().max(1e-6);

        let sampled = Coordinate::new(
            position.latitude + jitter_north / lat_scale,
            position.longitude + jitter_east / lon_scale,
        );
        let stale = config
            .stale_every
            .map(|every| every > 0 && index > 0 && index % every == 0)
            .unwrap_or(false);
        fixes.push(RawFix {
            coordinate: sampled,
            captured_at_ms: index as i64 * interval,
            age_ms: if stale { 5_000 } else { 0 },
        });

        position = Coordinate::new(
            position.latitude + step_m * heading.cos() / lat_scale,
            position.longitude + step_m * heading.sin() / lon_scale,
        );
    }

    Ok(fixes)
}

/// Location capability that replays a prepared track into the event loop.
pub struct ReplayCapability {
    fixes: Vec<RawFix>,
    pace: Option<Duration>,
    deny_permission: bool,
    finish_after: Option<Duration>,
    task: Option<JoinHandle<()>>,
}

impl ReplayCapability {
    pub fn new(fixes: Vec<RawFix>, pace: Option<Duration>) -> Self {
        Self {
            fixes,
            pace,
            deny_permission: false,
            finish_after: None,
            task: None,
        }
    }

    pub fn denying(mut self, deny: bool) -> Self {
        self.deny_permission = deny;
        self
    }

    /// Ends the session this long after the last fix was delivered.
    pub fn finishing_after(mut self, grace: Duration) -> Self {
        self.finish_after = Some(grace);
        self
    }
}

impl LocationCapability for ReplayCapability {
    fn watch(&mut self, options: SamplerOptions, sink: EventSender) -> Result<(), LocationError> {
        info!(
            "replaying {} fixes (high accuracy {}, max age {} ms)",
            self.fixes.len(),
            options.high_accuracy,
            options.maximum_age_ms
        );
        let fixes = if self.deny_permission {
            Vec::new()
        } else {
            std::mem::take(&mut self.fixes)
        };
        let deny = self.deny_permission;
        let pace = self.pace;
        let finish_after = self.finish_after;

        self.task = Some(tokio::spawn(async move {
            if deny {
                let _ = sink.send(Event::LocationFailed(LocationError::PermissionDenied));
            }
            for fix in fixes {
                if sink.send(Event::Fix(fix)).is_err() {
                    debug!("event loop gone, stopping replay");
                    return;
                }
                match pace {
                    Some(pace) => tokio::time::sleep(pace).await,
                    None => tokio::task::yield_now().await,
                }
            }
            if let Some(grace) = finish_after {
                tokio::time::sleep(grace).await;
                let _ = sink.send(Event::Shutdown);
            }
        }));
        Ok(())
    }

    fn clear_watch(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evroutecore::math::geo;

    #[test]
    fn track_has_requested_fixes_and_timestamps() {
        let config = TrackConfig {
            fixes: 5,
            interval_ms: 2000,
            ..Default::default()
        };
        let fixes = build_track(&config).unwrap();
        assert_eq!(fixes.len(), 5);
        assert_eq!(fixes[4].captured_at_ms, 8000);
        assert!(fixes.iter().all(|fix| fix.age_ms == 0));
    }

    #[test]
    fn track_without_jitter_moves_at_configured_speed() {
        let config = TrackConfig {
            fixes: 2,
            interval_ms: 1000,
            speed_kmh: 36.0,
            jitter_m: 0.0,
            ..Default::default()
        };
        let fixes = build_track(&config).unwrap();
        let metres = geo::haversine_m(fixes[0].coordinate, fixes[1].coordinate);
        assert!((metres - 10.0).abs() < 0.05, "moved {metres} m");
    }

    #[test]
    fn stale_fixes_are_flagged() {
        let config = TrackConfig {
            fixes: 7,
            stale_every: Some(3),
            ..Default::default()
        };
        let fixes = build_track(&config).unwrap();
        let stale: Vec<usize> = fixes
            .iter()
            .enumerate()
            .filter(|(_, fix)| fix.age_ms > 1000)
            .map(|(index, _)| index)
            .collect();
        assert_eq!(stale, vec![3, 6]);
    }

    #[test]
    fn same_seed_replays_identically() {
        let config = TrackConfig {
            seed: 42,
            ..Default::default()
        };
        assert_eq!(build_track(&config).unwrap(), build_track(&config).unwrap());
    }
}
