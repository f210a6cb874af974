use crate::model::{InsightRequest, StationRecord};
use crate::prelude::OptimizationError;
use crate::telemetry::LogManager;

pub const INSIGHT_HEADING: &str = "AI Insights on Nearby EV Stations";

/// Page-level insight text, refreshed once per delivered station list.
pub struct InsightPanel {
    text: Option<String>,
    generation: u64,
    logger: LogManager,
}

impl InsightPanel {
    pub fn new() -> Self {
        Self {
            text: None,
            generation: 0,
            logger: LogManager::new("insight_panel"),
        }
    }

    /// Builds the request for a freshly delivered list. Empty lists are not sent.
    pub fn request(&mut self, generation: u64, stations: &[StationRecord]) -> Option<InsightRequest> {
        self.generation = generation;
        if stations.is_empty() {
            return None;
        }
        Some(InsightRequest {
            stations: stations.to_vec(),
        })
    }

    /// Failures only log; the previous text stays on the page.
    pub fn resolve(&mut self, generation: u64, result: Result<String, OptimizationError>) -> bool {
        if generation != self.generation {
            self.logger
                .trace("dropping insight for a replaced station list");
            return false;
        }
        match result {
            Ok(text) => {
                self.text = Some(text);
                true
            }
            Err(err) => {
                self.logger.error(&format!("Insight fetch failed: {}", err));
                false
            }
        }
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }
}

impl Default for InsightPanel {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> StationRecord {
        StationRecord {
            name: "A".into(),
            lat: 1.0,
            lon: 1.0,
            distance: 0.5,
            comment: None,
        }
    }

    #[test]
    fn failure_keeps_previous_text() {
        let mut panel = InsightPanel::new();
        panel.request(1, &[record()]).unwrap();
        assert!(panel.resolve(1, Ok("Plenty of chargers nearby".into())));

        panel.request(2, &[record()]).unwrap();
        assert!(!panel.resolve(2, Err(OptimizationError::Status(500))));
        assert_eq!(panel.text(), Some("Plenty of chargers nearby"));
    }

    #[test]
    fn late_insight_for_old_list_is_dropped() {
        let mut panel = InsightPanel::new();
        panel.request(1, &[record()]);
        panel.request(2, &[record()]);
        assert!(!panel.resolve(1, Ok("stale".into())));
        assert_eq!(panel.text(), None);
    }

    #[test]
    fn empty_list_sends_nothing() {
        let mut panel = InsightPanel::new();
        assert!(panel.request(1, &[]).is_none());
    }
}
