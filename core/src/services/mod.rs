//! Network collaborators the event loop calls on the session's behalf.

pub mod insight;
pub mod routing;

pub use insight::{HttpInsightClient, InsightService};
pub use routing::{OsrmRouter, RoutingService, StraightLineRouter};
