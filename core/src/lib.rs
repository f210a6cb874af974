//! Client core for the EV charging route map.
//!
//! The session keeps the user's live position, the delivered station list and
//! the single active route in step with each other. Platform sampling, the
//! backend channel, map drawing and the routing/insight services sit behind
//! traits so the same loop drives a desktop front-end, a headless replay or a
//! test harness.

pub mod channel;
pub mod location;
pub mod map;
pub mod math;
pub mod model;
pub mod prelude;
pub mod runtime;
pub mod services;
pub mod session;
pub mod telemetry;

pub use prelude::{ClientConfig, ClientError, ClientResult};
pub use runtime::{EventLoop, EventSender, Services};
pub use session::{Effect, Event, Session, SessionSnapshot};
