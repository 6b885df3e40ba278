pub mod channel;
pub mod session;
pub mod source;
pub mod tracker;

pub use channel::LiveLocationChannel;
pub use session::TrackingSession;
pub use source::{PositionError, PositionSource};
pub use tracker::LocationTracker;
