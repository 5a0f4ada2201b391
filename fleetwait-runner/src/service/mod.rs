//! Service layer
//!
//! Services provide the runtime capabilities the poll loop depends on:
//! reading the current time, sleeping between polls and checking that the
//! cluster management daemon is alive.
//!
//! All services are trait-based to enable testing and dependency injection.

mod clock;
mod heartbeat;
mod signal;

// Re-export traits
pub use clock::{Clock, Sleeper};
pub use heartbeat::HeartbeatService;

// Re-export implementations
pub use clock::{SystemClock, TokioSleeper};
pub use heartbeat::FileHeartbeatService;

pub use signal::shutdown_signal;
