//! Repository layer
//!
//! Repositories wrap the external commands the waiter depends on. They
//! return raw data without any business logic.
//!
//! All repositories are trait-based to enable testing and mocking.

mod status;

// Re-export traits
pub use status::StatusFetcher;

// Re-export implementations
pub use status::SinfoFetcher;
