//! Goal onboarding — guided first-use tutorials for the goal tracker.

pub mod config;
pub mod error;
pub mod onboarding;
pub mod store;
