//! Club Ladder - Match confirmation and rating core for amateur tennis clubs
//!
//! This crate provides the rating engine for singles and doubles play, the
//! pending-match workflow that carries a reported result through
//! confirmation and staff approval, and the membership checks that guard it.

pub mod config;
pub mod error;
pub mod metrics;
pub mod rating;
pub mod types;
pub mod utils;
pub mod workflow;

// Re-export commonly used types and traits
pub use error::{LadderError, Result};
pub use types::*;

// Re-export key components
pub use rating::{InMemoryPlayerRepository, PlayerRepository, RatingEngine};
pub use workflow::{InMemoryUserDirectory, MatchWorkflow, UserDirectory};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
