//! Rating engine, starting-rating votes, standings and the player repository
//!
//! Ratings are only written by [`RatingEngine`], and only while a match is
//! approved or recorded.

pub mod engine;
pub mod standings;
pub mod storage;
pub mod votes;

// Re-export commonly used types
pub use engine::{expected_score, DoublesOutcome, RatingEngine, SinglesOutcome};
pub use standings::{standings, Standing};
pub use storage::{InMemoryPlayerRepository, PlayerRepository};
pub use votes::initial_rating_from_votes;
