//! Error types for the club ladder core
//!
//! Every workflow and rating operation fails with a typed [`LadderError`]
//! before touching any state. Configuration loading and the maintenance
//! binary wrap these with anyhow for context.

use crate::types::{MatchKind, UserId};

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, LadderError>;

/// Broad failure category, used by callers to map errors onto responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Validation,
    NotFound,
    Authorization,
    TypeMismatch,
    Precondition,
    Configuration,
    Internal,
}

/// Custom error types for specific ladder scenarios
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LadderError {
    #[error("Invalid score: {reason}")]
    InvalidScore { reason: String },

    #[error("Invalid match submission: {reason}")]
    InvalidSubmission { reason: String },

    #[error("Club not found: {club_id}")]
    ClubNotFound { club_id: String },

    #[error("No pending match at index {index} (pending list holds {len})")]
    PendingMatchNotFound { index: usize, len: usize },

    #[error("User {user_id} is not a participant of this match")]
    ParticipantNotFound { user_id: UserId },

    #[error("Player not found: {player_id}")]
    PlayerNotFound { player_id: UserId },

    #[error("User {user_id} may not {action} in club {club_id}")]
    Unauthorized {
        user_id: UserId,
        club_id: String,
        action: String,
    },

    #[error("Pending match {index} is a {actual} match, expected {expected}")]
    MatchKindMismatch {
        index: usize,
        expected: MatchKind,
        actual: MatchKind,
    },

    #[error("Pending match {index} has not been confirmed by both sides")]
    ConfirmationIncomplete { index: usize },

    #[error("Pending match {index} was already {status}")]
    AlreadyResolved { index: usize, status: String },

    #[error("Participant {user_id} is no longer a member of club {club_id}")]
    ParticipantLeftClub { user_id: UserId, club_id: String },

    #[error("Club {club_id} already has the maximum of {max} admins")]
    AdminLimitReached { club_id: String, max: usize },

    #[error("User {user_id} already belongs to the maximum of {max} clubs")]
    ClubLimitReached { user_id: UserId, max: usize },

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("Internal error: {message}")]
    InternalError { message: String },
}

impl LadderError {
    /// Category of this failure
    pub fn category(&self) -> ErrorCategory {
        match self {
            LadderError::InvalidScore { .. } | LadderError::InvalidSubmission { .. } => {
                ErrorCategory::Validation
            }
            LadderError::ClubNotFound { .. }
            | LadderError::PendingMatchNotFound { .. }
            | LadderError::ParticipantNotFound { .. }
            | LadderError::PlayerNotFound { .. } => ErrorCategory::NotFound,
            LadderError::Unauthorized { .. } => ErrorCategory::Authorization,
            LadderError::MatchKindMismatch { .. } => ErrorCategory::TypeMismatch,
            LadderError::ConfirmationIncomplete { .. }
            | LadderError::AlreadyResolved { .. }
            | LadderError::ParticipantLeftClub { .. }
            | LadderError::AdminLimitReached { .. }
            | LadderError::ClubLimitReached { .. } => ErrorCategory::Precondition,
            LadderError::ConfigurationError { .. } => ErrorCategory::Configuration,
            LadderError::InternalError { .. } => ErrorCategory::Internal,
        }
    }
}
