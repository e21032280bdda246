//! Pending-match workflow
//!
//! Submission, confirmation, approval, veto, rejection and expiry of match
//! results, plus the membership checks and notifications they rely on.

pub mod guard;
pub mod machine;
pub mod notify;
pub mod pending;

pub use guard::{
    ensure_can_join, ensure_member, ensure_moderator, ensure_still_member, is_moderator,
    membership_status, MembershipStatus,
};
pub use machine::{
    awaiting_approval, pending_for_user, ApprovalOutcome, DoublesResult, MatchResult,
    MatchWorkflow, PendingRef, SinglesResult,
};
pub use notify::{InMemoryUserDirectory, Notice, UserDirectory};
pub use pending::{purge_reason, PendingState, PurgeReason};
