//! Membership guard
//!
//! Read-only authorization and membership predicates over club and user
//! records. Membership itself is managed elsewhere.

use crate::error::{LadderError, Result};
use crate::types::{Club, User};
use crate::workflow::notify::UserDirectory;
use tracing::warn;

/// Where a user stands with respect to a club
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipStatus {
    Member,
    Banned,
    PendingApproval,
    Rejected,
    Outsider,
}

pub fn membership_status(club: &Club, user_id: &str) -> MembershipStatus {
    if club.banned_ids.contains(user_id) {
        MembershipStatus::Banned
    } else if club.members.contains(user_id) {
        MembershipStatus::Member
    } else if club.pending_members.iter().any(|r| r.user_id == user_id) {
        MembershipStatus::PendingApproval
    } else if club.rejected_members.iter().any(|r| r.user_id == user_id) {
        MembershipStatus::Rejected
    } else {
        MembershipStatus::Outsider
    }
}

/// Leader, admin, or system admin
pub fn is_moderator(club: &Club, users: &dyn UserDirectory, user_id: &str) -> bool {
    club.is_staff(user_id) || users.is_system_admin(user_id)
}

pub fn ensure_moderator(
    club: &Club,
    users: &dyn UserDirectory,
    user_id: &str,
    action: &str,
) -> Result<()> {
    if is_moderator(club, users, user_id) {
        return Ok(());
    }
    warn!(
        "User {} attempted to {} in club {} without staff rights",
        user_id, action, club.id
    );
    Err(LadderError::Unauthorized {
        user_id: user_id.to_string(),
        club_id: club.id.clone(),
        action: action.to_string(),
    })
}

/// A participant named in a submission must be an active member
pub fn ensure_member(club: &Club, user_id: &str) -> Result<()> {
    match membership_status(club, user_id) {
        MembershipStatus::Member => Ok(()),
        _ => Err(LadderError::ParticipantNotFound {
            user_id: user_id.to_string(),
        }),
    }
}

/// A participant of a pending match must still be a member when it is approved
pub fn ensure_still_member(club: &Club, user_id: &str) -> Result<()> {
    match membership_status(club, user_id) {
        MembershipStatus::Member => Ok(()),
        _ => Err(LadderError::ParticipantLeftClub {
            user_id: user_id.to_string(),
            club_id: club.id.clone(),
        }),
    }
}

/// Per-user cap on the number of clubs joined
pub fn ensure_can_join(user: &User, max_clubs_per_user: usize) -> Result<()> {
    if user.club_ids.len() >= max_clubs_per_user {
        return Err(LadderError::ClubLimitReached {
            user_id: user.id.clone(),
            max: max_clubs_per_user,
        });
    }
    Ok(())
}
