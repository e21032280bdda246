//! Pending-match states and expiry policy
//!
//! A pending entry's state is derived from its confirmation flags and status
//! marker; nothing else is stored. Expiry is a pure function of the entry and
//! today's date, so cleanup can be repeated freely.

use crate::config::workflow::WorkflowConfig;
use crate::types::{MatchRecord, Side};
use crate::utils::days_between;
use chrono::NaiveDate;

/// Lifecycle state of an entry in a club's pending list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingState {
    Unconfirmed,
    PartiallyConfirmed,
    /// Both sides confirmed, waiting for staff
    Confirmed,
    Rejected,
    Vetoed,
}

impl PendingState {
    pub fn of(record: &MatchRecord) -> Self {
        use crate::types::MatchStatus;

        let progress = record.progress();
        match progress.status {
            MatchStatus::Rejected => PendingState::Rejected,
            MatchStatus::Vetoed => PendingState::Vetoed,
            MatchStatus::Open => match (
                progress.is_confirmed(Side::A),
                progress.is_confirmed(Side::B),
            ) {
                (true, true) => PendingState::Confirmed,
                (false, false) => PendingState::Unconfirmed,
                _ => PendingState::PartiallyConfirmed,
            },
        }
    }
}

/// Why cleanup removed an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurgeReason {
    /// Rejected or vetoed and past the retention window
    Resolved,
    /// Never confirmed by both sides
    Unconfirmed,
    /// Confirmed but never approved
    Unapproved,
}

impl PurgeReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            PurgeReason::Resolved => "resolved",
            PurgeReason::Unconfirmed => "unconfirmed",
            PurgeReason::Unapproved => "unapproved",
        }
    }
}

/// Decide whether a pending entry has expired as of `today`
pub fn purge_reason(
    record: &MatchRecord,
    today: NaiveDate,
    config: &WorkflowConfig,
) -> Option<PurgeReason> {
    let progress = record.progress();
    let created_on = progress.created_at.date_naive();

    if progress.status.is_resolved() {
        let resolved_on = progress.status_date.unwrap_or(created_on);
        if days_between(resolved_on, today) >= config.resolved_retention_days {
            return Some(PurgeReason::Resolved);
        }
        return None;
    }

    if !progress.is_fully_confirmed() {
        if days_between(created_on, today) >= config.unconfirmed_expiry_days {
            return Some(PurgeReason::Unconfirmed);
        }
        return None;
    }

    let waiting_since = progress
        .confirmed_on
        .map_or(created_on, |confirmed_on| confirmed_on.max(created_on));
    if days_between(waiting_since, today) >= config.confirmed_expiry_days {
        return Some(PurgeReason::Unapproved);
    }
    None
}
