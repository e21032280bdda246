//! Pending-match state machine
//!
//! Carries a submitted result through confirmation, staff approval, veto,
//! rejection and expiry. Every operation works on a copy of the club's
//! pending list and only writes it back once all checks have passed, so a
//! failed call leaves the club, the players and the users untouched.
//!
//! Callers persist the club, players and users touched by one call inside
//! one transaction. Removing an entry from the pending list during
//! [`MatchWorkflow::approve`] is what guarantees a match is rated once.

use crate::config::app::AppConfig;
use crate::config::workflow::{MembershipConfig, WorkflowConfig};
use crate::error::{LadderError, Result};
use crate::metrics::WorkflowMetrics;
use crate::rating::engine::RatingEngine;
use crate::rating::storage::PlayerRepository;
use crate::types::{
    Club, DoublesMatch, MatchFormat, MatchId, MatchKind, MatchProgress, MatchRecord, MatchStatus,
    RatingChange, SinglesMatch, User, UserId,
};
use crate::utils::{generate_match_id, Clock};
use crate::workflow::guard::{
    ensure_can_join, ensure_member, ensure_moderator, ensure_still_member,
};
use crate::workflow::notify::{deliver, notice_text, Notice, UserDirectory};
use crate::workflow::pending::{purge_reason, PurgeReason};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// A singles result as reported
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SinglesResult {
    pub player_a: UserId,
    pub player_b: UserId,
    pub score_a: i64,
    pub score_b: i64,
    pub date: NaiveDate,
    #[serde(default)]
    pub format: MatchFormat,
    #[serde(default)]
    pub location: Option<String>,
}

/// A doubles result as reported
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoublesResult {
    pub team_a: [UserId; 2],
    pub team_b: [UserId; 2],
    pub score_a: i64,
    pub score_b: i64,
    pub date: NaiveDate,
    #[serde(default)]
    pub format: MatchFormat,
    #[serde(default)]
    pub location: Option<String>,
}

/// Either kind of reported result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchResult {
    Singles(SinglesResult),
    Doubles(DoublesResult),
}

impl MatchResult {
    pub fn kind(&self) -> MatchKind {
        match self {
            MatchResult::Singles(_) => MatchKind::Singles,
            MatchResult::Doubles(_) => MatchKind::Doubles,
        }
    }
}

impl From<SinglesResult> for MatchResult {
    fn from(result: SinglesResult) -> Self {
        MatchResult::Singles(result)
    }
}

impl From<DoublesResult> for MatchResult {
    fn from(result: DoublesResult) -> Self {
        MatchResult::Doubles(result)
    }
}

/// Position of a freshly submitted entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingRef {
    pub index: usize,
    pub match_id: MatchId,
}

/// What an approval or direct record did to ratings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalOutcome {
    pub match_id: MatchId,
    pub kind: MatchKind,
    pub rating_changes: Vec<RatingChange>,
}

/// The pending-match workflow
#[derive(Clone)]
pub struct MatchWorkflow {
    engine: RatingEngine,
    config: WorkflowConfig,
    membership: MembershipConfig,
    clock: Arc<dyn Clock>,
    metrics: Arc<WorkflowMetrics>,
}

impl MatchWorkflow {
    /// Create a workflow with its own metrics registry
    pub fn new(config: &AppConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let metrics = WorkflowMetrics::new().map_err(|e| LadderError::InternalError {
            message: format!("Failed to create workflow metrics: {}", e),
        })?;
        Self::with_metrics(config, clock, Arc::new(metrics))
    }

    /// Create a workflow reporting into the given metrics
    pub fn with_metrics(
        config: &AppConfig,
        clock: Arc<dyn Clock>,
        metrics: Arc<WorkflowMetrics>,
    ) -> Result<Self> {
        Ok(Self {
            engine: RatingEngine::new(config.rating.clone())?,
            config: config.workflow.clone(),
            membership: config.membership.clone(),
            clock,
            metrics,
        })
    }

    pub fn engine(&self) -> &RatingEngine {
        &self.engine
    }

    pub fn metrics(&self) -> Arc<WorkflowMetrics> {
        self.metrics.clone()
    }

    /// Grant admin rights to a member, within the configured admin cap.
    ///
    /// Only staff or a system admin may promote. Promoting an existing admin
    /// is a no-op.
    pub fn promote_admin(
        &self,
        club: &mut Club,
        users: &dyn UserDirectory,
        actor_id: &str,
        user_id: &str,
    ) -> Result<()> {
        ensure_moderator(club, users, actor_id, "promote admins")?;
        club.promote_admin(user_id, self.membership.max_admins)?;
        info!(
            "User {} promoted {} to admin of club {}",
            actor_id, user_id, club.id
        );
        Ok(())
    }

    /// Check a user may join one more club under the configured cap
    pub fn check_can_join(&self, user: &User) -> Result<()> {
        ensure_can_join(user, self.membership.max_clubs_per_user)
    }

    /// Submit a result into the club's pending list.
    ///
    /// The initiator must play in the match; their side starts confirmed.
    /// Doubles submissions notify staff straight away, singles only once
    /// both sides have confirmed.
    pub fn submit(
        &self,
        club: &mut Club,
        players: &dyn PlayerRepository,
        users: &mut dyn UserDirectory,
        initiator: &str,
        result: impl Into<MatchResult>,
    ) -> Result<PendingRef> {
        let result = result.into();
        let now = self.clock.now();
        let today = now.date_naive();

        let mut record = build_record(&result, Some(initiator.to_string()), now)?;
        validate_participants(club, players, &record)?;
        let side = record
            .side_of(initiator)
            .ok_or_else(|| LadderError::ParticipantNotFound {
                user_id: initiator.to_string(),
            })?;
        record.progress_mut().confirm(side, today);

        let kind = record.kind();
        let match_id = record.id();
        let doubles_notice =
            (kind == MatchKind::Doubles).then(|| notice_text(club, &record, Notice::DoublesSubmitted));

        let (mut pending, purged) = self.surviving_pending(club, today);
        pending.push(record);
        let index = pending.len() - 1;
        self.commit_pending(club, pending, purged);

        self.metrics.record_submitted(kind);
        info!(
            "Submitted {} match {} by {} to club {} at pending index {}",
            kind, match_id, initiator, club.id, index
        );

        if let Some(text) = doubles_notice {
            deliver(users, &club.staff_ids(), today, &text);
        }

        Ok(PendingRef { index, match_id })
    }

    /// Confirm a pending entry on behalf of the participant's side.
    ///
    /// Returns true when this confirmation completed the pair, in which case
    /// the leader and admins are notified.
    pub fn confirm(
        &self,
        club: &mut Club,
        users: &mut dyn UserDirectory,
        kind: MatchKind,
        index: usize,
        user_id: &str,
    ) -> Result<bool> {
        let today = self.clock.today();
        let (mut pending, purged) = self.surviving_pending(club, today);

        let entry = entry_at_mut(&mut pending, index)?;
        check_kind(entry, kind, index)?;
        ensure_open(entry, index)?;
        let side = entry
            .side_of(user_id)
            .ok_or_else(|| LadderError::ParticipantNotFound {
                user_id: user_id.to_string(),
            })?;

        let completed = entry.progress_mut().confirm(side, today);
        let match_id = entry.id();
        let notice = completed.then(|| notice_text(club, entry, Notice::AwaitingApproval));

        self.commit_pending(club, pending, purged);
        info!(
            "User {} confirmed {} match {} in club {}",
            user_id, kind, match_id, club.id
        );

        if let Some(text) = notice {
            self.metrics.confirmed_total.inc();
            deliver(users, &club.staff_ids(), today, &text);
        }

        Ok(completed)
    }

    /// Reject a pending entry; any participant may do this
    pub fn reject(
        &self,
        club: &mut Club,
        users: &mut dyn UserDirectory,
        kind: MatchKind,
        index: usize,
        user_id: &str,
    ) -> Result<()> {
        let today = self.clock.today();
        let (mut pending, purged) = self.surviving_pending(club, today);

        let entry = entry_at_mut(&mut pending, index)?;
        check_kind(entry, kind, index)?;
        ensure_open(entry, index)?;
        if !entry.involves(user_id) {
            return Err(LadderError::ParticipantNotFound {
                user_id: user_id.to_string(),
            });
        }

        entry.progress_mut().resolve(MatchStatus::Rejected, today);
        let match_id = entry.id();
        let initiator = entry.progress().initiator.clone();
        let text = notice_text(club, entry, Notice::Rejected { by: user_id });

        self.commit_pending(club, pending, purged);
        self.metrics.rejected_total.inc();
        info!(
            "User {} rejected {} match {} in club {}",
            user_id, kind, match_id, club.id
        );

        if let Some(initiator) = initiator {
            deliver(users, [&initiator], today, &text);
        }

        Ok(())
    }

    /// Staff veto of a pending entry, regardless of confirmation
    pub fn veto(
        &self,
        club: &mut Club,
        users: &mut dyn UserDirectory,
        kind: MatchKind,
        index: usize,
        approver_id: &str,
    ) -> Result<()> {
        ensure_moderator(club, &*users, approver_id, "veto matches")?;

        let today = self.clock.today();
        let (mut pending, purged) = self.surviving_pending(club, today);

        let entry = entry_at_mut(&mut pending, index)?;
        check_kind(entry, kind, index)?;
        ensure_open(entry, index)?;

        entry.progress_mut().resolve(MatchStatus::Vetoed, today);
        let match_id = entry.id();
        let initiator = entry.progress().initiator.clone();
        let text = notice_text(club, entry, Notice::Vetoed { by: approver_id });

        self.commit_pending(club, pending, purged);
        self.metrics.vetoed_total.inc();
        info!(
            "User {} vetoed {} match {} in club {}",
            approver_id, kind, match_id, club.id
        );

        if let Some(initiator) = initiator {
            deliver(users, [&initiator], today, &text);
        }

        Ok(())
    }

    /// Approve a fully confirmed entry, rate it and move it to history.
    ///
    /// A status marker left by `reject` or `veto` does not block approval;
    /// callers that care must check the entry's status first.
    pub fn approve(
        &self,
        club: &mut Club,
        players: &mut dyn PlayerRepository,
        users: &mut dyn UserDirectory,
        index: usize,
        approver_id: &str,
    ) -> Result<ApprovalOutcome> {
        ensure_moderator(club, &*users, approver_id, "approve matches")?;

        let today = self.clock.today();
        let (mut pending, purged) = self.surviving_pending(club, today);

        let entry = pending.get(index).ok_or(LadderError::PendingMatchNotFound {
            index,
            len: pending.len(),
        })?;
        if !entry.progress().is_fully_confirmed() {
            return Err(LadderError::ConfirmationIncomplete { index });
        }
        if entry.progress().status.is_resolved() {
            debug!(
                "Approving match {} despite {} marker",
                entry.id(),
                entry.progress().status
            );
        }

        let participants: Vec<UserId> = entry.participants().into_iter().cloned().collect();
        for participant in &participants {
            ensure_still_member(club, participant)?;
        }
        let ids: Vec<&str> = participants.iter().map(String::as_str).collect();
        let mut roster = players.get_players(&ids)?;

        let mut record = pending.remove(index);
        let kind = record.kind();
        self.engine.seed_missing_ratings(kind, &mut roster, club);

        let started = Instant::now();
        let rating_changes = self.engine.rate_match(&mut record, &mut roster)?;
        let elapsed = started.elapsed();
        record.progress_mut().approved = true;

        players.store_players(roster.into_values().collect())?;

        let match_id = record.id();
        let text = notice_text(club, &record, Notice::Approved);
        self.commit_pending(club, pending, purged);
        club.matches.push(record);

        self.metrics.record_approved(kind, elapsed);
        info!(
            "User {} approved {} match {} in club {}",
            approver_id, kind, match_id, club.id
        );
        deliver(users, &participants, today, &text);

        Ok(ApprovalOutcome {
            match_id,
            kind,
            rating_changes,
        })
    }

    /// Record a result directly into history, skipping confirmation
    pub fn record(
        &self,
        club: &mut Club,
        players: &mut dyn PlayerRepository,
        users: &mut dyn UserDirectory,
        recorder_id: &str,
        result: impl Into<MatchResult>,
    ) -> Result<ApprovalOutcome> {
        ensure_moderator(club, &*users, recorder_id, "record matches")?;

        let result = result.into();
        let now = self.clock.now();
        let today = now.date_naive();

        let mut record = build_record(&result, None, now)?;
        validate_participants(club, &*players, &record)?;
        let progress = record.progress_mut();
        progress.a_confirmed = true;
        progress.b_confirmed = true;
        progress.confirmed_on = Some(today);

        let participants: Vec<UserId> = record.participants().into_iter().cloned().collect();
        let ids: Vec<&str> = participants.iter().map(String::as_str).collect();
        let mut roster = players.get_players(&ids)?;

        let kind = record.kind();
        self.engine.seed_missing_ratings(kind, &mut roster, club);

        let started = Instant::now();
        let rating_changes = self.engine.rate_match(&mut record, &mut roster)?;
        let elapsed = started.elapsed();
        record.progress_mut().approved = true;

        players.store_players(roster.into_values().collect())?;

        let match_id = record.id();
        let text = notice_text(club, &record, Notice::Recorded { by: recorder_id });
        club.matches.push(record);

        self.metrics.record_recorded(kind, elapsed);
        info!(
            "User {} recorded {} match {} in club {}",
            recorder_id, kind, match_id, club.id
        );
        deliver(users, &participants, today, &text);

        Ok(ApprovalOutcome {
            match_id,
            kind,
            rating_changes,
        })
    }

    /// Drop pending entries that sat too long. Repeated calls on the same
    /// day are no-ops after the first.
    pub fn cleanup_expired(&self, club: &mut Club) -> usize {
        let today = self.clock.today();
        let (pending, purged) = self.partition_expired(&club.pending_matches, today);
        let count = purged.len();
        if count > 0 {
            self.commit_pending(club, pending, purged);
        }
        count
    }

    fn surviving_pending(
        &self,
        club: &Club,
        today: NaiveDate,
    ) -> (Vec<MatchRecord>, Vec<(MatchId, PurgeReason)>) {
        if self.config.cleanup_before_mutation {
            self.partition_expired(&club.pending_matches, today)
        } else {
            (club.pending_matches.clone(), Vec::new())
        }
    }

    fn partition_expired(
        &self,
        records: &[MatchRecord],
        today: NaiveDate,
    ) -> (Vec<MatchRecord>, Vec<(MatchId, PurgeReason)>) {
        let mut kept = Vec::with_capacity(records.len());
        let mut purged = Vec::new();
        for record in records {
            match purge_reason(record, today, &self.config) {
                Some(reason) => purged.push((record.id(), reason)),
                None => kept.push(record.clone()),
            }
        }
        (kept, purged)
    }

    fn commit_pending(
        &self,
        club: &mut Club,
        pending: Vec<MatchRecord>,
        purged: Vec<(MatchId, PurgeReason)>,
    ) {
        club.pending_matches = pending;
        for (match_id, reason) in &purged {
            debug!(
                "Purged pending match {} from club {} ({})",
                match_id,
                club.id,
                reason.as_str()
            );
            self.metrics.record_purged(reason.as_str());
        }
        if !purged.is_empty() {
            info!(
                "Purged {} expired pending matches from club {}",
                purged.len(),
                club.id
            );
        }
    }
}

/// Pending entries a user plays in, with their indices
pub fn pending_for_user<'a>(club: &'a Club, user_id: &str) -> Vec<(usize, &'a MatchRecord)> {
    club.pending_matches
        .iter()
        .enumerate()
        .filter(|(_, record)| record.involves(user_id))
        .collect()
}

/// Indices of open entries confirmed by both sides
pub fn awaiting_approval(club: &Club) -> Vec<usize> {
    club.pending_matches
        .iter()
        .enumerate()
        .filter(|(_, record)| {
            record.progress().is_fully_confirmed() && !record.progress().status.is_resolved()
        })
        .map(|(index, _)| index)
        .collect()
}

fn validate_score(score: i64, label: &str) -> Result<u32> {
    if score < 0 {
        return Err(LadderError::InvalidScore {
            reason: format!("{} score {} is negative", label, score),
        });
    }
    u32::try_from(score).map_err(|_| LadderError::InvalidScore {
        reason: format!("{} score {} is out of range", label, score),
    })
}

/// Both scores must be non-negative and their total must fit a game count
fn validate_scores(score_a: i64, score_b: i64) -> Result<(u32, u32)> {
    let a = validate_score(score_a, "side A")?;
    let b = validate_score(score_b, "side B")?;
    if a.checked_add(b).is_none() {
        return Err(LadderError::InvalidScore {
            reason: format!("total of {} and {} games is out of range", a, b),
        });
    }
    Ok((a, b))
}

fn build_record(
    result: &MatchResult,
    initiator: Option<UserId>,
    now: DateTime<Utc>,
) -> Result<MatchRecord> {
    let progress = MatchProgress::new(initiator, now);
    match result {
        MatchResult::Singles(r) => {
            let (score_a, score_b) = validate_scores(r.score_a, r.score_b)?;
            Ok(MatchRecord::Singles(SinglesMatch {
                id: generate_match_id(),
                date: r.date,
                player_a: r.player_a.clone(),
                player_b: r.player_b.clone(),
                score_a,
                score_b,
                format: r.format,
                location: r.location.clone(),
                rating_a_before: None,
                rating_b_before: None,
                rating_a_after: None,
                rating_b_after: None,
                progress,
            }))
        }
        MatchResult::Doubles(r) => {
            let (score_a, score_b) = validate_scores(r.score_a, r.score_b)?;
            Ok(MatchRecord::Doubles(DoublesMatch {
                id: generate_match_id(),
                date: r.date,
                team_a: r.team_a.clone(),
                team_b: r.team_b.clone(),
                score_a,
                score_b,
                format: r.format,
                location: r.location.clone(),
                ratings_a_before: [None; 2],
                ratings_b_before: [None; 2],
                ratings_a_after: [None; 2],
                ratings_b_after: [None; 2],
                progress,
            }))
        }
    }
}

/// Participants must be distinct, active members with a player record
fn validate_participants(
    club: &Club,
    players: &dyn PlayerRepository,
    record: &MatchRecord,
) -> Result<()> {
    let participants = record.participants();
    let distinct: BTreeSet<&UserId> = participants.iter().copied().collect();
    if distinct.len() != participants.len() {
        return Err(LadderError::InvalidSubmission {
            reason: "a player cannot appear twice in one match".to_string(),
        });
    }

    for participant in participants {
        ensure_member(club, participant)?;
        if players.get_player(participant)?.is_none() {
            return Err(LadderError::PlayerNotFound {
                player_id: participant.clone(),
            });
        }
    }
    Ok(())
}

fn entry_at_mut(pending: &mut [MatchRecord], index: usize) -> Result<&mut MatchRecord> {
    let len = pending.len();
    pending
        .get_mut(index)
        .ok_or(LadderError::PendingMatchNotFound { index, len })
}

fn check_kind(record: &MatchRecord, expected: MatchKind, index: usize) -> Result<()> {
    let actual = record.kind();
    if actual != expected {
        warn!(
            "Pending match {} is {} but a {} operation was requested",
            index, actual, expected
        );
        return Err(LadderError::MatchKindMismatch {
            index,
            expected,
            actual,
        });
    }
    Ok(())
}

fn ensure_open(record: &MatchRecord, index: usize) -> Result<()> {
    let status = record.progress().status;
    if status.is_resolved() {
        return Err(LadderError::AlreadyResolved {
            index,
            status: status.to_string(),
        });
    }
    Ok(())
}
