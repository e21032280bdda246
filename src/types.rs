//! Common types used throughout the club ladder
//!
//! Clubs and matches refer to players by id only; the single owned copy of a
//! [`Player`] lives in a [`crate::rating::PlayerRepository`].

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

/// Unique identifier for users (and the player record they own)
pub type UserId = String;

/// Unique identifier for clubs
pub type ClubId = String;

/// Unique identifier for matches
pub type MatchId = Uuid;

/// Discriminator for the two match variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Singles,
    Doubles,
}

impl MatchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchKind::Singles => "singles",
            MatchKind::Doubles => "doubles",
        }
    }
}

impl std::fmt::Display for MatchKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scoring format of a match; each format carries a fixed weight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchFormat {
    /// Full set to six games
    SixGameSet,
    /// Short set to four games
    FourGameSet,
    /// Match tie-break to ten points
    TiebreakTen,
    /// Tie-break to seven points
    TiebreakSeven,
}

impl MatchFormat {
    /// Multiplier applied to both the skill delta and experience gain
    pub fn weight(&self) -> f64 {
        match self {
            MatchFormat::SixGameSet => 1.0,
            MatchFormat::FourGameSet => 0.7,
            MatchFormat::TiebreakTen => 0.25,
            MatchFormat::TiebreakSeven => 0.15,
        }
    }

    /// Whether games were played out (as opposed to a tie-break shootout)
    pub fn is_full_game(&self) -> bool {
        matches!(self, MatchFormat::SixGameSet | MatchFormat::FourGameSet)
    }
}

impl Default for MatchFormat {
    fn default() -> Self {
        MatchFormat::SixGameSet
    }
}

/// One side of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    A,
    B,
}

/// Staff or participant verdict recorded on a pending match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    #[default]
    Open,
    Rejected,
    Vetoed,
}

impl MatchStatus {
    /// Rejected and vetoed entries only wait to be purged
    pub fn is_resolved(&self) -> bool {
        !matches!(self, MatchStatus::Open)
    }
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchStatus::Open => write!(f, "open"),
            MatchStatus::Rejected => write!(f, "rejected"),
            MatchStatus::Vetoed => write!(f, "vetoed"),
        }
    }
}

/// A player's rating profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub user_id: UserId,
    pub name: String,
    /// Absent until a first rating is established
    pub singles_rating: Option<f64>,
    pub doubles_rating: Option<f64>,
    pub experience: f64,
    pub singles_matches: Vec<MatchId>,
    pub doubles_matches: Vec<MatchId>,
    /// Rater id -> proposed starting rating
    pub pre_ratings: BTreeMap<UserId, f64>,
}

impl Player {
    pub fn new(user_id: impl Into<UserId>, name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            name: name.into(),
            singles_rating: None,
            doubles_rating: None,
            experience: 0.0,
            singles_matches: Vec::new(),
            doubles_matches: Vec::new(),
            pre_ratings: BTreeMap::new(),
        }
    }

    /// Rating for the given kind of play
    pub fn rating(&self, kind: MatchKind) -> Option<f64> {
        match kind {
            MatchKind::Singles => self.singles_rating,
            MatchKind::Doubles => self.doubles_rating,
        }
    }

    pub fn set_rating(&mut self, kind: MatchKind, rating: f64) {
        match kind {
            MatchKind::Singles => self.singles_rating = Some(rating),
            MatchKind::Doubles => self.doubles_rating = Some(rating),
        }
    }
}

/// Workflow bookkeeping shared by both match variants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchProgress {
    /// Submitting user; `None` for matches recorded directly by staff
    pub initiator: Option<UserId>,
    pub a_confirmed: bool,
    pub b_confirmed: bool,
    pub status: MatchStatus,
    pub status_date: Option<NaiveDate>,
    /// Set once, when the second side confirms
    pub confirmed_on: Option<NaiveDate>,
    pub approved: bool,
    pub created_at: DateTime<Utc>,
}

impl MatchProgress {
    pub fn new(initiator: Option<UserId>, created_at: DateTime<Utc>) -> Self {
        Self {
            initiator,
            a_confirmed: false,
            b_confirmed: false,
            status: MatchStatus::Open,
            status_date: None,
            confirmed_on: None,
            approved: false,
            created_at,
        }
    }

    pub fn is_fully_confirmed(&self) -> bool {
        self.a_confirmed && self.b_confirmed
    }

    pub fn is_confirmed(&self, side: Side) -> bool {
        match side {
            Side::A => self.a_confirmed,
            Side::B => self.b_confirmed,
        }
    }

    /// Mark one side confirmed; stamps `confirmed_on` the first time both are.
    /// Returns true when this call completed the confirmation.
    pub fn confirm(&mut self, side: Side, today: NaiveDate) -> bool {
        let was_complete = self.is_fully_confirmed();
        match side {
            Side::A => self.a_confirmed = true,
            Side::B => self.b_confirmed = true,
        }
        if !was_complete && self.is_fully_confirmed() && self.confirmed_on.is_none() {
            self.confirmed_on = Some(today);
            return true;
        }
        false
    }

    pub fn resolve(&mut self, status: MatchStatus, today: NaiveDate) {
        self.status = status;
        self.status_date = Some(today);
    }
}

/// A singles match between two players
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SinglesMatch {
    pub id: MatchId,
    pub date: NaiveDate,
    pub player_a: UserId,
    pub player_b: UserId,
    pub score_a: u32,
    pub score_b: u32,
    pub format: MatchFormat,
    pub location: Option<String>,
    pub rating_a_before: Option<f64>,
    pub rating_b_before: Option<f64>,
    pub rating_a_after: Option<f64>,
    pub rating_b_after: Option<f64>,
    pub progress: MatchProgress,
}

/// A doubles match between two teams of two
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoublesMatch {
    pub id: MatchId,
    pub date: NaiveDate,
    pub team_a: [UserId; 2],
    pub team_b: [UserId; 2],
    pub score_a: u32,
    pub score_b: u32,
    pub format: MatchFormat,
    pub location: Option<String>,
    pub ratings_a_before: [Option<f64>; 2],
    pub ratings_b_before: [Option<f64>; 2],
    pub ratings_a_after: [Option<f64>; 2],
    pub ratings_b_after: [Option<f64>; 2],
    pub progress: MatchProgress,
}

/// A singles or doubles match, tagged by kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchRecord {
    Singles(SinglesMatch),
    Doubles(DoublesMatch),
}

impl MatchRecord {
    pub fn kind(&self) -> MatchKind {
        match self {
            MatchRecord::Singles(_) => MatchKind::Singles,
            MatchRecord::Doubles(_) => MatchKind::Doubles,
        }
    }

    pub fn id(&self) -> MatchId {
        match self {
            MatchRecord::Singles(m) => m.id,
            MatchRecord::Doubles(m) => m.id,
        }
    }

    pub fn date(&self) -> NaiveDate {
        match self {
            MatchRecord::Singles(m) => m.date,
            MatchRecord::Doubles(m) => m.date,
        }
    }

    pub fn progress(&self) -> &MatchProgress {
        match self {
            MatchRecord::Singles(m) => &m.progress,
            MatchRecord::Doubles(m) => &m.progress,
        }
    }

    pub fn progress_mut(&mut self) -> &mut MatchProgress {
        match self {
            MatchRecord::Singles(m) => &mut m.progress,
            MatchRecord::Doubles(m) => &mut m.progress,
        }
    }

    /// Participants of side A
    pub fn side_a(&self) -> Vec<&UserId> {
        match self {
            MatchRecord::Singles(m) => vec![&m.player_a],
            MatchRecord::Doubles(m) => m.team_a.iter().collect(),
        }
    }

    /// Participants of side B
    pub fn side_b(&self) -> Vec<&UserId> {
        match self {
            MatchRecord::Singles(m) => vec![&m.player_b],
            MatchRecord::Doubles(m) => m.team_b.iter().collect(),
        }
    }

    /// All participants, side A first
    pub fn participants(&self) -> Vec<&UserId> {
        let mut all = self.side_a();
        all.extend(self.side_b());
        all
    }

    /// Which side a user plays on, if any
    pub fn side_of(&self, user_id: &str) -> Option<Side> {
        if self.side_a().iter().any(|id| id.as_str() == user_id) {
            Some(Side::A)
        } else if self.side_b().iter().any(|id| id.as_str() == user_id) {
            Some(Side::B)
        } else {
            None
        }
    }

    pub fn involves(&self, user_id: &str) -> bool {
        self.side_of(user_id).is_some()
    }

    /// Short human readable summary used in notifications
    pub fn describe(&self) -> String {
        match self {
            MatchRecord::Singles(m) => format!(
                "{} {} vs {} {}-{} on {}",
                MatchKind::Singles,
                m.player_a,
                m.player_b,
                m.score_a,
                m.score_b,
                m.date
            ),
            MatchRecord::Doubles(m) => format!(
                "{} {}/{} vs {}/{} {}-{} on {}",
                MatchKind::Doubles,
                m.team_a[0],
                m.team_a[1],
                m.team_b[0],
                m.team_b[1],
                m.score_a,
                m.score_b,
                m.date
            ),
        }
    }
}

/// A request to join a club, owned by the membership subsystem
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MembershipRequest {
    pub user_id: UserId,
    pub requested_at: DateTime<Utc>,
    pub note: Option<String>,
}

/// A club with its members and match lists
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Club {
    pub id: ClubId,
    pub name: String,
    pub leader_id: UserId,
    pub admin_ids: BTreeSet<UserId>,
    /// Member ids; player records are resolved through the repository
    pub members: BTreeSet<UserId>,
    /// Approved matches, in approval order
    pub matches: Vec<MatchRecord>,
    /// Submitted matches awaiting confirmation or approval
    pub pending_matches: Vec<MatchRecord>,
    pub banned_ids: BTreeSet<UserId>,
    pub pending_members: Vec<MembershipRequest>,
    pub rejected_members: Vec<MembershipRequest>,
}

impl Club {
    /// Create a club whose leader is its first member
    pub fn new(id: impl Into<ClubId>, name: impl Into<String>, leader_id: impl Into<UserId>) -> Self {
        let leader_id = leader_id.into();
        let mut members = BTreeSet::new();
        members.insert(leader_id.clone());
        Self {
            id: id.into(),
            name: name.into(),
            leader_id,
            admin_ids: BTreeSet::new(),
            members,
            matches: Vec::new(),
            pending_matches: Vec::new(),
            banned_ids: BTreeSet::new(),
            pending_members: Vec::new(),
            rejected_members: Vec::new(),
        }
    }

    pub fn is_member(&self, user_id: &str) -> bool {
        self.members.contains(user_id) && !self.banned_ids.contains(user_id)
    }

    /// Leader or admin
    pub fn is_staff(&self, user_id: &str) -> bool {
        self.leader_id == user_id || self.admin_ids.contains(user_id)
    }

    /// Leader followed by admins, without duplicates
    pub fn staff_ids(&self) -> Vec<UserId> {
        let mut staff = vec![self.leader_id.clone()];
        staff.extend(
            self.admin_ids
                .iter()
                .filter(|id| **id != self.leader_id)
                .cloned(),
        );
        staff
    }

    pub fn add_member(&mut self, user_id: impl Into<UserId>) {
        self.members.insert(user_id.into());
    }

    /// Grant admin rights to a member, keeping the admin set within `max_admins`
    pub fn promote_admin(&mut self, user_id: &str, max_admins: usize) -> crate::error::Result<()> {
        if !self.is_member(user_id) {
            return Err(crate::error::LadderError::ParticipantNotFound {
                user_id: user_id.to_string(),
            });
        }
        if self.admin_ids.contains(user_id) {
            return Ok(());
        }
        if self.admin_ids.len() >= max_admins {
            return Err(crate::error::LadderError::AdminLimitReached {
                club_id: self.id.clone(),
                max: max_admins,
            });
        }
        self.admin_ids.insert(user_id.to_string());
        Ok(())
    }

    /// Number of approved singles matches a user played in this club
    pub fn singles_match_count(&self, user_id: &str) -> usize {
        self.matches
            .iter()
            .filter(|m| m.kind() == MatchKind::Singles && m.involves(user_id))
            .count()
    }
}

/// A notification left in a user's message queue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub date: NaiveDate,
    pub text: String,
}

/// Identity record owned by the account subsystem
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub is_system_admin: bool,
    pub club_ids: BTreeSet<ClubId>,
    pub messages: Vec<Message>,
}

impl User {
    pub fn new(id: impl Into<UserId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_system_admin: false,
            club_ids: BTreeSet::new(),
            messages: Vec::new(),
        }
    }
}

/// Rating change information for a player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingChange {
    pub player_id: UserId,
    pub old_rating: f64,
    pub new_rating: f64,
    pub experience_gained: f64,
}

impl RatingChange {
    pub fn delta(&self) -> f64 {
        self.new_rating - self.old_rating
    }
}
