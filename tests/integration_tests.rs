//! Integration tests for the club ladder
//!
//! These tests drive the pending-match workflow end to end against in-memory
//! players and users:
//! - Submission, confirmation and approval of singles and doubles results
//! - Rejection, veto and the expiry windows
//! - Atomicity of failed operations
//! - Rating seeding from member votes

mod fixtures;

use club_ladder::config::AppConfig;
use club_ladder::error::ErrorCategory;
use club_ladder::rating::standings;
use club_ladder::workflow::{awaiting_approval, pending_for_user, PendingState};
use club_ladder::{
    LadderError, MatchFormat, MatchKind, MatchRecord, MatchStatus, Player, PlayerRepository,
};

use fixtures::{create_test_ladder, create_test_ladder_with, doubles_result, singles_result};
use fixtures::{ADMIN, LEADER, OPERATOR};

const EPSILON: f64 = 1e-9;

#[test]
fn test_complete_singles_workflow() {
    let mut ladder = create_test_ladder();

    // Step 1: mia reports a win over noah
    let pending = ladder
        .workflow
        .submit(
            &mut ladder.club,
            &ladder.players,
            &mut ladder.users,
            "mia",
            singles_result("mia", "noah", 6, 4),
        )
        .unwrap();
    assert_eq!(
        PendingState::of(&ladder.club.pending_matches[pending.index]),
        PendingState::PartiallyConfirmed
    );
    assert!(ladder.users.messages(LEADER).is_empty());

    // Step 2: noah confirms, staff hear about it
    let completed = ladder
        .workflow
        .confirm(
            &mut ladder.club,
            &mut ladder.users,
            MatchKind::Singles,
            pending.index,
            "noah",
        )
        .unwrap();
    assert!(completed);
    assert_eq!(awaiting_approval(&ladder.club), vec![pending.index]);
    assert_eq!(ladder.users.messages(LEADER).len(), 1);
    assert_eq!(ladder.users.messages(ADMIN).len(), 1);

    // Step 3: the leader approves
    let outcome = ladder
        .workflow
        .approve(
            &mut ladder.club,
            &mut ladder.players,
            &mut ladder.users,
            pending.index,
            LEADER,
        )
        .unwrap();
    assert_eq!(outcome.match_id, pending.match_id);

    let experience = ladder
        .workflow
        .engine()
        .experience_gain(1000.0, MatchFormat::SixGameSet, 10);
    assert!(experience < 0.0);

    let mia = ladder.players.player("mia").unwrap();
    let noah = ladder.players.player("noah").unwrap();
    assert!((mia.singles_rating.unwrap() - (1000.0 + 0.025 + experience)).abs() < EPSILON);
    assert!((noah.singles_rating.unwrap() - (1000.0 - 0.025 + experience)).abs() < EPSILON);
    assert!((mia.experience - experience).abs() < EPSILON);
    assert_eq!(mia.singles_matches, vec![pending.match_id]);
    assert_eq!(noah.singles_matches, vec![pending.match_id]);

    // Snapshots on the archived match
    assert!(ladder.club.pending_matches.is_empty());
    let archived = &ladder.club.matches[0];
    assert!(archived.progress().approved);
    match archived {
        MatchRecord::Singles(game) => {
            assert_eq!(game.rating_a_before, Some(1000.0));
            assert_eq!(game.rating_a_after, mia.singles_rating);
            assert_eq!(game.rating_b_after, noah.singles_rating);
        }
        other => panic!("expected a singles match, got {:?}", other.kind()),
    }

    // Participants were told about the approval
    assert!(ladder
        .users
        .messages("mia")
        .iter()
        .any(|m| m.text.contains("approved")));
    assert!(ladder
        .users
        .messages("noah")
        .iter()
        .any(|m| m.text.contains("approved")));
}

#[test]
fn test_complete_doubles_workflow() {
    let mut ladder = create_test_ladder();

    ladder
        .workflow
        .submit(
            &mut ladder.club,
            &ladder.players,
            &mut ladder.users,
            "noah",
            doubles_result(["mia", "noah"], ["olga", "pete"], 6, 3),
        )
        .unwrap();

    // Doubles submissions reach staff immediately
    assert_eq!(ladder.users.messages(LEADER).len(), 1);

    ladder
        .workflow
        .confirm(
            &mut ladder.club,
            &mut ladder.users,
            MatchKind::Doubles,
            0,
            "pete",
        )
        .unwrap();
    assert_eq!(ladder.users.messages(LEADER).len(), 2);

    let outcome = ladder
        .workflow
        .approve(
            &mut ladder.club,
            &mut ladder.players,
            &mut ladder.users,
            0,
            ADMIN,
        )
        .unwrap();
    assert_eq!(outcome.rating_changes.len(), 4);

    let skill: Vec<f64> = outcome
        .rating_changes
        .iter()
        .map(|change| change.delta() - change.experience_gained)
        .collect();

    // Team ratings are both 1000, so the team delta is 0.25 * (6/9 - 0.5)
    let team_delta = 0.25 * (6.0 / 9.0 - 0.5);
    assert!((skill[0] + skill[1] - team_delta).abs() < EPSILON);
    assert!((skill[0] - skill[1]).abs() < EPSILON);
    assert!((skill[2] + skill[3] + team_delta).abs() < EPSILON);

    // Team B splits by pre-match share: olga 1050, pete 950
    assert!((skill[2] - (-team_delta * 1050.0 / 2000.0)).abs() < EPSILON);
    assert!((skill[3] - (-team_delta * 950.0 / 2000.0)).abs() < EPSILON);

    for id in ["mia", "noah", "olga", "pete"] {
        let player = ladder.players.player(id).unwrap();
        assert_eq!(player.doubles_matches, vec![outcome.match_id]);
        assert!(player.singles_matches.is_empty());
    }
}

#[test]
fn test_reject_then_cleanup_after_retention() {
    let mut ladder = create_test_ladder();

    ladder
        .workflow
        .submit(
            &mut ladder.club,
            &ladder.players,
            &mut ladder.users,
            "olga",
            singles_result("olga", "pete", 6, 0),
        )
        .unwrap();
    ladder
        .workflow
        .reject(
            &mut ladder.club,
            &mut ladder.users,
            MatchKind::Singles,
            0,
            "pete",
        )
        .unwrap();
    assert_eq!(
        ladder.club.pending_matches[0].progress().status,
        MatchStatus::Rejected
    );
    assert!(ladder.users.messages("olga")[0].text.contains("rejected"));

    ladder.clock.advance_days(2);
    assert_eq!(ladder.workflow.cleanup_expired(&mut ladder.club), 0);

    ladder.clock.advance_days(1);
    assert_eq!(ladder.workflow.cleanup_expired(&mut ladder.club), 1);
    assert!(ladder.club.pending_matches.is_empty());
    assert!(ladder.club.matches.is_empty());
}

#[test]
fn test_veto_by_system_operator() {
    let mut ladder = create_test_ladder();

    ladder
        .workflow
        .submit(
            &mut ladder.club,
            &ladder.players,
            &mut ladder.users,
            "mia",
            doubles_result(["mia", "rosa"], ["olga", "sam"], 7, 5),
        )
        .unwrap();

    // Regular members cannot veto
    let err = ladder
        .workflow
        .veto(
            &mut ladder.club,
            &mut ladder.users,
            MatchKind::Doubles,
            0,
            "olga",
        )
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Authorization);

    // A singles veto cannot target a doubles entry
    let err = ladder
        .workflow
        .veto(
            &mut ladder.club,
            &mut ladder.users,
            MatchKind::Singles,
            0,
            OPERATOR,
        )
        .unwrap_err();
    assert_eq!(
        err,
        LadderError::MatchKindMismatch {
            index: 0,
            expected: MatchKind::Singles,
            actual: MatchKind::Doubles,
        }
    );

    ladder
        .workflow
        .veto(
            &mut ladder.club,
            &mut ladder.users,
            MatchKind::Doubles,
            0,
            OPERATOR,
        )
        .unwrap();
    assert_eq!(
        PendingState::of(&ladder.club.pending_matches[0]),
        PendingState::Vetoed
    );
    assert!(ladder
        .users
        .messages("mia")
        .iter()
        .any(|m| m.text.contains("vetoed by ops")));
}

#[test]
fn test_expiry_windows() {
    let mut ladder = create_test_ladder();

    // Entry 0 never gets confirmed
    ladder
        .workflow
        .submit(
            &mut ladder.club,
            &ladder.players,
            &mut ladder.users,
            "mia",
            singles_result("mia", "noah", 6, 2),
        )
        .unwrap();

    // Entry 1 is confirmed two days later
    ladder
        .workflow
        .submit(
            &mut ladder.club,
            &ladder.players,
            &mut ladder.users,
            "olga",
            singles_result("olga", "pete", 6, 2),
        )
        .unwrap();
    ladder.clock.advance_days(2);
    ladder
        .workflow
        .confirm(
            &mut ladder.club,
            &mut ladder.users,
            MatchKind::Singles,
            1,
            "pete",
        )
        .unwrap();

    ladder.clock.advance_days(4);
    assert_eq!(ladder.workflow.cleanup_expired(&mut ladder.club), 0);

    // Seven days after submission the unconfirmed entry goes
    ladder.clock.advance_days(1);
    assert_eq!(ladder.workflow.cleanup_expired(&mut ladder.club), 1);
    assert_eq!(ladder.club.pending_matches.len(), 1);
    assert!(ladder.club.pending_matches[0].involves("olga"));

    // The confirmed one waits seven days from its confirmation
    ladder.clock.advance_days(1);
    assert_eq!(ladder.workflow.cleanup_expired(&mut ladder.club), 0);
    ladder.clock.advance_days(1);
    assert_eq!(ladder.workflow.cleanup_expired(&mut ladder.club), 1);
    assert!(ladder.club.pending_matches.is_empty());
}

#[test]
fn test_cleanup_can_be_left_to_the_caller() {
    let mut config = AppConfig::default();
    config.workflow.cleanup_before_mutation = false;
    let mut ladder = create_test_ladder_with(config);

    ladder
        .workflow
        .submit(
            &mut ladder.club,
            &ladder.players,
            &mut ladder.users,
            "mia",
            singles_result("mia", "noah", 6, 2),
        )
        .unwrap();
    ladder.clock.advance_days(30);
    ladder
        .workflow
        .submit(
            &mut ladder.club,
            &ladder.players,
            &mut ladder.users,
            "olga",
            singles_result("olga", "pete", 6, 2),
        )
        .unwrap();

    assert_eq!(ladder.club.pending_matches.len(), 2);
    assert_eq!(ladder.workflow.cleanup_expired(&mut ladder.club), 1);
}

#[test]
fn test_failed_approval_changes_nothing() {
    let mut ladder = create_test_ladder();

    ladder
        .workflow
        .submit(
            &mut ladder.club,
            &ladder.players,
            &mut ladder.users,
            "mia",
            doubles_result(["mia", "noah"], ["rosa", "sam"], 6, 4),
        )
        .unwrap();
    ladder
        .workflow
        .confirm(
            &mut ladder.club,
            &mut ladder.users,
            MatchKind::Doubles,
            0,
            "sam",
        )
        .unwrap();

    // sam leaves before the match is approved
    ladder.club.members.remove("sam");

    let club_before = ladder.club.clone();
    let players_before = ladder.players.clone();
    let users_before = ladder.users.clone();

    let err = ladder
        .workflow
        .approve(
            &mut ladder.club,
            &mut ladder.players,
            &mut ladder.users,
            0,
            LEADER,
        )
        .unwrap_err();
    assert_eq!(
        err,
        LadderError::ParticipantLeftClub {
            user_id: "sam".to_string(),
            club_id: fixtures::CLUB_ID.to_string(),
        }
    );
    assert_eq!(err.category(), ErrorCategory::Precondition);

    assert_eq!(ladder.club, club_before);
    assert_eq!(ladder.players, players_before);
    assert_eq!(ladder.users, users_before);
}

#[test]
fn test_failed_submission_changes_nothing() {
    let mut ladder = create_test_ladder();
    let club_before = ladder.club.clone();
    let users_before = ladder.users.clone();

    let attempts = [
        singles_result("mia", "noah", -2, 6),
        singles_result("mia", "nobody", 6, 2),
        singles_result("mia", "mia", 6, 2),
    ];
    for attempt in attempts {
        assert!(ladder
            .workflow
            .submit(
                &mut ladder.club,
                &ladder.players,
                &mut ladder.users,
                "mia",
                attempt,
            )
            .is_err());
    }

    // A member without a player record
    ladder.club.add_member("tess");
    let err = ladder
        .workflow
        .submit(
            &mut ladder.club,
            &ladder.players,
            &mut ladder.users,
            "mia",
            singles_result("mia", "tess", 6, 2),
        )
        .unwrap_err();
    assert!(matches!(err, LadderError::PlayerNotFound { .. }));
    ladder.club.members.remove("tess");

    assert_eq!(ladder.club, club_before);
    assert_eq!(ladder.users, users_before);
}

#[test]
fn test_stale_index_never_rates_twice() {
    let mut ladder = create_test_ladder();

    for (a, b) in [("mia", "noah"), ("olga", "pete")] {
        ladder
            .workflow
            .submit(
                &mut ladder.club,
                &ladder.players,
                &mut ladder.users,
                a,
                singles_result(a, b, 6, 3),
            )
            .unwrap();
    }
    for (index, confirmer) in [(0, "noah"), (1, "pete")] {
        ladder
            .workflow
            .confirm(
                &mut ladder.club,
                &mut ladder.users,
                MatchKind::Singles,
                index,
                confirmer,
            )
            .unwrap();
    }

    let first = ladder
        .workflow
        .approve(
            &mut ladder.club,
            &mut ladder.players,
            &mut ladder.users,
            0,
            LEADER,
        )
        .unwrap();

    // Index 0 now holds the other match
    let second = ladder
        .workflow
        .approve(
            &mut ladder.club,
            &mut ladder.players,
            &mut ladder.users,
            0,
            LEADER,
        )
        .unwrap();
    assert_ne!(first.match_id, second.match_id);

    let err = ladder
        .workflow
        .approve(
            &mut ladder.club,
            &mut ladder.players,
            &mut ladder.users,
            0,
            LEADER,
        )
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::NotFound);

    for id in ["mia", "noah", "olga", "pete"] {
        assert_eq!(ladder.players.player(id).unwrap().singles_matches.len(), 1);
    }
    assert_eq!(ladder.club.matches.len(), 2);
}

#[test]
fn test_new_player_rating_seeded_from_votes() {
    let mut ladder = create_test_ladder();

    // mia plays two approved singles, noah one
    for (a, b) in [("mia", "pete"), ("mia", "rosa"), ("noah", "sam")] {
        ladder
            .workflow
            .record(
                &mut ladder.club,
                &mut ladder.players,
                &mut ladder.users,
                ADMIN,
                singles_result(a, b, 6, 4),
            )
            .unwrap();
    }

    let mut newcomer = Player::new("quinn", "QUINN");
    newcomer.pre_ratings.insert("mia".to_string(), 1100.0);
    newcomer.pre_ratings.insert("noah".to_string(), 900.0);
    newcomer.pre_ratings.insert("gone".to_string(), 2000.0);
    ladder.players.store_player(newcomer).unwrap();
    ladder.club.add_member("quinn");

    let rows = standings(&ladder.club, &ladder.players, MatchKind::Singles).unwrap();
    assert_eq!(rows.last().unwrap().user_id, "quinn");
    assert_eq!(rows.last().unwrap().rating, None);

    // A scoreless match establishes the seeded rating without moving it
    let outcome = ladder
        .workflow
        .record(
            &mut ladder.club,
            &mut ladder.players,
            &mut ladder.users,
            LEADER,
            singles_result("quinn", "olga", 0, 0),
        )
        .unwrap();

    let expected = (1100.0 * 2.0 + 900.0) / 3.0;
    assert!((outcome.rating_changes[0].old_rating - expected).abs() < EPSILON);
    let quinn = ladder.players.player("quinn").unwrap();
    assert!((quinn.singles_rating.unwrap() - expected).abs() < EPSILON);
    assert!(quinn.singles_matches.is_empty());
}

#[test]
fn test_pending_queries_track_indices() {
    let mut ladder = create_test_ladder();

    for (a, b) in [("mia", "noah"), ("olga", "mia"), ("rosa", "sam")] {
        ladder
            .workflow
            .submit(
                &mut ladder.club,
                &ladder.players,
                &mut ladder.users,
                a,
                singles_result(a, b, 6, 1),
            )
            .unwrap();
    }

    let indices: Vec<usize> = pending_for_user(&ladder.club, "mia")
        .into_iter()
        .map(|(index, _)| index)
        .collect();
    assert_eq!(indices, vec![0, 1]);
    assert!(awaiting_approval(&ladder.club).is_empty());

    ladder
        .workflow
        .confirm(
            &mut ladder.club,
            &mut ladder.users,
            MatchKind::Singles,
            2,
            "sam",
        )
        .unwrap();
    assert_eq!(awaiting_approval(&ladder.club), vec![2]);
}

#[test]
fn test_metrics_follow_transitions() {
    let mut ladder = create_test_ladder();

    ladder
        .workflow
        .record(
            &mut ladder.club,
            &mut ladder.players,
            &mut ladder.users,
            LEADER,
            doubles_result(["mia", "noah"], ["olga", "pete"], 4, 6),
        )
        .unwrap();
    ladder
        .workflow
        .submit(
            &mut ladder.club,
            &ladder.players,
            &mut ladder.users,
            "rosa",
            singles_result("rosa", "sam", 2, 6),
        )
        .unwrap();

    let metrics = ladder.workflow.metrics();
    assert_eq!(
        metrics
            .recorded_total
            .with_label_values(&["doubles"])
            .get(),
        1
    );
    assert_eq!(
        metrics
            .submitted_total
            .with_label_values(&["singles"])
            .get(),
        1
    );

    let text = metrics.gather_text().unwrap();
    assert!(text.contains("ladder_matches_recorded_total"));
    assert!(text.contains("ladder_rating_update_duration_seconds"));
}

#[test]
fn test_admin_cap_comes_from_config() {
    let mut config = AppConfig::default();
    config.membership.max_admins = 1;
    let mut ladder = create_test_ladder_with(config);
    assert!(ladder.club.admin_ids.contains(ADMIN));

    let err = ladder
        .workflow
        .promote_admin(&mut ladder.club, &ladder.users, OPERATOR, "mia")
        .unwrap_err();
    assert!(matches!(err, LadderError::AdminLimitReached { max: 1, .. }));
    assert_eq!(ladder.club.admin_ids.len(), 1);
}

#[test]
fn test_overflowing_score_is_rejected_by_record() {
    let mut ladder = create_test_ladder();
    let players_before = ladder.players.clone();

    let err = ladder
        .workflow
        .record(
            &mut ladder.club,
            &mut ladder.players,
            &mut ladder.users,
            LEADER,
            singles_result("mia", "noah", i64::from(u32::MAX), 1),
        )
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Validation);
    assert!(ladder.club.matches.is_empty());
    assert_eq!(ladder.players, players_before);
}
