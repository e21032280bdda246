//! Test fixtures shared by the integration tests

#![allow(dead_code)]

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use club_ladder::config::AppConfig;
use club_ladder::utils::FixedClock;
use club_ladder::workflow::{DoublesResult, SinglesResult};
use club_ladder::{
    Club, InMemoryPlayerRepository, InMemoryUserDirectory, MatchFormat, MatchWorkflow, Player,
    User,
};
use std::sync::Arc;

pub const CLUB_ID: &str = "riverside";
pub const LEADER: &str = "lena";
pub const ADMIN: &str = "arno";
pub const OPERATOR: &str = "ops";

/// Regular members with their starting singles and doubles ratings
pub const MEMBERS: [(&str, f64, f64); 6] = [
    ("mia", 1000.0, 1000.0),
    ("noah", 1000.0, 1000.0),
    ("olga", 1100.0, 1050.0),
    ("pete", 900.0, 950.0),
    ("rosa", 1000.0, 1000.0),
    ("sam", 1200.0, 1150.0),
];

/// A club plus everything the workflow needs to act on it
pub struct TestLadder {
    pub workflow: MatchWorkflow,
    pub clock: Arc<FixedClock>,
    pub club: Club,
    pub players: InMemoryPlayerRepository,
    pub users: InMemoryUserDirectory,
}

pub fn season_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 3, 8, 0, 0).unwrap()
}

pub fn match_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 2).unwrap()
}

pub fn create_test_players() -> Vec<Player> {
    MEMBERS
        .iter()
        .map(|(id, singles, doubles)| {
            let mut player = Player::new(*id, id.to_uppercase());
            player.singles_rating = Some(*singles);
            player.doubles_rating = Some(*doubles);
            player
        })
        .collect()
}

pub fn create_test_users() -> Vec<User> {
    let mut operator = User::new(OPERATOR, "Operator");
    operator.is_system_admin = true;

    let mut users: Vec<User> = MEMBERS
        .iter()
        .map(|(id, _, _)| User::new(*id, id.to_uppercase()))
        .chain([User::new(LEADER, "Lena"), User::new(ADMIN, "Arno"), operator])
        .collect();
    for user in users.iter_mut().filter(|u| u.id != OPERATOR) {
        user.club_ids.insert(CLUB_ID.to_string());
    }
    users
}

pub fn create_test_club() -> Club {
    let mut club = Club::new(CLUB_ID, "Riverside Tennis", LEADER);
    club.add_member(ADMIN);
    for (id, _, _) in MEMBERS {
        club.add_member(id);
    }
    club
}

pub fn create_test_ladder() -> TestLadder {
    create_test_ladder_with(AppConfig::default())
}

pub fn create_test_ladder_with(config: AppConfig) -> TestLadder {
    let clock = Arc::new(FixedClock::new(season_start()));
    let workflow = MatchWorkflow::new(&config, clock.clone()).unwrap();
    let users = InMemoryUserDirectory::with_users(create_test_users());
    let mut club = create_test_club();
    workflow
        .promote_admin(&mut club, &users, LEADER, ADMIN)
        .unwrap();

    TestLadder {
        workflow,
        clock,
        club,
        players: InMemoryPlayerRepository::with_players(create_test_players()),
        users,
    }
}

pub fn singles_result(a: &str, b: &str, score_a: i64, score_b: i64) -> SinglesResult {
    SinglesResult {
        player_a: a.to_string(),
        player_b: b.to_string(),
        score_a,
        score_b,
        date: match_day(),
        format: MatchFormat::SixGameSet,
        location: Some("Court 1".to_string()),
    }
}

pub fn doubles_result(a: [&str; 2], b: [&str; 2], score_a: i64, score_b: i64) -> DoublesResult {
    DoublesResult {
        team_a: [a[0].to_string(), a[1].to_string()],
        team_b: [b[0].to_string(), b[1].to_string()],
        score_a,
        score_b,
        date: match_day(),
        format: MatchFormat::SixGameSet,
        location: None,
    }
}
