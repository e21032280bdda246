//! Rating engine for singles and doubles play
//!
//! Converts a match score into zero-sum skill deltas plus a per-player
//! experience term. These are the only routines that write rating or
//! experience fields on a [`Player`].

use crate::config::rating::RatingConfig;
use crate::error::{LadderError, Result};
use crate::rating::votes::initial_rating_from_votes;
use crate::types::{
    Club, DoublesMatch, MatchFormat, MatchKind, MatchRecord, Player, RatingChange, SinglesMatch,
    UserId,
};
use std::collections::BTreeMap;
use tracing::debug;

/// Logistic slope used by [`expected_score`]
pub const LOGISTIC_SLOPE: f64 = 4.0;

/// Probability that a player rated `rating_a` beats one rated `rating_b`
pub fn expected_score(rating_a: f64, rating_b: f64) -> f64 {
    logistic(rating_a, rating_b, LOGISTIC_SLOPE)
}

fn logistic(rating_a: f64, rating_b: f64, slope: f64) -> f64 {
    1.0 / (1.0 + (-slope * (rating_a - rating_b)).exp())
}

/// Result of a singles rating update
#[derive(Debug, Clone, PartialEq)]
pub struct SinglesOutcome {
    pub new_rating_a: f64,
    pub new_rating_b: f64,
    /// Skill component only; always the negation of `skill_delta_b`
    pub skill_delta_a: f64,
    pub skill_delta_b: f64,
    pub experience_a: f64,
    pub experience_b: f64,
    /// False when no games were played and nothing was written
    pub applied: bool,
}

/// Result of a doubles rating update
#[derive(Debug, Clone, PartialEq)]
pub struct DoublesOutcome {
    pub team_rating_a: f64,
    pub team_rating_b: f64,
    pub new_ratings_a: [f64; 2],
    pub new_ratings_b: [f64; 2],
    pub team_delta: f64,
    pub skill_deltas_a: [f64; 2],
    pub skill_deltas_b: [f64; 2],
    pub experience_a: [f64; 2],
    pub experience_b: [f64; 2],
    pub applied: bool,
}

/// Rating engine parameterized by [`RatingConfig`]
#[derive(Debug, Clone)]
pub struct RatingEngine {
    config: RatingConfig,
}

impl Default for RatingEngine {
    fn default() -> Self {
        Self {
            config: RatingConfig::default(),
        }
    }
}

impl RatingEngine {
    /// Create a new rating engine
    pub fn new(config: RatingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &RatingConfig {
        &self.config
    }

    /// Rating used for players that have none yet
    pub fn default_rating(&self) -> f64 {
        self.config.default_rating
    }

    /// Win probability under the configured slope
    pub fn expected_score(&self, rating_a: f64, rating_b: f64) -> f64 {
        logistic(rating_a, rating_b, self.config.logistic_slope)
    }

    /// Experience earned by a player whose pre-match rating is `rating`.
    ///
    /// The denominator changes sign around `experience_ceiling`; for ratings
    /// above it the gain is negative. That arithmetic is kept as is.
    pub fn experience_gain(&self, rating: f64, format: MatchFormat, games_played: u32) -> f64 {
        if rating <= 0.0 {
            return 0.0;
        }

        let mut denom = (self.config.experience_numerator
            / (self.config.experience_ceiling / rating - 1.0))
            * self.config.experience_multiplier;
        if !format.is_full_game() {
            denom *= self.config.short_format_penalty;
        }

        if denom == 0.0 || !denom.is_finite() {
            return 0.0;
        }

        (self.config.experience_base / denom) * f64::from(games_played)
    }

    fn skill_delta(&self, format: MatchFormat, expected: f64, actual: f64) -> f64 {
        format.weight() * self.config.skill_scale * (actual - expected)
    }

    /// Stored singles rating, read verbatim
    pub fn weighted_rating(&self, player: &Player) -> Option<f64> {
        player.singles_rating
    }

    /// Stored doubles rating, read verbatim
    pub fn weighted_doubles_rating(&self, player: &Player) -> Option<f64> {
        player.doubles_rating
    }

    /// Give every player without a rating of this kind a starting rating
    /// derived from the votes club members cast for them
    pub fn seed_missing_ratings(
        &self,
        kind: MatchKind,
        players: &mut BTreeMap<UserId, Player>,
        club: &Club,
    ) {
        for player in players.values_mut() {
            if player.rating(kind).is_some() {
                continue;
            }
            let seeded = initial_rating_from_votes(player, club, self.config.default_rating);
            debug!(player_id = %player.user_id, %kind, seeded, "Seeded starting rating");
            player.set_rating(kind, seeded);
        }
    }

    /// Apply a singles result to both players and snapshot ratings on the match
    pub fn update_singles_rating(
        &self,
        game: &mut SinglesMatch,
        player_a: &mut Player,
        player_b: &mut Player,
    ) -> Result<SinglesOutcome> {
        ensure_player(&game.player_a, player_a)?;
        ensure_player(&game.player_b, player_b)?;

        let rating_a = player_a.singles_rating.unwrap_or(self.config.default_rating);
        let rating_b = player_b.singles_rating.unwrap_or(self.config.default_rating);

        let games_played = games_played(game.score_a, game.score_b)?;
        if games_played == 0 {
            debug!(match_id = %game.id, "No games played, singles rating unchanged");
            return Ok(SinglesOutcome {
                new_rating_a: rating_a,
                new_rating_b: rating_b,
                skill_delta_a: 0.0,
                skill_delta_b: 0.0,
                experience_a: 0.0,
                experience_b: 0.0,
                applied: false,
            });
        }

        game.rating_a_before = Some(rating_a);
        game.rating_b_before = Some(rating_b);

        let expected_a = self.expected_score(rating_a, rating_b);
        let actual_a = f64::from(game.score_a) / f64::from(games_played);
        let skill_delta_a = self.skill_delta(game.format, expected_a, actual_a);
        let skill_delta_b = -skill_delta_a;

        let experience_a = self.experience_gain(rating_a, game.format, games_played);
        let experience_b = self.experience_gain(rating_b, game.format, games_played);

        let new_rating_a = rating_a + skill_delta_a + experience_a;
        let new_rating_b = rating_b + skill_delta_b + experience_b;

        debug!(
            match_id = %game.id,
            expected_a, actual_a, skill_delta_a, experience_a, experience_b,
            "Singles rating update"
        );

        game.rating_a_after = Some(new_rating_a);
        game.rating_b_after = Some(new_rating_b);

        player_a.singles_matches.push(game.id);
        player_b.singles_matches.push(game.id);
        player_a.experience += experience_a;
        player_b.experience += experience_b;
        player_a.singles_rating = Some(new_rating_a);
        player_b.singles_rating = Some(new_rating_b);

        Ok(SinglesOutcome {
            new_rating_a,
            new_rating_b,
            skill_delta_a,
            skill_delta_b,
            experience_a,
            experience_b,
            applied: true,
        })
    }

    /// Apply a doubles result to all four players and snapshot ratings on the match
    pub fn update_doubles_rating(
        &self,
        game: &mut DoublesMatch,
        team_a: [&mut Player; 2],
        team_b: [&mut Player; 2],
    ) -> Result<DoublesOutcome> {
        let [a1, a2] = team_a;
        let [b1, b2] = team_b;
        ensure_player(&game.team_a[0], a1)?;
        ensure_player(&game.team_a[1], a2)?;
        ensure_player(&game.team_b[0], b1)?;
        ensure_player(&game.team_b[1], b2)?;

        let default = self.config.default_rating;
        let ratings_a = [
            a1.doubles_rating.unwrap_or(default),
            a2.doubles_rating.unwrap_or(default),
        ];
        let ratings_b = [
            b1.doubles_rating.unwrap_or(default),
            b2.doubles_rating.unwrap_or(default),
        ];
        let team_rating_a = (ratings_a[0] + ratings_a[1]) / 2.0;
        let team_rating_b = (ratings_b[0] + ratings_b[1]) / 2.0;

        let games_played = games_played(game.score_a, game.score_b)?;
        if games_played == 0 {
            debug!(match_id = %game.id, "No games played, doubles ratings unchanged");
            return Ok(DoublesOutcome {
                team_rating_a,
                team_rating_b,
                new_ratings_a: ratings_a,
                new_ratings_b: ratings_b,
                team_delta: 0.0,
                skill_deltas_a: [0.0; 2],
                skill_deltas_b: [0.0; 2],
                experience_a: [0.0; 2],
                experience_b: [0.0; 2],
                applied: false,
            });
        }

        game.ratings_a_before = [Some(ratings_a[0]), Some(ratings_a[1])];
        game.ratings_b_before = [Some(ratings_b[0]), Some(ratings_b[1])];

        let expected_a = self.expected_score(team_rating_a, team_rating_b);
        let actual_a = f64::from(game.score_a) / f64::from(games_played);
        let team_delta = self.skill_delta(game.format, expected_a, actual_a);

        let shares_a = split_shares(ratings_a);
        let shares_b = split_shares(ratings_b);
        let skill_deltas_a = [team_delta * shares_a[0], team_delta * shares_a[1]];
        let skill_deltas_b = [-team_delta * shares_b[0], -team_delta * shares_b[1]];

        let experience_a = ratings_a.map(|r| self.experience_gain(r, game.format, games_played));
        let experience_b = ratings_b.map(|r| self.experience_gain(r, game.format, games_played));

        let new_ratings_a = [
            ratings_a[0] + skill_deltas_a[0] + experience_a[0],
            ratings_a[1] + skill_deltas_a[1] + experience_a[1],
        ];
        let new_ratings_b = [
            ratings_b[0] + skill_deltas_b[0] + experience_b[0],
            ratings_b[1] + skill_deltas_b[1] + experience_b[1],
        ];

        debug!(
            match_id = %game.id,
            team_rating_a, team_rating_b, expected_a, actual_a, team_delta,
            "Doubles rating update"
        );

        game.ratings_a_after = [Some(new_ratings_a[0]), Some(new_ratings_a[1])];
        game.ratings_b_after = [Some(new_ratings_b[0]), Some(new_ratings_b[1])];

        for (player, (rating, gain)) in [a1, a2]
            .into_iter()
            .zip(new_ratings_a.into_iter().zip(experience_a))
            .chain(
                [b1, b2]
                    .into_iter()
                    .zip(new_ratings_b.into_iter().zip(experience_b)),
            )
        {
            player.doubles_matches.push(game.id);
            player.experience += gain;
            player.doubles_rating = Some(rating);
        }

        Ok(DoublesOutcome {
            team_rating_a,
            team_rating_b,
            new_ratings_a,
            new_ratings_b,
            team_delta,
            skill_deltas_a,
            skill_deltas_b,
            experience_a,
            experience_b,
            applied: true,
        })
    }

    /// Dispatch on the match variant and rate it against the given players.
    ///
    /// `players` must hold every participant; they are updated in place.
    pub fn rate_match(
        &self,
        record: &mut MatchRecord,
        players: &mut BTreeMap<UserId, Player>,
    ) -> Result<Vec<RatingChange>> {
        match record {
            MatchRecord::Singles(game) => {
                let mut a = take_player(players, &game.player_a)?;
                let mut b = match take_player(players, &game.player_b) {
                    Ok(player) => player,
                    Err(e) => {
                        players.insert(a.user_id.clone(), a);
                        return Err(e);
                    }
                };
                let old_a = a.singles_rating.unwrap_or(self.config.default_rating);
                let old_b = b.singles_rating.unwrap_or(self.config.default_rating);

                let result = self.update_singles_rating(game, &mut a, &mut b);
                players.insert(a.user_id.clone(), a);
                players.insert(b.user_id.clone(), b);
                let outcome = result?;

                Ok(vec![
                    RatingChange {
                        player_id: game.player_a.clone(),
                        old_rating: old_a,
                        new_rating: outcome.new_rating_a,
                        experience_gained: outcome.experience_a,
                    },
                    RatingChange {
                        player_id: game.player_b.clone(),
                        old_rating: old_b,
                        new_rating: outcome.new_rating_b,
                        experience_gained: outcome.experience_b,
                    },
                ])
            }
            MatchRecord::Doubles(game) => {
                let ids: Vec<UserId> = game.team_a.iter().chain(game.team_b.iter()).cloned().collect();
                if let Some(missing) = ids.iter().find(|id| !players.contains_key(*id)) {
                    return Err(LadderError::PlayerNotFound {
                        player_id: missing.clone(),
                    });
                }
                let mut taken = Vec::with_capacity(4);
                for id in &ids {
                    match take_player(players, id) {
                        Ok(player) => taken.push(player),
                        Err(e) => {
                            for player in taken {
                                players.insert(player.user_id.clone(), player);
                            }
                            return Err(e);
                        }
                    }
                }
                let old: Vec<f64> = taken
                    .iter()
                    .map(|p| p.doubles_rating.unwrap_or(self.config.default_rating))
                    .collect();

                let result = {
                    let (team_a, team_b) = taken.split_at_mut(2);
                    let (a1, a2) = team_a.split_at_mut(1);
                    let (b1, b2) = team_b.split_at_mut(1);
                    self.update_doubles_rating(game, [&mut a1[0], &mut a2[0]], [&mut b1[0], &mut b2[0]])
                };
                for player in taken {
                    players.insert(player.user_id.clone(), player);
                }
                let outcome = result?;

                let new = [
                    outcome.new_ratings_a[0],
                    outcome.new_ratings_a[1],
                    outcome.new_ratings_b[0],
                    outcome.new_ratings_b[1],
                ];
                let gains = [
                    outcome.experience_a[0],
                    outcome.experience_a[1],
                    outcome.experience_b[0],
                    outcome.experience_b[1],
                ];
                Ok(ids
                    .into_iter()
                    .enumerate()
                    .map(|(i, player_id)| RatingChange {
                        player_id,
                        old_rating: old[i],
                        new_rating: new[i],
                        experience_gained: gains[i],
                    })
                    .collect())
            }
        }
    }
}

/// Each teammate's share of the team total; an even split if the total is zero
fn split_shares(ratings: [f64; 2]) -> [f64; 2] {
    let total = ratings[0] + ratings[1];
    if total == 0.0 {
        [0.5, 0.5]
    } else {
        [ratings[0] / total, ratings[1] / total]
    }
}

fn games_played(score_a: u32, score_b: u32) -> Result<u32> {
    score_a
        .checked_add(score_b)
        .ok_or_else(|| LadderError::InvalidScore {
            reason: format!("total of {} and {} games is out of range", score_a, score_b),
        })
}

fn ensure_player(expected: &str, player: &Player) -> Result<()> {
    if player.user_id != expected {
        return Err(LadderError::InternalError {
            message: format!(
                "Player {} supplied where {} was expected",
                player.user_id, expected
            ),
        });
    }
    Ok(())
}

fn take_player(players: &mut BTreeMap<UserId, Player>, id: &str) -> Result<Player> {
    players.remove(id).ok_or_else(|| LadderError::PlayerNotFound {
        player_id: id.to_string(),
    })
}
