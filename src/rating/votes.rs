//! Starting ratings from club member votes

use crate::types::{Club, Player};

/// Weighted average of the ratings other members proposed for `player`.
///
/// Each vote is weighted by the rater's approved singles match count in the
/// club, with a floor of one. Votes from raters who left the club are ignored.
pub fn initial_rating_from_votes(player: &Player, club: &Club, default: f64) -> f64 {
    if player.pre_ratings.is_empty() {
        return default;
    }

    let (weighted_sum, total_weight) = player
        .pre_ratings
        .iter()
        .filter(|(rater_id, _)| club.is_member(rater_id))
        .fold((0.0, 0.0), |(sum, weight), (rater_id, rating)| {
            let rater_weight = club.singles_match_count(rater_id).max(1) as f64;
            (sum + rating * rater_weight, weight + rater_weight)
        });

    if total_weight == 0.0 {
        return default;
    }

    weighted_sum / total_weight
}
