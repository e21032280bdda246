//! Club standings

use crate::error::Result;
use crate::rating::storage::PlayerRepository;
use crate::types::{Club, MatchKind, UserId};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// One row of a club ladder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Standing {
    pub rank: usize,
    pub user_id: UserId,
    pub name: String,
    pub rating: Option<f64>,
    pub matches_played: usize,
}

/// Active members ordered by rating of the given kind, highest first.
///
/// Unrated members follow the rated ones, ordered by id. Members without a
/// player record are skipped.
pub fn standings(
    club: &Club,
    players: &dyn PlayerRepository,
    kind: MatchKind,
) -> Result<Vec<Standing>> {
    let mut rows = Vec::new();
    for member in club.members.iter().filter(|id| club.is_member(id)) {
        let Some(player) = players.get_player(member)? else {
            continue;
        };
        let matches_played = match kind {
            MatchKind::Singles => player.singles_matches.len(),
            MatchKind::Doubles => player.doubles_matches.len(),
        };
        rows.push(Standing {
            rank: 0,
            user_id: player.user_id.clone(),
            name: player.name.clone(),
            rating: player.rating(kind),
            matches_played,
        });
    }

    rows.sort_by(|a, b| match (a.rating, b.rating) {
        (Some(x), Some(y)) => y
            .partial_cmp(&x)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.user_id.cmp(&b.user_id)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.user_id.cmp(&b.user_id),
    });
    for (index, row) in rows.iter_mut().enumerate() {
        row.rank = index + 1;
    }

    Ok(rows)
}
