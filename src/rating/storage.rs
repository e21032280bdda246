//! Player repository interface and in-memory implementation
//!
//! The repository is the single owner of every [`Player`] record. Clubs and
//! matches only hold ids and always resolve through here, so a player who
//! belongs to several clubs is still one record.

use crate::error::{LadderError, Result};
use crate::types::{Player, UserId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Trait for player storage operations
pub trait PlayerRepository: Send + Sync {
    /// Get a player by user id
    fn get_player(&self, player_id: &str) -> Result<Option<Player>>;

    /// Store or replace a player
    fn store_player(&mut self, player: Player) -> Result<()>;

    /// Store several players as one write
    fn store_players(&mut self, players: Vec<Player>) -> Result<()>;

    /// Remove a player, returning the removed record
    fn remove_player(&mut self, player_id: &str) -> Result<Option<Player>>;

    /// Get total number of players
    fn player_count(&self) -> Result<usize>;

    /// Resolve a set of players, failing on the first unknown id
    fn get_players(&self, player_ids: &[&str]) -> Result<BTreeMap<UserId, Player>> {
        let mut result = BTreeMap::new();
        for player_id in player_ids {
            let player = self
                .get_player(player_id)?
                .ok_or_else(|| LadderError::PlayerNotFound {
                    player_id: player_id.to_string(),
                })?;
            result.insert(player.user_id.clone(), player);
        }
        Ok(result)
    }
}

/// In-memory player repository
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InMemoryPlayerRepository {
    players: HashMap<UserId, Player>,
}

impl InMemoryPlayerRepository {
    /// Create an empty repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository holding the given players
    pub fn with_players(players: impl IntoIterator<Item = Player>) -> Self {
        Self {
            players: players
                .into_iter()
                .map(|player| (player.user_id.clone(), player))
                .collect(),
        }
    }

    /// Borrow a player without cloning
    pub fn player(&self, player_id: &str) -> Option<&Player> {
        self.players.get(player_id)
    }

    /// Iterate over all players
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }
}

impl PlayerRepository for InMemoryPlayerRepository {
    fn get_player(&self, player_id: &str) -> Result<Option<Player>> {
        Ok(self.players.get(player_id).cloned())
    }

    fn store_player(&mut self, player: Player) -> Result<()> {
        self.players.insert(player.user_id.clone(), player);
        Ok(())
    }

    fn store_players(&mut self, players: Vec<Player>) -> Result<()> {
        for player in players {
            self.players.insert(player.user_id.clone(), player);
        }
        Ok(())
    }

    fn remove_player(&mut self, player_id: &str) -> Result<Option<Player>> {
        Ok(self.players.remove(player_id))
    }

    fn player_count(&self) -> Result<usize> {
        Ok(self.players.len())
    }
}
