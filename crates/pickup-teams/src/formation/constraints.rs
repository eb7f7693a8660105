// Pairing constraints and vest color assignment for one formation session.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::color::TeamColor;
use super::error::{FormationError, PairRejection};
use super::player::{find_player, DraftPlayer, TeamSlot};

/// Two players who must end up on the same team. Unordered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerPair {
    pub player1_id: String,
    pub player2_id: String,
}

impl PlayerPair {
    pub fn new(player1_id: &str, player2_id: &str) -> Self {
        PlayerPair {
            player1_id: player1_id.to_string(),
            player2_id: player2_id.to_string(),
        }
    }

    pub fn contains(&self, player_id: &str) -> bool {
        self.player1_id == player_id || self.player2_id == player_id
    }

    /// The other member of the pair, if `player_id` is a member.
    pub fn partner_of(&self, player_id: &str) -> Option<&str> {
        if self.player1_id == player_id {
            Some(&self.player2_id)
        } else if self.player2_id == player_id {
            Some(&self.player1_id)
        } else {
            None
        }
    }

    /// Order-independent comparison against two ids.
    pub fn matches(&self, a: &str, b: &str) -> bool {
        (self.player1_id == a && self.player2_id == b)
            || (self.player1_id == b && self.player2_id == a)
    }
}

/// Active pairs plus the two chosen vest colors.
///
/// A player belongs to at most one pair, so pairs never chain.
/// `team1_color != team2_color` holds at all times.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintSet {
    pairs: Vec<PlayerPair>,
    team1_color: TeamColor,
    team2_color: TeamColor,
}

impl Default for ConstraintSet {
    fn default() -> Self {
        ConstraintSet {
            pairs: Vec::new(),
            team1_color: TeamColor::Blue,
            team2_color: TeamColor::Red,
        }
    }
}

impl ConstraintSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an explicit color choice. Fails if both colors are equal.
    pub fn with_colors(team1: TeamColor, team2: TeamColor) -> Result<Self, FormationError> {
        if team1 == team2 {
            return Err(FormationError::DuplicateColor {
                slot: TeamSlot::Team2,
                color: team2,
            });
        }
        Ok(ConstraintSet {
            pairs: Vec::new(),
            team1_color: team1,
            team2_color: team2,
        })
    }

    pub fn pairs(&self) -> &[PlayerPair] {
        &self.pairs
    }

    /// Link two pool players so they are always placed together.
    pub fn add_pair(
        &mut self,
        pool: &[DraftPlayer],
        player_a: &str,
        player_b: &str,
    ) -> Result<&PlayerPair, FormationError> {
        let reject = |reason: PairRejection| FormationError::InvalidPair {
            player_a: player_a.to_string(),
            player_b: player_b.to_string(),
            reason,
        };

        for id in [player_a, player_b] {
            if find_player(pool, id).is_none() {
                return Err(reject(PairRejection::NotInPool {
                    player_id: id.to_string(),
                }));
            }
        }
        if player_a == player_b {
            return Err(reject(PairRejection::SamePlayer));
        }
        for id in [player_a, player_b] {
            if self.is_paired(id) {
                return Err(reject(PairRejection::AlreadyPaired {
                    player_id: id.to_string(),
                }));
            }
        }

        debug!("Paired players '{}' and '{}'", player_a, player_b);
        self.pairs.push(PlayerPair::new(player_a, player_b));
        Ok(&self.pairs[self.pairs.len() - 1])
    }

    /// Remove the pair linking `player_a` and `player_b` in either order.
    /// Returns `false` when no such pair existed.
    pub fn remove_pair(&mut self, player_a: &str, player_b: &str) -> bool {
        let before = self.pairs.len();
        self.pairs.retain(|p| !p.matches(player_a, player_b));
        before != self.pairs.len()
    }

    /// Drop every pair that references `player_id` (the player left the pool).
    pub fn remove_player(&mut self, player_id: &str) -> Vec<PlayerPair> {
        let (removed, kept): (Vec<_>, Vec<_>) =
            self.pairs.drain(..).partition(|p| p.contains(player_id));
        self.pairs = kept;
        removed
    }

    pub fn is_paired(&self, player_id: &str) -> bool {
        self.pairs.iter().any(|p| p.contains(player_id))
    }

    pub fn partner_of(&self, player_id: &str) -> Option<&str> {
        self.pairs.iter().find_map(|p| p.partner_of(player_id))
    }

    pub fn team_color(&self, slot: TeamSlot) -> TeamColor {
        match slot {
            TeamSlot::Team1 => self.team1_color,
            TeamSlot::Team2 => self.team2_color,
        }
    }

    /// `(team1, team2)` colors.
    pub fn colors(&self) -> (TeamColor, TeamColor) {
        (self.team1_color, self.team2_color)
    }

    pub fn set_team_color(&mut self, slot: TeamSlot, color: TeamColor) -> Result<(), FormationError> {
        if self.team_color(slot.other()) == color {
            return Err(FormationError::DuplicateColor { slot, color });
        }
        match slot {
            TeamSlot::Team1 => self.team1_color = color,
            TeamSlot::Team2 => self.team2_color = color,
        }
        Ok(())
    }

    /// Pool players who are not yet in any pair.
    pub fn available_for_pairing<'a>(&self, pool: &'a [DraftPlayer]) -> Vec<&'a DraftPlayer> {
        pool.iter().filter(|p| !self.is_paired(&p.id)).collect()
    }

    /// Fail with `StaleConstraint` if any pair references an id outside `pool`.
    pub fn validate_against(&self, pool: &[DraftPlayer]) -> Result<(), FormationError> {
        for pair in &self.pairs {
            for id in [&pair.player1_id, &pair.player2_id] {
                if find_player(pool, id).is_none() {
                    return Err(FormationError::StaleConstraint {
                        player_id: id.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}
