// Manual mode: the organizer places players on teams directly.

use tracing::debug;

use super::constraints::ConstraintSet;
use super::error::FormationError;
use super::player::{find_player, DraftPlayer, TeamSlot};
use super::saved::SavedFormation;

/// Rosters built by hand from a pool. Each pool player is on at most one team.
#[derive(Debug, Clone, PartialEq)]
pub struct ManualFormation {
    pool: Vec<DraftPlayer>,
    team1: Vec<String>,
    team2: Vec<String>,
}

impl ManualFormation {
    pub fn new(pool: Vec<DraftPlayer>) -> Self {
        ManualFormation {
            pool,
            team1: Vec::new(),
            team2: Vec::new(),
        }
    }

    /// Seed rosters from a saved formation. Ids that are no longer in the
    /// pool are skipped and returned.
    pub fn from_saved(pool: Vec<DraftPlayer>, saved: &SavedFormation) -> (Self, Vec<String>) {
        let mut manual = ManualFormation::new(pool);
        let mut dropped = Vec::new();

        for (slot, ids) in [
            (TeamSlot::Team1, &saved.team1_player_ids),
            (TeamSlot::Team2, &saved.team2_player_ids),
        ] {
            for id in ids {
                if find_player(&manual.pool, id).is_some() && manual.slot_of(id).is_none() {
                    manual.roster_ids_mut(slot).push(id.clone());
                } else {
                    dropped.push(id.clone());
                }
            }
        }

        if !dropped.is_empty() {
            debug!(
                "Formation '{}': {} saved players are not in the pool",
                saved.name,
                dropped.len()
            );
        }
        (manual, dropped)
    }

    pub fn pool(&self) -> &[DraftPlayer] {
        &self.pool
    }

    /// Which team `player_id` is on, if any.
    pub fn slot_of(&self, player_id: &str) -> Option<TeamSlot> {
        if self.team1.iter().any(|id| id == player_id) {
            Some(TeamSlot::Team1)
        } else if self.team2.iter().any(|id| id == player_id) {
            Some(TeamSlot::Team2)
        } else {
            None
        }
    }

    /// Put a player on `slot`, taking them off the other team if needed. A
    /// paired player brings their partner along. Returns every id that moved.
    pub fn assign(
        &mut self,
        player_id: &str,
        slot: TeamSlot,
        constraints: &ConstraintSet,
    ) -> Result<Vec<String>, FormationError> {
        let group = self.group_of(player_id, constraints)?;
        let mut moved = Vec::new();
        for id in group {
            if self.slot_of(&id) == Some(slot) {
                continue;
            }
            self.detach(&id);
            self.roster_ids_mut(slot).push(id.clone());
            moved.push(id);
        }
        debug!("Assigned {:?} to {}", moved, slot);
        Ok(moved)
    }

    /// Send a player (and partner) to the team they are not on. Unassigned
    /// players go to team 1.
    pub fn move_player(
        &mut self,
        player_id: &str,
        constraints: &ConstraintSet,
    ) -> Result<Vec<String>, FormationError> {
        let target = self
            .slot_of(player_id)
            .map_or(TeamSlot::Team1, |slot| slot.other());
        self.assign(player_id, target, constraints)
    }

    /// Take a player (and partner) off their team.
    pub fn unassign(
        &mut self,
        player_id: &str,
        constraints: &ConstraintSet,
    ) -> Result<Vec<String>, FormationError> {
        let group = self.group_of(player_id, constraints)?;
        Ok(group.into_iter().filter(|id| self.detach(id)).collect())
    }

    /// Drop a player who left the pool.
    pub fn remove_from_pool(&mut self, player_id: &str) -> Option<DraftPlayer> {
        self.detach(player_id);
        let idx = self.pool.iter().position(|p| p.id == player_id)?;
        Some(self.pool.remove(idx))
    }

    pub fn roster(&self, slot: TeamSlot) -> Vec<DraftPlayer> {
        let ids = match slot {
            TeamSlot::Team1 => &self.team1,
            TeamSlot::Team2 => &self.team2,
        };
        ids.iter()
            .filter_map(|id| find_player(&self.pool, id).cloned())
            .collect()
    }

    pub fn unassigned(&self) -> Vec<&DraftPlayer> {
        self.pool
            .iter()
            .filter(|p| self.slot_of(&p.id).is_none())
            .collect()
    }

    /// Every pool player is on a team.
    pub fn is_complete(&self) -> bool {
        self.team1.len() + self.team2.len() == self.pool.len()
    }

    /// The player plus their partner, when the partner is in the pool.
    fn group_of(&self, player_id: &str, constraints: &ConstraintSet) -> Result<Vec<String>, FormationError> {
        if find_player(&self.pool, player_id).is_none() {
            return Err(FormationError::UnknownPlayer {
                player_id: player_id.to_string(),
            });
        }
        let mut group = vec![player_id.to_string()];
        if let Some(partner) = constraints.partner_of(player_id) {
            if find_player(&self.pool, partner).is_some() {
                group.push(partner.to_string());
            }
        }
        Ok(group)
    }

    fn roster_ids_mut(&mut self, slot: TeamSlot) -> &mut Vec<String> {
        match slot {
            TeamSlot::Team1 => &mut self.team1,
            TeamSlot::Team2 => &mut self.team2,
        }
    }

    /// Remove `player_id` from whichever team has them.
    fn detach(&mut self, player_id: &str) -> bool {
        let before = self.team1.len() + self.team2.len();
        self.team1.retain(|id| id != player_id);
        self.team2.retain(|id| id != player_id);
        before != self.team1.len() + self.team2.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formation::color::TeamColor;
    use crate::formation::player::Position;
    use chrono::Utc;

    fn pool() -> Vec<DraftPlayer> {
        ["a", "b", "c", "d"]
            .iter()
            .map(|id| DraftPlayer::new(id, id, Position::Line, 3.0))
            .collect()
    }

    fn ids(roster: &[DraftPlayer]) -> Vec<&str> {
        roster.iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn assign_moves_player_between_teams() {
        let mut manual = ManualFormation::new(pool());
        let constraints = ConstraintSet::new();
        manual.assign("a", TeamSlot::Team1, &constraints).unwrap();
        assert_eq!(manual.slot_of("a"), Some(TeamSlot::Team1));

        manual.assign("a", TeamSlot::Team2, &constraints).unwrap();
        assert_eq!(manual.slot_of("a"), Some(TeamSlot::Team2));
        assert!(manual.roster(TeamSlot::Team1).is_empty());
    }

    #[test]
    fn paired_players_move_together() {
        let pool = pool();
        let mut constraints = ConstraintSet::new();
        constraints.add_pair(&pool, "a", "c").unwrap();
        let mut manual = ManualFormation::new(pool);

        let moved = manual.assign("a", TeamSlot::Team2, &constraints).unwrap();
        assert_eq!(moved, vec!["a".to_string(), "c".to_string()]);
        assert_eq!(ids(&manual.roster(TeamSlot::Team2)), vec!["a", "c"]);

        let moved = manual.move_player("c", &constraints).unwrap();
        assert_eq!(moved.len(), 2);
        assert_eq!(ids(&manual.roster(TeamSlot::Team1)), vec!["c", "a"]);

        manual.unassign("a", &constraints).unwrap();
        assert_eq!(manual.unassigned().len(), 4);
    }

    #[test]
    fn unknown_player_is_rejected() {
        let mut manual = ManualFormation::new(pool());
        assert!(matches!(
            manual.assign("zz", TeamSlot::Team1, &ConstraintSet::new()),
            Err(FormationError::UnknownPlayer { .. })
        ));
    }

    #[test]
    fn completeness_tracks_assignment() {
        let mut manual = ManualFormation::new(pool());
        let constraints = ConstraintSet::new();
        for (id, slot) in [("a", TeamSlot::Team1), ("b", TeamSlot::Team2), ("c", TeamSlot::Team1)] {
            manual.assign(id, slot, &constraints).unwrap();
        }
        assert!(!manual.is_complete());
        manual.move_player("d", &constraints).unwrap();
        assert!(manual.is_complete());
    }

    #[test]
    fn from_saved_drops_missing_players() {
        let saved = SavedFormation {
            id: 1,
            name: "Last week".into(),
            team1_player_ids: vec!["a".into(), "gone".into()],
            team2_player_ids: vec!["b".into(), "c".into()],
            team1_color: TeamColor::Blue,
            team2_color: TeamColor::Red,
            times_used: 3,
            last_used_at: None,
            created_at: Utc::now(),
        };
        let (manual, dropped) = ManualFormation::from_saved(pool(), &saved);
        assert_eq!(dropped, vec!["gone".to_string()]);
        assert_eq!(ids(&manual.roster(TeamSlot::Team1)), vec!["a"]);
        assert_eq!(ids(&manual.roster(TeamSlot::Team2)), vec!["b", "c"]);
        assert_eq!(ids(&manual.unassigned().into_iter().cloned().collect::<Vec<_>>()), vec!["d"]);
    }

    #[test]
    fn remove_from_pool_clears_assignment() {
        let mut manual = ManualFormation::new(pool());
        manual.assign("b", TeamSlot::Team2, &ConstraintSet::new()).unwrap();
        let removed = manual.remove_from_pool("b").unwrap();
        assert_eq!(removed.id, "b");
        assert_eq!(manual.slot_of("b"), None);
        assert_eq!(manual.pool().len(), 3);
        assert!(manual.remove_from_pool("b").is_none());
    }
}
