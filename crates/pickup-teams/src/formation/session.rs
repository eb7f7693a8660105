// One formation-building workflow: a pool, its constraints, and the three
// ways of turning them into two scored rosters.

use std::time::Duration;

use rand::Rng;
use serde::Serialize;
use tracing::info;

use super::color::TeamColor;
use super::constraints::{ConstraintSet, PlayerPair};
use super::draft::{CompletedDraft, SnakeDraft};
use super::error::{DraftError, FormationError, NoGoalkeeperWarning};
use super::head_to_head::HeadToHeadHistory;
use super::manual::ManualFormation;
use super::partition::{partition, shuffle_partition, Partition, PartitionOptions};
use super::player::{DraftPlayer, TeamSlot};
use super::saved::SavedFormation;
use super::strength::{compute_strength, BalanceBand, TeamStrength};
use super::suggestions::{rotation_suggestions, SwapSuggestion};

/// Design default for the per-pick draft timer.
pub const DEFAULT_PICK_TIMER: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormationSettings {
    pub pick_timer: Duration,
    /// Minimum goalkeepers per side. 0 disables the goalkeeper fix-up and
    /// its warnings.
    pub goalkeepers_per_team: usize,
}

impl Default for FormationSettings {
    fn default() -> Self {
        FormationSettings {
            pick_timer: DEFAULT_PICK_TIMER,
            goalkeepers_per_team: 1,
        }
    }
}

/// Two rosters with everything the presentation layer shows about them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormationResult {
    pub team1: Vec<DraftPlayer>,
    pub team2: Vec<DraftPlayer>,
    pub team1_strength: TeamStrength,
    pub team2_strength: TeamStrength,
    pub difference_percent: f64,
    pub band: BalanceBand,
    pub team1_color: TeamColor,
    pub team2_color: TeamColor,
    #[serde(skip)]
    pub warnings: Vec<NoGoalkeeperWarning>,
    pub suggestions: Vec<SwapSuggestion>,
    /// Every pair with both members placed shares a team.
    pub pairs_respected: bool,
    pub team1_goalkeepers: usize,
    pub team2_goalkeepers: usize,
    pub head_to_head: Option<HeadToHeadHistory>,
}

impl FormationResult {
    pub fn roster(&self, slot: TeamSlot) -> &[DraftPlayer] {
        match slot {
            TeamSlot::Team1 => &self.team1,
            TeamSlot::Team2 => &self.team2,
        }
    }

    pub fn strength(&self, slot: TeamSlot) -> &TeamStrength {
        match slot {
            TeamSlot::Team1 => &self.team1_strength,
            TeamSlot::Team2 => &self.team2_strength,
        }
    }

    pub fn player_ids(&self, slot: TeamSlot) -> Vec<String> {
        self.roster(slot).iter().map(|p| p.id.clone()).collect()
    }

    pub fn colors(&self) -> (TeamColor, TeamColor) {
        (self.team1_color, self.team2_color)
    }
}

/// An explicit session object: no state is shared between sessions.
#[derive(Debug, Clone)]
pub struct FormationSession {
    pool: Vec<DraftPlayer>,
    constraints: ConstraintSet,
    settings: FormationSettings,
    head_to_head: Option<HeadToHeadHistory>,
}

impl FormationSession {
    pub fn new(pool: Vec<DraftPlayer>, settings: FormationSettings) -> Self {
        FormationSession {
            pool,
            constraints: ConstraintSet::new(),
            settings,
            head_to_head: None,
        }
    }

    pub fn pool(&self) -> &[DraftPlayer] {
        &self.pool
    }

    pub fn constraints(&self) -> &ConstraintSet {
        &self.constraints
    }

    pub fn settings(&self) -> &FormationSettings {
        &self.settings
    }

    pub fn set_head_to_head(&mut self, history: Option<HeadToHeadHistory>) {
        self.head_to_head = history;
    }

    pub fn add_pair(&mut self, player_a: &str, player_b: &str) -> Result<&PlayerPair, FormationError> {
        self.constraints.add_pair(&self.pool, player_a, player_b)
    }

    pub fn remove_pair(&mut self, player_a: &str, player_b: &str) -> bool {
        self.constraints.remove_pair(player_a, player_b)
    }

    pub fn set_team_color(&mut self, slot: TeamSlot, color: TeamColor) -> Result<(), FormationError> {
        self.constraints.set_team_color(slot, color)
    }

    pub fn available_for_pairing(&self) -> Vec<&DraftPlayer> {
        self.constraints.available_for_pairing(&self.pool)
    }

    /// Add a late arrival. Returns `false` if the id is already in the pool.
    pub fn add_player(&mut self, player: DraftPlayer) -> bool {
        if self.pool.iter().any(|p| p.id == player.id) {
            return false;
        }
        self.pool.push(player);
        true
    }

    /// Drop a player who left, pruning any pair that referenced them.
    pub fn remove_player(&mut self, player_id: &str) -> Option<(DraftPlayer, Vec<PlayerPair>)> {
        let idx = self.pool.iter().position(|p| p.id == player_id)?;
        let player = self.pool.remove(idx);
        let pruned = self.constraints.remove_player(player_id);
        info!(
            "Removed '{}' from the pool ({} pairs pruned)",
            player.name,
            pruned.len()
        );
        Some((player, pruned))
    }

    fn partition_options(&self) -> PartitionOptions {
        PartitionOptions {
            team1_size: None,
            goalkeepers_per_team: self.settings.goalkeepers_per_team,
        }
    }

    /// Deterministic balanced split.
    pub fn balance(&self) -> Result<FormationResult, FormationError> {
        let split = partition(&self.pool, &self.constraints, &self.partition_options())?;
        Ok(self.result_from_partition(split))
    }

    /// Balanced split with ties shuffled.
    pub fn shuffle<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<FormationResult, FormationError> {
        let split = shuffle_partition(&self.pool, &self.constraints, &self.partition_options(), rng)?;
        Ok(self.result_from_partition(split))
    }

    /// A fresh snake draft over the current pool.
    pub fn start_draft(&self) -> Result<SnakeDraft, DraftError> {
        SnakeDraft::new(self.pool.clone(), self.settings.pick_timer)
    }

    pub fn manual(&self) -> ManualFormation {
        ManualFormation::new(self.pool.clone())
    }

    /// Manual mode seeded from a saved formation; returns the ids that were
    /// dropped because they are not in today's pool. The saved colors are
    /// adopted when they differ.
    pub fn manual_from_saved(&mut self, saved: &SavedFormation) -> Result<(ManualFormation, Vec<String>), FormationError> {
        self.constraints = {
            let mut next = ConstraintSet::with_colors(saved.team1_color, saved.team2_color)?;
            for pair in self.constraints.pairs() {
                next.add_pair(&self.pool, &pair.player1_id, &pair.player2_id)?;
            }
            next
        };
        Ok(ManualFormation::from_saved(self.pool.clone(), saved))
    }

    pub fn score_draft(&self, draft: &CompletedDraft) -> FormationResult {
        let warnings = keeper_warnings(&draft.team1, &draft.team2, self.settings.goalkeepers_per_team);
        self.score(draft.team1.clone(), draft.team2.clone(), warnings)
    }

    pub fn score_manual(&self, manual: &ManualFormation) -> FormationResult {
        let team1 = manual.roster(TeamSlot::Team1);
        let team2 = manual.roster(TeamSlot::Team2);
        let warnings = keeper_warnings(&team1, &team2, self.settings.goalkeepers_per_team);
        self.score(team1, team2, warnings)
    }

    fn result_from_partition(&self, split: Partition) -> FormationResult {
        self.score(split.team1, split.team2, split.warnings)
    }

    fn score(
        &self,
        team1: Vec<DraftPlayer>,
        team2: Vec<DraftPlayer>,
        warnings: Vec<NoGoalkeeperWarning>,
    ) -> FormationResult {
        let team1_strength = compute_strength(&team1);
        let team2_strength = compute_strength(&team2);
        let difference_percent = team1_strength.difference_percent(&team2_strength);
        let (team1_color, team2_color) = self.constraints.colors();
        let count_keepers = |team: &[DraftPlayer]| team.iter().filter(|p| p.is_goalkeeper()).count();

        FormationResult {
            suggestions: rotation_suggestions(&team1, &team2, &self.constraints),
            pairs_respected: pairs_respected(&team1, &team2, &self.constraints),
            team1_goalkeepers: count_keepers(&team1),
            team2_goalkeepers: count_keepers(&team2),
            team1_strength,
            team2_strength,
            difference_percent,
            band: BalanceBand::from_difference_percent(difference_percent),
            team1_color,
            team2_color,
            warnings,
            head_to_head: self.head_to_head.clone(),
            team1,
            team2,
        }
    }
}

/// Pairs whose members were both placed must share a team.
pub fn pairs_respected(team1: &[DraftPlayer], team2: &[DraftPlayer], constraints: &ConstraintSet) -> bool {
    let slot_of = |id: &str| {
        if team1.iter().any(|p| p.id == id) {
            Some(TeamSlot::Team1)
        } else if team2.iter().any(|p| p.id == id) {
            Some(TeamSlot::Team2)
        } else {
            None
        }
    };
    constraints
        .pairs()
        .iter()
        .all(|pair| match (slot_of(&pair.player1_id), slot_of(&pair.player2_id)) {
            (Some(a), Some(b)) => a == b,
            _ => true,
        })
}

fn keeper_warnings(
    team1: &[DraftPlayer],
    team2: &[DraftPlayer],
    goalkeepers_per_team: usize,
) -> Vec<NoGoalkeeperWarning> {
    [(TeamSlot::Team1, team1), (TeamSlot::Team2, team2)]
        .into_iter()
        .filter(|(_, team)| !team.is_empty())
        .map(|(slot, team)| (slot, team.iter().filter(|p| p.is_goalkeeper()).count()))
        .filter(|&(_, goalkeepers)| goalkeepers < goalkeepers_per_team)
        .map(|(slot, goalkeepers)| NoGoalkeeperWarning {
            slot,
            goalkeepers,
            required: goalkeepers_per_team,
            blocked_by_pair: false,
        })
        .collect()
}
