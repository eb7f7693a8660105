// Rotation suggestions: like-for-like swaps that vary the teams without
// hurting balance much.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::constraints::ConstraintSet;
use super::player::DraftPlayer;
use super::strength::compute_strength;

/// At most this many suggestions are offered per formation.
pub const MAX_SUGGESTIONS: usize = 3;
/// Two players are interchangeable when their ratings differ by less than this.
pub const SIMILAR_RATING_GAP: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapSuggestion {
    pub team1_player_id: String,
    pub team1_player_name: String,
    pub team2_player_id: String,
    pub team2_player_name: String,
    /// Absolute rating difference between the two players.
    pub rating_gap: f64,
    /// Change in difference percent if the swap is made. Negative improves balance.
    pub difference_change_percent: f64,
}

/// Suggest swaps between unpaired line players of similar rating, closest
/// ratings first.
pub fn rotation_suggestions(
    team1: &[DraftPlayer],
    team2: &[DraftPlayer],
    constraints: &ConstraintSet,
) -> Vec<SwapSuggestion> {
    let swappable = |team: &[DraftPlayer]| -> Vec<usize> {
        team.iter()
            .enumerate()
            .filter(|(_, p)| !p.is_goalkeeper() && !constraints.is_paired(&p.id))
            .map(|(idx, _)| idx)
            .collect()
    };
    let from_team1 = swappable(team1);
    let from_team2 = swappable(team2);

    let mut candidates: Vec<(usize, usize, f64)> = Vec::new();
    for &i in &from_team1 {
        for &j in &from_team2 {
            let gap = (team1[i].overall_rating - team2[j].overall_rating).abs();
            if gap < SIMILAR_RATING_GAP {
                candidates.push((i, j, gap));
            }
        }
    }
    candidates.sort_by(|a, b| a.2.partial_cmp(&b.2).unwrap_or(Ordering::Equal));

    if candidates.is_empty() {
        return Vec::new();
    }

    let current = compute_strength(team1).difference_percent(&compute_strength(team2));

    candidates
        .into_iter()
        .take(MAX_SUGGESTIONS)
        .map(|(i, j, gap)| {
            let mut swapped1 = team1.to_vec();
            let mut swapped2 = team2.to_vec();
            std::mem::swap(&mut swapped1[i], &mut swapped2[j]);
            let after = compute_strength(&swapped1).difference_percent(&compute_strength(&swapped2));

            SwapSuggestion {
                team1_player_id: team1[i].id.clone(),
                team1_player_name: team1[i].name.clone(),
                team2_player_id: team2[j].id.clone(),
                team2_player_name: team2[j].name.clone(),
                rating_gap: gap,
                difference_change_percent: after - current,
            }
        })
        .collect()
}
