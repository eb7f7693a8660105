// Team strength scoring and balance classification.
//
// Line players carry no sub-position, so the attack/midfield/defense figures
// come from ranking line players by rating and splitting them into thirds:
// the top ceil(n/3) form attack, the next ceil(n/3) midfield, the rest defense.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use super::player::DraftPlayer;

/// Below this difference percent two teams are balanced.
pub const BALANCED_THRESHOLD_PERCENT: f64 = 5.0;
/// Above this difference percent two teams are unbalanced.
pub const UNBALANCED_THRESHOLD_PERCENT: f64 = 15.0;

/// Guards the difference-percent denominator when both teams rate 0.
const DIFFERENCE_EPSILON: f64 = 1e-9;

/// Aggregate ratings for one roster. Derived on demand, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TeamStrength {
    pub overall_rating: f64,
    pub attack_rating: f64,
    pub midfield_rating: f64,
    pub defense_rating: f64,
    pub goalkeeper_rating: f64,
    pub has_goalkeeper: bool,
}

/// Classification of the overall difference between two teams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BalanceBand {
    Balanced,
    SlightlyUnbalanced,
    Unbalanced,
}

impl BalanceBand {
    /// `< 5%` balanced, `5..=15%` slightly unbalanced, `> 15%` unbalanced.
    pub fn from_difference_percent(percent: f64) -> Self {
        if percent < BALANCED_THRESHOLD_PERCENT {
            BalanceBand::Balanced
        } else if percent <= UNBALANCED_THRESHOLD_PERCENT {
            BalanceBand::SlightlyUnbalanced
        } else {
            BalanceBand::Unbalanced
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BalanceBand::Balanced => "balanced",
            BalanceBand::SlightlyUnbalanced => "slightly unbalanced",
            BalanceBand::Unbalanced => "unbalanced",
        }
    }
}

impl fmt::Display for BalanceBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl TeamStrength {
    /// The strength of an empty roster.
    pub fn empty() -> Self {
        TeamStrength {
            overall_rating: 0.0,
            attack_rating: 0.0,
            midfield_rating: 0.0,
            defense_rating: 0.0,
            goalkeeper_rating: 0.0,
            has_goalkeeper: false,
        }
    }

    /// Percentage difference in overall rating, relative to the stronger side.
    /// Symmetric in its arguments.
    pub fn difference_percent(&self, other: &TeamStrength) -> f64 {
        let denominator = self
            .overall_rating
            .max(other.overall_rating)
            .max(DIFFERENCE_EPSILON);
        (self.overall_rating - other.overall_rating).abs() / denominator * 100.0
    }

    pub fn balance_against(&self, other: &TeamStrength) -> BalanceBand {
        BalanceBand::from_difference_percent(self.difference_percent(other))
    }
}

/// Score a roster.
pub fn compute_strength(roster: &[DraftPlayer]) -> TeamStrength {
    if roster.is_empty() {
        return TeamStrength::empty();
    }

    let (goalkeepers, mut line): (Vec<&DraftPlayer>, Vec<&DraftPlayer>) =
        roster.iter().partition(|p| p.is_goalkeeper());

    let goalkeeper_rating = mean(goalkeepers.iter().map(|p| p.overall_rating));
    let line_mean = mean(line.iter().map(|p| p.overall_rating));

    line.sort_by(|a, b| descending_rating(a, b));
    let bucket = line.len().div_ceil(3);
    let attack_end = bucket.min(line.len());
    let midfield_end = (attack_end + bucket).min(line.len());

    let bucket_mean = |players: &[&DraftPlayer]| {
        if players.is_empty() {
            line_mean
        } else {
            mean(players.iter().map(|p| p.overall_rating))
        }
    };

    TeamStrength {
        overall_rating: mean(roster.iter().map(|p| p.overall_rating)),
        attack_rating: bucket_mean(&line[..attack_end]),
        midfield_rating: bucket_mean(&line[attack_end..midfield_end]),
        defense_rating: bucket_mean(&line[midfield_end..]),
        goalkeeper_rating,
        has_goalkeeper: !goalkeepers.is_empty(),
    }
}

/// Ordering used wherever players are ranked: rating descending, then id.
pub(crate) fn descending_rating(a: &DraftPlayer, b: &DraftPlayer) -> Ordering {
    b.overall_rating
        .partial_cmp(&a.overall_rating)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.id.cmp(&b.id))
}

/// Arithmetic mean, 0.0 for an empty sequence.
fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formation::player::Position;

    fn line(id: &str, rating: f64) -> DraftPlayer {
        DraftPlayer::new(id, id, Position::Line, rating)
    }

    fn keeper(id: &str, rating: f64) -> DraftPlayer {
        DraftPlayer::new(id, id, Position::Goalkeeper, rating)
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn empty_roster_scores_zero() {
        let s = compute_strength(&[]);
        assert_eq!(s, TeamStrength::empty());
        assert!(!s.has_goalkeeper);
    }

    #[test]
    fn overall_includes_goalkeepers() {
        let roster = vec![keeper("g", 2.0), line("a", 4.0), line("b", 3.0)];
        let s = compute_strength(&roster);
        assert!(approx(s.overall_rating, 3.0));
        assert!(approx(s.goalkeeper_rating, 2.0));
        assert!(s.has_goalkeeper);
    }

    #[test]
    fn thirds_bucketing_for_six_line_players() {
        let roster: Vec<DraftPlayer> = [1.0, 5.0, 2.0, 4.0, 3.0, 3.0]
            .iter()
            .enumerate()
            .map(|(i, r)| line(&format!("p{i}"), *r))
            .collect();
        let s = compute_strength(&roster);
        // Sorted: 5,4 | 3,3 | 2,1
        assert!(approx(s.attack_rating, 4.5));
        assert!(approx(s.midfield_rating, 3.0));
        assert!(approx(s.defense_rating, 1.5));
        assert!(approx(s.goalkeeper_rating, 0.0));
        assert!(!s.has_goalkeeper);
    }

    #[test]
    fn thirds_bucketing_for_seven_line_players() {
        let roster: Vec<DraftPlayer> = [5.0, 4.0, 4.0, 3.0, 2.0, 2.0, 1.0]
            .iter()
            .enumerate()
            .map(|(i, r)| line(&format!("p{i}"), *r))
            .collect();
        let s = compute_strength(&roster);
        // ceil(7/3) = 3: 5,4,4 | 3,2,2 | 1
        assert!(approx(s.attack_rating, 13.0 / 3.0));
        assert!(approx(s.midfield_rating, 7.0 / 3.0));
        assert!(approx(s.defense_rating, 1.0));
    }

    #[test]
    fn empty_buckets_fall_back_to_line_mean() {
        let s = compute_strength(&[line("a", 4.0), line("b", 2.0)]);
        assert!(approx(s.attack_rating, 4.0));
        assert!(approx(s.midfield_rating, 2.0));
        assert!(approx(s.defense_rating, 3.0));

        let s = compute_strength(&[line("a", 4.0)]);
        assert!(approx(s.attack_rating, 4.0));
        assert!(approx(s.midfield_rating, 4.0));
        assert!(approx(s.defense_rating, 4.0));
    }

    #[test]
    fn goalkeeper_only_roster_has_zero_line_ratings() {
        let s = compute_strength(&[keeper("g", 3.5)]);
        assert!(approx(s.attack_rating, 0.0));
        assert!(approx(s.midfield_rating, 0.0));
        assert!(approx(s.defense_rating, 0.0));
        assert!(approx(s.overall_rating, 3.5));
    }

    #[test]
    fn difference_percent_is_symmetric() {
        let a = compute_strength(&[line("a", 4.0), line("b", 3.0)]);
        let b = compute_strength(&[line("c", 3.0), line("d", 3.0)]);
        assert!(approx(a.difference_percent(&b), b.difference_percent(&a)));
        // |3.5 - 3.0| / 3.5 * 100
        assert!(approx(a.difference_percent(&b), 0.5 / 3.5 * 100.0));
    }

    #[test]
    fn difference_percent_of_two_empty_teams_is_zero() {
        let e = TeamStrength::empty();
        assert!(approx(e.difference_percent(&e), 0.0));
        assert_eq!(e.balance_against(&e), BalanceBand::Balanced);
    }

    #[test]
    fn balance_band_boundaries() {
        assert_eq!(BalanceBand::from_difference_percent(0.0), BalanceBand::Balanced);
        assert_eq!(BalanceBand::from_difference_percent(4.99), BalanceBand::Balanced);
        assert_eq!(
            BalanceBand::from_difference_percent(5.0),
            BalanceBand::SlightlyUnbalanced
        );
        assert_eq!(
            BalanceBand::from_difference_percent(15.0),
            BalanceBand::SlightlyUnbalanced
        );
        assert_eq!(BalanceBand::from_difference_percent(15.01), BalanceBand::Unbalanced);
    }
}
