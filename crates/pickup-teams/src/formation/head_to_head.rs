// Head-to-head history between the two sides, supplied by the match history
// collaborator. Read-only here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::player::TeamSlot;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadToHeadMatch {
    pub date: DateTime<Utc>,
    pub team1_score: u32,
    pub team2_score: u32,
}

impl HeadToHeadMatch {
    /// `None` for a draw.
    pub fn winner(&self) -> Option<TeamSlot> {
        match self.team1_score.cmp(&self.team2_score) {
            std::cmp::Ordering::Greater => Some(TeamSlot::Team1),
            std::cmp::Ordering::Less => Some(TeamSlot::Team2),
            std::cmp::Ordering::Equal => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HeadToHeadHistory {
    pub team1_wins: u32,
    pub team2_wins: u32,
    pub draws: u32,
    /// Most recent first.
    #[serde(default)]
    pub last_matches: Vec<HeadToHeadMatch>,
}

impl HeadToHeadHistory {
    pub fn total_matches(&self) -> u32 {
        self.team1_wins + self.team2_wins + self.draws
    }

    pub fn wins(&self, slot: TeamSlot) -> u32 {
        match slot {
            TeamSlot::Team1 => self.team1_wins,
            TeamSlot::Team2 => self.team2_wins,
        }
    }

    /// Share of all matches won by `slot`, in percent. 0 with no history.
    pub fn win_percent(&self, slot: TeamSlot) -> f64 {
        let total = self.total_matches();
        if total == 0 {
            return 0.0;
        }
        f64::from(self.wins(slot)) / f64::from(total) * 100.0
    }

    /// Compact record such as `"3-1-2"` (team 1 wins, draws, team 2 wins).
    pub fn summary(&self) -> String {
        format!("{}-{}-{}", self.team1_wins, self.draws, self.team2_wins)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn totals_and_percentages() {
        let history = HeadToHeadHistory {
            team1_wins: 3,
            team2_wins: 1,
            draws: 0,
            last_matches: Vec::new(),
        };
        assert_eq!(history.total_matches(), 4);
        assert_eq!(history.win_percent(TeamSlot::Team1), 75.0);
        assert_eq!(history.summary(), "3-0-1");
        assert_eq!(HeadToHeadHistory::default().win_percent(TeamSlot::Team2), 0.0);
    }

    #[test]
    fn match_winner() {
        let m = |a, b| HeadToHeadMatch {
            date: Utc::now(),
            team1_score: a,
            team2_score: b,
        };
        assert_eq!(m(2, 1).winner(), Some(TeamSlot::Team1));
        assert_eq!(m(0, 3).winner(), Some(TeamSlot::Team2));
        assert_eq!(m(1, 1).winner(), None);
    }
}
