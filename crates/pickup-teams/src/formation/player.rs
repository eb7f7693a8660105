// Player and team-slot value types shared by every formation mode.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lowest rating a player can carry.
pub const MIN_RATING: f64 = 0.0;
/// Highest rating a player can carry.
pub const MAX_RATING: f64 = 5.0;

/// Where a player lines up. Line players are not tagged by sub-position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Position {
    Goalkeeper,
    Line,
}

impl Position {
    /// Parse a position string as it appears in attendance exports.
    ///
    /// Accepts "GOALKEEPER"/"GK"/"GOLEIRO" and "LINE"/"FIELD"/"LINHA",
    /// case-insensitively.
    pub fn from_str_pos(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "GOALKEEPER" | "GK" | "GOLEIRO" => Some(Position::Goalkeeper),
            "LINE" | "FIELD" | "LINHA" => Some(Position::Line),
            _ => None,
        }
    }

    pub fn display_str(&self) -> &'static str {
        match self {
            Position::Goalkeeper => "GK",
            Position::Line => "LINE",
        }
    }

    pub fn is_goalkeeper(&self) -> bool {
        matches!(self, Position::Goalkeeper)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_str())
    }
}

/// A player signed up for a match. Immutable once it enters a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftPlayer {
    /// Stable unique identifier from the roster/attendance system.
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub photo_url: Option<String>,
    pub position: Position,
    /// Overall rating, clamped to 0.0..=5.0.
    pub overall_rating: f64,
}

impl DraftPlayer {
    /// Build a player, clamping the rating into the valid range.
    pub fn new(id: &str, name: &str, position: Position, overall_rating: f64) -> Self {
        DraftPlayer {
            id: id.to_string(),
            name: name.to_string(),
            photo_url: None,
            position,
            overall_rating: clamp_rating(overall_rating),
        }
    }

    pub fn with_photo(mut self, url: &str) -> Self {
        self.photo_url = Some(url.to_string());
        self
    }

    pub fn is_goalkeeper(&self) -> bool {
        self.position.is_goalkeeper()
    }
}

/// Clamp a rating into `MIN_RATING..=MAX_RATING`. NaN becomes the minimum.
pub fn clamp_rating(rating: f64) -> f64 {
    if rating.is_nan() {
        return MIN_RATING;
    }
    rating.clamp(MIN_RATING, MAX_RATING)
}

/// One of the two sides being formed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TeamSlot {
    Team1,
    Team2,
}

impl TeamSlot {
    pub fn other(&self) -> TeamSlot {
        match self {
            TeamSlot::Team1 => TeamSlot::Team2,
            TeamSlot::Team2 => TeamSlot::Team1,
        }
    }

    /// Zero-based index, handy for `[T; 2]` storage.
    pub fn index(&self) -> usize {
        match self {
            TeamSlot::Team1 => 0,
            TeamSlot::Team2 => 1,
        }
    }
}

impl fmt::Display for TeamSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TeamSlot::Team1 => write!(f, "Team 1"),
            TeamSlot::Team2 => write!(f, "Team 2"),
        }
    }
}

/// Find a player by id in a roster or pool.
pub fn find_player<'a>(players: &'a [DraftPlayer], id: &str) -> Option<&'a DraftPlayer> {
    players.iter().find(|p| p.id == id)
}
