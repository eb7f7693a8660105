// Vest colors selectable for the two sides.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TeamColor {
    Red,
    Blue,
    Green,
    Yellow,
    Orange,
    Purple,
    Black,
    White,
    Pink,
    Cyan,
}

impl TeamColor {
    /// Every selectable color, in picker order.
    pub const ALL: [TeamColor; 10] = [
        TeamColor::Red,
        TeamColor::Blue,
        TeamColor::Green,
        TeamColor::Yellow,
        TeamColor::Orange,
        TeamColor::Purple,
        TeamColor::Black,
        TeamColor::White,
        TeamColor::Pink,
        TeamColor::Cyan,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            TeamColor::Red => "Red",
            TeamColor::Blue => "Blue",
            TeamColor::Green => "Green",
            TeamColor::Yellow => "Yellow",
            TeamColor::Orange => "Orange",
            TeamColor::Purple => "Purple",
            TeamColor::Black => "Black",
            TeamColor::White => "White",
            TeamColor::Pink => "Pink",
            TeamColor::Cyan => "Cyan",
        }
    }

    /// 24-bit RGB value (0xRRGGBB).
    pub fn rgb(&self) -> u32 {
        match self {
            TeamColor::Red => 0xF44336,
            TeamColor::Blue => 0x2196F3,
            TeamColor::Green => 0x4CAF50,
            TeamColor::Yellow => 0xFFEB3B,
            TeamColor::Orange => 0xFF9800,
            TeamColor::Purple => 0x9C27B0,
            TeamColor::Black => 0x212121,
            TeamColor::White => 0xFFFFFF,
            TeamColor::Pink => 0xE91E63,
            TeamColor::Cyan => 0x00BCD4,
        }
    }

    /// `#RRGGBB` form of [`TeamColor::rgb`].
    pub fn hex(&self) -> String {
        format!("#{:06X}", self.rgb())
    }

    /// Stable key used in the persisted formation record.
    pub fn storage_key(&self) -> &'static str {
        match self {
            TeamColor::Red => "RED",
            TeamColor::Blue => "BLUE",
            TeamColor::Green => "GREEN",
            TeamColor::Yellow => "YELLOW",
            TeamColor::Orange => "ORANGE",
            TeamColor::Purple => "PURPLE",
            TeamColor::Black => "BLACK",
            TeamColor::White => "WHITE",
            TeamColor::Pink => "PINK",
            TeamColor::Cyan => "CYAN",
        }
    }

    pub fn from_storage_key(key: &str) -> Option<Self> {
        TeamColor::ALL
            .into_iter()
            .find(|c| c.storage_key().eq_ignore_ascii_case(key.trim()))
    }
}

impl fmt::Display for TeamColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
