// Error taxonomy for team formation.

use thiserror::Error;

use super::color::TeamColor;
use super::player::TeamSlot;

/// Errors surfaced by the constraint set, the partition engine and the
/// formation repository adapter.
#[derive(Debug, Error)]
pub enum FormationError {
    #[error("invalid pair ({player_a}, {player_b}): {reason}")]
    InvalidPair {
        player_a: String,
        player_b: String,
        reason: PairRejection,
    },

    #[error("{slot} cannot wear {color}: the other team already does")]
    DuplicateColor { slot: TeamSlot, color: TeamColor },

    #[error("at least 2 players are needed to form teams, found {found}")]
    InsufficientPlayers { found: usize },

    #[error("pairing constraint references player `{player_id}` who is no longer in the pool")]
    StaleConstraint { player_id: String },

    #[error("a formation named `{name}` already exists")]
    DuplicateName { name: String },

    #[error("invalid formation name: {message}")]
    InvalidName { message: String },

    #[error("invalid formation: {message}")]
    InvalidFormation { message: String },

    #[error("player `{player_id}` is not in the pool")]
    UnknownPlayer { player_id: String },

    #[error(transparent)]
    Storage(StorageError),
}

impl From<StorageError> for FormationError {
    /// Name clashes detected by the store surface as `DuplicateName`;
    /// everything else passes through unchanged.
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::DuplicateName { name } => FormationError::DuplicateName { name },
            other => FormationError::Storage(other),
        }
    }
}

/// Why `add_pair` refused a pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PairRejection {
    /// One of the ids is not in the current pool.
    NotInPool { player_id: String },
    /// Both ids are the same player.
    SamePlayer,
    /// One of the players already has a pairing partner.
    AlreadyPaired { player_id: String },
}

impl std::fmt::Display for PairRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PairRejection::NotInPool { player_id } => {
                write!(f, "player `{player_id}` is not in the pool")
            }
            PairRejection::SamePlayer => write!(f, "a player cannot be paired with themselves"),
            PairRejection::AlreadyPaired { player_id } => {
                write!(f, "player `{player_id}` is already in a pair")
            }
        }
    }
}

/// Failures of the storage collaborator, passed through unchanged.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("formation {id} not found")]
    NotFound { id: i64 },

    #[error("a formation named `{name}` already exists")]
    DuplicateName { name: String },

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("failed to (de)serialize formation data: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("corrupt formation record {id}: {message}")]
    Corrupt { id: i64, message: String },
}

/// Misuse of the snake draft state machine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DraftError {
    #[error("captain `{player_id}` is not in the pool")]
    CaptainNotInPool { player_id: String },

    #[error("the two captains must be different players")]
    SameCaptain,

    #[error("cannot {action} while the draft is {phase}")]
    WrongPhase {
        action: &'static str,
        phase: &'static str,
    },

    #[error("player `{player_id}` is not available to pick")]
    PlayerUnavailable { player_id: String },

    #[error("pick {pick_number} has already been made")]
    PickAlreadyApplied { pick_number: usize },

    #[error("pick {pick_number} is not open yet (current pick is {current})")]
    PickNotOpen { pick_number: usize, current: usize },

    #[error("pick {pick_number} still has {remaining_ms} ms on the clock")]
    TimerRunning { pick_number: usize, remaining_ms: u64 },

    #[error("the pick timer must be longer than zero")]
    InvalidTimer,
}

/// A team fields fewer goalkeepers than the configured minimum. Advisory only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoGoalkeeperWarning {
    pub slot: TeamSlot,
    /// Goalkeepers the team ended up with.
    pub goalkeepers: usize,
    /// The configured per-team minimum.
    pub required: usize,
    /// True when a goalkeeper could not be moved because it was paired.
    pub blocked_by_pair: bool,
}

impl std::fmt::Display for NoGoalkeeperWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.goalkeepers == 0 {
            write!(f, "{} has no goalkeeper", self.slot)?;
        } else {
            write!(
                f,
                "{} has {} of {} goalkeepers",
                self.slot, self.goalkeepers, self.required
            )?;
        }
        if self.blocked_by_pair {
            write!(f, " (the spare goalkeeper is paired and was not moved)")?;
        }
        Ok(())
    }
}
