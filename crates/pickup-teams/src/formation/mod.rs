// Team formation core: value types, constraints, scoring and the three
// formation modes (balanced shuffle, snake draft, manual).

pub mod color;
pub mod constraints;
pub mod draft;
pub mod error;
pub mod head_to_head;
pub mod manual;
pub mod partition;
pub mod player;
pub mod saved;
pub mod session;
pub mod strength;
pub mod suggestions;

pub use color::TeamColor;
pub use constraints::{ConstraintSet, PlayerPair};
pub use draft::{DraftEvent, DraftState, SnakeDraft};
pub use error::{DraftError, FormationError, NoGoalkeeperWarning, StorageError};
pub use player::{DraftPlayer, Position, TeamSlot};
pub use saved::{FormationRepository, FormationStore, SavedFormation};
pub use session::{FormationResult, FormationSession, FormationSettings};
pub use strength::{compute_strength, BalanceBand, TeamStrength};
