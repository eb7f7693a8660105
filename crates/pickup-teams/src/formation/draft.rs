// Snake draft: two captains alternate picks (1,2,2,1,1,2,...) under a
// per-pick countdown.
//
// The state machine never sleeps. The host feeds elapsed time through
// `tick`, and one expiry auto-picks the highest-rated remaining player.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::error::DraftError;
use super::player::{DraftPlayer, TeamSlot};
use super::strength::descending_rating;

/// Which captain makes non-captain pick `pick_number` (1-based).
///
/// Pick 1 belongs to captain 1; after that the order runs in blocks of two,
/// alternating captain 2, captain 1, captain 2, ...
pub fn captain_for_pick(pick_number: usize) -> TeamSlot {
    if pick_number <= 1 {
        return TeamSlot::Team1;
    }
    let block = (pick_number - 2) / 2;
    if block % 2 == 0 {
        TeamSlot::Team2
    } else {
        TeamSlot::Team1
    }
}

/// One applied pick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickRecord {
    pub pick_number: usize,
    pub slot: TeamSlot,
    pub player_id: String,
    /// True when the timer expired and the pick was made automatically.
    pub auto: bool,
}

/// What the presentation layer needs to render the current turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub pick_number: usize,
    pub slot: TeamSlot,
    pub remaining_ms: u64,
}

/// State while captains are picking.
#[derive(Debug, Clone, PartialEq)]
pub struct InProgressDraft {
    pub captain1_id: String,
    pub captain2_id: String,
    pub team1: Vec<DraftPlayer>,
    pub team2: Vec<DraftPlayer>,
    /// The draft pool: players not yet assigned.
    pub remaining: Vec<DraftPlayer>,
    /// Next pick to be made, 1-based.
    pub pick_number: usize,
    pub remaining_ms: u64,
    pub picks: Vec<PickRecord>,
}

impl InProgressDraft {
    pub fn current_turn(&self) -> TeamSlot {
        captain_for_pick(self.pick_number)
    }

    /// `pick_number` must be the open pick.
    fn check_open(&self, pick_number: usize) -> Result<(), DraftError> {
        if pick_number < self.pick_number {
            return Err(DraftError::PickAlreadyApplied { pick_number });
        }
        if pick_number > self.pick_number {
            return Err(DraftError::PickNotOpen {
                pick_number,
                current: self.pick_number,
            });
        }
        Ok(())
    }

    fn roster_mut(&mut self, slot: TeamSlot) -> &mut Vec<DraftPlayer> {
        match slot {
            TeamSlot::Team1 => &mut self.team1,
            TeamSlot::Team2 => &mut self.team2,
        }
    }
}

/// Final rosters. No further picks are accepted.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedDraft {
    pub captain1_id: String,
    pub captain2_id: String,
    pub team1: Vec<DraftPlayer>,
    pub team2: Vec<DraftPlayer>,
    pub picks: Vec<PickRecord>,
}

impl From<InProgressDraft> for CompletedDraft {
    fn from(draft: InProgressDraft) -> Self {
        CompletedDraft {
            captain1_id: draft.captain1_id,
            captain2_id: draft.captain2_id,
            team1: draft.team1,
            team2: draft.team2,
            picks: draft.picks,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DraftState {
    AwaitingCaptains,
    InProgress(InProgressDraft),
    Complete(CompletedDraft),
}

impl DraftState {
    pub fn phase_name(&self) -> &'static str {
        match self {
            DraftState::AwaitingCaptains => "awaiting captains",
            DraftState::InProgress(_) => "in progress",
            DraftState::Complete(_) => "complete",
        }
    }
}

/// One-way notifications for the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DraftEvent {
    CaptainsSelected {
        captain1_id: String,
        captain2_id: String,
    },
    PlayerPicked(PickRecord),
    Completed,
    Cancelled {
        picks_made: usize,
    },
}

/// Controller for a single snake draft.
#[derive(Debug, Clone)]
pub struct SnakeDraft {
    pool: Vec<DraftPlayer>,
    pick_timer_ms: u64,
    state: DraftState,
}

impl SnakeDraft {
    /// Start a draft over `pool` with the given per-pick timer.
    pub fn new(pool: Vec<DraftPlayer>, pick_timer: Duration) -> Result<Self, DraftError> {
        let pick_timer_ms = u64::try_from(pick_timer.as_millis()).unwrap_or(u64::MAX);
        if pick_timer_ms == 0 {
            return Err(DraftError::InvalidTimer);
        }
        Ok(SnakeDraft {
            pool,
            pick_timer_ms,
            state: DraftState::AwaitingCaptains,
        })
    }

    pub fn pool(&self) -> &[DraftPlayer] {
        &self.pool
    }

    pub fn state(&self) -> &DraftState {
        &self.state
    }

    pub fn pick_timer_ms(&self) -> u64 {
        self.pick_timer_ms
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.state, DraftState::Complete(_))
    }

    /// The open pick, or `None` outside `InProgress`.
    pub fn turn(&self) -> Option<Turn> {
        match &self.state {
            DraftState::InProgress(draft) => Some(Turn {
                pick_number: draft.pick_number,
                slot: draft.current_turn(),
                remaining_ms: draft.remaining_ms,
            }),
            _ => None,
        }
    }

    /// Total non-captain picks in this draft.
    pub fn total_picks(&self) -> usize {
        self.pool.len().saturating_sub(2)
    }

    /// Choose the two captains. Each becomes the first member of their team
    /// and the rest of the pool becomes the draft pool. With a two-player
    /// pool the draft completes immediately.
    pub fn select_captains(
        &mut self,
        captain1_id: &str,
        captain2_id: &str,
    ) -> Result<Vec<DraftEvent>, DraftError> {
        if !matches!(self.state, DraftState::AwaitingCaptains) {
            return Err(DraftError::WrongPhase {
                action: "select captains",
                phase: self.state.phase_name(),
            });
        }
        if captain1_id == captain2_id {
            return Err(DraftError::SameCaptain);
        }

        let find = |id: &str| {
            self.pool
                .iter()
                .find(|p| p.id == id)
                .cloned()
                .ok_or_else(|| DraftError::CaptainNotInPool {
                    player_id: id.to_string(),
                })
        };
        let captain1 = find(captain1_id)?;
        let captain2 = find(captain2_id)?;

        let remaining: Vec<DraftPlayer> = self
            .pool
            .iter()
            .filter(|p| p.id != captain1_id && p.id != captain2_id)
            .cloned()
            .collect();

        info!(
            "Draft started: captains '{}' and '{}', {} players to pick",
            captain1.name,
            captain2.name,
            remaining.len()
        );

        let mut events = vec![DraftEvent::CaptainsSelected {
            captain1_id: captain1_id.to_string(),
            captain2_id: captain2_id.to_string(),
        }];

        self.state = DraftState::InProgress(InProgressDraft {
            captain1_id: captain1_id.to_string(),
            captain2_id: captain2_id.to_string(),
            team1: vec![captain1],
            team2: vec![captain2],
            remaining,
            pick_number: 1,
            remaining_ms: self.pick_timer_ms,
            picks: Vec::new(),
        });

        if let Some(done) = self.complete_if_exhausted() {
            events.push(done);
        }
        Ok(events)
    }

    /// Apply the current captain's explicit choice for `pick_number`.
    ///
    /// A pick number that was already applied is rejected, so a duplicate
    /// delivery of the same choice cannot assign twice.
    pub fn pick(&mut self, pick_number: usize, player_id: &str) -> Result<Vec<DraftEvent>, DraftError> {
        let draft = self.in_progress_mut("pick")?;
        draft.check_open(pick_number)?;
        let idx = draft
            .remaining
            .iter()
            .position(|p| p.id == player_id)
            .ok_or_else(|| DraftError::PlayerUnavailable {
                player_id: player_id.to_string(),
            })?;

        Ok(self.apply_pick(idx, false))
    }

    /// Advance the countdown. When it reaches zero the current pick is made
    /// automatically and the timer restarts; time beyond the expiry is not
    /// carried into the next pick. Outside `InProgress` this does nothing.
    pub fn tick(&mut self, elapsed_ms: u64) -> Vec<DraftEvent> {
        let DraftState::InProgress(draft) = &mut self.state else {
            return Vec::new();
        };
        draft.remaining_ms = draft.remaining_ms.saturating_sub(elapsed_ms);
        if draft.remaining_ms > 0 {
            return Vec::new();
        }
        let pick_number = draft.pick_number;
        self.on_timer_expired(pick_number).unwrap_or_default()
    }

    /// Auto-assign the highest-rated remaining player (ties: lower id) to
    /// the captain whose turn it is, once the countdown for `pick_number`
    /// has reached zero.
    ///
    /// Keyed by pick index like [`SnakeDraft::pick`]: a repeated expiry for
    /// a pick that was already made is rejected.
    pub fn on_timer_expired(&mut self, pick_number: usize) -> Result<Vec<DraftEvent>, DraftError> {
        let draft = self.in_progress_mut("auto-pick")?;
        draft.check_open(pick_number)?;
        if draft.remaining_ms > 0 {
            return Err(DraftError::TimerRunning {
                pick_number,
                remaining_ms: draft.remaining_ms,
            });
        }
        let best = draft
            .remaining
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| descending_rating(a, b))
            .map(|(idx, _)| idx);

        match best {
            Some(idx) => Ok(self.apply_pick(idx, true)),
            None => Ok(self.complete_if_exhausted().into_iter().collect()),
        }
    }

    /// Abort the draft from any phase, discarding all state.
    pub fn cancel(self) -> DraftEvent {
        let picks_made = match &self.state {
            DraftState::InProgress(draft) => draft.picks.len(),
            DraftState::Complete(done) => done.picks.len(),
            DraftState::AwaitingCaptains => 0,
        };
        info!(
            "Draft cancelled while {} after {} picks",
            self.state.phase_name(),
            picks_made
        );
        DraftEvent::Cancelled { picks_made }
    }

    /// Final rosters, once the draft is complete.
    pub fn completed(&self) -> Option<&CompletedDraft> {
        match &self.state {
            DraftState::Complete(done) => Some(done),
            _ => None,
        }
    }

    pub fn into_completed(self) -> Option<CompletedDraft> {
        match self.state {
            DraftState::Complete(done) => Some(done),
            _ => None,
        }
    }

    fn in_progress_mut(&mut self, action: &'static str) -> Result<&mut InProgressDraft, DraftError> {
        match &mut self.state {
            DraftState::InProgress(draft) => Ok(draft),
            other => Err(DraftError::WrongPhase {
                action,
                phase: other.phase_name(),
            }),
        }
    }

    /// Move `remaining[idx]` to the current captain and open the next pick.
    fn apply_pick(&mut self, idx: usize, auto: bool) -> Vec<DraftEvent> {
        let DraftState::InProgress(draft) = &mut self.state else {
            return Vec::new();
        };

        let player = draft.remaining.remove(idx);
        let slot = draft.current_turn();
        let record = PickRecord {
            pick_number: draft.pick_number,
            slot,
            player_id: player.id.clone(),
            auto,
        };

        if auto {
            info!(
                "Pick {}: timer expired, auto-assigned '{}' ({:.1}) to {}",
                record.pick_number, player.name, player.overall_rating, slot
            );
        } else {
            info!(
                "Pick {}: {} chose '{}' ({:.1})",
                record.pick_number, slot, player.name, player.overall_rating
            );
        }

        draft.roster_mut(slot).push(player);
        draft.picks.push(record.clone());
        draft.pick_number += 1;
        draft.remaining_ms = self.pick_timer_ms;

        let mut events = vec![DraftEvent::PlayerPicked(record)];
        if let Some(done) = self.complete_if_exhausted() {
            events.push(done);
        }
        events
    }

    fn complete_if_exhausted(&mut self) -> Option<DraftEvent> {
        let exhausted = matches!(&self.state, DraftState::InProgress(d) if d.remaining.is_empty());
        if !exhausted {
            return None;
        }
        let previous = std::mem::replace(&mut self.state, DraftState::AwaitingCaptains);
        if let DraftState::InProgress(draft) = previous {
            let done = CompletedDraft::from(draft);
            info!(
                "Draft complete: {} vs {} players",
                done.team1.len(),
                done.team2.len()
            );
            self.state = DraftState::Complete(done);
        }
        debug!("Draft state is now {}", self.state.phase_name());
        Some(DraftEvent::Completed)
    }
}
