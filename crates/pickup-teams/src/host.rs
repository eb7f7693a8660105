// Async host for a snake draft: feeds the state machine captain commands and
// a periodic clock tick, and publishes every change on a one-way channel.

use std::time::Duration;

use anyhow::{bail, ensure};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::formation::draft::{CompletedDraft, DraftEvent, DraftState, SnakeDraft, Turn};
use crate::formation::error::DraftError;

/// Input from the captains' devices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftCommand {
    Pick { pick_number: usize, player_id: String },
    Cancel,
}

/// Output for the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum DraftUpdate {
    Event(DraftEvent),
    /// Countdown after a tick that did not expire the pick.
    Clock(Turn),
    /// A command the state machine refused.
    Rejected(DraftError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum DraftOutcome {
    Completed(CompletedDraft),
    Cancelled,
}

/// Drive an in-progress draft until it completes or is cancelled.
///
/// A closed command channel does not end the draft: the timer keeps
/// auto-picking until the pool is empty.
pub async fn run(
    mut draft: SnakeDraft,
    mut cmd_rx: mpsc::Receiver<DraftCommand>,
    update_tx: mpsc::Sender<DraftUpdate>,
    tick: Duration,
) -> anyhow::Result<DraftOutcome> {
    ensure!(!tick.is_zero(), "draft tick interval must be longer than zero");
    if matches!(draft.state(), DraftState::AwaitingCaptains) {
        bail!("draft host started before captains were selected");
    }

    let tick_ms = u64::try_from(tick.as_millis()).unwrap_or(u64::MAX);
    let mut interval = tokio::time::interval(tick);
    // The first tick completes immediately; consume it so the countdown
    // starts one full interval from now.
    interval.tick().await;

    let mut commands_open = true;
    info!("Draft host started ({} picks remaining)", remaining_picks(&draft));

    while !draft.is_complete() {
        tokio::select! {
            cmd = cmd_rx.recv(), if commands_open => {
                match cmd {
                    Some(DraftCommand::Pick { pick_number, player_id }) => {
                        match draft.pick(pick_number, &player_id) {
                            Ok(events) => publish_events(&update_tx, events).await,
                            Err(e) => {
                                warn!("Rejected pick {} of '{}': {}", pick_number, player_id, e);
                                publish(&update_tx, DraftUpdate::Rejected(e)).await;
                            }
                        }
                    }
                    Some(DraftCommand::Cancel) => {
                        let event = draft.cancel();
                        publish(&update_tx, DraftUpdate::Event(event)).await;
                        return Ok(DraftOutcome::Cancelled);
                    }
                    None => {
                        info!("Command channel closed, timer will finish the draft");
                        commands_open = false;
                    }
                }
            }

            _ = interval.tick() => {
                let events = draft.tick(tick_ms);
                if events.is_empty() {
                    if let Some(turn) = draft.turn() {
                        debug!("Pick {}: {} ms left", turn.pick_number, turn.remaining_ms);
                        publish(&update_tx, DraftUpdate::Clock(turn)).await;
                    }
                } else {
                    publish_events(&update_tx, events).await;
                }
            }
        }
    }

    match draft.into_completed() {
        Some(done) => {
            info!("Draft host exiting: draft complete");
            Ok(DraftOutcome::Completed(done))
        }
        None => bail!("draft host loop ended without a completed draft"),
    }
}

async fn publish_events(update_tx: &mpsc::Sender<DraftUpdate>, events: Vec<DraftEvent>) {
    for event in events {
        publish(update_tx, DraftUpdate::Event(event)).await;
    }
}

/// Send one update. The draft carries on when nobody is listening.
async fn publish(update_tx: &mpsc::Sender<DraftUpdate>, update: DraftUpdate) {
    if let Err(mpsc::error::SendError(update)) = update_tx.send(update).await {
        debug!("Update receiver dropped, discarding {:?}", update);
    }
}

fn remaining_picks(draft: &SnakeDraft) -> usize {
    match draft.state() {
        DraftState::InProgress(d) => d.remaining.len(),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formation::draft::PickRecord;
    use crate::formation::player::{DraftPlayer, Position, TeamSlot};

    fn started_draft(timer_secs: u64) -> SnakeDraft {
        let pool = vec![
            DraftPlayer::new("c1", "C1", Position::Line, 4.0),
            DraftPlayer::new("c2", "C2", Position::Line, 4.0),
            DraftPlayer::new("x", "X", Position::Line, 4.5),
            DraftPlayer::new("y", "Y", Position::Line, 3.0),
        ];
        let mut draft = SnakeDraft::new(pool, Duration::from_secs(timer_secs)).unwrap();
        draft.select_captains("c1", "c2").unwrap();
        draft
    }

    fn drain(rx: &mut mpsc::Receiver<DraftUpdate>) -> Vec<DraftUpdate> {
        let mut updates = Vec::new();
        while let Ok(update) = rx.try_recv() {
            updates.push(update);
        }
        updates
    }

    fn picks(updates: &[DraftUpdate]) -> Vec<PickRecord> {
        updates
            .iter()
            .filter_map(|u| match u {
                DraftUpdate::Event(DraftEvent::PlayerPicked(record)) => Some(record.clone()),
                _ => None,
            })
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn timer_finishes_draft_without_commands() {
        let (_cmd_tx, cmd_rx) = mpsc::channel(8);
        let (update_tx, mut update_rx) = mpsc::channel(64);

        let outcome = run(started_draft(3), cmd_rx, update_tx, Duration::from_secs(1))
            .await
            .unwrap();
        let DraftOutcome::Completed(done) = outcome else {
            panic!("expected a completed draft");
        };
        assert_eq!(done.team1.len(), 2);
        assert_eq!(done.team2.len(), 2);

        let updates = drain(&mut update_rx);
        let records = picks(&updates);
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.auto));
        assert_eq!(records[0].player_id, "x");
        assert_eq!(records[0].slot, TeamSlot::Team1);
        assert!(updates.iter().any(|u| matches!(u, DraftUpdate::Clock(_))));
        assert_eq!(updates.last(), Some(&DraftUpdate::Event(DraftEvent::Completed)));
    }

    #[tokio::test(start_paused = true)]
    async fn explicit_pick_is_applied_before_timer() {
        let (cmd_tx, cmd_rx) = mpsc::channel(8);
        let (update_tx, mut update_rx) = mpsc::channel(64);
        cmd_tx
            .send(DraftCommand::Pick {
                pick_number: 1,
                player_id: "y".into(),
            })
            .await
            .unwrap();

        let outcome = run(started_draft(5), cmd_rx, update_tx, Duration::from_secs(1))
            .await
            .unwrap();
        let DraftOutcome::Completed(done) = outcome else {
            panic!("expected a completed draft");
        };
        assert_eq!(done.team1[1].id, "y");
        assert_eq!(done.team2[1].id, "x");

        let records = picks(&drain(&mut update_rx));
        assert!(!records[0].auto);
        assert!(records[1].auto);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_pick_is_rejected_and_reported() {
        let (cmd_tx, cmd_rx) = mpsc::channel(8);
        let (update_tx, mut update_rx) = mpsc::channel(64);
        for player_id in ["x", "y"] {
            cmd_tx
                .send(DraftCommand::Pick {
                    pick_number: 1,
                    player_id: player_id.into(),
                })
                .await
                .unwrap();
        }
        drop(cmd_tx);

        run(started_draft(5), cmd_rx, update_tx, Duration::from_secs(1))
            .await
            .unwrap();
        let updates = drain(&mut update_rx);
        assert!(updates.contains(&DraftUpdate::Rejected(DraftError::PickAlreadyApplied {
            pick_number: 1
        })));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_ends_the_host() {
        let (cmd_tx, cmd_rx) = mpsc::channel(8);
        let (update_tx, mut update_rx) = mpsc::channel(64);
        cmd_tx.send(DraftCommand::Cancel).await.unwrap();

        let outcome = run(started_draft(5), cmd_rx, update_tx, Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(outcome, DraftOutcome::Cancelled);
        assert_eq!(
            drain(&mut update_rx),
            vec![DraftUpdate::Event(DraftEvent::Cancelled { picks_made: 0 })]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn closed_command_channel_keeps_auto_picking() {
        let (cmd_tx, cmd_rx) = mpsc::channel::<DraftCommand>(8);
        drop(cmd_tx);
        let (update_tx, _update_rx) = mpsc::channel(64);

        let outcome = run(started_draft(2), cmd_rx, update_tx, Duration::from_secs(1))
            .await
            .unwrap();
        assert!(matches!(outcome, DraftOutcome::Completed(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_update_receiver_does_not_stop_the_draft() {
        let (cmd_tx, cmd_rx) = mpsc::channel(8);
        let (update_tx, update_rx) = mpsc::channel(1);
        drop(update_rx);
        cmd_tx
            .send(DraftCommand::Pick {
                pick_number: 1,
                player_id: "nobody".into(),
            })
            .await
            .unwrap();

        let outcome = run(started_draft(2), cmd_rx, update_tx, Duration::from_secs(1))
            .await
            .unwrap();
        let DraftOutcome::Completed(done) = outcome else {
            panic!("expected a completed draft");
        };
        assert_eq!(done.team1[1].id, "x");
        assert_eq!(done.team2[1].id, "y");
    }

    #[tokio::test]
    async fn refuses_draft_without_captains() {
        let draft = SnakeDraft::new(Vec::new(), Duration::from_secs(5)).unwrap();
        let (_cmd_tx, cmd_rx) = mpsc::channel(1);
        let (update_tx, _update_rx) = mpsc::channel(1);
        assert!(run(draft, cmd_rx, update_tx, Duration::from_secs(1)).await.is_err());
    }
}
