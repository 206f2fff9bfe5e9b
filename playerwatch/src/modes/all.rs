use playerwatch_query::ServerSnapshot;
use playerwatch_store::DedupStore;
use tracing::{debug, info};

use crate::engine::CycleOutcome;
use crate::error::CycleError;
use crate::modes::ModeEvaluator;
use crate::notify::{self, Notifier};

/// ALL mode: notify once for every player name not yet present in the dedup
/// store.
///
/// The ordering of operations is what makes this at-least-once: store reads
/// happen before the dispatch, records are written only after the dispatch
/// succeeds. A failed dispatch leaves every pending name unrecorded, so the
/// next cycle retries them. Records are never deleted here, so a player who
/// leaves and rejoins is not re-notified.
pub struct AllMode<D, N> {
    dedup: D,
    notifier: N,
}

impl<D, N> AllMode<D, N> {
    pub fn new(dedup: D, notifier: N) -> Self {
        Self { dedup, notifier }
    }
}

impl<D: DedupStore, N: Notifier> ModeEvaluator for AllMode<D, N> {
    async fn evaluate(&self, snapshot: &ServerSnapshot) -> Result<CycleOutcome, CycleError> {
        let mut new_players = Vec::new();
        for name in &snapshot.players {
            if self.dedup.get(name).await?.is_none() {
                new_players.push(name.clone());
            } else {
                debug!(player = %name, "already notified");
            }
        }

        // Covers the empty snapshot as well: the dispatcher is never
        // contacted when there is nothing to report.
        if new_players.is_empty() {
            debug!("no new players");
            return Ok(CycleOutcome::NoNewPlayers);
        }

        let (subject, body) = notify::new_player_message(snapshot, &new_players);
        self.notifier.send(&subject, &body).await?;

        for name in &new_players {
            self.dedup.put(name, snapshot.fetched_at).await?;
        }

        info!(count = new_players.len(), "notified about new players");
        Ok(CycleOutcome::NotifiedNewPlayers(new_players.len()))
    }
}
