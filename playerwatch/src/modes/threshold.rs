use std::time::Duration;

use playerwatch_query::ServerSnapshot;
use playerwatch_store::CooldownStore;
use tracing::{debug, info};

use crate::engine::CycleOutcome;
use crate::error::CycleError;
use crate::modes::ModeEvaluator;
use crate::notify::{self, Notifier};

/// THRESHOLD mode: one notification when the roster reaches the trigger
/// level, then silence until the cooldown expires.
///
/// The idle/cooling-down state is derived from the cooldown store on every
/// cycle, never held in memory: an absent value or one in the past means
/// idle, a future value means cooling down. Leaving the cooldown state is
/// purely time passing.
pub struct ThresholdMode<C, N> {
    cooldown_store: C,
    notifier: N,
    threshold_count: usize,
    cooldown: Duration,
}

impl<C, N> ThresholdMode<C, N> {
    pub fn new(cooldown_store: C, notifier: N, threshold_count: usize, cooldown: Duration) -> Self {
        Self {
            cooldown_store,
            notifier,
            threshold_count,
            cooldown,
        }
    }
}

impl<C: CooldownStore, N: Notifier> ModeEvaluator for ThresholdMode<C, N> {
    async fn evaluate(&self, snapshot: &ServerSnapshot) -> Result<CycleOutcome, CycleError> {
        let now = snapshot.fetched_at;

        if let Some(next_eligible_at) = self.cooldown_store.get().await? {
            if now < next_eligible_at {
                debug!(next_eligible_at, "still cooling down");
                return Ok(CycleOutcome::OnCooldown {
                    until: next_eligible_at,
                });
            }
        }

        let count = snapshot.player_count();
        // Count exactly equal to the threshold triggers.
        if count < self.threshold_count {
            debug!(
                count,
                threshold = self.threshold_count,
                "player count below threshold"
            );
            return Ok(CycleOutcome::BelowThreshold { count });
        }

        let next_eligible_at = now + self.cooldown.as_secs() as i64;
        let (subject, body) = notify::threshold_message(snapshot, next_eligible_at);
        self.notifier.send(&subject, &body).await?;

        // Rearm only after a successful dispatch. If this write fails, the
        // next cycle may notify again; that beats a cooldown that never
        // resets.
        self.cooldown_store.put(next_eligible_at).await?;

        info!(count, next_eligible_at, "player count reached the threshold");
        Ok(CycleOutcome::ThresholdReached {
            count,
            next_eligible_at,
        })
    }
}
