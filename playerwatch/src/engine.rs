//! The orchestrator: one cycle = fetch a snapshot, evaluate the active
//! policy, dispatch whatever it decided.

use std::time::Duration;

use playerwatch_query::{QueryError, ServerSnapshot};
use tracing::{debug, warn};

use crate::error::CycleError;
use crate::modes::ModeEvaluator;

/// Anything that can produce a fresh [`ServerSnapshot`]. The engine never
/// owns the timing source and never caches snapshots.
pub trait SnapshotSource {
    async fn fetch(&self) -> Result<ServerSnapshot, QueryError>;
}

/// Production source: an A2S query against a fixed address, bounded by a
/// fixed timeout.
pub struct A2sSource {
    address: String,
    timeout: Duration,
}

impl A2sSource {
    pub fn new(address: impl Into<String>, timeout: Duration) -> Self {
        Self {
            address: address.into(),
            timeout,
        }
    }
}

impl SnapshotSource for A2sSource {
    async fn fetch(&self) -> Result<ServerSnapshot, QueryError> {
        playerwatch_query::query(&self.address, self.timeout).await
    }
}

/// What a single cycle did. Fetch failures are outcomes rather than errors:
/// the cycle is skipped with no store mutation and no dispatch, and the next
/// tick tries again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The server did not answer in time.
    ServerUnreachable,
    /// The server answered with something that is not a valid reply.
    MalformedReply,
    /// ALL mode: every player in the snapshot was already notified about.
    NoNewPlayers,
    /// ALL mode: one notification covering this many new players went out.
    NotifiedNewPlayers(usize),
    /// THRESHOLD mode: roster too small to trigger.
    BelowThreshold { count: usize },
    /// THRESHOLD mode: still inside the suppression window.
    OnCooldown { until: i64 },
    /// THRESHOLD mode: notification sent, cooldown rearmed.
    ThresholdReached { count: usize, next_eligible_at: i64 },
}

pub struct Engine<S, E> {
    source: S,
    evaluator: E,
}

impl<S: SnapshotSource, E: ModeEvaluator> Engine<S, E> {
    pub fn new(source: S, evaluator: E) -> Self {
        Self { source, evaluator }
    }

    /// Run one fetch/evaluate/dispatch cycle.
    pub async fn run_cycle(&self) -> Result<CycleOutcome, CycleError> {
        let snapshot = match self.source.fetch().await {
            Ok(snapshot) => snapshot,
            Err(QueryError::Unreachable) => {
                warn!("server did not respond; skipping cycle");
                return Ok(CycleOutcome::ServerUnreachable);
            }
            Err(QueryError::Io(e)) => {
                warn!(error = %e, "network failure while querying server; skipping cycle");
                return Ok(CycleOutcome::ServerUnreachable);
            }
            Err(QueryError::ProtocolViolation(detail)) => {
                warn!(%detail, "malformed reply from server; skipping cycle");
                return Ok(CycleOutcome::MalformedReply);
            }
        };

        debug!(
            server = %snapshot.server_name,
            players = snapshot.player_count(),
            "fetched snapshot"
        );
        self.evaluator.evaluate(&snapshot).await
    }
}
