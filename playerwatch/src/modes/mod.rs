//! Policy evaluators. One of these is selected at startup and consulted with
//! every fetched snapshot.

mod all;
mod threshold;

pub use all::AllMode;
pub use threshold::ThresholdMode;

use playerwatch_query::ServerSnapshot;

use crate::engine::CycleOutcome;
use crate::error::CycleError;

/// Consumes a snapshot, consults durable state, and decides which
/// notification (if any) to emit. The snapshot's `fetched_at` is the
/// evaluator's notion of "now", so replayed snapshots evaluate the same way
/// twice.
pub trait ModeEvaluator {
    async fn evaluate(&self, snapshot: &ServerSnapshot) -> Result<CycleOutcome, CycleError>;
}
