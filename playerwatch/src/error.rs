use playerwatch_store::StoreError;
use thiserror::Error;

use crate::notify::NotifyError;

/// A cycle that could not complete its intended store mutations or its
/// dispatch. Fetch failures are deliberately not represented here: they skip
/// the cycle without mutating anything and surface as a
/// [`CycleOutcome`](crate::engine::CycleOutcome) instead.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("dispatch error: {0}")]
    Notify(#[from] NotifyError),
}
