//! Watches the player roster of a Source engine game server and notifies a
//! Discord channel, either once per new player (ALL mode) or when the
//! population reaches a threshold (THRESHOLD mode, with a cooldown).
//!
//! The engine is deliberately stateless between cycles: everything it must
//! remember lives in the durable stores, so overlapping or restarted
//! invocations converge on at-least-once delivery instead of relying on
//! locks.

#![allow(async_fn_in_trait)]

pub mod config;
pub mod engine;
pub mod error;
pub mod modes;
pub mod notify;

pub use config::{Config, ConfigError, Policy};
pub use engine::{A2sSource, CycleOutcome, Engine, SnapshotSource};
pub use error::CycleError;
pub use modes::{AllMode, ModeEvaluator, ThresholdMode};
pub use notify::{DiscordNotifier, Notifier, NotifyError};
